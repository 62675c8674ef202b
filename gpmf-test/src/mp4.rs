use std::io;

use bytes::{BufMut, Bytes};
use gpmf_common_test::init_logger;

/// Builder for a minimal MP4 file: an `ftyp`, an `mdat` holding every track's samples, and a `moov` describing the
/// tracks.
#[derive(Clone, Debug)]
pub struct TestMp4Builder {
    tracks: Vec<TestTrackBuilder>,
    moov: bool,
    mdat_last: bool,
}

/// Builder for one track of a [`TestMp4Builder`].
///
/// Sample tables are derived from the chunks added with [`chunk`](Self::chunk), unless they are given explicitly with
/// [`samples_per_chunk`](Self::samples_per_chunk), [`sample_sizes`](Self::sample_sizes),
/// [`time_to_sample`](Self::time_to_sample) and [`chunk_count`](Self::chunk_count), in which case zero filled sample
/// data is written.
#[derive(Clone, Debug)]
pub struct TestTrackBuilder {
    handler_type: [u8; 4],
    handler_name: String,
    timescale: u32,
    chunks: Vec<(Vec<Bytes>, u32)>,
    samples_per_chunk: Option<Vec<(u32, u32)>>,
    sample_sizes: Option<Vec<u32>>,
    time_to_sample: Option<Vec<(u32, u32)>>,
    chunk_count: Option<u32>,
    offsets: OffsetTable,
}

#[derive(Clone, Debug)]
pub struct TestMp4 {
    pub data: Vec<u8>,
    /// Absolute chunk offsets of the first track.
    pub chunk_offsets: Vec<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OffsetTable {
    Stco,
    Co64,
    Missing,
}

struct TrackTables {
    time_to_sample: Vec<(u32, u32)>,
    samples_per_chunk: Vec<(u32, u32)>,
    sample_sizes: Vec<u32>,
    data: Vec<u8>,
    chunk_offsets: Vec<u64>,
}

//
// TestMp4Builder impls
//

impl TestMp4Builder {
    pub fn new() -> Self {
        Self { tracks: Vec::new(), moov: true, mdat_last: false }
    }

    pub fn track(mut self, track: TestTrackBuilder) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn no_moov(mut self) -> Self {
        self.moov = false;
        self
    }

    /// Write the `mdat` after the `moov`, as most non-camera writers do.
    pub fn mdat_last(mut self) -> Self {
        self.mdat_last = true;
        self
    }

    pub fn build(&self) -> TestMp4 {
        init_logger();

        let mut tables = self.tracks.iter().map(TestTrackBuilder::tables).collect::<Vec<_>>();

        let mut mdat_data = Vec::new();
        for track in &mut tables {
            let base = mdat_data.len() as u64;
            track.chunk_offsets.iter_mut().for_each(|offset| *offset += base);
            mdat_data.extend_from_slice(&track.data);
        }

        let ftyp = mp4_box(b"ftyp", b"mp41\0\0\0\0mp41");

        // Table sizes don't depend on offset values, so the moov length is known before the offsets are.
        let moov_len = match self.moov {
            true => self.moov_box(&tables).len(),
            false => 0,
        };
        let mdat_data_offset = match self.mdat_last {
            true => ftyp.len() + moov_len + 8,
            false => ftyp.len() + 8,
        };
        for track in &mut tables {
            track.chunk_offsets.iter_mut().for_each(|offset| *offset += mdat_data_offset as u64);
        }

        let mdat = mp4_box(b"mdat", &mdat_data);
        let moov = match self.moov {
            true => self.moov_box(&tables),
            false => Vec::new(),
        };

        let data = match self.mdat_last {
            true => [ftyp, moov, mdat].concat(),
            false => [ftyp, mdat, moov].concat(),
        };
        let chunk_offsets = tables.first().map(|track| track.chunk_offsets.clone()).unwrap_or_default();
        TestMp4 { data, chunk_offsets }
    }

    fn moov_box(&self, tables: &[TrackTables]) -> Vec<u8> {
        let traks = self.tracks.iter().zip(tables).map(|(track, tables)| track.trak_box(tables));
        mp4_box(b"moov", &traks.collect::<Vec<_>>().concat())
    }
}

impl Default for TestMp4Builder {
    fn default() -> Self {
        Self::new()
    }
}

//
// TestTrackBuilder impls
//

impl TestTrackBuilder {
    pub fn new() -> Self {
        Self {
            handler_type: *b"meta",
            handler_name: "GoPro MET".to_string(),
            timescale: 1000,
            chunks: Vec::new(),
            samples_per_chunk: None,
            sample_sizes: None,
            time_to_sample: None,
            chunk_count: None,
            offsets: OffsetTable::Stco,
        }
    }

    pub fn timescale(mut self, timescale: u32) -> Self {
        self.timescale = timescale;
        self
    }

    pub fn handler(mut self, handler_type: &[u8; 4], name: &str) -> Self {
        self.handler_type = *handler_type;
        self.handler_name = name.to_string();
        self
    }

    /// Add a chunk holding `samples`, each lasting `delta` ticks.
    pub fn chunk(mut self, samples: Vec<Bytes>, delta: u32) -> Self {
        self.chunks.push((samples, delta));
        self
    }

    /// Set the raw `stsc` entries as `(first_chunk, samples_per_chunk)` pairs.
    pub fn samples_per_chunk(mut self, entries: &[(u32, u32)]) -> Self {
        self.samples_per_chunk = Some(entries.to_vec());
        self
    }

    pub fn sample_sizes(mut self, sizes: &[u32]) -> Self {
        self.sample_sizes = Some(sizes.to_vec());
        self
    }

    /// Set the raw `stts` entries as `(sample_count, sample_delta)` pairs.
    pub fn time_to_sample(mut self, entries: &[(u32, u32)]) -> Self {
        self.time_to_sample = Some(entries.to_vec());
        self
    }

    /// Set the number of entries written to the chunk offset table.
    pub fn chunk_count(mut self, count: u32) -> Self {
        self.chunk_count = Some(count);
        self
    }

    pub fn co64(mut self) -> Self {
        self.offsets = OffsetTable::Co64;
        self
    }

    pub fn no_chunk_offsets(mut self) -> Self {
        self.offsets = OffsetTable::Missing;
        self
    }

    /// Compute sample tables, sample data, and chunk offsets relative to the start of the sample data.
    fn tables(&self) -> TrackTables {
        let mut tables = TrackTables {
            time_to_sample: Vec::new(),
            samples_per_chunk: Vec::new(),
            sample_sizes: Vec::new(),
            data: Vec::new(),
            chunk_offsets: Vec::new(),
        };

        for ((samples, delta), chunk_number) in self.chunks.iter().zip(1..) {
            tables.chunk_offsets.push(tables.data.len() as u64);
            let sample_count = samples.len() as u32;
            for sample in samples {
                tables.sample_sizes.push(sample.len() as u32);
                tables.data.extend_from_slice(sample);
            }
            match tables.time_to_sample.last_mut() {
                Some((count, last_delta)) if *last_delta == *delta => *count += sample_count,
                _ => tables.time_to_sample.push((sample_count, *delta)),
            }
            match tables.samples_per_chunk.last() {
                Some((_, last_count)) if *last_count == sample_count => {}
                _ => tables.samples_per_chunk.push((chunk_number, sample_count)),
            }
        }

        if let Some(sizes) = &self.sample_sizes {
            tables.sample_sizes = sizes.clone();
            tables.data = vec![0; sizes.iter().sum::<u32>() as usize];
        }
        if let Some(entries) = &self.time_to_sample {
            tables.time_to_sample = entries.clone();
        }
        if let Some(entries) = &self.samples_per_chunk {
            tables.samples_per_chunk = entries.clone();
        }
        if let Some(chunk_count) = self.chunk_count {
            tables.chunk_offsets = raw_chunk_offsets(&tables.samples_per_chunk, &tables.sample_sizes, chunk_count);
        }
        tables
    }

    fn trak_box(&self, tables: &TrackTables) -> Vec<u8> {
        let mut mdhd = Vec::new();
        mdhd.put_u32(0); // creation_time
        mdhd.put_u32(0); // modification_time
        mdhd.put_u32(self.timescale);
        mdhd.put_u32(tables.time_to_sample.iter().map(|(count, delta)| count * delta).sum());
        mdhd.put_u16(0x55c4); // language "und"
        mdhd.put_u16(0);

        let mut hdlr = Vec::new();
        hdlr.put_u32(0); // pre_defined
        hdlr.put_slice(&self.handler_type);
        hdlr.put_bytes(0, 12);
        hdlr.put_u8(self.handler_name.len() as u8);
        hdlr.put_slice(self.handler_name.as_bytes());
        hdlr.put_u8(0);

        let mut stbl = [
            full_box(b"stsd", &0u32.to_be_bytes()),
            full_box(b"stts", &table(&tables.time_to_sample, |buf, (count, delta)| {
                buf.put_u32(*count);
                buf.put_u32(*delta);
            })),
            full_box(b"stsc", &table(&tables.samples_per_chunk, |buf, (first_chunk, samples_per_chunk)| {
                buf.put_u32(*first_chunk);
                buf.put_u32(*samples_per_chunk);
                buf.put_u32(1); // sample_description_index
            })),
            full_box(b"stsz", &stsz_payload(&tables.sample_sizes)),
        ]
        .concat();
        match self.offsets {
            OffsetTable::Stco => {
                let stco = table(&tables.chunk_offsets, |buf, offset| buf.put_u32(*offset as u32));
                stbl.extend(full_box(b"stco", &stco));
            }
            OffsetTable::Co64 => {
                let co64 = table(&tables.chunk_offsets, |buf, offset| buf.put_u64(*offset));
                stbl.extend(full_box(b"co64", &co64));
            }
            OffsetTable::Missing => {}
        }

        let minf = mp4_box(b"minf", &mp4_box(b"stbl", &stbl));
        let mdia = [full_box(b"mdhd", &mdhd), full_box(b"hdlr", &hdlr), minf].concat();
        mp4_box(b"trak", &mp4_box(b"mdia", &mdia))
    }
}

impl Default for TestTrackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//
// TestMp4 impls
//

impl TestMp4 {
    pub fn reader(&self) -> io::Cursor<Vec<u8>> {
        io::Cursor::new(self.data.clone())
    }
}

//
// private functions
//

fn mp4_box(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + data.len());
    out.put_u32(8 + data.len() as u32);
    out.put_slice(name);
    out.put_slice(data);
    out
}

fn full_box(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = vec![0; 4]; // version and flags
    out.put_slice(data);
    mp4_box(name, &out)
}

fn table<T>(entries: &[T], mut put: impl FnMut(&mut Vec<u8>, &T)) -> Vec<u8> {
    let mut out = Vec::new();
    out.put_u32(entries.len() as u32);
    entries.iter().for_each(|entry| put(&mut out, entry));
    out
}

fn stsz_payload(sizes: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    match sizes {
        [first, rest @ ..] if *first != 0 && rest.iter().all(|size| size == first) => {
            out.put_u32(*first);
            out.put_u32(sizes.len() as u32);
        }
        _ => {
            out.put_u32(0);
            out.extend(table(sizes, |buf, size| buf.put_u32(*size)));
        }
    }
    out
}

/// Lay out `chunk_count` chunks back to back, following the `stsc` runs over `sizes`.
fn raw_chunk_offsets(samples_per_chunk: &[(u32, u32)], sizes: &[u32], chunk_count: u32) -> Vec<u64> {
    let mut offsets = Vec::new();
    let mut offset = 0u64;
    let mut sizes = sizes.iter();
    for chunk in 1..=chunk_count {
        offsets.push(offset);
        let count = samples_per_chunk.iter().rev().find(|(first, _)| *first <= chunk).map_or(0, |(_, count)| *count);
        offset += sizes.by_ref().take(count as usize).map(|size| u64::from(*size)).sum::<u64>();
    }
    offsets
}
