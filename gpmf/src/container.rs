//! Locating the telemetry track and its chunks in an ISO-BMFF file.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::io::BufReader;
use futures_util::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncSeek};
use gpmf_common::{buf_skip, buf_stream_len, buf_stream_position, InputSpan, IoResultExt, Result};

use crate::parse::error::{ParseResultExt, WhileParsingBox};
use crate::parse::{BoxHeader, BoxType, HdlrBox, MoovBox, ParseBox, ParseError, StblBox, StscEntry, SttsEntry};
use crate::{Config, Error};

/// A contiguous run of telemetry samples in the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// The 1-based chunk number within the track.
    pub index: u32,

    /// Where the chunk's bytes are in the input.
    pub span: InputSpan,

    /// The number of samples in the chunk.
    pub sample_count: u32,

    /// The decode time of the chunk's first sample.
    pub start: Duration,

    /// The decode time just past the chunk's last sample.
    pub end: Duration,
}

/// The GoPro telemetry track of a file.
#[derive(Clone, Debug)]
pub struct TelemetryTrack {
    /// The number of time units per second of the track's media.
    pub timescale: u32,

    /// The name of the track's handler.
    pub handler_name: String,

    stbl: StblBox,
}

/// The time-to-sample table, walked one sample at a time.
struct SampleTimes {
    runs: Vec<SttsEntry>,
    next_run: usize,
    boundary: u64,
    delta: u32,
    ticks: u64,
}

//
// TelemetryTrack impls
//

impl TelemetryTrack {
    /// Find the metadata track whose handler name contains `handler_name`.
    pub fn find(moov: &MoovBox, handler_name: &str) -> Result<Self, ParseError> {
        for trak in moov.tracks()? {
            let mdia = trak.mdia()?;
            if mdia.hdlr.handler_type != HdlrBox::META || !mdia.hdlr.name.contains(handler_name) {
                log::debug!("skipping track with handler {} `{}`", mdia.hdlr.handler_type, mdia.hdlr.name);
                continue;
            }

            let timescale = mdia.mdhd.timescale();
            ensure_attach!(
                timescale != 0,
                ParseError::InvalidInput,
                "zero timescale",
                WhileParsingBox(BoxType::MDHD),
            );
            let stbl = mdia.stbl()?;
            log::info!("telemetry track `{}`: timescale {timescale}", mdia.hdlr.name);
            return Ok(Self { timescale, handler_name: mdia.hdlr.name, stbl });
        }
        bail_attach!(ParseError::TrackNotFound, format!("no metadata track named `{handler_name}`"))
    }

    /// The duration of one tick of the track's timescale, truncated to whole nanoseconds.
    pub fn time_unit(&self) -> Duration {
        Duration::from_secs(1) / self.timescale
    }

    /// Describe every chunk of the track, in chunk order.
    pub fn chunks(&self) -> Result<Vec<ChunkDescriptor>, ParseError> {
        let Some(chunk_offsets) = &self.stbl.chunk_offsets else {
            bail_attach!(ParseError::MissingOffsetTable);
        };
        let sample_sizes = &self.stbl.sample_sizes;
        let sample_total = sample_sizes.sample_count();
        let entries = self
            .stbl
            .sample_to_chunk
            .entries()
            .map(|entry| entry.get())
            .collect::<Result<Vec<StscEntry>, _>>()?;

        let time_unit = u64::try_from(self.time_unit().as_nanos()).unwrap_or(u64::MAX);
        let mut times = SampleTimes::new(&self.stbl)?;
        let mut chunks = Vec::new();
        let mut sample = 1;

        'entries: for (entry_index, entry) in entries.iter().enumerate() {
            let next_first_chunk = entries.get(entry_index + 1).map(|next| next.first_chunk);
            if entry.first_chunk > chunk_offsets.entry_count() {
                log::warn!(
                    "skipping sample-to-chunk entry {entry_index}: first chunk {} past {} chunk offsets",
                    entry.first_chunk,
                    chunk_offsets.entry_count(),
                );
                continue;
            }

            let mut chunk = entry.first_chunk;
            while next_first_chunk.map_or(true, |next_first_chunk| chunk < next_first_chunk) {
                if sample > sample_total {
                    break 'entries;
                }
                let offset = chunk_offsets.chunk_offset(chunk)?;
                let start = times.ticks;
                let mut len = 0;
                let mut sample_count = 0;
                while sample_count < entry.samples_per_chunk && sample <= sample_total {
                    len += u64::from(sample_sizes.sample_size(sample)?);
                    times.advance(sample);
                    sample += 1;
                    sample_count += 1;
                }

                let descriptor = ChunkDescriptor {
                    index: chunk,
                    span: InputSpan { offset, len },
                    sample_count,
                    start: Duration::from_nanos(start.saturating_mul(time_unit)),
                    end: Duration::from_nanos(times.ticks.saturating_mul(time_unit)),
                };
                log::debug!("{descriptor}");
                chunks.push(descriptor);

                chunk = match chunk.checked_add(1) {
                    Some(chunk) => chunk,
                    None => break 'entries,
                };
            }
        }
        Ok(chunks)
    }
}

//
// SampleTimes impls
//

impl SampleTimes {
    fn new(stbl: &StblBox) -> Result<Self, ParseError> {
        let runs = stbl.time_to_sample.entries().map(|entry| entry.get()).collect::<Result<Vec<_>, _>>();
        let runs = runs.while_parsing_box(BoxType::STTS)?;
        Ok(Self { runs, next_run: 0, boundary: 0, delta: 0, ticks: 0 })
    }

    /// Add the duration of the 1-based `sample` to the elapsed ticks.
    ///
    /// A run of deltas applies until the sample number passes the sum of its own and every earlier run's sample
    /// count. The last run applies to any samples past the end of the table.
    fn advance(&mut self, sample: u32) {
        while u64::from(sample) > self.boundary {
            let Some(run) = self.runs.get(self.next_run) else {
                break;
            };
            self.boundary += u64::from(run.sample_count);
            self.delta = run.sample_delta;
            self.next_run += 1;
        }
        self.ticks = self.ticks.saturating_add(u64::from(self.delta));
    }
}

//
// ChunkDescriptor impls
//

impl fmt::Display for ChunkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { index, span, sample_count, start, end } = self;
        write!(
            f,
            "chunk {index} @ 0x{:08x}: {} bytes, {sample_count} samples, {start:?}..{end:?}",
            span.offset, span.len,
        )
    }
}

//
// private functions
//

/// Skip top-level boxes until the `moov` box, and parse it.
pub(crate) async fn read_moov<R: AsyncRead + AsyncSeek>(
    mut reader: Pin<&mut BufReader<R>>,
    config: &Config,
) -> std::result::Result<MoovBox, Error> {
    while !reader.as_mut().fill_buf().await?.is_empty() {
        let start_pos = buf_stream_position(reader.as_mut()).await?;

        let header = BoxHeader::read(&mut reader)
            .await
            .map_eof(|_| Error::Parse(report_attach!(ParseError::TruncatedBox, "while parsing box header")))?;

        let box_data_size = match header.box_data_size()? {
            Some(box_data_size) => box_data_size,
            None => buf_stream_len(reader.as_mut()).await? - buf_stream_position(reader.as_mut()).await?,
        };

        match header.box_type() {
            BoxType::MOOV => {
                ensure_attach!(
                    box_data_size <= config.max_metadata_size,
                    ParseError::InvalidInput,
                    format!("moov of {box_data_size} bytes exceeds maximum of {}", config.max_metadata_size),
                );
                let mut data = BytesMut::zeroed(box_data_size as usize);
                reader.read_exact(&mut data).await.map_eof(|_| {
                    Error::Parse(report_attach!(ParseError::TruncatedBox, WhileParsingBox(BoxType::MOOV)))
                })?;
                log::info!("moov @ 0x{start_pos:08x}: {} bytes", box_data_size + header.encoded_len());
                return Ok(MoovBox::parse(&mut data).while_parsing_box(BoxType::MOOV)?);
            }
            name => {
                buf_skip(reader.as_mut(), box_data_size).await.map_eof(|_| {
                    Error::Parse(report_attach!(ParseError::TruncatedBox, WhileParsingBox(name)))
                })?;
                log::info!("{name} @ 0x{start_pos:08x}: {} bytes", box_data_size + header.encoded_len());
            }
        }
    }
    Err(report_attach!(ParseError::MissingRequiredBox(BoxType::MOOV)).into())
}
