#![warn(missing_docs)]

//! `gpmf` decodes the GoPro Metadata Format (GPMF) telemetry embedded in action camera MP4 files.
//!
//! Decoding a file proceeds in two steps:
//!
//! - The ISO-BMFF container is searched for the timed metadata track whose handler is named `GoPro MET`, and its
//!   sample tables are turned into a list of [chunks](ChunkDescriptor), each with a byte range and a time window.
//! - Each chunk is read and decoded as a stream of key-length-value records, which are returned as a tree of
//!   [`Element`]s. Records of well known keys, such as accelerometer or GPS readings, are turned into
//!   [samples](semantic::Samples) spaced evenly over their chunk's time window.
//!
//! # Usage
//!
//! The main entry points are [`decode`]/[`decode_async`], which take a [`Read`] + [`Seek`] input or its async
//! equivalent.
//!
//! ```
//! # use bytes::Bytes;
//! # use gpmf_test::{klv, TestMp4Builder, TestTrackBuilder};
//! #
//! let strm = klv::nested("STRM", [klv::i16s("SCAL", &[10]), klv::i16s("ACCL", &[30, 20, 10])]);
//! let chunk = klv::nested("DEVC", [strm]);
//! let mp4 = TestMp4Builder::new().track(TestTrackBuilder::new().chunk(vec![Bytes::from(chunk)], 1000)).build();
//!
//! let elements = gpmf::decode(mp4.reader())?;
//!
//! let mut accelerations = vec![];
//! gpmf::walk(&elements, &mut |element| {
//!     if let gpmf::Value::Samples(gpmf::semantic::Samples::Acceleration(axes)) = &element.value {
//!         accelerations.extend(axes.iter().map(|axes| (axes.z, axes.x, axes.y)));
//!     }
//!     Ok::<_, gpmf::Error>(gpmf::Walk::Continue)
//! })?;
//! assert_eq!(accelerations, [(3.0, 2.0, 1.0)]);
//! # Ok::<(), gpmf::Error>(())
//! ```
//!
//! The [`parse`] module also contains a less stable and undocumented API which can be used to parse individual MP4 box
//! types.

#[macro_use]
extern crate gpmf_common;

pub mod container;
pub mod dump;
pub mod keys;
pub mod klv;
pub mod parse;
pub mod semantic;
pub mod walk;

use std::convert::Infallible;
use std::io::{Read, Seek};
use std::ops::Range;
use std::pin::Pin;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use derive_builder::Builder;
use futures_util::io::BufReader;
use futures_util::{pin_mut, AsyncRead, AsyncReadExt, AsyncSeek};
use gpmf_common::{buf_seek, IoResultExt, ResultExt};

use crate::parse::{BoxHeader, ParseError};

//
// public types
//

pub use container::{ChunkDescriptor, TelemetryTrack};
pub use gpmf_common::{InputSpan, Report};
pub use klv::{Element, KlvHeader, Metadata, TypeCode, Value, Q15_16, Q31_32};
pub use walk::{walk, walk_mut, Walk};

#[derive(Builder, Clone)]
#[builder(build_fn(name = "try_build"))]
/// Configuration for the telemetry decoder.
pub struct Config {
    /// The maximum size of the `moov` box to read into memory.
    ///
    /// The default is 1 GiB.
    #[builder(default = "1024 * 1024 * 1024")]
    pub max_metadata_size: u64,

    /// The maximum size of a single telemetry chunk to read into memory.
    ///
    /// The default is 64 MiB.
    #[builder(default = "64 * 1024 * 1024")]
    pub max_chunk_size: u64,

    /// Text which the handler name of the telemetry track must contain.
    ///
    /// The default is `GoPro MET`.
    #[builder(default = "DEFAULT_HANDLER_NAME.to_string()", setter(into))]
    pub handler_name: String,
}

/// Error type returned by `gpmf`.
///
/// The [`Parse`](gpmf_common::Error::Parse) variant contains a [`Report`] which can be used to identify exactly where
/// in the decoder the error occurred. Its [`Debug`](std::fmt::Debug) implementation prints a human-readable parser
/// stack trace, and the underlying [`ParseError`] can be retrieved with [`Report::get_ref`].
pub type Error = gpmf_common::Error<ParseError>;

/// The text contained in the handler name of GoPro telemetry tracks.
pub const DEFAULT_HANDLER_NAME: &str = "GoPro MET";

//
// public functions
//

/// Decode the telemetry of an MP4 input, with the default [`Config`].
///
/// Returns the top-level records of every chunk, in chunk order.
///
/// # Errors
///
/// If the input cannot be parsed, or an IO error occurs, an [`Error`] is returned.
pub fn decode<R: Read + Seek + Unpin>(input: R) -> Result<Vec<Element>, Error> {
    decode_with_config(input, Config::default())
}

/// Decode the telemetry of an MP4 input, with the given [`Config`].
///
/// # Errors
///
/// If the input cannot be parsed, or an IO error occurs, an [`Error`] is returned.
pub fn decode_with_config<R: Read + Seek + Unpin>(input: R, config: Config) -> Result<Vec<Element>, Error> {
    gpmf_common::sync::decode(input, |input| decode_async_with_config(input, config))
}

/// Decode the telemetry of an MP4 input asynchronously, with the default [`Config`].
///
/// # Errors
///
/// If the input cannot be parsed, or an IO error occurs, an [`Error`] is returned.
pub async fn decode_async<R: AsyncRead + AsyncSeek>(input: R) -> Result<Vec<Element>, Error> {
    decode_async_with_config(input, Config::default()).await
}

/// Decode the telemetry of an MP4 input asynchronously, with the given [`Config`].
///
/// # Errors
///
/// If the input cannot be parsed, or an IO error occurs, an [`Error`] is returned.
pub async fn decode_async_with_config<R: AsyncRead + AsyncSeek>(
    input: R,
    config: Config,
) -> Result<Vec<Element>, Error> {
    let reader = BufReader::with_capacity(BoxHeader::MAX_SIZE as usize, input);
    pin_mut!(reader);

    let chunks = locate(reader.as_mut(), &config).await?;

    let mut elements = Vec::new();
    for chunk in chunks {
        let data = read_chunk(reader.as_mut(), &chunk, &config).await?;
        let decoded = decode_chunk(data.freeze(), chunk.start..chunk.end)
            .attach_printable(format!("while decoding chunk {}", chunk.index))?;
        log::info!(
            "chunk {} @ 0x{:08x}: {} bytes, {:?}..{:?}, {} elements",
            chunk.index,
            chunk.span.offset,
            chunk.span.len,
            chunk.start,
            chunk.end,
            decoded.len(),
        );
        elements.extend(decoded);
    }
    Ok(elements)
}

/// Locate the telemetry chunks of an MP4 input, with the default [`Config`].
///
/// # Errors
///
/// If the input cannot be parsed, or an IO error occurs, an [`Error`] is returned.
pub fn locate_chunks<R: Read + Seek + Unpin>(input: R) -> Result<Vec<ChunkDescriptor>, Error> {
    locate_chunks_with_config(input, Config::default())
}

/// Locate the telemetry chunks of an MP4 input, with the given [`Config`].
///
/// # Errors
///
/// If the input cannot be parsed, or an IO error occurs, an [`Error`] is returned.
pub fn locate_chunks_with_config<R: Read + Seek + Unpin>(
    input: R,
    config: Config,
) -> Result<Vec<ChunkDescriptor>, Error> {
    gpmf_common::sync::decode(input, |input| locate_chunks_async_with_config(input, config))
}

/// Locate the telemetry chunks of an MP4 input asynchronously, with the default [`Config`].
///
/// # Errors
///
/// If the input cannot be parsed, or an IO error occurs, an [`Error`] is returned.
pub async fn locate_chunks_async<R: AsyncRead + AsyncSeek>(input: R) -> Result<Vec<ChunkDescriptor>, Error> {
    locate_chunks_async_with_config(input, Config::default()).await
}

/// Locate the telemetry chunks of an MP4 input asynchronously, with the given [`Config`].
///
/// # Errors
///
/// If the input cannot be parsed, or an IO error occurs, an [`Error`] is returned.
pub async fn locate_chunks_async_with_config<R: AsyncRead + AsyncSeek>(
    input: R,
    config: Config,
) -> Result<Vec<ChunkDescriptor>, Error> {
    let reader = BufReader::with_capacity(BoxHeader::MAX_SIZE as usize, input);
    pin_mut!(reader);
    locate(reader, &config).await
}

/// Decode the records of one chunk which has already been read, spacing its samples over `window`.
///
/// # Errors
///
/// If the chunk cannot be decoded, an [`Error`] is returned.
pub fn decode_chunk(data: Bytes, window: Range<Duration>) -> Result<Vec<Element>, Error> {
    let mut elements = klv::read_elements(data)?;
    assign_offsets(&mut elements, window);
    Ok(elements)
}

//
// private functions
//

async fn locate<R: AsyncRead + AsyncSeek>(
    mut reader: Pin<&mut BufReader<R>>,
    config: &Config,
) -> Result<Vec<ChunkDescriptor>, Error> {
    let moov = container::read_moov(reader.as_mut(), config).await?;
    let track = TelemetryTrack::find(&moov, &config.handler_name)?;
    Ok(track.chunks()?)
}

async fn read_chunk<R: AsyncRead + AsyncSeek>(
    mut reader: Pin<&mut BufReader<R>>,
    chunk: &ChunkDescriptor,
    config: &Config,
) -> Result<BytesMut, Error> {
    ensure_attach!(
        chunk.span.len <= config.max_chunk_size,
        ParseError::InvalidInput,
        format!("chunk {} of {} bytes exceeds maximum of {}", chunk.index, chunk.span.len, config.max_chunk_size),
    );
    buf_seek(reader.as_mut(), chunk.span.offset).await?;
    let mut data = BytesMut::zeroed(chunk.span.len as usize);
    reader.read_exact(&mut data).await.map_eof(|_| {
        Error::Parse(report_attach!(
            ParseError::TruncatedStream,
            format!("chunk {} ends past the end of the input", chunk.index),
        ))
    })?;
    Ok(data)
}

/// Space the samples of every time series record evenly over `window`.
fn assign_offsets(elements: &mut [Element], window: Range<Duration>) {
    let result = walk_mut(elements, &mut |element| {
        if let Value::Samples(samples) = &mut element.value {
            samples.assign_offsets(window.start, window.end);
        }
        Ok::<_, Infallible>(Walk::Continue)
    });
    result.unwrap_or_else(|never| match never {})
}

//
// Config impls
//

impl Config {
    /// Construct a builder for a [`Config`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

//
// ConfigBuilder impls
//

impl ConfigBuilder {
    /// Build a new [`Config`].
    pub fn build(&self) -> Config {
        self.try_build().unwrap()
    }
}

#[cfg(doctest)]
#[doc = include_str!("../../README.md")]
pub mod readme {}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use bytes::Bytes;
    use gpmf_common_test::init_logger;
    use gpmf_test::{klv, TestMp4Builder, TestTrackBuilder};

    use super::*;
    use crate::parse::FourCC;
    use crate::semantic::{Axes, GpsFix, Samples};

    fn accl_chunk() -> Bytes {
        klv::nested("DEVC", [
            klv::u32s("DVID", &[1]),
            klv::string("DVNM", "Camera"),
            klv::nested("STRM", [
                klv::string("STNM", "Accelerometer"),
                klv::i16s("SCAL", &[10]),
                klv::i16s("ACCL", &[30, 20, 10]),
            ]),
        ])
        .into()
    }

    fn find_samples(elements: &[Element]) -> Vec<(FourCC, Samples)> {
        let mut found = Vec::new();
        walk(elements, &mut |element| {
            if let Value::Samples(samples) = &element.value {
                found.push((element.key(), samples.clone()));
            }
            Ok::<_, Infallible>(Walk::Continue)
        })
        .unwrap_or_else(|never| match never {});
        found
    }

    #[test]
    fn scaled_acceleration() {
        init_logger();

        let mp4 = TestMp4Builder::new()
            .track(TestTrackBuilder::new().timescale(1000).chunk(vec![accl_chunk()], 1000))
            .build();
        let elements = decode(mp4.reader()).unwrap();
        let samples = find_samples(&elements);
        assert_eq!(samples.len(), 1);
        let expected = Axes { z: 3.0, x: 2.0, y: 1.0, offset: Duration::ZERO };
        assert_eq!(samples[0], (keys::ACCL, Samples::Acceleration(vec![expected])));

        let strm = &elements[0].nested[2];
        let accl = &strm.nested[2];
        assert_eq!(accl.metadata["device_name"], Value::String("Camera".into()));
        assert_eq!(accl.metadata["stream_name"], Value::String("Accelerometer".into()));
    }

    #[test]
    fn two_chunk_offsets() {
        init_logger();

        let gps_chunk = |fix: u32| -> Bytes {
            klv::nested("DEVC", [klv::nested("STRM", [
                klv::u32s("GPSF", &[fix]),
                klv::i32s("GPS5", &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
            ])])
            .into()
        };
        let mp4 = TestMp4Builder::new()
            .track(
                TestTrackBuilder::new()
                    .timescale(1000)
                    .chunk(vec![gps_chunk(2)], 1000)
                    .chunk(vec![gps_chunk(99)], 1000),
            )
            .build();
        let elements = decode(mp4.reader()).unwrap();
        assert_eq!(elements.len(), 2);

        let samples = find_samples(&elements);
        let offsets = samples
            .iter()
            .flat_map(|(_, samples)| match samples {
                Samples::Gps(points) => points.iter().map(|point| point.offset.as_millis()).collect(),
                _ => vec![],
            })
            .collect::<Vec<_>>();
        assert_eq!(offsets, [0, 500, 1000, 1500]);

        let fixes = [&elements[0], &elements[1]].map(|devc| devc.nested[0].nested[0].value.clone());
        assert_eq!(fixes, [Value::GpsFix(GpsFix::Lock2d), Value::GpsFix(GpsFix::Unknown(99))]);
        let description = elements[1].nested[0].nested[1].metadata["gps_fix_description"].clone();
        assert_eq!(description, Value::String("unknown lock: 99".into()));
    }

    #[test]
    fn async_decode() {
        use futures_util::FutureExt;

        let mp4 = TestMp4Builder::new().track(TestTrackBuilder::new().chunk(vec![accl_chunk()], 1)).build();
        let future = decode_async(futures_util::io::Cursor::new(mp4.data.clone()));
        let elements = future.now_or_never().unwrap().unwrap();
        assert_eq!(elements, decode(mp4.reader()).unwrap());
    }

    #[test]
    fn face_size_mismatch() {
        let chunk = klv::nested("DEVC", [klv::nested("STRM", [
            klv::string("TYPE", "Lffff"),
            klv::complex("FACE", 28, &[0; 28]),
        ])]);
        let mp4 = TestMp4Builder::new().track(TestTrackBuilder::new().chunk(vec![chunk.into()], 1)).build();
        assert_matches!(decode(mp4.reader()), Err(Error::Parse(err)) => {
            assert_matches!(err.get_ref(), ParseError::TypeDefinitionSizeMismatch { expected: 20, actual: 28 });
        });
    }

    #[test]
    fn chunk_too_large() {
        let mp4 = TestMp4Builder::new().track(TestTrackBuilder::new().chunk(vec![accl_chunk()], 1)).build();
        let config = Config::builder().max_chunk_size(8).build();
        assert_matches!(decode_with_config(mp4.reader(), config), Err(Error::Parse(err)) => {
            assert_matches!(err.get_ref(), ParseError::InvalidInput);
        });
    }

    #[test]
    fn chunk_past_eof() {
        let mut mp4 = TestMp4Builder::new()
            .track(TestTrackBuilder::new().chunk(vec![accl_chunk()], 1))
            .mdat_last()
            .build();
        mp4.data.truncate(mp4.data.len() - 4);
        assert_matches!(decode(mp4.reader()), Err(Error::Parse(err)) => {
            assert_matches!(err.get_ref(), ParseError::TruncatedStream);
        });
    }

    #[test]
    fn custom_handler_name() {
        let mp4 = TestMp4Builder::new()
            .track(TestTrackBuilder::new().handler(b"meta", "Custom Telemetry").chunk(vec![accl_chunk()], 1))
            .build();
        assert_matches!(decode(mp4.reader()), Err(Error::Parse(err)) => {
            assert_matches!(err.get_ref(), ParseError::TrackNotFound);
        });
        let config = Config::builder().handler_name("Custom").build();
        assert_eq!(decode_with_config(mp4.reader(), config).unwrap().len(), 1);
    }

    #[test]
    fn decode_chunk_window() {
        let data = Bytes::from(klv::i16s("GYRO", &[1, 2, 3, 4, 5, 6, 7, 8, 9]));
        let elements = decode_chunk(data, Duration::from_secs(3)..Duration::from_secs(6)).unwrap();
        assert_matches!(&elements[0].value, Value::Samples(Samples::Gyroscope(axes)) => {
            let offsets = axes.iter().map(|axes| axes.offset.as_secs()).collect::<Vec<_>>();
            assert_eq!(offsets, [3, 4, 5]);
        });
    }
}
