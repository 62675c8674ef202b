//! Builders for synthetic test inputs.
//!
//! [`klv`] encodes individual GPMF records, and [`TestMp4Builder`] wraps encoded chunks into a minimal MP4 file with a
//! single telemetry track.

pub mod klv;

mod mp4;

pub use mp4::{TestMp4, TestMp4Builder, TestTrackBuilder};
