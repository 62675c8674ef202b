//! Key-specific parsers which turn raw record values into telemetry samples.
//!
//! Parsers run in stream order, once each record's raw value is known. They can declare sticky metadata for the
//! records which follow, and the scale parser hands its divisors to the next sibling.

#![allow(missing_docs)]

pub mod face;
pub mod gps;
pub mod scale;
pub mod vector;

use std::time::Duration;

use gpmf_common::Result;
use serde::Serialize;

use crate::keys::{self, KeyInfo};
use crate::klv::{Element, Metadata, MetadataContext, Value};
use crate::parse::ParseError;

//
// public types
//

pub use face::{Face, FaceHero10, FaceHero6, FaceHero7, FaceHero8};
pub use gps::{DopClass, GpsDop, GpsFix, GpsPoint};
pub use scale::Scale;
pub use vector::{Axes, WhiteBalanceRgb};

/// The decoded samples of a sensor record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
#[allow(missing_docs)]
pub enum Samples {
    Acceleration(Vec<Axes>),
    Gyroscope(Vec<Axes>),
    Magnetometer(Vec<Axes>),
    Gps(Vec<GpsPoint>),
    WhiteBalance(Vec<WhiteBalanceRgb>),
    Faces(Vec<Face>),
}

/// A sample record taken at some time within its chunk.
pub trait TimeSeries {
    /// Set the time of the sample relative to the start of the stream.
    fn set_offset(&mut self, offset: Duration);
}

//
// private types
//

pub(crate) type Parser = fn(&KeyInfo, &mut Element, &mut SiblingState<'_>) -> Result<(), ParseError>;

/// State handed from each record to the siblings which follow it.
pub(crate) struct SiblingState<'a> {
    pub(crate) metadata: MetadataContext<'a>,
    pub(crate) pending_scale: Option<Scale>,
}

//
// public functions
//

/// Apply any pending scale and the parser of the record's key to `element`.
pub(crate) fn apply(element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    if let Some(scale) = state.pending_scale.take() {
        scale.apply(element)?;
    }
    let Some(info) = keys::key_info(element.key()) else {
        log::debug!("unknown key {}", element.key());
        return Ok(());
    };
    match info.parser {
        Some(parser) => parser(info, element, state),
        None => Ok(()),
    }
}

/// Declare the record's value as sticky metadata.
pub(crate) fn metadata(info: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    state.metadata.declare(info.name, element.value.clone());
    Ok(())
}

/// Capture the metadata visible to the record, then declare its value as sticky metadata.
pub(crate) fn has_metadata(
    info: &KeyInfo,
    element: &mut Element,
    state: &mut SiblingState<'_>,
) -> Result<(), ParseError> {
    element.metadata = state.metadata.snapshot();
    metadata(info, element, state)
}

/// Group a flat sequence of values into records of `N` values each.
pub(crate) fn group<T, const N: usize>(values: &[f64], record: impl Fn([f64; N]) -> T) -> Result<Vec<T>, ParseError> {
    ensure_attach!(
        values.len() % N == 0,
        ParseError::InvalidSampleCount { count: values.len(), width: N },
    );
    let records = values.chunks_exact(N).map(|chunk| {
        let mut fields = [0.0; N];
        fields.copy_from_slice(chunk);
        record(fields)
    });
    Ok(records.collect())
}

/// The values of a numeric record as floats.
pub(crate) fn floats(value: &Value) -> Result<Vec<f64>, ParseError> {
    match value.to_float_seq() {
        Some(values) => Ok(values),
        None => bail_attach!(ParseError::UnexpectedValueType(value.type_name())),
    }
}

/// Space the records of `samples` evenly over `start..end`.
///
/// The `i`th record is offset by `start + i * ((end - start) / len)`.
pub fn interpolate_offsets<T: TimeSeries>(samples: &mut [T], start: Duration, end: Duration) {
    let Ok(len) = u32::try_from(samples.len()) else {
        return;
    };
    if len == 0 {
        return;
    }
    let step = end.saturating_sub(start) / len;
    let mut offset = start;
    for sample in samples {
        sample.set_offset(offset);
        offset += step;
    }
}

pub(crate) fn serialize_offset<S: serde::Serializer>(
    offset: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(offset.as_nanos()).unwrap_or(u64::MAX))
}

//
// Samples impls
//

impl Samples {
    /// The number of samples.
    pub fn len(&self) -> usize {
        match self {
            Self::Acceleration(samples) | Self::Gyroscope(samples) | Self::Magnetometer(samples) => samples.len(),
            Self::Gps(samples) => samples.len(),
            Self::WhiteBalance(samples) => samples.len(),
            Self::Faces(faces) => faces.len(),
        }
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assign evenly spaced offsets within `start..end` to each time series record.
    ///
    /// Returns `false`, leaving the samples untouched, if they are not a time series.
    pub fn assign_offsets(&mut self, start: Duration, end: Duration) -> bool {
        match self {
            Self::Acceleration(samples) | Self::Gyroscope(samples) | Self::Magnetometer(samples) => {
                interpolate_offsets(samples, start, end)
            }
            Self::Gps(samples) => interpolate_offsets(samples, start, end),
            Self::WhiteBalance(samples) => interpolate_offsets(samples, start, end),
            Self::Faces(_) => return false,
        }
        true
    }
}

//
// SiblingState impls
//

impl<'a> SiblingState<'a> {
    pub(crate) fn new(metadata: MetadataContext<'a>) -> Self {
        Self { metadata, pending_scale: None }
    }

    pub(crate) fn into_declared(self) -> Metadata {
        if let Some(scale) = self.pending_scale {
            log::warn!("scale {:?} declared with no record following it", scale.divisors());
        }
        self.metadata.into_declared()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn offsets() {
        let mut samples = Samples::Gps(vec![GpsPoint::default(); 4]);
        assert!(samples.assign_offsets(Duration::from_millis(1000), Duration::from_millis(2000)));
        let Samples::Gps(points) = samples else { unreachable!() };
        let offsets = points.iter().map(|point| point.offset.as_millis()).collect::<Vec<_>>();
        assert_eq!(offsets, [1000, 1250, 1500, 1750]);
    }

    #[test]
    fn uneven_offsets() {
        let mut axes = vec![Axes::default(); 3];
        interpolate_offsets(&mut axes, Duration::ZERO, Duration::from_nanos(10));
        let offsets = axes.iter().map(|axes| axes.offset.as_nanos()).collect::<Vec<_>>();
        assert_eq!(offsets, [0, 3, 6]);
    }

    #[test]
    fn faces_not_offset() {
        let mut samples = Samples::Faces(vec![]);
        assert!(!samples.assign_offsets(Duration::ZERO, Duration::from_secs(1)));
    }

    #[test]
    fn group_remainder() {
        let err = group(&[1.0, 2.0, 3.0, 4.0], |[z, x, y]| (z, x, y)).unwrap_err();
        assert_eq!(err.get_ref(), &ParseError::InvalidSampleCount { count: 4, width: 3 });
        assert_eq!(group(&[1.0, 2.0, 3.0], |[z, x, y]| (z, x, y)).unwrap(), [(1.0, 2.0, 3.0)]);
    }
}
