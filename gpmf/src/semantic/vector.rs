//! Three-axis sensors and white balance gains.

use std::time::Duration;

use gpmf_common::Result;
use serde::Serialize;

use super::{floats, group, serialize_offset, Samples, SiblingState, TimeSeries};
use crate::keys::KeyInfo;
use crate::klv::{Element, Value};
use crate::parse::ParseError;

/// A three-axis reading in the camera's axis order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct Axes {
    pub z: f64,
    pub x: f64,
    pub y: f64,
    /// Time of the reading from the start of the stream.
    #[serde(serialize_with = "serialize_offset")]
    pub offset: Duration,
}

/// White balance gains of each colour channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct WhiteBalanceRgb {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    #[serde(serialize_with = "serialize_offset")]
    pub offset: Duration,
}

pub(crate) fn acceleration(_: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    sensor(element, state, Samples::Acceleration)
}

pub(crate) fn gyroscope(_: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    sensor(element, state, Samples::Gyroscope)
}

pub(crate) fn magnetometer(_: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    sensor(element, state, Samples::Magnetometer)
}

/// Parse white balance gains, which are also declared as sticky metadata.
pub(crate) fn white_balance(
    info: &KeyInfo,
    element: &mut Element,
    state: &mut SiblingState<'_>,
) -> Result<(), ParseError> {
    element.metadata = state.metadata.snapshot();
    let gains = group(&floats(&element.value)?, |[red, green, blue]| WhiteBalanceRgb {
        red,
        green,
        blue,
        offset: Duration::ZERO,
    })?;
    element.value = Value::Samples(Samples::WhiteBalance(gains));
    state.metadata.declare(info.name, element.value.clone());
    Ok(())
}

fn sensor(
    element: &mut Element,
    state: &SiblingState<'_>,
    samples: fn(Vec<Axes>) -> Samples,
) -> Result<(), ParseError> {
    element.metadata = state.metadata.snapshot();
    let axes = group(&floats(&element.value)?, |[z, x, y]| Axes { z, x, y, offset: Duration::ZERO })?;
    element.value = Value::Samples(samples(axes));
    Ok(())
}

impl TimeSeries for Axes {
    fn set_offset(&mut self, offset: Duration) {
        self.offset = offset;
    }
}

impl TimeSeries for WhiteBalanceRgb {
    fn set_offset(&mut self, offset: Duration) {
        self.offset = offset;
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;
    use crate::keys;
    use crate::klv::{KlvHeader, MetadataContext, TypeCode};
    use crate::parse::FourCC;

    fn element(key: &str, value: Value) -> Element {
        let header = KlvHeader { key: FourCC::from_str(key), type_code: TypeCode::I16, item_size: 6, item_count: 1 };
        Element::new(2, header, value)
    }

    #[test]
    fn axis_order() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        state.metadata.declare("stream_name", Value::String("Gyroscope".into()));

        let mut element = element("GYRO", Value::I16s(vec![1, 2, 3, 4, 5, 6]));
        let info = keys::key_info(keys::GYRO).unwrap();
        gyroscope(info, &mut element, &mut state).unwrap();
        assert_matches!(&element.value, Value::Samples(Samples::Gyroscope(axes)) => {
            assert_eq!((axes[0].z, axes[0].x, axes[0].y), (1.0, 2.0, 3.0));
            assert_eq!((axes[1].z, axes[1].x, axes[1].y), (4.0, 5.0, 6.0));
        });
        assert_eq!(element.metadata["stream_name"], Value::String("Gyroscope".into()));
    }

    #[test]
    fn incomplete_axes() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        let mut element = element("ACCL", Value::I16s(vec![1, 2, 3, 4]));
        let info = keys::key_info(keys::ACCL).unwrap();
        assert_matches!(acceleration(info, &mut element, &mut state), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidSampleCount { count: 4, width: 3 });
        });
    }

    #[test]
    fn not_numeric() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        let mut element = element("MAGN", Value::String("xyz".into()));
        let info = keys::key_info(keys::MAGN).unwrap();
        assert_matches!(magnetometer(info, &mut element, &mut state), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::UnexpectedValueType("String"));
        });
    }

    #[test]
    fn white_balance_declared() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        let mut element = element("WRGB", Value::F32s(vec![1.5, 1.0, 2.0]));
        let info = keys::key_info(keys::WRGB).unwrap();
        white_balance(info, &mut element, &mut state).unwrap();
        let expected = WhiteBalanceRgb { red: 1.5, green: 1.0, blue: 2.0, offset: Duration::ZERO };
        assert_eq!(element.value, Value::Samples(Samples::WhiteBalance(vec![expected])));
        assert_eq!(state.metadata.get("white_balance_rgb"), Some(&element.value));
    }
}
