//! GPS positions and fix quality.

use std::fmt;
use std::time::Duration;

use gpmf_common::Result;
use serde::{Serialize, Serializer};

use super::{floats, group, serialize_offset, Samples, SiblingState, TimeSeries};
use crate::keys::{self, KeyInfo};
use crate::klv::{Element, Value};
use crate::parse::ParseError;

/// A GPS position and speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GpsPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in metres.
    pub altitude: f64,
    /// Ground speed in metres per second.
    #[serde(rename = "Speed")]
    pub speed_2d: f64,
    /// Speed in three dimensions, in metres per second.
    #[serde(rename = "Speed3D")]
    pub speed_3d: f64,
    /// Time of the point from the start of the stream.
    #[serde(serialize_with = "serialize_offset")]
    pub offset: Duration,
}

/// The kind of satellite lock of a GPS receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpsFix {
    /// No satellite lock.
    NoLock,
    /// A two dimensional fix, without altitude.
    Lock2d,
    /// A three dimensional fix.
    Lock3d,
    /// A value with no known meaning, including the reserved value 1.
    Unknown(u32),
}

/// GPS dilution of precision, where lower is better.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct GpsDop(pub f64);

/// A quality rating for a [`GpsDop`].
///
/// Adjacent ratings share their boundary value, so a dilution of exactly 2 is both [`Excellent`](Self::Excellent)
/// and [`Good`](Self::Good).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum DopClass {
    Ideal,
    Excellent,
    Good,
    Moderate,
    Fair,
    Poor,
}

pub(crate) fn points(_: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    element.metadata = state.metadata.snapshot();
    let points = group(&floats(&element.value)?, |[latitude, longitude, altitude, speed_2d, speed_3d]| GpsPoint {
        latitude,
        longitude,
        altitude,
        speed_2d,
        speed_3d,
        offset: Duration::ZERO,
    })?;
    element.value = Value::Samples(Samples::Gps(points));
    Ok(())
}

/// Parse a GPS fix, declaring it along with its description.
pub(crate) fn fix(info: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    ensure_matches_attach!(
        &element.value,
        Value::U32(raw),
        ParseError::UnexpectedValueType(element.value.type_name()),
    );
    let fix = GpsFix::from_raw(*raw);
    element.value = Value::GpsFix(fix);
    state.metadata.declare(info.name, element.value.clone());
    state.metadata.declare(keys::GPS_FIX_DESCRIPTION, Value::String(fix.to_string()));
    Ok(())
}

/// Parse a GPS dilution of precision, which is encoded times 100.
pub(crate) fn dilution(info: &KeyInfo, element: &mut Element, state: &mut SiblingState<'_>) -> Result<(), ParseError> {
    ensure_matches_attach!(
        &element.value,
        Value::U16(raw),
        ParseError::UnexpectedValueType(element.value.type_name()),
    );
    let dop = GpsDop(f64::from(*raw) / 100.0);
    element.value = Value::GpsDop(dop);
    state.metadata.declare(info.name, element.value.clone());
    Ok(())
}

//
// GpsFix impls
//

impl GpsFix {
    /// The fix for a raw `GPSF` value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::NoLock,
            2 => Self::Lock2d,
            3 => Self::Lock3d,
            _ => Self::Unknown(raw),
        }
    }

    /// The raw `GPSF` value.
    pub fn to_raw(self) -> u32 {
        match self {
            Self::NoLock => 0,
            Self::Lock2d => 2,
            Self::Lock3d => 3,
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for GpsFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLock => write!(f, "No lock"),
            Self::Lock2d => write!(f, "2D lock"),
            Self::Lock3d => write!(f, "3D lock"),
            Self::Unknown(raw) => write!(f, "unknown lock: {raw}"),
        }
    }
}

impl Serialize for GpsFix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.to_raw())
    }
}

//
// GpsDop impls
//

impl GpsDop {
    /// Below 1.
    pub fn ideal(self) -> bool {
        self.0 < 1.0
    }

    /// From 1 to 2.
    pub fn excellent(self) -> bool {
        (1.0..=2.0).contains(&self.0)
    }

    /// From 2 to 5.
    pub fn good(self) -> bool {
        (2.0..=5.0).contains(&self.0)
    }

    /// From 5 to 10.
    pub fn moderate(self) -> bool {
        (5.0..=10.0).contains(&self.0)
    }

    /// From 10 to 20.
    pub fn fair(self) -> bool {
        (10.0..=20.0).contains(&self.0)
    }

    /// Above 20.
    pub fn poor(self) -> bool {
        self.0 > 20.0
    }

    /// Every rating this dilution falls into, best first.
    pub fn classes(self) -> Vec<DopClass> {
        let ratings = [
            (self.ideal(), DopClass::Ideal),
            (self.excellent(), DopClass::Excellent),
            (self.good(), DopClass::Good),
            (self.moderate(), DopClass::Moderate),
            (self.fair(), DopClass::Fair),
            (self.poor(), DopClass::Poor),
        ];
        ratings.into_iter().filter_map(|(matches, class)| matches.then_some(class)).collect()
    }
}

impl fmt::Display for GpsDop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TimeSeries for GpsPoint {
    fn set_offset(&mut self, offset: Duration) {
        self.offset = offset;
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;
    use crate::klv::{KlvHeader, MetadataContext, TypeCode};
    use crate::parse::FourCC;

    fn element(key: &str, type_code: TypeCode, value: Value) -> Element {
        let header = KlvHeader { key: FourCC::from_str(key), type_code, item_size: 4, item_count: 1 };
        Element::new(2, header, value)
    }

    #[test]
    fn fix_variants() {
        assert_eq!(GpsFix::from_raw(0), GpsFix::NoLock);
        assert_eq!(GpsFix::from_raw(2).to_string(), "2D lock");
        assert_eq!(GpsFix::from_raw(3).to_string(), "3D lock");
        assert_eq!(GpsFix::from_raw(1).to_string(), "unknown lock: 1");
        assert_eq!(GpsFix::from_raw(99).to_string(), "unknown lock: 99");
        assert_eq!(GpsFix::from_raw(99).to_raw(), 99);
    }

    #[test]
    fn fix_declared() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        let mut element = element("GPSF", TypeCode::U32, Value::U32(3));
        fix(keys::key_info(keys::GPSF).unwrap(), &mut element, &mut state).unwrap();
        assert_eq!(element.value, Value::GpsFix(GpsFix::Lock3d));
        assert_eq!(state.metadata.get("gps_fix"), Some(&Value::GpsFix(GpsFix::Lock3d)));
        assert_eq!(state.metadata.get(keys::GPS_FIX_DESCRIPTION), Some(&Value::String("3D lock".into())));
    }

    #[test]
    fn fix_wrong_type() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        let mut element = element("GPSF", TypeCode::U16, Value::U16(3));
        assert_matches!(fix(keys::key_info(keys::GPSF).unwrap(), &mut element, &mut state), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::UnexpectedValueType("Uint16"));
        });
    }

    #[test]
    fn dilution_declared() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        let mut element = element("GPSP", TypeCode::U16, Value::U16(153));
        dilution(keys::key_info(keys::GPSP).unwrap(), &mut element, &mut state).unwrap();
        assert_eq!(element.value, Value::GpsDop(GpsDop(1.53)));
        assert_eq!(state.metadata.get("gps_dilution_of_precision"), Some(&element.value));
    }

    #[test]
    fn dop_bands() {
        assert_eq!(GpsDop(0.5).classes(), [DopClass::Ideal]);
        assert_eq!(GpsDop(1.0).classes(), [DopClass::Excellent]);
        assert_eq!(GpsDop(2.0).classes(), [DopClass::Excellent, DopClass::Good]);
        assert_eq!(GpsDop(5.0).classes(), [DopClass::Good, DopClass::Moderate]);
        assert_eq!(GpsDop(10.0).classes(), [DopClass::Moderate, DopClass::Fair]);
        assert_eq!(GpsDop(20.0).classes(), [DopClass::Fair]);
        assert_eq!(GpsDop(20.5).classes(), [DopClass::Poor]);
    }

    #[test]
    fn points_grouped() {
        let root = MetadataContext::root();
        let mut state = SiblingState::new(root.child());
        state.metadata.declare("gps_fix", Value::GpsFix(GpsFix::Lock3d));
        let mut element = element("GPS5", TypeCode::F64, Value::F64s(vec![51.5, -0.12, 35.0, 1.5, 1.75]));
        points(keys::key_info(keys::GPS5).unwrap(), &mut element, &mut state).unwrap();
        assert_matches!(&element.value, Value::Samples(Samples::Gps(points)) => {
            assert_eq!(points.len(), 1);
            assert_eq!(points[0].latitude, 51.5);
            assert_eq!(points[0].speed_3d, 1.75);
        });
        assert_eq!(element.metadata["gps_fix"], Value::GpsFix(GpsFix::Lock3d));
    }
}
