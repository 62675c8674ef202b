//! The table of known record keys.
//!
//! See <https://github.com/gopro/gpmf-parser#gpmf-deeper-dive> for the meaning of each key.

use std::fmt;

use crate::parse::FourCC;
use crate::semantic::{self, Parser};

/// A known record key.
#[derive(Clone, Copy)]
pub struct KeyInfo {
    /// The four character code of the key.
    pub key: FourCC,

    /// The name used for the key in sticky metadata and in dumps.
    pub name: &'static str,

    /// What records of the key hold.
    pub description: &'static str,

    pub(crate) parser: Option<Parser>,
}

/// The metadata name under which a GPS fix is described in words.
pub const GPS_FIX_DESCRIPTION: &str = "gps_fix_description";

macro_rules! parser {
    () => {
        None
    };
    ($parser:path) => {
        Some($parser as Parser)
    };
}

macro_rules! keys {
    ($($key:ident => $name:literal, $description:literal $(, $parser:path)?;)+) => {
        $(
            #[doc = $description]
            pub const $key: FourCC = FourCC::from_str(stringify!($key));
        )+

        /// Every known key, in no particular order.
        pub static KEYS: &[KeyInfo] = &[
            $(KeyInfo { key: $key, name: $name, description: $description, parser: parser!($($parser)?) },)+
        ];
    };
}

keys! {
    DEVC => "DEVC", "Unique device source for metadata.";
    DVID => "device_id", "Device or track ID.", semantic::metadata;
    DVNM => "device_name", "Device name.", semantic::metadata;
    STRM => "STRM", "Nested signal stream of metadata or telemetry.";
    STNM => "stream_name", "Stream name.", semantic::metadata;
    RMRK => "RMRK", "Stream comment, for debugging.";
    SCAL => "scale", "Scaling factors (divisors) for the record that follows.", semantic::scale::parse;
    SIUN => "standard_units", "Standard units, like SI.", semantic::metadata;
    UNIT => "display_units", "Display units.", semantic::metadata;
    TYPE => "type_def", "Type definition of complex structures.", semantic::metadata;
    TIMO => "TIMO", "Time offset of the metadata stream that follows.";
    EMPT => "EMPT", "Payloads that are empty since the device start.";
    SHUT => "SHUT", "Shutter exposure times.";
    ACCL => "acceleration", "Accelerometer readings.", semantic::vector::acceleration;
    GYRO => "gyroscope", "Gyroscope readings.", semantic::vector::gyroscope;
    GPS5 => "gps", "GPS latitude, longitude, altitude, 2D speed and 3D speed.", semantic::gps::points;
    ISOG => "ISOG", "Image sensor gain.";
    GPSU => "gps_time", "UTC date and time from the GPS.", semantic::metadata;
    GPSF => "gps_fix", "GPS fix.", semantic::gps::fix;
    GPSP => "gps_dilution_of_precision", "GPS dilution of precision, times 100.", semantic::gps::dilution;
    STMP => "STMP", "Microsecond timestamp of the first sample.";
    MAGN => "magnetometer", "Magnetometer readings.", semantic::vector::magnetometer;
    FACE => "face_detection", "Face detection bounding boxes.", semantic::face::parse;
    FCNM => "faces", "Faces counted per frame.", semantic::has_metadata;
    ISOE => "sensor_iso", "Sensor ISO.", semantic::has_metadata;
    ALLD => "ALLD", "Auto low light frame.";
    WBAL => "WBAL", "White balance in Kelvin.";
    WRGB => "white_balance_rgb", "White balance RGB gains.", semantic::vector::white_balance;
    YAVG => "YAVG", "Luma average over the frame.";
    HUES => "HUES", "Predominant hues over the frame.";
    UNIF => "UNIF", "Image uniformity.";
    SCEN => "SCEN", "Scene classifier probabilities.";
    SROT => "SROT", "Sensor read out time.";
    CORI => "CORI", "Camera orientation.";
    IORI => "IORI", "Image orientation.";
    GRAV => "GRAV", "Gravity vector.";
    WNFM => "WNFM", "Wind processing.";
    MWET => "MWET", "Microphone is wet.";
    DISP => "DISP", "Disparity track, in 360 modes.";
    MSKP => "MSKP", "Main video frame skip.";
    LSKP => "LSKP", "Low resolution video frame skip.";
    TICK => "TICK", "Beginning of data timing in milliseconds.";
    TOCK => "TOCK", "End of data timing in milliseconds.";
    TSMP => "samples", "Total sample count including the current payload.", semantic::metadata;
    TMPC => "device_temperature", "Device temperature in Celsius.", semantic::metadata;
    QUAN => "QUAN", "Quantize used to enable stream compression.";
    VERS => "VERS", "Version of the metadata stream, for debugging.";
    FREE => "FREE", "Bytes reserved for more metadata added to an existing stream.";
    ORIN => "ORIN", "Input channel data orientation, lowercase is negative.";
    ORIO => "ORIO", "Output channel data orientation.";
    MTRX => "MTRX", "Matrix for sensor calibration.";
    PFRM => "PFRM", "Preformatted GPMF data.";
    STPS => "STPS", "Stream of all the timestamps delivered.";
}

/// Look up a known key.
pub fn key_info(key: FourCC) -> Option<&'static KeyInfo> {
    KEYS.iter().find(|info| info.key == key)
}

/// The friendly name of a known key, which is the key itself for keys without a more descriptive name.
pub fn friendly_name(key: FourCC) -> Option<&'static str> {
    key_info(key).map(|info| info.name)
}

impl fmt::Debug for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyInfo")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn unique() {
        let keys = KEYS.iter().map(|info| info.key).collect::<HashSet<_>>();
        assert_eq!(keys.len(), KEYS.len());
        let names = KEYS.iter().map(|info| info.name).collect::<HashSet<_>>();
        assert_eq!(names.len(), KEYS.len());
    }

    #[test]
    fn parsed_keys_have_names() {
        for info in KEYS.iter().filter(|info| info.parser.is_some()) {
            assert!(info.key != info.name, "{} has no friendly name", info.key);
            assert!(info.name.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{}", info.name);
        }
    }

    #[test]
    fn unparsed_keys_named_by_key() {
        for info in KEYS.iter().filter(|info| info.parser.is_none()) {
            assert!(info.key == info.name, "{}", info.key);
        }
    }

    #[test]
    fn lookup() {
        assert_eq!(friendly_name(GPS5), Some("gps"));
        assert_eq!(friendly_name(DEVC), Some("DEVC"));
        assert_eq!(friendly_name(FourCC::from_str("ZZZZ")), None);
        assert!(key_info(ACCL).unwrap().parser.is_some());
    }
}
