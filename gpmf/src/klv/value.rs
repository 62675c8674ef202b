use bytes::Buf;
use chrono::NaiveDateTime;
use gpmf_common::Result;
use serde::{Serialize, Serializer};

use super::{KlvHeader, Q15_16, Q31_32, TypeCode};
use crate::keys;
use crate::parse::ParseError;
use crate::semantic::{GpsDop, GpsFix, Samples};

/// The decoded value of a record.
///
/// A payload of exactly one item decodes to a scalar variant; any other count decodes to the matching sequence
/// variant. Semantic parsers replace the raw value of the keys they know with one of the domain variants.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
#[allow(missing_docs)]
pub enum Value {
    /// A container of nested records, which has no payload of its own.
    Nested,
    /// A structure described by a type definition, kept undecoded.
    Complex(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    I8(i8),
    I8s(Vec<i8>),
    U8(u8),
    U8s(Vec<u8>),
    I16(i16),
    I16s(Vec<i16>),
    U16(u16),
    U16s(Vec<u16>),
    I32(i32),
    I32s(Vec<i32>),
    U32(u32),
    U32s(Vec<u32>),
    I64(i64),
    I64s(Vec<i64>),
    U64(u64),
    U64s(Vec<u64>),
    F32(f32),
    F32s(Vec<f32>),
    F64(f64),
    F64s(Vec<f64>),
    Q15_16(Q15_16),
    Q15_16s(Vec<Q15_16>),
    Q31_32(Q31_32),
    Q31_32s(Vec<Q31_32>),
    Date(NaiveDateTime),
    Dates(Vec<NaiveDateTime>),
    String(String),
    Strings(Vec<String>),
    /// Measurements divided by a preceding scale declaration.
    Scaled(Vec<f64>),
    /// The divisors of a scale declaration.
    Scale(Vec<f64>),
    GpsFix(GpsFix),
    GpsDop(GpsDop),
    Samples(Samples),
}

const DATE_FORMAT: &str = "%y%m%d%H%M%S%.3f";

//
// Value impls
//

impl Value {
    /// Decode the payload of a non-nested record described by `header`.
    pub fn decode(header: &KlvHeader, payload: &[u8]) -> Result<Self, ParseError> {
        let value = match header.type_code {
            TypeCode::Nested => Self::Nested,
            TypeCode::Compressed => bail_attach!(ParseError::UnsupportedEncoding(header.key)),
            TypeCode::Complex => Self::Complex(payload.to_vec()),
            TypeCode::I8 => numbers(payload, 1, |mut buf| buf.get_i8(), Self::I8, Self::I8s),
            TypeCode::U8 => numbers(payload, 1, |mut buf| buf.get_u8(), Self::U8, Self::U8s),
            TypeCode::I16 => numbers(payload, 2, |mut buf| buf.get_i16(), Self::I16, Self::I16s),
            TypeCode::U16 => numbers(payload, 2, |mut buf| buf.get_u16(), Self::U16, Self::U16s),
            TypeCode::I32 => numbers(payload, 4, |mut buf| buf.get_i32(), Self::I32, Self::I32s),
            TypeCode::U32 => numbers(payload, 4, |mut buf| buf.get_u32(), Self::U32, Self::U32s),
            TypeCode::I64 => numbers(payload, 8, |mut buf| buf.get_i64(), Self::I64, Self::I64s),
            TypeCode::U64 => numbers(payload, 8, |mut buf| buf.get_u64(), Self::U64, Self::U64s),
            TypeCode::F32 => numbers(payload, 4, |mut buf| buf.get_f32(), Self::F32, Self::F32s),
            TypeCode::F64 => numbers(payload, 8, |mut buf| buf.get_f64(), Self::F64, Self::F64s),
            TypeCode::Q15_16 => numbers(
                payload,
                4,
                |mut buf| Q15_16::from_bits(buf.get_i32()),
                Self::Q15_16,
                Self::Q15_16s,
            ),
            TypeCode::Q31_32 => numbers(
                payload,
                8,
                |mut buf| Q31_32::from_bits(buf.get_i64()),
                Self::Q31_32,
                Self::Q31_32s,
            ),
            TypeCode::Date => {
                let mut dates = payload.chunks_exact(16).map(parse_date).collect::<Result<Vec<_>, _>>()?;
                match dates.len() {
                    1 => Self::Date(dates.remove(0)),
                    _ => Self::Dates(dates),
                }
            }
            TypeCode::String | TypeCode::FourCC | TypeCode::Guid => {
                let fix_units = header.key == keys::SIUN;
                if header.item_size == 1 || header.item_count == 1 {
                    Self::String(decode_string(payload, fix_units))
                } else {
                    ensure_attach!(
                        header.item_size != 0,
                        ParseError::InvalidSampleCount { count: usize::from(header.item_count), width: 0 },
                        "zero item size",
                    );
                    let strings = payload.chunks_exact(usize::from(header.item_size));
                    Self::Strings(strings.map(|raw| decode_string(raw, fix_units)).collect())
                }
            }
        };
        Ok(value)
    }

    /// Convert a numeric value to a sequence of floats, or [`None`] if it is not numeric.
    pub fn to_float_seq(&self) -> Option<Vec<f64>> {
        fn seq<T: Copy>(values: &[T], to_f64: impl Fn(T) -> f64) -> Option<Vec<f64>> {
            Some(values.iter().map(|value| to_f64(*value)).collect())
        }
        match self {
            Self::I8(value) => Some(vec![f64::from(*value)]),
            Self::I8s(values) => seq(values, f64::from),
            Self::U8(value) => Some(vec![f64::from(*value)]),
            Self::U8s(values) => seq(values, f64::from),
            Self::I16(value) => Some(vec![f64::from(*value)]),
            Self::I16s(values) => seq(values, f64::from),
            Self::U16(value) => Some(vec![f64::from(*value)]),
            Self::U16s(values) => seq(values, f64::from),
            Self::I32(value) => Some(vec![f64::from(*value)]),
            Self::I32s(values) => seq(values, f64::from),
            Self::U32(value) => Some(vec![f64::from(*value)]),
            Self::U32s(values) => seq(values, f64::from),
            Self::I64(value) => Some(vec![*value as f64]),
            Self::I64s(values) => seq(values, |value| value as f64),
            Self::U64(value) => Some(vec![*value as f64]),
            Self::U64s(values) => seq(values, |value| value as f64),
            Self::F32(value) => Some(vec![f64::from(*value)]),
            Self::F32s(values) => seq(values, f64::from),
            Self::F64(value) => Some(vec![*value]),
            Self::F64s(values) | Self::Scaled(values) | Self::Scale(values) => Some(values.clone()),
            Self::Q15_16(value) => Some(vec![value.to_f64()]),
            Self::Q15_16s(values) => seq(values, Q15_16::to_f64),
            Self::Q31_32(value) => Some(vec![value.to_f64()]),
            Self::Q31_32s(values) => seq(values, Q31_32::to_f64),
            Self::Nested
            | Self::Complex(_)
            | Self::Date(_)
            | Self::Dates(_)
            | Self::String(_)
            | Self::Strings(_)
            | Self::GpsFix(_)
            | Self::GpsDop(_)
            | Self::Samples(_) => None,
        }
    }

    /// The number of items in a sequence value, or [`None`] for scalars.
    pub fn sample_count(&self) -> Option<usize> {
        match self {
            Self::I8s(values) => Some(values.len()),
            Self::U8s(values) => Some(values.len()),
            Self::I16s(values) => Some(values.len()),
            Self::U16s(values) => Some(values.len()),
            Self::I32s(values) => Some(values.len()),
            Self::U32s(values) => Some(values.len()),
            Self::I64s(values) => Some(values.len()),
            Self::U64s(values) => Some(values.len()),
            Self::F32s(values) => Some(values.len()),
            Self::F64s(values) | Self::Scaled(values) | Self::Scale(values) => Some(values.len()),
            Self::Q15_16s(values) => Some(values.len()),
            Self::Q31_32s(values) => Some(values.len()),
            Self::Dates(values) => Some(values.len()),
            Self::Strings(values) => Some(values.len()),
            Self::Samples(samples) => Some(samples.len()),
            _ => None,
        }
    }

    /// The string, for a single string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(string) => Some(string),
            _ => None,
        }
    }

    /// Whether this is a container of nested records.
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested)
    }

    /// A short name for the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nested => "Nested",
            Self::Complex(_) => "Complex",
            Self::I8(_) => "Int8",
            Self::I8s(_) => "[Int8]",
            Self::U8(_) => "Uint8",
            Self::U8s(_) => "[Uint8]",
            Self::I16(_) => "Int16",
            Self::I16s(_) => "[Int16]",
            Self::U16(_) => "Uint16",
            Self::U16s(_) => "[Uint16]",
            Self::I32(_) => "Int32",
            Self::I32s(_) => "[Int32]",
            Self::U32(_) => "Uint32",
            Self::U32s(_) => "[Uint32]",
            Self::I64(_) => "Int64",
            Self::I64s(_) => "[Int64]",
            Self::U64(_) => "Uint64",
            Self::U64s(_) => "[Uint64]",
            Self::F32(_) => "Float32",
            Self::F32s(_) => "[Float32]",
            Self::F64(_) => "Float64",
            Self::F64s(_) => "[Float64]",
            Self::Q15_16(_) => "Q15_16",
            Self::Q15_16s(_) => "[Q15_16]",
            Self::Q31_32(_) => "Q31_32",
            Self::Q31_32s(_) => "[Q31_32]",
            Self::Date(_) => "Date",
            Self::Dates(_) => "[Date]",
            Self::String(_) => "String",
            Self::Strings(_) => "[String]",
            Self::Scaled(_) => "Scaled",
            Self::Scale(_) => "Scale",
            Self::GpsFix(_) => "GpsFix",
            Self::GpsDop(_) => "GpsDop",
            Self::Samples(_) => "Samples",
        }
    }
}

fn numbers<T>(
    payload: &[u8],
    width: usize,
    get: impl Fn(&[u8]) -> T,
    scalar: fn(T) -> Value,
    sequence: fn(Vec<T>) -> Value,
) -> Value {
    let mut values = payload.chunks_exact(width).map(get).collect::<Vec<_>>();
    match (values.pop(), values.is_empty()) {
        (Some(value), true) => scalar(value),
        (Some(value), false) => {
            values.push(value);
            sequence(values)
        }
        (None, _) => sequence(values),
    }
}

fn parse_date(raw: &[u8]) -> Result<NaiveDateTime, ParseError> {
    let date = std::str::from_utf8(raw)
        .map_err(|_| report_attach!(ParseError::MalformedDate, format!("non-UTF-8 date {raw:02x?}")))?;
    NaiveDateTime::parse_from_str(date, DATE_FORMAT)
        .map_err(|err| report_attach!(ParseError::MalformedDate, format!("date `{date}`: {err}")))
}

/// Decode a NUL-padded string.
///
/// Legacy unit strings encode a few symbols as single Latin-1 bytes, which are mapped when `fix_units` is set and the
/// string is not already valid UTF-8.
fn decode_string(raw: &[u8], fix_units: bool) -> String {
    let raw = match raw.iter().rposition(|byte| *byte != 0) {
        Some(last) => &raw[..=last],
        None => &[],
    };
    if let Ok(string) = std::str::from_utf8(raw) {
        return string.to_string();
    }
    if !fix_units {
        return String::from_utf8_lossy(raw).into_owned();
    }

    let mut string = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(index) = rest.iter().position(|byte| unit_symbol(*byte).is_some()) {
        string.push_str(&String::from_utf8_lossy(&rest[..index]));
        string.extend(unit_symbol(rest[index]));
        rest = &rest[index + 1..];
    }
    string.push_str(&String::from_utf8_lossy(rest));
    string
}

fn unit_symbol(byte: u8) -> Option<char> {
    match byte {
        0xb0 => Some('°'),
        0xb2 => Some('²'),
        0xb3 => Some('³'),
        0xb5 => Some('µ'),
        _ => None,
    }
}

fn serialize_hex<S: Serializer>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{data:02x?}"))
}
