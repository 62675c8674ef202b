//! Encoders for GPMF key-length-value records.
//!
//! Every function returns one complete record: the 8 byte header followed by the payload, zero padded to a multiple
//! of 4 bytes.

use bytes::BufMut;

/// Encode a record with an explicit header.
pub fn record(key: &str, type_code: u8, item_size: u8, item_count: u16, payload: &[u8]) -> Vec<u8> {
    assert_eq!(key.len(), 4, "invalid key {key:?}");
    let mut data = Vec::with_capacity(8 + padded_len(payload.len()));
    data.put_slice(key.as_bytes());
    data.put_u8(type_code);
    data.put_u8(item_size);
    data.put_u16(item_count);
    data.put_slice(payload);
    data.resize(8 + padded_len(payload.len()), 0);
    data
}

/// Encode a nested record containing `children`, which must be complete records themselves.
pub fn nested<const N: usize>(key: &str, children: [Vec<u8>; N]) -> Vec<u8> {
    let payload = children.concat();
    let item_count = u16::try_from(payload.len() / 4).expect("nested payload too large");
    record(key, 0, 4, item_count, &payload)
}

/// Encode a string record of single byte characters.
pub fn string(key: &str, value: &str) -> Vec<u8> {
    record(key, b'c', 1, item_count(value.len()), value.as_bytes())
}

/// Encode a sequence of fixed width, zero filled strings.
pub fn strings(key: &str, width: u8, values: &[&str]) -> Vec<u8> {
    let mut payload = Vec::new();
    for value in values {
        assert!(value.len() <= usize::from(width), "string {value:?} wider than {width}");
        payload.put_slice(value.as_bytes());
        payload.put_bytes(0, usize::from(width) - value.len());
    }
    record(key, b'c', width, item_count(values.len()), &payload)
}

/// Encode a four character code record.
pub fn fourcc(key: &str, value: &str) -> Vec<u8> {
    assert_eq!(value.len(), 4, "invalid fourcc {value:?}");
    record(key, b'F', 4, 1, value.as_bytes())
}

/// Encode a date record from its 16 character `yymmddhhmmss.sss` form.
pub fn date(key: &str, value: &str) -> Vec<u8> {
    assert_eq!(value.len(), 16, "invalid date {value:?}");
    record(key, b'U', 16, 1, value.as_bytes())
}

/// Encode a record of structures described by a `TYPE` sibling, each `item_size` bytes of `raw`.
pub fn complex(key: &str, item_size: u8, raw: &[u8]) -> Vec<u8> {
    assert_eq!(raw.len() % usize::from(item_size), 0, "complex payload not a multiple of {item_size}");
    record(key, b'?', item_size, item_count(raw.len() / usize::from(item_size)), raw)
}

/// Encode a record of Q15.16 fixed point numbers from their raw bits.
pub fn q15_16s(key: &str, bits: &[i32]) -> Vec<u8> {
    let payload = bits.iter().flat_map(|bits| bits.to_be_bytes()).collect::<Vec<_>>();
    record(key, b'q', 4, item_count(bits.len()), &payload)
}

/// Encode a record of Q31.32 fixed point numbers from their raw bits.
pub fn q31_32s(key: &str, bits: &[i64]) -> Vec<u8> {
    let payload = bits.iter().flat_map(|bits| bits.to_be_bytes()).collect::<Vec<_>>();
    record(key, b'Q', 8, item_count(bits.len()), &payload)
}

macro_rules! numbers {
    ($($(#[$attr:meta])* $name:ident($ty:ty) = $code:literal;)*) => {
        $(
            $(#[$attr])*
            pub fn $name(key: &str, values: &[$ty]) -> Vec<u8> {
                let payload = values.iter().flat_map(|value| value.to_be_bytes()).collect::<Vec<_>>();
                record(key, $code, std::mem::size_of::<$ty>() as u8, item_count(values.len()), &payload)
            }
        )*
    };
}

numbers! {
    /// Encode a record of signed bytes.
    i8s(i8) = b'b';
    /// Encode a record of unsigned bytes.
    u8s(u8) = b'B';
    /// Encode a record of signed 16 bit integers.
    i16s(i16) = b's';
    /// Encode a record of unsigned 16 bit integers.
    u16s(u16) = b'S';
    /// Encode a record of signed 32 bit integers.
    i32s(i32) = b'l';
    /// Encode a record of unsigned 32 bit integers.
    u32s(u32) = b'L';
    /// Encode a record of signed 64 bit integers.
    i64s(i64) = b'j';
    /// Encode a record of unsigned 64 bit integers.
    u64s(u64) = b'J';
    /// Encode a record of single precision floats.
    f32s(f32) = b'f';
    /// Encode a record of double precision floats.
    f64s(f64) = b'd';
}

fn item_count(count: usize) -> u16 {
    u16::try_from(count).expect("too many items for one record")
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn padding() {
        let data = string("DVNM", "Hero");
        assert_eq!(data, b"DVNMc\x01\x00\x04Hero");

        let data = i16s("ACCL", &[1, -1, 2]);
        assert_eq!(data, b"ACCLs\x02\x00\x03\x00\x01\xff\xff\x00\x02\x00\x00");
    }

    #[test]
    fn nested_len() {
        let data = nested("DEVC", [u32s("DVID", &[1]), string("DVNM", "Hero9")]);
        assert_eq!(&data[..8], b"DEVC\x00\x04\x00\x07");
        assert_eq!(data.len(), 8 + 28);
    }
}
