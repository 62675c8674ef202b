use bytes::Buf;
use gpmf_common::Result;
use serde::Serialize;

use super::TypeCode;
use crate::parse::error::WhileDecoding;
use crate::parse::{FourCC, ParseError};

/// The 8 byte header in front of every record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KlvHeader {
    /// The four character code naming the record.
    #[serde(serialize_with = "serialize_key")]
    pub key: FourCC,
    /// How the payload is encoded.
    #[serde(rename = "Type", serialize_with = "serialize_type")]
    pub type_code: TypeCode,
    /// The size of one item in bytes.
    #[serde(rename = "Size")]
    pub item_size: u8,
    /// The number of items in the payload.
    #[serde(rename = "Count")]
    pub item_count: u16,
}

impl KlvHeader {
    /// The size of an encoded header.
    pub const ENCODED_LEN: usize = 8;

    /// Parse the next header from `buf`.
    ///
    /// Returns [`None`] if `buf` is empty, which is the only place a stream may end.
    pub fn parse<B: Buf>(mut buf: B) -> Result<Option<Self>, ParseError> {
        if !buf.has_remaining() {
            return Ok(None);
        }
        ensure_attach!(
            buf.remaining() >= Self::ENCODED_LEN,
            ParseError::TruncatedStream,
            format!("{} bytes left for header", buf.remaining()),
        );

        let key = FourCC::parse(&mut buf);
        if let Some((index, byte)) = key.first_non_ascii() {
            bail_attach!(ParseError::InvalidKey(key), format!("key[{index}] = 0x{byte:02x}"));
        }
        let code = buf.get_u8();
        let item_size = buf.get_u8();
        let item_count = buf.get_u16();

        let type_code = match TypeCode::from_code(code) {
            Some(TypeCode::Compressed) => bail_attach!(ParseError::UnsupportedEncoding(key)),
            Some(type_code) => type_code,
            None => bail_attach!(ParseError::UnknownType(code), WhileDecoding(key)),
        };
        Ok(Some(Self { key, type_code, item_size, item_count }))
    }

    /// The length of the payload, excluding padding.
    pub fn payload_len(&self) -> usize {
        usize::from(self.item_size) * usize::from(self.item_count)
    }

    /// The length of the payload rounded up to the next multiple of 4.
    pub fn padded_len(&self) -> usize {
        (self.payload_len() + 3) & !3
    }

    /// The number of zero bytes following the payload.
    pub fn padding(&self) -> usize {
        self.padded_len() - self.payload_len()
    }

    /// Whether the payload is a sequence of records.
    pub fn is_nested(&self) -> bool {
        self.type_code == TypeCode::Nested
    }
}

fn serialize_key<S: serde::Serializer>(key: &FourCC, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

fn serialize_type<S: serde::Serializer>(type_code: &TypeCode, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(type_code.name())
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse() {
        let mut data = &b"ACCLs\x06\x00\x0arest"[..];
        let header = KlvHeader::parse(&mut data).unwrap().unwrap();
        assert_eq!(header.key, FourCC::from_str("ACCL"));
        assert_eq!(header.type_code, TypeCode::I16);
        assert_eq!(header.payload_len(), 60);
        assert_eq!(header.padded_len(), 60);
        assert_eq!(data, b"rest");
    }

    #[test]
    fn padding() {
        let header = KlvHeader::parse(&b"DVNMc\x01\x00\x05"[..]).unwrap().unwrap();
        assert_eq!(header.payload_len(), 5);
        assert_eq!(header.padded_len(), 8);
        assert_eq!(header.padding(), 3);
        for count in 0..64u16 {
            let header = KlvHeader { item_count: count, ..header };
            assert!(header.padding() <= 3);
            assert_eq!(header.padded_len() % 4, 0);
        }
    }

    #[test]
    fn end_of_stream() {
        assert_matches!(KlvHeader::parse(&b""[..]), Ok(None));
    }

    #[test]
    fn truncated() {
        assert_matches!(KlvHeader::parse(&b"DEVC\0\x04"[..]), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::TruncatedStream);
        });
    }

    #[test]
    fn invalid_key() {
        assert_matches!(KlvHeader::parse(&b"DE\xc3C\0\x04\0\x01"[..]), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidKey(_));
        });
    }

    #[test]
    fn compressed() {
        assert_matches!(KlvHeader::parse(&b"ACCL#\x02\0\x01"[..]), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::UnsupportedEncoding(key) if *key == "ACCL");
        });
    }

    #[test]
    fn unknown_type() {
        assert_matches!(KlvHeader::parse(&b"ACCLx\x02\0\x01"[..]), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::UnknownType(b'x'));
        });
    }
}
