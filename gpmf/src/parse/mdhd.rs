#![allow(missing_docs)]

use bytes::BytesMut;
use gpmf_common::Result;

use super::error::ParseResultExt;
use super::{BoxType, FullBoxHeader, Mp4Prim, ParseBox, ParseError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MdhdBox {
    V1 { creation_time: u64, modification_time: u64, timescale: u32, duration: u64 },
    V0 { creation_time: u32, modification_time: u32, timescale: u32, duration: u32 },
}

impl MdhdBox {
    pub fn timescale(&self) -> u32 {
        match *self {
            Self::V1 { timescale, .. } | Self::V0 { timescale, .. } => timescale,
        }
    }
}

impl ParseBox for MdhdBox {
    const NAME: BoxType = BoxType::MDHD;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        let header = FullBoxHeader::parse(&mut *buf)?;
        let mdhd = match header.version {
            1 => Self::V1 {
                creation_time: u64::parse(&mut *buf).while_parsing_field(Self::NAME, "creation_time")?,
                modification_time: u64::parse(&mut *buf).while_parsing_field(Self::NAME, "modification_time")?,
                timescale: u32::parse(&mut *buf).while_parsing_field(Self::NAME, "timescale")?,
                duration: u64::parse(&mut *buf).while_parsing_field(Self::NAME, "duration")?,
            },
            0 => Self::V0 {
                creation_time: u32::parse(&mut *buf).while_parsing_field(Self::NAME, "creation_time")?,
                modification_time: u32::parse(&mut *buf).while_parsing_field(Self::NAME, "modification_time")?,
                timescale: u32::parse(&mut *buf).while_parsing_field(Self::NAME, "timescale")?,
                duration: u32::parse(&mut *buf).while_parsing_field(Self::NAME, "duration")?,
            },
            version => bail_attach!(ParseError::InvalidInput, format!("unknown mdhd version {version}")),
        };
        // languages and pre_defined
        let _ = <[u16; 2]>::parse(&mut *buf).while_parsing_field(Self::NAME, "languages")?;
        ensure_attach!(mdhd.timescale() != 0, ParseError::InvalidInput, "zero timescale");
        buf.clear();
        Ok(mdhd)
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_v0() {
        let mut data = BytesMut::from(&b"\0\0\0\0\0\0\0\x01\0\0\0\x02\0\0\x03\xe8\0\0\x27\x10\x55\xc4\0\0"[..]);
        let mdhd = MdhdBox::parse(&mut data).unwrap();
        assert_eq!(mdhd.timescale(), 1000);
        assert_matches!(mdhd, MdhdBox::V0 { duration: 10000, .. });
    }

    #[test]
    fn parse_v1() {
        let mut data = BytesMut::new();
        data.extend_from_slice(b"\x01\0\0\0");
        data.extend_from_slice(&[0; 16]);
        data.extend_from_slice(&90000u32.to_be_bytes());
        data.extend_from_slice(&u64::MAX.to_be_bytes());
        data.extend_from_slice(&[0; 4]);
        let mdhd = MdhdBox::parse(&mut data).unwrap();
        assert_eq!(mdhd.timescale(), 90000);
    }

    #[test]
    fn zero_timescale() {
        let mut data = BytesMut::from(&[0u8; 24][..]);
        assert_matches!(MdhdBox::parse(&mut data), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidInput);
        });
    }
}
