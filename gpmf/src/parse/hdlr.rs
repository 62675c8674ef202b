#![allow(missing_docs)]

use bytes::{Buf, BytesMut};
use gpmf_common::Result;

use super::error::ParseResultExt;
use super::{BoxType, FourCC, FullBoxHeader, Mp4Prim, ParseBox, ParseError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HdlrBox {
    pub handler_type: FourCC,
    pub name: String,
}

impl HdlrBox {
    /// The handler type of timed metadata tracks.
    pub const META: FourCC = FourCC::from_str("meta");
}

impl ParseBox for HdlrBox {
    const NAME: BoxType = BoxType::HDLR;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        FullBoxHeader::parse(&mut *buf)?;
        let _pre_defined = u32::parse(&mut *buf).while_parsing_field(Self::NAME, "pre_defined")?;
        let handler_type = <FourCC as Mp4Prim>::parse(&mut *buf).while_parsing_field(Self::NAME, "handler_type")?;
        let _reserved = <[u32; 3]>::parse(&mut *buf).while_parsing_field(Self::NAME, "reserved")?;

        // Names are NUL-terminated in ISO files but QuickTime writers, GoPro included, may length-prefix them.
        let name = String::from_utf8_lossy(buf.chunk()).trim_end_matches('\0').to_string();
        buf.clear();
        Ok(Self { handler_type, name })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse() {
        let mut data = BytesMut::from(&b"\0\0\0\0\0\0\0\0meta\0\0\0\0\0\0\0\0\0\0\0\0\x09GoPro MET\0"[..]);
        let hdlr = HdlrBox::parse(&mut data).unwrap();
        assert_eq!(hdlr.handler_type, HdlrBox::META);
        assert!(hdlr.name.contains("GoPro MET"));
        assert!(data.is_empty());
    }
}
