#![allow(missing_docs)]

use bytes::BytesMut;
use gpmf_common::Result;

use super::{Boxes, BoxType, HdlrBox, MdhdBox, ParseBox, ParseError, StblBox};

/// The movie box, holding every track of the file.
#[derive(Clone, Debug)]
pub struct MoovBox {
    children: Boxes,
}

/// A track, whose media is only parsed on demand.
#[derive(Clone, Debug)]
pub struct TrakBox {
    children: Boxes,
}

#[derive(Clone, Debug)]
pub struct MdiaBox {
    pub mdhd: MdhdBox,
    pub hdlr: HdlrBox,
    minf: MinfBox,
}

#[derive(Clone, Debug)]
pub struct MinfBox {
    children: Boxes,
}

//
// MoovBox impls
//

impl MoovBox {
    pub fn tracks(&self) -> Result<Vec<TrakBox>, ParseError> {
        self.children.get_all()
    }
}

impl ParseBox for MoovBox {
    const NAME: BoxType = BoxType::MOOV;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        Ok(Self { children: Boxes::new(Self::NAME, buf.split()) })
    }
}

//
// TrakBox impls
//

impl TrakBox {
    pub fn mdia(&self) -> Result<MdiaBox, ParseError> {
        self.children.get_required()
    }
}

impl ParseBox for TrakBox {
    const NAME: BoxType = BoxType::TRAK;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        Ok(Self { children: Boxes::new(Self::NAME, buf.split()) })
    }
}

//
// MdiaBox impls
//

impl MdiaBox {
    pub fn stbl(&self) -> Result<StblBox, ParseError> {
        self.minf.children.get_required()
    }
}

impl ParseBox for MdiaBox {
    const NAME: BoxType = BoxType::MDIA;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        let children = Boxes::new(Self::NAME, buf.split());
        Ok(Self { mdhd: children.get_required()?, hdlr: children.get_required()?, minf: children.get_required()? })
    }
}

//
// MinfBox impls
//

impl ParseBox for MinfBox {
    const NAME: BoxType = BoxType::MINF;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        Ok(Self { children: Boxes::new(Self::NAME, buf.split()) })
    }
}
