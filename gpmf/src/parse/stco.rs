#![allow(missing_docs)]

use bytes::{Buf, BytesMut};
use gpmf_common::Result;

use super::{BoundedArray, BoxType, FullBoxHeader, ParseBox, ParseError};

/// The 32-bit chunk offset table.
#[derive(Clone, Debug)]
pub struct StcoBox {
    entries: BoundedArray<u32, u32>,
}

impl StcoBox {
    pub fn entries(&self) -> &BoundedArray<u32, u32> {
        &self.entries
    }

    pub fn entry_count(&self) -> u32 {
        self.entries.entry_count()
    }
}

impl ParseBox for StcoBox {
    const NAME: BoxType = BoxType::STCO;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        FullBoxHeader::parse(&mut *buf)?;
        let entries = BoundedArray::parse(buf)?;
        ensure_attach!(!buf.has_remaining(), ParseError::InvalidInput, "extra unparsed input");
        Ok(Self { entries })
    }
}
