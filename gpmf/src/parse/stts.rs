#![allow(missing_docs)]

use bytes::{Buf, BytesMut};
use gpmf_common::Result;

use super::{ArrayEntry, BoundedArray, BoxType, FullBoxHeader, Mp4Prim, ParseBox, ParseError};

/// The decoding time-to-sample table, run-length encoded.
#[derive(Clone, Debug)]
pub struct SttsBox {
    entries: BoundedArray<u32, SttsEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

impl SttsBox {
    pub fn entries(&self) -> impl ExactSizeIterator<Item = ArrayEntry<'_, SttsEntry>> + '_ {
        self.entries.entries()
    }

    pub fn entry_count(&self) -> u32 {
        self.entries.entry_count()
    }
}

impl ParseBox for SttsBox {
    const NAME: BoxType = BoxType::STTS;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        FullBoxHeader::parse(&mut *buf)?;
        let entries = BoundedArray::parse(buf)?;
        ensure_attach!(!buf.has_remaining(), ParseError::InvalidInput, "extra unparsed input");
        Ok(Self { entries })
    }
}

impl Mp4Prim for SttsEntry {
    fn parse<B: Buf>(mut buf: B) -> Result<Self, ParseError> {
        Ok(Self { sample_count: u32::parse(&mut buf)?, sample_delta: u32::parse(&mut buf)? })
    }

    fn encoded_len() -> u64 {
        2 * u32::encoded_len()
    }
}
