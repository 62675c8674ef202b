#![allow(missing_docs)]

use bytes::{Buf, BytesMut};
use gpmf_common::Result;

use super::{ArrayEntry, BoundedArray, BoxType, FullBoxHeader, Mp4Prim, ParseBox, ParseError};

/// The sample-to-chunk table.
#[derive(Clone, Debug)]
pub struct StscBox {
    entries: BoundedArray<u32, StscEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StscEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub samples_description_index: u32,
}

impl StscBox {
    pub fn entries(&self) -> impl ExactSizeIterator<Item = ArrayEntry<'_, StscEntry>> + '_ {
        self.entries.entries()
    }

    pub fn entry_count(&self) -> u32 {
        self.entries.entry_count()
    }
}

impl ParseBox for StscBox {
    const NAME: BoxType = BoxType::STSC;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        FullBoxHeader::parse(&mut *buf)?;
        let entries = BoundedArray::parse(buf)?;
        ensure_attach!(!buf.has_remaining(), ParseError::InvalidInput, "extra unparsed input");
        Ok(Self { entries })
    }
}

impl Mp4Prim for StscEntry {
    fn parse<B: Buf>(mut buf: B) -> Result<Self, ParseError> {
        Ok(Self {
            first_chunk: u32::parse(&mut buf)?,
            samples_per_chunk: u32::parse(&mut buf)?,
            samples_description_index: u32::parse(&mut buf)?,
        })
    }

    fn encoded_len() -> u64 {
        3 * u32::encoded_len()
    }
}
