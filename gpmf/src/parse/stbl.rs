#![allow(missing_docs)]

use bytes::BytesMut;
use gpmf_common::Result;

use super::error::{ParseResultExt, WhileParsingBox};
use super::{Boxes, BoxType, Co64Box, ParseBox, ParseError, StcoBox, StscBox, StszBox, SttsBox};

/// The sample table of a track.
#[derive(Clone, Debug)]
pub struct StblBox {
    pub time_to_sample: SttsBox,
    pub sample_to_chunk: StscBox,
    pub sample_sizes: StszBox,
    pub chunk_offsets: Option<StblCo>,
}

/// A chunk offset table in either its 32-bit or 64-bit form.
#[derive(Clone, Debug)]
pub enum StblCo {
    Stco(StcoBox),
    Co64(Co64Box),
}

impl ParseBox for StblBox {
    const NAME: BoxType = BoxType::STBL;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        let children = Boxes::new(Self::NAME, buf.split());
        let chunk_offsets = match (children.get_one::<StcoBox>()?, children.get_one::<Co64Box>()?) {
            (Some(stco), None) => Some(StblCo::Stco(stco)),
            (None, Some(co64)) => Some(StblCo::Co64(co64)),
            (Some(_), Some(_)) => bail_attach!(
                ParseError::InvalidBoxLayout,
                "more than one stco and co64 present",
                WhileParsingBox(Self::NAME),
            ),
            (None, None) => None,
        };
        Ok(Self {
            time_to_sample: children.get_required()?,
            sample_to_chunk: children.get_required()?,
            sample_sizes: children.get_required()?,
            chunk_offsets,
        })
    }
}

//
// StblCo impls
//

impl StblCo {
    pub fn entry_count(&self) -> u32 {
        match self {
            Self::Stco(stco) => stco.entry_count(),
            Self::Co64(co64) => co64.entry_count(),
        }
    }

    /// The file offset of the chunk with the 1-based `chunk_index`.
    pub fn chunk_offset(&self, chunk_index: u32) -> Result<u64, ParseError> {
        let entry = chunk_index.checked_sub(1).and_then(|index| match self {
            Self::Stco(stco) => stco.entries().get(index).map(|entry| entry.map(u64::from)),
            Self::Co64(co64) => co64.entries().get(index),
        });
        match entry {
            Some(offset) => offset.while_parsing_box(self.box_type()),
            None => bail_attach!(
                ParseError::InvalidInput,
                format!("chunk {chunk_index} past end of {} offsets", self.entry_count()),
                WhileParsingBox(self.box_type()),
            ),
        }
    }

    fn box_type(&self) -> BoxType {
        match self {
            Self::Stco(_) => StcoBox::NAME,
            Self::Co64(_) => Co64Box::NAME,
        }
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    fn full_box(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = ((data.len() + 12) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(name);
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(data);
        out
    }

    fn stbl(offsets: &[Vec<u8>]) -> BytesMut {
        let mut data = Vec::new();
        data.extend(full_box(b"stts", b"\0\0\0\x01\0\0\0\x02\0\0\0\x64"));
        data.extend(full_box(b"stsc", b"\0\0\0\x01\0\0\0\x01\0\0\0\x02\0\0\0\x01"));
        data.extend(full_box(b"stsz", b"\0\0\0\x08\0\0\0\x02"));
        for offset in offsets {
            data.extend(offset);
        }
        BytesMut::from(&data[..])
    }

    #[test]
    fn stco_offsets() {
        let mut data = stbl(&[full_box(b"stco", b"\0\0\0\x02\0\0\x10\0\0\0\x20\0")]);
        let stbl = StblBox::parse(&mut data).unwrap();
        let chunk_offsets = stbl.chunk_offsets.unwrap();
        assert_eq!(chunk_offsets.entry_count(), 2);
        assert_eq!(chunk_offsets.chunk_offset(1).unwrap(), 0x1000);
        assert_eq!(chunk_offsets.chunk_offset(2).unwrap(), 0x2000);
        assert_matches!(chunk_offsets.chunk_offset(3), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidInput);
        });
        assert_matches!(chunk_offsets.chunk_offset(0), Err(_));
    }

    #[test]
    fn co64_offsets() {
        let mut data = stbl(&[full_box(b"co64", b"\0\0\0\x01\0\0\0\x01\0\0\0\0")]);
        let stbl = StblBox::parse(&mut data).unwrap();
        assert_eq!(stbl.chunk_offsets.unwrap().chunk_offset(1).unwrap(), 1 << 32);
    }

    #[test]
    fn no_offsets() {
        let mut data = stbl(&[]);
        assert!(StblBox::parse(&mut data).unwrap().chunk_offsets.is_none());
    }

    #[test]
    fn both_offsets() {
        let mut data = stbl(&[full_box(b"stco", b"\0\0\0\0"), full_box(b"co64", b"\0\0\0\0")]);
        assert_matches!(StblBox::parse(&mut data), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidBoxLayout);
        });
    }
}
