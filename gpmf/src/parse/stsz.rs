#![allow(missing_docs)]

use bytes::{Buf, BytesMut};
use gpmf_common::Result;

use super::error::ParseResultExt;
use super::{BoundedArray, BoxType, FullBoxHeader, Mp4Prim, ParseBox, ParseError};

/// The sample size table.
#[derive(Clone, Debug)]
pub enum StszBox {
    FixedSize { sample_size: u32, sample_count: u32 },
    VariableSize { sample_sizes: BoundedArray<u32, u32> },
}

impl StszBox {
    pub fn sample_count(&self) -> u32 {
        match self {
            Self::FixedSize { sample_count, .. } => *sample_count,
            Self::VariableSize { sample_sizes } => sample_sizes.entry_count(),
        }
    }

    /// The size of the sample with the 1-based `sample_number`.
    pub fn sample_size(&self, sample_number: u32) -> Result<u32, ParseError> {
        ensure_attach!(
            (1..=self.sample_count()).contains(&sample_number),
            ParseError::InvalidInput,
            format!("sample {sample_number} out of range"),
        );
        match self {
            Self::FixedSize { sample_size, .. } => Ok(*sample_size),
            Self::VariableSize { sample_sizes } => match sample_sizes.get(sample_number - 1) {
                Some(sample_size) => sample_size.while_parsing_box(Self::NAME),
                None => bail_attach!(ParseError::InvalidInput, format!("sample {sample_number} out of range")),
            },
        }
    }
}

impl ParseBox for StszBox {
    const NAME: BoxType = BoxType::STSZ;

    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        FullBoxHeader::parse(&mut *buf)?;
        let sample_size = u32::parse(&mut *buf).while_parsing_field(Self::NAME, "sample_size")?;
        let stsz = match sample_size {
            0 => Self::VariableSize { sample_sizes: BoundedArray::parse(buf)? },
            _ => {
                let sample_count = u32::parse(&mut *buf).while_parsing_field(Self::NAME, "sample_count")?;
                Self::FixedSize { sample_size, sample_count }
            }
        };
        ensure_attach!(!buf.has_remaining(), ParseError::InvalidInput, "extra unparsed input");
        Ok(stsz)
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn fixed_size() {
        let mut data = BytesMut::from(&b"\0\0\0\0\0\0\0\x10\0\0\0\x03"[..]);
        let stsz = StszBox::parse(&mut data).unwrap();
        assert_eq!(stsz.sample_count(), 3);
        assert_eq!(stsz.sample_size(3).unwrap(), 16);
        assert_matches!(stsz.sample_size(4), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidInput);
        });
    }

    #[test]
    fn variable_size() {
        let mut data = BytesMut::from(&b"\0\0\0\0\0\0\0\0\0\0\0\x02\0\0\0\x07\0\0\0\x09"[..]);
        let stsz = StszBox::parse(&mut data).unwrap();
        assert_eq!(stsz.sample_count(), 2);
        assert_eq!(stsz.sample_size(1).unwrap(), 7);
        assert_eq!(stsz.sample_size(2).unwrap(), 9);
        assert_matches!(stsz.sample_size(0), Err(_));
    }
}
