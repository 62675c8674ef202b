#![allow(missing_docs)]

use bytes::{Buf, BytesMut};
use gpmf_common::Result;

use super::error::{ParseResultExt, WhileParsingBox};
use super::{BoxHeader, BoxType, ParseError};

/// A box whose data can be parsed from an in-memory buffer.
pub trait ParseBox: Sized {
    const NAME: BoxType;

    /// Parse the box data, excluding the box header, consuming all of `buf`.
    fn parse(buf: &mut BytesMut) -> Result<Self, ParseError>;
}

/// An iterator over the child boxes contained in a parent box's data.
#[derive(Clone, Debug)]
pub struct Boxes {
    parent: BoxType,
    data: BytesMut,
}

//
// Boxes impls
//

impl Boxes {
    pub fn new(parent: BoxType, data: BytesMut) -> Self {
        Self { parent, data }
    }

    /// Find and parse the only child box of type `T`.
    ///
    /// Returns [`None`] if there is no such child, and an error if there is more than one.
    pub fn get_one<T: ParseBox>(&self) -> Result<Option<T>, ParseError> {
        let mut found = None;
        for child in self.clone() {
            let (header, mut data) = child?;
            if header.box_type() != T::NAME {
                continue;
            }
            ensure_attach!(
                found.is_none(),
                ParseError::InvalidBoxLayout,
                super::error::MultipleBoxes(T::NAME),
                WhileParsingBox(self.parent),
            );
            found = Some(T::parse(&mut data).while_parsing_box(T::NAME)?);
        }
        Ok(found)
    }

    /// Find and parse the only child box of type `T`, failing if it is missing.
    pub fn get_required<T: ParseBox>(&self) -> Result<T, ParseError> {
        self.get_one()?.ok_or_else(|| {
            report_attach!(ParseError::MissingRequiredBox(T::NAME), WhileParsingBox(self.parent))
        })
    }

    /// Parse every child box of type `T`, in order.
    pub fn get_all<T: ParseBox>(&self) -> Result<Vec<T>, ParseError> {
        let mut all = Vec::new();
        for child in self.clone() {
            let (header, mut data) = child?;
            if header.box_type() == T::NAME {
                all.push(T::parse(&mut data).while_parsing_box(T::NAME)?);
            }
        }
        Ok(all)
    }
}

impl Iterator for Boxes {
    type Item = Result<(BoxHeader, BytesMut), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.data.has_remaining() {
            return None;
        }
        let parent = self.parent;
        let child = (|| -> Result<(BoxHeader, BytesMut), ParseError> {
            let header = BoxHeader::parse(&mut self.data)?;
            let data_len = match header.box_data_size()? {
                Some(size) => size,
                None => self.data.remaining() as u64,
            };
            ensure_attach!(
                self.data.remaining() as u64 >= data_len,
                ParseError::TruncatedBox,
                WhileParsingBox(header.box_type()),
            );
            Ok((header, self.data.split_to(data_len as usize)))
        })()
        .while_parsing_box(parent);
        if child.is_err() {
            self.data.clear();
        }
        Some(child)
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[derive(Debug)]
    struct FreeBox(usize);

    impl ParseBox for FreeBox {
        const NAME: BoxType = BoxType::FREE;

        fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
            let len = buf.len();
            buf.clear();
            Ok(Self(len))
        }
    }

    fn children(data: &[u8]) -> Boxes {
        Boxes::new(BoxType::MOOV, BytesMut::from(data))
    }

    #[test]
    fn iterate() {
        let boxes = children(b"\0\0\0\x0afree\x01\x02\0\0\0\x08mdat");
        let types = boxes.map(|child| child.unwrap().0.box_type()).collect::<Vec<_>>();
        assert_eq!(types, [BoxType::FREE, BoxType::MDAT]);
    }

    #[test]
    fn get_one() {
        let boxes = children(b"\0\0\0\x08mdat\0\0\0\x0afree\x01\x02");
        assert_eq!(boxes.get_one::<FreeBox>().unwrap().map(|free| free.0), Some(2));
        assert_eq!(boxes.get_all::<FreeBox>().unwrap().len(), 1);
    }

    #[test]
    fn get_one_multiple() {
        let boxes = children(b"\0\0\0\x08free\0\0\0\x08free");
        assert_matches!(boxes.get_one::<FreeBox>(), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidBoxLayout);
        });
    }

    #[test]
    fn get_required_missing() {
        let boxes = children(b"\0\0\0\x08mdat");
        assert_matches!(boxes.get_required::<FreeBox>(), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::MissingRequiredBox(BoxType::FREE));
        });
    }

    #[test]
    fn truncated_child() {
        let mut boxes = children(b"\0\0\0\x10free\x01\x02");
        assert_matches!(boxes.next(), Some(Err(err)) => {
            assert_matches!(err.get_ref(), ParseError::TruncatedBox);
        });
        assert!(boxes.next().is_none());
    }
}
