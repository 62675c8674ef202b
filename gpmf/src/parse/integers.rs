#![allow(missing_docs)]

use std::mem::size_of;

use bytes::Buf;
use gpmf_common::error::WhileParsingType;
use gpmf_common::{Result, ResultExt};

use super::{FourCC, ParseError};

/// A fixed-size big-endian value which can be parsed from box data.
pub trait Mp4Prim: Sized {
    fn parse<B: Buf>(buf: B) -> Result<Self, ParseError>;
    fn encoded_len() -> u64;
}

//
// Mp4Prim impls
//

macro_rules! mp4_int {
    ($($ty:ty => $get_fun:ident),+ $(,)?) => {
        $(impl Mp4Prim for $ty {
            fn parse<B: Buf>(mut buf: B) -> Result<Self, ParseError> {
                ensure_attach!(
                    buf.remaining() >= Self::encoded_len() as usize,
                    ParseError::TruncatedBox,
                    WhileParsingType::new::<$ty>(),
                );
                Ok(buf.$get_fun())
            }

            fn encoded_len() -> u64 {
                size_of::<Self>() as u64
            }
        })+
    };
}

mp4_int! {
    u8 => get_u8,
    u16 => get_u16,
    u32 => get_u32,
    u64 => get_u64,
    i8 => get_i8,
    i16 => get_i16,
    i32 => get_i32,
    i64 => get_i64,
}

impl<T: Mp4Prim, const N: usize> Mp4Prim for [T; N]
where
    [T; N]: Default,
{
    fn parse<B: Buf>(mut buf: B) -> Result<Self, ParseError> {
        ensure_attach!(
            buf.remaining() >= Self::encoded_len() as usize,
            ParseError::TruncatedBox,
            WhileParsingType::new::<Self>(),
        );
        let mut parsed: [T; N] = Default::default();
        for value in &mut parsed {
            *value = T::parse(&mut buf)?;
        }
        Ok(parsed)
    }

    fn encoded_len() -> u64 {
        T::encoded_len() * N as u64
    }
}

impl Mp4Prim for FourCC {
    fn parse<B: Buf>(buf: B) -> Result<Self, ParseError> {
        Mp4Prim::parse(buf).map(|value| Self { value }).while_parsing_type()
    }

    fn encoded_len() -> u64 {
        Self::size()
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn big_endian() {
        assert_eq!(u32::parse(&b"\x01\x02\x03\x04"[..]).unwrap(), 0x01020304);
        assert_eq!(i16::parse(&b"\xff\xfe"[..]).unwrap(), -2);
        assert_eq!(<[u16; 2]>::parse(&b"\0\x01\0\x02"[..]).unwrap(), [1, 2]);
        assert_eq!(<FourCC as Mp4Prim>::parse(&b"hdlr"[..]).unwrap(), FourCC::from_str("hdlr"));
    }

    #[test]
    fn truncated() {
        assert_matches!(u64::parse(&b"\0\0\0\0"[..]), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::TruncatedBox);
        });
    }
}
