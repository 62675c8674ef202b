#![allow(missing_docs)]

use std::fmt;
use std::io;
use std::mem::size_of;

use bytes::Buf;
use derive_more::{Display, From};
use futures_util::{pin_mut, AsyncRead, AsyncReadExt, FutureExt};
use gpmf_common::sync::buf_async_reader;
use gpmf_common::Result;

use super::error::WhileParsingBox;
use super::{FourCC, Mp4Prim, ParseError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxHeader {
    box_type: BoxType,
    box_size: BoxSize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxSize {
    UntilEof,
    Size(u32),
    Ext(u64),
}

#[derive(Clone, Copy, Debug, Display, From, PartialEq, Eq)]
pub enum BoxType {
    FourCC(FourCC),
    Uuid(BoxUuid),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct BoxUuid(pub [u8; 16]);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FullBoxHeader {
    pub version: u8,
    pub flags: u32,
}

//
// BoxHeader impls
//

impl BoxHeader {
    pub const MAX_SIZE: u64 = 32;

    /// Parse a header from the front of `input`, advancing it past the header.
    pub fn parse<B: Buf + Unpin>(input: B) -> Result<Self, ParseError> {
        Self::read(buf_async_reader(input))
            .now_or_never()
            .unwrap_or_else(|| unreachable!())
            .map_err(|_| report_attach!(ParseError::TruncatedBox, "while parsing box header"))
    }

    pub(crate) async fn read<R: AsyncRead>(input: R) -> io::Result<Self> {
        pin_mut!(input);

        let mut size = [0; 4];
        input.read_exact(&mut size).await?;

        let name = FourCC::read(&mut input).await?;

        let size = match u32::from_be_bytes(size) {
            0 => BoxSize::UntilEof,
            1 => {
                let mut size = [0; 8];
                input.read_exact(&mut size).await?;
                BoxSize::Ext(u64::from_be_bytes(size))
            }
            size => BoxSize::Size(size),
        };

        let name = match name {
            fourcc::UUID => {
                let mut uuid = [0; 16];
                input.read_exact(&mut uuid).await?;
                BoxType::Uuid(BoxUuid(uuid))
            }
            fourcc => fourcc.into(),
        };

        Ok(Self { box_type: name, box_size: size })
    }

    pub const fn encoded_len(&self) -> u64 {
        let mut size = FourCC::size() + size_of::<u32>() as u64;
        if let BoxSize::Ext(_) = self.box_size {
            size += size_of::<u64>() as u64;
        }
        if let BoxType::Uuid(_) = self.box_type {
            size += size_of::<BoxUuid>() as u64;
        }
        size
    }

    pub fn box_size(&self) -> Option<u64> {
        self.box_size.size()
    }

    /// The size of the box's data, excluding the header, or [`None`] if the box extends to the end of the input.
    pub fn box_data_size(&self) -> Result<Option<u64>, ParseError> {
        match self.box_size.size() {
            None => Ok(None),
            Some(size) => size
                .checked_sub(self.encoded_len())
                .ok_or_else(|| {
                    report_attach!(
                        ParseError::InvalidInput,
                        "box size too small",
                        WhileParsingBox(self.box_type)
                    )
                })
                .map(Some),
        }
    }

    pub const fn box_type(&self) -> BoxType {
        self.box_type
    }
}

impl BoxSize {
    pub const fn size(&self) -> Option<u64> {
        match *self {
            BoxSize::UntilEof => None,
            BoxSize::Size(size) => Some(size as u64),
            BoxSize::Ext(size) => Some(size),
        }
    }
}

macro_rules! box_type {
    ($($name:ident),+ $(,)?) => {
        /// Box type codes understood by the container locator.
        pub mod fourcc {
            use super::FourCC;
            $(pub const $name: FourCC = super::box_name_to_fourcc(stringify!($name));)+
        }

        impl BoxType {
            $(pub const $name: Self = Self::FourCC(fourcc::$name);)+
        }
    };
}

box_type! {
    CO64,
    FREE,
    FTYP,
    HDLR,
    MDAT,
    MDHD,
    MDIA,
    MINF,
    MOOV,
    STBL,
    STCO,
    STSC,
    STSZ,
    STTS,
    TRAK,
    UUID,
}

impl fmt::Display for BoxUuid {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self([a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p]) = *self;
        write!(
            fmt,
            "{a:02x}{b:02x}{c:02x}{d:02x}-{e:02x}{f:02x}-{g:02x}{h:02x}-{i:02x}{j:02x}-{k:02x}{l:02x}{m:02x}{n:02x}{o:02x}{p:02x}",
        )
    }
}

//
// FullBoxHeader impls
//

impl FullBoxHeader {
    pub fn parse<B: Buf>(mut buf: B) -> Result<Self, ParseError> {
        let version = u8::parse(&mut buf)?;
        let flags = <[u8; 3]>::parse(&mut buf)?;
        let flags = u32::from_be_bytes([0, flags[0], flags[1], flags[2]]);
        Ok(Self { version, flags })
    }

    pub const fn encoded_len(&self) -> u64 {
        4
    }
}

const fn box_name_to_fourcc(name: &str) -> FourCC {
    let name = name.as_bytes();
    let mut fourcc = [b' '; 4];
    let mut name_idx = 0;
    while name_idx < name.len() {
        fourcc[name_idx] = name[name_idx].to_ascii_lowercase();
        name_idx += 1;
    }
    FourCC { value: fourcc }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_compact() {
        let mut data = &b"\0\0\0\x10stts\x01\x02\x03\x04\x05\x06\x07\x08"[..];
        let header = BoxHeader::parse(&mut data).unwrap();
        assert_eq!(header.box_type(), BoxType::STTS);
        assert_eq!(header.box_size(), Some(16));
        assert_eq!(header.box_data_size().unwrap(), Some(8));
        assert_eq!(data.len(), 8);
    }

    #[test]
    fn parse_extended() {
        let mut data = &b"\0\0\0\x01mdat\0\0\0\0\0\0\0\x20"[..];
        let header = BoxHeader::parse(&mut data).unwrap();
        assert_eq!(header.box_type(), BoxType::MDAT);
        assert_eq!(header.encoded_len(), 16);
        assert_eq!(header.box_data_size().unwrap(), Some(16));
    }

    #[test]
    fn parse_until_eof() {
        let mut data = &b"\0\0\0\0moov"[..];
        let header = BoxHeader::parse(&mut data).unwrap();
        assert_eq!(header.box_type(), BoxType::MOOV);
        assert_eq!(header.box_data_size().unwrap(), None);
    }

    #[test]
    fn parse_uuid() {
        let mut data = &b"\0\0\0\x18uuidthisisatestuuid!"[..];
        let header = BoxHeader::parse(&mut data).unwrap();
        assert_eq!(header.box_type(), BoxType::Uuid(BoxUuid(*b"thisisatestuuid!")));
        assert_eq!(header.box_data_size().unwrap(), Some(0));
    }

    #[test]
    fn size_too_small() {
        let header = BoxHeader::parse(&b"\0\0\0\x04free"[..]).unwrap();
        assert_matches!(header.box_data_size(), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::InvalidInput);
        });
    }

    #[test]
    fn truncated() {
        assert_matches!(BoxHeader::parse(&b"\0\0\0"[..]), Err(err) => {
            assert_matches!(err.get_ref(), ParseError::TruncatedBox);
        });
    }
}
