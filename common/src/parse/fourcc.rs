use std::fmt;
use std::io;

use bytes::Buf;
use futures_util::{pin_mut, AsyncRead, AsyncReadExt};

/// A four-byte character code.
///
/// Used both for ISO-BMFF box types and for the keys of telemetry records.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FourCC {
    /// The character code, as an array of four bytes.
    pub value: [u8; 4],
}

impl FourCC {
    /// The encoded length of a [`FourCC`], in bytes.
    pub const ENCODED_LEN: u32 = 4;

    /// Construct a [`FourCC`] from a string, padding with spaces if it is shorter than four bytes.
    ///
    /// # Panics
    ///
    /// This function panics, at compile time when used in a const context, if `name` is longer than four bytes.
    pub const fn from_str(name: &str) -> Self {
        let name = name.as_bytes();
        assert!(name.len() <= 4, "FourCC longer than four bytes");
        let mut fourcc = [b' '; 4];
        let mut name_idx = 0;
        while name_idx < name.len() {
            fourcc[name_idx] = name[name_idx];
            name_idx += 1;
        }
        FourCC { value: fourcc }
    }

    /// Return the size of a [`FourCC`].
    pub const fn size() -> u64 {
        Self::ENCODED_LEN as u64
    }

    /// Whether every byte of the code is 7-bit ASCII.
    pub fn is_ascii(&self) -> bool {
        self.value.is_ascii()
    }

    /// The position and value of the first byte which is not 7-bit ASCII, if any.
    pub fn first_non_ascii(&self) -> Option<(usize, u8)> {
        self.value.iter().copied().enumerate().find(|(_, byte)| !byte.is_ascii())
    }

    /// Read a [`FourCC`] from an [`AsyncRead`].
    pub async fn read<R: AsyncRead>(input: R) -> io::Result<Self> {
        let mut value = [0; 4];
        pin_mut!(input);
        input.read_exact(&mut value).await?;
        Ok(Self { value })
    }

    /// Parse a [`FourCC`] from a [`Buf`].
    ///
    /// The position of `input` is advanced by 4.
    ///
    /// # Panics
    ///
    /// This function panics if `input.remaining() < 4`.
    pub fn parse<B: Buf>(mut input: B) -> Self {
        let mut value = [0; 4];
        input.copy_to_slice(&mut value);
        Self { value }
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(value: [u8; 4]) -> Self {
        Self { value }
    }
}

impl PartialEq<&str> for FourCC {
    fn eq(&self, other: &&str) -> bool {
        self.value[..] == *other.as_bytes()
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.value) {
            Ok(string) if self.is_ascii() => write!(f, "{}", string.trim_end_matches([' ', '\0'])),
            _ => write!(f, "0x{:08x}", u32::from_be_bytes(self.value)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(FourCC::from_str("GPS5").to_string(), "GPS5");
        assert_eq!(FourCC::from_str("url").to_string(), "url");
        assert_eq!(FourCC { value: *b"AB\xffD" }.to_string(), "0x4142ff44");
    }

    #[test]
    fn non_ascii() {
        assert!(FourCC::from_str("DEVC").is_ascii());
        assert_eq!(FourCC { value: *b"DE\x80C" }.first_non_ascii(), Some((2, 0x80)));
    }

    #[test]
    fn parse() {
        let mut input = &b"STRMrest"[..];
        assert_eq!(FourCC::parse(&mut input), FourCC::from_str("STRM"));
        assert_eq!(input, b"rest");
    }
}
