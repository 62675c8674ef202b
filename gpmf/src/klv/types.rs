use std::fmt;

/// The type code of a record, selecting how its payload is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TypeCode {
    Nested,
    Compressed,
    Complex,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Q15_16,
    Q31_32,
    Date,
    String,
    FourCC,
    Guid,
}

/// Every type code with its byte on the wire.
const TYPE_CODES: [(u8, TypeCode); 19] = [
    (0, TypeCode::Nested),
    (b'#', TypeCode::Compressed),
    (b'?', TypeCode::Complex),
    (b'b', TypeCode::I8),
    (b'B', TypeCode::U8),
    (b's', TypeCode::I16),
    (b'S', TypeCode::U16),
    (b'l', TypeCode::I32),
    (b'L', TypeCode::U32),
    (b'j', TypeCode::I64),
    (b'J', TypeCode::U64),
    (b'f', TypeCode::F32),
    (b'd', TypeCode::F64),
    (b'q', TypeCode::Q15_16),
    (b'Q', TypeCode::Q31_32),
    (b'U', TypeCode::Date),
    (b'c', TypeCode::String),
    (b'F', TypeCode::FourCC),
    (b'G', TypeCode::Guid),
];

impl TypeCode {
    /// The type code for a byte on the wire, if it is one.
    pub fn from_code(code: u8) -> Option<Self> {
        TYPE_CODES.iter().find(|(known, _)| *known == code).map(|(_, type_code)| *type_code)
    }

    /// The byte on the wire.
    pub fn code(self) -> u8 {
        TYPE_CODES.iter().find(|(_, known)| *known == self).map_or(0, |(code, _)| *code)
    }

    /// The width in bytes of one decoded value, for numeric and date types.
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::I8 | Self::U8 => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::I32 | Self::U32 | Self::F32 | Self::Q15_16 => Some(4),
            Self::I64 | Self::U64 | Self::F64 | Self::Q31_32 => Some(8),
            Self::Date => Some(16),
            Self::Nested | Self::Compressed | Self::Complex | Self::String | Self::FourCC | Self::Guid => None,
        }
    }

    /// Whether values of this type are plain numbers which may be scaled.
    pub const fn is_numeric(self) -> bool {
        self.width().is_some() && !matches!(self, Self::Date)
    }

    /// The name used when dumping headers.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nested => "Nested",
            Self::Compressed => "Compressed",
            Self::Complex => "Complex",
            Self::I8 => "Int8",
            Self::U8 => "Uint8",
            Self::I16 => "Int16",
            Self::U16 => "Uint16",
            Self::I32 => "Int32",
            Self::U32 => "Uint32",
            Self::I64 => "Int64",
            Self::U64 => "Uint64",
            Self::F32 => "Float32",
            Self::F64 => "Float64",
            Self::Q15_16 => "Q15_16",
            Self::Q31_32 => "Q31_32",
            Self::Date => "Date",
            Self::String => "String",
            Self::FourCC => "FourCC",
            Self::Guid => "GUID",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup() {
        for (code, type_code) in TYPE_CODES {
            assert_eq!(TypeCode::from_code(code), Some(type_code));
            assert_eq!(type_code.code(), code);
        }
        assert_eq!(TypeCode::from_code(b'x'), None);
    }

    #[test]
    fn widths() {
        assert_eq!(TypeCode::Q15_16.width(), Some(4));
        assert_eq!(TypeCode::Q31_32.width(), Some(8));
        assert_eq!(TypeCode::Date.width(), Some(16));
        assert_eq!(TypeCode::String.width(), None);
        assert!(TypeCode::F64.is_numeric());
        assert!(!TypeCode::Date.is_numeric());
    }
}
