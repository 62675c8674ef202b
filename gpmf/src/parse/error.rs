//! Error types returned by the parsing API.

use std::fmt::{Debug, Display};

use derive_more::Display;
use gpmf_common::{Result, ResultExt};

use super::{BoxType, FourCC};

/// Error type returned by the container and telemetry parsers.
///
/// While the API of this error type is currently considered unstable, it is more stably guaranteed to implement
/// [`Display`] + [`Debug`].
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The input is invalid because its boxes are in an ordering or configuration disallowed by the ISO specification.
    #[error("Invalid box layout")]
    InvalidBoxLayout,

    /// The input is invalid.
    #[error("Invalid input")]
    InvalidInput,

    /// The input is invalid because it is missing a box required by the ISO specification.
    #[error("Missing required `{0}` box")]
    MissingRequiredBox(BoxType),

    /// The input ended before the end of a box.
    ///
    /// This can occur either when the entire input is truncated or when a box size is incorrect.
    #[error("Truncated box")]
    TruncatedBox,

    /// No track has a metadata handler whose name contains the telemetry marker.
    #[error("Telemetry track not found")]
    TrackNotFound,

    /// The telemetry track has neither a `stco` nor a `co64` chunk offset table.
    #[error("Missing chunk offset table")]
    MissingOffsetTable,

    /// A telemetry chunk ended in the middle of a record header or payload.
    #[error("Truncated telemetry stream")]
    TruncatedStream,

    /// A record key contains a byte which is not 7-bit ASCII.
    #[error("Invalid key `{0}`")]
    InvalidKey(FourCC),

    /// A record is compressed, which is not supported.
    #[error("Unsupported encoding of `{0}`")]
    UnsupportedEncoding(FourCC),

    /// A record has a type code which is not known.
    #[error("Unknown type code 0x{0:02x}")]
    UnknownType(u8),

    /// A record requires a type definition but none is visible to it.
    #[error("Missing type definition")]
    MissingTypeDefinition,

    /// The visible type definition is not one of the known face detection layouts.
    #[error("Unknown face layout `{0}`")]
    UnknownFaceLayout(String),

    /// The item size of a record disagrees with the size of its type definition.
    #[error("Type definition size mismatch: item size {actual} != {expected}")]
    TypeDefinitionSizeMismatch { expected: u8, actual: u8 },

    /// A date record does not follow the `yymmddhhmmss.sss` layout.
    #[error("Malformed date")]
    MalformedDate,

    /// A scale was declared but the value following it is not numeric.
    #[error("Value of type `{0}` cannot be scaled")]
    ScaleTypeMismatch(&'static str),

    /// A record holds a number of values which is not a multiple of its record width.
    #[error("Invalid sample count {count} for records of {width} values")]
    InvalidSampleCount { count: usize, width: usize },

    /// A record holds a value of a type its key does not allow.
    #[error("Unexpected value of type `{0}`")]
    UnexpectedValueType(&'static str),
}

#[doc(hidden)]
pub trait __ParseResultExt: ResultExt + Sized {
    #[track_caller]
    fn while_parsing_box(self, box_type: BoxType) -> Self {
        self.attach_printable(WhileParsingBox(box_type))
    }

    #[track_caller]
    fn while_parsing_field<T>(self, box_type: BoxType, field_name: T) -> Self
    where
        T: Display + Debug + Send + Sync + 'static,
    {
        self.attach_printable(WhileParsingField(box_type, field_name))
    }

    #[track_caller]
    fn while_decoding(self, key: FourCC) -> Self {
        self.attach_printable(WhileDecoding(key))
    }

    #[track_caller]
    fn where_eq<T, U>(self, lhs: T, rhs: U) -> Self
    where
        T: Display + Debug + Send + Sync + 'static,
        U: Display + Debug + Send + Sync + 'static,
    {
        self.attach_printable(WhereEq(lhs, rhs))
    }
}
pub(crate) use self::__ParseResultExt as ParseResultExt;

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "multiple `{}` boxes", _0)]
pub(crate) struct MultipleBoxes(pub(crate) BoxType);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while parsing `{}` box", _0)]
pub(crate) struct WhileParsingBox(pub(crate) BoxType);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while parsing `{}` box field `{}`", _0, _1)]
pub(crate) struct WhileParsingField<T>(pub(crate) BoxType, pub(crate) T);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while decoding `{}`", _0)]
pub(crate) struct WhileDecoding(pub(crate) FourCC);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "where `{} = {}`", _0, _1)]
pub(crate) struct WhereEq<T, U>(pub(crate) T, pub(crate) U);

impl<T> ParseResultExt for Result<T, ParseError> {}
