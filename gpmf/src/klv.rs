//! Key-length-value records.
//!
//! A telemetry chunk is a sequence of records, each an 8 byte [`KlvHeader`] followed by a payload padded to a
//! multiple of 4 bytes. Records of the nested type hold further records instead of a value.

mod element;
mod fixed;
mod header;
mod metadata;
mod reader;
mod types;
mod value;

pub use element::Element;
pub use fixed::{Q15_16, Q31_32};
pub use header::KlvHeader;
pub use metadata::{Metadata, MetadataContext};
pub use reader::{read_elements, MAX_NESTING_LEVEL};
pub use types::TypeCode;
pub use value::Value;
