//! Unstable API for parsing the ISO-BMFF boxes which locate the telemetry track.

mod array;
mod co64;
pub mod error;
mod hdlr;
mod header;
mod integers;
mod mdhd;
mod mp4box;
mod stbl;
mod stco;
mod stsc;
mod stsz;
mod stts;
mod trak;

pub use array::{ArrayEntry, BoundedArray};
pub use co64::Co64Box;
pub use error::ParseError;
pub use hdlr::HdlrBox;
pub use header::{fourcc, BoxHeader, BoxSize, BoxType, BoxUuid, FullBoxHeader};
pub use integers::Mp4Prim;
pub use mdhd::MdhdBox;
pub use mp4box::{Boxes, ParseBox};
pub use stbl::{StblBox, StblCo};
pub use stco::StcoBox;
pub use stsc::{StscBox, StscEntry};
pub use stsz::StszBox;
pub use stts::{SttsBox, SttsEntry};
pub use trak::{MdiaBox, MinfBox, MoovBox, TrakBox};

pub use gpmf_common::parse::FourCC;
