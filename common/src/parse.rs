//! Primitive types shared by the container and telemetry parsers.

mod fourcc;

pub use fourcc::FourCC;
