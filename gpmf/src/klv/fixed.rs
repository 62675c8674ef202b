//! Fixed-point numbers carried by `q` and `Q` records.

use std::fmt;

use fixed::types::{I16F16, I32F32};
use serde::{Serialize, Serializer};

/// A signed fixed-point number with a 16 bit integer part and a 16 bit fraction.
///
/// One and a quarter is `Q15_16::from_bits(1 << 16 | 1 << 14)`, and formats as `1:16384`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Q15_16(i32);

/// A signed fixed-point number with a 32 bit integer part and a 32 bit fraction.
///
/// One and a quarter is `Q31_32::from_bits(1 << 32 | 1 << 30)`, and formats as `1:1073741824`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Q31_32(i64);

//
// Q15_16 impls
//

impl Q15_16 {
    /// One.
    pub const ONE: Self = Self(1 << 16);

    /// A number from its raw two's complement representation.
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// The raw two's complement representation.
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// The greatest integer less than or equal to `self`.
    pub const fn floor(self) -> i32 {
        self.0 >> 16
    }

    /// The nearest integer to `self`, with ties rounded up.
    pub const fn round(self) -> i32 {
        self.0.wrapping_add(0x8000) >> 16
    }

    /// The least integer greater than or equal to `self`.
    pub const fn ceil(self) -> i32 {
        self.0.wrapping_add(0xffff) >> 16
    }

    /// Multiply in fixed-point, rounding to nearest.
    pub const fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64 + (1 << 15)) >> 16) as i32)
    }

    /// The nearest double precision float.
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / f64::from(1u32 << 16)
    }
}

impl From<Q15_16> for I16F16 {
    fn from(value: Q15_16) -> Self {
        I16F16::from_bits(value.0)
    }
}

impl From<I16F16> for Q15_16 {
    fn from(value: I16F16) -> Self {
        Self(value.to_bits())
    }
}

impl fmt::Display for Q15_16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MASK: i32 = (1 << 16) - 1;
        if self.0 >= 0 {
            return write!(f, "{}:{:05}", self.0 >> 16, self.0 & MASK);
        }
        match self.0.checked_neg() {
            Some(x) => write!(f, "-{}:{:05}", x >> 16, x & MASK),
            None => f.write_str("-32768:00"),
        }
    }
}

impl Serialize for Q15_16 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

//
// Q31_32 impls
//

impl Q31_32 {
    /// One.
    pub const ONE: Self = Self(1 << 32);

    /// A number from its raw two's complement representation.
    pub const fn from_bits(bits: i64) -> Self {
        Self(bits)
    }

    /// The raw two's complement representation.
    pub const fn to_bits(self) -> i64 {
        self.0
    }

    /// The greatest integer less than or equal to `self`.
    pub const fn floor(self) -> i64 {
        self.0 >> 32
    }

    /// The nearest integer to `self`, with ties rounded up.
    pub const fn round(self) -> i64 {
        self.0.wrapping_add(0x8000_0000) >> 32
    }

    /// The least integer greater than or equal to `self`.
    pub const fn ceil(self) -> i64 {
        self.0.wrapping_add(0xffff_ffff) >> 32
    }

    /// Multiply in fixed-point, rounding to nearest.
    ///
    /// The 128 bit product is assembled from 32 bit halves rather than with a native 128 bit multiply.
    pub const fn mul(self, rhs: Self) -> Self {
        let (lo, hi) = mul_wide(self.0, rhs.0);
        let ret = ((hi << 32) | (lo >> 32)) as i64;
        Self(ret.wrapping_add(((lo >> 31) & 1) as i64))
    }

    /// The nearest double precision float.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1u64 << 32) as f64
    }
}

impl From<Q31_32> for I32F32 {
    fn from(value: Q31_32) -> Self {
        I32F32::from_bits(value.0)
    }
}

impl From<I32F32> for Q31_32 {
    fn from(value: I32F32) -> Self {
        Self(value.to_bits())
    }
}

impl fmt::Display for Q31_32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MASK: i64 = (1 << 32) - 1;
        if self.0 >= 0 {
            return write!(f, "{}:{:010}", self.0 >> 32, self.0 & MASK);
        }
        match self.0.checked_neg() {
            Some(x) => write!(f, "-{}:{:010}", x >> 32, x & MASK),
            None => f.write_str("-2147483647:0000"),
        }
    }
}

impl Serialize for Q31_32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Signed 64 x 64 bit multiply, returning the low and high halves of the 128 bit product.
const fn mul_wide(u: i64, v: i64) -> (u64, u64) {
    const MASK: u64 = (1 << 32) - 1;

    let u1 = (u >> 32) as u64;
    let u0 = u as u64 & MASK;
    let v1 = (v >> 32) as u64;
    let v0 = v as u64 & MASK;

    let w0 = u0.wrapping_mul(v0);
    let t = u1.wrapping_mul(v0).wrapping_add(w0 >> 32);
    let w2 = ((t as i64) >> 32) as u64;
    let w1 = (t & MASK).wrapping_add(u0.wrapping_mul(v1));

    let lo = (u as u64).wrapping_mul(v as u64);
    let hi = u1.wrapping_mul(v1).wrapping_add(w2).wrapping_add(((w1 as i64) >> 32) as u64);
    (lo, hi)
}
