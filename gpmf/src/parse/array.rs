#![allow(missing_docs)]

use std::marker::PhantomData;

use bytes::{Buf, BytesMut};
use derive_where::derive_where;
use gpmf_common::error::WhileParsingType;
use gpmf_common::{Result, ResultExt};

use super::{Mp4Prim, ParseError};

/// A table of fixed-size entries preceded by its entry count.
///
/// Entries are kept as raw bytes and only parsed when iterated.
#[derive(Default, PartialEq, Eq)]
#[derive_where(Clone, Debug; C)]
pub struct BoundedArray<C, T> {
    entry_count: C,
    entries: BytesMut,
    _t: PhantomData<T>,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ArrayEntry<'a, T> {
    data: &'a [u8],
    _t: PhantomData<T>,
}

//
// BoundedArray impls
//

impl<C: Mp4Prim + Into<u32> + Clone, T: Mp4Prim> BoundedArray<C, T> {
    pub fn parse(buf: &mut BytesMut) -> Result<Self, ParseError> {
        let entry_count = C::parse(&mut *buf).while_parsing_type()?;
        let entries_len = (T::encoded_len() as u32)
            .checked_mul(entry_count.clone().into())
            .ok_or_else(|| report_attach!(ParseError::InvalidInput, "overflow", WhileParsingType::new::<Self>()))?;
        ensure_attach!(
            buf.remaining() as u64 >= entries_len as u64,
            ParseError::TruncatedBox,
            WhileParsingType::new::<Self>(),
        );
        let entries = buf.split_to(entries_len as usize);
        Ok(Self { entry_count, entries, _t: PhantomData })
    }

    pub fn entries(&self) -> impl Iterator<Item = ArrayEntry<'_, T>> + ExactSizeIterator + '_ {
        self.entries
            .chunks_exact(T::encoded_len() as usize)
            .map(|data| ArrayEntry { data, _t: PhantomData })
    }

    /// Parse the entry at the zero-based `index`, if there is one.
    pub fn get(&self, index: u32) -> Option<Result<T, ParseError>> {
        let entry_len = T::encoded_len() as usize;
        let start = (index as usize).checked_mul(entry_len)?;
        let data = self.entries.get(start..start.checked_add(entry_len)?)?;
        Some(T::parse(data))
    }

    pub fn entry_count(&self) -> C {
        self.entry_count.clone()
    }
}

//
// ArrayEntry impls
//

impl<T: Mp4Prim> ArrayEntry<'_, T> {
    pub fn get(&self) -> Result<T, ParseError> {
        T::parse(self.data)
    }
}
