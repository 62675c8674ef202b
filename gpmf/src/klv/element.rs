use serde::Serialize;

use super::{KlvHeader, Metadata, Value};
use crate::keys;
use crate::parse::FourCC;

/// A decoded record and, for nested records, its children.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Element {
    /// The nesting depth of the record, where top-level records are at level 0.
    pub level: usize,

    /// The header as it was read.
    pub header: KlvHeader,

    /// For sensor records, the sticky metadata visible to it. For nested records, the metadata declared by its
    /// children.
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,

    /// The children of a nested record.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<Element>,

    /// The decoded payload.
    #[serde(rename = "Data", skip_serializing_if = "Value::is_nested")]
    pub value: Value,
}

impl Element {
    /// A record with no metadata and no children.
    pub fn new(level: usize, header: KlvHeader, value: Value) -> Self {
        Self { level, header, metadata: Metadata::new(), nested: Vec::new(), value }
    }

    /// The key of the record.
    pub fn key(&self) -> FourCC {
        self.header.key
    }

    /// The friendly name of the key, or [`None`] if the key is not known.
    pub fn friendly_name(&self) -> Option<&'static str> {
        keys::friendly_name(self.header.key)
    }

    /// Look up the metadata of this element declared by `key`.
    pub fn metadata_by_key(&self, key: FourCC) -> Option<&Value> {
        self.metadata.get(keys::friendly_name(key)?)
    }
}
