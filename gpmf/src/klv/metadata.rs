use std::collections::BTreeMap;

use super::Value;

/// Sticky metadata, keyed by friendly name.
pub type Metadata = BTreeMap<&'static str, Value>;

/// The metadata visible at one nesting level of a stream.
///
/// Declarations are made at the current level and read through to the enclosing levels, nearest first. A level
/// never modifies the levels it reads from.
#[derive(Debug, Default)]
pub struct MetadataContext<'a> {
    declared: Metadata,
    parent: Option<&'a MetadataContext<'a>>,
}

impl MetadataContext<'static> {
    /// The outermost level, with nothing declared.
    pub fn root() -> Self {
        Self::default()
    }
}

impl<'a> MetadataContext<'a> {
    /// A new, empty level below `self`.
    pub fn child(&self) -> MetadataContext<'_> {
        MetadataContext { declared: Metadata::new(), parent: Some(self) }
    }

    /// Declare `name` at this level, replacing any earlier declaration here.
    pub fn declare(&mut self, name: &'static str, value: Value) {
        self.declared.insert(name, value);
    }

    /// Look up `name` at this level, then in each enclosing level.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut context = Some(self);
        while let Some(current) = context {
            if let Some(value) = current.declared.get(name) {
                return Some(value);
            }
            context = current.parent;
        }
        None
    }

    /// Every visible declaration, flattened.
    pub fn snapshot(&self) -> Metadata {
        let mut snapshot = self.parent.map(MetadataContext::snapshot).unwrap_or_default();
        snapshot.extend(self.declared.iter().map(|(name, value)| (*name, value.clone())));
        snapshot
    }

    /// The declarations made at this level only.
    pub fn declared(&self) -> &Metadata {
        &self.declared
    }

    /// Take the declarations made at this level.
    pub fn into_declared(self) -> Metadata {
        self.declared
    }
}
