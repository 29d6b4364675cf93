//! The registry module maps OBIS object addresses onto semantic field kinds.
//!
//! Lookup is a linear scan returning the first exact match. Addresses are
//! unique by construction; [`FieldRegistry::duplicate_addresses`] exists so
//! tests can hold custom tables to that.

pub mod obis;
pub mod obis_map;

pub use obis::ObisCode;
pub use obis_map::STANDARD_OBIS_MAP;

use crate::dlms::field::FieldKind;
use serde::Serialize;
use std::borrow::Cow;

/// Immutable `(address, kind, width, label)` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub address: ObisCode,
    pub kind: FieldKind,
    /// Payload bytes delivered to the sink; authoritative over the record's own width
    pub width: usize,
    pub label: &'static str,
}

/// Address-to-kind lookup table used by the decoder.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    entries: Cow<'static, [RegistryEntry]>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FieldRegistry {
    /// The built-in three-phase meter table.
    pub fn standard() -> Self {
        Self::from_static(STANDARD_OBIS_MAP)
    }

    pub fn from_static(entries: &'static [RegistryEntry]) -> Self {
        FieldRegistry {
            entries: Cow::Borrowed(entries),
        }
    }

    pub fn from_entries(entries: Vec<RegistryEntry>) -> Self {
        FieldRegistry {
            entries: Cow::Owned(entries),
        }
    }

    /// First entry whose address equals `address`.
    pub fn lookup(&self, address: &ObisCode) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.address == *address)
    }

    /// First entry of the given kind.
    pub fn find_kind(&self, kind: FieldKind) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Addresses listed more than once.
    pub fn duplicate_addresses(&self) -> Vec<ObisCode> {
        let mut dupes = Vec::new();
        for (i, e) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|p| p.address == e.address)
                && !dupes.contains(&e.address)
            {
                dupes.push(e.address);
            }
        }
        dupes
    }
}
