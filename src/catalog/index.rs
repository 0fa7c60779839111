// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::heap::relation::Handle;
use crate::value::{Identifier, Row};
use crate::Result;

/// Handle to an index on a table.
///
/// The `_indices` catalog rows are the source of truth; the physical
/// on-disk structure does not exist yet, so lifecycle calls are no-ops and
/// lookups come back empty.
pub struct CatalogIndex {
    table: Identifier,
    name: Identifier,
}

impl CatalogIndex {
    pub(crate) fn new(table: Identifier, name: Identifier) -> Self {
        Self { table, name }
    }

    /// The table this index is on.
    #[must_use]
    pub fn table(&self) -> &Identifier {
        &self.table
    }

    /// The index name, unique per table.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// Builds the physical structure.
    pub fn create(&mut self) -> Result<()> {
        Ok(())
    }

    /// Removes the physical structure.
    pub fn drop_index(&mut self) -> Result<()> {
        Ok(())
    }

    /// Opens the physical structure.
    pub fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Closes the physical structure.
    pub fn close(&mut self) {}

    /// Handles of rows matching `key`. Empty until a physical structure
    /// exists.
    pub fn lookup(&mut self, _key: &Row) -> Result<Vec<Handle>> {
        Ok(Vec::new())
    }
}
