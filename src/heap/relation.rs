// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::codec;
use super::file::HeapFile;
use crate::page::NoRoom;
use crate::value::{DataType, Identifier, Row};
use crate::{BlockId, Error, RecordId, Result};
use log::debug;
use std::path::Path;

/// Locator of one record: `(block_id, record_id)`.
///
/// Stable until the record it points at is deleted; deleting a record
/// invalidates its handle and no other.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle {
    /// Block the record lives in.
    pub block_id: BlockId,

    /// Record id inside that block.
    pub record_id: RecordId,
}

/// A named table stored as a heap of rows in one heap file.
///
/// The column name list and the parallel attribute list are authoritative:
/// rows presented to the relation must supply every declared column.
pub struct HeapTable {
    name: Identifier,
    column_names: Vec<Identifier>,
    column_types: Vec<DataType>,
    file: HeapFile,
}

impl HeapTable {
    /// A relation named `name` whose heap file is `<name>.db` inside `dir`.
    #[must_use]
    pub fn new(
        dir: &Path,
        name: Identifier,
        column_names: Vec<Identifier>,
        column_types: Vec<DataType>,
    ) -> Self {
        debug_assert_eq!(column_names.len(), column_types.len());

        let file = HeapFile::new(dir, name.as_str());
        Self {
            name,
            column_names,
            column_types,
            file,
        }
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// Declared column names, in order.
    #[must_use]
    pub fn column_names(&self) -> &[Identifier] {
        &self.column_names
    }

    /// Declared column attributes, parallel to [`HeapTable::column_names`].
    #[must_use]
    pub fn column_types(&self) -> &[DataType] {
        &self.column_types
    }

    /// Creates the backing heap file.
    pub fn create(&mut self) -> Result<()> {
        debug!("creating table {}", self.name);
        self.file.create()
    }

    /// Opens the table, creating the backing file when it does not exist
    /// yet.
    pub fn create_if_not_exists(&mut self) -> Result<()> {
        match self.open() {
            Err(Error::StoreMissing(_)) => self.create(),
            other => other,
        }
    }

    /// Opens the backing heap file. No-op when already open.
    pub fn open(&mut self) -> Result<()> {
        self.file.open()
    }

    /// Closes the backing heap file.
    pub fn close(&mut self) {
        self.file.close();
    }

    /// Drops the table, removing the backing file.
    pub fn drop_table(&mut self) -> Result<()> {
        debug!("dropping table {}", self.name);
        self.file.delete()
    }

    /// Appends a row, returning its handle.
    ///
    /// # Errors
    ///
    /// Fails with `MissingColumn` when the row lacks a declared column.
    pub fn insert(&mut self, row: &Row) -> Result<Handle> {
        self.open()?;
        let row = self.validate(row)?;
        self.append(&row)
    }

    /// In-place updates are not supported by the heap layout.
    pub fn update(&mut self, _handle: Handle, _values: &Row) -> Result<()> {
        Err(Error::Unimplemented("update"))
    }

    /// Deletes the record behind `handle`, invalidating the handle.
    pub fn del(&mut self, handle: Handle) -> Result<()> {
        self.open()?;
        let mut page = self.file.get(handle.block_id)?;
        page.del(handle.record_id);
        self.file.put(&page)
    }

    /// Handles of all rows matching `filter`, in ascending
    /// `(block_id, record_id)` order.
    ///
    /// A row matches when its projection onto the filter's columns equals
    /// the filter; `None` selects everything.
    pub fn select(&mut self, filter: Option<&Row>) -> Result<Vec<Handle>> {
        self.open()?;
        let mut handles = Vec::new();
        for block_id in 1..=self.file.last() {
            let record_ids = self.file.get(block_id)?.ids();
            for record_id in record_ids {
                let handle = Handle {
                    block_id,
                    record_id,
                };
                let selected = match filter {
                    None => true,
                    Some(filter) => self.matches(handle, filter)?,
                };
                if selected {
                    handles.push(handle);
                }
            }
        }
        Ok(handles)
    }

    /// The full row behind `handle`.
    pub fn project(&mut self, handle: Handle) -> Result<Row> {
        self.project_columns(handle, &[])
    }

    /// A sub-row of `handle` with exactly the named columns, or the full
    /// row when `names` is empty.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownColumn` when a name is not in the row.
    pub fn project_columns(&mut self, handle: Handle, names: &[Identifier]) -> Result<Row> {
        self.open()?;
        let page = self.file.get(handle.block_id)?;
        let bytes = page.get(handle.record_id).ok_or_else(|| {
            Error::CorruptRow(format!(
                "no record {} in block {} of table {}",
                handle.record_id, handle.block_id, self.name
            ))
        })?;
        let row = codec::unmarshal(bytes, &self.column_names, &self.column_types)?;

        if names.is_empty() {
            return Ok(row);
        }
        let mut projected = Row::new();
        for name in names {
            let value = row.get(name.as_str()).ok_or_else(|| {
                Error::UnknownColumn(format!(
                    "table {} does not have a column named '{name}'",
                    self.name
                ))
            })?;
            projected.set(name.clone(), value.clone());
        }
        Ok(projected)
    }

    fn matches(&mut self, handle: Handle, filter: &Row) -> Result<bool> {
        let names: Vec<Identifier> = filter.names().cloned().collect();
        let row = self.project_columns(handle, &names)?;
        Ok(row == *filter)
    }

    /// Reorders `row` into declared column order, checking completeness.
    fn validate(&self, row: &Row) -> Result<Row> {
        let mut full = Row::new();
        for name in &self.column_names {
            let value = row.get(name.as_str()).ok_or_else(|| {
                Error::MissingColumn(format!("row is missing declared column '{name}'"))
            })?;
            full.set(name.clone(), value.clone());
        }
        Ok(full)
    }

    /// Adds the marshalled row to the last block, overflowing onto a fresh
    /// block when that page has no room. This is the only place a page's
    /// `NoRoom` is caught.
    fn append(&mut self, row: &Row) -> Result<Handle> {
        let data = codec::marshal(row, &self.column_names, &self.column_types)?;

        let mut page = self.file.get(self.file.last())?;
        let record_id = match page.add(&data) {
            Ok(record_id) => record_id,
            Err(NoRoom) => {
                page = self.file.get_new()?;
                page.add(&data).map_err(|NoRoom| {
                    Error::NoRoom(format!(
                        "record of {} bytes does not fit in an empty page",
                        data.len()
                    ))
                })?
            }
        };
        self.file.put(&page)?;

        Ok(Handle {
            block_id: page.block_id(),
            record_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ident, Value};
    use test_log::test;

    fn table(dir: &Path) -> HeapTable {
        HeapTable::new(
            dir,
            ident("egg"),
            vec![ident("a"), ident("b")],
            vec![DataType::Int, DataType::Text],
        )
    }

    #[test]
    fn relation_insert_select_project() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut egg = table(dir.path());
        egg.create()?;

        let row = Row::new()
            .with(ident("a"), Value::Int(-1))
            .with(ident("b"), Value::from("hello"));
        let handle = egg.insert(&row)?;
        assert_eq!(handle, Handle { block_id: 1, record_id: 1 });

        let handles = egg.select(None)?;
        assert_eq!(handles, vec![handle]);
        assert_eq!(egg.project(handle)?, row);

        Ok(())
    }

    #[test]
    fn relation_rejects_incomplete_rows() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut egg = table(dir.path());
        egg.create()?;

        let row = Row::new().with(ident("a"), Value::Int(1));
        assert!(matches!(egg.insert(&row), Err(Error::MissingColumn(_))));

        Ok(())
    }

    #[test]
    fn relation_select_with_filter() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut egg = table(dir.path());
        egg.create()?;

        for n in 0..10 {
            let row = Row::new()
                .with(ident("a"), Value::Int(n % 2))
                .with(ident("b"), Value::from("x"));
            egg.insert(&row)?;
        }

        let filter = Row::new().with(ident("a"), Value::Int(1));
        let handles = egg.select(Some(&filter))?;
        assert_eq!(handles.len(), 5);
        for handle in handles {
            assert_eq!(egg.project(handle)?.get("a"), Some(&Value::Int(1)));
        }

        let filter = Row::new().with(ident("nope"), Value::Int(1));
        assert!(matches!(
            egg.select(Some(&filter)),
            Err(Error::UnknownColumn(_))
        ));

        Ok(())
    }

    #[test]
    fn relation_project_unknown_column() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut egg = table(dir.path());
        egg.create()?;

        let row = Row::new()
            .with(ident("a"), Value::Int(0))
            .with(ident("b"), Value::from("x"));
        let handle = egg.insert(&row)?;

        assert!(matches!(
            egg.project_columns(handle, &[ident("zzz")]),
            Err(Error::UnknownColumn(_))
        ));

        Ok(())
    }

    #[test]
    fn relation_update_is_unimplemented() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut egg = table(dir.path());
        egg.create()?;

        let row = Row::new()
            .with(ident("a"), Value::Int(0))
            .with(ident("b"), Value::from("x"));
        let handle = egg.insert(&row)?;

        assert!(matches!(
            egg.update(handle, &row),
            Err(Error::Unimplemented(_))
        ));

        Ok(())
    }

    #[test]
    fn relation_create_if_not_exists() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;

        let mut egg = table(dir.path());
        egg.create_if_not_exists()?;
        let row = Row::new()
            .with(ident("a"), Value::Int(5))
            .with(ident("b"), Value::from("kept"));
        egg.insert(&row)?;

        // second handle opens the same file instead of truncating it
        let mut egg = table(dir.path());
        egg.create_if_not_exists()?;
        assert_eq!(egg.select(None)?.len(), 1);

        assert!(matches!(egg.create(), Err(Error::StoreExists(_))));

        Ok(())
    }
}
