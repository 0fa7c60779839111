// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The self-describing schema catalog.
//!
//! Three singleton relations describe everything the engine stores:
//! `_tables` (one row per table), `_columns` (one row per column) and
//! `_indices` (one row per index column). They are themselves heap tables,
//! bootstrapped on first use in a database environment, and `_tables` and
//! `_columns` describe themselves in their own rows.

pub mod index;

pub use index::CatalogIndex;

use crate::heap::relation::{Handle, HeapTable};
use crate::value::{ident, DataType, Identifier, Row, Value};
use crate::{Error, Result};
use log::{debug, info};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Name of the table-of-tables.
pub const TABLES: &str = "_tables";

/// Name of the table-of-columns.
pub const COLUMNS: &str = "_columns";

/// Name of the table-of-indices.
pub const INDICES: &str = "_indices";

/// Whether `name` is one of the three schema tables.
#[must_use]
pub fn is_schema_table(name: &str) -> bool {
    name == TABLES || name == COLUMNS || name == INDICES
}

/// Fixed schemas of the catalog relations, in bootstrap order.
const SCHEMA: &[(&str, &[(&str, DataType)])] = &[
    (TABLES, &[("table_name", DataType::Text)]),
    (
        COLUMNS,
        &[
            ("table_name", DataType::Text),
            ("column_name", DataType::Text),
            ("data_type", DataType::Text),
        ],
    ),
    (
        INDICES,
        &[
            ("table_name", DataType::Text),
            ("index_name", DataType::Text),
            ("column_name", DataType::Text),
            ("seq_in_index", DataType::Int),
            ("index_type", DataType::Text),
            ("is_unique", DataType::Boolean),
        ],
    ),
];

fn schema_relation(dir: &Path, name: &str) -> HeapTable {
    let (_, columns) = SCHEMA
        .iter()
        .find(|(table, _)| *table == name)
        .expect("cannot fail");
    HeapTable::new(
        dir,
        ident(name),
        columns.iter().map(|(column, _)| ident(column)).collect(),
        columns.iter().map(|(_, data_type)| *data_type).collect(),
    )
}

/// Search key of an index, as derived from its `_indices` rows.
pub struct IndexKey {
    /// Key columns, ordered by `seq_in_index`.
    pub columns: Vec<Identifier>,

    /// Whether the index type is HASH.
    pub is_hash: bool,

    /// Whether the key is unique for the relation.
    pub is_unique: bool,
}

/// Schema catalog plus caches of instantiated relations and indices.
///
/// One catalog value is the context for all DDL in a database environment;
/// tests construct their own per case.
pub struct Catalog {
    dir: PathBuf,
    tables: HeapTable,
    columns: HeapTable,
    indices: HeapTable,
    table_cache: FxHashMap<String, HeapTable>,
    index_cache: FxHashMap<(String, String), CatalogIndex>,
}

impl Catalog {
    /// Opens the catalog in `dir`, bootstrapping the schema tables on
    /// first use.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let mut catalog = Self {
            dir: dir.to_path_buf(),
            tables: schema_relation(dir, TABLES),
            columns: schema_relation(dir, COLUMNS),
            indices: schema_relation(dir, INDICES),
            table_cache: FxHashMap::default(),
            index_cache: FxHashMap::default(),
        };
        catalog.bootstrap()?;
        Ok(catalog)
    }

    /// Directory holding the environment's heap files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The `_tables` relation. Read through this for scans; mutations must
    /// go through the validated insert/delete operations.
    pub fn tables(&mut self) -> &mut HeapTable {
        &mut self.tables
    }

    /// The `_columns` relation.
    pub fn columns(&mut self) -> &mut HeapTable {
        &mut self.columns
    }

    /// The `_indices` relation.
    pub fn indices(&mut self) -> &mut HeapTable {
        &mut self.indices
    }

    /// Creates missing schema tables, seeding their self-describing rows.
    fn bootstrap(&mut self) -> Result<()> {
        match self.tables.open() {
            Ok(()) => {}
            Err(Error::StoreMissing(_)) => {
                info!("bootstrapping schema catalog in {}", self.dir.display());
                self.tables.create()?;
                for (table, _) in SCHEMA {
                    let row = Row::new().with(ident("table_name"), Value::from(*table));
                    self.insert_table(&row)?;
                }
            }
            Err(e) => return Err(e),
        }

        match self.columns.open() {
            Ok(()) => {}
            Err(Error::StoreMissing(_)) => {
                self.columns.create()?;
                for (table, columns) in SCHEMA {
                    for (column, data_type) in *columns {
                        let row = Row::new()
                            .with(ident("table_name"), Value::from(*table))
                            .with(ident("column_name"), Value::from(*column))
                            .with(ident("data_type"), Value::from(data_type.as_str()));
                        self.insert_column(&row)?;
                    }
                }
            }
            Err(e) => return Err(e),
        }

        match self.indices.open() {
            Ok(()) => Ok(()),
            Err(Error::StoreMissing(_)) => self.indices.create(),
            Err(e) => Err(e),
        }
    }

    /// Inserts a row into `_tables`, enforcing `table_name` uniqueness.
    pub fn insert_table(&mut self, row: &Row) -> Result<Handle> {
        let name = require_identifier(row, "table_name")?.to_owned();

        let key = key_row(row, &["table_name"])?;
        if !self.tables.select(Some(&key))?.is_empty() {
            return Err(Error::Duplicate(format!("{name} already exists")));
        }
        self.tables.insert(row)
    }

    /// Inserts a row into `_columns`, enforcing
    /// `(table_name, column_name)` uniqueness.
    pub fn insert_column(&mut self, row: &Row) -> Result<Handle> {
        let table = require_identifier(row, "table_name")?.to_owned();
        let column = require_identifier(row, "column_name")?.to_owned();
        require_data_type(row)?;

        let key = key_row(row, &["table_name", "column_name"])?;
        if !self.columns.select(Some(&key))?.is_empty() {
            return Err(Error::Duplicate(format!("duplicate column {table}.{column}")));
        }
        self.columns.insert(row)
    }

    /// Inserts a row into `_indices`, enforcing
    /// `(table_name, index_name, column_name)` uniqueness.
    pub fn insert_index(&mut self, row: &Row) -> Result<Handle> {
        let table = require_identifier(row, "table_name")?.to_owned();
        let index = require_identifier(row, "index_name")?.to_owned();
        let column = require_identifier(row, "column_name")?.to_owned();

        let key = key_row(row, &["table_name", "index_name", "column_name"])?;
        if !self.indices.select(Some(&key))?.is_empty() {
            return Err(Error::Duplicate(format!(
                "duplicate index column {table}.{index}.{column}"
            )));
        }
        self.indices.insert(row)
    }

    /// Deletes a `_tables` row.
    ///
    /// The cache entry goes first, so a later `get_table` can never hand
    /// out a relation for the deleted row.
    pub fn delete_table(&mut self, handle: Handle) -> Result<()> {
        let row = self.tables.project(handle)?;
        if let Some(name) = row.get("table_name").and_then(Value::as_text) {
            self.table_cache.remove(name);
        }
        self.tables.del(handle)
    }

    /// Deletes a `_columns` row.
    pub fn delete_column(&mut self, handle: Handle) -> Result<()> {
        self.columns.del(handle)
    }

    /// Deletes an `_indices` row, invalidating the index cache entry.
    pub fn delete_index(&mut self, handle: Handle) -> Result<()> {
        let row = self.indices.project(handle)?;
        if let (Some(table), Some(index)) = (
            row.get("table_name").and_then(Value::as_text),
            row.get("index_name").and_then(Value::as_text),
        ) {
            self.index_cache.remove(&(table.to_owned(), index.to_owned()));
        }
        self.indices.del(handle)
    }

    /// The instantiated relation for `table`, built from its `_columns`
    /// rows on first reference and cached afterwards.
    pub fn get_table(&mut self, table: &str) -> Result<&mut HeapTable> {
        match table {
            TABLES => return Ok(&mut self.tables),
            COLUMNS => return Ok(&mut self.columns),
            INDICES => return Ok(&mut self.indices),
            _ => {}
        }

        // a failed DROP of a table that never existed can leave a
        // column-less entry behind; rebuild those
        let stale = self
            .table_cache
            .get(table)
            .is_some_and(|t| t.column_names().is_empty());
        if stale {
            self.table_cache.remove(table);
        }

        if !self.table_cache.contains_key(table) {
            let (column_names, column_types) = self.get_columns(table)?;
            debug!("instantiating relation {table} ({} columns)", column_names.len());
            let relation = HeapTable::new(
                &self.dir,
                Identifier::new(table)?,
                column_names,
                column_types,
            );
            self.table_cache.insert(table.to_owned(), relation);
        }
        Ok(self.table_cache.get_mut(table).expect("just inserted"))
    }

    /// Column names and attributes of `table`, in storage order.
    pub fn get_columns(&mut self, table: &str) -> Result<(Vec<Identifier>, Vec<DataType>)> {
        let filter = Row::new().with(ident("table_name"), Value::from(table));

        let mut names = Vec::new();
        let mut types = Vec::new();
        for handle in self.columns.select(Some(&filter))? {
            let row = self.columns.project(handle)?;
            let name = text_column(&row, "column_name")?;
            let data_type = text_column(&row, "data_type")?;
            names.push(Identifier::new(name)?);
            types.push(DataType::try_from(data_type)?);
        }
        Ok((names, types))
    }

    /// The instantiated index for `(table, index)`, cached per pair.
    pub fn get_index(&mut self, table: &str, index: &str) -> Result<&mut CatalogIndex> {
        let key = (table.to_owned(), index.to_owned());
        if !self.index_cache.contains_key(&key) {
            let handle = CatalogIndex::new(Identifier::new(table)?, Identifier::new(index)?);
            self.index_cache.insert(key.clone(), handle);
        }
        Ok(self.index_cache.get_mut(&key).expect("just inserted"))
    }

    /// The search key of `(table, index)`: columns placed by
    /// `seq_in_index`, plus the derived hash/uniqueness flags.
    pub fn index_key(&mut self, table: &str, index: &str) -> Result<IndexKey> {
        let filter = Row::new()
            .with(ident("table_name"), Value::from(table))
            .with(ident("index_name"), Value::from(index));

        let handles = self.indices.select(Some(&filter))?;
        let mut columns: Vec<Option<Identifier>> = vec![None; handles.len()];
        let mut is_hash = false;
        let mut is_unique = false;

        for handle in handles {
            let row = self.indices.project(handle)?;
            let column = text_column(&row, "column_name")?;
            let seq = row
                .get("seq_in_index")
                .and_then(Value::as_int)
                .ok_or_else(|| corrupt_catalog_row(INDICES, "seq_in_index"))?;

            let slot = usize::try_from(seq)
                .ok()
                .and_then(|seq| seq.checked_sub(1))
                .and_then(|slot| columns.get_mut(slot))
                .ok_or_else(|| corrupt_catalog_row(INDICES, "seq_in_index"))?;
            *slot = Some(Identifier::new(column)?);

            // all rows of one index agree on these
            is_hash = text_column(&row, "index_type")? == "HASH";
            is_unique = row
                .get("is_unique")
                .and_then(Value::as_bool)
                .ok_or_else(|| corrupt_catalog_row(INDICES, "is_unique"))?;
        }

        let columns = columns
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| corrupt_catalog_row(INDICES, "seq_in_index"))?;

        Ok(IndexKey {
            columns,
            is_hash,
            is_unique,
        })
    }
}

fn corrupt_catalog_row(table: &str, column: &str) -> Error {
    Error::CorruptRow(format!("{table} row has an unusable '{column}' value"))
}

fn text_column<'a>(row: &'a Row, column: &str) -> Result<&'a str> {
    row.get(column)
        .and_then(Value::as_text)
        .ok_or_else(|| corrupt_catalog_row("catalog", column))
}

/// The value under `column`, validated by the identifier acceptance
/// predicate.
fn require_identifier<'a>(row: &'a Row, column: &str) -> Result<&'a str> {
    let value = row
        .get(column)
        .ok_or_else(|| Error::MissingColumn(format!("row is missing declared column '{column}'")))?;
    let text = value.as_text().ok_or_else(|| {
        Error::UnacceptableIdentifier(format!("column '{column}' must hold a TEXT identifier"))
    })?;
    if !Identifier::is_acceptable(text) {
        return Err(Error::UnacceptableIdentifier(format!(
            "unacceptable identifier '{text}'"
        )));
    }
    Ok(text)
}

fn require_data_type(row: &Row) -> Result<()> {
    let text = row
        .get("data_type")
        .and_then(Value::as_text)
        .ok_or_else(|| Error::MissingColumn("row is missing declared column 'data_type'".into()))?;
    DataType::try_from(text).map(|_| ())
}

/// Restricts `row` to the natural key columns.
fn key_row(row: &Row, columns: &[&str]) -> Result<Row> {
    let mut key = Row::new();
    for column in columns {
        let value = row.get(column).ok_or_else(|| {
            Error::MissingColumn(format!("row is missing declared column '{column}'"))
        })?;
        key.set(ident(column), value.clone());
    }
    Ok(key)
}
