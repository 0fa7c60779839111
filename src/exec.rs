// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! DDL executor: dispatches parsed statements to catalog operations.
//!
//! Multi-step statements run with best-effort compensation: when a later
//! step fails, the earlier catalog writes are deleted again and the
//! original failure surfaces. Compensation failures are swallowed
//! deliberately so the original cause is preserved.

use crate::catalog::{self, Catalog};
use crate::sql::ast::{ColumnType, CreateIndex, CreateTable, IndexType, Statement};
use crate::value::{ident, DataType, Identifier, Row, Value};
use crate::{Error, Result};
use log::debug;
use std::fmt;

/// Result of executing one statement: an optional rowset plus a message.
#[derive(Debug)]
pub struct QueryResult {
    /// Column header, present for SHOW results.
    pub column_names: Option<Vec<Identifier>>,

    /// Column attributes, parallel to `column_names`.
    pub column_types: Option<Vec<DataType>>,

    /// Result rows.
    pub rows: Option<Vec<Row>>,

    /// Human-readable outcome.
    pub message: String,
}

impl QueryResult {
    fn message(message: impl Into<String>) -> Self {
        Self {
            column_names: None,
            column_types: None,
            rows: None,
            message: message.into(),
        }
    }

    fn rowset(names: Vec<Identifier>, types: Vec<DataType>, rows: Vec<Row>) -> Self {
        Self {
            message: format!("successfully returned {} rows", rows.len()),
            column_names: Some(names),
            column_types: Some(types),
            rows: Some(rows),
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(names) = &self.column_names {
            for name in names {
                write!(f, "{name} ")?;
            }
            writeln!(f)?;

            write!(f, "+")?;
            for _ in names {
                write!(f, "----------+")?;
            }
            writeln!(f)?;

            for row in self.rows.as_deref().unwrap_or_default() {
                for name in names {
                    match row.get(name.as_str()) {
                        Some(value) => write!(f, "{value} ")?,
                        None => write!(f, "??? ")?,
                    }
                }
                writeln!(f)?;
            }
        }
        f.write_str(&self.message)
    }
}

/// Executes one parsed statement against the catalog.
///
/// # Errors
///
/// Any lower-level failure is wrapped as a statement-level `Sql` error.
pub fn execute(catalog: &mut Catalog, statement: &Statement) -> Result<QueryResult> {
    debug!("executing {statement:?}");
    match dispatch(catalog, statement) {
        Err(error @ Error::Sql(_)) => Err(error),
        Err(error) => Err(Error::Sql(error.to_string())),
        ok => ok,
    }
}

fn dispatch(catalog: &mut Catalog, statement: &Statement) -> Result<QueryResult> {
    match statement {
        Statement::CreateTable(create) => create_table(catalog, create),
        Statement::CreateIndex(create) => create_index(catalog, create),
        Statement::DropTable { table } => drop_table(catalog, table),
        Statement::DropIndex { index, table } => drop_index(catalog, index, table),
        Statement::ShowTables => show_tables(catalog),
        Statement::ShowColumns { table } => show_columns(catalog, table),
        Statement::ShowIndex { table } => show_index(catalog, table),
        Statement::Select(_) => Ok(QueryResult::message("not implemented")),
    }
}

/// Maps a column definition to catalog terms. Only INT and TEXT columns
/// can be created today.
fn column_definition(column: &crate::sql::ast::ColumnDef) -> Result<(Identifier, DataType)> {
    let data_type = match column.data_type {
        ColumnType::Int => DataType::Int,
        ColumnType::Text => DataType::Text,
        ColumnType::Double | ColumnType::Boolean => {
            return Err(Error::Unimplemented("column type"))
        }
    };
    Ok((Identifier::new(column.name.as_str())?, data_type))
}

fn create_table(catalog: &mut Catalog, statement: &CreateTable) -> Result<QueryResult> {
    let table_row = Row::new().with(ident("table_name"), Value::from(statement.table.as_str()));
    let table_handle = catalog.insert_table(&table_row)?;

    if let Err(error) = create_table_body(catalog, statement) {
        let _ = catalog.delete_table(table_handle);
        return Err(error);
    }
    Ok(QueryResult::message(format!(
        "created table {}",
        statement.table
    )))
}

/// Steps 2 and 3 of CREATE TABLE: the `_columns` rows and the heap file.
/// Undoes its own `_columns` writes on failure.
fn create_table_body(catalog: &mut Catalog, statement: &CreateTable) -> Result<()> {
    let mut column_handles = Vec::new();

    let result = (|| {
        for column in &statement.columns {
            let (name, data_type) = column_definition(column)?;
            let row = Row::new()
                .with(ident("table_name"), Value::from(statement.table.as_str()))
                .with(ident("column_name"), Value::from(name.as_str()))
                .with(ident("data_type"), Value::from(data_type.as_str()));
            column_handles.push(catalog.insert_column(&row)?);
        }

        let table = catalog.get_table(&statement.table)?;
        if statement.if_not_exists {
            table.create_if_not_exists()
        } else {
            table.create()
        }
    })();

    if let Err(error) = result {
        for handle in column_handles {
            let _ = catalog.delete_column(handle);
        }
        return Err(error);
    }
    Ok(())
}

fn create_index(catalog: &mut Catalog, statement: &CreateIndex) -> Result<QueryResult> {
    // every key column must exist in the target relation
    let table = catalog.get_table(&statement.table)?;
    let known: Vec<String> = table
        .column_names()
        .iter()
        .map(ToString::to_string)
        .collect();
    for column in &statement.columns {
        if !known.contains(column) {
            return Err(Error::UnknownColumn(format!(
                "no such column {column} in table {}",
                statement.table
            )));
        }
    }

    for (position, column) in statement.columns.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let row = Row::new()
            .with(ident("table_name"), Value::from(statement.table.as_str()))
            .with(ident("index_name"), Value::from(statement.index.as_str()))
            .with(ident("column_name"), Value::from(column.as_str()))
            .with(ident("seq_in_index"), Value::Int(position as i32 + 1))
            .with(
                ident("index_type"),
                Value::from(statement.index_type.as_str()),
            )
            .with(
                ident("is_unique"),
                Value::Boolean(statement.index_type == IndexType::BTree),
            );
        catalog.insert_index(&row)?;
    }

    catalog
        .get_index(&statement.table, &statement.index)?
        .create()?;

    Ok(QueryResult::message(format!(
        "created index {}",
        statement.index
    )))
}

fn drop_table(catalog: &mut Catalog, table: &str) -> Result<QueryResult> {
    if catalog::is_schema_table(table) {
        return Err(Error::Sql(format!("cannot drop schema table {table}")));
    }
    let filter = Row::new().with(ident("table_name"), Value::from(table));

    // cascade: indices on the table go first
    for handle in catalog.indices().select(Some(&filter))? {
        catalog.delete_index(handle)?;
    }

    for handle in catalog.columns().select(Some(&filter))? {
        catalog.delete_column(handle)?;
    }

    catalog.get_table(table)?.drop_table()?;

    for handle in catalog.tables().select(Some(&filter))? {
        catalog.delete_table(handle)?;
    }

    Ok(QueryResult::message(format!("dropped table {table}")))
}

fn drop_index(catalog: &mut Catalog, index: &str, table: &str) -> Result<QueryResult> {
    catalog.get_index(table, index)?.drop_index()?;

    let filter = Row::new()
        .with(ident("table_name"), Value::from(table))
        .with(ident("index_name"), Value::from(index));
    for handle in catalog.indices().select(Some(&filter))? {
        catalog.delete_index(handle)?;
    }

    Ok(QueryResult::message(format!("dropped index {index}")))
}

fn show_tables(catalog: &mut Catalog) -> Result<QueryResult> {
    let (names, types) = catalog.get_columns(catalog::TABLES)?;

    let handles = catalog.tables().select(None)?;
    let mut rows = Vec::new();
    for handle in handles {
        let row = catalog.tables().project_columns(handle, &names)?;
        let keep = row
            .get("table_name")
            .and_then(Value::as_text)
            .is_some_and(|name| !catalog::is_schema_table(name));
        if keep {
            rows.push(row);
        }
    }
    Ok(QueryResult::rowset(names, types, rows))
}

fn show_columns(catalog: &mut Catalog, table: &str) -> Result<QueryResult> {
    let names = vec![ident("table_name"), ident("column_name"), ident("data_type")];
    let types = vec![DataType::Text, DataType::Text, DataType::Text];

    let filter = Row::new().with(ident("table_name"), Value::from(table));
    let handles = catalog.columns().select(Some(&filter))?;
    let mut rows = Vec::new();
    for handle in handles {
        rows.push(catalog.columns().project_columns(handle, &names)?);
    }
    Ok(QueryResult::rowset(names, types, rows))
}

fn show_index(catalog: &mut Catalog, table: &str) -> Result<QueryResult> {
    let names = vec![
        ident("table_name"),
        ident("index_name"),
        ident("column_name"),
        ident("seq_in_index"),
        ident("index_type"),
        ident("is_unique"),
    ];
    let types = vec![
        DataType::Text,
        DataType::Text,
        DataType::Text,
        DataType::Int,
        DataType::Text,
        DataType::Boolean,
    ];

    let filter = Row::new().with(ident("table_name"), Value::from(table));
    let handles = catalog.indices().select(Some(&filter))?;
    let mut rows = Vec::new();
    for handle in handles {
        rows.push(catalog.indices().project_columns(handle, &names)?);
    }
    Ok(QueryResult::rowset(names, types, rows))
}
