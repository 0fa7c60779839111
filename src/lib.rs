// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A minimal relational storage engine with a SQL DDL front-end.
//!
//! Tables are heaps of rows marshalled into slotted pages, which live in
//! fixed-size blocks of one file per table. A self-describing catalog
//! (`_tables`, `_columns`, `_indices`) is itself stored in heap tables and
//! bootstrapped the first time an environment is used.
//!
//! The supported statement set is small: CREATE/DROP TABLE, CREATE/DROP
//! INDEX and SHOW TABLES/COLUMNS/INDEX, plus SELECT parsing for display.
//! There are no row updates, joins, transactions or physical index
//! structures yet.
//!
//! # Example usage
//!
//! ```
//! use heap_store::{catalog::Catalog, exec, sql};
//!
//! # fn main() -> heap_store::Result<()> {
//! let dir = tempfile::tempdir().expect("tempdir");
//!
//! // one catalog value is the context for all DDL in an environment
//! let mut catalog = Catalog::open(dir.path())?;
//!
//! for statement in sql::parse::parse("CREATE TABLE egg (yolk TEXT, white INT)")
//!     .expect("valid SQL")
//! {
//!     // canonical rendering of what was parsed
//!     println!("{}", sql::unparse::statement(&statement));
//!
//!     let result = exec::execute(&mut catalog, &statement)?;
//!     println!("{result}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]

pub mod catalog;
mod error;
pub mod exec;
pub mod heap;
mod page;
#[doc(hidden)]
pub mod selftest;
pub mod sql;
mod store;
mod value;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use exec::{execute, QueryResult};
pub use heap::relation::{Handle, HeapTable};
pub use page::{NoRoom, SlottedPage};
pub use store::{BlockBuf, BlockStore, BLOCK_SZ};
pub use value::{DataType, Identifier, Row, Value};

/// 1-based id of a block within a heap file. Id 0 is reserved.
pub type BlockId = u32;

/// 1-based id of a record within a slotted page.
pub type RecordId = u16;
