// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Built-in smoke suites behind the shell's `test` command.
//!
//! Runs against a scratch subdirectory of the environment, printing
//! pass/fail per suite. The real coverage lives in the test suite; this is
//! the quick sanity check an interactive session can reach for.

use crate::catalog::Catalog;
use crate::exec;
use crate::heap::relation::HeapTable;
use crate::page::SlottedPage;
use crate::sql::parse;
use crate::store::{zeroed_block, BLOCK_SZ};
use crate::value::{ident, DataType, Row, Value};
use crate::{Error, Result};
use std::path::Path;

const GETTYSBURG: &str = "Four score and seven years ago our fathers brought forth on this \
     continent, a new nation, conceived in Liberty, and dedicated to the \
     proposition that all men are created equal.";

/// Runs every suite in `<dir>/selftest`, printing one line per suite.
/// Returns whether all of them passed.
pub fn run_all(dir: &Path) -> bool {
    let scratch = dir.join("selftest");
    let _ = std::fs::remove_dir_all(&scratch);
    if let Err(e) = std::fs::create_dir_all(&scratch) {
        println!("selftest: cannot create {}: {e}", scratch.display());
        return false;
    }

    let mut ok = true;
    ok &= report("slotted page", slotted_page());
    ok &= report("heap table", heap_table(&scratch));
    ok &= report("sql ddl", sql_ddl(&scratch));
    ok
}

fn report(suite: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => {
            println!("{suite}: ok");
            true
        }
        Err(e) => {
            println!("{suite}: failed ({e})");
            false
        }
    }
}

fn check(condition: bool, what: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Sql(format!("check failed: {what}")))
    }
}

fn slotted_page() -> Result<()> {
    let mut page = SlottedPage::new(1, zeroed_block(), true);

    let id = page.add(b"hello\0").map_err(|_| no_room())?;
    check(id == 1, "first id is 1")?;
    let id = page.add(b"goodbye\0").map_err(|_| no_room())?;
    check(id == 2, "second id is 2")?;

    page.put(1, b"something much bigger\0").map_err(|_| no_room())?;
    check(
        page.get(2) == Some(&b"goodbye\0"[..]),
        "record 2 after expanding put",
    )?;
    check(
        page.get(1) == Some(&b"something much bigger\0"[..]),
        "record 1 after expanding put",
    )?;

    page.put(1, b"hello\0").map_err(|_| no_room())?;
    check(page.get(2) == Some(&b"goodbye\0"[..]), "record 2 after contracting put")?;
    check(page.get(1) == Some(&b"hello\0"[..]), "record 1 after contracting put")?;

    page.del(1);
    check(page.ids() == vec![2], "ids after delete")?;
    check(page.get(1).is_none(), "deleted record reads as none")?;

    let huge = vec![0u8; BLOCK_SZ - 10];
    check(page.add(&huge).is_err(), "oversized add is refused")?;

    Ok(())
}

fn heap_table(dir: &Path) -> Result<()> {
    let mut egg = HeapTable::new(
        dir,
        ident("egg"),
        vec![ident("a"), ident("b")],
        vec![DataType::Int, DataType::Text],
    );
    egg.create()?;

    let first = Row::new()
        .with(ident("a"), Value::Int(-1))
        .with(ident("b"), Value::from(GETTYSBURG));
    egg.insert(&first)?;

    for n in 0..1000 {
        let row = Row::new()
            .with(ident("a"), Value::Int(n))
            .with(ident("b"), Value::from(GETTYSBURG));
        egg.insert(&row)?;
    }

    let handles = egg.select(None)?;
    check(handles.len() == 1001, "1001 rows after inserting")?;
    check(egg.project(handles[0])? == first, "first row round-trips")?;

    let last = *handles.last().expect("non-empty");
    egg.del(last)?;
    let handles = egg.select(None)?;
    check(handles.len() == 1000, "1000 rows after delete")?;
    for (n, handle) in handles.iter().enumerate() {
        let row = egg.project(*handle)?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let expected = n as i32 - 1;
        check(
            row.get("a") == Some(&Value::Int(expected)),
            "rows come back in insertion order",
        )?;
    }

    egg.drop_table()?;
    Ok(())
}

fn sql_ddl(dir: &Path) -> Result<()> {
    let mut catalog = Catalog::open(dir)?;

    let run = |catalog: &mut Catalog, sql: &str| -> Result<exec::QueryResult> {
        let statements =
            parse::parse(sql).map_err(|e| Error::Sql(format!("invalid SQL: {sql} ({e})")))?;
        check(statements.len() == 1, "one statement per input")?;
        exec::execute(catalog, &statements[0])
    };

    let result = run(&mut catalog, "SHOW COLUMNS FROM _columns")?;
    check(
        result.rows.as_ref().is_some_and(|rows| rows.len() == 3),
        "_columns describes itself",
    )?;

    let result = run(&mut catalog, "SHOW TABLES")?;
    check(
        result.rows.as_ref().is_some_and(Vec::is_empty),
        "fresh environment has no user tables",
    )?;

    run(&mut catalog, "CREATE TABLE egg (yolk TEXT, white INT, shell INT)")?;
    let result = run(&mut catalog, "SHOW TABLES")?;
    check(
        result.rows.as_ref().is_some_and(|rows| rows.len() == 1),
        "created table shows up",
    )?;

    run(&mut catalog, "CREATE INDEX chicken ON egg (yolk, shell)")?;
    let result = run(&mut catalog, "SHOW INDEX FROM egg")?;
    check(
        result.rows.as_ref().is_some_and(|rows| rows.len() == 2),
        "index row per key column",
    )?;

    run(&mut catalog, "DROP INDEX chicken FROM egg")?;
    let result = run(&mut catalog, "SHOW INDEX FROM egg")?;
    check(
        result.rows.as_ref().is_some_and(Vec::is_empty),
        "dropped index leaves no rows",
    )?;

    run(&mut catalog, "DROP TABLE egg")?;
    let result = run(&mut catalog, "SHOW TABLES")?;
    check(
        result.rows.as_ref().is_some_and(Vec::is_empty),
        "dropped table leaves no rows",
    )?;

    Ok(())
}

fn no_room() -> Error {
    Error::NoRoom("page refused the record".into())
}
