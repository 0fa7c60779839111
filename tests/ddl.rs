use heap_store::catalog::Catalog;
use heap_store::sql::parse;
use heap_store::{exec, Error, QueryResult, Value};
use test_log::test;

/// Parses and executes a single statement.
fn run(catalog: &mut Catalog, sql: &str) -> heap_store::Result<QueryResult> {
    let statements = parse::parse(sql).expect("valid SQL");
    assert_eq!(statements.len(), 1, "{sql}");
    exec::execute(catalog, &statements[0])
}

fn row_count(result: &QueryResult) -> usize {
    result.rows.as_ref().expect("a rowset").len()
}

#[test]
fn fresh_catalog_describes_itself() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    let result = run(&mut catalog, "SHOW COLUMNS FROM _tables")?;
    assert_eq!(row_count(&result), 1);
    let result = run(&mut catalog, "SHOW COLUMNS FROM _columns")?;
    assert_eq!(row_count(&result), 3);
    let result = run(&mut catalog, "SHOW COLUMNS FROM _indices")?;
    assert_eq!(row_count(&result), 6);

    // schema tables are filtered out of SHOW TABLES
    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 0);
    assert_eq!(result.message, "successfully returned 0 rows");

    Ok(())
}

#[test]
fn query_result_rendering() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    let result = run(&mut catalog, "SHOW COLUMNS FROM _tables")?;
    assert_eq!(
        result.to_string(),
        "table_name column_name data_type \n\
         +----------+----------+----------+\n\
         \"_tables\" \"table_name\" \"TEXT\" \n\
         successfully returned 1 rows"
    );

    let result = run(&mut catalog, "SELECT * FROM egg")?;
    assert_eq!(result.to_string(), "not implemented");

    Ok(())
}

#[test]
fn create_and_drop_table() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    let result = run(
        &mut catalog,
        "CREATE TABLE egg (yolk TEXT, white INT, shell INT)",
    )?;
    assert_eq!(result.message, "created table egg");
    assert!(dir.path().join("egg.db").exists());

    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 1);
    let result = run(&mut catalog, "SHOW COLUMNS FROM egg")?;
    assert_eq!(row_count(&result), 3);

    let result = run(&mut catalog, "DROP TABLE egg")?;
    assert_eq!(result.message, "dropped table egg");
    assert!(!dir.path().join("egg.db").exists());

    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 0);
    let result = run(&mut catalog, "SHOW COLUMNS FROM egg")?;
    assert_eq!(row_count(&result), 0);

    Ok(())
}

#[test]
fn create_index_and_cascade_on_drop_table() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    run(
        &mut catalog,
        "CREATE TABLE egg (yolk TEXT, white INT, shell INT)",
    )?;
    let result = run(&mut catalog, "CREATE INDEX chicken ON egg (yolk, shell)")?;
    assert_eq!(result.message, "created index chicken");

    let result = run(&mut catalog, "SHOW INDEX FROM egg")?;
    assert_eq!(row_count(&result), 2);
    let rows = result.rows.as_ref().expect("a rowset");
    for (n, row) in rows.iter().enumerate() {
        assert_eq!(row.get("index_name"), Some(&Value::from("chicken")));
        assert_eq!(
            row.get("seq_in_index"),
            Some(&Value::Int(i32::try_from(n).expect("fits") + 1))
        );
        assert_eq!(row.get("index_type"), Some(&Value::from("BTREE")));
        assert_eq!(row.get("is_unique"), Some(&Value::Boolean(true)));
    }
    assert_eq!(rows[0].get("column_name"), Some(&Value::from("yolk")));
    assert_eq!(rows[1].get("column_name"), Some(&Value::from("shell")));

    let result = run(&mut catalog, "DROP INDEX chicken FROM egg")?;
    assert_eq!(result.message, "dropped index chicken");
    let result = run(&mut catalog, "SHOW INDEX FROM egg")?;
    assert_eq!(row_count(&result), 0);

    // recreate, then drop the whole table: the index rows cascade
    run(&mut catalog, "CREATE INDEX chicken ON egg (yolk, shell)")?;
    run(&mut catalog, "DROP TABLE egg")?;
    let result = run(&mut catalog, "SHOW INDEX FROM egg")?;
    assert_eq!(row_count(&result), 0);
    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 0);

    Ok(())
}

#[test]
fn hash_index_is_not_unique() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    run(&mut catalog, "CREATE TABLE egg (yolk TEXT)")?;
    run(&mut catalog, "CREATE INDEX pan ON egg USING HASH (yolk)")?;

    let result = run(&mut catalog, "SHOW INDEX FROM egg")?;
    let rows = result.rows.as_ref().expect("a rowset");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("index_type"), Some(&Value::from("HASH")));
    assert_eq!(rows[0].get("is_unique"), Some(&Value::Boolean(false)));

    let key = catalog.index_key("egg", "pan")?;
    assert!(key.is_hash);
    assert!(!key.is_unique);

    Ok(())
}

#[test]
fn create_index_rejects_unknown_columns() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    run(&mut catalog, "CREATE TABLE egg (yolk TEXT)")?;
    let error = run(&mut catalog, "CREATE INDEX chicken ON egg (shell)")
        .expect_err("unknown column must fail");
    assert!(error.to_string().contains("no such column shell"));

    let result = run(&mut catalog, "SHOW INDEX FROM egg")?;
    assert_eq!(row_count(&result), 0);

    Ok(())
}

#[test]
fn duplicate_table_is_rejected() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    run(&mut catalog, "CREATE TABLE egg (yolk TEXT)")?;
    let error = run(&mut catalog, "CREATE TABLE egg (yolk TEXT)")
        .expect_err("duplicate must fail");
    assert!(matches!(error, Error::Sql(_)));
    assert!(error.to_string().contains("already exists"));

    // the failed statement must not have changed anything
    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 1);
    let result = run(&mut catalog, "SHOW COLUMNS FROM egg")?;
    assert_eq!(row_count(&result), 1);

    Ok(())
}

#[test]
fn failed_create_table_compensates() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    // the duplicate column name fails halfway through step 2
    let error = run(&mut catalog, "CREATE TABLE egg (a INT, a TEXT)")
        .expect_err("duplicate column must fail");
    assert!(error.to_string().contains("duplicate column egg.a"));

    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 0);
    let result = run(&mut catalog, "SHOW COLUMNS FROM egg")?;
    assert_eq!(row_count(&result), 0);
    assert!(!dir.path().join("egg.db").exists());

    // unsupported column types compensate the same way
    let error = run(&mut catalog, "CREATE TABLE egg (a INT, b BOOLEAN)")
        .expect_err("unsupported type must fail");
    assert!(error.to_string().contains("not implemented"));
    let result = run(&mut catalog, "SHOW COLUMNS FROM egg")?;
    assert_eq!(row_count(&result), 0);

    // after the failures, creating the table properly still works
    run(&mut catalog, "CREATE TABLE egg (a INT, b TEXT)")?;
    let result = run(&mut catalog, "SHOW COLUMNS FROM egg")?;
    assert_eq!(row_count(&result), 2);

    Ok(())
}

#[test]
fn schema_tables_cannot_be_dropped() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    for table in ["_tables", "_columns", "_indices"] {
        let error = run(&mut catalog, &format!("DROP TABLE {table}"))
            .expect_err("schema tables are protected");
        assert!(error.to_string().contains("cannot drop schema table"));
    }

    Ok(())
}

#[test]
fn if_not_exists_tolerates_existing_file() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut catalog = Catalog::open(dir.path())?;

    // a stale heap file without catalog rows, e.g. left over from a crash
    {
        let mut stray = heap_store::heap::file::HeapFile::new(dir.path(), "egg");
        stray.create()?;
        stray.close();
    }

    // plain CREATE trips over the file and compensates its catalog writes
    let error = run(&mut catalog, "CREATE TABLE egg (a INT)").expect_err("file exists");
    assert!(error.to_string().contains("already exists"));
    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 0);

    // IF NOT EXISTS adopts the existing file instead
    let result = run(&mut catalog, "CREATE TABLE IF NOT EXISTS egg (a INT)")?;
    assert_eq!(result.message, "created table egg");
    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 1);

    Ok(())
}

#[test]
fn catalog_persists_across_reopen() -> heap_store::Result<()> {
    let dir = tempfile::tempdir()?;

    {
        let mut catalog = Catalog::open(dir.path())?;
        run(&mut catalog, "CREATE TABLE egg (yolk TEXT, white INT)")?;
        run(&mut catalog, "CREATE INDEX chicken ON egg (yolk)")?;
    }

    let mut catalog = Catalog::open(dir.path())?;
    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 1);
    let result = run(&mut catalog, "SHOW COLUMNS FROM egg")?;
    assert_eq!(row_count(&result), 2);
    let result = run(&mut catalog, "SHOW INDEX FROM egg")?;
    assert_eq!(row_count(&result), 1);

    // and the relation is still usable
    run(&mut catalog, "DROP TABLE egg")?;
    let result = run(&mut catalog, "SHOW TABLES")?;
    assert_eq!(row_count(&result), 0);

    Ok(())
}
