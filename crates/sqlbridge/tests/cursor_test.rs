//! End-to-end cursor tests against an embedded SQLite database

#![cfg(feature = "sqlite")]

use std::collections::HashMap;

use sqlbridge::connection::Connection;
use sqlbridge::cursor::Cursor;
use sqlbridge::error::ErrorCategory;
use sqlbridge::sqlite::{SqliteConnection, SqliteCursor, SqliteHandle, SqliteKeyedCursor};
use sqlbridge::types::{Row, RowShape, Value};

/// Open an in-memory database holding `test (id, name)` with one row.
fn seeded_handle() -> SqliteHandle {
    let handle = SqliteConnection::new().with_path(":memory:").open().unwrap();
    let mut cursor = SqliteCursor::new(&handle);
    cursor
        .execute("CREATE TABLE test (id INTEGER, name TEXT)", &[])
        .unwrap();
    cursor
        .execute(
            "INSERT INTO test (id, name) VALUES (?, ?)",
            &[Value::Int64(1), Value::String("Glenn".into())],
        )
        .unwrap();
    handle
}

fn glenn_keyed() -> HashMap<String, Value> {
    let mut expected = HashMap::new();
    expected.insert("id".to_string(), Value::Int64(1));
    expected.insert("name".to_string(), Value::String("Glenn".into()));
    expected
}

#[test]
fn test_positional_row_shape() {
    let handle = seeded_handle();
    let mut cursor = SqliteCursor::new(&handle);

    let rows = cursor.execute("SELECT * FROM test", &[]).unwrap();
    assert_eq!(
        rows,
        vec![Row::Positional(vec![
            Value::Int64(1),
            Value::String("Glenn".into())
        ])]
    );
}

#[test]
fn test_keyed_row_shape() {
    let handle = seeded_handle();
    let mut cursor = SqliteCursor::new(&handle).with_shape(RowShape::Keyed);

    let rows = cursor.execute("SELECT * FROM test", &[]).unwrap();
    assert_eq!(rows, vec![Row::Keyed(glenn_keyed())]);
}

#[test]
fn test_end_to_end_keyed_query_with_parameter() {
    let handle = seeded_handle();
    let mut cursor = SqliteKeyedCursor::new(&handle);

    let rows = cursor
        .execute(
            "SELECT * FROM test WHERE name=?",
            &[Value::String("Glenn".into())],
        )
        .unwrap();

    assert_eq!(rows, vec![Row::Keyed(glenn_keyed())]);
}

#[test]
fn test_repeated_execute_is_idempotent() {
    let handle = seeded_handle();
    let mut cursor = SqliteCursor::new(&handle);

    let first = cursor
        .execute("SELECT * FROM test WHERE id=?", &[Value::Int64(1)])
        .unwrap();
    let second = cursor
        .execute("SELECT * FROM test WHERE id=?", &[Value::Int64(1)])
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_no_match_returns_empty_sequence() {
    let handle = seeded_handle();
    let mut cursor = SqliteCursor::new(&handle);

    let rows = cursor
        .execute(
            "SELECT * FROM test WHERE name=?",
            &[Value::String("Norton".into())],
        )
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_multiple_rows_keep_declared_order() {
    let handle = seeded_handle();
    let mut cursor = SqliteCursor::new(&handle);

    cursor
        .execute(
            "INSERT INTO test (id, name) VALUES (?, ?)",
            &[Value::Int64(2), Value::String("Norton".into())],
        )
        .unwrap();

    let rows = cursor
        .execute("SELECT * FROM test ORDER BY id", &[])
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(0), Some(&Value::Int64(1)));
    assert_eq!(rows[1].get(1), Some(&Value::String("Norton".into())));
}

#[test]
fn test_detached_cursor_fails_until_handle_attached() {
    let mut cursor = SqliteCursor::detached();
    let err = cursor.execute("SELECT 1", &[]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("handle"));

    let handle = seeded_handle();
    cursor.set_handle(&handle);
    assert!(cursor.execute("SELECT 1", &[]).is_ok());
}

#[test]
fn test_keyed_cursor_misconfiguration_fails_at_execute() {
    let handle = seeded_handle();
    let mut cursor = SqliteKeyedCursor::new(&handle);
    cursor.set_shape(RowShape::Positional);

    let err = cursor.execute("SELECT * FROM test", &[]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::RowShape);
    assert!(err.to_string().contains("positional"));
}

#[test]
fn test_shape_toggle_does_not_disturb_other_cursors() {
    let handle = seeded_handle();
    let mut keyed = SqliteCursor::new(&handle).with_shape(RowShape::Keyed);
    let mut positional = SqliteCursor::new(&handle);

    // Interleaved executes against the same handle keep their own shapes.
    let k1 = keyed.execute("SELECT * FROM test", &[]).unwrap();
    let p1 = positional.execute("SELECT * FROM test", &[]).unwrap();
    let k2 = keyed.execute("SELECT * FROM test", &[]).unwrap();

    assert_eq!(k1[0].shape(), RowShape::Keyed);
    assert_eq!(p1[0].shape(), RowShape::Positional);
    assert_eq!(k1, k2);
}

#[test]
fn test_file_backed_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let path = path.to_str().unwrap().to_string();

    {
        let handle = SqliteConnection::new().with_path(&path).open().unwrap();
        let mut cursor = SqliteCursor::new(&handle);
        cursor
            .execute("CREATE TABLE test (id INTEGER, name TEXT)", &[])
            .unwrap();
        cursor
            .execute(
                "INSERT INTO test (id, name) VALUES (?, ?)",
                &[Value::Int64(1), Value::String("Glenn".into())],
            )
            .unwrap();
    }

    // A fresh handle sees the data the first one wrote.
    let handle = SqliteConnection::new().with_path(&path).open().unwrap();
    let mut cursor = SqliteKeyedCursor::new(&handle);
    let rows = cursor.execute("SELECT * FROM test", &[]).unwrap();
    assert_eq!(rows, vec![Row::Keyed(glenn_keyed())]);
}
