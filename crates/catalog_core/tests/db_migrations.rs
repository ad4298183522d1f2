mod common;

use catalog_core::db::migrations::latest_version;
use catalog_core::db::{open_db, open_db_in_memory, DbError};
use catalog_core::{ListRequest, SqliteStore, StoreError, Storager};
use common::{test_note, test_occurrence, NOTE_ID, NOTE_PROJECT, OCCURRENCE_ID, OCCURRENCE_PROJECT};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["projects", "notes", "occurrences", "operations"] {
        assert_sqlite_object(&conn, "table", table);
    }
    assert_sqlite_object(&conn, "index", "idx_occurrences_note");
}

#[test]
fn reopening_catalog_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite3");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_sqlite_object(&second, "table", "occurrences");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = SqliteStore::open(&path).err().unwrap();
    assert!(matches!(
        err,
        StoreError::Db(DbError::SchemaTooNew { .. })
    ));
}

#[test]
fn catalog_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sqlite3");
    let note = test_note(NOTE_PROJECT);
    let occurrence = test_occurrence(OCCURRENCE_PROJECT, &note.name);

    {
        let store = SqliteStore::open(&path).unwrap();
        store.create_project(NOTE_PROJECT).unwrap();
        store.create_note(&note).unwrap();
        store.create_occurrence(&occurrence).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert!(store.get_project(NOTE_PROJECT).is_ok());
    assert_eq!(store.get_note(NOTE_PROJECT, NOTE_ID).unwrap(), note);
    assert_eq!(
        store.get_occurrence(OCCURRENCE_PROJECT, OCCURRENCE_ID).unwrap(),
        occurrence
    );
    let linked = store
        .list_note_occurrences(NOTE_PROJECT, NOTE_ID, &ListRequest::all())
        .unwrap();
    assert_eq!(linked.items, vec![occurrence]);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_sqlite_object(conn: &Connection, object_type: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [object_type, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{object_type} {name} does not exist");
}
