use reviewdesk_core::db::migrations::{current_user_version, latest_version};
use reviewdesk_core::{
    AssetRepository, BatchRepository, DbError, NewAsset, RepoError, SqliteAssetRepository,
    SqliteBatchRepository, StorageEngine,
};
use rusqlite::Connection;

#[test]
fn open_creates_snapshot_with_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");

    let engine = StorageEngine::open(&path).unwrap();
    assert_eq!(engine.snapshot_path(), Some(path.as_path()));
    assert!(path.exists());

    let conn = Connection::open(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "batches");
    assert_table_exists(&conn, "assets");
    assert_table_exists(&conn, "comments");
}

#[test]
fn open_creates_missing_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("data.db");

    StorageEngine::open(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn every_write_is_visible_to_a_fresh_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");

    let engine = StorageEngine::open(&path).unwrap();
    SqliteBatchRepository::new(&engine)
        .create_batch("b1")
        .unwrap();

    // The first engine stays alive: the snapshot must already be current.
    let reopened = StorageEngine::open(&path).unwrap();
    let batch = SqliteBatchRepository::new(&reopened)
        .get_batch("b1")
        .unwrap()
        .unwrap();
    assert_eq!(batch.id, "b1");
}

#[test]
fn initialize_is_idempotent_and_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");

    let engine = StorageEngine::open(&path).unwrap();
    SqliteBatchRepository::new(&engine)
        .create_batch("b1")
        .unwrap();

    engine.initialize().unwrap();
    engine.initialize().unwrap();

    let batches = SqliteBatchRepository::new(&engine);
    assert!(batches.get_batch("b1").unwrap().is_some());
}

#[test]
fn initialize_rewrites_a_deleted_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");

    let engine = StorageEngine::open(&path).unwrap();
    SqliteBatchRepository::new(&engine)
        .create_batch("b1")
        .unwrap();
    std::fs::remove_file(&path).unwrap();

    engine.initialize().unwrap();

    let reopened = StorageEngine::open(&path).unwrap();
    assert!(SqliteBatchRepository::new(&reopened)
        .get_batch("b1")
        .unwrap()
        .is_some());
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = StorageEngine::open(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn corrupt_snapshot_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");
    std::fs::write(&path, vec![b'x'; 4096]).unwrap();

    assert!(StorageEngine::open(&path).is_err());
}

#[test]
fn failed_flush_surfaces_io_error_and_keeps_memory_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_dir = dir.path().join("store");
    let path = snapshot_dir.join("data.db");

    let engine = StorageEngine::open(&path).unwrap();
    std::fs::remove_dir_all(&snapshot_dir).unwrap();

    let batches = SqliteBatchRepository::new(&engine);
    let err = batches.create_batch("b1").unwrap_err();
    assert!(err.is_io(), "expected io error, got {err}");

    // The commit is kept in memory and the id stays taken.
    assert!(batches.get_batch("b1").unwrap().is_some());
    assert!(matches!(
        batches.create_batch("b1").unwrap_err(),
        RepoError::DuplicateKey { .. }
    ));

    std::fs::create_dir_all(&snapshot_dir).unwrap();
    engine.persist().unwrap();
    let reopened = StorageEngine::open(&path).unwrap();
    assert!(SqliteBatchRepository::new(&reopened)
        .get_batch("b1")
        .unwrap()
        .is_some());
}

#[test]
fn execute_and_query_round_trip() {
    let engine = StorageEngine::open_in_memory().unwrap();

    let changed = engine
        .execute(
            "INSERT INTO batches (id, created_at) VALUES (?1, ?2);",
            rusqlite::params!["b1", 42_i64],
        )
        .unwrap();
    assert_eq!(changed, 1);

    let rows = engine
        .query(
            "SELECT id, created_at FROM batches WHERE id = ?1;",
            ["b1"],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .unwrap();
    assert_eq!(rows, vec![("b1".to_string(), 42)]);
}

#[test]
fn rejected_insert_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");

    let engine = StorageEngine::open(&path).unwrap();
    let err = SqliteAssetRepository::new(&engine)
        .create_asset(&NewAsset::new("a1", "missing", "cat.png", "f1.png"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Integrity { .. }));

    let reopened = StorageEngine::open(&path).unwrap();
    assert!(SqliteAssetRepository::new(&reopened)
        .get_asset("a1")
        .unwrap()
        .is_none());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
