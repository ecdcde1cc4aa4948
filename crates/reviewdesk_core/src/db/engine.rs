//! Write-through storage engine over an in-memory SQLite database.
//!
//! # Responsibility
//! - Hold the authoritative in-memory database behind one lock.
//! - Load the snapshot file on startup and rewrite it after every mutation.
//! - Configure connection pragmas and run schema migrations.
//!
//! # Invariants
//! - Every mutation and its snapshot flush run under the same lock hold, so
//!   flushes never interleave and readers never see a half-applied change.
//! - The snapshot file is replaced by rename, never written in place, and the
//!   rename is synced through the parent directory.
//! - Every flush failure surfaces as `DbError::Io`, including SQLite-level
//!   failures of the backup such as a full disk.
//! - A failed flush leaves the committed in-memory state untouched.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::backup::Progress;
use rusqlite::{Connection, DatabaseName, Params, Row, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tempfile::NamedTempFile;

#[derive(Debug)]
struct EngineState {
    conn: Connection,
    initialized: bool,
}

/// Single owner of the review database.
///
/// Share it between threads with `Arc<StorageEngine>`; repositories borrow
/// it for the duration of a call.
#[derive(Debug)]
pub struct StorageEngine {
    state: Mutex<EngineState>,
    snapshot_path: Option<PathBuf>,
}

impl StorageEngine {
    /// Opens the engine backed by the snapshot file at `path`.
    ///
    /// Loads the snapshot when the file exists, otherwise creates the schema
    /// and writes an initial snapshot.
    ///
    /// # Side effects
    /// - Creates the snapshot's parent directory when missing.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=file");

        let result = Self::with_snapshot(Some(path.as_ref().to_path_buf()));
        log_open_result("file", started_at, &result);
        result
    }

    /// Opens an engine without a snapshot file.
    ///
    /// Flushes are no-ops; intended for tests and throwaway sessions.
    pub fn open_in_memory() -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=memory");

        let result = Self::with_snapshot(None);
        log_open_result("memory", started_at, &result);
        result
    }

    fn with_snapshot(snapshot_path: Option<PathBuf>) -> DbResult<Self> {
        if let Some(dir) = snapshot_path.as_deref().and_then(snapshot_dir) {
            std::fs::create_dir_all(dir)?;
        }

        let engine = Self {
            state: Mutex::new(EngineState {
                conn: Connection::open_in_memory()?,
                initialized: false,
            }),
            snapshot_path,
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Path of the backing snapshot file, if any.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Loads the snapshot (first call only) and brings the schema up to date.
    ///
    /// Calling this again on a live engine re-checks the schema version and
    /// restores a missing snapshot file from memory; it never reloads over
    /// the in-memory state.
    pub fn initialize(&self) -> DbResult<()> {
        let mut state = self.lock()?;

        if !state.initialized {
            if let Some(path) = self.snapshot_path.as_deref().filter(|path| path.exists()) {
                state
                    .conn
                    .restore(DatabaseName::Main, path, None::<fn(Progress)>)?;
            }
        }

        state.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let migrated = apply_migrations(&mut state.conn)?;
        let snapshot_missing = self
            .snapshot_path
            .as_deref()
            .is_some_and(|path| !path.exists());

        if migrated || snapshot_missing {
            self.flush(&state.conn)?;
        }
        state.initialized = true;
        Ok(())
    }

    /// Runs `op` inside one transaction, commits it, then flushes the
    /// snapshot before returning.
    ///
    /// When `op` fails the transaction is rolled back and nothing is flushed.
    /// When the flush fails the commit stays in memory and the IO error is
    /// returned.
    pub fn write<T, E>(&self, op: impl FnOnce(&Transaction<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut state = self.lock()?;
        let tx = state.conn.transaction().map_err(DbError::from)?;
        let value = op(&tx)?;
        tx.commit().map_err(DbError::from)?;
        self.flush(&state.conn)?;
        Ok(value)
    }

    /// Runs a read-only `op` against the current in-memory state.
    pub fn read<T, E>(&self, op: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let state = self.lock()?;
        op(&state.conn)
    }

    /// Executes one mutating statement and flushes.
    ///
    /// Returns the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> DbResult<usize> {
        self.write(|tx| tx.execute(sql, params).map_err(DbError::from))
    }

    /// Runs one read-only statement and maps every row with `map`.
    pub fn query<T, P, F>(&self, sql: &str, params: P, map: F) -> DbResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.read(|conn| -> DbResult<Vec<T>> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params, map)?
                .collect::<rusqlite::Result<Vec<T>>>()?;
            Ok(rows)
        })
    }

    /// Serializes the whole database over the snapshot file.
    pub fn persist(&self) -> DbResult<()> {
        let state = self.lock()?;
        self.flush(&state.conn)
    }

    fn flush(&self, conn: &Connection) -> DbResult<()> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };

        let started_at = Instant::now();
        match write_snapshot(conn, path).map_err(into_flush_error) {
            Ok(()) => {
                debug!(
                    "event=db_persist module=db status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=db_persist module=db status=error duration_ms={} error_code=snapshot_write_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, EngineState>> {
        self.state.lock().map_err(|_| DbError::LockPoisoned)
    }
}

fn write_snapshot(conn: &Connection, path: &Path) -> DbResult<()> {
    let dir = snapshot_dir(path).unwrap_or_else(|| Path::new("."));
    let staged = NamedTempFile::new_in(dir)?;
    conn.backup(DatabaseName::Main, staged.path(), None)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| DbError::Io(err.error))?;
    sync_dir(dir)?;
    Ok(())
}

fn into_flush_error(err: DbError) -> DbError {
    match err {
        DbError::Io(_) => err,
        other => DbError::Io(std::io::Error::other(other)),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn snapshot_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|dir| !dir.as_os_str().is_empty())
}

fn log_open_result(mode: &str, started_at: Instant, result: &DbResult<StorageEngine>) {
    match result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
