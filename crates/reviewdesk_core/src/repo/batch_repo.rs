//! Batch repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create batches with caller-supplied ids and look them up.
//! - Create a batch together with its first assets in one write.
//!
//! # Invariants
//! - Batch ids are unique; a collision leaves the existing row untouched.
//! - `created_at` is assigned here, never by the caller.
//! - A batch created with assets is stored whole or not at all.

use crate::db::{now_epoch_ms, StorageEngine};
use crate::model::review::{require_text, Asset, Batch, NewAsset};
use crate::repo::asset_repo::insert_asset;
use crate::repo::{map_insert_error, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for batch operations.
pub trait BatchRepository {
    /// Creates one batch and returns the stored row.
    fn create_batch(&self, id: &str) -> RepoResult<Batch>;
    /// Creates a batch and its assets in one transaction with one flush.
    ///
    /// Any failure leaves neither the batch nor any of the assets behind.
    fn create_batch_with_assets(
        &self,
        id: &str,
        assets: &[NewAsset],
    ) -> RepoResult<(Batch, Vec<Asset>)>;
    fn get_batch(&self, id: &str) -> RepoResult<Option<Batch>>;
}

impl<T: BatchRepository + ?Sized> BatchRepository for &T {
    fn create_batch(&self, id: &str) -> RepoResult<Batch> {
        (**self).create_batch(id)
    }

    fn create_batch_with_assets(
        &self,
        id: &str,
        assets: &[NewAsset],
    ) -> RepoResult<(Batch, Vec<Asset>)> {
        (**self).create_batch_with_assets(id, assets)
    }

    fn get_batch(&self, id: &str) -> RepoResult<Option<Batch>> {
        (**self).get_batch(id)
    }
}

/// SQLite-backed batch repository.
#[derive(Debug, Clone, Copy)]
pub struct SqliteBatchRepository<'engine> {
    engine: &'engine StorageEngine,
}

impl<'engine> SqliteBatchRepository<'engine> {
    pub fn new(engine: &'engine StorageEngine) -> Self {
        Self { engine }
    }
}

impl BatchRepository for SqliteBatchRepository<'_> {
    fn create_batch(&self, id: &str) -> RepoResult<Batch> {
        require_text("batch id", id)?;

        self.engine
            .write(|tx| -> RepoResult<Batch> { insert_batch(tx, id, now_epoch_ms()) })
    }

    fn create_batch_with_assets(
        &self,
        id: &str,
        assets: &[NewAsset],
    ) -> RepoResult<(Batch, Vec<Asset>)> {
        require_text("batch id", id)?;
        for asset in assets {
            asset.validate()?;
        }

        self.engine.write(|tx| -> RepoResult<(Batch, Vec<Asset>)> {
            let created_at = now_epoch_ms();
            let batch = insert_batch(tx, id, created_at)?;
            let assets = assets
                .iter()
                .map(|asset| insert_asset(tx, asset, created_at))
                .collect::<RepoResult<Vec<_>>>()?;
            Ok((batch, assets))
        })
    }

    fn get_batch(&self, id: &str) -> RepoResult<Option<Batch>> {
        self.engine.read(|conn| -> RepoResult<Option<Batch>> {
            let batch = conn
                .query_row(
                    "SELECT id, created_at FROM batches WHERE id = ?1;",
                    [id],
                    parse_batch_row,
                )
                .optional()?;
            Ok(batch)
        })
    }
}

fn insert_batch(conn: &Connection, id: &str, created_at: i64) -> RepoResult<Batch> {
    conn.execute(
        "INSERT INTO batches (id, created_at) VALUES (?1, ?2);",
        params![id, created_at],
    )
    .map_err(|err| {
        map_insert_error(err, || RepoError::DuplicateKey {
            entity: "batch",
            id: id.to_string(),
        })
    })?;

    Ok(Batch {
        id: id.to_string(),
        created_at,
    })
}

fn parse_batch_row(row: &Row<'_>) -> rusqlite::Result<Batch> {
    Ok(Batch {
        id: row.get("id")?,
        created_at: row.get("created_at")?,
    })
}
