//! Asset repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create assets under an existing batch and list them per batch.
//! - Persist review status changes.
//!
//! # Invariants
//! - New assets always start as `pending`.
//! - `batch_id` must name an existing batch when the asset is created.
//! - Status values are read and written only through `ReviewStatus`.

use crate::db::{now_epoch_ms, StorageEngine};
use crate::model::review::{Asset, NewAsset, ReviewStatus};
use crate::repo::{map_insert_error, RepoError, RepoResult};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ASSET_SELECT_SQL: &str = "SELECT
    id,
    batch_id,
    filename,
    filepath,
    uploaded_at,
    status
FROM assets";

/// Repository interface for asset operations.
pub trait AssetRepository {
    /// Creates one pending asset and returns the stored row.
    fn create_asset(&self, asset: &NewAsset) -> RepoResult<Asset>;
    /// Lists assets of a batch in upload order; unknown batches yield `[]`.
    fn get_assets_by_batch(&self, batch_id: &str) -> RepoResult<Vec<Asset>>;
    fn get_asset(&self, id: &str) -> RepoResult<Option<Asset>>;
    /// Sets the review status and returns the status it replaced.
    fn update_asset_status(&self, id: &str, status: ReviewStatus) -> RepoResult<ReviewStatus>;
}

impl<T: AssetRepository + ?Sized> AssetRepository for &T {
    fn create_asset(&self, asset: &NewAsset) -> RepoResult<Asset> {
        (**self).create_asset(asset)
    }

    fn get_assets_by_batch(&self, batch_id: &str) -> RepoResult<Vec<Asset>> {
        (**self).get_assets_by_batch(batch_id)
    }

    fn get_asset(&self, id: &str) -> RepoResult<Option<Asset>> {
        (**self).get_asset(id)
    }

    fn update_asset_status(&self, id: &str, status: ReviewStatus) -> RepoResult<ReviewStatus> {
        (**self).update_asset_status(id, status)
    }
}

/// SQLite-backed asset repository.
#[derive(Debug, Clone, Copy)]
pub struct SqliteAssetRepository<'engine> {
    engine: &'engine StorageEngine,
}

impl<'engine> SqliteAssetRepository<'engine> {
    pub fn new(engine: &'engine StorageEngine) -> Self {
        Self { engine }
    }
}

impl AssetRepository for SqliteAssetRepository<'_> {
    fn create_asset(&self, asset: &NewAsset) -> RepoResult<Asset> {
        asset.validate()?;
        self.engine
            .write(|tx| -> RepoResult<Asset> { insert_asset(tx, asset, now_epoch_ms()) })
    }

    fn get_assets_by_batch(&self, batch_id: &str) -> RepoResult<Vec<Asset>> {
        let assets = self.engine.query(
            &format!("{ASSET_SELECT_SQL} WHERE batch_id = ?1 ORDER BY uploaded_at ASC, rowid ASC;"),
            [batch_id],
            parse_asset_row,
        )?;
        Ok(assets)
    }

    fn get_asset(&self, id: &str) -> RepoResult<Option<Asset>> {
        self.engine.read(|conn| -> RepoResult<Option<Asset>> {
            let asset = conn
                .query_row(
                    &format!("{ASSET_SELECT_SQL} WHERE id = ?1;"),
                    [id],
                    parse_asset_row,
                )
                .optional()?;
            Ok(asset)
        })
    }

    fn update_asset_status(&self, id: &str, status: ReviewStatus) -> RepoResult<ReviewStatus> {
        self.engine.write(|tx| -> RepoResult<ReviewStatus> {
            let previous = tx
                .query_row(
                    "SELECT status FROM assets WHERE id = ?1;",
                    [id],
                    |row| row.get::<_, ReviewStatus>(0),
                )
                .optional()?
                .ok_or_else(|| RepoError::NotFound {
                    entity: "asset",
                    id: id.to_string(),
                })?;

            if previous != status {
                tx.execute(
                    "UPDATE assets SET status = ?1 WHERE id = ?2;",
                    params![status, id],
                )?;
            }

            Ok(previous)
        })
    }
}

impl ToSql for ReviewStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReviewStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        ReviewStatus::parse(text).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Inserts one validated asset as `pending` inside an open write.
pub(crate) fn insert_asset(
    conn: &Connection,
    asset: &NewAsset,
    uploaded_at: i64,
) -> RepoResult<Asset> {
    if !batch_exists(conn, &asset.batch_id)? {
        return Err(missing_batch(&asset.batch_id));
    }

    let created = Asset {
        id: asset.id.clone(),
        batch_id: asset.batch_id.clone(),
        filename: asset.filename.clone(),
        filepath: asset.filepath.clone(),
        uploaded_at,
        status: ReviewStatus::Pending,
    };
    conn.execute(
        "INSERT INTO assets (
            id,
            batch_id,
            filename,
            filepath,
            uploaded_at,
            status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            created.id,
            created.batch_id,
            created.filename,
            created.filepath,
            created.uploaded_at,
            created.status,
        ],
    )
    .map_err(|err| {
        map_insert_error(err, || RepoError::DuplicateKey {
            entity: "asset",
            id: created.id.clone(),
        })
    })?;

    Ok(created)
}

pub(crate) fn asset_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM assets WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )
}

fn batch_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM batches WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )
}

fn missing_batch(batch_id: &str) -> RepoError {
    RepoError::Integrity {
        entity: "asset",
        parent: "batch",
        parent_id: batch_id.to_string(),
    }
}

fn parse_asset_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get("id")?,
        batch_id: row.get("batch_id")?,
        filename: row.get("filename")?,
        filepath: row.get("filepath")?,
        uploaded_at: row.get("uploaded_at")?,
        status: row.get("status")?,
    })
}
