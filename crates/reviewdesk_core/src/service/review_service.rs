//! Review use-case service.
//!
//! # Responsibility
//! - Provide the use-case entry points an HTTP/CLI layer needs: upload a
//!   batch, load the review page, comment, and change status.
//! - Generate batch/asset ids for uploads.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::db::StorageEngine;
use crate::model::review::{
    Asset, Batch, BatchId, Comment, NewAsset, NewComment, ReviewStatus, ValidationError,
};
use crate::repo::asset_repo::{AssetRepository, SqliteAssetRepository};
use crate::repo::batch_repo::{BatchRepository, SqliteBatchRepository};
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::review_workflow::{ReviewWorkflow, StatusChange};
use log::info;
use serde::Serialize;
use uuid::Uuid;

const REVIEW_URL_PREFIX: &str = "/review/";

/// One file already written by the file-storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original name shown to reviewers.
    pub filename: String,
    /// Storage reference returned by the file store.
    pub filepath: String,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, filepath: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            filepath: filepath.into(),
        }
    }
}

/// Result of a batch upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub batch_id: BatchId,
    pub assets: Vec<Asset>,
    /// Shareable review link path, `/review/<batch_id>`.
    pub review_url: String,
}

/// Review page model: a batch and its assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: Batch,
    pub assets: Vec<Asset>,
}

/// Asset detail model: an asset and its comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetView {
    #[serde(flatten)]
    pub asset: Asset,
    pub comments: Vec<Comment>,
}

/// Per-status asset counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl ReviewSummary {
    pub fn from_assets(assets: &[Asset]) -> Self {
        assets
            .iter()
            .fold(Self::default(), |mut summary, asset| {
                summary.total += 1;
                match asset.status {
                    ReviewStatus::Pending => summary.pending += 1,
                    ReviewStatus::Approved => summary.approved += 1,
                    ReviewStatus::Rejected => summary.rejected += 1,
                }
                summary
            })
    }

    /// True once every asset has a decision.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.pending == 0
    }
}

/// Use-case service over batch, asset and comment repositories.
pub struct ReviewService<B, A, C>
where
    B: BatchRepository,
    A: AssetRepository,
    C: CommentRepository,
{
    batches: B,
    assets: A,
    comments: C,
}

impl<'engine>
    ReviewService<
        SqliteBatchRepository<'engine>,
        SqliteAssetRepository<'engine>,
        SqliteCommentRepository<'engine>,
    >
{
    /// Builds a service whose repositories all share `engine`.
    pub fn with_engine(engine: &'engine StorageEngine) -> Self {
        Self::new(
            SqliteBatchRepository::new(engine),
            SqliteAssetRepository::new(engine),
            SqliteCommentRepository::new(engine),
        )
    }
}

impl<B, A, C> ReviewService<B, A, C>
where
    B: BatchRepository,
    A: AssetRepository,
    C: CommentRepository,
{
    pub fn new(batches: B, assets: A, comments: C) -> Self {
        Self {
            batches,
            assets,
            comments,
        }
    }

    /// Creates a batch with a fresh id and one pending asset per file.
    ///
    /// # Contract
    /// - Fails with `Validation(EmptyUpload)` when `files` is empty.
    /// - The batch and all of its assets are stored in one write; on any
    ///   failure nothing is stored.
    pub fn upload_batch(&self, files: &[UploadedFile]) -> RepoResult<UploadReceipt> {
        if files.is_empty() {
            return Err(ValidationError::EmptyUpload.into());
        }

        let batch_id = new_id();
        let new_assets = files
            .iter()
            .map(|file| {
                NewAsset::new(
                    new_id(),
                    batch_id.as_str(),
                    file.filename.as_str(),
                    file.filepath.as_str(),
                )
            })
            .collect::<Vec<_>>();
        let (batch, assets) = self
            .batches
            .create_batch_with_assets(&batch_id, &new_assets)?;

        info!(
            "event=batch_upload module=service status=ok batch_id={} asset_count={}",
            batch.id,
            assets.len()
        );

        Ok(UploadReceipt {
            review_url: review_url(&batch.id),
            batch_id: batch.id,
            assets,
        })
    }

    /// Loads a batch with its assets; `None` when the batch does not exist.
    pub fn batch_view(&self, batch_id: &str) -> RepoResult<Option<BatchView>> {
        let Some(batch) = self.batches.get_batch(batch_id)? else {
            return Ok(None);
        };
        let assets = self.assets.get_assets_by_batch(batch_id)?;
        Ok(Some(BatchView { batch, assets }))
    }

    /// Loads an asset with its comments; `None` when the asset does not exist.
    pub fn asset_view(&self, asset_id: &str) -> RepoResult<Option<AssetView>> {
        let Some(asset) = self.assets.get_asset(asset_id)? else {
            return Ok(None);
        };
        let comments = self.comments.get_comments_by_asset(asset_id)?;
        Ok(Some(AssetView { asset, comments }))
    }

    /// Adds a trimmed comment to an asset.
    ///
    /// A missing asset is reported as `NotFound`, not `Integrity`.
    pub fn add_comment(&self, asset_id: &str, author: &str, content: &str) -> RepoResult<Comment> {
        let request = NewComment::new(asset_id, author.trim(), content.trim());
        self.comments
            .create_comment(&request)
            .map_err(|err| match err {
                RepoError::Integrity { parent_id, .. } => RepoError::NotFound {
                    entity: "asset",
                    id: parent_id,
                },
                other => other,
            })
    }

    /// Applies a status transition named by a raw status string.
    pub fn set_status(&self, asset_id: &str, status: &str) -> RepoResult<StatusChange> {
        ReviewWorkflow::new(&self.assets).set_status(asset_id, status)
    }

    /// Counts assets per status; unknown batches yield an empty summary.
    pub fn review_summary(&self, batch_id: &str) -> RepoResult<ReviewSummary> {
        let assets = self.assets.get_assets_by_batch(batch_id)?;
        Ok(ReviewSummary::from_assets(&assets))
    }
}

/// Review link path for a batch.
pub fn review_url(batch_id: &str) -> String {
    format!("{REVIEW_URL_PREFIX}{batch_id}")
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}
