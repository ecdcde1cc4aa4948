//! Persistence and review workflow core for ReviewDesk.
//! This crate is the single source of truth for review invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{load_config, load_config_or_default, ConfigError, CoreConfig};
pub use db::{DbError, DbResult, StorageEngine};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::review::{
    Asset, AssetId, Batch, BatchId, Comment, CommentId, NewAsset, NewComment, ReviewStatus,
    ValidationError,
};
pub use repo::asset_repo::{AssetRepository, SqliteAssetRepository};
pub use repo::batch_repo::{BatchRepository, SqliteBatchRepository};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::{RepoError, RepoResult};
pub use service::review_service::{
    review_url, AssetView, BatchView, ReviewService, ReviewSummary, UploadReceipt, UploadedFile,
};
pub use service::review_workflow::{ReviewWorkflow, StatusChange};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
