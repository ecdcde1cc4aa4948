//! Asset review status state machine.
//!
//! # Responsibility
//! - Validate requested status transitions and apply them through the asset
//!   repository.
//! - Emit one audit log event per applied transition.
//!
//! # Invariants
//! - `pending` is the initial state; every state may move to every other
//!   state, including back to `pending`.
//! - Re-applying the current status succeeds without changing stored data.

use crate::model::review::{AssetId, ReviewStatus};
use crate::repo::asset_repo::AssetRepository;
use crate::repo::RepoResult;
use log::info;

/// Outcome of one transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub asset_id: AssetId,
    pub previous: ReviewStatus,
    pub current: ReviewStatus,
}

impl StatusChange {
    /// True when the asset already had the requested status.
    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }
}

/// Review workflow over any asset repository.
pub struct ReviewWorkflow<R: AssetRepository> {
    repo: R,
}

impl<R: AssetRepository> ReviewWorkflow<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Moves an asset to the status named by `target`.
    ///
    /// # Errors
    /// - `Validation` when `target` is not `pending|approved|rejected`.
    /// - `NotFound` when the asset does not exist.
    pub fn set_status(&self, asset_id: &str, target: &str) -> RepoResult<StatusChange> {
        let target = ReviewStatus::parse(target)?;
        self.transition(asset_id, target)
    }

    pub fn approve(&self, asset_id: &str) -> RepoResult<StatusChange> {
        self.transition(asset_id, ReviewStatus::Approved)
    }

    pub fn reject(&self, asset_id: &str) -> RepoResult<StatusChange> {
        self.transition(asset_id, ReviewStatus::Rejected)
    }

    /// Sends an asset back to `pending`.
    pub fn reset(&self, asset_id: &str) -> RepoResult<StatusChange> {
        self.transition(asset_id, ReviewStatus::Pending)
    }

    /// Applies a typed transition.
    pub fn transition(&self, asset_id: &str, target: ReviewStatus) -> RepoResult<StatusChange> {
        let previous = self.repo.update_asset_status(asset_id, target)?;
        let change = StatusChange {
            asset_id: asset_id.to_string(),
            previous,
            current: target,
        };

        info!(
            "event=asset_status_change module=workflow status=ok asset_id={} from={} to={} noop={}",
            change.asset_id,
            change.previous,
            change.current,
            change.is_noop()
        );
        Ok(change)
    }
}
