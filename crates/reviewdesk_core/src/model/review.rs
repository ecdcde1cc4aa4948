//! Review domain model.
//!
//! # Responsibility
//! - Define the batch/asset/comment records shared by repositories and
//!   services.
//! - Own the closed set of review statuses and input validation rules.
//!
//! # Invariants
//! - Ids never change once a record exists.
//! - `ReviewStatus` is the only representation of asset status; raw strings
//!   are parsed through `ReviewStatus::parse` before reaching storage.
//! - Timestamps are Unix epoch milliseconds assigned by core.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Opaque caller-supplied batch identifier.
pub type BatchId = String;
/// Opaque caller-supplied asset identifier.
pub type AssetId = String;
/// Store-assigned, monotonically increasing comment identifier.
pub type CommentId = i64;

/// Review state of one asset.
///
/// Every transition between the three states is allowed; `Pending` is only
/// special in being the initial state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Awaiting a reviewer decision.
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses an exact lowercase status name.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

impl Display for ReviewStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Malformed caller input rejected before any storage access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty or whitespace-only.
    EmptyField(&'static str),
    InvalidStatus(String),
    /// An upload carried no files.
    EmptyUpload,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must not be empty"),
            Self::InvalidStatus(value) => write!(
                f,
                "invalid status `{value}`; expected pending|approved|rejected"
            ),
            Self::EmptyUpload => write!(f, "upload must contain at least one file"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

/// A group of assets uploaded together and reviewed through one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub created_at: i64,
}

/// One uploaded image and its review status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub batch_id: BatchId,
    /// Original display name supplied by the uploader.
    pub filename: String,
    /// Storage reference owned by the file-storage collaborator.
    pub filepath: String,
    pub uploaded_at: i64,
    pub status: ReviewStatus,
}

/// Timestamped, authored note attached to an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub asset_id: AssetId,
    pub author: String,
    pub content: String,
    pub created_at: i64,
}

/// Insert request for an asset; status always starts as `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub id: AssetId,
    pub batch_id: BatchId,
    pub filename: String,
    pub filepath: String,
}

impl NewAsset {
    pub fn new(
        id: impl Into<AssetId>,
        batch_id: impl Into<BatchId>,
        filename: impl Into<String>,
        filepath: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            batch_id: batch_id.into(),
            filename: filename.into(),
            filepath: filepath.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("asset id", &self.id)?;
        require_text("batch id", &self.batch_id)?;
        require_text("filename", &self.filename)?;
        require_text("filepath", &self.filepath)
    }
}

/// Insert request for a comment; id and timestamp are assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub asset_id: AssetId,
    pub author: String,
    pub content: String,
}

impl NewComment {
    pub fn new(
        asset_id: impl Into<AssetId>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            author: author.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("asset id", &self.asset_id)?;
        require_text("author", &self.author)?;
        require_text("content", &self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::{NewAsset, NewComment, ReviewStatus, ValidationError};

    #[test]
    fn status_names_parse_back() {
        for status in ReviewStatus::ALL {
            assert_eq!(ReviewStatus::parse(status.as_str()), Ok(status));
        }
        assert_eq!(ReviewStatus::default(), ReviewStatus::Pending);
    }

    #[test]
    fn status_parse_is_exact() {
        assert_eq!(
            "Approved".parse::<ReviewStatus>(),
            Err(ValidationError::InvalidStatus("Approved".to_string()))
        );
        assert!(ReviewStatus::parse("").is_err());
        assert!(ReviewStatus::parse(" pending").is_err());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&ReviewStatus::Rejected).unwrap();
        assert_eq!(json, "\"rejected\"");
    }

    #[test]
    fn new_comment_rejects_blank_author_or_content() {
        let blank_author = NewComment::new("a1", "  ", "looks good");
        assert_eq!(
            blank_author.validate(),
            Err(ValidationError::EmptyField("author"))
        );

        let blank_content = NewComment::new("a1", "alice", "");
        assert_eq!(
            blank_content.validate(),
            Err(ValidationError::EmptyField("content"))
        );

        assert!(NewComment::new("a1", "alice", "ok").validate().is_ok());
    }

    #[test]
    fn new_asset_requires_every_field() {
        assert_eq!(
            NewAsset::new("a1", "b1", "cat.png", "").validate(),
            Err(ValidationError::EmptyField("filepath"))
        );
        assert!(NewAsset::new("a1", "b1", "cat.png", "f1.png")
            .validate()
            .is_ok());
    }
}
