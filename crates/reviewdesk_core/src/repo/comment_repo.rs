//! Comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append comments to existing assets and list them per asset.
//!
//! # Invariants
//! - Comment ids come from `AUTOINCREMENT` and are never reused.
//! - The created row is returned by the insert statement itself, inside the
//!   same locked write, so no other writer can slip in between.
//! - Listing order is `created_at ASC, id ASC`.

use crate::db::{now_epoch_ms, StorageEngine};
use crate::model::review::{Comment, NewComment};
use crate::repo::asset_repo::asset_exists;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Row};

/// Repository interface for comment operations.
pub trait CommentRepository {
    /// Creates one comment and returns the fully populated stored row.
    fn create_comment(&self, comment: &NewComment) -> RepoResult<Comment>;
    fn get_comments_by_asset(&self, asset_id: &str) -> RepoResult<Vec<Comment>>;
}

impl<T: CommentRepository + ?Sized> CommentRepository for &T {
    fn create_comment(&self, comment: &NewComment) -> RepoResult<Comment> {
        (**self).create_comment(comment)
    }

    fn get_comments_by_asset(&self, asset_id: &str) -> RepoResult<Vec<Comment>> {
        (**self).get_comments_by_asset(asset_id)
    }
}

/// SQLite-backed comment repository.
#[derive(Debug, Clone, Copy)]
pub struct SqliteCommentRepository<'engine> {
    engine: &'engine StorageEngine,
}

impl<'engine> SqliteCommentRepository<'engine> {
    pub fn new(engine: &'engine StorageEngine) -> Self {
        Self { engine }
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(&self, comment: &NewComment) -> RepoResult<Comment> {
        comment.validate()?;

        self.engine.write(|tx| -> RepoResult<Comment> {
            if !asset_exists(tx, &comment.asset_id)? {
                return Err(missing_asset(&comment.asset_id));
            }

            tx.query_row(
                "INSERT INTO comments (asset_id, author, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, asset_id, author, content, created_at;",
                params![
                    comment.asset_id,
                    comment.author,
                    comment.content,
                    now_epoch_ms(),
                ],
                parse_comment_row,
            )
            .map_err(RepoError::from)
        })
    }

    fn get_comments_by_asset(&self, asset_id: &str) -> RepoResult<Vec<Comment>> {
        let comments = self.engine.query(
            "SELECT id, asset_id, author, content, created_at
             FROM comments
             WHERE asset_id = ?1
             ORDER BY created_at ASC, id ASC;",
            [asset_id],
            parse_comment_row,
        )?;
        Ok(comments)
    }
}

fn missing_asset(asset_id: &str) -> RepoError {
    RepoError::Integrity {
        entity: "comment",
        parent: "asset",
        parent_id: asset_id.to_string(),
    }
}

fn parse_comment_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        asset_id: row.get("asset_id")?,
        author: row.get("author")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}
