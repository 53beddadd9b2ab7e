//! Read model over the mirrored discussion-board data.
//!
//! Source articles and their replies are owned by an external system; this
//! module only queries them. Production state lives in [`crate::queue`].

mod sqlite;
mod types;

pub use sqlite::*;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Source item not found: {0}")]
    NotFound(i64),
}

/// Access to source articles and their replies.
pub trait CandidateRepository: Send + Sync {
    /// Fetch a single source item by id.
    fn get(&self, id: i64) -> Result<SourceItem, RepositoryError>;

    /// Whether a source item exists.
    fn exists(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Fetch candidate source items matching the query filters, excluding
    /// the given ids, ordered and limited as requested.
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<SourceItem>, RepositoryError>;

    /// Reply bodies for one article, oldest first.
    fn reply_texts(&self, article_id: i64) -> Result<Vec<String>, RepositoryError>;

    /// Most recently created source items, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<SourceItem>, RepositoryError>;
}
