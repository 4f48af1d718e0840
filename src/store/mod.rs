//! Persistence for cards, feedback history and user accounts
//!
//! Everything the application keeps on disk goes through the [`Store`] trait.
//! [`JsonStore`] keeps one JSON document per collection under the data
//! directory; [`MemoryStore`] keeps everything in process and backs the tests
//! and the `--ephemeral` mode.

pub mod json;
pub mod memory;
pub mod model;

use std::path::PathBuf;

use thiserror::Error;

pub use json::JsonStore;
pub use memory::MemoryStore;
pub use model::{
    Card, CardDraft, CardError, CardId, Collection, ContentKey, FeedbackEntry, UserRecord,
};

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading a collection failed
    #[error("Failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    /// Writing a collection failed
    #[error("Failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: std::io::Error },

    /// A collection exists but does not parse
    #[error("{path:?} is malformed: {source}")]
    Malformed { path: PathBuf, source: serde_json::Error },

    /// Update or delete of an id the collection does not hold
    #[error("No card with id {id} in the {collection}")]
    CardNotFound { id: CardId, collection: String },

    /// Username that cannot name a collection
    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),
}

impl StoreError {
    /// Whether the error means persisted data could not be parsed
    pub fn is_malformed(&self) -> bool {
        matches!(self, StoreError::Malformed { .. })
    }
}

/// Storage capabilities shared by every backend
///
/// Card writes take drafts that have already passed [`CardDraft::validate`].
/// Feedback is append-only: there is no update of a single entry.
pub trait Store {
    /// All cards in a collection, in insertion order
    fn list_cards(&self, collection: Collection<'_>) -> Result<Vec<Card>, StoreError>;

    /// Add a card; the store assigns its id
    fn add_card(&mut self, collection: Collection<'_>, draft: CardDraft)
    -> Result<Card, StoreError>;

    /// Replace the content of the card with `id`
    fn update_card(
        &mut self,
        collection: Collection<'_>,
        id: &CardId,
        draft: CardDraft,
    ) -> Result<Card, StoreError>;

    /// Remove the card with `id` permanently
    fn delete_card(&mut self, collection: Collection<'_>, id: &CardId) -> Result<(), StoreError>;

    /// Append one graded attempt to a user's history
    fn append_feedback(&mut self, user: &str, entry: FeedbackEntry) -> Result<(), StoreError>;

    /// A user's history, oldest first
    fn load_feedback(&self, user: &str) -> Result<Vec<FeedbackEntry>, StoreError>;

    /// Empty a user's history
    fn clear_feedback(&mut self, user: &str) -> Result<(), StoreError>;

    /// Insert or replace the account keyed by `record.username`
    fn put_user(&mut self, record: UserRecord) -> Result<(), StoreError>;

    fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// All accounts, sorted by username
    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;
}

/// Reject usernames that cannot safely name a per-user collection
pub(crate) fn check_username(username: &str) -> Result<(), StoreError> {
    let bad = username.is_empty()
        || username.starts_with('.')
        || username.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control());
    if bad { Err(StoreError::InvalidUsername(username.to_string())) } else { Ok(()) }
}

/// Order history by timestamp, keeping insertion order for equal instants
pub(crate) fn sort_history(entries: &mut [FeedbackEntry]) {
    entries.sort_by_key(|e| e.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_checks() {
        assert!(check_username("maria").is_ok());
        assert!(check_username("João Silva").is_ok());
        assert!(check_username("").is_err());
        assert!(check_username("..").is_err());
        assert!(check_username("a/b").is_err());
        assert!(check_username("a\\b").is_err());
    }
}
