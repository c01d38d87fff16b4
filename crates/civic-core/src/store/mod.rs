use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{ends_with_gender_letter, UserRecord};

mod memory;

pub use memory::MemoryUserStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store_unavailable: {0}")]
    Unavailable(String),
    #[error("query_failed: {0}")]
    Query(String),
    #[error("write_failed: {0}")]
    Write(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a conditional identifier write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// Another record already holds the requested identifier.
    Taken,
    /// The record is gone or no longer holds the expected identifier.
    Stale,
}

/// Access to the user collection needed by identifier maintenance.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count_users(&self) -> StoreResult<u64>;

    /// Records that have a gender value and whose trimmed `custom_id` does
    /// not end in a gender letter, oldest first. Callers classify each record
    /// again, so a superset is acceptable.
    async fn list_suffix_candidates(&self) -> StoreResult<Vec<UserRecord>>;

    async fn find_by_custom_id(&self, custom_id: &str) -> StoreResult<Option<UserRecord>>;

    async fn list_custom_ids(&self) -> StoreResult<Vec<String>>;

    /// Sets `custom_id` on `id` only if the record still holds `expected`
    /// and no record holds `custom_id`.
    async fn update_custom_id(
        &self,
        id: Uuid,
        expected: &str,
        custom_id: &str,
    ) -> StoreResult<CommitOutcome>;
}

/// Store-side filter shared by implementations that evaluate it in Rust.
#[must_use]
pub fn is_suffix_candidate(record: &UserRecord) -> bool {
    record.gender.is_some() && !ends_with_gender_letter(&record.custom_id)
}
