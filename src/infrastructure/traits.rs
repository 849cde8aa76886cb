//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities;
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Failures at the persistent-store boundary.
///
/// `NotFound` is reported to the user as a normal message; the other two are
/// transient and leave any in-flight drafts intact for retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching record")]
    NotFound,
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Contract for persisting time entries and per-user session state.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Persists a confirmation batch as one atomic unit. Partial writes must
    /// never be observable.
    async fn save_entries(&self, entries: &[entities::TimeEntry]) -> Result<(), StoreError>;

    /// All entries for a user on one date, in creation order.
    async fn find_by_user_and_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<entities::TimeEntry>, StoreError>;

    /// All entries for a user in `[start, end]`, by date then creation order.
    async fn find_by_user_and_date_range(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<entities::TimeEntry>, StoreError>;

    /// Deletes one entry after verifying ownership.
    ///
    /// Returns `StoreError::NotFound` if the entry does not exist or belongs
    /// to a different user.
    async fn delete_entry(&self, id: Uuid, user_id: i64) -> Result<(), StoreError>;

    /// The user's session, or a fresh `Idle` one if none is stored yet.
    async fn get_session(&self, user_id: i64) -> Result<entities::UserSession, StoreError>;

    /// Upserts the session row for `session.user_id`.
    async fn save_session(&self, session: &entities::UserSession) -> Result<(), StoreError>;
}

/// Outbound language-model boundary. Implementations own the network call;
/// the extraction contract on top of it lives in `core::extractor`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
