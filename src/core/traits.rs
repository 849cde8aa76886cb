//! DI "Interfaces"

use crate::core::extractor::ExtractionError;
use crate::core::reports::{MonthlyReport, WeeklyReport};
use crate::infrastructure::entities::DraftEntry;
use crate::infrastructure::traits::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// The conversational core: one session state machine per user plus the
/// report queries the HTTP surface exposes directly.
#[async_trait]
pub trait TimeTrackingService: Send + Sync {
    /// Handles one inbound event (command or free text) for a user and
    /// returns the reply to send back.
    ///
    /// `received_at` is the recording instant; it anchors "today" in the
    /// configured timezone and the future-date checks. Returns `Err` only
    /// when the session itself cannot be loaded or stored — in that case no
    /// state has advanced and the caller may retry the same event.
    async fn handle_message(
        &self,
        user_id: i64,
        text: &str,
        received_at: DateTime<Utc>,
    ) -> Result<String, StoreError>;

    /// Weekly summary for the week starting at `week_start` (a Monday), or
    /// the current week when `None`.
    async fn weekly_summary(
        &self,
        user_id: i64,
        week_start: Option<NaiveDate>,
    ) -> Result<WeeklyReport, StoreError>;

    /// Report rows plus subtotals for one month; the spreadsheet-encoding
    /// collaborator renders the artifact from this.
    async fn monthly_report(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<MonthlyReport, StoreError>;
}

/// Turns free text plus a target date into validated draft entries.
///
/// Pure transform: no state is touched; failures re-prompt the user and
/// never corrupt the session.
#[async_trait]
pub trait EntryExtractor: Send + Sync {
    async fn extract(
        &self,
        raw_text: &str,
        target_date: NaiveDate,
    ) -> Result<Vec<DraftEntry>, ExtractionError>;
}
