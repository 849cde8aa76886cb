//! Database entities

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// Billability classification of a time entry. Closed set, stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Category {
    BillableProject,
    NonBillableProject,
    OtherNonBillable,
}

impl Category {
    /// All categories in reporting order.
    pub const ALL: [Category; 3] = [
        Category::BillableProject,
        Category::NonBillableProject,
        Category::OtherNonBillable,
    ];

    /// Case-insensitive coercion from a model- or user-supplied string.
    pub fn from_loose(s: &str) -> Option<Category> {
        match s.trim().to_ascii_lowercase().as_str() {
            "billableproject" => Some(Category::BillableProject),
            "nonbillableproject" => Some(Category::NonBillableProject),
            "othernonbillable" => Some(Category::OtherNonBillable),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::BillableProject => "Billable project",
            Category::NonBillableProject => "Non-billable project",
            Category::OtherNonBillable => "Other non-billable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TimeEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub user_id: i64,
    pub description: String,
    pub project: String,
    pub category: Category,
    pub estimated_hours: f64,
    pub original_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An extracted, not-yet-persisted time entry awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry {
    pub date: NaiveDate,
    pub description: String,
    pub project: String,
    pub category: Category,
    pub estimated_hours: f64,
    pub original_text: String,
}

impl DraftEntry {
    /// Materialise the draft into a persistable entry owned by `user_id`.
    pub fn into_entry(self, user_id: i64, now: DateTime<Utc>) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            date: self.date,
            user_id,
            description: self.description,
            project: self.project,
            category: self.category,
            estimated_hours: self.estimated_hours,
            original_text: self.original_text,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Conversation step a user is currently in. `Idle` is the resting point
/// between flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    AwaitingDateChoice,
    AwaitingFreeText,
    AwaitingConfirmation,
    AwaitingEditSelection,
    AwaitingDeleteTarget,
}

/// What a collected date is for, when a flow starts by asking for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateIntent {
    Record,
    Retrieve,
    Delete,
}

/// Data collected so far in the active flow. One variant per flow shape,
/// selected by the session state; cleared when the flow ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PendingData {
    DateRequest {
        intent: DateIntent,
    },
    RecordDraft {
        target_date: NaiveDate,
        drafts: Vec<DraftEntry>,
    },
    DeleteChoice {
        date: NaiveDate,
        candidates: Vec<Uuid>,
    },
}

#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub user_id: i64,
    pub state: SessionState,
    pub pending_data: Option<Json<PendingData>>,
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    /// Default session for a user with no active flow.
    pub fn idle(user_id: i64) -> UserSession {
        UserSession {
            user_id,
            state: SessionState::Idle,
            pending_data: None,
            updated_at: Utc::now(),
        }
    }

    pub fn transition(&mut self, state: SessionState, pending: Option<PendingData>) {
        self.state = state;
        self.pending_data = pending.map(Json);
        self.updated_at = Utc::now();
    }

    /// Clear the active flow and return to `Idle`.
    pub fn reset(&mut self) {
        self.transition(SessionState::Idle, None);
    }

    pub fn pending(&self) -> Option<&PendingData> {
        self.pending_data.as_ref().map(|json| &json.0)
    }
}
