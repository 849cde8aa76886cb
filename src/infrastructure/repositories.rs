//! DB Repository abstractions

use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{TimeEntry, UserSession};
use crate::infrastructure::traits::{RecordRepository, StoreError};
use async_trait::async_trait;
use chrono::NaiveDate;
use di::{Ref, inject, injectable};
use log::{error, info, warn};
use uuid::Uuid;

pub struct DbRecordRepository {
    connection: Ref<DatabaseConnection>,
}

#[injectable(RecordRepository)]
impl DbRecordRepository {
    #[inject]
    pub fn create(connection: Ref<DatabaseConnection>) -> DbRecordRepository {
        DbRecordRepository { connection }
    }
}

fn read_err(e: sqlx::Error) -> StoreError {
    error!("{e}");
    StoreError::Unavailable(e.to_string())
}

fn write_err(e: sqlx::Error) -> StoreError {
    error!("{e}");
    StoreError::WriteFailed(e.to_string())
}

#[async_trait]
impl RecordRepository for DbRecordRepository {
    async fn save_entries(&self, entries: &[TimeEntry]) -> Result<(), StoreError> {
        let mut tx = self.connection.begin().await.map_err(read_err)?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO time_entries (id, date, user_id, description, project, category, estimated_hours, original_text, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(entry.id)
            .bind(entry.date)
            .bind(entry.user_id)
            .bind(&entry.description)
            .bind(&entry.project)
            .bind(entry.category)
            .bind(entry.estimated_hours)
            .bind(&entry.original_text)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(write_err)?;

        info!("inserted {} entries", entries.len());
        Ok(())
    }

    async fn find_by_user_and_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        sqlx::query_as(
            "SELECT * FROM time_entries WHERE user_id = ? AND date = ? ORDER BY datetime(created_at) ASC",
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&**self.connection)
        .await
        .map_err(read_err)
    }

    async fn find_by_user_and_date_range(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        sqlx::query_as(
            "SELECT * FROM time_entries WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date ASC, datetime(created_at) ASC",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&**self.connection)
        .await
        .map_err(read_err)
    }

    async fn delete_entry(&self, id: Uuid, user_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM time_entries WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&**self.connection)
            .await
            .map_err(write_err)?;

        if result.rows_affected() == 0 {
            warn!("entry {id} not found or not owned by user {user_id}");
            return Err(StoreError::NotFound);
        }

        info!("deleted entry {id} for user {user_id}");
        Ok(())
    }

    async fn get_session(&self, user_id: i64) -> Result<UserSession, StoreError> {
        let session: Option<UserSession> =
            sqlx::query_as("SELECT user_id, state, pending_data, updated_at FROM user_sessions WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&**self.connection)
                .await
                .map_err(read_err)?;

        Ok(session.unwrap_or_else(|| UserSession::idle(user_id)))
    }

    async fn save_session(&self, session: &UserSession) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_sessions (user_id, state, pending_data, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET state = excluded.state, pending_data = excluded.pending_data, updated_at = excluded.updated_at",
        )
        .bind(session.user_id)
        .bind(session.state)
        .bind(session.pending_data.clone())
        .bind(session.updated_at)
        .execute(&**self.connection)
        .await
        .map_err(write_err)?;

        Ok(())
    }
}
