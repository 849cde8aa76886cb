//! Shared test doubles: an in-memory record store and a scripted language
//! model, so state-machine flows run without SQLite or network access.

#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use time_tracker_bot::infrastructure::entities::{TimeEntry, UserSession};
use time_tracker_bot::infrastructure::traits::{LanguageModel, RecordRepository, StoreError};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryRepository {
    entries: Mutex<Vec<TimeEntry>>,
    sessions: Mutex<HashMap<i64, UserSession>>,
    fail_writes: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> InMemoryRepository {
        InMemoryRepository::default()
    }

    /// Make every write fail until switched back, simulating an unavailable
    /// store. Failed batches leave nothing behind.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn all_entries(&self) -> Vec<TimeEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRepository {
    async fn save_entries(&self, entries: &[TimeEntry]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("simulated write failure".to_string()));
        }
        self.entries.lock().unwrap().extend_from_slice(entries);
        Ok(())
    }

    async fn find_by_user_and_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && e.date == date)
            .cloned()
            .collect())
    }

    async fn find_by_user_and_date_range(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        let mut entries: Vec<TimeEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && e.date >= start && e.date <= end)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.date, e.created_at));
        Ok(entries)
    }

    async fn delete_entry(&self, id: Uuid, user_id: i64) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter().position(|e| e.id == id && e.user_id == user_id) {
            Some(index) => {
                entries.remove(index);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn get_session(&self, user_id: i64) -> Result<UserSession, StoreError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserSession::idle(user_id)))
    }

    async fn save_session(&self, session: &UserSession) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.user_id, session.clone());
        Ok(())
    }
}

/// Language model whose responses are queued up front, in order.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedModel {
    pub fn new() -> ScriptedModel {
        ScriptedModel::default()
    }

    pub fn push_ok(&self, response: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(response.to_string()));
    }

    pub fn push_err(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted response left")),
        }
    }
}
