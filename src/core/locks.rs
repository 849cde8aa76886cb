//! Per-user message serialisation.
//!
//! Messages from one user must never be handled concurrently (two handlers
//! would race on the same session row and draft set); messages from
//! different users are independent. One async mutex per user, created on
//! first contact.

use dashmap::DashMap;
use di::{inject, injectable};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct UserLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

#[injectable]
impl UserLocks {
    #[inject]
    pub fn create() -> UserLocks {
        UserLocks {
            locks: DashMap::new(),
        }
    }
}

impl UserLocks {
    /// Take the user's lock, waiting until any in-flight message for the
    /// same user has been fully handled.
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(user_id).or_default().clone();
        lock.lock_owned().await
    }
}
