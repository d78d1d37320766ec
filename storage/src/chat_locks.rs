//! Per-chat async locks guarding read-modify-write spans.
//!
//! Only operations that cannot be expressed as one atomic SQL statement (the
//! history append) take a lock; different chats never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const PRUNE_THRESHOLD: usize = 1024;

/// Lazily created `tokio::sync::Mutex` per chat id.
#[derive(Default)]
pub(crate) struct ChatLockMap {
    inner: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `chat_id`, creating it on first use. Entries no
    /// longer held by anyone are pruned once the map grows past a threshold.
    pub fn lock_for(&self, chat_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().expect("chat lock map poisoned");
        if map.len() > PRUNE_THRESHOLD {
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(map.entry(chat_id).or_default())
    }
}
