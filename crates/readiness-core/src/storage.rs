//! In-process storage backend.
//!
//! Behaves like browser local storage: one string value per key, lost when
//! the process exits. Failure and latency can be injected for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::traits::StateStorage;

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    /// Writes fail while set.
    failing: AtomicBool,
    /// Number of upcoming writes that fail before `failing` is consulted.
    fail_next: AtomicU32,
    write_delay: Mutex<Duration>,
    writes: AtomicU32,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write by `delay` (honours paused tokio time).
    pub fn with_write_delay(self, delay: Duration) -> Self {
        *self.write_delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
        self
    }

    /// Make all writes fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make the next `count` writes fail.
    pub fn fail_next_writes(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Store a raw value, bypassing serialization (e.g. to simulate corruption).
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn should_fail(&self) -> bool {
        let consumed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        consumed || self.failing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStorage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let delay = *self.write_delay.lock().unwrap_or_else(|e| e.into_inner());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail() {
            return Err(StorageError::Write {
                key: key.to_string(),
                message: "injected failure".into(),
            });
        }

        self.insert_raw(key, value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_value() {
        let storage = MemoryStorage::new();
        storage.set("k", "v1").await.unwrap();

        storage.fail_next_writes(1);
        assert!(storage.set("k", "v2").await.is_err());
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v1"));

        storage.set("k", "v3").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v3"));
        assert_eq!(storage.write_count(), 2);
    }

    #[tokio::test]
    async fn failing_switch() {
        let storage = MemoryStorage::new();
        storage.set_failing(true);
        assert!(storage.set("k", "v").await.is_err());
        storage.set_failing(false);
        assert!(storage.set("k", "v").await.is_ok());
    }
}
