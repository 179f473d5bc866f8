//! Per-key async mutual exclusion
//!
//! Used to serialize writers on one case (intake, export) or one submission
//! (action append) without blocking unrelated keys.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Lazily-created mutex per UUID key
#[derive(Debug, Default, Clone)]
pub struct KeyedLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`; released when the guard drops
    pub async fn lock(&self, key: Uuid) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().await;
            // Drop idle slots so the map tracks only contended/held keys
            map.retain(|k, slot| *k == key || Arc::strong_count(slot) > 1);
            map.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        slot.lock_owned().await
    }

    /// Number of keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.inner.lock().await.len()
    }
}
