// src/recorder/locks.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::ResourceId;

/// Per-resource mutual exclusion.
///
/// Holding the guard for a resource id serialises check cycles of that
/// resource; cycles of different resources never contend.
#[derive(Debug, Default, Clone)]
pub struct KeyedLocks {
    slots: Arc<Mutex<HashMap<ResourceId, Arc<AsyncMutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other cycle holds `id`, then hold it until the guard drops.
    pub async fn acquire(&self, id: ResourceId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(slots.entry(id).or_default())
        };
        slot.lock_owned().await
    }

    /// Whether a cycle for `id` currently holds the lock.
    pub fn is_held(&self, id: ResourceId) -> bool {
        let slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.get(&id).is_some_and(|slot| slot.try_lock().is_err())
    }
}
