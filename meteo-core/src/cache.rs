//! Single-slot fallback around the weather pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{future::Future, sync::Arc};

use crate::{
    WeatherError,
    model::{Provenance, ServedSnapshot, Snapshot},
    store::{KEY_CACHED_SNAPSHOT, KeyValueStore},
};

#[derive(Debug, Serialize, Deserialize)]
struct CachedSlot {
    snapshot: Snapshot,
    stored_at: DateTime<Utc>,
}

/// Holds the last good snapshot. Last write wins; nothing expires.
#[derive(Debug, Clone)]
pub struct ResilienceCache {
    store: Arc<dyn KeyValueStore>,
}

impl ResilienceCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Await a live run. A live result replaces the slot and is returned as
    /// is; a failure is answered from the slot, or becomes `CacheMiss`.
    pub async fn run<F>(&self, live: F) -> Result<ServedSnapshot, WeatherError>
    where
        F: Future<Output = Result<ServedSnapshot, WeatherError>>,
    {
        match live.await {
            Ok(served) => {
                self.replace(&served.snapshot);
                Ok(served)
            }
            Err(err) => match self.last_snapshot() {
                Some(snapshot) => {
                    tracing::info!(
                        fetched_at = %snapshot.fetched_at,
                        "Live fetch failed, serving cached snapshot: {err}"
                    );
                    Ok(ServedSnapshot {
                        snapshot,
                        provenance: Provenance::Cached {
                            reason: err.to_string(),
                        },
                    })
                }
                None => Err(WeatherError::cache_miss(err)),
            },
        }
    }

    /// The stored snapshot, if any. An unreadable slot counts as empty.
    pub fn last_snapshot(&self) -> Option<Snapshot> {
        let raw = match self.store.get(KEY_CACHED_SNAPSHOT) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to read cached snapshot: {e:#}");
                return None;
            }
        };

        match serde_json::from_str::<CachedSlot>(&raw) {
            Ok(slot) => Some(slot.snapshot),
            Err(e) => {
                tracing::warn!("Discarding unreadable cached snapshot: {e}");
                None
            }
        }
    }

    /// Overwrite the slot. Persistence failures are logged, not returned.
    fn replace(&self, snapshot: &Snapshot) {
        let slot = CachedSlot {
            snapshot: snapshot.clone(),
            stored_at: Utc::now(),
        };

        let result = serde_json::to_string(&slot)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(KEY_CACHED_SNAPSHOT, &json));

        if let Err(e) = result {
            tracing::warn!("Failed to persist snapshot: {e:#}");
        }
    }
}
