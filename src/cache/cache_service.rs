use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::cache_errors::CacheError;
use super::cache_model::{
    aggregates_key, holdings_key, namespace, namespace_of, transactions_key, CacheEnvelope,
};
use super::cache_store::CacheStoreTrait;
use crate::constants::{CACHE_GLOBAL_PREFIX, CACHE_MAX_PAYLOAD_BYTES, CACHE_TTL_SECS};

/// Two-tier, per-user cache of holdings/transactions/aggregates.
///
/// The in-process freshness stamp gates whether any reload is attempted at
/// all; the persisted tier survives restarts and is bounded by a wall-clock
/// TTL. The store stays the single source of truth: this is a read-side
/// shadow, never authoritative past its TTL or an invalidation.
pub struct PortfolioCache {
    store: Arc<dyn CacheStoreTrait>,
    freshness: DashMap<String, DateTime<Utc>>,
}

impl PortfolioCache {
    pub fn new(store: Arc<dyn CacheStoreTrait>) -> Self {
        Self {
            store,
            freshness: DashMap::new(),
        }
    }

    /// Absent on miss or once the entry's wall-clock age reaches the TTL;
    /// expired entries are deleted on read.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    pub(crate) fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let payload = match self.store.read(key) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                debug!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        let envelope: CacheEnvelope<T> = match serde_json::from_str(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Dropping unreadable cache entry {}: {}", key, e);
                let _ = self.store.remove(key);
                return None;
            }
        };

        let age_ms = now.timestamp_millis() - envelope.timestamp;
        if age_ms >= CACHE_TTL_SECS * 1000 {
            debug!("Cache entry {} expired ({} ms old)", key, age_ms);
            let _ = self.store.remove(key);
            return None;
        }

        Some(envelope.data)
    }

    /// Best-effort write. Oversized payloads are refused outright; a quota
    /// failure sweeps the owning namespace and retries, falling back to the
    /// global prefix sweep as a last resort. Never fatal to the caller.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_at(key, value, Utc::now())
    }

    pub(crate) fn set_at<T: Serialize>(&self, key: &str, value: &T, now: DateTime<Utc>) {
        let envelope = CacheEnvelope {
            data: value,
            timestamp: now.timestamp_millis(),
        };
        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Skipping cache write for {}: serialization failed: {}", key, e);
                return;
            }
        };

        if payload.len() > CACHE_MAX_PAYLOAD_BYTES {
            warn!(
                "Skipping cache write for {}: payload of {} bytes exceeds the {} byte cap",
                key,
                payload.len(),
                CACHE_MAX_PAYLOAD_BYTES
            );
            return;
        }

        match self.store.write(key, &payload) {
            Ok(()) => {}
            Err(CacheError::QuotaExceeded(reason)) => {
                warn!(
                    "Cache quota exceeded writing {} ({}); sweeping namespace and retrying",
                    key, reason
                );
                if let Some(ns) = namespace_of(key) {
                    self.sweep_prefix(ns);
                }
                match self.store.write(key, &payload) {
                    Ok(()) => {}
                    Err(CacheError::QuotaExceeded(_)) => {
                        warn!("Cache quota still exceeded; sweeping all portfolio entries");
                        self.sweep_prefix(CACHE_GLOBAL_PREFIX);
                        if let Err(e) = self.store.write(key, &payload) {
                            error!("Cache write for {} failed after full sweep: {}", key, e);
                        }
                    }
                    Err(e) => warn!("Cache write retry for {} failed: {}", key, e),
                }
            }
            Err(e) => warn!("Cache write for {} failed: {}", key, e),
        }
    }

    /// Deletes the user's three persisted keys and freshness stamp. Called
    /// after every successful mutation.
    pub fn invalidate(&self, user_id: &str) {
        for key in [
            holdings_key(user_id),
            transactions_key(user_id),
            aggregates_key(user_id),
        ] {
            if let Err(e) = self.store.remove(&key) {
                warn!("Cache invalidation failed for {}: {}", key, e);
            }
        }
        self.freshness.remove(user_id);
        debug!("Invalidated cache for namespace {}", namespace(user_id));
    }

    pub fn mark_loaded(&self, user_id: &str) {
        self.freshness.insert(user_id.to_string(), Utc::now());
    }

    /// Whether the in-process tier considers the user's data recent enough
    /// that no reload needs to be attempted.
    pub fn is_fresh(&self, user_id: &str) -> bool {
        self.is_fresh_at(user_id, Utc::now())
    }

    pub(crate) fn is_fresh_at(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        self.freshness
            .get(user_id)
            .map(|loaded_at| (now - *loaded_at).num_seconds() < CACHE_TTL_SECS)
            .unwrap_or(false)
    }

    fn sweep_prefix(&self, prefix: &str) {
        match self.store.keys_with_prefix(prefix) {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = self.store.remove(&key) {
                        warn!("Cache sweep failed to remove {}: {}", key, e);
                    }
                }
            }
            Err(e) => warn!("Cache sweep failed to list keys under {}: {}", prefix, e),
        }
    }
}
