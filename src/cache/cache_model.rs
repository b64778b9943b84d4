use serde::{Deserialize, Serialize};

use crate::constants::CACHE_GLOBAL_PREFIX;

/// Persisted cache payload: the cached value plus its write timestamp in
/// epoch milliseconds. Age is measured against this, not the row's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    pub data: T,
    pub timestamp: i64,
}

/// All of a user's keys live under `portfolio_<user_id>`.
pub fn namespace(user_id: &str) -> String {
    format!("{}{}", CACHE_GLOBAL_PREFIX, user_id)
}

pub fn holdings_key(user_id: &str) -> String {
    format!("{}_holdings", namespace(user_id))
}

pub fn transactions_key(user_id: &str) -> String {
    format!("{}_transactions", namespace(user_id))
}

pub fn aggregates_key(user_id: &str) -> String {
    format!("{}_aggregates", namespace(user_id))
}

/// Recovers the namespace from one of the three well-known keys.
pub fn namespace_of(key: &str) -> Option<&str> {
    for suffix in ["_holdings", "_transactions", "_aggregates"] {
        if let Some(ns) = key.strip_suffix(suffix) {
            return Some(ns);
        }
    }
    None
}
