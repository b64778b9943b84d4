pub(crate) mod cache_errors;
pub(crate) mod cache_model;
pub(crate) mod cache_service;
pub(crate) mod cache_store;

pub use cache_errors::CacheError;
pub use cache_model::{aggregates_key, holdings_key, namespace, transactions_key, CacheEnvelope};
pub use cache_service::PortfolioCache;
pub use cache_store::{CacheStoreTrait, SqliteCacheStore};
