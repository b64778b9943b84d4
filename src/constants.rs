/// Earliest calendar date a transaction may carry.
pub const MIN_TRANSACTION_DATE: &str = "2000-01-01";

/// Upper bound on buy/sell quantity.
pub const MAX_QUANTITY: u32 = 1_000_000;

/// Upper bound on unit price / entered amount.
pub const MAX_UNIT_PRICE: u32 = 10_000_000;

/// Upper bound on a derived transaction amount.
pub const MAX_AMOUNT: u64 = 1_000_000_000;

/// Maximum length of any sanitized free-text field.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Minimum holding name length.
pub const MIN_NAME_LENGTH: usize = 2;

/// Symbol length bounds.
pub const MIN_SYMBOL_LENGTH: usize = 2;
pub const MAX_SYMBOL_LENGTH: usize = 20;

/// Day-count basis for gold interest accrual.
pub const DAYS_PER_YEAR: i64 = 365;

/// Hard cap on rows returned by an unbounded transaction fetch.
pub const TRANSACTION_FETCH_HARD_CAP: i64 = 10_000;

/// Wall-clock TTL for persisted cache entries.
pub const CACHE_TTL_SECS: i64 = 300;

/// Per-entry cap on a serialized cache payload.
pub const CACHE_MAX_PAYLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Prefix shared by every persisted cache key, across users.
pub const CACHE_GLOBAL_PREFIX: &str = "portfolio_";

/// Default page size for transaction pagination.
pub const DEFAULT_PAGE_SIZE: usize = 10;
