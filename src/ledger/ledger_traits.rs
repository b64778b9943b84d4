use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::ledger_model::{
    SavedTransaction, Transaction, TransactionDraft, TransactionUpdate,
};
use crate::holdings::Holding;
use crate::pagination::PageCursor;
use crate::Result;

/// Trait defining the contract for ledger repository operations.
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Commits a new transaction, together with its new holding when one is
    /// staged, as a single atomic write: both become visible or neither does.
    /// `sell_guard` carries the sell quantity to re-check against the holding
    /// row inside the same database transaction.
    fn commit_new(
        &self,
        new_holding: Option<&Holding>,
        txn: &Transaction,
        sell_guard: Option<Decimal>,
    ) -> Result<Transaction>;

    /// Commits an edit of an existing, non-deleted transaction atomically.
    fn commit_update(&self, txn: &Transaction, sell_guard: Option<Decimal>) -> Result<Transaction>;

    /// Soft delete: flags the record and stamps `deleted_at`; the tombstone
    /// stays retrievable by id.
    fn soft_delete(
        &self,
        user_id: &str,
        txn_id: &str,
        deleted_at: DateTime<Utc>,
    ) -> Result<Transaction>;

    /// Fetch by id, including tombstones.
    fn get_transaction(&self, user_id: &str, txn_id: &str) -> Result<Transaction>;

    /// Non-deleted transactions of one holding, chronological, capped.
    fn get_transactions_for_holding(
        &self,
        user_id: &str,
        holding_id: &str,
    ) -> Result<Vec<Transaction>>;

    /// Non-deleted transactions across the user's holdings, chronological,
    /// capped.
    fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;

    /// One page worth of non-deleted rows, (date desc, id desc), resuming
    /// after `cursor` when given.
    fn fetch_page_after(
        &self,
        user_id: &str,
        holding_id: &str,
        cursor: Option<&PageCursor>,
        limit: i64,
    ) -> Result<Vec<Transaction>>;

    fn count_non_deleted(&self, user_id: &str, holding_id: &str) -> Result<i64>;
}

/// Trait defining the contract for ledger service operations.
#[async_trait::async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    async fn save_transaction(&self, draft: TransactionDraft) -> Result<SavedTransaction>;
    async fn update_transaction(&self, update: TransactionUpdate) -> Result<SavedTransaction>;
    async fn delete_transaction(&self, txn_id: &str) -> Result<SavedTransaction>;
    fn get_transaction(&self, txn_id: &str) -> Result<Transaction>;
    fn get_transactions(&self, holding_id: &str) -> Result<Vec<Transaction>>;
}
