use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::pagination_errors::PaginationError;
use super::pagination_model::{PageCursor, TransactionPage};
use crate::ledger::LedgerRepositoryTrait;
use crate::Result;

/// Cursor-based retrieval of a holding's transaction pages, independent of
/// the full in-memory transaction set.
pub struct PaginationService {
    user_id: String,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    generation: AtomicU64,
}

impl PaginationService {
    pub fn new(user_id: String, ledger_repository: Arc<dyn LedgerRepositoryTrait>) -> Self {
        Self {
            user_id,
            ledger_repository,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetches one page, asking for `page_size + 1` rows so `has_more` needs
    /// no total count. Pass the previous page's `next_cursor` to continue.
    pub fn fetch_page(
        &self,
        holding_id: &str,
        cursor: Option<&PageCursor>,
        page_size: usize,
    ) -> Result<TransactionPage> {
        let generation = self.generation.load(Ordering::SeqCst);
        let limit = page_size as i64 + 1;

        let mut items = self
            .ledger_repository
            .fetch_page_after(&self.user_id, holding_id, cursor, limit)
            .map_err(|e| PaginationError::FetchFailed(e.to_string()))?;

        let has_more = items.len() > page_size;
        if has_more {
            items.truncate(page_size);
        }
        let next_cursor = if has_more {
            items.last().map(PageCursor::from)
        } else {
            None
        };

        Ok(TransactionPage {
            items,
            has_more,
            next_cursor,
            generation,
        })
    }

    /// Call when the holding filter or page size changes: in-flight fetches
    /// started before this are superseded and their results must be dropped.
    pub fn invalidate(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a fetched page still belongs to the current filter state.
    pub fn is_current(&self, page: &TransactionPage) -> bool {
        page.generation == self.generation.load(Ordering::SeqCst)
    }

    /// Approximate count for UI labeling only; pagination correctness relies
    /// solely on `has_more`.
    pub fn approximate_total(&self, holding_id: &str) -> Result<i64> {
        self.ledger_repository
            .count_non_deleted(&self.user_id, holding_id)
            .map_err(|e| PaginationError::FetchFailed(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use uuid::Uuid;

    use super::*;
    use crate::ledger::tests::mocks::{InMemoryPortfolioStore, TEST_USER};
    use crate::ledger::{Transaction, TransactionType};

    const HOLDING: &str = "holding-1";

    fn seed_transactions(store: &InMemoryPortfolioStore, count: u32) {
        let mut transactions = store.transactions.write().unwrap();
        for i in 0..count {
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64);
            transactions.push(Transaction {
                id: Uuid::new_v4().to_string(),
                user_id: TEST_USER.to_string(),
                holding_id: HOLDING.to_string(),
                txn_type: TransactionType::Buy,
                txn_date: date,
                quantity: dec!(1),
                price: dec!(100),
                amount: dec!(100),
                interest_rate: None,
                interest_start_date: None,
                is_deleted: false,
                deleted_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
    }

    fn service_over(store: Arc<InMemoryPortfolioStore>) -> PaginationService {
        PaginationService::new(TEST_USER.to_string(), store)
    }

    #[test]
    fn walks_25_rows_as_10_10_5() {
        let store = Arc::new(InMemoryPortfolioStore::default());
        seed_transactions(&store, 25);
        let service = service_over(store);

        let page1 = service.fetch_page(HOLDING, None, 10).unwrap();
        assert_eq!(page1.items.len(), 10);
        assert!(page1.has_more);
        let cursor1 = page1.next_cursor.clone().unwrap();
        assert_eq!(cursor1, PageCursor::from(page1.items.last().unwrap()));

        let page2 = service.fetch_page(HOLDING, Some(&cursor1), 10).unwrap();
        assert_eq!(page2.items.len(), 10);
        assert!(page2.has_more);

        let page3 = service
            .fetch_page(HOLDING, page2.next_cursor.as_ref(), 10)
            .unwrap();
        assert_eq!(page3.items.len(), 5);
        assert!(!page3.has_more);
        assert!(page3.next_cursor.is_none());

        // Pages are date-descending and disjoint.
        assert!(page1.items.first().unwrap().txn_date > page2.items.first().unwrap().txn_date);
        let mut seen: Vec<&str> = page1
            .items
            .iter()
            .chain(&page2.items)
            .chain(&page3.items)
            .map(|t| t.id.as_str())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 25);
    }

    #[test]
    fn soft_deleted_rows_never_appear_in_pages() {
        let store = Arc::new(InMemoryPortfolioStore::default());
        seed_transactions(&store, 5);
        let deleted_id = {
            let mut transactions = store.transactions.write().unwrap();
            transactions[2].is_deleted = true;
            transactions[2].id.clone()
        };
        let service = service_over(store);

        let page = service.fetch_page(HOLDING, None, 10).unwrap();
        assert_eq!(page.items.len(), 4);
        assert!(page.items.iter().all(|t| t.id != deleted_id));
        assert_eq!(service.approximate_total(HOLDING).unwrap(), 4);
    }

    #[test]
    fn a_superseded_page_is_not_current() {
        let store = Arc::new(InMemoryPortfolioStore::default());
        seed_transactions(&store, 3);
        let service = service_over(store);

        let page = service.fetch_page(HOLDING, None, 10).unwrap();
        assert!(service.is_current(&page));

        // Filter changed while the fetch was in flight: its result must be
        // dropped rather than applied.
        service.invalidate();
        assert!(!service.is_current(&page));

        let fresh = service.fetch_page(HOLDING, None, 10).unwrap();
        assert!(service.is_current(&fresh));
    }
}
