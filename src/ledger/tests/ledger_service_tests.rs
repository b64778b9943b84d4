use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::mocks::{build_services, InMemoryPortfolioStore, TEST_USER};
use crate::errors::Error;
use crate::holdings::{HoldingType, NewHolding};
use crate::ledger::{
    HoldingRef, LedgerError, LedgerServiceTrait, SavedTransaction, TransactionDraft,
    TransactionType, TransactionUpdate,
};
use crate::validation::ValidationError;

fn new_holding_draft(
    holding_type: HoldingType,
    symbol: &str,
    txn_type: TransactionType,
    quantity: rust_decimal::Decimal,
    price: rust_decimal::Decimal,
) -> TransactionDraft {
    TransactionDraft {
        holding: HoldingRef::New(NewHolding {
            holding_type,
            symbol: symbol.to_string(),
            name: format!("{} position", symbol),
            category: None,
            current_price: dec!(2600),
        }),
        txn_type,
        txn_date: "2024-01-15".to_string(),
        quantity,
        price,
        interest_rate: None,
        interest_start_date: None,
    }
}

fn existing_draft(
    holding_id: &str,
    txn_type: TransactionType,
    quantity: rust_decimal::Decimal,
    price: rust_decimal::Decimal,
) -> TransactionDraft {
    TransactionDraft {
        holding: HoldingRef::Existing(holding_id.to_string()),
        txn_type,
        txn_date: "2024-02-20".to_string(),
        quantity,
        price,
        interest_rate: None,
        interest_start_date: None,
    }
}

async fn buy_gold_units(
    ledger: &Arc<crate::ledger::LedgerService>,
) -> SavedTransaction {
    // The reference scenario: 10 units at 2450 on 2024-01-15.
    let draft = new_holding_draft(
        HoldingType::Gold,
        "SGB2024",
        TransactionType::Buy,
        dec!(10),
        dec!(2450),
    );
    ledger.save_transaction(draft).await.unwrap()
}

#[tokio::test]
async fn first_buy_creates_holding_and_denormalized_stats() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    let saved = buy_gold_units(&ledger).await;
    assert!(saved.aggregates_refreshed);

    let holding = store.holding(&saved.holding_id).unwrap();
    assert_eq!(holding.total_quantity, dec!(10));
    assert_eq!(holding.total_cost, dec!(24500));
    assert_eq!(holding.average_cost, dec!(2450));
    assert_eq!(holding.current_value, dec!(10) * dec!(2600));
    assert_eq!(holding.transaction_count, 1);

    let aggregate = store.aggregates.read().unwrap().clone().unwrap();
    assert_eq!(aggregate.total_cost, dec!(24500));
    assert_eq!(aggregate.current_value, dec!(26000));
}

#[tokio::test]
async fn sell_reduces_quantity_but_not_cost_basis() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    let saved = buy_gold_units(&ledger).await;
    ledger
        .save_transaction(existing_draft(
            &saved.holding_id,
            TransactionType::Sell,
            dec!(4),
            dec!(2600),
        ))
        .await
        .unwrap();

    let holding = store.holding(&saved.holding_id).unwrap();
    assert_eq!(holding.total_quantity, dec!(6));
    // Running-average model: the cost basis is not reduced by the sell.
    assert_eq!(holding.total_cost, dec!(24500));
    assert_eq!(holding.average_cost, dec!(24500) / dec!(6));
    assert_eq!(holding.transaction_count, 2);
}

#[tokio::test]
async fn failed_commit_leaves_no_orphaned_records() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());
    store.fail_commits.store(true, Ordering::SeqCst);

    let result = ledger
        .save_transaction(new_holding_draft(
            HoldingType::Stock,
            "INFY",
            TransactionType::Buy,
            dec!(5),
            dec!(1500),
        ))
        .await;

    assert!(matches!(
        result,
        Err(Error::Ledger(LedgerError::CommitFailed(_)))
    ));
    assert!(store.holdings.read().unwrap().is_empty());
    assert!(store.transactions.read().unwrap().is_empty());
}

#[tokio::test]
async fn recompute_failure_keeps_the_committed_transaction() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());
    store.fail_aggregate_writes.store(true, Ordering::SeqCst);

    let saved = buy_gold_units(&ledger).await;

    // Saved but stale: the write stands, the follow-up did not.
    assert!(!saved.aggregates_refreshed);
    assert!(store.transaction(&saved.transaction.id).is_some());
    assert!(store.aggregates.read().unwrap().is_none());
}

#[tokio::test]
async fn soft_delete_excludes_from_folds_but_keeps_the_tombstone() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    let saved = buy_gold_units(&ledger).await;
    let second = ledger
        .save_transaction(existing_draft(
            &saved.holding_id,
            TransactionType::Buy,
            dec!(2),
            dec!(2500),
        ))
        .await
        .unwrap();

    let deleted = ledger.delete_transaction(&second.transaction.id).await.unwrap();
    assert!(deleted.transaction.is_deleted);
    assert!(deleted.transaction.deleted_at.is_some());

    // Stats re-derive without the deleted entry.
    let holding = store.holding(&saved.holding_id).unwrap();
    assert_eq!(holding.total_quantity, dec!(10));
    assert_eq!(holding.total_cost, dec!(24500));
    assert_eq!(holding.transaction_count, 1);

    // The tombstone stays retrievable by id.
    let tombstone = ledger.get_transaction(&second.transaction.id).unwrap();
    assert!(tombstone.is_deleted);

    // But never appears in listings.
    let listed = ledger.get_transactions(&saved.holding_id).unwrap();
    assert!(listed.iter().all(|t| t.id != second.transaction.id));
}

#[tokio::test]
async fn oversell_is_rejected_by_validation() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    let saved = buy_gold_units(&ledger).await;
    let result = ledger
        .save_transaction(existing_draft(
            &saved.holding_id,
            TransactionType::Sell,
            dec!(11),
            dec!(2600),
        ))
        .await;

    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::InsufficientQuantity))
    ));
    let holding = store.holding(&saved.holding_id).unwrap();
    assert_eq!(holding.total_quantity, dec!(10));
}

#[tokio::test]
async fn the_commit_guard_catches_a_racing_oversell() {
    use crate::ledger::LedgerRepositoryTrait;

    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    let saved = buy_gold_units(&ledger).await;
    let mut racing = store.transaction(&saved.transaction.id).unwrap();
    racing.id = "racing-sell".to_string();
    racing.txn_type = TransactionType::Sell;
    racing.quantity = dec!(25);

    // A writer whose pre-commit check read stale state still loses inside
    // the commit itself.
    let result = store.commit_new(None, &racing, Some(dec!(25)));
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::InsufficientQuantity))
    ));
    assert!(store.transaction("racing-sell").is_none());
}

#[tokio::test]
async fn duplicate_symbol_within_type_is_rejected() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    buy_gold_units(&ledger).await;
    let result = ledger
        .save_transaction(new_holding_draft(
            HoldingType::Gold,
            "sgb2024",
            TransactionType::Buy,
            dec!(1),
            dec!(2500),
        ))
        .await;

    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::DuplicateSymbol(_)))
    ));
}

#[tokio::test]
async fn editing_a_transaction_recomputes_stats() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    let saved = buy_gold_units(&ledger).await;
    let updated = ledger
        .update_transaction(TransactionUpdate {
            id: saved.transaction.id.clone(),
            txn_type: TransactionType::Buy,
            txn_date: "2024-01-15".to_string(),
            quantity: dec!(20),
            price: dec!(2400),
            interest_rate: None,
            interest_start_date: None,
        })
        .await
        .unwrap();

    assert_eq!(updated.transaction.amount, dec!(48000));
    let holding = store.holding(&saved.holding_id).unwrap();
    assert_eq!(holding.total_quantity, dec!(20));
    assert_eq!(holding.total_cost, dec!(48000));
    assert_eq!(holding.average_cost, dec!(2400));
}

#[tokio::test]
async fn editing_a_deleted_transaction_is_rejected() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    let saved = buy_gold_units(&ledger).await;
    ledger.delete_transaction(&saved.transaction.id).await.unwrap();

    let result = ledger
        .update_transaction(TransactionUpdate {
            id: saved.transaction.id.clone(),
            txn_type: TransactionType::Buy,
            txn_date: "2024-01-15".to_string(),
            quantity: dec!(1),
            price: dec!(2400),
            interest_rate: None,
            interest_start_date: None,
        })
        .await;

    assert!(matches!(
        result,
        Err(Error::Ledger(LedgerError::InvalidData(_)))
    ));
}

#[tokio::test]
async fn bank_balance_entries_set_current_value_verbatim() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    let mut draft = new_holding_draft(
        HoldingType::Bank,
        "HDFC-SB",
        TransactionType::Balance,
        dec!(0),
        dec!(150000),
    );
    draft.txn_date = "2024-01-10".to_string();
    let saved = ledger.save_transaction(draft).await.unwrap();

    // Amount is the price field verbatim for balance entries.
    assert_eq!(saved.transaction.amount, dec!(150000));
    assert_eq!(saved.transaction.quantity, dec!(0));

    let mut later = existing_draft(
        &saved.holding_id,
        TransactionType::Balance,
        dec!(0),
        dec!(180000),
    );
    later.txn_date = "2024-03-01".to_string();
    ledger.save_transaction(later).await.unwrap();

    let holding = store.holding(&saved.holding_id).unwrap();
    assert_eq!(holding.current_value, dec!(180000));
    assert_eq!(holding.total_cost, dec!(0));
    assert_eq!(holding.total_quantity, dec!(0));
}

#[tokio::test]
async fn portfolio_aggregate_sums_across_holdings() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, _cache) = build_services(store.clone());

    // One stock holding worth 1000 and one worth 2500 at current prices.
    let mut first = new_holding_draft(
        HoldingType::Stock,
        "AAA",
        TransactionType::Buy,
        dec!(10),
        dec!(90),
    );
    if let HoldingRef::New(new) = &mut first.holding {
        new.current_price = dec!(100);
    }
    ledger.save_transaction(first).await.unwrap();

    let mut second = new_holding_draft(
        HoldingType::Stock,
        "BBB",
        TransactionType::Buy,
        dec!(25),
        dec!(95),
    );
    if let HoldingRef::New(new) = &mut second.holding {
        new.current_price = dec!(100);
    }
    ledger.save_transaction(second).await.unwrap();

    let aggregate = store.aggregates.read().unwrap().clone().unwrap();
    assert_eq!(aggregate.current_value, dec!(3500));
    assert_eq!(aggregate.total_cost, dec!(10) * dec!(90) + dec!(25) * dec!(95));

    let stocks = aggregate.by_type.get(&HoldingType::Stock).unwrap();
    assert_eq!(stocks.current_value, dec!(3500));
}

#[tokio::test]
async fn mutations_invalidate_the_cache() {
    let store = Arc::new(InMemoryPortfolioStore::default());
    let (ledger, _portfolio, cache) = build_services(store.clone());

    let key = crate::cache::holdings_key(TEST_USER);
    cache.set(&key, &vec!["cached".to_string()]);
    cache.mark_loaded(TEST_USER);
    assert!(cache.is_fresh(TEST_USER));

    buy_gold_units(&ledger).await;

    assert!(!cache.is_fresh(TEST_USER));
    let cached: Option<Vec<String>> = cache.get(&key);
    assert!(cached.is_none());
}
