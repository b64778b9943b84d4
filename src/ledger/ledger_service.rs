use chrono::Utc;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::ledger_errors::LedgerError;
use super::ledger_model::{
    derive_amount, HoldingRef, SavedTransaction, Transaction, TransactionDraft, TransactionType,
    TransactionUpdate,
};
use super::ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
use crate::cache::PortfolioCache;
use crate::holdings::{Holding, HoldingRepositoryTrait};
use crate::portfolio::PortfolioServiceTrait;
use crate::validation::{sanitize_draft, validate_draft, ValidationContext};
use crate::Result;

/// Service owning the mutation path: validate, commit atomically, then run
/// the best-effort aggregate recompute and cache invalidation follow-ups.
pub struct LedgerService {
    user_id: String,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    portfolio_service: Arc<dyn PortfolioServiceTrait>,
    cache: Arc<PortfolioCache>,
}

impl LedgerService {
    pub fn new(
        user_id: String,
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        portfolio_service: Arc<dyn PortfolioServiceTrait>,
        cache: Arc<PortfolioCache>,
    ) -> Self {
        Self {
            user_id,
            holding_repository,
            ledger_repository,
            portfolio_service,
            cache,
        }
    }

    /// Recompute is a follow-up, not part of the commit: when it fails the
    /// transaction stands and the caller is told the aggregates are stale.
    async fn refresh_aggregates(&self, holding_id: &str) -> bool {
        match self.portfolio_service.refresh_after_commit(holding_id).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "Aggregate recompute failed after commit for holding {}: {}",
                    holding_id, e
                );
                false
            }
        }
    }

    fn symbols_in_type(&self, holding_type: crate::holdings::HoldingType) -> Result<Vec<String>> {
        Ok(self
            .holding_repository
            .get_holdings(&self.user_id)?
            .into_iter()
            .filter(|h| h.holding_type == holding_type)
            .map(|h| h.symbol)
            .collect())
    }
}

#[async_trait::async_trait]
impl LedgerServiceTrait for LedgerService {
    async fn save_transaction(&self, draft: TransactionDraft) -> Result<SavedTransaction> {
        let draft = sanitize_draft(draft);
        let now = Utc::now();
        let today = now.date_naive();

        let (existing, symbols_in_type) = match &draft.holding {
            HoldingRef::Existing(id) => {
                let holding = self.holding_repository.get_holding(&self.user_id, id)?;
                (Some(holding), Vec::new())
            }
            HoldingRef::New(new) => (None, self.symbols_in_type(new.holding_type)?),
        };

        let ctx = ValidationContext {
            holding: existing.as_ref(),
            symbols_in_type: &symbols_in_type,
            today,
        };
        let txn_date = validate_draft(&draft, &ctx)?;

        let (staged_holding, holding_id) = match &draft.holding {
            HoldingRef::Existing(id) => (None, id.clone()),
            HoldingRef::New(new) => {
                let holding = Holding::stage_new(&self.user_id, new, now);
                let id = holding.id.clone();
                (Some(holding), id)
            }
        };

        let quantity = if draft.txn_type.is_trade() {
            draft.quantity
        } else {
            Decimal::ZERO
        };

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            holding_id: holding_id.clone(),
            txn_type: draft.txn_type,
            txn_date,
            quantity,
            price: draft.price,
            amount: derive_amount(draft.txn_type, quantity, draft.price),
            interest_rate: draft.interest_rate,
            interest_start_date: draft.interest_start_date,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        let sell_guard = (draft.txn_type == TransactionType::Sell && existing.is_some())
            .then_some(quantity);

        let committed =
            self.ledger_repository
                .commit_new(staged_holding.as_ref(), &transaction, sell_guard)?;
        debug!(
            "Committed transaction {} against holding {}",
            committed.id, holding_id
        );

        self.cache.invalidate(&self.user_id);
        let aggregates_refreshed = self.refresh_aggregates(&holding_id).await;

        Ok(SavedTransaction {
            transaction: committed,
            holding_id,
            aggregates_refreshed,
        })
    }

    async fn update_transaction(&self, update: TransactionUpdate) -> Result<SavedTransaction> {
        let now = Utc::now();
        let today = now.date_naive();

        let current = self
            .ledger_repository
            .get_transaction(&self.user_id, &update.id)?;
        if current.is_deleted {
            return Err(LedgerError::InvalidData(
                "Cannot edit a deleted transaction".to_string(),
            )
            .into());
        }

        let holding = self
            .holding_repository
            .get_holding(&self.user_id, &current.holding_id)?;

        let draft = TransactionDraft {
            holding: HoldingRef::Existing(current.holding_id.clone()),
            txn_type: update.txn_type,
            txn_date: update.txn_date.clone(),
            quantity: update.quantity,
            price: update.price,
            interest_rate: update.interest_rate,
            interest_start_date: update.interest_start_date,
        };
        let ctx = ValidationContext {
            holding: Some(&holding),
            symbols_in_type: &[],
            today,
        };
        let txn_date = validate_draft(&draft, &ctx)?;

        let quantity = if update.txn_type.is_trade() {
            update.quantity
        } else {
            Decimal::ZERO
        };

        let transaction = Transaction {
            id: current.id.clone(),
            user_id: self.user_id.clone(),
            holding_id: current.holding_id.clone(),
            txn_type: update.txn_type,
            txn_date,
            quantity,
            price: update.price,
            amount: derive_amount(update.txn_type, quantity, update.price),
            interest_rate: update.interest_rate,
            interest_start_date: update.interest_start_date,
            is_deleted: false,
            deleted_at: None,
            created_at: current.created_at,
            updated_at: now,
        };

        let sell_guard =
            (update.txn_type == TransactionType::Sell).then_some(quantity);

        let committed = self
            .ledger_repository
            .commit_update(&transaction, sell_guard)?;

        self.cache.invalidate(&self.user_id);
        let aggregates_refreshed = self.refresh_aggregates(&current.holding_id).await;

        Ok(SavedTransaction {
            transaction: committed,
            holding_id: current.holding_id,
            aggregates_refreshed,
        })
    }

    async fn delete_transaction(&self, txn_id: &str) -> Result<SavedTransaction> {
        let now = Utc::now();
        let deleted = self
            .ledger_repository
            .soft_delete(&self.user_id, txn_id, now)?;
        let holding_id = deleted.holding_id.clone();
        debug!("Soft-deleted transaction {}", txn_id);

        self.cache.invalidate(&self.user_id);
        let aggregates_refreshed = self.refresh_aggregates(&holding_id).await;

        Ok(SavedTransaction {
            transaction: deleted,
            holding_id,
            aggregates_refreshed,
        })
    }

    fn get_transaction(&self, txn_id: &str) -> Result<Transaction> {
        self.ledger_repository.get_transaction(&self.user_id, txn_id)
    }

    fn get_transactions(&self, holding_id: &str) -> Result<Vec<Transaction>> {
        self.ledger_repository
            .get_transactions_for_holding(&self.user_id, holding_id)
    }
}
