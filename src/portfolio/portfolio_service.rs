use chrono::Utc;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::aggregation_calculator::{
    fold_holding_stats, fold_portfolio_summary, fold_type_summaries,
};
use super::aggregation_model::PortfolioAggregate;
use super::portfolio_errors::PortfolioError;
use super::portfolio_traits::{AggregatesRepositoryTrait, PortfolioServiceTrait};
use crate::cache::PortfolioCache;
use crate::holdings::{Holding, HoldingRepositoryTrait};
use crate::ledger::LedgerRepositoryTrait;
use crate::Result;

/// Service recomputing derived statistics. Every recompute is total: it
/// re-derives the affected holding from its full non-deleted transaction
/// set, then the portfolio aggregate from all holdings.
pub struct PortfolioService {
    user_id: String,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    aggregates_repository: Arc<dyn AggregatesRepositoryTrait>,
    cache: Arc<PortfolioCache>,
}

impl PortfolioService {
    pub fn new(
        user_id: String,
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        aggregates_repository: Arc<dyn AggregatesRepositoryTrait>,
        cache: Arc<PortfolioCache>,
    ) -> Self {
        Self {
            user_id,
            holding_repository,
            ledger_repository,
            aggregates_repository,
            cache,
        }
    }
}

#[async_trait::async_trait]
impl PortfolioServiceTrait for PortfolioService {
    async fn refresh_after_commit(&self, holding_id: &str) -> Result<PortfolioAggregate> {
        self.refresh_holding_stats(holding_id)
            .map_err(|e| PortfolioError::RecomputeFailed(e.to_string()))?;
        self.refresh_portfolio()
            .map_err(|e| PortfolioError::RecomputeFailed(e.to_string()).into())
    }

    fn refresh_holding_stats(&self, holding_id: &str) -> Result<Holding> {
        let holding = self
            .holding_repository
            .get_holding(&self.user_id, holding_id)?;
        let transactions = self
            .ledger_repository
            .get_transactions_for_holding(&self.user_id, holding_id)?;

        let stats = fold_holding_stats(&holding, &transactions, Utc::now().date_naive());
        debug!(
            "Refreshed stats for holding {}: quantity {}, cost {}",
            holding_id, stats.total_quantity, stats.total_cost
        );

        self.holding_repository
            .apply_stats(&self.user_id, holding_id, &stats)
    }

    fn refresh_portfolio(&self) -> Result<PortfolioAggregate> {
        let holdings = self.holding_repository.get_holdings(&self.user_id)?;
        let by_type = fold_type_summaries(&holdings);
        let aggregate = fold_portfolio_summary(by_type, Utc::now());

        self.aggregates_repository.upsert(&self.user_id, &aggregate)?;
        Ok(aggregate)
    }

    fn get_portfolio_aggregate(&self) -> Result<Option<PortfolioAggregate>> {
        self.aggregates_repository.get(&self.user_id)
    }

    async fn set_current_price(&self, holding_id: &str, price: Decimal) -> Result<Holding> {
        self.holding_repository
            .update_current_price(&self.user_id, holding_id, price)?;
        self.cache.invalidate(&self.user_id);

        let refreshed = self.refresh_holding_stats(holding_id)?;
        self.refresh_portfolio()?;
        Ok(refreshed)
    }
}
