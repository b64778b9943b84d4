use rust_decimal::Decimal;

use super::aggregation_model::PortfolioAggregate;
use crate::holdings::Holding;
use crate::Result;

/// Trait defining the contract for aggregate persistence.
pub trait AggregatesRepositoryTrait: Send + Sync {
    fn get(&self, user_id: &str) -> Result<Option<PortfolioAggregate>>;
    fn upsert(&self, user_id: &str, aggregate: &PortfolioAggregate) -> Result<()>;
}

/// Trait defining the contract for aggregate recomputation. Recomputation is
/// total: every call re-derives from the full non-deleted transaction set,
/// never patches in place.
#[async_trait::async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    /// Post-commit follow-up: refresh the affected holding, then the whole
    /// portfolio. Failures map to `PortfolioError::RecomputeFailed`.
    async fn refresh_after_commit(&self, holding_id: &str) -> Result<PortfolioAggregate>;

    fn refresh_holding_stats(&self, holding_id: &str) -> Result<Holding>;
    fn refresh_portfolio(&self) -> Result<PortfolioAggregate>;
    fn get_portfolio_aggregate(&self) -> Result<Option<PortfolioAggregate>>;

    /// Prices arrive from outside; applying one re-derives the dependent
    /// aggregates.
    async fn set_current_price(&self, holding_id: &str, price: Decimal) -> Result<Holding>;
}
