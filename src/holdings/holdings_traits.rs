use rust_decimal::Decimal;

use super::holdings_model::{Holding, HoldingType};
use crate::portfolio::HoldingStats;
use crate::Result;

/// Trait defining the contract for Holding repository operations.
pub trait HoldingRepositoryTrait: Send + Sync {
    fn get_holdings(&self, user_id: &str) -> Result<Vec<Holding>>;
    fn get_holding(&self, user_id: &str, holding_id: &str) -> Result<Holding>;
    fn find_by_symbol(
        &self,
        user_id: &str,
        holding_type: HoldingType,
        symbol: &str,
    ) -> Result<Option<Holding>>;
    /// Writes the denormalized fold results back onto the holding row and
    /// returns the refreshed record.
    fn apply_stats(&self, user_id: &str, holding_id: &str, stats: &HoldingStats) -> Result<Holding>;
    fn update_current_price(&self, user_id: &str, holding_id: &str, price: Decimal) -> Result<Holding>;
}
