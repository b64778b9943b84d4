use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::holdings_errors::HoldingError;
use super::holdings_model::{Holding, HoldingDB, HoldingType};
use super::holdings_traits::HoldingRepositoryTrait;
use crate::db::{get_connection, DbPool};
use crate::portfolio::HoldingStats;
use crate::schema::holdings;
use crate::utils::decimal_to_f64;
use crate::Result;

/// Repository for managing holding records in the database
pub struct HoldingRepository {
    pool: Arc<DbPool>,
}

impl HoldingRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl HoldingRepositoryTrait for HoldingRepository {
    fn get_holdings(&self, user_id: &str) -> Result<Vec<Holding>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .order((holdings::holding_type.asc(), holdings::symbol.asc()))
            .select(HoldingDB::as_select())
            .load::<HoldingDB>(&mut conn)
            .map_err(HoldingError::from)?;

        rows.into_iter()
            .map(|row| Holding::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_holding(&self, user_id: &str, holding_id: &str) -> Result<Holding> {
        let mut conn = get_connection(&self.pool)?;

        let row = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .filter(holdings::id.eq(holding_id))
            .select(HoldingDB::as_select())
            .first::<HoldingDB>(&mut conn)
            .map_err(HoldingError::from)?;

        Ok(Holding::try_from(row)?)
    }

    fn find_by_symbol(
        &self,
        user_id: &str,
        holding_type: HoldingType,
        symbol: &str,
    ) -> Result<Option<Holding>> {
        let mut conn = get_connection(&self.pool)?;

        // Symbol uniqueness is case-insensitive; SQLite collation is not
        // guaranteed to be, so the comparison happens here.
        let rows = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .filter(holdings::holding_type.eq(holding_type.as_str()))
            .select(HoldingDB::as_select())
            .load::<HoldingDB>(&mut conn)
            .map_err(HoldingError::from)?;

        for row in rows {
            if row.symbol.eq_ignore_ascii_case(symbol) {
                return Ok(Some(Holding::try_from(row)?));
            }
        }
        Ok(None)
    }

    fn apply_stats(&self, user_id: &str, holding_id: &str, stats: &HoldingStats) -> Result<Holding> {
        let mut conn = get_connection(&self.pool)?;

        let updated = diesel::update(
            holdings::table
                .filter(holdings::user_id.eq(user_id))
                .filter(holdings::id.eq(holding_id)),
        )
        .set((
            holdings::total_quantity.eq(decimal_to_f64(stats.total_quantity)),
            holdings::average_cost.eq(decimal_to_f64(stats.average_cost)),
            holdings::total_cost.eq(decimal_to_f64(stats.total_cost)),
            holdings::current_value.eq(decimal_to_f64(stats.current_value)),
            holdings::total_income.eq(decimal_to_f64(stats.total_income)),
            holdings::last_transaction_date.eq(stats.last_transaction_date),
            holdings::transaction_count.eq(stats.transaction_count),
            holdings::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)
        .map_err(HoldingError::from)?;

        if updated == 0 {
            return Err(HoldingError::NotFound(holding_id.to_string()).into());
        }

        self.get_holding(user_id, holding_id)
    }

    fn update_current_price(&self, user_id: &str, holding_id: &str, price: Decimal) -> Result<Holding> {
        let mut conn = get_connection(&self.pool)?;

        let updated = diesel::update(
            holdings::table
                .filter(holdings::user_id.eq(user_id))
                .filter(holdings::id.eq(holding_id)),
        )
        .set((
            holdings::current_price.eq(decimal_to_f64(price)),
            holdings::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)
        .map_err(HoldingError::from)?;

        if updated == 0 {
            return Err(HoldingError::NotFound(holding_id.to_string()).into());
        }

        self.get_holding(user_id, holding_id)
    }
}
