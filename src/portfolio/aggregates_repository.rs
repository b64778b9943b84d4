use diesel::prelude::*;
use std::sync::Arc;

use super::aggregation_model::{PortfolioAggregate, PortfolioAggregateDB};
use super::portfolio_errors::PortfolioError;
use super::portfolio_traits::AggregatesRepositoryTrait;
use crate::db::{get_connection, DbPool};
use crate::schema::portfolio_aggregates;
use crate::Result;

/// Repository for the per-user portfolio aggregate singleton
pub struct AggregatesRepository {
    pool: Arc<DbPool>,
}

impl AggregatesRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl AggregatesRepositoryTrait for AggregatesRepository {
    fn get(&self, user_id: &str) -> Result<Option<PortfolioAggregate>> {
        let mut conn = get_connection(&self.pool)?;

        let row = portfolio_aggregates::table
            .filter(portfolio_aggregates::user_id.eq(user_id))
            .select(PortfolioAggregateDB::as_select())
            .first::<PortfolioAggregateDB>(&mut conn)
            .optional()
            .map_err(PortfolioError::from)?;

        match row {
            Some(row) => Ok(Some(PortfolioAggregate::try_from(row)?)),
            None => Ok(None),
        }
    }

    fn upsert(&self, user_id: &str, aggregate: &PortfolioAggregate) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let row = PortfolioAggregateDB::from_aggregate(user_id, aggregate)?;

        diesel::replace_into(portfolio_aggregates::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(PortfolioError::from)?;

        Ok(())
    }
}
