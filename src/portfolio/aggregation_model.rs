use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::portfolio_errors::PortfolioError;
use crate::holdings::HoldingType;
use crate::utils::{decimal_from_f64, decimal_to_f64};

/// Result of folding one holding's non-deleted transactions. Written back
/// onto the holding row as its denormalized fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingStats {
    pub total_quantity: Decimal,
    pub average_cost: Decimal,
    pub total_cost: Decimal,
    pub current_value: Decimal,
    pub total_income: Decimal,
    pub capital_gain: Decimal,
    pub total_gain: Decimal,
    pub total_return: Decimal,
    pub last_transaction_date: Option<NaiveDate>,
    pub transaction_count: i32,
}

/// Rollup of every holding of one instrument type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSummary {
    pub total_cost: Decimal,
    pub current_value: Decimal,
    pub total_income: Decimal,
    pub total_gain: Decimal,
    pub total_return: Decimal,
}

/// Whole-portfolio rollup, one singleton per user, with the per-type
/// summaries embedded under their type key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAggregate {
    pub total_cost: Decimal,
    pub current_value: Decimal,
    pub total_income: Decimal,
    pub total_gain: Decimal,
    pub total_return: Decimal,
    pub by_type: HashMap<HoldingType, TypeSummary>,
    pub last_calculated: DateTime<Utc>,
}

/// Database model for the portfolio aggregate singleton
#[derive(Queryable, Selectable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolio_aggregates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioAggregateDB {
    pub user_id: String,
    pub total_cost: f64,
    pub current_value: f64,
    pub total_income: f64,
    pub total_gain: f64,
    pub total_return: f64,
    pub by_type: String,
    pub last_calculated: NaiveDateTime,
}

impl TryFrom<PortfolioAggregateDB> for PortfolioAggregate {
    type Error = PortfolioError;

    fn try_from(db: PortfolioAggregateDB) -> std::result::Result<Self, Self::Error> {
        let by_type: HashMap<HoldingType, TypeSummary> = serde_json::from_str(&db.by_type)
            .map_err(|e| PortfolioError::InvalidData(e.to_string()))?;
        Ok(PortfolioAggregate {
            total_cost: decimal_from_f64(db.total_cost),
            current_value: decimal_from_f64(db.current_value),
            total_income: decimal_from_f64(db.total_income),
            total_gain: decimal_from_f64(db.total_gain),
            total_return: decimal_from_f64(db.total_return),
            by_type,
            last_calculated: db.last_calculated.and_utc(),
        })
    }
}

impl PortfolioAggregateDB {
    pub fn from_aggregate(
        user_id: &str,
        aggregate: &PortfolioAggregate,
    ) -> std::result::Result<Self, PortfolioError> {
        let by_type = serde_json::to_string(&aggregate.by_type)
            .map_err(|e| PortfolioError::InvalidData(e.to_string()))?;
        Ok(PortfolioAggregateDB {
            user_id: user_id.to_string(),
            total_cost: decimal_to_f64(aggregate.total_cost),
            current_value: decimal_to_f64(aggregate.current_value),
            total_income: decimal_to_f64(aggregate.total_income),
            total_gain: decimal_to_f64(aggregate.total_gain),
            total_return: decimal_to_f64(aggregate.total_return),
            by_type,
            last_calculated: aggregate.last_calculated.naive_utc(),
        })
    }
}
