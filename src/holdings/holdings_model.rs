use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::{decimal_from_f64, decimal_to_f64};

/// Instrument kinds a holding can carry. Unknown strings from the store are
/// rejected at the boundary, never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HoldingType {
    Stock,
    Fund,
    Gold,
    Bank,
}

impl HoldingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldingType::Stock => "STOCK",
            HoldingType::Fund => "FUND",
            HoldingType::Gold => "GOLD",
            HoldingType::Bank => "BANK",
        }
    }

    pub fn all() -> [HoldingType; 4] {
        [
            HoldingType::Stock,
            HoldingType::Fund,
            HoldingType::Gold,
            HoldingType::Bank,
        ]
    }
}

impl FromStr for HoldingType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STOCK" => Ok(HoldingType::Stock),
            "FUND" => Ok(HoldingType::Fund),
            "GOLD" => Ok(HoldingType::Gold),
            "BANK" => Ok(HoldingType::Bank),
            _ => Err(format!("Unknown holding type: {}", s)),
        }
    }
}

impl std::fmt::Display for HoldingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model for a tracked instrument or bank account position.
///
/// The quantity/cost/value/income fields are denormalized: always derivable
/// by folding the holding's non-deleted transactions. They are a cache of
/// that fold, never an independent source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub user_id: String,
    pub holding_type: HoldingType,
    pub symbol: String,
    pub name: String,
    pub category: Option<String>,
    pub current_price: Decimal,
    pub total_quantity: Decimal,
    pub average_cost: Decimal,
    pub total_cost: Decimal,
    pub current_value: Decimal,
    pub total_income: Decimal,
    pub last_transaction_date: Option<NaiveDate>,
    pub transaction_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    /// Builds the record staged alongside a first transaction. Denormalized
    /// fields start zeroed; the post-commit recompute fills them in.
    pub fn stage_new(user_id: &str, input: &NewHolding, now: DateTime<Utc>) -> Self {
        Holding {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            holding_type: input.holding_type,
            symbol: input.symbol.clone(),
            name: input.name.clone(),
            category: input.category.clone(),
            current_price: input.current_price,
            total_quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            current_value: Decimal::ZERO,
            total_income: Decimal::ZERO,
            last_transaction_date: None,
            transaction_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input model for a holding created as the side effect of its first
/// transaction being saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHolding {
    pub holding_type: HoldingType,
    pub symbol: String,
    pub name: String,
    pub category: Option<String>,
    pub current_price: Decimal,
}

/// Database model for holdings
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct HoldingDB {
    pub id: String,
    pub user_id: String,
    pub holding_type: String,
    pub symbol: String,
    pub name: String,
    pub category: Option<String>,
    pub current_price: f64,
    pub total_quantity: f64,
    pub average_cost: f64,
    pub total_cost: f64,
    pub current_value: f64,
    pub total_income: f64,
    pub last_transaction_date: Option<NaiveDate>,
    pub transaction_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<HoldingDB> for Holding {
    type Error = super::HoldingError;

    fn try_from(db: HoldingDB) -> std::result::Result<Self, Self::Error> {
        let holding_type = HoldingType::from_str(&db.holding_type)
            .map_err(super::HoldingError::InvalidData)?;
        Ok(Holding {
            id: db.id,
            user_id: db.user_id,
            holding_type,
            symbol: db.symbol,
            name: db.name,
            category: db.category,
            current_price: decimal_from_f64(db.current_price),
            total_quantity: decimal_from_f64(db.total_quantity),
            average_cost: decimal_from_f64(db.average_cost),
            total_cost: decimal_from_f64(db.total_cost),
            current_value: decimal_from_f64(db.current_value),
            total_income: decimal_from_f64(db.total_income),
            last_transaction_date: db.last_transaction_date,
            transaction_count: db.transaction_count,
            created_at: db.created_at.and_utc(),
            updated_at: db.updated_at.and_utc(),
        })
    }
}

impl From<&Holding> for HoldingDB {
    fn from(holding: &Holding) -> Self {
        HoldingDB {
            id: holding.id.clone(),
            user_id: holding.user_id.clone(),
            holding_type: holding.holding_type.as_str().to_string(),
            symbol: holding.symbol.clone(),
            name: holding.name.clone(),
            category: holding.category.clone(),
            current_price: decimal_to_f64(holding.current_price),
            total_quantity: decimal_to_f64(holding.total_quantity),
            average_cost: decimal_to_f64(holding.average_cost),
            total_cost: decimal_to_f64(holding.total_cost),
            current_value: decimal_to_f64(holding.current_value),
            total_income: decimal_to_f64(holding.total_income),
            last_transaction_date: holding.last_transaction_date,
            transaction_count: holding.transaction_count,
            created_at: holding.created_at.naive_utc(),
            updated_at: holding.updated_at.naive_utc(),
        }
    }
}
