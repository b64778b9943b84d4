use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::holdings::{HoldingType, NewHolding};
use crate::utils::{decimal_from_f64, decimal_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Interest,
    Balance,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
            TransactionType::Dividend => "DIVIDEND",
            TransactionType::Interest => "INTEREST",
            TransactionType::Balance => "BALANCE",
        }
    }

    /// Buy and sell move units; everything else is a pure amount entry.
    pub fn is_trade(&self) -> bool {
        matches!(self, TransactionType::Buy | TransactionType::Sell)
    }

    /// Which transaction types a holding of the given kind accepts.
    /// `Balance` is bank-only; trades are meaningless against a bank account.
    pub fn valid_for(&self, holding_type: HoldingType) -> bool {
        match holding_type {
            HoldingType::Bank => {
                matches!(self, TransactionType::Balance | TransactionType::Interest)
            }
            _ => matches!(
                self,
                TransactionType::Buy
                    | TransactionType::Sell
                    | TransactionType::Dividend
                    | TransactionType::Interest
            ),
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            "DIVIDEND" => Ok(TransactionType::Dividend),
            "INTEREST" => Ok(TransactionType::Interest),
            "BALANCE" => Ok(TransactionType::Balance),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dividend/interest/balance entries carry the amount in the price field
/// verbatim; trades derive it from quantity × price.
pub fn derive_amount(txn_type: TransactionType, quantity: Decimal, price: Decimal) -> Decimal {
    match txn_type {
        TransactionType::Dividend | TransactionType::Interest | TransactionType::Balance => price,
        TransactionType::Buy | TransactionType::Sell => quantity * price,
    }
}

/// Domain model for a ledger entry. Append-only with soft delete: deleted
/// entries stay retrievable by id but are excluded from folds and pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub holding_id: String,
    pub txn_type: TransactionType,
    pub txn_date: NaiveDate,
    pub quantity: Decimal,
    pub price: Decimal,
    pub amount: Decimal,
    pub interest_rate: Option<Decimal>,
    pub interest_start_date: Option<NaiveDate>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Designates the holding a draft is booked against: an existing record, or
/// a new holding staged for creation together with its first transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HoldingRef {
    Existing(String),
    New(NewHolding),
}

/// Input model for recording a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub holding: HoldingRef,
    pub txn_type: TransactionType,
    pub txn_date: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub interest_rate: Option<Decimal>,
    pub interest_start_date: Option<NaiveDate>,
}

/// Input model for editing an existing, non-deleted transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub txn_type: TransactionType,
    pub txn_date: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub interest_rate: Option<Decimal>,
    pub interest_start_date: Option<NaiveDate>,
}

/// Outcome of a successful mutation. `aggregates_refreshed == false` means
/// the write stands but the recompute follow-up failed; derived stats may be
/// stale until a manual refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTransaction {
    pub transaction: Transaction,
    pub holding_id: String,
    pub aggregates_refreshed: bool,
}

/// Database model for transactions
#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TransactionDB {
    pub id: String,
    pub user_id: String,
    pub holding_id: String,
    pub txn_type: String,
    pub txn_date: NaiveDate,
    pub quantity: f64,
    pub price: f64,
    pub amount: f64,
    pub interest_rate: Option<f64>,
    pub interest_start_date: Option<NaiveDate>,
    pub is_deleted: bool,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = super::LedgerError;

    fn try_from(db: TransactionDB) -> std::result::Result<Self, Self::Error> {
        let txn_type = TransactionType::from_str(&db.txn_type)
            .map_err(super::LedgerError::InvalidData)?;
        Ok(Transaction {
            id: db.id,
            user_id: db.user_id,
            holding_id: db.holding_id,
            txn_type,
            txn_date: db.txn_date,
            quantity: decimal_from_f64(db.quantity),
            price: decimal_from_f64(db.price),
            amount: decimal_from_f64(db.amount),
            interest_rate: db.interest_rate.map(decimal_from_f64),
            interest_start_date: db.interest_start_date,
            is_deleted: db.is_deleted,
            deleted_at: db.deleted_at.map(|t| t.and_utc()),
            created_at: db.created_at.and_utc(),
            updated_at: db.updated_at.and_utc(),
        })
    }
}

impl From<&Transaction> for TransactionDB {
    fn from(txn: &Transaction) -> Self {
        TransactionDB {
            id: txn.id.clone(),
            user_id: txn.user_id.clone(),
            holding_id: txn.holding_id.clone(),
            txn_type: txn.txn_type.as_str().to_string(),
            txn_date: txn.txn_date,
            quantity: decimal_to_f64(txn.quantity),
            price: decimal_to_f64(txn.price),
            amount: decimal_to_f64(txn.amount),
            interest_rate: txn.interest_rate.map(decimal_to_f64),
            interest_start_date: txn.interest_start_date,
            is_deleted: txn.is_deleted,
            deleted_at: txn.deleted_at.map(|t| t.naive_utc()),
            created_at: txn.created_at.naive_utc(),
            updated_at: txn.updated_at.naive_utc(),
        }
    }
}
