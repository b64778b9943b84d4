use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::warn;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::ledger_errors::LedgerError;
use super::ledger_model::{Transaction, TransactionDB};
use super::ledger_traits::LedgerRepositoryTrait;
use crate::constants::TRANSACTION_FETCH_HARD_CAP;
use crate::db::{get_connection, DbPool};
use crate::errors::Error;
use crate::holdings::{Holding, HoldingDB};
use crate::pagination::PageCursor;
use crate::schema::{holdings, transactions};
use crate::utils::decimal_from_f64;
use crate::validation::ValidationError;
use crate::Result;

/// Repository owning the transaction log and the holding rows it commits
/// alongside it.
pub struct LedgerRepository {
    pool: Arc<DbPool>,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Re-checks a staged sell against the holding row as it exists inside
    /// the open transaction. Two racing writers serialize here; the loser is
    /// rejected before anything is written.
    fn check_sell_quantity(
        conn: &mut SqliteConnection,
        user_id: &str,
        holding_id: &str,
        sell_quantity: Decimal,
    ) -> std::result::Result<(), Error> {
        let available: f64 = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .filter(holdings::id.eq(holding_id))
            .select(holdings::total_quantity)
            .first::<f64>(conn)
            .map_err(LedgerError::from)?;

        if sell_quantity > decimal_from_f64(available) {
            return Err(ValidationError::InsufficientQuantity.into());
        }
        Ok(())
    }

    fn load_transaction(
        conn: &mut SqliteConnection,
        user_id: &str,
        txn_id: &str,
    ) -> std::result::Result<Transaction, Error> {
        let row = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::id.eq(txn_id))
            .select(TransactionDB::as_select())
            .first::<TransactionDB>(conn)
            .map_err(LedgerError::from)?;
        Ok(Transaction::try_from(row)?)
    }
}

impl LedgerRepositoryTrait for LedgerRepository {
    fn commit_new(
        &self,
        new_holding: Option<&Holding>,
        txn: &Transaction,
        sell_guard: Option<Decimal>,
    ) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        let txn_db = TransactionDB::from(txn);
        let holding_db = new_holding.map(HoldingDB::from);

        conn.transaction::<Transaction, Error, _>(|conn| {
            if let Some(holding_row) = &holding_db {
                diesel::insert_into(holdings::table)
                    .values(holding_row)
                    .execute(conn)
                    .map_err(|e| LedgerError::CommitFailed(e.to_string()))?;
            }

            if let Some(sell_quantity) = sell_guard {
                Self::check_sell_quantity(conn, &txn_db.user_id, &txn_db.holding_id, sell_quantity)?;
            }

            diesel::insert_into(transactions::table)
                .values(&txn_db)
                .execute(conn)
                .map_err(|e| LedgerError::CommitFailed(e.to_string()))?;

            Self::load_transaction(conn, &txn_db.user_id, &txn_db.id)
        })
    }

    fn commit_update(&self, txn: &Transaction, sell_guard: Option<Decimal>) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        let txn_db = TransactionDB::from(txn);

        conn.transaction::<Transaction, Error, _>(|conn| {
            if let Some(sell_quantity) = sell_guard {
                Self::check_sell_quantity(conn, &txn_db.user_id, &txn_db.holding_id, sell_quantity)?;
            }

            let updated = diesel::update(
                transactions::table
                    .filter(transactions::user_id.eq(&txn_db.user_id))
                    .filter(transactions::id.eq(&txn_db.id))
                    .filter(transactions::is_deleted.eq(false)),
            )
            .set(&txn_db)
            .execute(conn)
            .map_err(|e| LedgerError::CommitFailed(e.to_string()))?;

            if updated == 0 {
                return Err(LedgerError::NotFound(txn_db.id.clone()).into());
            }

            Self::load_transaction(conn, &txn_db.user_id, &txn_db.id)
        })
    }

    fn soft_delete(
        &self,
        user_id: &str,
        txn_id: &str,
        deleted_at: DateTime<Utc>,
    ) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;

        let updated = diesel::update(
            transactions::table
                .filter(transactions::user_id.eq(user_id))
                .filter(transactions::id.eq(txn_id))
                .filter(transactions::is_deleted.eq(false)),
        )
        .set((
            transactions::is_deleted.eq(true),
            transactions::deleted_at.eq(Some(deleted_at.naive_utc())),
            transactions::updated_at.eq(deleted_at.naive_utc()),
        ))
        .execute(&mut conn)
        .map_err(LedgerError::from)?;

        if updated == 0 {
            return Err(LedgerError::NotFound(txn_id.to_string()).into());
        }

        Self::load_transaction(&mut conn, user_id, txn_id)
    }

    fn get_transaction(&self, user_id: &str, txn_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        Self::load_transaction(&mut conn, user_id, txn_id)
    }

    fn get_transactions_for_holding(
        &self,
        user_id: &str,
        holding_id: &str,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::holding_id.eq(holding_id))
            .filter(transactions::is_deleted.eq(false))
            .order((transactions::txn_date.asc(), transactions::id.asc()))
            .limit(TRANSACTION_FETCH_HARD_CAP)
            .select(TransactionDB::as_select())
            .load::<TransactionDB>(&mut conn)
            .map_err(LedgerError::from)?;

        if rows.len() as i64 == TRANSACTION_FETCH_HARD_CAP {
            warn!(
                "Transaction fetch for holding {} hit the {}-row cap; result may be truncated",
                holding_id, TRANSACTION_FETCH_HARD_CAP
            );
        }

        rows.into_iter()
            .map(|row| Transaction::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::is_deleted.eq(false))
            .order((transactions::txn_date.asc(), transactions::id.asc()))
            .limit(TRANSACTION_FETCH_HARD_CAP)
            .select(TransactionDB::as_select())
            .load::<TransactionDB>(&mut conn)
            .map_err(LedgerError::from)?;

        if rows.len() as i64 == TRANSACTION_FETCH_HARD_CAP {
            warn!(
                "Transaction fetch for user hit the {}-row cap; result may be truncated",
                TRANSACTION_FETCH_HARD_CAP
            );
        }

        rows.into_iter()
            .map(|row| Transaction::try_from(row).map_err(Into::into))
            .collect()
    }

    fn fetch_page_after(
        &self,
        user_id: &str,
        holding_id: &str,
        cursor: Option<&PageCursor>,
        limit: i64,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = transactions::table
            .filter(transactions::user_id.eq(user_id.to_string()))
            .filter(transactions::holding_id.eq(holding_id.to_string()))
            .filter(transactions::is_deleted.eq(false))
            .select(TransactionDB::as_select())
            .into_boxed();

        if let Some(cursor) = cursor {
            query = query.filter(
                transactions::txn_date.lt(cursor.txn_date).or(transactions::txn_date
                    .eq(cursor.txn_date)
                    .and(transactions::id.lt(cursor.id.clone()))),
            );
        }

        let rows = query
            .order((transactions::txn_date.desc(), transactions::id.desc()))
            .limit(limit)
            .load::<TransactionDB>(&mut conn)
            .map_err(LedgerError::from)?;

        rows.into_iter()
            .map(|row| Transaction::try_from(row).map_err(Into::into))
            .collect()
    }

    fn count_non_deleted(&self, user_id: &str, holding_id: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;

        let count = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::holding_id.eq(holding_id))
            .filter(transactions::is_deleted.eq(false))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(LedgerError::from)?;

        Ok(count)
    }
}
