use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use super::aggregation_model::{HoldingStats, PortfolioAggregate, TypeSummary};
use crate::constants::DAYS_PER_YEAR;
use crate::holdings::{Holding, HoldingType};
use crate::ledger::{Transaction, TransactionType};

/// Folds a holding's non-deleted transactions into its statistics.
///
/// Cost model: a cumulative running average. Buys add quantity and amount to
/// cost; sells subtract quantity only, leaving the cost basis untouched, so
/// the average cost is always total_cost / total_quantity over the remainder.
/// This is not FIFO/LIFO lot tracking.
///
/// `as_of` is the date interest accrues up to; callers pass the current date.
pub fn fold_holding_stats(
    holding: &Holding,
    transactions: &[Transaction],
    as_of: NaiveDate,
) -> HoldingStats {
    let live: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| !t.is_deleted && t.holding_id == holding.id)
        .collect();

    let mut stats = HoldingStats {
        transaction_count: live.len() as i32,
        last_transaction_date: live.iter().map(|t| t.txn_date).max(),
        ..HoldingStats::default()
    };

    if holding.holding_type == HoldingType::Bank {
        // A bank holding's value is whatever the latest entry says it is.
        stats.current_value = live
            .iter()
            .max_by(|a, b| (a.txn_date, &a.id).cmp(&(b.txn_date, &b.id)))
            .map(|t| t.amount)
            .unwrap_or_default();
        return stats;
    }

    for txn in &live {
        match txn.txn_type {
            TransactionType::Buy => {
                stats.total_quantity += txn.quantity;
                stats.total_cost += txn.amount;
            }
            TransactionType::Sell => {
                stats.total_quantity -= txn.quantity;
            }
            TransactionType::Dividend | TransactionType::Interest => {
                stats.total_income += txn.amount;
            }
            TransactionType::Balance => {}
        }
    }

    if holding.holding_type == HoldingType::Gold {
        if let Some(accrued) = accrued_gold_interest(&live, stats.total_cost, as_of) {
            debug!(
                "Holding {} accrued {} gold interest as of {}",
                holding.id, accrued, as_of
            );
            stats.total_income += accrued;
        }
    }

    stats.average_cost = if stats.total_quantity > Decimal::ZERO {
        stats.total_cost / stats.total_quantity
    } else {
        Decimal::ZERO
    };
    stats.current_value = stats.total_quantity * holding.current_price;
    stats.capital_gain = stats.current_value - stats.total_cost;
    stats.total_gain = stats.capital_gain + stats.total_income;
    stats.total_return = if stats.total_cost > Decimal::ZERO {
        stats.total_gain / stats.total_cost * dec!(100)
    } else {
        Decimal::ZERO
    };

    stats
}

/// Interest accrues on the full cost basis at the rate carried by the
/// earliest rated buy, from its start date (or its transaction date) up to
/// `as_of`. Later lots with different rates are not tracked separately.
fn accrued_gold_interest(
    live: &[&Transaction],
    total_cost: Decimal,
    as_of: NaiveDate,
) -> Option<Decimal> {
    let rated_buy = live
        .iter()
        .filter(|t| t.txn_type == TransactionType::Buy && t.interest_rate.is_some())
        .min_by(|a, b| (a.txn_date, &a.id).cmp(&(b.txn_date, &b.id)))?;

    let rate = rated_buy.interest_rate?;
    let start = rated_buy.interest_start_date.unwrap_or(rated_buy.txn_date);
    let days_elapsed = (as_of - start).num_days().max(0);

    Some(total_cost * rate / dec!(100) * Decimal::from(days_elapsed) / Decimal::from(DAYS_PER_YEAR))
}

/// Sums refreshed per-holding stats grouped by instrument type.
pub fn fold_type_summaries(holdings: &[Holding]) -> HashMap<HoldingType, TypeSummary> {
    let mut by_type: HashMap<HoldingType, TypeSummary> = HashMap::new();

    for holding in holdings {
        let summary = by_type.entry(holding.holding_type).or_default();
        summary.total_cost += holding.total_cost;
        summary.current_value += holding.current_value;
        summary.total_income += holding.total_income;
    }

    for summary in by_type.values_mut() {
        summary.total_gain = summary.current_value - summary.total_cost + summary.total_income;
        summary.total_return = if summary.total_cost > Decimal::ZERO {
            summary.total_gain / summary.total_cost * dec!(100)
        } else {
            Decimal::ZERO
        };
    }

    by_type
}

/// Sums type summaries into the whole-portfolio aggregate.
pub fn fold_portfolio_summary(
    by_type: HashMap<HoldingType, TypeSummary>,
    last_calculated: DateTime<Utc>,
) -> PortfolioAggregate {
    let mut total_cost = Decimal::ZERO;
    let mut current_value = Decimal::ZERO;
    let mut total_income = Decimal::ZERO;

    for summary in by_type.values() {
        total_cost += summary.total_cost;
        current_value += summary.current_value;
        total_income += summary.total_income;
    }

    let total_gain = current_value - total_cost + total_income;
    let total_return = if total_cost > Decimal::ZERO {
        total_gain / total_cost * dec!(100)
    } else {
        Decimal::ZERO
    };

    PortfolioAggregate {
        total_cost,
        current_value,
        total_income,
        total_gain,
        total_return,
        by_type,
        last_calculated,
    }
}
