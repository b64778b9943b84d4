use chrono::{DateTime, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::validation_errors::ValidationError;
use crate::constants::{
    MAX_AMOUNT, MAX_QUANTITY, MAX_SYMBOL_LENGTH, MAX_UNIT_PRICE, MIN_NAME_LENGTH,
    MIN_SYMBOL_LENGTH, MIN_TRANSACTION_DATE,
};
use crate::holdings::Holding;
use crate::ledger::{derive_amount, HoldingRef, TransactionDraft, TransactionType};

lazy_static! {
    static ref SYMBOL_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9.-]+$").unwrap();
    static ref MIN_DATE: NaiveDate =
        NaiveDate::parse_from_str(MIN_TRANSACTION_DATE, "%Y-%m-%d").unwrap();
}

/// Everything the checks need beyond the draft itself: the existing target
/// holding when there is one, the symbols already used within the draft's
/// instrument type, and the current date.
pub struct ValidationContext<'a> {
    pub holding: Option<&'a Holding>,
    pub symbols_in_type: &'a [String],
    pub today: NaiveDate,
}

/// Checks a draft in a fixed order, short-circuiting on the first failure,
/// and returns the parsed transaction date on success.
pub fn validate_draft(
    draft: &TransactionDraft,
    ctx: &ValidationContext,
) -> std::result::Result<NaiveDate, ValidationError> {
    // 1. date: parseable, not in the future (end-of-day boundary), not
    //    before the epoch this ledger supports.
    let txn_date = parse_txn_date(&draft.txn_date)?;
    if txn_date > ctx.today {
        return Err(ValidationError::DateInFuture);
    }
    if txn_date < *MIN_DATE {
        return Err(ValidationError::DateTooEarly(MIN_TRANSACTION_DATE.to_string()));
    }

    // 2. type compatible with the holding's instrument type.
    let holding_type = match (&draft.holding, ctx.holding) {
        (HoldingRef::New(new), _) => new.holding_type,
        (HoldingRef::Existing(_), Some(holding)) => holding.holding_type,
        (HoldingRef::Existing(_), None) => return Err(ValidationError::UnknownHolding),
    };
    if !draft.txn_type.valid_for(holding_type) {
        return Err(ValidationError::IncompatibleType {
            txn_type: draft.txn_type.to_string(),
            holding_type: holding_type.to_string(),
        });
    }

    // 3. trade quantity bounds.
    if draft.txn_type.is_trade()
        && (draft.quantity <= Decimal::ZERO || draft.quantity > Decimal::from(MAX_QUANTITY))
    {
        return Err(ValidationError::InvalidQuantity(draft.quantity.to_string()));
    }

    // 4. a sell cannot exceed what the holding currently carries.
    if draft.txn_type == TransactionType::Sell {
        if let Some(holding) = ctx.holding {
            if draft.quantity > holding.total_quantity {
                return Err(ValidationError::InsufficientQuantity);
            }
        }
    }

    // 5. price bounds.
    if draft.price <= Decimal::ZERO || draft.price > Decimal::from(MAX_UNIT_PRICE) {
        return Err(ValidationError::InvalidPrice(draft.price.to_string()));
    }

    // 6. derived amount bound.
    let quantity = if draft.txn_type.is_trade() {
        draft.quantity
    } else {
        Decimal::ZERO
    };
    if derive_amount(draft.txn_type, quantity, draft.price) > Decimal::from(MAX_AMOUNT) {
        return Err(ValidationError::AmountTooLarge);
    }

    // 7. new-holding identity checks.
    if let HoldingRef::New(new) = &draft.holding {
        if new.name.trim().chars().count() < MIN_NAME_LENGTH {
            return Err(ValidationError::InvalidName);
        }
        let symbol = new.symbol.trim();
        if symbol.len() < MIN_SYMBOL_LENGTH
            || symbol.len() > MAX_SYMBOL_LENGTH
            || !SYMBOL_PATTERN.is_match(symbol)
        {
            return Err(ValidationError::InvalidSymbol(symbol.to_string()));
        }
        if ctx
            .symbols_in_type
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(symbol))
        {
            return Err(ValidationError::DuplicateSymbol(symbol.to_string()));
        }
    }

    // 8. interest rate range, when present.
    if let Some(rate) = draft.interest_rate {
        if rate < Decimal::ZERO || rate > dec!(100) {
            return Err(ValidationError::InvalidInterestRate);
        }
    }

    Ok(txn_date)
}

fn parse_txn_date(raw: &str) -> std::result::Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidDate("date is required".to_string()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }
    Err(ValidationError::InvalidDate(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use crate::holdings::{HoldingType, NewHolding};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn ctx<'a>(
        holding: Option<&'a Holding>,
        symbols: &'a [String],
    ) -> ValidationContext<'a> {
        ValidationContext {
            holding,
            symbols_in_type: symbols,
            today: today(),
        }
    }

    fn stock_draft() -> TransactionDraft {
        TransactionDraft {
            holding: HoldingRef::New(NewHolding {
                holding_type: HoldingType::Stock,
                symbol: "INFY".to_string(),
                name: "Infosys".to_string(),
                category: None,
                current_price: dec!(1500),
            }),
            txn_type: TransactionType::Buy,
            txn_date: "2024-01-15".to_string(),
            quantity: dec!(10),
            price: dec!(1450),
            interest_rate: None,
            interest_start_date: None,
        }
    }

    fn existing_holding(quantity: Decimal) -> Holding {
        let now = Utc::now();
        let mut holding = Holding::stage_new(
            "user-1",
            &NewHolding {
                holding_type: HoldingType::Stock,
                symbol: "INFY".to_string(),
                name: "Infosys".to_string(),
                category: None,
                current_price: dec!(1500),
            },
            now,
        );
        holding.total_quantity = quantity;
        holding
    }

    #[test]
    fn accepts_a_well_formed_buy() {
        let draft = stock_draft();
        let date = validate_draft(&draft, &ctx(None, &[])).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn rejects_unparseable_and_out_of_range_dates() {
        let mut draft = stock_draft();
        draft.txn_date = "not-a-date".to_string();
        assert!(matches!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::InvalidDate(_))
        ));

        draft.txn_date = "2099-01-01".to_string();
        assert_eq!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::DateInFuture)
        );

        draft.txn_date = "1999-12-31".to_string();
        assert!(matches!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::DateTooEarly(_))
        ));
    }

    #[test]
    fn a_transaction_dated_today_is_not_in_the_future() {
        let mut draft = stock_draft();
        draft.txn_date = today().format("%Y-%m-%d").to_string();
        assert!(validate_draft(&draft, &ctx(None, &[])).is_ok());
    }

    #[test]
    fn rejects_balance_on_non_bank_and_buy_on_bank() {
        let mut draft = stock_draft();
        draft.txn_type = TransactionType::Balance;
        assert!(matches!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::IncompatibleType { .. })
        ));

        let mut bank_draft = stock_draft();
        if let HoldingRef::New(new) = &mut bank_draft.holding {
            new.holding_type = HoldingType::Bank;
        }
        bank_draft.txn_type = TransactionType::Buy;
        assert!(matches!(
            validate_draft(&bank_draft, &ctx(None, &[])),
            Err(ValidationError::IncompatibleType { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_and_oversized_quantities() {
        let mut draft = stock_draft();
        draft.quantity = Decimal::ZERO;
        assert!(matches!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::InvalidQuantity(_))
        ));

        draft.quantity = dec!(1_000_001);
        assert!(matches!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn rejects_a_sell_exceeding_held_quantity() {
        let holding = existing_holding(dec!(5));
        let draft = TransactionDraft {
            holding: HoldingRef::Existing(holding.id.clone()),
            txn_type: TransactionType::Sell,
            txn_date: "2024-01-15".to_string(),
            quantity: dec!(6),
            price: dec!(1450),
            interest_rate: None,
            interest_start_date: None,
        };
        assert_eq!(
            validate_draft(&draft, &ctx(Some(&holding), &[])),
            Err(ValidationError::InsufficientQuantity)
        );
    }

    #[test]
    fn rejects_oversized_price_and_amount() {
        let mut draft = stock_draft();
        draft.price = dec!(10_000_001);
        assert!(matches!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::InvalidPrice(_))
        ));

        draft.price = dec!(9_000_000);
        draft.quantity = dec!(1_000);
        assert_eq!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::AmountTooLarge)
        );
    }

    #[test]
    fn rejects_bad_new_holding_identity() {
        let mut draft = stock_draft();
        if let HoldingRef::New(new) = &mut draft.holding {
            new.name = "X".to_string();
        }
        assert_eq!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::InvalidName)
        );

        let mut draft = stock_draft();
        if let HoldingRef::New(new) = &mut draft.holding {
            new.symbol = "IN FY".to_string();
        }
        assert!(matches!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::InvalidSymbol(_))
        ));

        let draft = stock_draft();
        let symbols = vec!["infy".to_string()];
        assert!(matches!(
            validate_draft(&draft, &ctx(None, &symbols)),
            Err(ValidationError::DuplicateSymbol(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_interest_rate() {
        let mut draft = stock_draft();
        if let HoldingRef::New(new) = &mut draft.holding {
            new.holding_type = HoldingType::Gold;
        }
        draft.interest_rate = Some(dec!(101));
        assert_eq!(
            validate_draft(&draft, &ctx(None, &[])),
            Err(ValidationError::InvalidInterestRate)
        );

        draft.interest_rate = Some(dec!(2.5));
        assert!(validate_draft(&draft, &ctx(None, &[])).is_ok());
    }
}
