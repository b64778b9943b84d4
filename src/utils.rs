use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Converts a stored `Double` column into a `Decimal`, defaulting to zero on
/// values `Decimal` cannot represent.
pub fn decimal_from_f64(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Converts a `Decimal` into the `Double` representation stored in SQLite.
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
