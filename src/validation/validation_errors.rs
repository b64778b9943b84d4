use thiserror::Error;

/// A rejected draft. Every variant is user-correctable input, surfaced
/// verbatim and never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid transaction date: {0}")]
    InvalidDate(String),
    #[error("Transaction date cannot be in the future")]
    DateInFuture,
    #[error("Transaction date cannot be before {0}")]
    DateTooEarly(String),
    #[error("Transaction type {txn_type} is not valid for {holding_type} holdings")]
    IncompatibleType {
        txn_type: String,
        holding_type: String,
    },
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("insufficient quantity")]
    InsufficientQuantity,
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
    #[error("Transaction amount exceeds the allowed maximum")]
    AmountTooLarge,
    #[error("Holding name is too short")]
    InvalidName,
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
    #[error("Symbol '{0}' is already used within this holding type")]
    DuplicateSymbol(String),
    #[error("Interest rate must be between 0 and 100")]
    InvalidInterestRate,
    #[error("Transaction does not reference a known holding")]
    UnknownHolding,
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
}
