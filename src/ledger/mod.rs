pub(crate) mod ledger_errors;
pub(crate) mod ledger_model;
pub(crate) mod ledger_repository;
pub(crate) mod ledger_service;
pub(crate) mod ledger_traits;

pub use ledger_errors::LedgerError;
pub use ledger_model::{
    derive_amount, HoldingRef, SavedTransaction, Transaction, TransactionDB, TransactionDraft,
    TransactionType, TransactionUpdate,
};
pub use ledger_repository::LedgerRepository;
pub use ledger_service::LedgerService;
pub use ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};

#[cfg(test)]
pub(crate) mod tests;
