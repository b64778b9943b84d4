pub(crate) mod holdings_errors;
pub(crate) mod holdings_model;
pub(crate) mod holdings_repository;
pub(crate) mod holdings_traits;

pub use holdings_errors::HoldingError;
pub use holdings_model::{Holding, HoldingDB, HoldingType, NewHolding};
pub use holdings_repository::HoldingRepository;
pub use holdings_traits::HoldingRepositoryTrait;
