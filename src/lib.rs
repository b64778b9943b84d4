pub mod constants;
pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

pub mod cache;
pub mod context;
pub mod holdings;
pub mod ledger;
pub mod pagination;
pub mod portfolio;
pub mod validation;

pub use context::{PortfolioContext, PortfolioView};
pub use errors::{Error, Result};
