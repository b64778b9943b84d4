pub(crate) mod aggregates_repository;
pub(crate) mod aggregation_calculator;
pub(crate) mod aggregation_model;
pub(crate) mod portfolio_errors;
pub(crate) mod portfolio_service;
pub(crate) mod portfolio_traits;

pub use aggregates_repository::AggregatesRepository;
pub use aggregation_calculator::{
    fold_holding_stats, fold_portfolio_summary, fold_type_summaries,
};
pub use aggregation_model::{HoldingStats, PortfolioAggregate, TypeSummary};
pub use portfolio_errors::PortfolioError;
pub use portfolio_service::PortfolioService;
pub use portfolio_traits::{AggregatesRepositoryTrait, PortfolioServiceTrait};
