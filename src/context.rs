use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::{
    aggregates_key, holdings_key, transactions_key, PortfolioCache, SqliteCacheStore,
};
use crate::db::DbPool;
use crate::holdings::{Holding, HoldingRepository, HoldingRepositoryTrait};
use crate::ledger::{
    LedgerRepository, LedgerRepositoryTrait, LedgerService, Transaction,
};
use crate::pagination::PaginationService;
use crate::portfolio::{
    AggregatesRepository, PortfolioAggregate, PortfolioService, PortfolioServiceTrait,
};
use crate::validation::ValidationError;
use crate::Result;

lazy_static! {
    static ref USER_ID_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Everything the caller needs to render a portfolio screen in one load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    pub holdings: Vec<Holding>,
    pub transactions: Vec<Transaction>,
    pub aggregates: Option<PortfolioAggregate>,
}

/// Per-session wiring of repositories and services over one pool, scoped to
/// one authenticated user. Built once at sign-in; `sign_out` tears the
/// cached state down. Handles pass explicitly through constructors, never as
/// ambient globals.
pub struct PortfolioContext {
    user_id: String,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    pub ledger: Arc<LedgerService>,
    pub portfolio: Arc<PortfolioService>,
    pub pagination: Arc<PaginationService>,
    pub cache: Arc<PortfolioCache>,
}

impl PortfolioContext {
    pub fn initialize(pool: Arc<DbPool>, user_id: &str) -> Result<Self> {
        if !USER_ID_PATTERN.is_match(user_id) {
            return Err(ValidationError::InvalidUserId(user_id.to_string()).into());
        }

        let holding_repository: Arc<dyn HoldingRepositoryTrait> =
            Arc::new(HoldingRepository::new(pool.clone()));
        let ledger_repository: Arc<dyn LedgerRepositoryTrait> =
            Arc::new(LedgerRepository::new(pool.clone()));
        let aggregates_repository = Arc::new(AggregatesRepository::new(pool.clone()));
        let cache = Arc::new(PortfolioCache::new(Arc::new(SqliteCacheStore::new(pool))));

        let portfolio = Arc::new(PortfolioService::new(
            user_id.to_string(),
            holding_repository.clone(),
            ledger_repository.clone(),
            aggregates_repository,
            cache.clone(),
        ));
        let ledger = Arc::new(LedgerService::new(
            user_id.to_string(),
            holding_repository.clone(),
            ledger_repository.clone(),
            portfolio.clone(),
            cache.clone(),
        ));
        let pagination = Arc::new(PaginationService::new(
            user_id.to_string(),
            ledger_repository.clone(),
        ));

        info!("Initialized portfolio session for user {}", user_id);
        Ok(Self {
            user_id: user_id.to_string(),
            holding_repository,
            ledger_repository,
            ledger,
            portfolio,
            pagination,
            cache,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Loads the portfolio in the documented order: in-process freshness
    /// first, then the persisted cache, then a full store fetch that
    /// repopulates both tiers and lazily computes the aggregate when it is
    /// missing and holdings exist.
    pub fn load_portfolio(&self) -> Result<PortfolioView> {
        if self.cache.is_fresh(&self.user_id) {
            let cached_holdings: Option<Vec<Holding>> =
                self.cache.get(&holdings_key(&self.user_id));
            let cached_transactions: Option<Vec<Transaction>> =
                self.cache.get(&transactions_key(&self.user_id));
            if let (Some(holdings), Some(transactions)) = (cached_holdings, cached_transactions) {
                let aggregates = self.cache.get(&aggregates_key(&self.user_id));
                return Ok(PortfolioView {
                    holdings,
                    transactions,
                    aggregates,
                });
            }
        }

        let holdings = self.holding_repository.get_holdings(&self.user_id)?;
        let transactions = self.ledger_repository.get_transactions(&self.user_id)?;

        let mut aggregates = self.portfolio.get_portfolio_aggregate()?;
        if aggregates.is_none() && !holdings.is_empty() {
            aggregates = Some(self.portfolio.refresh_portfolio()?);
        }

        self.cache.set(&holdings_key(&self.user_id), &holdings);
        self.cache.set(&transactions_key(&self.user_id), &transactions);
        if let Some(aggregate) = &aggregates {
            self.cache.set(&aggregates_key(&self.user_id), aggregate);
        }
        self.cache.mark_loaded(&self.user_id);

        Ok(PortfolioView {
            holdings,
            transactions,
            aggregates,
        })
    }

    /// Session teardown: the cache never outlives the user switch.
    pub fn sign_out(&self) {
        self.cache.invalidate(&self.user_id);
        info!("Closed portfolio session for user {}", self.user_id);
    }
}
