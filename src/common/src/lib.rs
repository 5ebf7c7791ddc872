//! Common library for augurion Rust services.
//!
//! Provides shared functionality:
//! - Configuration loading from .env
//! - Database connection pooling
//! - Ledger API client (read-only)
//! - Pari-mutuel odds and payout math
//! - Shared data models

pub mod cache;
pub mod config;
pub mod db;
pub mod ledger;
pub mod models;
pub mod odds;
pub mod repository;

pub use cache::TtlCache;
pub use config::Config;
pub use db::Database;
pub use ledger::{CachedLedgerReader, HttpLedgerClient, LedgerReader, LedgerRecord};
pub use models::{Bet, BetSide, BetStatus, Market, MarketStatus, MarketTopic};
pub use odds::{payout_multiplier, pool_odds, potential_payout, PoolOdds};
pub use repository::{
    get_active_markets, get_bets_for_market, get_market_by_outcome_ref, insert_bet,
    settle_bets_for_market, update_pool_totals,
};
