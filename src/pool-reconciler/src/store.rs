//! Local market store access for the reconciler.
//!
//! The reconciler only needs two operations against the store: read the
//! active markets and overwrite one market's cached pool state. Each write
//! targets a disjoint record, so no coordination between markets is needed.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use common::models::{Market, MarketStatus};
use common::{repository, Database};

/// Trait for the reconciler's view of the local store.
/// Mockable for testing via mockall.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Load all locally tracked active markets.
    async fn load_active_markets(&self) -> Result<Vec<Market>>;

    /// Overwrite one market's cached pool totals, mirrored status, and
    /// last-synced timestamp. Must never touch outcome_ref.
    async fn save_pool_totals(
        &self,
        market_id: Uuid,
        yes_total: Decimal,
        no_total: Decimal,
        status: MarketStatus,
    ) -> Result<()>;
}

/// PostgreSQL-backed market store.
pub struct PgMarketStore {
    db: Database,
}

impl PgMarketStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MarketStore for PgMarketStore {
    async fn load_active_markets(&self) -> Result<Vec<Market>> {
        let markets = repository::get_active_markets(self.db.pool()).await?;
        Ok(markets)
    }

    async fn save_pool_totals(
        &self,
        market_id: Uuid,
        yes_total: Decimal,
        no_total: Decimal,
        status: MarketStatus,
    ) -> Result<()> {
        repository::update_pool_totals(self.db.pool(), market_id, yes_total, no_total, status)
            .await?;
        Ok(())
    }
}
