//! Ledger node API client for reading authoritative market state.
//!
//! The ledger is the source of truth for pool totals and resolution status
//! while a market is active. This client only reads; nothing in this
//! codebase ever writes to the ledger.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::cache::TtlCache;
use crate::Config;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Authoritative market state read from the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    pub yes_total: Decimal,
    pub no_total: Decimal,
    /// Raw lifecycle status code (see `MarketStatus::from_ledger_code`)
    pub status_code: i64,
    /// The ledger's copy of the outcome reference. Informational only:
    /// the local store's outcome_ref is authoritative and is never
    /// overwritten from this field.
    pub outcome_ref: Option<String>,
}

/// Trait for reading market state from the ledger.
/// Mockable for testing via mockall.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Fetch the global state of a deployed market by its application id.
    /// Returns Ok(None) when the id is unknown to the ledger.
    async fn fetch_market_state(&self, app_id: i64) -> Result<Option<LedgerRecord>, LedgerError>;
}

/// Raw market state from the ledger node API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerMarketDto {
    /// Pool totals in base currency units
    yes_total: u64,
    no_total: u64,
    status: i64,
    outcome_ref: Option<String>,
}

impl From<LedgerMarketDto> for LedgerRecord {
    fn from(dto: LedgerMarketDto) -> Self {
        Self {
            yes_total: Decimal::from(dto.yes_total),
            no_total: Decimal::from(dto.no_total),
            status_code: dto.status,
            outcome_ref: dto.outcome_ref,
        }
    }
}

/// Ledger node REST client.
pub struct HttpLedgerClient {
    client: Client,
    base_url: String,
}

impl HttpLedgerClient {
    /// Create a new ledger client with the configured per-request timeout.
    pub fn new(config: &Config) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ledger_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ledger_api_url.clone(),
        })
    }
}

#[async_trait]
impl LedgerReader for HttpLedgerClient {
    async fn fetch_market_state(&self, app_id: i64) -> Result<Option<LedgerRecord>, LedgerError> {
        let url = format!("{}/v2/markets/{}", self.base_url, app_id);

        debug!("Fetching ledger state for app_id={}", app_id);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status().as_u16() == 404 {
                debug!("App {} not found on ledger", app_id);
                return Ok(None);
            }
            return Err(LedgerError::ApiError(format!(
                "API returned status: {}",
                response.status()
            )));
        }

        let dto: LedgerMarketDto = response.json().await?;
        Ok(Some(dto.into()))
    }
}

/// TTL read-through cache over any ledger reader.
///
/// Not-found and error responses are never cached, so a market that appears
/// on the ledger becomes visible after at most one TTL window.
pub struct CachedLedgerReader<R> {
    inner: R,
    cache: Mutex<TtlCache<i64, LedgerRecord>>,
}

impl<R: LedgerReader> CachedLedgerReader<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Mutex::new(TtlCache::new(ttl)),
        }
    }

    /// Drop the cached entry for one market.
    pub fn bust(&self, app_id: i64) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.invalidate(&app_id);
        }
    }
}

#[async_trait]
impl<R: LedgerReader> LedgerReader for CachedLedgerReader<R> {
    async fn fetch_market_state(&self, app_id: i64) -> Result<Option<LedgerRecord>, LedgerError> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(record) = cache.get(&app_id) {
                debug!("Ledger cache hit for app_id={}", app_id);
                return Ok(Some(record));
            }
        }

        let fetched = self.inner.fetch_market_state(app_id).await?;

        if let Some(record) = &fetched {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(app_id, record.clone());
            }
        }

        Ok(fetched)
    }
}
