//! Market state reconciliation against the ledger.
//!
//! For each locally tracked active market, fetch the authoritative pool
//! totals and status from the ledger and overwrite the local cache. One bad
//! market never aborts the batch: every per-market failure is swallowed
//! into the result list. The only fatal error is failing to read the store
//! before the loop starts.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use common::ledger::LedgerReader;
use common::models::{Market, MarketStatus};

use crate::store::MarketStore;

/// Outcome of syncing a single market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    Skipped,
    Failed,
}

/// Per-market sync result, ordered as the markets were loaded.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSyncResult {
    pub id: Uuid,
    #[serde(rename = "outcomeRef")]
    pub outcome_ref: String,
    #[serde(rename = "appId")]
    pub app_id: Option<i64>,
    pub status: SyncStatus,
    pub success: bool,
    /// Why the market was skipped (expected condition, not an error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Why the sync failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MarketSyncResult {
    fn synced(market: &Market) -> Self {
        Self {
            id: market.id,
            outcome_ref: market.outcome_ref.clone(),
            app_id: market.app_id,
            status: SyncStatus::Synced,
            success: true,
            reason: None,
            error: None,
        }
    }

    fn skipped(market: &Market, reason: String) -> Self {
        Self {
            id: market.id,
            outcome_ref: market.outcome_ref.clone(),
            app_id: market.app_id,
            status: SyncStatus::Skipped,
            success: true,
            reason: Some(reason),
            error: None,
        }
    }

    fn failed(market: &Market, error: String) -> Self {
        Self {
            id: market.id,
            outcome_ref: market.outcome_ref.clone(),
            app_id: market.app_id,
            status: SyncStatus::Failed,
            success: false,
            reason: None,
            error: Some(error),
        }
    }
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub success: bool,
    pub message: String,
    pub synced: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<MarketSyncResult>,
}

impl SyncReport {
    fn new(results: Vec<MarketSyncResult>) -> Self {
        let synced = results
            .iter()
            .filter(|r| r.status == SyncStatus::Synced)
            .count();
        let skipped = results
            .iter()
            .filter(|r| r.status == SyncStatus::Skipped)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == SyncStatus::Failed)
            .count();

        let message = format!(
            "Synced {} of {} markets ({} skipped, {} failed)",
            synced,
            results.len(),
            skipped,
            failed
        );

        Self {
            success: true,
            message,
            synced,
            skipped,
            failed,
            results,
        }
    }
}

/// Run one reconciliation pass over all active markets.
///
/// Markets are processed sequentially in load order. Re-running with an
/// unchanged ledger overwrites the cache with the same values, so the
/// operation is idempotent. Only a store read failure before the loop is
/// fatal; everything else lands in the per-market results.
pub async fn sync_markets<S, L>(store: &S, ledger: &L) -> Result<SyncReport>
where
    S: MarketStore + ?Sized,
    L: LedgerReader + ?Sized,
{
    let markets = store.load_active_markets().await?;
    info!("Reconciling {} active markets", markets.len());

    let mut results = Vec::with_capacity(markets.len());

    for market in &markets {
        results.push(sync_one(store, ledger, market).await);
    }

    let report = SyncReport::new(results);
    info!("{}", report.message);
    Ok(report)
}

async fn sync_one<S, L>(store: &S, ledger: &L, market: &Market) -> MarketSyncResult
where
    S: MarketStore + ?Sized,
    L: LedgerReader + ?Sized,
{
    // Markets not yet deployed to the ledger carry no usable app id. This
    // is an expected state, not an error.
    let app_id = match market.app_id {
        Some(id) if id > 0 => id,
        _ => {
            debug!(
                "Skipping {}: no ledger app id assigned",
                market.outcome_ref
            );
            return MarketSyncResult::skipped(
                market,
                "no ledger app id assigned".to_string(),
            );
        }
    };

    let record = match ledger.fetch_market_state(app_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!("Market {} (app {}) not found on ledger", market.outcome_ref, app_id);
            return MarketSyncResult::failed(market, "not found on ledger".to_string());
        }
        Err(e) => {
            warn!("Ledger fetch failed for {} (app {}): {}", market.outcome_ref, app_id, e);
            return MarketSyncResult::failed(market, format!("ledger fetch failed: {e}"));
        }
    };

    let status = match MarketStatus::from_ledger_code(record.status_code) {
        Some(status) => status,
        None => {
            warn!(
                "Market {} (app {}): unknown ledger status code {}",
                market.outcome_ref, app_id, record.status_code
            );
            return MarketSyncResult::failed(
                market,
                format!("unknown ledger status code {}", record.status_code),
            );
        }
    };

    // The ledger also reports its copy of the outcome reference, but the
    // local one is authoritative: it is the join key that survives
    // redeployment under a new app id, so it is never written here.
    match store
        .save_pool_totals(market.id, record.yes_total, record.no_total, status)
        .await
    {
        Ok(()) => {
            debug!(
                "Synced {}: yes={} no={} status={}",
                market.outcome_ref,
                record.yes_total,
                record.no_total,
                status.as_str()
            );
            MarketSyncResult::synced(market)
        }
        Err(e) => {
            warn!("Store write failed for {}: {}", market.outcome_ref, e);
            MarketSyncResult::failed(market, format!("store write failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockMarketStore;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sqlx::types::Json;

    use common::ledger::{LedgerError, LedgerRecord};
    use common::models::MarketTopic;

    fn make_market(outcome_ref: &str, app_id: Option<i64>) -> Market {
        Market {
            id: Uuid::new_v4(),
            outcome_ref: outcome_ref.to_string(),
            question: format!("Will {outcome_ref} resolve yes?"),
            topic: Json(MarketTopic::Label("Test".to_string())),
            app_id,
            yes_total: Decimal::ZERO,
            no_total: Decimal::ZERO,
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_synced_at: None,
        }
    }

    fn make_record(yes: Decimal, no: Decimal) -> LedgerRecord {
        LedgerRecord {
            yes_total: yes,
            no_total: no,
            status_code: 1,
            outcome_ref: Some("ledger-copy-of-ref".to_string()),
        }
    }

    /// In-memory ledger: Some = record, None entry = fetch error,
    /// missing key = not found.
    struct FakeLedger {
        records: HashMap<i64, Option<LedgerRecord>>,
        calls: Mutex<Vec<i64>>,
    }

    impl FakeLedger {
        fn new(records: HashMap<i64, Option<LedgerRecord>>) -> Self {
            Self {
                records,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LedgerReader for FakeLedger {
        async fn fetch_market_state(
            &self,
            app_id: i64,
        ) -> Result<Option<LedgerRecord>, LedgerError> {
            self.calls.lock().unwrap().push(app_id);
            match self.records.get(&app_id) {
                Some(Some(record)) => Ok(Some(record.clone())),
                Some(None) => Err(LedgerError::ApiError("node unreachable".to_string())),
                None => Ok(None),
            }
        }
    }

    /// In-memory store that applies writes, for idempotence checks.
    struct FakeStore {
        markets: Mutex<Vec<Market>>,
        fail_save_for: Option<Uuid>,
    }

    impl FakeStore {
        fn new(markets: Vec<Market>) -> Self {
            Self {
                markets: Mutex::new(markets),
                fail_save_for: None,
            }
        }

        fn snapshot(&self) -> Vec<(String, Decimal, Decimal, String)> {
            self.markets
                .lock()
                .unwrap()
                .iter()
                .map(|m| {
                    (
                        m.outcome_ref.clone(),
                        m.yes_total,
                        m.no_total,
                        m.status.clone(),
                    )
                })
                .collect()
        }
    }

    #[async_trait]
    impl MarketStore for FakeStore {
        async fn load_active_markets(&self) -> Result<Vec<Market>> {
            Ok(self.markets.lock().unwrap().clone())
        }

        async fn save_pool_totals(
            &self,
            market_id: Uuid,
            yes_total: Decimal,
            no_total: Decimal,
            status: MarketStatus,
        ) -> Result<()> {
            if self.fail_save_for == Some(market_id) {
                return Err(anyhow!("connection reset"));
            }
            let mut markets = self.markets.lock().unwrap();
            let market = markets
                .iter_mut()
                .find(|m| m.id == market_id)
                .ok_or_else(|| anyhow!("no such market"))?;
            market.yes_total = yes_total;
            market.no_total = no_total;
            market.status = status.as_str().to_string();
            market.last_synced_at = Some(Utc::now());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_placeholder_markets_are_skipped_without_fetch() {
        let markets = vec![
            make_market("undeployed-a", None),
            make_market("undeployed-b", Some(0)),
            make_market("undeployed-c", Some(-3)),
        ];
        let store = FakeStore::new(markets);
        let ledger = FakeLedger::new(HashMap::new());

        let report = sync_markets(&store, &ledger).await.unwrap();

        assert_eq!(report.skipped, 3);
        assert_eq!(report.synced, 0);
        assert_eq!(report.failed, 0);
        assert!(report.results.iter().all(|r| r.success));
        // Placeholder ids must never be attempted against the ledger
        assert_eq!(ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_per_market_isolation() {
        let markets = vec![
            make_market("good-1", Some(101)),
            make_market("broken", Some(102)),
            make_market("good-2", Some(103)),
        ];
        let store = FakeStore::new(markets);
        let mut records = HashMap::new();
        records.insert(101, Some(make_record(dec!(30), dec!(70))));
        records.insert(102, None); // fetch error
        records.insert(103, Some(make_record(dec!(10), dec!(90))));
        let ledger = FakeLedger::new(records);

        let report = sync_markets(&store, &ledger).await.unwrap();

        assert!(report.success);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.synced, 2);
        assert_eq!(report.failed, 1);

        // Result order follows load order
        assert_eq!(report.results[0].status, SyncStatus::Synced);
        assert_eq!(report.results[1].status, SyncStatus::Failed);
        assert_eq!(report.results[2].status, SyncStatus::Synced);
        assert!(report.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("node unreachable"));
    }

    #[tokio::test]
    async fn test_not_found_on_ledger_is_a_failure() {
        let store = FakeStore::new(vec![make_market("gone", Some(55))]);
        let ledger = FakeLedger::new(HashMap::new());

        let report = sync_markets(&store, &ledger).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(
            report.results[0].error.as_deref(),
            Some("not found on ledger")
        );
    }

    #[tokio::test]
    async fn test_unknown_status_code_is_a_failure() {
        let store = FakeStore::new(vec![make_market("odd-status", Some(9))]);
        let mut records = HashMap::new();
        records.insert(
            9,
            Some(LedgerRecord {
                yes_total: dec!(1),
                no_total: dec!(1),
                status_code: 42,
                outcome_ref: None,
            }),
        );
        let ledger = FakeLedger::new(records);

        let report = sync_markets(&store, &ledger).await.unwrap();

        assert_eq!(report.failed, 1);
        assert!(report.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("unknown ledger status code 42"));
    }

    #[tokio::test]
    async fn test_store_write_failure_does_not_abort_batch() {
        let markets = vec![
            make_market("writable", Some(201)),
            make_market("unwritable", Some(202)),
        ];
        let unwritable_id = markets[1].id;
        let mut store = FakeStore::new(markets);
        store.fail_save_for = Some(unwritable_id);

        let mut records = HashMap::new();
        records.insert(201, Some(make_record(dec!(5), dec!(5))));
        records.insert(202, Some(make_record(dec!(5), dec!(5))));
        let ledger = FakeLedger::new(records);

        let report = sync_markets(&store, &ledger).await.unwrap();

        assert_eq!(report.synced, 1);
        assert_eq!(report.failed, 1);
        assert!(report.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("store write failed"));
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let markets = vec![
            make_market("stable-1", Some(301)),
            make_market("stable-2", Some(302)),
        ];
        let store = FakeStore::new(markets);
        let mut records = HashMap::new();
        records.insert(301, Some(make_record(dec!(40), dec!(60))));
        records.insert(302, Some(make_record(dec!(25), dec!(75))));
        let ledger = FakeLedger::new(records);

        let first = sync_markets(&store, &ledger).await.unwrap();
        let after_first = store.snapshot();

        let second = sync_markets(&store, &ledger).await.unwrap();
        let after_second = store.snapshot();

        assert_eq!(first.synced, 2);
        assert_eq!(second.synced, 2);
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_outcome_ref_never_overwritten() {
        let store = FakeStore::new(vec![make_market("local-authority-ref", Some(401))]);
        let mut records = HashMap::new();
        // Ledger reports a different outcome_ref
        records.insert(401, Some(make_record(dec!(1), dec!(2))));
        let ledger = FakeLedger::new(records);

        sync_markets(&store, &ledger).await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].0, "local-authority-ref");
        assert_eq!(snapshot[0].1, dec!(1));
        assert_eq!(snapshot[0].2, dec!(2));
    }

    #[tokio::test]
    async fn test_store_load_failure_is_fatal() {
        let mut store = MockMarketStore::new();
        store
            .expect_load_active_markets()
            .times(1)
            .returning(|| Err(anyhow!("database unreachable")));
        let ledger = FakeLedger::new(HashMap::new());

        let result = sync_markets(&store, &ledger).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_market_list_yields_empty_report() {
        let store = FakeStore::new(Vec::new());
        let ledger = FakeLedger::new(HashMap::new());

        let report = sync_markets(&store, &ledger).await.unwrap();

        assert!(report.success);
        assert!(report.results.is_empty());
        assert_eq!(report.message, "Synced 0 of 0 markets (0 skipped, 0 failed)");
    }

    #[test]
    fn test_report_serializes_expected_shape() {
        let market = make_market("shape-check", Some(7));
        let report = SyncReport::new(vec![
            MarketSyncResult::synced(&market),
            MarketSyncResult::skipped(&market, "no ledger app id assigned".to_string()),
        ]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["results"][0]["appId"], 7);
        assert_eq!(json["results"][0]["status"], "synced");
        assert!(json["results"][0].get("error").is_none());
        assert_eq!(json["results"][1]["reason"], "no ledger app id assigned");
    }
}
