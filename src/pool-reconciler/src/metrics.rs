//! Metrics tracking for the pool reconciler.

use std::time::Instant;

use tracing::info;

use crate::reconcile::SyncReport;

/// Metrics tracker for reconciliation runs.
pub struct Metrics {
    start_time: Instant,
    /// Completed reconciliation runs
    runs: u32,
    /// Markets synced across all runs
    markets_synced: u32,
    /// Markets skipped (no ledger app id)
    markets_skipped: u32,
    /// Per-market failures
    markets_failed: u32,
    /// Fatal run-level errors (store unreachable)
    fatal_errors: u32,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            runs: 0,
            markets_synced: 0,
            markets_skipped: 0,
            markets_failed: 0,
            fatal_errors: 0,
        }
    }

    /// Record the outcome of a completed run.
    pub fn record_report(&mut self, report: &SyncReport) {
        self.runs += 1;
        self.markets_synced += report.synced as u32;
        self.markets_skipped += report.skipped as u32;
        self.markets_failed += report.failed as u32;
    }

    /// Record a run that failed before producing a report.
    pub fn record_fatal(&mut self) {
        self.fatal_errors += 1;
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Print metrics summary.
    pub fn print_summary(&self) {
        let elapsed = self.start_time.elapsed();

        info!("===============================================================");
        info!("              POOL RECONCILER METRICS                          ");
        info!("===============================================================");
        info!(
            "  Uptime:            {:>8.1} minutes",
            elapsed.as_secs_f64() / 60.0
        );
        info!("  Runs:              {:>8}", self.runs);
        info!("  Markets Synced:    {:>8}", self.markets_synced);
        info!("  Markets Skipped:   {:>8}", self.markets_skipped);
        info!("  Markets Failed:    {:>8}", self.markets_failed);
        info!("  Fatal Errors:      {:>8}", self.fatal_errors);
        info!("===============================================================");
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::SyncReport;

    #[test]
    fn test_record_report_accumulates() {
        let mut metrics = Metrics::new();
        let report = SyncReport {
            success: true,
            message: String::new(),
            synced: 3,
            skipped: 1,
            failed: 2,
            results: Vec::new(),
        };

        metrics.record_report(&report);
        metrics.record_report(&report);
        metrics.record_fatal();

        assert_eq!(metrics.runs(), 2);
        assert_eq!(metrics.markets_synced, 6);
        assert_eq!(metrics.markets_skipped, 2);
        assert_eq!(metrics.markets_failed, 4);
        assert_eq!(metrics.fatal_errors, 1);
    }
}
