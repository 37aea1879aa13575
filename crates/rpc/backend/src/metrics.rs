//! Metrics of the backend.

use crate::BackendError;
use std::time::Instant;

/// Metrics recorded by the [`crate::Backend`].
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Number of CometBFT blocks translated into Ethereum blocks.
    pub const BLOCKS_TRANSLATED_TOTAL: &'static str = "cometh_backend_blocks_translated_total";
    /// Number of auxiliary lookups that fell back to a default, by lookup.
    pub const DEGRADED_LOOKUPS_TOTAL: &'static str = "cometh_backend_degraded_lookups_total";
    /// Number of blocks whose logs had to be renumbered.
    pub const LOGS_REINDEXED_TOTAL: &'static str = "cometh_backend_logs_reindexed_total";
    /// Number of transaction lookups served by `tx_search` instead of the indexer.
    pub const TX_SEARCH_FALLBACK_TOTAL: &'static str = "cometh_backend_tx_search_fallback_total";
    /// Number of `eth_feeHistory` computations, by result.
    pub const FEE_HISTORY_TOTAL: &'static str = "cometh_backend_fee_history_total";
    /// Latency of `eth_feeHistory` computations.
    pub const FEE_HISTORY_DURATION_SECONDS: &'static str =
        "cometh_backend_fee_history_duration_seconds";

    /// Describes and zeroes every backend metric.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::BLOCKS_TRANSLATED_TOTAL,
            metrics::Unit::Count,
            "Total number of CometBFT blocks translated into Ethereum blocks",
        );
        metrics::describe_counter!(
            Self::DEGRADED_LOOKUPS_TOTAL,
            metrics::Unit::Count,
            "Total number of auxiliary lookups that fell back to a default value",
        );
        metrics::describe_counter!(
            Self::LOGS_REINDEXED_TOTAL,
            metrics::Unit::Count,
            "Total number of blocks whose logs were renumbered",
        );
        metrics::describe_counter!(
            Self::TX_SEARCH_FALLBACK_TOTAL,
            metrics::Unit::Count,
            "Total number of transaction lookups served by tx_search",
        );
        metrics::describe_counter!(
            Self::FEE_HISTORY_TOTAL,
            metrics::Unit::Count,
            "Total number of fee history computations",
        );
        metrics::describe_histogram!(
            Self::FEE_HISTORY_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "Latency of fee history computations",
        );
    }

    fn zero() {
        metrics::counter!(Self::BLOCKS_TRANSLATED_TOTAL).increment(0);
        metrics::counter!(Self::LOGS_REINDEXED_TOTAL).increment(0);
        metrics::counter!(Self::TX_SEARCH_FALLBACK_TOTAL).increment(0);
        for lookup in ["base_fee", "miner", "gas_limit"] {
            metrics::counter!(Self::DEGRADED_LOOKUPS_TOTAL, "lookup" => lookup).increment(0);
        }
        for result in ["success", "error"] {
            metrics::counter!(Self::FEE_HISTORY_TOTAL, "result" => result).increment(0);
        }
        metrics::histogram!(Self::FEE_HISTORY_DURATION_SECONDS).record(0.0);
    }

    pub(crate) fn record_block_translated() {
        metrics::counter!(Self::BLOCKS_TRANSLATED_TOTAL).increment(1);
    }

    pub(crate) fn record_degraded_lookup(lookup: &'static str) {
        metrics::counter!(Self::DEGRADED_LOOKUPS_TOTAL, "lookup" => lookup).increment(1);
    }

    pub(crate) fn record_logs_reindexed() {
        metrics::counter!(Self::LOGS_REINDEXED_TOTAL).increment(1);
    }

    pub(crate) fn record_tx_search_fallback() {
        metrics::counter!(Self::TX_SEARCH_FALLBACK_TOTAL).increment(1);
    }

    pub(crate) fn record_fee_history<T>(started: Instant, result: &Result<T, BackendError>) {
        let label = if result.is_ok() { "success" } else { "error" };
        metrics::counter!(Self::FEE_HISTORY_TOTAL, "result" => label).increment(1);
        metrics::histogram!(Self::FEE_HISTORY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
    }
}
