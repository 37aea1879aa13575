//! Metrics of the RPC server.

/// Metrics recorded by the RPC servers.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Number of requests served, by method.
    pub const RPC_REQUESTS_TOTAL: &'static str = "cometh_rpc_requests_total";

    /// Methods served by the RPC servers.
    pub const METHODS: &'static [&'static str] = &[
        "eth_blockNumber",
        "eth_chainId",
        "eth_getBlockByNumber",
        "eth_getBlockByHash",
        "eth_getBlockTransactionCountByNumber",
        "eth_getBlockTransactionCountByHash",
        "eth_getTransactionByHash",
        "eth_getTransactionByBlockHashAndIndex",
        "eth_getTransactionByBlockNumberAndIndex",
        "eth_getTransactionReceipt",
        "eth_getBlockReceipts",
        "eth_getLogs",
        "eth_feeHistory",
        "eth_gasPrice",
        "eth_maxPriorityFeePerGas",
        "debug_traceTransaction",
        "debug_traceBlockByNumber",
        "debug_traceBlockByHash",
        "debug_traceBlock",
        "debug_traceCall",
        "debug_getRawBlock",
        "txpool_content",
        "txpool_contentFrom",
        "txpool_inspect",
        "txpool_status",
    ];

    /// Describes and zeroes the server and backend metrics.
    pub fn init() {
        cometh_backend::Metrics::init();
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::RPC_REQUESTS_TOTAL,
            metrics::Unit::Count,
            "Total number of JSON-RPC requests served, by method",
        );
    }

    fn zero() {
        for method in Self::METHODS {
            metrics::counter!(Self::RPC_REQUESTS_TOTAL, "method" => *method).increment(0);
        }
    }

    pub(crate) fn record_request(method: &'static str) {
        metrics::counter!(Self::RPC_REQUESTS_TOTAL, "method" => method).increment(1);
    }
}
