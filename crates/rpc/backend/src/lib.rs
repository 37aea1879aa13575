#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod backend;
pub use backend::Backend;

mod blocks;
pub use blocks::{BlockTx, EthBlock};

mod config;
pub use config::{
    BackendConfig, ChainConfig, ConfigError, DEFAULT_BLOCK_RANGE_CAP, DEFAULT_EVM_CHAIN_ID,
    DEFAULT_FEE_HISTORY_CAP, DEFAULT_GAS_CAP, DEFAULT_LOGS_CAP,
};

mod errors;
pub use errors::{BackendError, ClientError};

mod fee_history;
pub use fee_history::{FeeMarketParams, OneFeeHistory, calc_base_fee};

mod format;
pub use format::new_rpc_transaction;

mod logs;
pub use logs::{BlockLogs, TxLogs};

mod metrics;
pub use metrics::Metrics;

mod trace;
pub use trace::{TraceBlockContext, TraceBlockRequest, TraceCallRequest, TraceConfig, TraceTxRequest};

mod traits;
pub use traits::{CometClient, QueryClient, TxDecoder, TxIndexer};
#[cfg(test)]
pub(crate) use traits::{MockCometClient, MockQueryClient};

mod tx_info;

#[cfg(test)]
pub(crate) mod test_utils;
