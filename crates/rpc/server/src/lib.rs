#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod config;
pub use config::RpcConfig;

mod debug;
pub use debug::{DebugApiServer, DebugRpc};

mod errors;
pub use errors::rpc_error;

mod eth;
pub use eth::{EthApiServer, EthRpc};

mod metrics;
pub use metrics::Metrics;

mod txpool;
pub use txpool::{
    AccountMap, NonceMap, TxPoolApiServer, TxPoolContent, TxPoolContentFrom, TxPoolInspect,
    TxPoolRpc, TxPoolStatus,
};

#[cfg(test)]
pub(crate) mod test_utils;
