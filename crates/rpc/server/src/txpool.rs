//! The `txpool_` namespace.
//!
//! Pending transactions live in the CometBFT mempool, which the EVM does not expose, so every
//! pool is empty.

use crate::Metrics;
use alloy_primitives::{Address, U64};
use async_trait::async_trait;
use cometh_primitives::RpcTransaction;
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transactions of one account, keyed by nonce.
pub type NonceMap<T> = BTreeMap<String, T>;

/// Pool transactions of every account.
pub type AccountMap<T> = BTreeMap<Address, NonceMap<T>>;

/// Response of `txpool_content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPoolContent {
    /// Executable transactions.
    pub pending: AccountMap<RpcTransaction>,
    /// Transactions waiting for a nonce gap to close.
    pub queued: AccountMap<RpcTransaction>,
}

/// Response of `txpool_contentFrom`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPoolContentFrom {
    /// Executable transactions.
    pub pending: NonceMap<RpcTransaction>,
    /// Transactions waiting for a nonce gap to close.
    pub queued: NonceMap<RpcTransaction>,
}

/// Response of `txpool_inspect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPoolInspect {
    /// Summaries of executable transactions.
    pub pending: AccountMap<String>,
    /// Summaries of queued transactions.
    pub queued: AccountMap<String>,
}

/// Response of `txpool_status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPoolStatus {
    /// Number of executable transactions.
    pub pending: U64,
    /// Number of queued transactions.
    pub queued: U64,
}

/// Transaction pool inspection methods.
#[rpc(server, namespace = "txpool")]
pub trait TxPoolApi {
    /// Returns the pool transactions.
    #[method(name = "content")]
    async fn content(&self) -> RpcResult<TxPoolContent>;

    /// Returns the pool transactions of one account.
    #[method(name = "contentFrom")]
    async fn content_from(&self, address: Address) -> RpcResult<TxPoolContentFrom>;

    /// Returns summaries of the pool transactions.
    #[method(name = "inspect")]
    async fn inspect(&self) -> RpcResult<TxPoolInspect>;

    /// Returns the number of pool transactions.
    #[method(name = "status")]
    async fn status(&self) -> RpcResult<TxPoolStatus>;
}

/// Serves [`TxPoolApiServer`] with empty pools.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxPoolRpc;

#[async_trait]
impl TxPoolApiServer for TxPoolRpc {
    async fn content(&self) -> RpcResult<TxPoolContent> {
        Metrics::record_request("txpool_content");
        Ok(TxPoolContent::default())
    }

    async fn content_from(&self, address: Address) -> RpcResult<TxPoolContentFrom> {
        Metrics::record_request("txpool_contentFrom");
        trace!(target: "cometh::rpc", %address, "txpool_contentFrom");
        Ok(TxPoolContentFrom::default())
    }

    async fn inspect(&self) -> RpcResult<TxPoolInspect> {
        Metrics::record_request("txpool_inspect");
        Ok(TxPoolInspect::default())
    }

    async fn status(&self) -> RpcResult<TxPoolStatus> {
        Metrics::record_request("txpool_status");
        Ok(TxPoolStatus::default())
    }
}
