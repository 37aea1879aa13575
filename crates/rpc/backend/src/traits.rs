//! Collaborators of the [`crate::Backend`].

use crate::{ClientError, FeeMarketParams, TraceBlockRequest, TraceCallRequest, TraceTxRequest};
use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use cometh_primitives::{
    BlockResults, CometBlock, ConsensusParams, CosmosTx, TxResult, TxSearchResult,
};
use std::fmt::Debug;

/// Read access to a CometBFT node.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CometClient: Debug + Send + Sync {
    /// Returns the height of the latest committed block.
    async fn latest_height(&self) -> Result<u64, ClientError>;

    /// Returns the block at `height`, or `None` if it does not exist.
    async fn block(&self, height: u64) -> Result<Option<CometBlock>, ClientError>;

    /// Returns the block with the given id hash, or `None` if it does not exist.
    async fn block_by_hash(&self, hash: B256) -> Result<Option<CometBlock>, ClientError>;

    /// Returns the execution results of the block at `height`.
    async fn block_results(&self, height: u64) -> Result<BlockResults, ClientError>;

    /// Returns the consensus parameters in effect at `height`.
    async fn consensus_params(&self, height: u64) -> Result<ConsensusParams, ClientError>;

    /// Runs a `tx_search` query and returns the matching transactions.
    async fn tx_search(&self, query: String) -> Result<Vec<TxSearchResult>, ClientError>;
}

/// Access to the application state queries and the EVM execution engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryClient: Debug + Send + Sync {
    /// Returns the base fee at `height`, or `None` when the fee market is disabled.
    async fn base_fee(&self, height: u64) -> Result<Option<U256>, ClientError>;

    /// Returns the fee market parameters at `height`.
    async fn fee_market_params(&self, height: u64) -> Result<FeeMarketParams, ClientError>;

    /// Returns the operator account of the validator with the given consensus address.
    async fn validator_account(
        &self,
        height: u64,
        consensus_address: Bytes,
    ) -> Result<Address, ClientError>;

    /// Traces a transaction and returns the tracer output.
    async fn trace_tx(&self, request: TraceTxRequest) -> Result<serde_json::Value, ClientError>;

    /// Traces every transaction of a block and returns the tracer outputs.
    async fn trace_block(
        &self,
        request: TraceBlockRequest,
    ) -> Result<serde_json::Value, ClientError>;

    /// Traces a call on top of a block and returns the tracer output.
    async fn trace_call(&self, request: TraceCallRequest)
    -> Result<serde_json::Value, ClientError>;
}

/// Decodes raw Cosmos transactions.
#[cfg_attr(test, mockall::automock)]
pub trait TxDecoder: Debug + Send + Sync {
    /// Decodes a raw transaction.
    fn decode(&self, raw: &[u8]) -> Result<CosmosTx, ClientError>;
}

/// A local index of Ethereum transactions.
#[cfg_attr(test, mockall::automock)]
pub trait TxIndexer: Debug + Send + Sync {
    /// Returns the record of the Ethereum transaction with the given hash.
    fn get_by_tx_hash(&self, hash: B256) -> Result<Option<TxResult>, ClientError>;

    /// Returns the record of the Ethereum transaction at `index` of the block at `height`.
    fn get_by_block_and_index(
        &self,
        height: u64,
        index: u32,
    ) -> Result<Option<TxResult>, ClientError>;
}
