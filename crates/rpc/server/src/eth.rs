//! The `eth_` namespace.

use crate::{Metrics, rpc_error};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::{B256, U64, U256};
use alloy_rpc_types_eth::{FeeHistory, Filter, Index, Log};
use async_trait::async_trait;
use cometh_backend::Backend;
use cometh_primitives::{RpcBlock, RpcReceipt, RpcTransaction};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

/// Ethereum block, transaction, receipt, log and fee methods.
#[rpc(server, namespace = "eth")]
pub trait EthApi {
    /// Returns the latest block number.
    #[method(name = "blockNumber")]
    async fn block_number(&self) -> RpcResult<U64>;

    /// Returns the EVM chain id.
    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<U64>;

    /// Returns a block by number.
    #[method(name = "getBlockByNumber")]
    async fn block_by_number(
        &self,
        number: BlockNumberOrTag,
        full: bool,
    ) -> RpcResult<Option<RpcBlock>>;

    /// Returns a block by hash.
    #[method(name = "getBlockByHash")]
    async fn block_by_hash(&self, hash: B256, full: bool) -> RpcResult<Option<RpcBlock>>;

    /// Returns the number of transactions in a block by number.
    #[method(name = "getBlockTransactionCountByNumber")]
    async fn block_transaction_count_by_number(
        &self,
        number: BlockNumberOrTag,
    ) -> RpcResult<Option<U64>>;

    /// Returns the number of transactions in a block by hash.
    #[method(name = "getBlockTransactionCountByHash")]
    async fn block_transaction_count_by_hash(&self, hash: B256) -> RpcResult<Option<U64>>;

    /// Returns a transaction by hash.
    #[method(name = "getTransactionByHash")]
    async fn transaction_by_hash(&self, hash: B256) -> RpcResult<Option<RpcTransaction>>;

    /// Returns a transaction by block hash and index.
    #[method(name = "getTransactionByBlockHashAndIndex")]
    async fn transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: Index,
    ) -> RpcResult<Option<RpcTransaction>>;

    /// Returns a transaction by block number and index.
    #[method(name = "getTransactionByBlockNumberAndIndex")]
    async fn transaction_by_block_number_and_index(
        &self,
        number: BlockNumberOrTag,
        index: Index,
    ) -> RpcResult<Option<RpcTransaction>>;

    /// Returns the receipt of a transaction.
    #[method(name = "getTransactionReceipt")]
    async fn transaction_receipt(&self, hash: B256) -> RpcResult<Option<RpcReceipt>>;

    /// Returns the receipts of every transaction in a block.
    #[method(name = "getBlockReceipts")]
    async fn block_receipts(&self, block: BlockId) -> RpcResult<Option<Vec<RpcReceipt>>>;

    /// Returns the logs matching a filter.
    #[method(name = "getLogs")]
    async fn logs(&self, filter: Filter) -> RpcResult<Vec<Log>>;

    /// Returns the fee history of a range of blocks.
    #[method(name = "feeHistory")]
    async fn fee_history(
        &self,
        block_count: U64,
        newest_block: BlockNumberOrTag,
        reward_percentiles: Option<Vec<f64>>,
    ) -> RpcResult<FeeHistory>;

    /// Returns a suggested legacy gas price.
    #[method(name = "gasPrice")]
    async fn gas_price(&self) -> RpcResult<U256>;

    /// Returns a suggested priority fee.
    #[method(name = "maxPriorityFeePerGas")]
    async fn max_priority_fee_per_gas(&self) -> RpcResult<U256>;
}

/// Serves [`EthApiServer`] from a [`Backend`].
#[derive(Debug, Clone)]
pub struct EthRpc {
    backend: Backend,
}

impl EthRpc {
    /// Creates a new [`EthRpc`].
    pub const fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EthApiServer for EthRpc {
    async fn block_number(&self) -> RpcResult<U64> {
        Metrics::record_request("eth_blockNumber");
        self.backend.block_number().await.map(U64::from).map_err(rpc_error)
    }

    async fn chain_id(&self) -> RpcResult<U64> {
        Metrics::record_request("eth_chainId");
        Ok(U64::from(self.backend.chain_id()))
    }

    async fn block_by_number(
        &self,
        number: BlockNumberOrTag,
        full: bool,
    ) -> RpcResult<Option<RpcBlock>> {
        Metrics::record_request("eth_getBlockByNumber");
        self.backend.block_by_number(number, full).await.map_err(rpc_error)
    }

    async fn block_by_hash(&self, hash: B256, full: bool) -> RpcResult<Option<RpcBlock>> {
        Metrics::record_request("eth_getBlockByHash");
        self.backend.block_by_hash(hash, full).await.map_err(rpc_error)
    }

    async fn block_transaction_count_by_number(
        &self,
        number: BlockNumberOrTag,
    ) -> RpcResult<Option<U64>> {
        Metrics::record_request("eth_getBlockTransactionCountByNumber");
        let count = self.backend.block_transaction_count(number.into()).await.map_err(rpc_error)?;
        Ok(count.map(U64::from))
    }

    async fn block_transaction_count_by_hash(&self, hash: B256) -> RpcResult<Option<U64>> {
        Metrics::record_request("eth_getBlockTransactionCountByHash");
        let count = self.backend.block_transaction_count(hash.into()).await.map_err(rpc_error)?;
        Ok(count.map(U64::from))
    }

    async fn transaction_by_hash(&self, hash: B256) -> RpcResult<Option<RpcTransaction>> {
        Metrics::record_request("eth_getTransactionByHash");
        self.backend.transaction_by_hash(hash).await.map_err(rpc_error)
    }

    async fn transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: Index,
    ) -> RpcResult<Option<RpcTransaction>> {
        Metrics::record_request("eth_getTransactionByBlockHashAndIndex");
        self.backend
            .transaction_by_block_and_index(hash.into(), usize::from(index) as u64)
            .await
            .map_err(rpc_error)
    }

    async fn transaction_by_block_number_and_index(
        &self,
        number: BlockNumberOrTag,
        index: Index,
    ) -> RpcResult<Option<RpcTransaction>> {
        Metrics::record_request("eth_getTransactionByBlockNumberAndIndex");
        self.backend
            .transaction_by_block_and_index(number.into(), usize::from(index) as u64)
            .await
            .map_err(rpc_error)
    }

    async fn transaction_receipt(&self, hash: B256) -> RpcResult<Option<RpcReceipt>> {
        Metrics::record_request("eth_getTransactionReceipt");
        self.backend.transaction_receipt(hash).await.map_err(rpc_error)
    }

    async fn block_receipts(&self, block: BlockId) -> RpcResult<Option<Vec<RpcReceipt>>> {
        Metrics::record_request("eth_getBlockReceipts");
        self.backend.block_receipts(block).await.map_err(rpc_error)
    }

    async fn logs(&self, filter: Filter) -> RpcResult<Vec<Log>> {
        Metrics::record_request("eth_getLogs");
        self.backend.get_logs(&filter).await.map_err(rpc_error)
    }

    async fn fee_history(
        &self,
        block_count: U64,
        newest_block: BlockNumberOrTag,
        reward_percentiles: Option<Vec<f64>>,
    ) -> RpcResult<FeeHistory> {
        Metrics::record_request("eth_feeHistory");
        self.backend
            .fee_history(block_count.to::<u64>(), newest_block, reward_percentiles)
            .await
            .map_err(rpc_error)
    }

    async fn gas_price(&self) -> RpcResult<U256> {
        Metrics::record_request("eth_gasPrice");
        self.backend.gas_price().await.map_err(rpc_error)
    }

    async fn max_priority_fee_per_gas(&self) -> RpcResult<U256> {
        Metrics::record_request("eth_maxPriorityFeePerGas");
        self.backend.max_priority_fee_per_gas().await.map_err(rpc_error)
    }
}
