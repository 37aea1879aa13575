//! The `debug_` namespace.

use crate::{Metrics, rpc_error};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::{B256, Bytes};
use alloy_rpc_types_eth::TransactionRequest;
use async_trait::async_trait;
use cometh_backend::{Backend, TraceConfig};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

/// Tracing and raw block methods.
#[rpc(server, namespace = "debug")]
pub trait DebugApi {
    /// Traces a transaction.
    #[method(name = "traceTransaction")]
    async fn trace_transaction(
        &self,
        hash: B256,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value>;

    /// Traces every transaction of a block by number.
    #[method(name = "traceBlockByNumber")]
    async fn trace_block_by_number(
        &self,
        number: BlockNumberOrTag,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value>;

    /// Traces every transaction of a block by hash.
    #[method(name = "traceBlockByHash")]
    async fn trace_block_by_hash(
        &self,
        hash: B256,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value>;

    /// Traces every transaction of an RLP encoded block.
    #[method(name = "traceBlock")]
    async fn trace_block(
        &self,
        rlp: Bytes,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value>;

    /// Traces a call on top of a block.
    #[method(name = "traceCall")]
    async fn trace_call(
        &self,
        call: TransactionRequest,
        block: BlockId,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value>;

    /// Returns the RLP encoding of a block.
    #[method(name = "getRawBlock")]
    async fn raw_block(&self, block: BlockId) -> RpcResult<Option<Bytes>>;
}

/// Serves [`DebugApiServer`] from a [`Backend`].
#[derive(Debug, Clone)]
pub struct DebugRpc {
    backend: Backend,
}

impl DebugRpc {
    /// Creates a new [`DebugRpc`].
    pub const fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl DebugApiServer for DebugRpc {
    async fn trace_transaction(
        &self,
        hash: B256,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value> {
        Metrics::record_request("debug_traceTransaction");
        self.backend.trace_transaction(hash, config.unwrap_or_default()).await.map_err(rpc_error)
    }

    async fn trace_block_by_number(
        &self,
        number: BlockNumberOrTag,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value> {
        Metrics::record_request("debug_traceBlockByNumber");
        self.backend
            .trace_block_by_number(number, config.unwrap_or_default())
            .await
            .map_err(rpc_error)
    }

    async fn trace_block_by_hash(
        &self,
        hash: B256,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value> {
        Metrics::record_request("debug_traceBlockByHash");
        self.backend.trace_block_by_hash(hash, config.unwrap_or_default()).await.map_err(rpc_error)
    }

    async fn trace_block(
        &self,
        rlp: Bytes,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value> {
        Metrics::record_request("debug_traceBlock");
        self.backend.trace_block(rlp, config.unwrap_or_default()).await.map_err(rpc_error)
    }

    async fn trace_call(
        &self,
        call: TransactionRequest,
        block: BlockId,
        config: Option<TraceConfig>,
    ) -> RpcResult<serde_json::Value> {
        Metrics::record_request("debug_traceCall");
        self.backend.trace_call(call, block, config.unwrap_or_default()).await.map_err(rpc_error)
    }

    async fn raw_block(&self, block: BlockId) -> RpcResult<Option<Bytes>> {
        Metrics::record_request("debug_getRawBlock");
        self.backend.raw_block(block).await.map_err(rpc_error)
    }
}
