//! Preparation of `debug_trace*` requests for the execution engine.

use crate::{Backend, BackendError};
use alloy_consensus::{Block, TxEnvelope};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::{B256, Bytes};
use alloy_rlp::Decodable;
use alloy_rpc_types_eth::TransactionRequest;
use cometh_primitives::{CometBlock, MsgEthereumTx};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tracer options, forwarded to the execution engine untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraceConfig {
    /// Name of the tracer, the struct logger when unset.
    pub tracer: Option<String>,
    /// Tracer timeout, as a duration string.
    pub timeout: Option<String>,
    /// Number of blocks the tracer may re-execute.
    pub reexec: Option<u64>,
    /// Disables stack capture.
    pub disable_stack: bool,
    /// Disables storage capture.
    pub disable_storage: bool,
    /// Enables memory capture.
    pub enable_memory: bool,
    /// Enables return data capture.
    pub enable_return_data: bool,
    /// Tracer specific configuration.
    pub tracer_config: Option<serde_json::Value>,
}

/// The block a trace executes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceBlockContext {
    /// Height of the block.
    pub height: u64,
    /// Hash of the block.
    pub hash: B256,
    /// Block time in unix seconds.
    pub time: u64,
    /// Consensus address of the proposer.
    pub proposer: Bytes,
    /// Block gas limit.
    pub max_gas: u64,
    /// The EVM chain id.
    pub chain_id: u64,
    /// Height of the state the trace starts from, the parent of the block.
    pub state_height: u64,
    /// Execution timeout.
    pub timeout: Duration,
}

/// A request to trace one transaction after replaying its predecessors in the block.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceTxRequest {
    /// The traced transaction.
    pub tx: MsgEthereumTx,
    /// Transactions executed before it in the same block.
    pub predecessors: Vec<MsgEthereumTx>,
    /// Tracer options.
    pub config: TraceConfig,
    /// The block context.
    pub context: TraceBlockContext,
}

/// A request to trace every transaction of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceBlockRequest {
    /// The transactions in block order.
    pub txs: Vec<MsgEthereumTx>,
    /// Tracer options.
    pub config: TraceConfig,
    /// The block context.
    pub context: TraceBlockContext,
}

/// A request to trace a call on top of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceCallRequest {
    /// The call.
    pub call: TransactionRequest,
    /// Gas cap of the call.
    pub gas_cap: u64,
    /// Tracer options.
    pub config: TraceConfig,
    /// The block context.
    pub context: TraceBlockContext,
}

impl Backend {
    async fn trace_context(&self, block: &CometBlock) -> Result<TraceBlockContext, BackendError> {
        let height = block.height();
        let params = self.comet.consensus_params(height).await?;
        Ok(TraceBlockContext {
            height,
            hash: block.hash,
            time: block.header.time,
            proposer: block.header.proposer_address.clone(),
            max_gas: params.block_max_gas(),
            chain_id: self.chain_id(),
            // Replay runs on the parent state. Block 1 has no servable parent, so it replays
            // on its own state.
            state_height: height.saturating_sub(1).max(1),
            timeout: self.config.evm_timeout(),
        })
    }

    /// Traces a transaction, replaying the transactions before it in its block.
    pub async fn trace_transaction(
        &self,
        hash: B256,
        config: TraceConfig,
    ) -> Result<serde_json::Value, BackendError> {
        let Some(record) = self.tx_record_by_hash(hash).await? else {
            return Err(BackendError::TxNotFound(hash));
        };
        let Some(located) = self.locate(record, hash).await? else {
            return Err(BackendError::TxNotFound(hash));
        };
        if located.block.height() == 0 {
            return Err(BackendError::GenesisNotTraceable);
        }

        let mut txs = self.block_txs(&located.block, &located.results);
        let Some(position) = txs.iter().position(|tx| tx.hash() == hash) else {
            return Err(BackendError::TxNotFound(hash));
        };
        txs.truncate(position + 1);
        let Some(target) = txs.pop() else {
            return Err(BackendError::TxNotFound(hash));
        };

        let request = TraceTxRequest {
            tx: target.msg,
            predecessors: txs.into_iter().map(|tx| tx.msg).collect(),
            config,
            context: self.trace_context(&located.block).await?,
        };
        debug!(
            target: "cometh::trace",
            %hash,
            height = located.block.height(),
            predecessors = request.predecessors.len(),
            "tracing transaction"
        );
        Ok(self.query.trace_tx(request).await?)
    }

    /// Traces every transaction of the block with the given tag.
    pub async fn trace_block_by_number(
        &self,
        tag: BlockNumberOrTag,
        config: TraceConfig,
    ) -> Result<serde_json::Value, BackendError> {
        let height = self.resolve_height(tag).await?;
        if height == 0 {
            return Err(BackendError::GenesisNotTraceable);
        }
        let Some(block) = self.comet.block(height).await? else {
            return Err(BackendError::BlockNotFound(height.to_string()));
        };
        self.trace_comet_block(&block, config).await
    }

    /// Traces every transaction of the block with the given hash.
    pub async fn trace_block_by_hash(
        &self,
        hash: B256,
        config: TraceConfig,
    ) -> Result<serde_json::Value, BackendError> {
        let Some(block) = self.comet.block_by_hash(hash).await? else {
            return Err(BackendError::BlockNotFound(hash.to_string()));
        };
        if block.height() == 0 {
            return Err(BackendError::GenesisNotTraceable);
        }
        self.trace_comet_block(&block, config).await
    }

    /// Traces the block identified by the number of an RLP encoded block.
    pub async fn trace_block(
        &self,
        rlp: Bytes,
        config: TraceConfig,
    ) -> Result<serde_json::Value, BackendError> {
        let block = Block::<TxEnvelope>::decode(&mut rlp.as_ref())?;
        self.trace_block_by_number(BlockNumberOrTag::Number(block.header.number), config).await
    }

    async fn trace_comet_block(
        &self,
        block: &CometBlock,
        config: TraceConfig,
    ) -> Result<serde_json::Value, BackendError> {
        let results = self.comet.block_results(block.height()).await?;
        let txs: Vec<_> =
            self.block_txs(block, &results).into_iter().map(|tx| tx.msg).collect();
        if txs.is_empty() {
            return Ok(serde_json::Value::Array(Vec::new()));
        }

        let request = TraceBlockRequest { txs, config, context: self.trace_context(block).await? };
        debug!(target: "cometh::trace", height = block.height(), txs = request.txs.len(), "tracing block");
        Ok(self.query.trace_block(request).await?)
    }

    /// Traces a call on top of a block.
    pub async fn trace_call(
        &self,
        call: TransactionRequest,
        id: BlockId,
        config: TraceConfig,
    ) -> Result<serde_json::Value, BackendError> {
        let Some(block) = self.comet_block_by_id(id).await? else {
            return Err(BackendError::BlockNotFound(id.to_string()));
        };
        let request = TraceCallRequest {
            call,
            gas_cap: self.config.gas_cap,
            config,
            context: self.trace_context(&block).await?,
        };
        Ok(self.query.trace_call(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ChainFixture, FixtureTx, signed_eip1559};
    use alloy_primitives::{Address, address};
    use serde_json::json;

    const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");

    #[tokio::test]
    async fn test_trace_transaction_replays_predecessors() {
        let a = signed_eip1559(ALICE, 0, 10, 1);
        let b = signed_eip1559(ALICE, 1, 10, 1);
        let c = signed_eip1559(ALICE, 2, 10, 1);
        let mut chain = ChainFixture::new();
        chain.push_block(vec![]);
        chain.push_block(vec![
            FixtureTx::ethereum(vec![a.clone()], 0, 21_000, vec![]),
            FixtureTx::synthetic(B256::with_last_byte(0x51), 1, 30_000),
            FixtureTx::ethereum(vec![b.clone(), c], 2, 21_000, vec![]),
        ]);
        let target = b.clone();
        let backend = chain.build_with(move |_, query| {
            query
                .expect_trace_tx()
                .withf(move |request| {
                    request.tx == target &&
                        request.predecessors.len() == 2 &&
                        request.predecessors[0] == a &&
                        request.predecessors[1].hash() == B256::with_last_byte(0x51) &&
                        request.context.height == 2 &&
                        request.context.state_height == 1 &&
                        request.context.max_gas == ChainFixture::BLOCK_MAX_GAS
                })
                .times(1)
                .returning(|_| Ok(json!({ "gas": 21000 })));
        });

        let trace = backend.trace_transaction(b.hash(), TraceConfig::default()).await.unwrap();
        assert_eq!(trace, json!({ "gas": 21000 }));
    }

    #[tokio::test]
    async fn test_first_block_replays_on_its_own_state() {
        let a = signed_eip1559(ALICE, 0, 10, 1);
        let mut chain = ChainFixture::new();
        chain.push_block(vec![FixtureTx::ethereum(vec![a.clone()], 0, 21_000, vec![])]);
        let backend = chain.build_with(|_, query| {
            query
                .expect_trace_tx()
                .withf(|request| request.context.height == 1 && request.context.state_height == 1)
                .times(1)
                .returning(|_| Ok(json!({})));
        });

        assert!(backend.trace_transaction(a.hash(), TraceConfig::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_trace_unknown_transaction() {
        let mut chain = ChainFixture::new();
        chain.push_block(vec![]);
        let backend = chain.build();
        assert!(matches!(
            backend.trace_transaction(B256::repeat_byte(1), TraceConfig::default()).await,
            Err(BackendError::TxNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_genesis_is_not_traceable() {
        let mut chain = ChainFixture::new();
        chain.push_block(vec![]);
        let backend = chain.build();
        let err = backend
            .trace_block_by_number(BlockNumberOrTag::Number(0), TraceConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "genesis is not traceable");
    }

    #[tokio::test]
    async fn test_trace_block_from_rlp() {
        let tx = signed_eip1559(ALICE, 0, 10, 1);
        let mut chain = ChainFixture::new();
        chain.push_block(vec![]);
        chain.push_block(vec![FixtureTx::ethereum(vec![tx.clone()], 0, 21_000, vec![])]);
        let backend = chain.build_with(move |_, query| {
            query
                .expect_trace_block()
                .withf(move |request| request.txs == vec![tx.clone()] && request.context.height == 2)
                .times(1)
                .returning(|_| Ok(json!([{ "result": {} }])));
        });

        let raw = backend.raw_block(BlockId::number(2)).await.unwrap().unwrap();
        let traces = backend.trace_block(raw, TraceConfig::default()).await.unwrap();
        assert_eq!(traces, json!([{ "result": {} }]));
    }

    #[tokio::test]
    async fn test_trace_block_errors() {
        let mut chain = ChainFixture::new();
        chain.push_block(vec![FixtureTx::cosmos(10)]);
        let backend = chain.build();

        let empty = backend
            .trace_block_by_number(BlockNumberOrTag::Number(1), TraceConfig::default())
            .await
            .unwrap();
        assert_eq!(empty, json!([]));

        assert!(matches!(
            backend.trace_block_by_number(BlockNumberOrTag::Number(5), TraceConfig::default()).await,
            Err(BackendError::BlockNotFound(_))
        ));
        assert!(matches!(
            backend.trace_block(Bytes::from_static(&[0xff]), TraceConfig::default()).await,
            Err(BackendError::Rlp(_))
        ));
    }

    #[tokio::test]
    async fn test_trace_call_uses_gas_cap() {
        let mut chain = ChainFixture::new();
        chain.push_block(vec![]);
        let backend = chain.build_with(|_, query| {
            query
                .expect_trace_call()
                .withf(|request| request.gas_cap == 25_000_000 && request.context.height == 1)
                .times(1)
                .returning(|_| Ok(json!({ "type": "CALL" })));
        });

        let trace = backend
            .trace_call(TransactionRequest::default(), BlockId::latest(), TraceConfig::default())
            .await
            .unwrap();
        assert_eq!(trace["type"], "CALL");
    }

    #[test]
    fn test_trace_config_serde() {
        let config: TraceConfig =
            serde_json::from_value(json!({ "tracer": "callTracer", "tracerConfig": { "onlyTopCall": true } }))
                .unwrap();
        assert_eq!(config.tracer.as_deref(), Some("callTracer"));
        assert_eq!(config.tracer_config, Some(json!({ "onlyTopCall": true })));
        assert!(!config.disable_stack);
    }
}
