//! A backend over an empty chain, for exercising the servers.

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use cometh_backend::{
    Backend, BackendConfig, ClientError, CometClient, FeeMarketParams, QueryClient,
    TraceBlockRequest, TraceCallRequest, TraceTxRequest, TxDecoder,
};
use cometh_primitives::{BlockResults, CometBlock, ConsensusParams, CosmosTx, TxSearchResult};
use std::sync::Arc;

/// Height of the empty chain.
pub(crate) const HEAD: u64 = 5;

/// A chain whose head is [`HEAD`] but which serves no blocks.
#[derive(Debug)]
struct EmptyChain;

#[async_trait]
impl CometClient for EmptyChain {
    async fn latest_height(&self) -> Result<u64, ClientError> {
        Ok(HEAD)
    }

    async fn block(&self, _height: u64) -> Result<Option<CometBlock>, ClientError> {
        Ok(None)
    }

    async fn block_by_hash(&self, _hash: B256) -> Result<Option<CometBlock>, ClientError> {
        Ok(None)
    }

    async fn block_results(&self, height: u64) -> Result<BlockResults, ClientError> {
        Err(ClientError::Request(format!("no results at height {height}")))
    }

    async fn consensus_params(&self, _height: u64) -> Result<ConsensusParams, ClientError> {
        Ok(ConsensusParams::default())
    }

    async fn tx_search(&self, _query: String) -> Result<Vec<TxSearchResult>, ClientError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl QueryClient for EmptyChain {
    async fn base_fee(&self, _height: u64) -> Result<Option<U256>, ClientError> {
        Ok(None)
    }

    async fn fee_market_params(&self, _height: u64) -> Result<FeeMarketParams, ClientError> {
        Ok(FeeMarketParams::default())
    }

    async fn validator_account(
        &self,
        _height: u64,
        _consensus_address: Bytes,
    ) -> Result<Address, ClientError> {
        Ok(Address::ZERO)
    }

    async fn trace_tx(&self, _request: TraceTxRequest) -> Result<serde_json::Value, ClientError> {
        Ok(serde_json::Value::Null)
    }

    async fn trace_block(
        &self,
        _request: TraceBlockRequest,
    ) -> Result<serde_json::Value, ClientError> {
        Ok(serde_json::Value::Null)
    }

    async fn trace_call(
        &self,
        _request: TraceCallRequest,
    ) -> Result<serde_json::Value, ClientError> {
        Ok(serde_json::Value::Null)
    }
}

impl TxDecoder for EmptyChain {
    fn decode(&self, _raw: &[u8]) -> Result<CosmosTx, ClientError> {
        Err(ClientError::Decode("empty chain".into()))
    }
}

/// A backend over [`EmptyChain`] with the default configuration.
pub(crate) fn empty_backend() -> Backend {
    let chain = Arc::new(EmptyChain);
    Backend::new(BackendConfig::default(), chain.clone(), chain.clone(), chain)
}
