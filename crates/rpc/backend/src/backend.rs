//! The [`Backend`] and its block resolution helpers.

use crate::{BackendConfig, BackendError, CometClient, QueryClient, TxDecoder, TxIndexer};
use alloy_eips::{BlockId, BlockNumberOrTag};
use cometh_primitives::{CometBlock, CosmosTx};
use std::sync::Arc;

/// Serves the Ethereum view of a CometBFT chain.
///
/// The backend is cheap to clone and holds no mutable state.
#[derive(Debug, Clone)]
pub struct Backend {
    pub(crate) config: Arc<BackendConfig>,
    pub(crate) comet: Arc<dyn CometClient>,
    pub(crate) query: Arc<dyn QueryClient>,
    pub(crate) decoder: Arc<dyn TxDecoder>,
    pub(crate) indexer: Option<Arc<dyn TxIndexer>>,
}

impl Backend {
    /// Creates a new [`Backend`] without a transaction indexer.
    pub fn new(
        config: BackendConfig,
        comet: Arc<dyn CometClient>,
        query: Arc<dyn QueryClient>,
        decoder: Arc<dyn TxDecoder>,
    ) -> Self {
        Self { config: Arc::new(config), comet, query, decoder, indexer: None }
    }

    /// Sets the local transaction indexer, consulted before `tx_search`.
    pub fn with_indexer(mut self, indexer: Arc<dyn TxIndexer>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Returns the EVM chain id.
    pub fn chain_id(&self) -> u64 {
        self.config.evm_chain_id
    }

    /// Returns the height of the latest block.
    pub async fn block_number(&self) -> Result<u64, BackendError> {
        Ok(self.comet.latest_height().await?)
    }

    /// Resolves a block tag to a height.
    ///
    /// Every head-like tag maps to the latest block, and `earliest` to the first block.
    pub(crate) async fn resolve_height(&self, tag: BlockNumberOrTag) -> Result<u64, BackendError> {
        match tag {
            BlockNumberOrTag::Number(height) => Ok(height),
            BlockNumberOrTag::Earliest => Ok(1),
            BlockNumberOrTag::Latest |
            BlockNumberOrTag::Pending |
            BlockNumberOrTag::Safe |
            BlockNumberOrTag::Finalized => self.block_number().await,
        }
    }

    /// Fetches the CometBFT block with the given tag.
    pub(crate) async fn comet_block(
        &self,
        tag: BlockNumberOrTag,
    ) -> Result<Option<CometBlock>, BackendError> {
        let height = self.resolve_height(tag).await?;
        Ok(self.comet.block(height).await?)
    }

    /// Fetches the CometBFT block with the given id.
    pub(crate) async fn comet_block_by_id(
        &self,
        id: BlockId,
    ) -> Result<Option<CometBlock>, BackendError> {
        match id {
            BlockId::Hash(hash) => Ok(self.comet.block_by_hash(hash.block_hash).await?),
            BlockId::Number(tag) => self.comet_block(tag).await,
        }
    }

    /// Decodes a raw Cosmos transaction, logging and discarding undecodable ones.
    pub(crate) fn decode_tx(&self, raw: &[u8]) -> Option<CosmosTx> {
        match self.decoder.decode(raw) {
            Ok(tx) => Some(tx),
            Err(err) => {
                debug!(target: "cometh::backend", %err, "failed to decode cosmos tx");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ChainFixture;
    use rstest::rstest;

    #[rstest]
    #[case::earliest(BlockNumberOrTag::Earliest, 1)]
    #[case::number(BlockNumberOrTag::Number(2), 2)]
    #[case::latest(BlockNumberOrTag::Latest, 3)]
    #[case::pending(BlockNumberOrTag::Pending, 3)]
    #[case::finalized(BlockNumberOrTag::Finalized, 3)]
    #[tokio::test]
    async fn test_resolve_height(#[case] tag: BlockNumberOrTag, #[case] expected: u64) {
        let mut chain = ChainFixture::new();
        for _ in 0..3 {
            chain.push_block(vec![]);
        }
        assert_eq!(chain.build().resolve_height(tag).await.unwrap(), expected);
    }
}
