//! Translation of CometBFT blocks into Ethereum blocks.

use crate::{Backend, BackendError, BlockLogs, Metrics, logs::bloom_from_events, new_rpc_transaction};
use alloy_consensus::{
    Block, BlockBody, EMPTY_OMMER_ROOT_HASH, EMPTY_ROOT_HASH, Header, TxEnvelope,
};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::{Address, B64, B256, Bloom, Bytes, U256};
use alloy_rpc_types_eth::BlockTransactions;
use cometh_events::{
    ParsedTxs, SyntheticFields,
    attributes::{ATTRIBUTE_KEY_BASE_FEE, EVENT_TYPE_FEE_MARKET, decode_attributes},
    parse_tx_result,
};
use cometh_primitives::{BlockResults, CometBlock, ExecTxResult, MsgEthereumTx, RpcBlock};

/// An Ethereum transaction included in a block, real or synthetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTx {
    /// The transaction. Synthetic transactions carry an unsigned legacy transaction.
    pub msg: MsgEthereumTx,
    /// The event-derived fields of a synthetic transaction.
    pub synthetic: Option<SyntheticFields>,
    /// Position of the containing Cosmos transaction in the block.
    pub tx_index: u32,
    /// Position of the transaction among the parsed transactions of its execution result.
    pub position: usize,
    /// Block-wide index reported by the transaction's events.
    pub eth_tx_index: Option<u32>,
    /// Gas used by the transaction.
    pub gas_used: u64,
    /// Whether the transaction failed.
    pub failed: bool,
    /// Gas used by the execution result up to and including this transaction.
    pub cumulative_gas_used: u64,
}

impl BlockTx {
    /// Creates a [`BlockTx`] from its execution result.
    ///
    /// `parsed_position` is the position of the transaction in the parsed events. Without
    /// one, the transaction takes the gas and outcome of the whole result.
    pub(crate) fn from_result(
        msg: MsgEthereumTx,
        synthetic: Option<SyntheticFields>,
        tx_index: u32,
        parsed_position: Option<usize>,
        ordinal: usize,
        parsed: &ParsedTxs,
        result: &ExecTxResult,
    ) -> Self {
        let parsed_tx =
            parsed_position.and_then(|position| Some((position, parsed.txs().get(position)?)));
        match parsed_tx {
            Some((position, tx)) => Self {
                msg,
                synthetic,
                tx_index,
                position,
                eth_tx_index: tx.eth_tx_index,
                gas_used: tx.gas_used,
                failed: tx.failed,
                cumulative_gas_used: parsed.accumulative_gas_used(position),
            },
            None => Self {
                msg,
                synthetic,
                tx_index,
                position: ordinal,
                eth_tx_index: None,
                gas_used: result.gas_used,
                failed: !result.is_success(),
                cumulative_gas_used: result.gas_used,
            },
        }
    }

    /// Returns the Ethereum transaction hash.
    pub fn hash(&self) -> B256 {
        self.synthetic.as_ref().map_or_else(|| self.msg.hash(), |fields| fields.hash)
    }

    /// Returns the block-wide index of the transaction, falling back to its position among
    /// the block's Ethereum transactions.
    pub fn eth_index(&self, ordinal: usize) -> u64 {
        self.eth_tx_index.map_or(ordinal as u64, u64::from)
    }

    /// Returns true if the transaction was reconstructed from events.
    pub const fn is_synthetic(&self) -> bool {
        self.synthetic.is_some()
    }
}

/// The Ethereum view of a CometBFT block.
#[derive(Debug, Clone, PartialEq)]
pub struct EthBlock {
    /// The Ethereum header.
    pub header: Header,
    /// The CometBFT block id hash, served as the block hash.
    pub hash: B256,
    /// The application state hash.
    pub app_hash: Bytes,
    /// Encoded size of the CometBFT block.
    pub size: u64,
    /// The base fee, if known.
    pub base_fee: Option<U256>,
    /// The Ethereum transactions in block order.
    pub transactions: Vec<BlockTx>,
}

impl EthBlock {
    /// Returns the block height.
    pub const fn number(&self) -> u64 {
        self.header.number
    }

    /// Builds the RPC representation, with full transactions or hashes only.
    pub fn to_rpc(&self, full: bool, chain_id: u64) -> RpcBlock {
        let transactions = if full {
            BlockTransactions::Full(
                self.transactions
                    .iter()
                    .enumerate()
                    .map(|(i, tx)| {
                        new_rpc_transaction(
                            tx,
                            self.hash,
                            self.number(),
                            i as u64,
                            self.base_fee,
                            chain_id,
                        )
                    })
                    .collect(),
            )
        } else {
            BlockTransactions::Hashes(self.transactions.iter().map(BlockTx::hash).collect())
        };

        RpcBlock {
            number: self.number(),
            hash: self.hash,
            parent_hash: self.header.parent_hash,
            nonce: B64::ZERO,
            sha3_uncles: self.header.ommers_hash,
            logs_bloom: self.header.logs_bloom,
            transactions_root: self.header.transactions_root,
            state_root: self.app_hash.clone(),
            miner: self.header.beneficiary,
            mix_hash: B256::ZERO,
            difficulty: U256::ZERO,
            total_difficulty: U256::ZERO,
            extra_data: Bytes::new(),
            size: self.size,
            gas_limit: self.header.gas_limit,
            gas_used: self.header.gas_used,
            timestamp: self.header.timestamp,
            transactions,
            uncles: Vec::new(),
            receipts_root: self.header.receipts_root,
            base_fee_per_gas: self.base_fee,
        }
    }

    /// Builds the consensus block, as RLP encoded by `debug_getRawBlock`.
    pub fn to_consensus_block(&self) -> Block<TxEnvelope> {
        Block {
            header: self.header.clone(),
            body: BlockBody {
                transactions: self.transactions.iter().map(|tx| tx.msg.tx.clone()).collect(),
                ommers: Vec::new(),
                withdrawals: None,
            },
        }
    }
}

/// Returns the gas used by a block.
///
/// Once a transaction hits the block gas limit every following one failed the same way,
/// and their reported gas is meaningless.
pub(crate) fn block_gas_used(results: &BlockResults) -> u64 {
    results
        .txs_results
        .iter()
        .take_while(|result| !result.should_ignore_gas_used())
        .map(|result| result.gas_used)
        .sum()
}

impl Backend {
    /// Fetches a block and its execution results.
    ///
    /// Returns `None` if the block does not exist or its results are unavailable.
    pub(crate) async fn load_block(
        &self,
        id: BlockId,
    ) -> Result<Option<(CometBlock, BlockResults)>, BackendError> {
        let Some(block) = self.comet_block_by_id(id).await? else {
            return Ok(None);
        };
        match self.comet.block_results(block.height()).await {
            Ok(results) => Ok(Some((block, results))),
            Err(err) => {
                debug!(
                    target: "cometh::backend",
                    height = block.height(),
                    %err,
                    "failed to fetch block results"
                );
                Ok(None)
            }
        }
    }

    /// Extracts the Ethereum transactions of a block.
    ///
    /// A Cosmos transaction carrying Ethereum messages contributes those messages. One
    /// without contributes the synthetic transactions recorded in its events. Results that
    /// neither succeeded nor failed in an expected way contribute nothing.
    pub fn block_txs(&self, block: &CometBlock, results: &BlockResults) -> Vec<BlockTx> {
        let mut txs = Vec::new();
        for (i, (raw, result)) in block.txs.iter().zip(&results.txs_results).enumerate() {
            if !result.is_success_or_expected_failure() {
                debug!(target: "cometh::backend", tx_index = i, code = result.code, "skipping failed tx");
                continue;
            }
            let tx_index = i as u32;
            let cosmos_tx = self.decode_tx(raw);
            let parsed = match parse_tx_result(result, cosmos_tx.as_ref()) {
                Ok(parsed) => parsed,
                Err(err) => {
                    error!(target: "cometh::backend", tx_index, %err, "failed to parse tx events");
                    continue;
                }
            };

            let eth_msgs: Vec<&MsgEthereumTx> =
                cosmos_tx.iter().flat_map(|tx| tx.ethereum_msgs()).collect();
            if eth_msgs.is_empty() {
                txs.extend(parsed.iter().enumerate().filter(|(_, tx)| tx.is_synthetic()).map(
                    |(position, tx)| {
                        let fields = SyntheticFields::from(tx);
                        BlockTx::from_result(
                            fields.to_msg(),
                            Some(fields),
                            tx_index,
                            Some(position),
                            position,
                            &parsed,
                            result,
                        )
                    },
                ));
                continue;
            }
            txs.extend(eth_msgs.into_iter().enumerate().map(|(ordinal, msg)| {
                let position = parsed.position(&msg.hash());
                BlockTx::from_result(msg.clone(), None, tx_index, position, ordinal, &parsed, result)
            }));
        }
        txs
    }

    /// Returns the base fee of a block.
    ///
    /// The fee market state is authoritative. Nodes that pruned it still have the fee in
    /// the block's finalize events.
    pub(crate) async fn base_fee(
        &self,
        results: &BlockResults,
    ) -> Result<Option<U256>, BackendError> {
        let queried = match self.query.base_fee(results.height).await {
            Ok(Some(fee)) => return Ok(Some(fee)),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };

        for event in &results.finalize_block_events {
            if event.kind != EVENT_TYPE_FEE_MARKET {
                continue;
            }
            let attrs = decode_attributes(&event.attributes)?;
            let Some(attr) = attrs.iter().find(|attr| attr.key == ATTRIBUTE_KEY_BASE_FEE) else {
                continue;
            };
            if let Ok(fee) = U256::from_str_radix(&attr.value, 10) {
                return Ok(Some(fee));
            }
        }
        Ok(queried?)
    }

    /// Resolves the base fee of a block, treating a failed lookup as unknown.
    pub(crate) async fn base_fee_or_unknown(&self, results: &BlockResults) -> Option<U256> {
        self.base_fee(results).await.unwrap_or_else(|err| {
            warn!(target: "cometh::backend", height = results.height, %err, "failed to resolve base fee");
            Metrics::record_degraded_lookup("base_fee");
            None
        })
    }

    async fn miner(&self, block: &CometBlock) -> Address {
        self.query
            .validator_account(block.height(), block.header.proposer_address.clone())
            .await
            .unwrap_or_else(|err| {
                warn!(
                    target: "cometh::backend",
                    height = block.height(),
                    proposer = %block.header.proposer_address,
                    %err,
                    "failed to resolve block proposer"
                );
                Metrics::record_degraded_lookup("miner");
                Address::ZERO
            })
    }

    pub(crate) async fn block_gas_limit(&self, height: u64) -> u64 {
        match self.comet.consensus_params(height).await {
            Ok(params) => params.block_max_gas(),
            Err(err) => {
                warn!(target: "cometh::backend", height, %err, "failed to fetch consensus params");
                Metrics::record_degraded_lookup("gas_limit");
                u64::from(u32::MAX)
            }
        }
    }

    fn block_bloom(&self, results: &BlockResults) -> Bloom {
        if let Some(bloom) = bloom_from_events(&results.finalize_block_events) {
            return bloom;
        }
        match BlockLogs::from_results(results) {
            Ok(logs) => logs.bloom(),
            Err(err) => {
                warn!(target: "cometh::backend", height = results.height, %err, "failed to decode block logs");
                Bloom::ZERO
            }
        }
    }

    /// Translates a CometBFT block into its Ethereum view.
    pub async fn eth_block(&self, block: &CometBlock, results: &BlockResults) -> EthBlock {
        let transactions = self.block_txs(block, results);
        let base_fee = self.base_fee_or_unknown(results).await;
        let beneficiary = self.miner(block).await;
        let gas_limit = self.block_gas_limit(block.height()).await;

        let transactions_root =
            if transactions.is_empty() { EMPTY_ROOT_HASH } else { block.header.data_hash };
        let header = Header {
            parent_hash: block.header.last_block_hash,
            ommers_hash: EMPTY_OMMER_ROOT_HASH,
            beneficiary,
            state_root: B256::try_from(block.header.app_hash.as_ref()).unwrap_or_default(),
            transactions_root,
            receipts_root: EMPTY_ROOT_HASH,
            logs_bloom: self.block_bloom(results),
            number: block.height(),
            gas_limit,
            gas_used: block_gas_used(results),
            timestamp: block.header.time,
            base_fee_per_gas: base_fee.map(|fee| fee.saturating_to()),
            ..Default::default()
        };

        Metrics::record_block_translated();
        EthBlock {
            header,
            hash: block.hash,
            app_hash: block.header.app_hash.clone(),
            size: block.size,
            base_fee,
            transactions,
        }
    }

    /// Returns the block with the given tag.
    pub async fn block_by_number(
        &self,
        tag: BlockNumberOrTag,
        full: bool,
    ) -> Result<Option<RpcBlock>, BackendError> {
        self.rpc_block(BlockId::Number(tag), full).await
    }

    /// Returns the block with the given hash.
    pub async fn block_by_hash(
        &self,
        hash: B256,
        full: bool,
    ) -> Result<Option<RpcBlock>, BackendError> {
        self.rpc_block(BlockId::from(hash), full).await
    }

    async fn rpc_block(&self, id: BlockId, full: bool) -> Result<Option<RpcBlock>, BackendError> {
        let Some((block, results)) = self.load_block(id).await? else {
            return Ok(None);
        };
        let eth_block = self.eth_block(&block, &results).await;
        Ok(Some(eth_block.to_rpc(full, self.chain_id())))
    }

    /// Returns the number of Ethereum transactions in a block.
    pub async fn block_transaction_count(&self, id: BlockId) -> Result<Option<u64>, BackendError> {
        let Some((block, results)) = self.load_block(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.block_txs(&block, &results).len() as u64))
    }

    /// Returns the RLP encoding of a block.
    pub async fn raw_block(&self, id: BlockId) -> Result<Option<Bytes>, BackendError> {
        let Some((block, results)) = self.load_block(id).await? else {
            return Ok(None);
        };
        let eth_block = self.eth_block(&block, &results).await;
        Ok(Some(alloy_rlp::encode(eth_block.to_consensus_block()).into()))
    }
}
