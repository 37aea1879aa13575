//! CometBFT data as handed to the translation layer by the consensus client.

use alloy_primitives::{B256, Bytes};
use serde::{Deserialize, Serialize};

/// A single key/value pair attached to an [`Event`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    /// The attribute key.
    pub key: String,
    /// The attribute value.
    pub value: String,
    /// Whether the attribute was indexed by the node.
    #[serde(default)]
    pub index: bool,
}

impl EventAttribute {
    /// Creates a new indexed [`EventAttribute`].
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into(), index: true }
    }
}

/// An ABCI event emitted while executing a transaction or finalizing a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The event type, e.g. `ethereum_tx`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The ordered attributes of the event.
    #[serde(default)]
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    /// Creates a new [`Event`] from a type and `(key, value)` pairs.
    pub fn new<K, V>(kind: impl Into<String>, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind: kind.into(),
            attributes: attributes.into_iter().map(|(k, v)| EventAttribute::new(k, v)).collect(),
        }
    }

    /// Returns the value of the first attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|attr| attr.key == key).map(|attr| attr.value.as_str())
    }
}

/// The execution result of a single Cosmos transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecTxResult {
    /// Response code, zero on success.
    pub code: u32,
    /// Opaque result data.
    #[serde(default)]
    pub data: Bytes,
    /// The raw log, carrying the failure reason on error.
    #[serde(default)]
    pub log: String,
    /// Additional info.
    #[serde(default)]
    pub info: String,
    /// Gas requested by the transaction.
    pub gas_wanted: u64,
    /// Gas consumed by the transaction.
    pub gas_used: u64,
    /// Events emitted during execution.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Namespace of the response code.
    #[serde(default)]
    pub codespace: String,
}

/// The subset of a CometBFT header the translation layer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CometHeader {
    /// The Cosmos chain id.
    pub chain_id: String,
    /// Block height.
    pub height: u64,
    /// Block time in unix seconds.
    pub time: u64,
    /// Hash of the previous block.
    pub last_block_hash: B256,
    /// Merkle root of the block transactions.
    pub data_hash: B256,
    /// Application state hash after the previous block.
    pub app_hash: Bytes,
    /// Consensus address of the proposer.
    pub proposer_address: Bytes,
}

/// A CometBFT block together with its id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CometBlock {
    /// The block id hash.
    pub hash: B256,
    /// The block header.
    pub header: CometHeader,
    /// Raw transactions in block order.
    #[serde(default)]
    pub txs: Vec<Bytes>,
    /// Encoded size of the block in bytes.
    #[serde(default)]
    pub size: u64,
}

impl CometBlock {
    /// Returns the block height.
    pub const fn height(&self) -> u64 {
        self.header.height
    }
}

/// Results of executing every transaction in a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResults {
    /// The block height.
    pub height: u64,
    /// Per-transaction results, aligned with [`CometBlock::txs`].
    #[serde(default)]
    pub txs_results: Vec<ExecTxResult>,
    /// Events emitted while finalizing the block.
    #[serde(default)]
    pub finalize_block_events: Vec<Event>,
}

/// Block-level consensus limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    /// Maximum block size in bytes.
    pub max_bytes: i64,
    /// Maximum gas per block, `-1` when unbounded.
    pub max_gas: i64,
}

/// Consensus parameters in effect at a height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Block limits.
    pub block: BlockParams,
}

impl ConsensusParams {
    /// Returns the block gas limit. An unbounded limit maps to [`u32::MAX`].
    pub fn block_max_gas(&self) -> u64 {
        u64::try_from(self.block.max_gas).unwrap_or(u64::from(u32::MAX))
    }
}

/// A transaction returned by a CometBFT `tx_search` query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSearchResult {
    /// The Cosmos transaction hash.
    pub hash: B256,
    /// Height of the containing block.
    pub height: u64,
    /// Position of the transaction in its block.
    pub index: u32,
    /// The raw transaction.
    pub tx: Bytes,
    /// The execution result.
    pub result: ExecTxResult,
}
