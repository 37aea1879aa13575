//! The record stored by the Ethereum transaction indexer.

use serde::{Deserialize, Serialize};

/// Location and outcome of an Ethereum transaction inside a CometBFT block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// Height of the containing block.
    pub height: u64,
    /// Position of the Cosmos transaction in the block.
    pub tx_index: u32,
    /// Position of the message in the Cosmos transaction, `None` for synthetic
    /// transactions that have no message.
    pub msg_index: Option<u32>,
    /// Position of the transaction among the block's Ethereum transactions, when known.
    pub eth_tx_index: Option<u32>,
    /// Whether execution failed.
    pub failed: bool,
    /// Gas used by the transaction.
    pub gas_used: u64,
    /// Gas used by the Cosmos transaction up to and including this one.
    pub cumulative_gas_used: u64,
}
