//! Decoded Cosmos transactions.

use alloy_consensus::{Transaction, TxEnvelope};
use alloy_primitives::{Address, B256};
use derive_more::{From, IsVariant};

/// An Ethereum transaction wrapped in a Cosmos message, with its recovered sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgEthereumTx {
    /// The signed Ethereum transaction.
    pub tx: TxEnvelope,
    /// The sender of the transaction.
    pub from: Address,
}

impl MsgEthereumTx {
    /// Creates a new [`MsgEthereumTx`].
    pub const fn new(tx: TxEnvelope, from: Address) -> Self {
        Self { tx, from }
    }

    /// Returns the Ethereum transaction hash.
    pub fn hash(&self) -> B256 {
        *self.tx.tx_hash()
    }

    /// Returns the gas limit declared by the transaction.
    pub fn gas_limit(&self) -> u64 {
        self.tx.gas_limit()
    }
}

/// A message carried by a Cosmos transaction.
#[derive(Debug, Clone, PartialEq, Eq, From, IsVariant)]
pub enum CosmosMsg {
    /// An Ethereum transaction executed by the EVM module.
    Ethereum(MsgEthereumTx),
    /// Any other SDK message, identified by its type url.
    #[from(ignore)]
    Other(String),
}

impl CosmosMsg {
    /// Returns the Ethereum message if this message carries one.
    pub const fn as_ethereum(&self) -> Option<&MsgEthereumTx> {
        match self {
            Self::Ethereum(msg) => Some(msg),
            Self::Other(_) => None,
        }
    }
}

/// A decoded Cosmos transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CosmosTx {
    /// The messages in execution order.
    pub msgs: Vec<CosmosMsg>,
}

impl CosmosTx {
    /// Creates a new [`CosmosTx`] from its messages.
    pub const fn new(msgs: Vec<CosmosMsg>) -> Self {
        Self { msgs }
    }

    /// Returns the message at the given index.
    pub fn msg(&self, index: usize) -> Option<&CosmosMsg> {
        self.msgs.get(index)
    }

    /// Returns an iterator over the Ethereum messages of the transaction.
    pub fn ethereum_msgs(&self) -> impl Iterator<Item = &MsgEthereumTx> {
        self.msgs.iter().filter_map(CosmosMsg::as_ethereum)
    }
}
