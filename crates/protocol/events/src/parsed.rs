//! Ethereum transactions recovered from one execution result.

use crate::{
    EventParseError, SYNTHETIC_TX_TYPE,
    attributes::{self, *},
};
use alloy_primitives::{Address, B256, Bytes, U256, hex};
use cometh_primitives::EventAttribute;
use std::{collections::HashMap, str::FromStr};

/// One Ethereum-effecting operation inside a Cosmos transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTx {
    /// Index of the corresponding message in the Cosmos transaction. `None` for synthetic
    /// transactions, which have no message.
    pub msg_index: Option<usize>,
    /// The Ethereum transaction hash.
    pub hash: B256,
    /// Position among the block's Ethereum transactions, `None` until resolved.
    pub eth_tx_index: Option<u32>,
    /// Gas used.
    pub gas_used: u64,
    /// Whether execution failed.
    pub failed: bool,
    /// Reference to the originating transaction on another chain.
    pub tx_hash: String,
    /// Transaction type, [`SYNTHETIC_TX_TYPE`] for synthetic transactions.
    pub tx_type: u64,
    /// Transferred amount.
    pub amount: Option<U256>,
    /// The recipient.
    pub recipient: Address,
    /// The sender.
    pub sender: Address,
    /// Sender nonce.
    pub nonce: u64,
    /// Call data.
    pub data: Bytes,
    /// Explicit gas limit, only emitted by newer chains for synthetic transactions.
    pub gas_limit: Option<u64>,
}

impl ParsedTx {
    /// Builds a [`ParsedTx`] from the attributes of a single event.
    pub fn from_attributes(attrs: &[EventAttribute]) -> Result<Self, EventParseError> {
        let mut tx = Self::default();
        tx.apply_attributes(attrs)?;
        Ok(tx)
    }

    /// Returns true if the transaction was credited by the chain rather than signed by a
    /// user.
    pub const fn is_synthetic(&self) -> bool {
        self.tx_type == SYNTHETIC_TX_TYPE
    }

    /// Overwrites fields with the recognised attributes. Unknown keys are ignored.
    pub(crate) fn apply_attributes(
        &mut self,
        attrs: &[EventAttribute],
    ) -> Result<(), EventParseError> {
        for attr in attributes::decode_attributes(attrs)?.iter() {
            self.apply_attribute(&attr.key, &attr.value)?;
        }
        Ok(())
    }

    fn apply_attribute(&mut self, key: &str, value: &str) -> Result<(), EventParseError> {
        match key {
            ATTRIBUTE_KEY_ETHEREUM_TX_HASH => self.hash = attributes::parse_hash(value),
            ATTRIBUTE_KEY_TX_INDEX => {
                self.eth_tx_index = Some(parse_u31(ATTRIBUTE_KEY_TX_INDEX, value)?)
            }
            ATTRIBUTE_KEY_TX_GAS_USED => {
                self.gas_used = parse_u64(ATTRIBUTE_KEY_TX_GAS_USED, value)?
            }
            ATTRIBUTE_KEY_TX_GAS_LIMIT => {
                self.gas_limit = Some(parse_u64(ATTRIBUTE_KEY_TX_GAS_LIMIT, value)?)
            }
            ATTRIBUTE_KEY_ETHEREUM_TX_FAILED => self.failed = !value.is_empty(),
            ATTRIBUTE_KEY_SENDER => self.sender = attributes::parse_address(value),
            ATTRIBUTE_KEY_RECIPIENT => self.recipient = attributes::parse_address(value),
            ATTRIBUTE_KEY_TX_HASH => self.tx_hash = value.to_string(),
            ATTRIBUTE_KEY_TX_TYPE => {
                self.tx_type = u64::from(parse_u31(ATTRIBUTE_KEY_TX_TYPE, value)?)
            }
            // Amounts that do not parse are left unset.
            ATTRIBUTE_KEY_AMOUNT => self.amount = U256::from_str_radix(value, 10).ok(),
            ATTRIBUTE_KEY_TX_NONCE => self.nonce = parse_u64(ATTRIBUTE_KEY_TX_NONCE, value)?,
            ATTRIBUTE_KEY_TX_DATA => {
                let stripped = value.strip_prefix("0x").ok_or_else(|| {
                    EventParseError::InvalidHex { key: ATTRIBUTE_KEY_TX_DATA, value: value.into() }
                })?;
                self.data = hex::decode(stripped)
                    .map_err(|_| EventParseError::InvalidHex {
                        key: ATTRIBUTE_KEY_TX_DATA,
                        value: value.into(),
                    })?
                    .into();
            }
            _ => {}
        }
        Ok(())
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, EventParseError> {
    u64::from_str(value).map_err(|_| EventParseError::InvalidNumber { key, value: value.into() })
}

fn parse_u31(key: &'static str, value: &str) -> Result<u32, EventParseError> {
    u32::from_str(value)
        .ok()
        .filter(|v| *v <= i32::MAX as u32)
        .ok_or_else(|| EventParseError::InvalidNumber { key, value: value.into() })
}

/// The ordered Ethereum transactions of one execution result, indexed by hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTxs {
    txs: Vec<ParsedTx>,
    hashes: HashMap<B256, usize>,
}

impl ParsedTxs {
    /// Assembles a [`ParsedTxs`]. Every index in `hashes` must point into `txs`.
    pub(crate) fn from_parts(txs: Vec<ParsedTx>, hashes: HashMap<B256, usize>) -> Self {
        debug_assert!(hashes.values().all(|i| *i < txs.len()));
        Self { txs, hashes }
    }

    /// Returns the transactions in emission order.
    pub fn txs(&self) -> &[ParsedTx] {
        &self.txs
    }

    /// Returns an iterator over the transactions.
    pub fn iter(&self) -> std::slice::Iter<'_, ParsedTx> {
        self.txs.iter()
    }

    /// Returns the number of transactions.
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Returns true if no Ethereum transaction was found.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Returns the position of the transaction with the given hash.
    pub fn position(&self, hash: &B256) -> Option<usize> {
        self.hashes.get(hash).copied()
    }

    /// Returns the transaction with the given hash.
    pub fn tx_by_hash(&self, hash: &B256) -> Option<&ParsedTx> {
        self.position(hash).and_then(|i| self.txs.get(i))
    }

    /// Returns the transaction at the given position.
    pub fn tx_by_msg_index(&self, index: usize) -> Option<&ParsedTx> {
        self.txs.get(index)
    }

    /// Returns the transaction with the given block-wide Ethereum transaction index.
    ///
    /// The lookup assumes the indices of one execution result are contiguous and
    /// increasing, and offsets from the index of the first transaction.
    pub fn tx_by_tx_index(&self, tx_index: u32) -> Option<&ParsedTx> {
        self.position_by_tx_index(tx_index).and_then(|i| self.txs.get(i))
    }

    /// Returns the position of the transaction with the given block-wide Ethereum
    /// transaction index, under the same assumption as [`Self::tx_by_tx_index`].
    pub fn position_by_tx_index(&self, tx_index: u32) -> Option<usize> {
        let first = self.txs.first()?.eth_tx_index?;
        let offset = tx_index.checked_sub(first)? as usize;
        (offset < self.txs.len()).then_some(offset)
    }

    /// Returns the gas used by the transactions at positions `0..=index`.
    pub fn accumulative_gas_used(&self, index: usize) -> u64 {
        self.txs.iter().take(index.saturating_add(1)).map(|tx| tx.gas_used).sum()
    }
}

impl<'a> IntoIterator for &'a ParsedTxs {
    type Item = &'a ParsedTx;
    type IntoIter = std::slice::Iter<'a, ParsedTx>;

    fn into_iter(self) -> Self::IntoIter {
        self.txs.iter()
    }
}
