//! Placeholder transactions for operations the chain applies without a signed
//! Ethereum transaction.

use crate::ParsedTx;
use alloy_consensus::{Signed, TxEnvelope, TxLegacy};
use alloy_primitives::{Address, B256, Bytes, Signature, TxKind, U256};
use cometh_primitives::MsgEthereumTx;

/// The fields of a synthetic transaction recovered from its events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntheticFields {
    /// Transferred amount.
    pub value: Option<U256>,
    /// The Ethereum transaction hash assigned by the chain.
    pub hash: B256,
    /// Reference to the originating transaction on another chain.
    pub tx_hash: String,
    /// Transaction type.
    pub tx_type: u64,
    /// The recipient.
    pub recipient: Address,
    /// The sender.
    pub sender: Address,
    /// Gas used.
    pub gas_used: u64,
    /// Explicit gas limit.
    pub gas_limit: Option<u64>,
    /// Call data.
    pub data: Bytes,
    /// Sender nonce.
    pub nonce: u64,
}

impl From<&ParsedTx> for SyntheticFields {
    fn from(tx: &ParsedTx) -> Self {
        Self {
            value: tx.amount,
            hash: tx.hash,
            tx_hash: tx.tx_hash.clone(),
            tx_type: tx.tx_type,
            recipient: tx.recipient,
            sender: tx.sender,
            gas_used: tx.gas_used,
            gas_limit: tx.gas_limit,
            data: tx.data.clone(),
            nonce: tx.nonce,
        }
    }
}

impl SyntheticFields {
    /// Returns the gas of the transaction.
    ///
    /// Chains that predate the explicit gas limit attribute reported the gas limit in the
    /// gas used attribute, so it is the fallback.
    pub fn gas(&self) -> u64 {
        self.gas_limit.unwrap_or(self.gas_used)
    }

    /// Builds an unsigned legacy transaction from the fields, sent by the recorded sender.
    ///
    /// The signature is all zeroes and does not verify.
    pub fn to_msg(&self) -> MsgEthereumTx {
        let tx = TxLegacy {
            chain_id: None,
            nonce: self.nonce,
            gas_price: 0,
            gas_limit: self.gas(),
            to: TxKind::Call(self.recipient),
            value: self.value.unwrap_or_default(),
            input: self.data.clone(),
        };
        let signature = Signature::new(U256::ZERO, U256::ZERO, false);
        let envelope = TxEnvelope::Legacy(Signed::new_unchecked(tx, signature, self.hash));
        MsgEthereumTx::new(envelope, self.sender)
    }
}
