//! Ethereum JSON-RPC output shapes.
//!
//! These mirror the objects served by go-ethereum. Synthetic transactions carry a zero
//! signature, which the alloy RPC types cannot represent for legacy transactions, so the
//! shapes are defined here.

use alloy_eips::{eip2930::AccessList, eip7702::SignedAuthorization};
use alloy_primitives::{Address, B64, B256, Bloom, Bytes, U256};
use alloy_rpc_types_eth::{BlockTransactions, Log};
use serde::{Deserialize, Serialize};

/// A transaction as returned by `eth_getTransactionBy*` and full blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    /// Hash of the containing block.
    pub block_hash: Option<B256>,
    /// Number of the containing block.
    #[serde(with = "alloy_serde::quantity::opt")]
    pub block_number: Option<u64>,
    /// The sender.
    pub from: Address,
    /// Gas limit.
    #[serde(with = "alloy_serde::quantity")]
    pub gas: u64,
    /// Gas price, or the effective gas price for dynamic fee transactions.
    #[serde(with = "alloy_serde::quantity")]
    pub gas_price: u128,
    /// EIP-1559 fee cap.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub max_fee_per_gas: Option<u128>,
    /// EIP-1559 tip cap.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub max_priority_fee_per_gas: Option<u128>,
    /// EIP-4844 blob fee cap.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub max_fee_per_blob_gas: Option<u128>,
    /// The transaction hash.
    pub hash: B256,
    /// Call data.
    pub input: Bytes,
    /// Sender nonce.
    #[serde(with = "alloy_serde::quantity")]
    pub nonce: u64,
    /// The recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Position in the block.
    #[serde(with = "alloy_serde::quantity::opt")]
    pub transaction_index: Option<u64>,
    /// Transferred value.
    pub value: U256,
    /// Transaction type.
    #[serde(rename = "type", with = "alloy_serde::quantity")]
    pub tx_type: u64,
    /// EIP-2930 access list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
    /// Chain id the transaction is bound to.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub chain_id: Option<u64>,
    /// EIP-4844 versioned hashes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<B256>>,
    /// EIP-7702 authorizations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_list: Option<Vec<SignedAuthorization>>,
    /// Signature `v`.
    pub v: U256,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
    /// Signature parity of typed transactions.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub y_parity: Option<u64>,
}

/// A transaction receipt as returned by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// `1` on success, `0` on failure.
    #[serde(with = "alloy_serde::quantity")]
    pub status: u64,
    /// Gas used in the block up to and including this transaction.
    #[serde(with = "alloy_serde::quantity")]
    pub cumulative_gas_used: u64,
    /// Bloom of the transaction's own logs.
    pub logs_bloom: Bloom,
    /// The transaction logs.
    pub logs: Vec<Log>,
    /// The transaction hash.
    pub transaction_hash: B256,
    /// Address of the created contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// Gas used by this transaction.
    #[serde(with = "alloy_serde::quantity")]
    pub gas_used: u64,
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Number of the containing block.
    #[serde(with = "alloy_serde::quantity")]
    pub block_number: u64,
    /// Position of the transaction in the block.
    #[serde(with = "alloy_serde::quantity")]
    pub transaction_index: u64,
    /// The sender.
    pub from: Address,
    /// The recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Transaction type.
    #[serde(rename = "type", with = "alloy_serde::quantity")]
    pub tx_type: u64,
    /// The price paid per unit of gas.
    #[serde(with = "alloy_serde::quantity")]
    pub effective_gas_price: u128,
}

/// A block as returned by `eth_getBlockBy*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    /// Block number.
    #[serde(with = "alloy_serde::quantity")]
    pub number: u64,
    /// Block hash.
    pub hash: B256,
    /// Parent block hash.
    pub parent_hash: B256,
    /// Always zero.
    pub nonce: B64,
    /// Always the empty ommers hash.
    pub sha3_uncles: B256,
    /// Bloom of every log in the block.
    pub logs_bloom: Bloom,
    /// Transactions root.
    pub transactions_root: B256,
    /// The application state hash.
    pub state_root: Bytes,
    /// The proposer's operator address.
    pub miner: Address,
    /// Always zero.
    pub mix_hash: B256,
    /// Always zero.
    pub difficulty: U256,
    /// Always zero.
    pub total_difficulty: U256,
    /// Always empty.
    pub extra_data: Bytes,
    /// Encoded block size.
    #[serde(with = "alloy_serde::quantity")]
    pub size: u64,
    /// Block gas limit.
    #[serde(with = "alloy_serde::quantity")]
    pub gas_limit: u64,
    /// Gas used by the block.
    #[serde(with = "alloy_serde::quantity")]
    pub gas_used: u64,
    /// Block time.
    #[serde(with = "alloy_serde::quantity")]
    pub timestamp: u64,
    /// Transaction hashes or full transactions.
    pub transactions: BlockTransactions<RpcTransaction>,
    /// Always empty.
    pub uncles: Vec<B256>,
    /// Always the empty root.
    pub receipts_root: B256,
    /// Base fee, present when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
}
