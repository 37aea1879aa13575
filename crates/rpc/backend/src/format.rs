//! Formatting of Ethereum transactions into their RPC representation.

use crate::BlockTx;
use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::Typed2718;
use alloy_primitives::{B256, U256};
use cometh_events::SyntheticFields;
use cometh_primitives::{MsgEthereumTx, RpcTransaction};

/// Builds the RPC representation of a block transaction at position `index` of its block.
pub fn new_rpc_transaction(
    tx: &BlockTx,
    block_hash: B256,
    block_number: u64,
    index: u64,
    base_fee: Option<U256>,
    chain_id: u64,
) -> RpcTransaction {
    let mut rpc = match &tx.synthetic {
        Some(fields) => synthetic_transaction(fields, base_fee, chain_id),
        None => signed_transaction(&tx.msg, base_fee),
    };
    rpc.block_hash = Some(block_hash);
    rpc.block_number = Some(block_number);
    rpc.transaction_index = Some(index);
    rpc
}

/// Returns the price per gas a transaction pays at the given base fee.
pub(crate) fn effective_gas_price(tx: &BlockTx, base_fee: Option<U256>) -> u128 {
    if tx.synthetic.is_some() {
        return base_fee.unwrap_or_default().saturating_to();
    }
    tx.msg.tx.effective_gas_price(base_fee.map(|fee| fee.saturating_to()))
}

fn signed_transaction(msg: &MsgEthereumTx, base_fee: Option<U256>) -> RpcTransaction {
    let envelope = &msg.tx;
    let signature = envelope.signature();
    let parity = u64::from(signature.v());

    let mut rpc = RpcTransaction {
        from: msg.from,
        gas: envelope.gas_limit(),
        gas_price: envelope.gas_price().unwrap_or_else(|| envelope.max_fee_per_gas()),
        hash: msg.hash(),
        input: envelope.input().clone(),
        nonce: envelope.nonce(),
        to: envelope.to(),
        value: envelope.value(),
        tx_type: u64::from(envelope.ty()),
        r: signature.r(),
        s: signature.s(),
        ..Default::default()
    };

    if let TxEnvelope::Legacy(signed) = envelope {
        let chain_id = signed.tx().chain_id;
        rpc.chain_id = chain_id;
        rpc.v = U256::from(match chain_id {
            Some(id) => 35 + 2 * id + parity,
            None => 27 + parity,
        });
        return rpc;
    }

    rpc.v = U256::from(parity);
    rpc.y_parity = Some(parity);
    rpc.chain_id = envelope.chain_id();
    rpc.access_list = envelope.access_list().cloned();
    if envelope.is_dynamic_fee() {
        rpc.max_fee_per_gas = Some(envelope.max_fee_per_gas());
        rpc.max_priority_fee_per_gas = envelope.max_priority_fee_per_gas();
        rpc.gas_price = envelope.effective_gas_price(base_fee.map(|fee| fee.saturating_to()));
    }
    rpc.max_fee_per_blob_gas = envelope.max_fee_per_blob_gas();
    rpc.blob_versioned_hashes = envelope.blob_versioned_hashes().map(<[B256]>::to_vec);
    rpc.authorization_list = envelope.authorization_list().map(<[_]>::to_vec);
    rpc
}

fn synthetic_transaction(
    fields: &SyntheticFields,
    base_fee: Option<U256>,
    chain_id: u64,
) -> RpcTransaction {
    RpcTransaction {
        from: fields.sender,
        gas: fields.gas(),
        gas_price: base_fee.unwrap_or_default().saturating_to(),
        hash: fields.hash,
        input: fields.data.clone(),
        nonce: fields.nonce,
        to: Some(fields.recipient),
        value: fields.value.unwrap_or_default(),
        tx_type: fields.tx_type,
        chain_id: Some(chain_id),
        ..Default::default()
    }
}
