//! Event types, attribute keys and attribute decoding.

use crate::EventParseError;
use alloy_primitives::{Address, B256, hex};
use base64::{Engine as _, engine::general_purpose};
use cometh_primitives::EventAttribute;
use std::borrow::Cow;

/// Event emitted once per Ethereum transaction.
pub const EVENT_TYPE_ETHEREUM_TX: &str = "ethereum_tx";
/// Generic SDK message event.
pub const EVENT_TYPE_MESSAGE: &str = "message";
/// Event carrying the logs of an Ethereum transaction.
pub const EVENT_TYPE_TX_LOG: &str = "tx_log";
/// Finalize-block event carrying the block bloom.
pub const EVENT_TYPE_BLOCK_BLOOM: &str = "block_bloom";
/// Finalize-block event carrying the block base fee.
pub const EVENT_TYPE_FEE_MARKET: &str = "fee_market";

/// Ethereum transaction hash.
pub const ATTRIBUTE_KEY_ETHEREUM_TX_HASH: &str = "ethereumTxHash";
/// Position of the transaction among the block's Ethereum transactions.
pub const ATTRIBUTE_KEY_TX_INDEX: &str = "txIndex";
/// Gas used by the transaction.
pub const ATTRIBUTE_KEY_TX_GAS_USED: &str = "txGasUsed";
/// Explicit gas limit of a synthetic transaction.
pub const ATTRIBUTE_KEY_TX_GAS_LIMIT: &str = "txGasLimit";
/// Non-empty when the transaction failed.
pub const ATTRIBUTE_KEY_ETHEREUM_TX_FAILED: &str = "ethereumTxFailed";
/// Sender of a synthetic transaction.
pub const ATTRIBUTE_KEY_SENDER: &str = "sender";
/// Recipient of the transaction.
pub const ATTRIBUTE_KEY_RECIPIENT: &str = "recipient";
/// Reference to the originating transaction on another chain.
pub const ATTRIBUTE_KEY_TX_HASH: &str = "txHash";
/// Transaction type.
pub const ATTRIBUTE_KEY_TX_TYPE: &str = "txType";
/// Transferred amount, base-10.
pub const ATTRIBUTE_KEY_AMOUNT: &str = "amount";
/// Nonce of a synthetic transaction.
pub const ATTRIBUTE_KEY_TX_NONCE: &str = "txNonce";
/// Hex call data of a synthetic transaction.
pub const ATTRIBUTE_KEY_TX_DATA: &str = "txData";
/// A JSON encoded log.
pub const ATTRIBUTE_KEY_TX_LOG: &str = "txLog";
/// The block bloom.
pub const ATTRIBUTE_KEY_BLOOM: &str = "bloom";
/// The block base fee.
pub const ATTRIBUTE_KEY_BASE_FEE: &str = "base_fee";

/// Transaction type tag of synthetic transactions.
pub const SYNTHETIC_TX_TYPE: u64 = 88;

/// Returns true if the attributes use the pre-0.47 SDK encoding, where every key and
/// value was base64 encoded. Padding is the only reliable marker.
pub fn is_legacy_encoding(attrs: &[EventAttribute]) -> bool {
    attrs.iter().any(|attr| attr.key.contains("==") || attr.value.contains("=="))
}

/// Returns the attributes in plain text, decoding them if they use the legacy encoding.
pub fn decode_attributes(
    attrs: &[EventAttribute],
) -> Result<Cow<'_, [EventAttribute]>, EventParseError> {
    if !is_legacy_encoding(attrs) {
        return Ok(Cow::Borrowed(attrs));
    }

    attrs
        .iter()
        .map(|attr| {
            Ok(EventAttribute {
                key: decode_base64(&attr.key)?,
                value: decode_base64(&attr.value)?,
                index: attr.index,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Cow::Owned)
}

fn decode_base64(value: &str) -> Result<String, EventParseError> {
    let bytes = general_purpose::STANDARD
        .decode(value)
        .map_err(|_| EventParseError::InvalidBase64(value.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parses a hash leniently: invalid hex yields the zero hash and longer input keeps its
/// trailing 32 bytes.
pub fn parse_hash(value: &str) -> B256 {
    let bytes = lenient_hex(value);
    let len = bytes.len().min(32);
    B256::left_padding_from(&bytes[bytes.len() - len..])
}

/// Parses an address leniently, with the same rules as [`parse_hash`].
pub fn parse_address(value: &str) -> Address {
    let bytes = lenient_hex(value);
    let len = bytes.len().min(20);
    Address::left_padding_from(&bytes[bytes.len() - len..])
}

fn lenient_hex(value: &str) -> Vec<u8> {
    let stripped = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).unwrap_or(value);
    if stripped.len() % 2 == 1 {
        hex::decode(format!("0{stripped}")).unwrap_or_default()
    } else {
        hex::decode(stripped).unwrap_or_default()
    }
}
