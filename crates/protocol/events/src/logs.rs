//! Decoding of `tx_log` events.

use crate::{
    EventParseError,
    attributes::{self, ATTRIBUTE_KEY_TX_LOG, EVENT_TYPE_TX_LOG},
};
use alloy_primitives::{Bytes, Log as PrimitiveLog};
use alloy_rpc_types_eth::Log;
use base64::{Engine as _, engine::general_purpose};
use cometh_primitives::Event;
use serde::{Deserialize, Serialize};

/// A log as serialized by the EVM module into a `txLog` attribute.
///
/// Byte data is base64 encoded and keys are snake case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLog {
    /// Emitting contract.
    pub address: String,
    /// Indexed topics.
    pub topics: Vec<String>,
    /// Base64 encoded data.
    pub data: String,
    /// Number of the block.
    pub block_number: u64,
    /// Ethereum transaction hash.
    pub tx_hash: String,
    /// Position of the transaction in the block.
    pub tx_index: u64,
    /// Hash of the block.
    pub block_hash: String,
    /// Position of the log in the block.
    pub index: u64,
    /// Whether the log was reverted.
    pub removed: bool,
}

impl EventLog {
    /// Decodes the log into its RPC representation.
    pub fn into_log(self) -> Result<Log, EventParseError> {
        let data = general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|err| EventParseError::InvalidLog(err.to_string()))?;
        let topics = self.topics.iter().map(|topic| attributes::parse_hash(topic)).collect();
        Ok(Log {
            inner: PrimitiveLog::new_unchecked(
                attributes::parse_address(&self.address),
                topics,
                Bytes::from(data),
            ),
            block_hash: Some(attributes::parse_hash(&self.block_hash)),
            block_number: Some(self.block_number),
            block_timestamp: None,
            transaction_hash: Some(attributes::parse_hash(&self.tx_hash)),
            transaction_index: Some(self.tx_index),
            log_index: Some(self.index),
            removed: self.removed,
        })
    }
}

impl From<&Log> for EventLog {
    fn from(log: &Log) -> Self {
        Self {
            address: log.address().to_string(),
            topics: log.topics().iter().map(ToString::to_string).collect(),
            data: general_purpose::STANDARD.encode(log.data().data.as_ref()),
            block_number: log.block_number.unwrap_or_default(),
            tx_hash: log.transaction_hash.unwrap_or_default().to_string(),
            tx_index: log.transaction_index.unwrap_or_default(),
            block_hash: log.block_hash.unwrap_or_default().to_string(),
            index: log.log_index.unwrap_or_default(),
            removed: log.removed,
        }
    }
}

/// Decodes every log of a single `tx_log` event.
pub fn parse_tx_logs(event: &Event) -> Result<Vec<Log>, EventParseError> {
    event
        .attributes
        .iter()
        .filter(|attr| attr.key == ATTRIBUTE_KEY_TX_LOG)
        .map(|attr| {
            serde_json::from_str::<EventLog>(&attr.value)
                .map_err(|err| EventParseError::InvalidLog(err.to_string()))?
                .into_log()
        })
        .collect()
}

/// Decodes the logs of every `tx_log` event, one group per Ethereum transaction.
pub fn all_tx_logs_from_events(events: &[Event]) -> Result<Vec<Vec<Log>>, EventParseError> {
    events.iter().filter(|event| event.kind == EVENT_TYPE_TX_LOG).map(parse_tx_logs).collect()
}

/// Decodes the logs of the Ethereum transaction at `position` in the execution result.
/// A transaction without a `tx_log` event has no logs.
pub fn tx_logs_from_events(
    events: &[Event],
    position: usize,
) -> Result<Vec<Log>, EventParseError> {
    events
        .iter()
        .filter(|event| event.kind == EVENT_TYPE_TX_LOG)
        .nth(position)
        .map_or_else(|| Ok(Vec::new()), parse_tx_logs)
}
