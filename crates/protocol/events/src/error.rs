//! Errors raised while parsing execution-result events.

use thiserror::Error;

/// An error decoding the events of an execution result.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EventParseError {
    /// A numeric attribute is not a valid base-10 integer in range.
    #[error("invalid numeric attribute {key}: {value:?}")]
    InvalidNumber {
        /// The attribute key.
        key: &'static str,
        /// The offending value.
        value: String,
    },
    /// A hex attribute could not be decoded.
    #[error("invalid hex attribute {key}: {value:?}")]
    InvalidHex {
        /// The attribute key.
        key: &'static str,
        /// The offending value.
        value: String,
    },
    /// A legacy attribute is not valid base64.
    #[error("invalid base64 attribute: {0:?}")]
    InvalidBase64(String),
    /// A `tx_log` attribute does not hold a valid log.
    #[error("invalid tx log: {0}")]
    InvalidLog(String),
    /// A full `ethereum_tx` event of the split layout has no preceding short event.
    #[error("ethereum tx event {0} has no matching header event")]
    MissingHeaderEvent(usize),
    /// The execution result contains no Ethereum transaction at the requested position.
    #[error("ethereum tx not found in msgs: block {height}, index {index}")]
    TxNotFound {
        /// Height of the block.
        height: u64,
        /// Position of the Cosmos transaction in the block.
        index: u32,
    },
}
