//! Errors for the `cometh-backend` crate.

use alloy_primitives::B256;
use cometh_events::EventParseError;
use thiserror::Error;

/// An error returned by one of the backend's collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request to the node failed.
    #[error("request failed: {0}")]
    Request(String),
    /// The node returned data that could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// An error raised while serving an Ethereum JSON-RPC request.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The requested block does not exist.
    #[error("block not found: {0}")]
    BlockNotFound(String),
    /// The requested Ethereum transaction does not exist.
    #[error("ethereum tx not found: {0}")]
    TxNotFound(B256),
    /// The block position of a non-synthetic transaction could not be resolved.
    #[error("can't find index of ethereum tx {0}")]
    TxIndexUnresolved(B256),
    /// A collaborator failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The events of an execution result are malformed.
    #[error(transparent)]
    Events(#[from] EventParseError),
    /// A reward percentile is out of range or not sorted.
    #[error("invalid reward percentile: {0}")]
    InvalidRewardPercentile(f64),
    /// More reward percentiles were requested than allowed.
    #[error("too many reward percentiles: {0}")]
    TooManyRewardPercentiles(usize),
    /// The requested block is above the chain head.
    #[error("requested block {requested} is beyond the current head {head}")]
    BlockBeyondHead {
        /// The requested height.
        requested: u64,
        /// The current head.
        head: u64,
    },
    /// The start of a block range is above its end.
    #[error("invalid block range: from {from} is greater than to {to}")]
    InvalidBlockRange {
        /// First block of the range.
        from: u64,
        /// Last block of the range.
        to: u64,
    },
    /// The block range of a log query is too wide.
    #[error("block range {requested} exceeds the limit of {cap}")]
    BlockRangeTooLarge {
        /// Number of blocks requested.
        requested: u64,
        /// Maximum number of blocks.
        cap: u64,
    },
    /// A log query matched too many logs.
    #[error("query returned more than {0} results")]
    TooManyLogs(usize),
    /// The fee market elasticity multiplier is zero.
    #[error("elasticity multiplier cannot be 0")]
    ZeroElasticity,
    /// A fee history worker panicked or was cancelled.
    #[error("fee history worker failed: {0}")]
    WorkerFailed(String),
    /// The genesis block has no parent state to trace against.
    #[error("genesis is not traceable")]
    GenesisNotTraceable,
    /// An RLP payload could not be decoded.
    #[error("invalid rlp: {0}")]
    Rlp(#[from] alloy_rlp::Error),
}

impl BackendError {
    /// Returns true if the error was caused by the request parameters.
    pub const fn is_invalid_params(&self) -> bool {
        matches!(
            self,
            Self::InvalidRewardPercentile(_) |
                Self::TooManyRewardPercentiles(_) |
                Self::BlockBeyondHead { .. } |
                Self::InvalidBlockRange { .. } |
                Self::BlockRangeTooLarge { .. } |
                Self::GenesisNotTraceable |
                Self::Rlp(_)
        )
    }
}
