#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod comet;
pub use comet::{
    BlockParams, BlockResults, CometBlock, CometHeader, ConsensusParams, Event, EventAttribute,
    ExecTxResult, TxSearchResult,
};

mod outcome;
pub use outcome::{
    BLOCK_GAS_EXCEEDED_LOG, NO_BLOCK_GAS_LEFT_LOG, OUT_OF_GAS_CODE, STATE_DB_COMMIT_FAILED_LOG,
};

mod cosmos;
pub use cosmos::{CosmosMsg, CosmosTx, MsgEthereumTx};

mod indexer;
pub use indexer::TxResult;

mod rpc;
pub use rpc::{RpcBlock, RpcReceipt, RpcTransaction};
