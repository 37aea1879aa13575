#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod attributes;
pub use attributes::SYNTHETIC_TX_TYPE;

mod error;
pub use error::EventParseError;

mod parsed;
pub use parsed::{ParsedTx, ParsedTxs};

mod parser;
pub use parser::{EventFormat, parse_tx_result};

mod synthetic;
pub use synthetic::SyntheticFields;

mod logs;
pub use logs::{EventLog, all_tx_logs_from_events, parse_tx_logs, tx_logs_from_events};

mod indexer;
pub use indexer::{parse_tx_block_result, parse_tx_indexer_result};
