//! Projects parsed transactions into transaction indexer records.

use crate::{EventParseError, ParsedTxs, SyntheticFields, parse_tx_result};
use cometh_primitives::{CosmosTx, ExecTxResult, TxResult, TxSearchResult};

fn project(
    txs: &ParsedTxs,
    position: usize,
    height: u64,
    tx_index: u32,
) -> Option<(TxResult, Option<SyntheticFields>)> {
    let parsed = txs.tx_by_msg_index(position)?;
    let record = TxResult {
        height,
        tx_index,
        msg_index: parsed.msg_index.and_then(|i| u32::try_from(i).ok()),
        eth_tx_index: parsed.eth_tx_index,
        failed: parsed.failed,
        gas_used: parsed.gas_used,
        cumulative_gas_used: txs.accumulative_gas_used(position),
    };
    let synthetic = parsed.is_synthetic().then(|| SyntheticFields::from(parsed));
    Some((record, synthetic))
}

/// Builds the indexer record of a transaction returned by a `tx_search` query.
///
/// `select` picks the position of the wanted transaction among the parsed ones.
pub fn parse_tx_indexer_result(
    search: &TxSearchResult,
    cosmos_tx: Option<&CosmosTx>,
    select: impl FnOnce(&ParsedTxs) -> Option<usize>,
) -> Result<(TxResult, Option<SyntheticFields>), EventParseError> {
    let txs = parse_tx_result(&search.result, cosmos_tx)?;
    select(&txs)
        .and_then(|position| project(&txs, position, search.height, search.index))
        .ok_or(EventParseError::TxNotFound { height: search.height, index: search.index })
}

/// Builds the indexer record of the first Ethereum transaction of an execution result.
pub fn parse_tx_block_result(
    result: &ExecTxResult,
    cosmos_tx: Option<&CosmosTx>,
    tx_index: u32,
    height: u64,
) -> Result<(TxResult, Option<SyntheticFields>), EventParseError> {
    let txs = parse_tx_result(result, cosmos_tx)?;
    project(&txs, 0, height, tx_index).ok_or(EventParseError::TxNotFound { height, index: tx_index })
}
