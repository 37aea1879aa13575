//! Block logs, their renumbering and `eth_getLogs`.

use crate::{Backend, BackendError, Metrics};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::{B256, BLOOM_SIZE_BYTES, Bloom, hex};
use alloy_rpc_types_eth::{Filter, FilterBlockOption, Log};
use base64::{Engine as _, engine::general_purpose};
use cometh_events::{
    all_tx_logs_from_events,
    attributes::{ATTRIBUTE_KEY_BLOOM, EVENT_TYPE_BLOCK_BLOOM, decode_attributes},
};
use cometh_primitives::{BlockResults, Event};

/// The logs of one Ethereum transaction.
pub type TxLogs = Vec<Log>;

/// The logs of a block, grouped by execution result and transaction.
///
/// Some node versions numbered logs per Cosmos transaction instead of per block. Such
/// blocks are renumbered on load: transaction indices count the groups and log indices
/// count the logs of the whole block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockLogs {
    /// `results[tx_index][position]` holds the logs of one Ethereum transaction.
    results: Vec<Vec<TxLogs>>,
    reindexed: bool,
}

impl BlockLogs {
    /// Decodes the logs of every execution result of a block.
    pub fn from_results(results: &BlockResults) -> Result<Self, BackendError> {
        let results = results
            .txs_results
            .iter()
            .map(|result| all_tx_logs_from_events(&result.events))
            .collect::<Result<Vec<_>, _>>()?;
        let mut logs = Self { results, reindexed: false };
        if logs.needs_reindexing() {
            logs.reindex();
        }
        Ok(logs)
    }

    /// Returns true if the block logs were renumbered.
    pub const fn reindexed(&self) -> bool {
        self.reindexed
    }

    /// Returns the log groups in block order.
    pub fn groups(&self) -> impl Iterator<Item = &TxLogs> {
        self.results.iter().flatten()
    }

    /// Returns every log in block order.
    pub fn logs(&self) -> impl Iterator<Item = &Log> {
        self.groups().flatten()
    }

    /// Returns the logs of the transaction at `position` of the execution result at
    /// `tx_index`.
    pub fn tx_logs(&self, tx_index: u32, position: usize) -> &[Log] {
        self.results
            .get(tx_index as usize)
            .and_then(|groups| groups.get(position))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the bloom of every log of the block.
    pub fn bloom(&self) -> Bloom {
        logs_bloom(self.logs())
    }

    /// Sets the block hash and number on every log.
    pub fn stamp(&mut self, block_hash: B256, block_number: u64) {
        for log in self.results.iter_mut().flatten().flatten() {
            log.block_hash = Some(block_hash);
            log.block_number = Some(block_number);
        }
    }

    /// Logs are well numbered when the groups' transaction indices strictly increase and
    /// log indices strictly increase across the block.
    fn needs_reindexing(&self) -> bool {
        let mut last_tx_index = None;
        let mut last_index = None;
        for group in self.groups() {
            let Some(first) = group.first() else { continue };
            let tx_index = first.transaction_index.unwrap_or_default();
            if last_tx_index.is_some_and(|last| tx_index <= last) {
                return true;
            }
            last_tx_index = Some(tx_index);

            for log in group {
                let index = log.log_index.unwrap_or_default();
                if last_index.is_some_and(|last| index <= last) {
                    return true;
                }
                last_index = Some(index);
            }
        }
        false
    }

    fn reindex(&mut self) {
        let mut index = 0;
        for (tx_index, group) in self.results.iter_mut().flatten().enumerate() {
            for log in group {
                log.transaction_index = Some(tx_index as u64);
                log.log_index = Some(index);
                index += 1;
            }
        }
        self.reindexed = true;
        Metrics::record_logs_reindexed();
    }
}

/// Returns the bloom of the given logs.
pub(crate) fn logs_bloom<'a>(logs: impl IntoIterator<Item = &'a Log>) -> Bloom {
    let mut bloom = Bloom::ZERO;
    for log in logs {
        bloom.accrue_log(&log.inner);
    }
    bloom
}

/// Reads the block bloom emitted in the finalize events, if any.
///
/// The bloom is hex encoded, base64 encoded, or raw bytes depending on the node version.
pub(crate) fn bloom_from_events(events: &[Event]) -> Option<Bloom> {
    events.iter().filter(|event| event.kind == EVENT_TYPE_BLOCK_BLOOM).find_map(|event| {
        let attrs = decode_attributes(&event.attributes).ok()?;
        let value = &attrs.iter().find(|attr| attr.key == ATTRIBUTE_KEY_BLOOM)?.value;
        decode_bloom(value)
    })
}

fn decode_bloom(value: &str) -> Option<Bloom> {
    let bytes = match value.strip_prefix("0x") {
        Some(encoded) => hex::decode(encoded).ok()?,
        None => general_purpose::STANDARD
            .decode(value)
            .ok()
            .filter(|bytes| bytes.len() == BLOOM_SIZE_BYTES)
            .unwrap_or_else(|| value.as_bytes().to_vec()),
    };
    <[u8; BLOOM_SIZE_BYTES]>::try_from(bytes.as_slice()).ok().map(Bloom::from)
}

/// Returns true if the log matches the address and topic criteria of the filter.
fn matches_filter(filter: &Filter, log: &Log) -> bool {
    filter.address.matches(&log.address()) &&
        filter.topics.iter().enumerate().all(|(i, topics)| {
            topics.is_empty() || log.topics().get(i).is_some_and(|topic| topics.matches(topic))
        })
}

impl Backend {
    /// Returns the logs of a block, renumbered if needed and stamped with the block id.
    pub(crate) fn block_logs(
        &self,
        block_hash: B256,
        results: &BlockResults,
    ) -> Result<BlockLogs, BackendError> {
        let mut logs = BlockLogs::from_results(results)?;
        if logs.reindexed() {
            debug!(target: "cometh::backend", height = results.height, "renumbered block logs");
        }
        logs.stamp(block_hash, results.height);
        Ok(logs)
    }

    /// Returns the logs of every Ethereum transaction of a block, in block order.
    pub async fn logs_by_block(&self, id: BlockId) -> Result<Option<Vec<TxLogs>>, BackendError> {
        let Some((block, results)) = self.load_block(id).await? else {
            return Ok(None);
        };
        let logs = self.block_logs(block.hash, &results)?;
        Ok(Some(logs.groups().cloned().collect()))
    }

    /// Returns the logs matching a filter.
    pub async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, BackendError> {
        let (from, to) = match filter.block_option {
            FilterBlockOption::AtBlockHash(hash) => {
                let Some((block, results)) = self.load_block(BlockId::from(hash)).await? else {
                    return Err(BackendError::BlockNotFound(hash.to_string()));
                };
                let logs = self.block_logs(block.hash, &results)?;
                return self.collect_logs(filter, logs.logs(), Vec::new());
            }
            FilterBlockOption::Range { from_block, to_block } => {
                let head = self.block_number().await?;
                let from = self.resolve_height(from_block.unwrap_or(BlockNumberOrTag::Latest)).await?;
                let to = self.resolve_height(to_block.unwrap_or(BlockNumberOrTag::Latest)).await?;
                (from, to.min(head))
            }
        };

        if from > to {
            return Err(BackendError::InvalidBlockRange { from, to });
        }
        let requested = to - from + 1;
        if requested > self.config.block_range_cap {
            return Err(BackendError::BlockRangeTooLarge {
                requested,
                cap: self.config.block_range_cap,
            });
        }

        let mut matched = Vec::new();
        for height in from..=to {
            let Some((block, results)) = self.load_block(BlockId::number(height)).await? else {
                continue;
            };
            let logs = self.block_logs(block.hash, &results)?;
            matched = self.collect_logs(filter, logs.logs(), matched)?;
        }
        Ok(matched)
    }

    fn collect_logs<'a>(
        &self,
        filter: &Filter,
        logs: impl Iterator<Item = &'a Log>,
        mut matched: Vec<Log>,
    ) -> Result<Vec<Log>, BackendError> {
        for log in logs.filter(|log| matches_filter(filter, log)) {
            if matched.len() >= self.config.logs_cap {
                return Err(BackendError::TooManyLogs(self.config.logs_cap));
            }
            matched.push(log.clone());
        }
        Ok(matched)
    }
}
