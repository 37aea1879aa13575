//! `eth_feeHistory`, `eth_gasPrice` and the EIP-1559 base fee calculation.

use crate::{Backend, BackendError, ChainConfig, EthBlock, Metrics};
use alloy_consensus::Transaction;
use alloy_eips::{BlockId, BlockNumberOrTag, eip4844::calc_blob_gasprice};
use alloy_primitives::U256;
use alloy_rpc_types_eth::FeeHistory;
use cometh_primitives::{BlockResults, CometBlock};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::task::JoinSet;

/// Number of blocks processed concurrently by `eth_feeHistory`.
const FEE_HISTORY_CONCURRENCY: usize = 4;

/// Maximum number of reward percentiles of one request.
const MAX_REWARD_PERCENTILES: usize = 100;

/// Base fee of chains that have not activated EIP-1559.
const INITIAL_BASE_FEE: u64 = 1_000_000_000;

/// Parameters of the EVM fee market module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeMarketParams {
    /// Whether the base fee is disabled.
    pub no_base_fee: bool,
    /// Bounds the amount the base fee can change between blocks.
    pub base_fee_change_denominator: u32,
    /// Bounds the maximum gas limit an EIP-1559 block may have.
    pub elasticity_multiplier: u32,
    /// Height at which the base fee calculation is enabled.
    pub enable_height: u64,
    /// The base fee of the genesis block.
    pub base_fee: U256,
    /// Lowest gas price, in the smallest unit of the EVM denomination.
    pub min_gas_price: U256,
}

impl Default for FeeMarketParams {
    fn default() -> Self {
        Self {
            no_base_fee: false,
            base_fee_change_denominator: 8,
            elasticity_multiplier: 2,
            enable_height: 0,
            base_fee: U256::from(INITIAL_BASE_FEE),
            min_gas_price: U256::ZERO,
        }
    }
}

impl FeeMarketParams {
    /// Returns the minimum gas price scaled to 18 decimals.
    pub fn scaled_min_gas_price(&self, evm_coin_decimals: u8) -> U256 {
        let exponent = 18u8.saturating_sub(evm_coin_decimals);
        self.min_gas_price.saturating_mul(U256::from(10).pow(U256::from(exponent)))
    }
}

/// Computes the base fee of the block following a parent block.
///
/// The fee moves towards the gas target, `gas_limit / elasticity_multiplier`, by at most
/// `1 / base_fee_change_denominator` per block, and never drops below the minimum gas
/// price.
pub fn calc_base_fee(
    chain: &ChainConfig,
    parent: &EthBlock,
    params: &FeeMarketParams,
    evm_coin_decimals: u8,
) -> Result<U256, BackendError> {
    if !chain.is_london(parent.number()) {
        return Ok(U256::from(INITIAL_BASE_FEE));
    }
    if params.elasticity_multiplier == 0 {
        return Err(BackendError::ZeroElasticity);
    }

    let parent_base_fee = parent.base_fee.unwrap_or_default();
    let gas_used = parent.header.gas_used;
    let gas_target = parent.header.gas_limit / u64::from(params.elasticity_multiplier);
    let denominator = U256::from(params.base_fee_change_denominator);
    if gas_used == gas_target || gas_target == 0 || denominator.is_zero() {
        return Ok(parent_base_fee);
    }

    let target = U256::from(gas_target);
    if gas_used > gas_target {
        let delta = parent_base_fee * U256::from(gas_used - gas_target) / target / denominator;
        return Ok(parent_base_fee + delta.max(U256::from(1)));
    }

    let delta = parent_base_fee * U256::from(gas_target - gas_used) / target / denominator;
    let floor = params.scaled_min_gas_price(evm_coin_decimals);
    Ok(parent_base_fee.saturating_sub(delta).max(floor))
}

/// Returns `numerator / denominator`, or zero if either is zero.
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if numerator == 0 || denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Fee data of one block of an `eth_feeHistory` response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneFeeHistory {
    /// Base fee of the block.
    pub base_fee: u128,
    /// Base fee of the following block.
    pub next_base_fee: u128,
    /// Effective priority fee per gas at each requested percentile.
    pub reward: Vec<u128>,
    /// Ratio of gas used to the gas limit.
    pub gas_used_ratio: f64,
    /// Blob base fee of the block.
    pub blob_base_fee: u128,
    /// Blob base fee of the following block.
    pub next_blob_base_fee: u128,
    /// Ratio of blob gas used to the blob gas limit.
    pub blob_gas_used_ratio: f64,
}

/// Returns the priority fee per gas a transaction pays above `base_fee`, zero if its fee
/// cap does not cover the base fee.
fn effective_tip<T: Transaction>(tx: &T, base_fee: u128) -> u128 {
    let Some(tip) = tx.max_fee_per_gas().checked_sub(base_fee) else {
        return 0;
    };
    tx.max_priority_fee_per_gas().map_or(tip, |priority| priority.min(tip))
}

/// Validates reward percentiles: each within `[0, 100]`, in non-decreasing order.
fn validate_percentiles(percentiles: &[f64]) -> Result<(), BackendError> {
    if percentiles.len() > MAX_REWARD_PERCENTILES {
        return Err(BackendError::TooManyRewardPercentiles(percentiles.len()));
    }
    let mut last = 0.0;
    for &p in percentiles {
        if !(0.0..=100.0).contains(&p) || p < last {
            return Err(BackendError::InvalidRewardPercentile(p));
        }
        last = p;
    }
    Ok(())
}

impl Backend {
    /// Computes the fee data of one block.
    pub(crate) async fn process_fee_block(
        &self,
        block: &CometBlock,
        eth_block: &EthBlock,
        results: &BlockResults,
        percentiles: &[f64],
    ) -> Result<OneFeeHistory, BackendError> {
        let height = eth_block.number();
        let chain = &self.config.chain;
        let base_fee = eth_block.base_fee.unwrap_or_default();

        let mut one = OneFeeHistory {
            base_fee: base_fee.saturating_to(),
            gas_used_ratio: ratio(eth_block.header.gas_used, eth_block.header.gas_limit),
            ..Default::default()
        };

        if chain.is_london(height + 1) {
            let params = self.query.fee_market_params(height).await?;
            let next = calc_base_fee(chain, eth_block, &params, self.config.evm_coin_decimals)?;
            one.next_base_fee = next.saturating_to();
        }

        // No blob transactions are executed, so the excess blob gas stays zero.
        if chain.is_cancun(height) {
            one.blob_base_fee = calc_blob_gasprice(0);
        }
        if chain.is_cancun(height + 1) {
            one.next_blob_base_fee = calc_blob_gasprice(0);
        }

        if percentiles.is_empty() {
            return Ok(one);
        }
        one.reward = vec![0; percentiles.len()];

        // A base fee beyond u128 exceeds every fee cap, which leaves no tip either way.
        let base_fee: u128 = base_fee.saturating_to();
        let mut sorter = Vec::new();
        for (raw, result) in block.txs.iter().zip(&results.txs_results) {
            let Some(tx) = self.decode_tx(raw) else { continue };
            for msg in tx.ethereum_msgs() {
                let reward = effective_tip(&msg.tx, base_fee);
                sorter.push((result.gas_used, reward));
            }
        }
        if sorter.is_empty() {
            return Ok(one);
        }
        sorter.sort_by_key(|(_, reward)| *reward);

        let block_gas_used = eth_block.header.gas_used as f64;
        let mut tx_index = 0;
        let mut sum_gas_used = sorter[0].0;
        for (slot, p) in one.reward.iter_mut().zip(percentiles) {
            let threshold = (block_gas_used * p / 100.0) as u64;
            while sum_gas_used < threshold && tx_index < sorter.len() - 1 {
                tx_index += 1;
                sum_gas_used += sorter[tx_index].0;
            }
            *slot = sorter[tx_index].1;
        }
        Ok(one)
    }

    async fn fee_history_block(
        &self,
        height: u64,
        percentiles: &[f64],
    ) -> Result<OneFeeHistory, BackendError> {
        let Some((block, results)) = self.load_block(BlockId::number(height)).await? else {
            return Err(BackendError::BlockNotFound(height.to_string()));
        };
        let eth_block = self.eth_block(&block, &results).await;
        self.process_fee_block(&block, &eth_block, &results, percentiles).await
    }

    /// Returns the fee history of up to `block_count` blocks ending at `last_block`.
    ///
    /// Blocks are processed in waves of four concurrent workers. The first failure of a
    /// wave fails the request once every worker of the wave has finished.
    pub async fn fee_history(
        &self,
        block_count: u64,
        last_block: BlockNumberOrTag,
        reward_percentiles: Option<Vec<f64>>,
    ) -> Result<FeeHistory, BackendError> {
        let started = Instant::now();
        let result = self.compute_fee_history(block_count, last_block, reward_percentiles).await;
        Metrics::record_fee_history(started, &result);
        result
    }

    async fn compute_fee_history(
        &self,
        block_count: u64,
        last_block: BlockNumberOrTag,
        reward_percentiles: Option<Vec<f64>>,
    ) -> Result<FeeHistory, BackendError> {
        let percentiles = reward_percentiles.unwrap_or_default();
        validate_percentiles(&percentiles)?;

        let head = self.block_number().await?;
        let end = self.resolve_height(last_block).await?;
        if end > head {
            return Err(BackendError::BlockBeyondHead { requested: end, head });
        }

        // CometBFT serves no block 0, so the window starts at height 1 at the earliest.
        let count = block_count.min(self.config.fee_history_cap).min(end);
        if count == 0 {
            return Ok(FeeHistory::default());
        }
        let start = end + 1 - count;

        let mut slots: Vec<Option<OneFeeHistory>> = vec![None; count as usize];
        let percentiles: std::sync::Arc<[f64]> = percentiles.into();
        let positions: Vec<usize> = (0..slots.len()).collect();
        for wave in positions.chunks(FEE_HISTORY_CONCURRENCY) {
            let mut workers = JoinSet::new();
            for &slot in wave {
                let backend = self.clone();
                let percentiles = percentiles.clone();
                let height = start + slot as u64;
                workers.spawn(async move {
                    (slot, backend.fee_history_block(height, &percentiles).await)
                });
            }

            let mut failure = None;
            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok((slot, Ok(one))) => slots[slot] = Some(one),
                    Ok((slot, Err(err))) => {
                        warn!(target: "cometh::fee_history", height = start + slot as u64, %err, "fee history worker failed");
                        failure.get_or_insert(err);
                    }
                    Err(err) => {
                        error!(target: "cometh::fee_history", %err, "fee history worker panicked");
                        failure.get_or_insert(BackendError::WorkerFailed(err.to_string()));
                    }
                }
            }
            if let Some(err) = failure {
                return Err(err);
            }
        }

        let blocks = slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| BackendError::WorkerFailed("missing result".into())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assemble_fee_history(start, &blocks, !percentiles.is_empty()))
    }

    /// Suggests a gas price: the latest base fee plus a tip, never below the minimum gas
    /// price.
    pub async fn gas_price(&self) -> Result<U256, BackendError> {
        let head = self.block_number().await?;
        let params = self.query.fee_market_params(head).await?;
        let min_gas_price = params.scaled_min_gas_price(self.config.evm_coin_decimals);

        let base_fee = match self.comet.block_results(head).await {
            Ok(results) => self.base_fee_or_unknown(&results).await,
            Err(err) => {
                debug!(target: "cometh::backend", height = head, %err, "failed to fetch block results");
                None
            }
        };
        let price = match base_fee {
            Some(base_fee) => base_fee + suggest_tip(base_fee, &params),
            None => min_gas_price,
        };
        Ok(price.max(min_gas_price))
    }

    /// Suggests a priority fee for the latest block.
    pub async fn max_priority_fee_per_gas(&self) -> Result<U256, BackendError> {
        let head = self.block_number().await?;
        let results = self.comet.block_results(head).await?;
        let Some(base_fee) = self.base_fee_or_unknown(&results).await else {
            return Ok(U256::ZERO);
        };
        let params = self.query.fee_market_params(head).await?;
        Ok(suggest_tip(base_fee, &params))
    }
}

/// The largest base fee increase of one block, reached when the block is full.
fn suggest_tip(base_fee: U256, params: &FeeMarketParams) -> U256 {
    if params.no_base_fee || params.base_fee_change_denominator == 0 {
        return U256::ZERO;
    }
    let multiplier = U256::from(params.elasticity_multiplier.saturating_sub(1));
    base_fee * multiplier / U256::from(params.base_fee_change_denominator)
}

fn assemble_fee_history(start: u64, blocks: &[OneFeeHistory], with_rewards: bool) -> FeeHistory {
    let next = blocks.last().cloned().unwrap_or_default();
    FeeHistory {
        base_fee_per_gas: blocks
            .iter()
            .map(|one| one.base_fee)
            .chain(std::iter::once(next.next_base_fee))
            .collect(),
        gas_used_ratio: blocks.iter().map(|one| one.gas_used_ratio).collect(),
        base_fee_per_blob_gas: blocks
            .iter()
            .map(|one| one.blob_base_fee)
            .chain(std::iter::once(next.next_blob_base_fee))
            .collect(),
        blob_gas_used_ratio: blocks.iter().map(|one| one.blob_gas_used_ratio).collect(),
        oldest_block: start,
        reward: with_rewards.then(|| blocks.iter().map(|one| one.reward.clone()).collect()),
    }
}
