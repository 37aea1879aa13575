//! Transaction and receipt lookups.

use crate::{
    Backend, BackendError, BlockLogs, BlockTx, Metrics, format::effective_gas_price,
    logs::logs_bloom, new_rpc_transaction,
};
use alloy_consensus::Transaction;
use alloy_eips::{BlockId, Typed2718};
use alloy_primitives::{B256, U256};
use cometh_events::{
    EventParseError, ParsedTxs, SyntheticFields,
    attributes::{ATTRIBUTE_KEY_ETHEREUM_TX_HASH, ATTRIBUTE_KEY_TX_INDEX, EVENT_TYPE_ETHEREUM_TX},
    parse_tx_indexer_result, parse_tx_result,
};
use cometh_primitives::{
    BlockResults, CometBlock, CosmosMsg, RpcReceipt, RpcTransaction, TxResult,
};

/// An Ethereum transaction resolved to its block.
#[derive(Debug)]
pub(crate) struct Located {
    pub(crate) block: CometBlock,
    pub(crate) results: BlockResults,
    pub(crate) tx: BlockTx,
    pub(crate) eth_tx_index: u64,
}

fn hash_query(hash: B256) -> String {
    format!("{EVENT_TYPE_ETHEREUM_TX}.{ATTRIBUTE_KEY_ETHEREUM_TX_HASH}='{hash}'")
}

fn index_query(height: u64, index: u32) -> String {
    format!("tx.height={height} AND {EVENT_TYPE_ETHEREUM_TX}.{ATTRIBUTE_KEY_TX_INDEX}={index}")
}

impl Backend {
    /// Runs a `tx_search` query and builds the record of the selected transaction of the
    /// first match.
    async fn search_tx_record(
        &self,
        query: String,
        select: impl FnOnce(&ParsedTxs) -> Option<usize>,
    ) -> Result<Option<TxResult>, BackendError> {
        Metrics::record_tx_search_fallback();
        let found = self.comet.tx_search(query).await?;
        let Some(search) = found.first() else {
            return Ok(None);
        };
        if !search.result.is_success_or_expected_failure() {
            debug!(target: "cometh::backend", height = search.height, "invalid ethereum tx");
            return Ok(None);
        }

        // Only a failed result needs the decoded messages, to charge their gas limits.
        let cosmos_tx =
            if search.result.is_success() { None } else { self.decode_tx(&search.tx) };
        match parse_tx_indexer_result(search, cosmos_tx.as_ref(), select) {
            Ok((record, _)) => Ok(Some(record)),
            Err(EventParseError::TxNotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns the indexer record of an Ethereum transaction.
    pub(crate) async fn tx_record_by_hash(&self, hash: B256) -> Result<Option<TxResult>, BackendError> {
        if let Some(indexer) = &self.indexer {
            match indexer.get_by_tx_hash(hash) {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => {}
                Err(err) => debug!(target: "cometh::backend", %hash, %err, "tx indexer lookup failed"),
            }
        }
        self.search_tx_record(hash_query(hash), |txs| txs.position(&hash)).await
    }

    /// Returns the indexer record of the Ethereum transaction at `index` of a block.
    async fn tx_record_by_index(
        &self,
        height: u64,
        index: u32,
    ) -> Result<Option<TxResult>, BackendError> {
        if let Some(indexer) = &self.indexer {
            match indexer.get_by_block_and_index(height, index) {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => {}
                Err(err) => {
                    debug!(target: "cometh::backend", height, index, %err, "tx indexer lookup failed")
                }
            }
        }
        self.search_tx_record(index_query(height, index), |txs| txs.position_by_tx_index(index))
            .await
    }

    /// Rebuilds a transaction the block scan missed, from the execution result the
    /// record points at.
    fn recover_tx(
        &self,
        block: &CometBlock,
        results: &BlockResults,
        record: &TxResult,
        hash: B256,
    ) -> Result<Option<BlockTx>, BackendError> {
        let tx_index = record.tx_index;
        let (Some(raw), Some(result)) =
            (block.txs.get(tx_index as usize), results.txs_results.get(tx_index as usize))
        else {
            return Ok(None);
        };
        let cosmos_tx = self.decode_tx(raw);
        let parsed = parse_tx_result(result, cosmos_tx.as_ref())?;
        let Some(position) = parsed.position(&hash) else {
            return Ok(None);
        };

        let tx = match record.msg_index {
            Some(msg_index) => cosmos_tx
                .as_ref()
                .and_then(|tx| tx.msg(msg_index as usize))
                .and_then(CosmosMsg::as_ethereum)
                .map(|msg| {
                    BlockTx::from_result(
                        msg.clone(),
                        None,
                        tx_index,
                        Some(position),
                        position,
                        &parsed,
                        result,
                    )
                }),
            None => parsed.txs().get(position).filter(|tx| tx.is_synthetic()).map(|tx| {
                let fields = SyntheticFields::from(tx);
                BlockTx::from_result(
                    fields.to_msg(),
                    Some(fields),
                    tx_index,
                    Some(position),
                    position,
                    &parsed,
                    result,
                )
            }),
        };
        Ok(tx)
    }

    /// Resolves an indexer record to the transaction with the given hash.
    pub(crate) async fn locate(&self, record: TxResult, hash: B256) -> Result<Option<Located>, BackendError> {
        let Some((block, results)) = self.load_block(BlockId::number(record.height)).await? else {
            return Ok(None);
        };

        let mut txs = self.block_txs(&block, &results);
        let scanned = txs.iter().position(|tx| tx.hash() == hash);
        let tx = match scanned {
            Some(position) => txs.swap_remove(position),
            None => match self.recover_tx(&block, &results, &record, hash)? {
                Some(tx) => tx,
                None => {
                    debug!(target: "cometh::backend", %hash, height = record.height, "tx not found in block");
                    return Ok(None);
                }
            },
        };

        let eth_tx_index = match (record.eth_tx_index, scanned) {
            (Some(index), _) => u64::from(index),
            (None, Some(position)) => tx.eth_index(position),
            (None, None) if tx.is_synthetic() => 0,
            (None, None) => return Err(BackendError::TxIndexUnresolved(hash)),
        };
        Ok(Some(Located { block, results, tx, eth_tx_index }))
    }

    async fn locate_by_hash(&self, hash: B256) -> Result<Option<Located>, BackendError> {
        let Some(record) = self.tx_record_by_hash(hash).await? else {
            return Ok(None);
        };
        self.locate(record, hash).await
    }

    /// Returns the Ethereum transaction with the given hash.
    ///
    /// Pending transactions are never returned.
    pub async fn transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<RpcTransaction>, BackendError> {
        let Some(located) = self.locate_by_hash(hash).await? else {
            return Ok(None);
        };
        let base_fee = self.base_fee_or_unknown(&located.results).await;
        Ok(Some(new_rpc_transaction(
            &located.tx,
            located.block.hash,
            located.block.height(),
            located.eth_tx_index,
            base_fee,
            self.chain_id(),
        )))
    }

    /// Returns the Ethereum transaction at `index` of a block.
    pub async fn transaction_by_block_and_index(
        &self,
        id: BlockId,
        index: u64,
    ) -> Result<Option<RpcTransaction>, BackendError> {
        let Some((block, results)) = self.load_block(id).await? else {
            return Ok(None);
        };
        let mut txs = self.block_txs(&block, &results);

        let indexed = match u32::try_from(index) {
            Ok(index) => self.tx_record_by_index(block.height(), index).await?,
            Err(_) => None,
        };
        let hash = indexed.and_then(|record| {
            let raw = block.txs.get(record.tx_index as usize)?;
            let result = results.txs_results.get(record.tx_index as usize)?;
            let parsed = parse_tx_result(result, self.decode_tx(raw).as_ref()).ok()?;
            Some(parsed.tx_by_tx_index(u32::try_from(index).ok()?)?.hash)
        });

        let position = match hash.and_then(|hash| txs.iter().position(|tx| tx.hash() == hash)) {
            Some(position) => position,
            None if (index as usize) < txs.len() => index as usize,
            None => return Ok(None),
        };
        let tx = txs.swap_remove(position);
        let base_fee = self.base_fee_or_unknown(&results).await;
        Ok(Some(new_rpc_transaction(
            &tx,
            block.hash,
            block.height(),
            index,
            base_fee,
            self.chain_id(),
        )))
    }

    /// Assembles the receipt of a block transaction.
    fn assemble_receipt(
        &self,
        block: &CometBlock,
        results: &BlockResults,
        logs: &BlockLogs,
        tx: &BlockTx,
        eth_tx_index: u64,
        base_fee: Option<U256>,
    ) -> RpcReceipt {
        let preceding: u64 = results
            .txs_results
            .iter()
            .take(tx.tx_index as usize)
            .map(|result| result.gas_used)
            .sum();
        let tx_logs = logs.tx_logs(tx.tx_index, tx.position);
        let envelope = &tx.msg.tx;

        let (tx_type, contract_address) = match &tx.synthetic {
            Some(fields) => (fields.tx_type, None),
            None => (
                u64::from(envelope.ty()),
                envelope.is_create().then(|| tx.msg.from.create(envelope.nonce())),
            ),
        };

        RpcReceipt {
            status: u64::from(!tx.failed),
            cumulative_gas_used: preceding + tx.cumulative_gas_used,
            logs_bloom: logs_bloom(tx_logs),
            logs: tx_logs.to_vec(),
            transaction_hash: tx.hash(),
            contract_address,
            gas_used: tx.gas_used,
            block_hash: block.hash,
            block_number: block.height(),
            transaction_index: eth_tx_index,
            from: tx.msg.from,
            to: envelope.to(),
            tx_type,
            effective_gas_price: effective_gas_price(tx, base_fee),
        }
    }

    /// Returns the receipt of the Ethereum transaction with the given hash.
    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<RpcReceipt>, BackendError> {
        let Some(located) = self.locate_by_hash(hash).await? else {
            return Ok(None);
        };
        let logs = self.block_logs(located.block.hash, &located.results)?;
        let base_fee = self.base_fee_or_unknown(&located.results).await;
        Ok(Some(self.assemble_receipt(
            &located.block,
            &located.results,
            &logs,
            &located.tx,
            located.eth_tx_index,
            base_fee,
        )))
    }

    /// Returns the receipts of every Ethereum transaction of a block.
    pub async fn block_receipts(&self, id: BlockId) -> Result<Option<Vec<RpcReceipt>>, BackendError> {
        let Some((block, results)) = self.load_block(id).await? else {
            return Ok(None);
        };
        let logs = self.block_logs(block.hash, &results)?;
        let base_fee = self.base_fee_or_unknown(&results).await;
        let receipts = self
            .block_txs(&block, &results)
            .iter()
            .enumerate()
            .map(|(i, tx)| {
                self.assemble_receipt(&block, &results, &logs, tx, tx.eth_index(i), base_fee)
            })
            .collect();
        Ok(Some(receipts))
    }
}
