//! Test fixtures for the backend: a small in-memory chain behind mocked collaborators.

use crate::{
    Backend, BackendConfig, BlockTx, ClientError, FeeMarketParams, MockCometClient,
    MockQueryClient, TxDecoder, TxIndexer,
};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_primitives::{
    Address, B256, Bytes, Log as PrimitiveLog, Signature, TxKind, U256, address, keccak256,
};
use alloy_rpc_types_eth::Log;
use cometh_events::{EventLog, SYNTHETIC_TX_TYPE, SyntheticFields};
use cometh_primitives::{
    BlockParams, BlockResults, CometBlock, CometHeader, ConsensusParams, CosmosMsg, CosmosTx,
    Event, ExecTxResult, MsgEthereumTx, TxResult, TxSearchResult,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

const RECIPIENT: Address = address!("0x00000000000000000000000000000000000000bb");

fn signature() -> Signature {
    Signature::new(U256::from(1), U256::from(2), false)
}

/// A signed dynamic fee transfer.
pub(crate) fn signed_eip1559(from: Address, nonce: u64, max_fee: u128, tip: u128) -> MsgEthereumTx {
    let tx = TxEip1559 {
        chain_id: 9000,
        nonce,
        gas_limit: 21_000,
        max_fee_per_gas: max_fee,
        max_priority_fee_per_gas: tip,
        to: TxKind::Call(RECIPIENT),
        value: U256::from(1),
        access_list: Default::default(),
        input: Bytes::new(),
    };
    MsgEthereumTx::new(TxEnvelope::Eip1559(tx.into_signed(signature())), from)
}

/// A signed dynamic fee contract creation.
pub(crate) fn create_eip1559(from: Address, nonce: u64) -> MsgEthereumTx {
    let tx = TxEip1559 {
        chain_id: 9000,
        nonce,
        gas_limit: 100_000,
        max_fee_per_gas: 1_000,
        max_priority_fee_per_gas: 1,
        to: TxKind::Create,
        value: U256::ZERO,
        access_list: Default::default(),
        input: Bytes::from_static(&[0x60, 0x00]),
    };
    MsgEthereumTx::new(TxEnvelope::Eip1559(tx.into_signed(signature())), from)
}

/// A signed legacy transfer, replay protected when `chain_id` is set.
pub(crate) fn legacy_tx(from: Address, nonce: u64, chain_id: Option<u64>) -> MsgEthereumTx {
    let tx = TxLegacy {
        chain_id,
        nonce,
        gas_price: 10,
        gas_limit: 21_000,
        to: TxKind::Call(RECIPIENT),
        value: U256::from(1),
        input: Bytes::new(),
    };
    MsgEthereumTx::new(TxEnvelope::Legacy(tx.into_signed(signature())), from)
}

fn synthetic_fields(hash: B256, gas_used: u64) -> SyntheticFields {
    SyntheticFields {
        value: Some(U256::from(5)),
        hash,
        tx_hash: "0xinbound".to_string(),
        tx_type: SYNTHETIC_TX_TYPE,
        recipient: ChainFixture::SYNTHETIC_RECIPIENT,
        sender: ChainFixture::SYNTHETIC_SENDER,
        gas_used,
        gas_limit: Some(50_000),
        data: Bytes::new(),
        nonce: 3,
    }
}

/// A synthetic block transaction.
pub(crate) fn synthetic_block_tx(hash: B256, tx_index: u32, position: usize) -> BlockTx {
    let fields = synthetic_fields(hash, 30_000);
    BlockTx {
        msg: fields.to_msg(),
        synthetic: Some(fields),
        tx_index,
        position,
        eth_tx_index: None,
        gas_used: 30_000,
        failed: false,
        cumulative_gas_used: 30_000,
    }
}

/// A log with one topic and the given indices.
pub(crate) fn rpc_log(address: Address, tx_index: u64, log_index: u64) -> Log {
    Log {
        inner: PrimitiveLog::new_unchecked(
            address,
            vec![B256::with_last_byte(1)],
            Bytes::from_static(&[0xde, 0xad]),
        ),
        block_hash: Some(B256::ZERO),
        block_number: Some(0),
        block_timestamp: None,
        transaction_hash: Some(B256::with_last_byte(2)),
        transaction_index: Some(tx_index),
        log_index: Some(log_index),
        removed: false,
    }
}

/// The `tx_log` event of one Ethereum transaction.
pub(crate) fn tx_log_event(logs: &[Log]) -> Event {
    Event::new(
        "tx_log",
        logs.iter().map(|log| ("txLog", serde_json::to_string(&EventLog::from(log)).unwrap())),
    )
}

/// A Cosmos transaction and its execution result.
#[derive(Debug, Clone)]
pub(crate) struct FixtureTx {
    cosmos: CosmosTx,
    result: ExecTxResult,
}

impl FixtureTx {
    /// A transaction carrying Ethereum messages, each using `gas_used`, with the block-wide
    /// indices starting at `first_index`. `logs[i]` holds the logs of message `i`.
    pub(crate) fn ethereum(
        msgs: Vec<MsgEthereumTx>,
        first_index: u32,
        gas_used: u64,
        logs: Vec<Vec<Log>>,
    ) -> Self {
        let mut events = Vec::new();
        for (i, msg) in msgs.iter().enumerate() {
            events.push(Event::new(
                "ethereum_tx",
                [
                    ("ethereumTxHash", msg.hash().to_string()),
                    ("txIndex", (first_index + i as u32).to_string()),
                    ("txGasUsed", gas_used.to_string()),
                ],
            ));
            if let Some(logs) = logs.get(i) {
                events.push(tx_log_event(logs));
            }
        }
        let result =
            ExecTxResult { gas_used: gas_used * msgs.len() as u64, events, ..Default::default() };
        Self { cosmos: CosmosTx::new(msgs.into_iter().map(CosmosMsg::from).collect()), result }
    }

    /// A transaction without Ethereum messages or events.
    pub(crate) fn cosmos(gas_used: u64) -> Self {
        Self {
            cosmos: CosmosTx::new(vec![CosmosMsg::Other("/cosmos.bank.v1beta1.MsgSend".into())]),
            result: ExecTxResult { gas_used, ..Default::default() },
        }
    }

    /// A transaction that credited a synthetic Ethereum transaction.
    pub(crate) fn synthetic(hash: B256, eth_index: u32, gas_used: u64) -> Self {
        let fields = synthetic_fields(hash, gas_used);
        let event = Event::new(
            "ethereum_tx",
            [
                ("ethereumTxHash", hash.to_string()),
                ("txIndex", eth_index.to_string()),
                ("txGasUsed", gas_used.to_string()),
                ("txGasLimit", fields.gas_limit.unwrap_or_default().to_string()),
                ("txType", SYNTHETIC_TX_TYPE.to_string()),
                ("sender", fields.sender.to_string()),
                ("recipient", fields.recipient.to_string()),
                ("amount", fields.value.unwrap_or_default().to_string()),
                ("txNonce", fields.nonce.to_string()),
                ("txHash", fields.tx_hash.clone()),
            ],
        );
        Self {
            cosmos: CosmosTx::new(vec![CosmosMsg::Other("/crosschain.MsgVoteInbound".into())]),
            result: ExecTxResult { gas_used, events: vec![event], ..Default::default() },
        }
    }

    /// Adds a `tx_log` event to the result.
    pub(crate) fn with_logs(mut self, logs: Vec<Log>) -> Self {
        self.result.events.push(tx_log_event(&logs));
        self
    }

    /// Replaces the hash the first `ethereum_tx` event reports.
    pub(crate) fn with_event_hash(mut self, hash: B256) -> Self {
        if let Some(event) = self.result.events.iter_mut().find(|e| e.kind == "ethereum_tx") {
            for attr in event.attributes.iter_mut().filter(|attr| attr.key == "ethereumTxHash") {
                attr.value = hash.to_string();
            }
        }
        self
    }

    /// Marks the result failed.
    pub(crate) fn failed(mut self, code: u32, log: &str) -> Self {
        self.result.code = code;
        self.result.log = log.to_string();
        self
    }
}

/// Decodes the raw transactions of a [`ChainFixture`].
#[derive(Debug, Default)]
struct StaticDecoder {
    txs: HashMap<Vec<u8>, CosmosTx>,
}

impl TxDecoder for StaticDecoder {
    fn decode(&self, raw: &[u8]) -> Result<CosmosTx, ClientError> {
        self.txs.get(raw).cloned().ok_or_else(|| ClientError::Decode("unknown tx".into()))
    }
}

/// An in-memory transaction indexer.
#[derive(Debug, Default)]
pub(crate) struct StaticIndexer {
    records: HashMap<B256, TxResult>,
}

impl StaticIndexer {
    /// Adds the record of a transaction.
    pub(crate) fn with(mut self, hash: B256, record: TxResult) -> Self {
        self.records.insert(hash, record);
        self
    }
}

impl TxIndexer for StaticIndexer {
    fn get_by_tx_hash(&self, hash: B256) -> Result<Option<TxResult>, ClientError> {
        Ok(self.records.get(&hash).copied())
    }

    fn get_by_block_and_index(
        &self,
        height: u64,
        index: u32,
    ) -> Result<Option<TxResult>, ClientError> {
        Ok(self
            .records
            .values()
            .find(|record| record.height == height && record.eth_tx_index == Some(index))
            .copied())
    }
}

/// Answers the `tx_search` queries issued by the backend.
fn search(blocks: &[(CometBlock, BlockResults)], query: &str) -> Vec<TxSearchResult> {
    let (height, key, value) = match query
        .strip_prefix("ethereum_tx.ethereumTxHash='")
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(hash) => (None, "ethereumTxHash", hash.to_string()),
        None => {
            let (height, index) = query
                .strip_prefix("tx.height=")
                .and_then(|rest| rest.split_once(" AND ethereum_tx.txIndex="))
                .unwrap();
            (Some(height.parse::<u64>().unwrap()), "txIndex", index.to_string())
        }
    };

    let mut found = Vec::new();
    for (block, results) in blocks.iter().filter(|(b, _)| height.is_none_or(|h| b.height() == h)) {
        for (i, (raw, result)) in block.txs.iter().zip(&results.txs_results).enumerate() {
            let matched = result.events.iter().any(|event| {
                event.kind == "ethereum_tx" &&
                    event.attribute(key).is_some_and(|v| v.eq_ignore_ascii_case(&value))
            });
            if matched {
                found.push(TxSearchResult {
                    hash: keccak256(raw),
                    height: block.height(),
                    index: i as u32,
                    tx: raw.clone(),
                    result: result.clone(),
                });
            }
        }
    }
    found
}

/// An in-memory chain served through mocked collaborators.
#[derive(Debug, Clone)]
pub(crate) struct ChainFixture {
    blocks: Vec<(CometBlock, BlockResults)>,
    decoded: HashMap<Vec<u8>, CosmosTx>,
    config: BackendConfig,
    queries_fail: bool,
    tx_search_fails: bool,
    missing_results: HashSet<u64>,
}

impl ChainFixture {
    /// Maximum gas of every block.
    pub(crate) const BLOCK_MAX_GAS: u64 = 30_000_000;
    /// Operator account of every proposer.
    pub(crate) const VALIDATOR: Address = address!("0x00000000000000000000000000000000000000fe");
    /// Base fee of every block.
    pub(crate) const BASE_FEE: U256 = U256::from_limbs([100, 0, 0, 0]);
    /// Sender of synthetic transactions.
    pub(crate) const SYNTHETIC_SENDER: Address =
        address!("0x00000000000000000000000000000000000000c1");
    /// Recipient of synthetic transactions.
    pub(crate) const SYNTHETIC_RECIPIENT: Address =
        address!("0x00000000000000000000000000000000000000c2");

    pub(crate) fn new() -> Self {
        Self {
            blocks: Vec::new(),
            decoded: HashMap::new(),
            config: BackendConfig::default(),
            queries_fail: false,
            tx_search_fails: false,
            missing_results: HashSet::new(),
        }
    }

    /// Appends a block with the given transactions.
    pub(crate) fn push_block(&mut self, txs: Vec<FixtureTx>) {
        self.push_block_with_events(txs, Vec::new());
    }

    /// Appends a block with the given transactions and finalize events.
    pub(crate) fn push_block_with_events(&mut self, txs: Vec<FixtureTx>, events: Vec<Event>) {
        let height = self.blocks.len() as u64 + 1;
        let parent = self.blocks.last().map(|(block, _)| block.hash).unwrap_or_default();

        let mut raw_txs = Vec::new();
        let mut txs_results = Vec::new();
        for (i, tx) in txs.into_iter().enumerate() {
            let raw = format!("cosmos-tx-{height}-{i}").into_bytes();
            self.decoded.insert(raw.clone(), tx.cosmos);
            raw_txs.push(Bytes::from(raw));
            txs_results.push(tx.result);
        }

        let block = CometBlock {
            hash: keccak256(height.to_be_bytes()),
            header: CometHeader {
                chain_id: "cometh_9000-1".to_string(),
                height,
                time: 1_700_000_000 + height,
                last_block_hash: parent,
                data_hash: keccak256(format!("data-{height}")),
                app_hash: keccak256(format!("app-{height}")).into(),
                proposer_address: Bytes::from_static(&[0x11; 20]),
            },
            txs: raw_txs,
            size: 1_024,
        };
        let results = BlockResults { height, txs_results, finalize_block_events: events };
        self.blocks.push((block, results));
    }

    pub(crate) fn with_config(mut self, f: impl FnOnce(&mut BackendConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Makes the base fee, validator and consensus params lookups fail.
    pub(crate) fn fail_queries(&mut self) {
        self.queries_fail = true;
    }

    /// Makes every `tx_search` query fail.
    pub(crate) fn without_tx_search(mut self) -> Self {
        self.tx_search_fails = true;
        self
    }

    /// Makes the block results at `height` unavailable.
    pub(crate) fn without_block_results(mut self, height: u64) -> Self {
        self.missing_results.insert(height);
        self
    }

    pub(crate) fn build(self) -> Backend {
        self.build_with(|_, _| {})
    }

    /// Builds the backend, letting `configure` add expectations to the mocks.
    pub(crate) fn build_with(
        self,
        configure: impl FnOnce(&mut MockCometClient, &mut MockQueryClient),
    ) -> Backend {
        let blocks = Arc::new(self.blocks);
        let head = blocks.len() as u64;

        let mut comet = MockCometClient::new();
        comet.expect_latest_height().returning(move || Ok(head));
        let by_height = blocks.clone();
        comet.expect_block().returning(move |height| {
            Ok(by_height.iter().find(|(b, _)| b.height() == height).map(|(b, _)| b.clone()))
        });
        let by_hash = blocks.clone();
        comet.expect_block_by_hash().returning(move |hash| {
            Ok(by_hash.iter().find(|(b, _)| b.hash == hash).map(|(b, _)| b.clone()))
        });
        let results = blocks.clone();
        let missing = self.missing_results;
        comet.expect_block_results().returning(move |height| {
            results
                .iter()
                .find(|(b, _)| b.height() == height && !missing.contains(&height))
                .map(|(_, r)| r.clone())
                .ok_or_else(|| ClientError::Request(format!("no results at height {height}")))
        });
        let queries_fail = self.queries_fail;
        comet.expect_consensus_params().returning(move |_| {
            if queries_fail {
                return Err(ClientError::Request("consensus params unavailable".into()));
            }
            Ok(ConsensusParams {
                block: BlockParams { max_bytes: 22_020_096, max_gas: Self::BLOCK_MAX_GAS as i64 },
            })
        });
        let searched = blocks;
        let search_fails = self.tx_search_fails;
        comet.expect_tx_search().returning(move |query| {
            if search_fails {
                return Err(ClientError::Request("tx_search disabled".into()));
            }
            Ok(search(&searched, &query))
        });

        let mut query = MockQueryClient::new();
        query.expect_base_fee().returning(move |_| {
            if queries_fail {
                return Err(ClientError::Request("base fee unavailable".into()));
            }
            Ok(Some(Self::BASE_FEE))
        });
        query.expect_fee_market_params().returning(|_| Ok(FeeMarketParams::default()));
        query.expect_validator_account().returning(move |_, _| {
            if queries_fail {
                return Err(ClientError::Request("unknown validator".into()));
            }
            Ok(Self::VALIDATOR)
        });

        configure(&mut comet, &mut query);

        Backend::new(
            self.config,
            Arc::new(comet),
            Arc::new(query),
            Arc::new(StaticDecoder { txs: self.decoded }),
        )
    }
}
