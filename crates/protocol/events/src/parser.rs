//! Recovers [`ParsedTxs`] from the events of an execution result.

use crate::{
    EventParseError, ParsedTx, ParsedTxs,
    attributes::{EVENT_TYPE_ETHEREUM_TX, EVENT_TYPE_MESSAGE},
};
use alloy_primitives::B256;
use cometh_primitives::{CosmosMsg, CosmosTx, Event, EventAttribute, ExecTxResult};
use std::collections::HashMap;

/// Number of attributes of the short `ethereum_tx` event of the split layout.
const HEADER_EVENT_ATTRIBUTES: usize = 2;

/// The layout of the `ethereum_tx` events of an execution result.
///
/// ```text
/// Verbose: ethereum_tx(full) tx_log ethereum_tx(full) tx_log ...
/// Split:   ethereum_tx(hash, index) ethereum_tx(hash, index) ... ethereum_tx(full) tx_log ...
/// ```
///
/// A transaction that exceeds the block gas limit only emits the short event of the split
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormat {
    /// One event per transaction carrying every field.
    Verbose,
    /// A short event per transaction, followed by full events overriding the short ones.
    Split,
}

/// Handles a full `ethereum_tx` event, given the position of the event among full events.
type FullEventHandler =
    fn(&mut ParsedTxsBuilder, usize, &[EventAttribute]) -> Result<(), EventParseError>;

impl EventFormat {
    /// Detects the layout from the first `ethereum_tx` event, if any.
    pub fn detect(events: &[Event]) -> Option<Self> {
        events.iter().find(|event| event.kind == EVENT_TYPE_ETHEREUM_TX).map(|event| {
            if event.attributes.len() > HEADER_EVENT_ATTRIBUTES {
                Self::Verbose
            } else {
                Self::Split
            }
        })
    }

    fn full_event_handler(self) -> FullEventHandler {
        match self {
            Self::Verbose => ParsedTxsBuilder::append,
            Self::Split => ParsedTxsBuilder::replace,
        }
    }
}

#[derive(Debug, Default)]
struct ParsedTxsBuilder {
    txs: Vec<ParsedTx>,
    hashes: HashMap<B256, usize>,
    /// Position of the last full event.
    current: Option<usize>,
}

impl ParsedTxsBuilder {
    fn push(&mut self, attrs: &[EventAttribute]) -> Result<(), EventParseError> {
        let tx = ParsedTx::from_attributes(attrs)?;
        self.hashes.insert(tx.hash, self.txs.len());
        self.txs.push(tx);
        Ok(())
    }

    fn append(&mut self, _: usize, attrs: &[EventAttribute]) -> Result<(), EventParseError> {
        self.push(attrs)
    }

    /// The short event of the split layout may carry a wrong hash, so the full event
    /// replaces it. Both hashes stay indexed.
    fn replace(&mut self, index: usize, attrs: &[EventAttribute]) -> Result<(), EventParseError> {
        let tx = ParsedTx::from_attributes(attrs)?;
        let slot = self.txs.get_mut(index).ok_or(EventParseError::MissingHeaderEvent(index))?;
        self.hashes.insert(tx.hash, index);
        *slot = tx;
        Ok(())
    }

    fn full_event(
        &mut self,
        handler: FullEventHandler,
        attrs: &[EventAttribute],
    ) -> Result<(), EventParseError> {
        let index = self.current.map_or(0, |i| i + 1);
        self.current = Some(index);
        handler(self, index, attrs)
    }

    fn extend_current(&mut self, attrs: &[EventAttribute]) -> Result<(), EventParseError> {
        match self.current.and_then(|i| self.txs.get_mut(i)) {
            Some(tx) => tx.apply_attributes(attrs),
            None => Ok(()),
        }
    }

    fn finish(mut self, result: &ExecTxResult, cosmos_tx: Option<&CosmosTx>) -> ParsedTxs {
        // Older chains did not emit the gas of a lone transaction.
        if let [tx] = self.txs.as_mut_slice() {
            if !tx.is_synthetic() {
                tx.gas_used = result.gas_used;
            }
        }

        let mut next_msg = 0;
        for tx in self.txs.iter_mut() {
            if tx.is_synthetic() {
                tx.msg_index = None;
            } else {
                tx.msg_index = Some(next_msg);
                next_msg += 1;
            }
        }

        // Only a transaction exceeding the block gas limit fails the whole result, and it
        // is charged its full gas limit.
        if let Some(cosmos_tx) = cosmos_tx.filter(|_| result.code != 0) {
            for tx in self.txs.iter_mut() {
                tx.failed = true;
                let Some(msg_index) = tx.msg_index else { continue };
                match cosmos_tx.msg(msg_index).and_then(CosmosMsg::as_ethereum) {
                    Some(msg) => tx.gas_used = msg.gas_limit(),
                    None => warn!(
                        target: "cometh::events",
                        msg_index,
                        hash = %tx.hash,
                        "No ethereum message for failed transaction"
                    ),
                }
            }
        }

        ParsedTxs::from_parts(self.txs, self.hashes)
    }
}

/// Parses the Ethereum transactions of an execution result.
///
/// `cosmos_tx` is the decoded transaction, or `None` if it could not be decoded. Only
/// malformed attribute values are errors; unknown attributes are skipped.
pub fn parse_tx_result(
    result: &ExecTxResult,
    cosmos_tx: Option<&CosmosTx>,
) -> Result<ParsedTxs, EventParseError> {
    let mut builder = ParsedTxsBuilder::default();
    let Some(format) = EventFormat::detect(&result.events) else {
        return Ok(builder.finish(result, cosmos_tx));
    };
    let on_full_event = format.full_event_handler();

    let mut previous_was_eth_tx = false;
    for event in &result.events {
        match event.kind.as_str() {
            EVENT_TYPE_ETHEREUM_TX => {
                if event.attributes.len() == HEADER_EVENT_ATTRIBUTES {
                    builder.push(&event.attributes)?;
                } else {
                    builder.full_event(on_full_event, &event.attributes)?;
                }
                previous_was_eth_tx = true;
            }
            // Synthetic transactions may carry their fields in a message event.
            EVENT_TYPE_MESSAGE if previous_was_eth_tx => {
                builder.extend_current(&event.attributes)?;
                previous_was_eth_tx = false;
            }
            _ => {}
        }
    }

    Ok(builder.finish(result, cosmos_tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SYNTHETIC_TX_TYPE;
    use alloy_consensus::{Signed, TxEnvelope, TxLegacy};
    use alloy_primitives::{Address, Signature, TxKind, U256, address};
    use cometh_primitives::MsgEthereumTx;
    use rstest::rstest;

    const HASH: &str = "0x3f2b8f4e9a1c1d7a0b55f2b6a9d0e4c8b7a6f5e4d3c2b1a0f9e8d7c6b5a49382";
    const RECIPIENT: &str = "0x775b87ef5D82ca211811C1a02CE0fE0CA3a455d7";

    fn full_attrs(hash: &str, index: &str) -> Vec<(&'static str, String)> {
        vec![
            ("ethereumTxHash", hash.to_string()),
            ("txIndex", index.to_string()),
            ("amount", "1000".to_string()),
            ("txGasUsed", "21000".to_string()),
            ("txHash", String::new()),
            ("recipient", RECIPIENT.to_string()),
        ]
    }

    fn result_with(events: Vec<Event>, code: u32, gas_used: u64) -> ExecTxResult {
        ExecTxResult { code, gas_used, events, ..Default::default() }
    }

    fn msg(gas_limit: u64) -> CosmosMsg {
        let tx = TxLegacy {
            gas_limit,
            to: TxKind::Call(Address::ZERO),
            value: U256::ZERO,
            ..Default::default()
        };
        let signature = Signature::new(U256::from(1), U256::from(1), false);
        let envelope = TxEnvelope::Legacy(Signed::new_unchecked(tx, signature, B256::ZERO));
        CosmosMsg::Ethereum(MsgEthereumTx::new(envelope, Address::ZERO))
    }

    #[test]
    fn test_detect_format() {
        let verbose = vec![Event::new("ethereum_tx", full_attrs(HASH, "0"))];
        assert_eq!(EventFormat::detect(&verbose), Some(EventFormat::Verbose));

        let split = vec![
            Event::new("message", [("action", "ethereum")]),
            Event::new("ethereum_tx", [("ethereumTxHash", HASH), ("txIndex", "0")]),
        ];
        assert_eq!(EventFormat::detect(&split), Some(EventFormat::Split));
        assert_eq!(EventFormat::detect(&[]), None);
    }

    #[test]
    fn test_verbose_and_split_formats_are_equivalent() {
        let verbose = result_with(vec![Event::new("ethereum_tx", full_attrs(HASH, "0"))], 0, 21_000);
        let split = result_with(
            vec![
                Event::new("ethereum_tx", [("ethereumTxHash", HASH), ("txIndex", "0")]),
                Event::new("ethereum_tx", full_attrs(HASH, "0")),
            ],
            0,
            21_000,
        );

        let verbose = parse_tx_result(&verbose, None).unwrap();
        let split = parse_tx_result(&split, None).unwrap();
        assert_eq!(verbose.txs(), split.txs());

        let tx = &verbose.txs()[0];
        assert_eq!(tx.hash, HASH.parse::<B256>().unwrap());
        assert_eq!(tx.gas_used, 21_000);
        assert!(!tx.failed);
        assert_eq!(tx.amount, Some(U256::from(1000)));
        assert_eq!(tx.recipient, address!("0x775b87ef5D82ca211811C1a02CE0fE0CA3a455d7"));
    }

    #[test]
    fn test_split_format_full_event_overrides_hash() {
        let wrong = "0x00000000000000000000000000000000000000000000000000000000000000aa";
        let result = result_with(
            vec![
                Event::new("ethereum_tx", [("ethereumTxHash", wrong), ("txIndex", "0")]),
                Event::new("ethereum_tx", full_attrs(HASH, "0")),
            ],
            0,
            21_000,
        );
        let txs = parse_tx_result(&result, None).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs.txs()[0].hash, HASH.parse::<B256>().unwrap());
        assert_eq!(txs.position(&HASH.parse().unwrap()), Some(0));
        assert_eq!(txs.position(&wrong.parse().unwrap()), Some(0));
    }

    #[test]
    fn test_split_format_without_full_events() {
        // A transaction exceeding the block gas limit only emits the short events.
        let second = "0x00000000000000000000000000000000000000000000000000000000000000bb";
        let result = result_with(
            vec![
                Event::new("ethereum_tx", [("ethereumTxHash", HASH), ("txIndex", "3")]),
                Event::new("ethereum_tx", [("ethereumTxHash", second), ("txIndex", "4")]),
            ],
            0,
            0,
        );
        let txs = parse_tx_result(&result, None).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs.tx_by_tx_index(4).map(|tx| tx.hash), second.parse().ok());
    }

    #[test]
    fn test_split_format_full_event_without_header() {
        let result = result_with(
            vec![
                Event::new("ethereum_tx", [("ethereumTxHash", HASH), ("txIndex", "0")]),
                Event::new("ethereum_tx", full_attrs(HASH, "0")),
                Event::new("ethereum_tx", full_attrs(HASH, "1")),
            ],
            0,
            0,
        );
        assert_eq!(
            parse_tx_result(&result, None).unwrap_err(),
            EventParseError::MissingHeaderEvent(1)
        );
    }

    #[test]
    fn test_message_event_extends_synthetic_tx() {
        let result = result_with(
            vec![
                Event::new("ethereum_tx", full_attrs(HASH, "0")),
                Event::new(
                    "message",
                    [
                        ("sender", "0x735b14BB79463307AAcBED86DAf3322B1e6226aB"),
                        ("txType", "88"),
                        ("txNonce", "7"),
                    ],
                ),
                Event::new("message", [("txNonce", "9")]),
            ],
            0,
            50_000,
        );
        let txs = parse_tx_result(&result, None).unwrap();
        let tx = &txs.txs()[0];
        assert!(tx.is_synthetic());
        assert_eq!(tx.sender, address!("0x735b14BB79463307AAcBED86DAf3322B1e6226aB"));
        assert_eq!(tx.nonce, 7);
        assert_eq!(tx.msg_index, None);
        // Synthetic transactions keep their own gas.
        assert_eq!(tx.gas_used, 21_000);
    }

    #[test]
    fn test_message_event_not_after_eth_tx_is_ignored() {
        let result = result_with(
            vec![
                Event::new("message", [("txNonce", "9")]),
                Event::new("ethereum_tx", full_attrs(HASH, "0")),
            ],
            0,
            21_000,
        );
        let txs = parse_tx_result(&result, None).unwrap();
        assert_eq!(txs.txs()[0].nonce, 0);
    }

    #[test]
    fn test_legacy_base64_attributes() {
        let event = Event::new(
            "ethereum_tx",
            [
                ("ZXRoZXJldW1UeEhhc2g=", "MHgwMQ=="),
                ("dHhJbmRleA==", "MA=="),
                ("dHhHYXNVc2Vk", "MjEwMDA="),
            ],
        );
        let txs = parse_tx_result(&result_with(vec![event], 0, 21_000), None).unwrap();
        let tx = &txs.txs()[0];
        assert_eq!(tx.hash, B256::with_last_byte(1));
        assert_eq!(tx.eth_tx_index, Some(0));
        assert_eq!(tx.gas_used, 21_000);
    }

    #[test]
    fn test_lone_tx_takes_result_gas() {
        let result = result_with(vec![Event::new("ethereum_tx", full_attrs(HASH, "0"))], 0, 33_000);
        assert_eq!(parse_tx_result(&result, None).unwrap().txs()[0].gas_used, 33_000);
    }

    #[rstest]
    #[case::block_gas_exceeded("out of gas in location: block gas meter; gasWanted: 90000")]
    #[case::commit_failed("failed to commit stateDB")]
    fn test_failed_result_charges_gas_limit(#[case] log: &str) {
        let second = "0x00000000000000000000000000000000000000000000000000000000000000bb";
        let mut result = result_with(
            vec![
                Event::new("ethereum_tx", full_attrs(HASH, "0")),
                Event::new("ethereum_tx", full_attrs(second, "1")),
            ],
            11,
            60_000,
        );
        result.log = log.to_string();
        let cosmos_tx = CosmosTx::new(vec![msg(40_000), msg(50_000)]);

        let txs = parse_tx_result(&result, Some(&cosmos_tx)).unwrap();
        assert!(txs.iter().all(|tx| tx.failed));
        assert_eq!(txs.txs()[0].gas_used, 40_000);
        assert_eq!(txs.txs()[1].gas_used, 50_000);
    }

    #[test]
    fn test_failed_result_without_decoded_tx() {
        let result = result_with(vec![Event::new("ethereum_tx", full_attrs(HASH, "0"))], 11, 60_000);
        let txs = parse_tx_result(&result, None).unwrap();
        assert!(!txs.txs()[0].failed);
        assert_eq!(txs.txs()[0].gas_used, 60_000);
    }

    #[test]
    fn test_msg_indices_skip_synthetic_txs() {
        let mut synthetic = full_attrs(
            "0x00000000000000000000000000000000000000000000000000000000000000cc",
            "1",
        );
        synthetic.push(("txType", SYNTHETIC_TX_TYPE.to_string()));
        let result = result_with(
            vec![
                Event::new("ethereum_tx", full_attrs(HASH, "0")),
                Event::new("ethereum_tx", synthetic),
                Event::new(
                    "ethereum_tx",
                    full_attrs(
                        "0x00000000000000000000000000000000000000000000000000000000000000dd",
                        "2",
                    ),
                ),
            ],
            0,
            0,
        );
        let txs = parse_tx_result(&result, None).unwrap();
        let indices: Vec<_> = txs.iter().map(|tx| tx.msg_index).collect();
        assert_eq!(indices, vec![Some(0), None, Some(1)]);
    }

    #[test]
    fn test_malformed_attribute_is_fatal() {
        let result = result_with(
            vec![Event::new("ethereum_tx", [("ethereumTxHash", HASH), ("txIndex", "x")])],
            0,
            0,
        );
        assert!(matches!(
            parse_tx_result(&result, None),
            Err(EventParseError::InvalidNumber { key: "txIndex", .. })
        ));
    }
}
