#![cfg(feature = "metrics")]
//! Tests for `ackframe` metrics.
//!
//! These tests verify that the transport updates its counters using
//! `metrics_util::debugging::DebuggingRecorder`.

use std::{num::NonZeroU32, time::Duration};

use ackframe::{
    PacketHeader,
    ReliableTransport,
    TransportConfig,
    metrics::{self, Direction},
};
use ackframe_testing::{Fate, LossyChannel};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

/// One counter reading taken from a snapshot.
struct Reading {
    name: String,
    direction: Option<String>,
    value: u64,
}

/// Take a single snapshot of every counter; snapshots drain the recorder.
fn read_counters(snapshotter: &Snapshotter) -> Vec<Reading> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(k, _, _, v)| match v {
            DebugValue::Counter(value) => Some(Reading {
                name: k.key().name().to_owned(),
                direction: k
                    .key()
                    .labels()
                    .find(|l| l.key() == "direction")
                    .map(|l| l.value().to_owned()),
                value,
            }),
            _ => None,
        })
        .collect()
}

/// Sum of the readings named `name`, optionally restricted to a direction.
fn total(readings: &[Reading], name: &str, direction: Option<&str>) -> u64 {
    readings
        .iter()
        .filter(|r| r.name == name && direction.is_none_or(|d| r.direction.as_deref() == Some(d)))
        .map(|r| r.value)
        .sum()
}

#[test]
fn message_counter_is_labelled_by_direction() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    ::metrics::with_local_recorder(&recorder, || {
        metrics::inc_messages(Direction::Inbound);
        metrics::inc_messages(Direction::Outbound);
        metrics::inc_messages(Direction::Outbound);
    });

    let readings = read_counters(&snapshotter);
    assert_eq!(total(&readings, metrics::MESSAGES, Some("inbound")), 1);
    assert_eq!(total(&readings, metrics::MESSAGES, Some("outbound")), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn lossy_exchange_updates_counters() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let _guard = ::metrics::set_default_local_recorder(&recorder);

    let (a, b) = LossyChannel::pair();
    let mut dropped = false;
    let a = a.with_fault(move |bytes| match PacketHeader::decode(bytes) {
        Ok(h) if h.sequence == 2 && !dropped => {
            dropped = true;
            Fate::Drop
        }
        Ok(h) if h.sequence == 3 => Fate::Duplicate,
        _ => Fate::Deliver,
    });
    let mut sender = ReliableTransport::new(a);
    let mut receiver = ReliableTransport::new(b);
    let message = vec![7; 3 * 512 + 1];

    let (sent, received) = tokio::join!(sender.send(&message), receiver.recv(0));
    sent.expect("send");
    received.expect("recv");

    let readings = read_counters(&snapshotter);
    assert!(total(&readings, metrics::FRAGMENTS_SENT, None) >= 5);
    assert!(total(&readings, metrics::RETRANSMISSIONS, None) >= 1);
    assert!(total(&readings, metrics::DUPLICATES, None) >= 1);
    assert_eq!(total(&readings, metrics::MESSAGES, Some("outbound")), 1);
    assert_eq!(total(&readings, metrics::MESSAGES, Some("inbound")), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn exhausted_fragment_is_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let _guard = ::metrics::set_default_local_recorder(&recorder);

    let (a, _b) = LossyChannel::pair();
    let config = TransportConfig::default()
        .receive_timeout(Duration::from_millis(1))
        .max_attempts(NonZeroU32::new(2).expect("non-zero"));
    let mut sender = ReliableTransport::with_config(a, config);
    sender.send(b"unheard").await.expect_err("no acknowledgement");

    let readings = read_counters(&snapshotter);
    assert_eq!(total(&readings, metrics::UNCONFIRMED, None), 1);
    assert_eq!(total(&readings, metrics::RETRANSMISSIONS, None), 1);
    assert_eq!(total(&readings, metrics::FRAGMENTS_SENT, None), 2);
    assert_eq!(total(&readings, metrics::MESSAGES, Some("outbound")), 0);
}
