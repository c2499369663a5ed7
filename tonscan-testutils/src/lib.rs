//! Test infrastructure for the scan engine: an in-memory chain graph and a
//! mock node client with scriptable failures.

use std::time::Duration;

use tokio::sync::mpsc;
use tonscan::primitives::ScanEvent;

pub mod chain;
pub mod node;

pub use chain::MockChain;
pub use node::MockNode;

/// Receives exactly `n` events from the scanner output, panicking when they
/// do not arrive within `timeout`.
pub async fn recv_events(
    receiver: &mut mpsc::Receiver<ScanEvent>,
    n: usize,
    timeout: Duration,
) -> Vec<ScanEvent> {
    let mut events = Vec::with_capacity(n);
    tokio::time::timeout(timeout, async {
        while events.len() < n {
            match receiver.recv().await {
                Some(event) => events.push(event),
                None => break,
            }
        }
    })
    .await
    .expect("timed out waiting for scan events");

    assert_eq!(events.len(), n, "output channel closed early");
    events
}

/// Asserts that no further event arrives within `quiet`.
pub async fn assert_no_events(receiver: &mut mpsc::Receiver<ScanEvent>, quiet: Duration) {
    tokio::select! {
        event = receiver.recv() => {
            if let Some(event) = event {
                panic!("unexpected scan event: {event:?}");
            }
        }
        _ = tokio::time::sleep(quiet) => {}
    }
}
