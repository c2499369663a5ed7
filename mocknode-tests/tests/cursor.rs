//! Masterchain cursor batching and tip polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use tonscan::config::ScanConfig;
use tonscan::primitives::{CycleStats, SyncStatus};
use tonscan::sync::cursor::MasterchainCursor;
use tonscan::sync::lag::SyncLagReporter;
use tonscan_testutils::chain::master_ref;
use tonscan_testutils::{MockChain, MockNode};

fn fast_config() -> ScanConfig {
    ScanConfig {
        poll_interval: Duration::from_millis(5),
        ..ScanConfig::default()
    }
}

fn stats() -> CycleStats {
    CycleStats::from_parts(Duration::from_millis(100), 1, 4, 2)
}

#[tokio::test]
async fn caps_batch_at_configured_limit() {
    let mut chain = MockChain::new();
    for seqno in 0..=250 {
        chain.add_master(seqno, vec![]);
    }
    let node = Arc::new(MockNode::new(chain));

    let config = fast_config();
    let cursor = MasterchainCursor::new(node, &config);
    let mut reporter = SyncLagReporter::new(&config);
    let (_shutdown_sender, mut shutdown) = watch::channel(false);

    let batch = cursor
        .next_batch(&master_ref(0), &stats(), &mut reporter, &mut shutdown)
        .await
        .unwrap();

    assert_eq!(batch.len(), 100);
    assert_eq!(batch.first().unwrap().seqno(), 1);
    assert_eq!(batch.last().unwrap().seqno(), 100);
    assert_eq!(reporter.status(), SyncStatus::OutOfSync);
}

#[tokio::test]
async fn returns_whole_gap_when_within_cap() {
    let mut chain = MockChain::new();
    for seqno in 0..=5 {
        chain.add_master(seqno, vec![]);
    }
    let node = Arc::new(MockNode::new(chain));

    let config = fast_config();
    let cursor = MasterchainCursor::new(node, &config);
    let mut reporter = SyncLagReporter::new(&config);
    let (_shutdown_sender, mut shutdown) = watch::channel(false);

    let batch = cursor
        .next_batch(&master_ref(0), &stats(), &mut reporter, &mut shutdown)
        .await
        .unwrap();

    let seqnos: Vec<u32> = batch.iter().map(|block| block.seqno()).collect();
    assert_eq!(seqnos, vec![1, 2, 3, 4, 5]);
    assert_eq!(reporter.status(), SyncStatus::CatchingUp);
}

#[tokio::test]
async fn polls_until_tip_advances() {
    let mut chain = MockChain::new();
    chain.add_master(3, vec![]);
    let node = Arc::new(MockNode::new(chain));

    let config = fast_config();
    let poller = node.clone();
    let handle = tokio::spawn(async move {
        let cursor = MasterchainCursor::new(poller, &config);
        let mut reporter = SyncLagReporter::new(&config);
        let (_shutdown_sender, mut shutdown) = watch::channel(false);
        cursor
            .next_batch(&master_ref(3), &stats(), &mut reporter, &mut shutdown)
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    node.chain().add_master(4, vec![]);

    let batch = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("cursor did not observe the new tip")
        .unwrap()
        .unwrap();
    assert_eq!(batch, vec![master_ref(4)]);
}

#[tokio::test]
async fn transient_tip_failures_are_retried() {
    let mut chain = MockChain::new();
    for seqno in 0..=2 {
        chain.add_master(seqno, vec![]);
    }
    let node = Arc::new(MockNode::new(chain));
    node.fail_next_masterchain_info(3);

    let config = fast_config();
    let cursor = MasterchainCursor::new(node, &config);
    let mut reporter = SyncLagReporter::new(&config);
    let (_shutdown_sender, mut shutdown) = watch::channel(false);

    let batch = cursor
        .next_batch(&master_ref(0), &stats(), &mut reporter, &mut shutdown)
        .await
        .unwrap();
    assert_eq!(batch.len(), 2);
}

#[tokio::test]
async fn shutdown_interrupts_polling() {
    let mut chain = MockChain::new();
    chain.add_master(3, vec![]);
    let node = Arc::new(MockNode::new(chain));

    let config = fast_config();
    let (shutdown_sender, mut shutdown) = watch::channel(false);
    let cursor = MasterchainCursor::new(node, &config);
    let mut reporter = SyncLagReporter::new(&config);

    let master_ref = master_ref(3);
    let stats = stats();
    let poll = cursor.next_batch(&master_ref, &stats, &mut reporter, &mut shutdown);
    tokio::pin!(poll);

    tokio::select! {
        _ = &mut poll => panic!("cursor returned without a new tip"),
        _ = tokio::time::sleep(Duration::from_millis(30)) => {}
    }
    shutdown_sender.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(1), poll)
        .await
        .expect("cursor did not observe shutdown");
    assert!(result.is_none());
}
