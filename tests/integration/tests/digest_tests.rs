//! Digest scheduler integration tests
//!
//! Run on a paused tokio clock: the 30-minute silence window elapses
//! instantly once every task is idle, so these are deterministic.
//!
//! Run with: cargo test -p integration-tests --test digest_tests

use std::time::Duration;

use flock_core::entities::Member;
use flock_service::{DigestScheduler, InboundService, ReactionAggregator};
use integration_tests::{member, TestHarness};

fn admin() -> Member {
    member("+15550000001", "Mike", true)
}

fn alice() -> Member {
    member("+15550000002", "Alice", false)
}

fn bob() -> Member {
    member("+15550000003", "Bob", false)
}

/// Let the scheduler task finish any digest work queued by timer fires
async fn drain() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

fn digest_count(h: &TestHarness) -> usize {
    h.transport
        .texts()
        .iter()
        .filter(|t| t.starts_with("📊"))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_pause_digest_fires_after_silence() {
    let h = TestHarness::new(vec![admin(), alice(), bob()]);
    let scheduler = DigestScheduler::start(h.ctx.clone());
    let service = InboundService::new(&h.ctx).with_scheduler(&scheduler);

    // A broadcast arms the silence timer
    service
        .handle_inbound(&alice().address, "Potluck on Friday!", vec![])
        .await
        .unwrap();

    // A reaction lands and stays unprocessed
    service
        .handle_inbound(&bob().address, "Loved \"Potluck on Friday!\"", vec![])
        .await
        .unwrap();

    assert!(h.reactions.all().iter().all(|r| !r.processed));

    // Quiet period passes with no new broadcast
    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    drain().await;

    assert!(digest_count(&h) >= 1, "expected a digest message");
    let digest = h
        .transport
        .texts()
        .into_iter()
        .find(|t| t.starts_with("📊"))
        .unwrap();
    assert!(digest.contains("Potluck on Friday!"));
    assert!(digest.contains("❤️"));

    // Every included reaction is now marked processed
    assert!(h.reactions.all().iter().all(|r| r.processed));
}

#[tokio::test(start_paused = true)]
async fn test_processed_reactions_are_never_redigested() {
    let h = TestHarness::new(vec![admin(), alice(), bob()]);
    let scheduler = DigestScheduler::start(h.ctx.clone());
    let service = InboundService::new(&h.ctx).with_scheduler(&scheduler);

    service
        .handle_inbound(&alice().address, "Choir practice tonight", vec![])
        .await
        .unwrap();
    service
        .handle_inbound(&bob().address, "👍", vec![])
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    drain().await;
    let after_first = digest_count(&h);
    assert!(after_first >= 1);

    // Re-arm the silence timer with no new reactions: the already processed
    // reaction must not be considered again
    scheduler.broadcast_accepted();
    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    drain().await;

    assert_eq!(digest_count(&h), after_first);
}

#[tokio::test(start_paused = true)]
async fn test_toggling_after_digest_does_not_clear_processed() {
    let h = TestHarness::new(vec![admin(), alice(), bob()]);
    let scheduler = DigestScheduler::start(h.ctx.clone());
    let service = InboundService::new(&h.ctx).with_scheduler(&scheduler);

    service
        .handle_inbound(&alice().address, "Sunday schedule", vec![])
        .await
        .unwrap();
    service
        .handle_inbound(&bob().address, "Loved \"Sunday schedule\"", vec![])
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    drain().await;
    let after_first = digest_count(&h);
    assert!(after_first >= 1);

    // Toggle the digested reaction off and on again
    let broadcast = h.broadcasts.all()[0].clone();
    let aggregator = ReactionAggregator::new(&h.ctx);
    aggregator
        .apply(&broadcast, &bob().address, &bob().name, "❤️")
        .await
        .unwrap();
    aggregator
        .apply(&broadcast, &bob().address, &bob().name, "❤️")
        .await
        .unwrap();

    // processed is monotonic: once digested, never reconsidered
    assert!(h.reactions.all().iter().all(|r| r.processed));

    scheduler.broadcast_accepted();
    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    drain().await;

    assert_eq!(digest_count(&h), after_first);
}
