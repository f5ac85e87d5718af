//! Engine integration tests
//!
//! Exercise the full inbound pipeline (detection, resolution, aggregation,
//! timing, fan-out, replies) against in-memory ports and a scriptable
//! transport. Time-sensitive tests run on a paused tokio clock, so retries
//! and timeouts settle instantly and deterministically.
//!
//! Run with: cargo test -p integration-tests --test engine_tests

use std::time::Duration;

use flock_core::entities::{DeliveryStatus, Member, ReactionAction};
use flock_core::render_summary;
use flock_core::traits::ReactionRepository;
use flock_service::{BroadcastEngine, InboundService, ReactionAggregator};
use integration_tests::{member, roster, TestHarness};

fn admin() -> Member {
    member("+15550000001", "Mike", true)
}

fn alice() -> Member {
    member("+15550000002", "Alice", false)
}

fn bob() -> Member {
    member("+15550000003", "Bob", false)
}

fn standard_roster() -> Vec<Member> {
    vec![admin(), alice(), bob()]
}

// ============================================================================
// Inbound scenarios
// ============================================================================

#[tokio::test]
async fn test_unregistered_sender_rejected_without_broadcast() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let reply = service
        .handle_inbound("+19990000000", "hello everyone", vec![])
        .await
        .unwrap();

    assert!(reply.unwrap().contains("not on the broadcast roster"));
    assert!(h.broadcasts.is_empty());
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn test_broadcast_fans_out_to_everyone_but_sender() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let reply = service
        .handle_inbound(&alice().address, "Good morning everyone!", vec![])
        .await
        .unwrap();

    // Silent success for a regular member
    assert_eq!(reply, None);

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(addr, _)| addr != &alice().address));
    assert!(sent.iter().all(|(_, text)| text.contains("Good morning everyone!")));
    assert!(sent.iter().all(|(_, text)| text.starts_with("💬 Alice:")));

    assert_eq!(h.broadcasts.len(), 1);
}

#[tokio::test]
async fn test_admin_broadcast_gets_confirmation() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let reply = service
        .handle_inbound(&admin().address, "Potluck is on Friday", vec![])
        .await
        .unwrap();

    let reply = reply.unwrap();
    assert!(reply.contains("✅ Broadcast sent to 2 members"));
    assert!(!reply.contains("Failed"));
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let reply = service
        .handle_inbound(&alice().address, "   ", vec![])
        .await
        .unwrap();

    assert!(reply.unwrap().contains("empty message"));
    assert!(h.broadcasts.is_empty());
}

#[tokio::test]
async fn test_no_recipients_surfaced_to_admin_only() {
    // Roster contains just the two senders being tested
    let h = TestHarness::new(vec![admin()]);
    let service = InboundService::new(&h.ctx);

    let reply = service
        .handle_inbound(&admin().address, "anyone there?", vec![])
        .await
        .unwrap();
    assert!(reply.unwrap().contains("No active members"));

    let h = TestHarness::new(vec![alice()]);
    let service = InboundService::new(&h.ctx);
    let reply = service
        .handle_inbound(&alice().address, "anyone there?", vec![])
        .await
        .unwrap();
    assert_eq!(reply, None);
}

#[tokio::test]
async fn test_unrecognized_command_falls_through_to_broadcast() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    // Looks like a command, isn't one: broadcast path, documented fallback
    let reply = service
        .handle_inbound(&admin().address, "STATUS", vec![])
        .await
        .unwrap();

    assert!(reply.unwrap().starts_with("✅ Broadcast sent"));
    assert_eq!(h.broadcasts.len(), 1);
    assert_eq!(h.broadcasts.all()[0].text, "STATUS");
}

#[tokio::test]
async fn test_help_and_stats_commands_reply_without_broadcasting() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let help = service
        .handle_inbound(&alice().address, "help", vec![])
        .await
        .unwrap()
        .unwrap();
    assert!(help.contains("COMMANDS"));
    assert!(!help.contains("ADMIN"));

    let stats = service
        .handle_inbound(&alice().address, "STATS", vec![])
        .await
        .unwrap()
        .unwrap();
    assert!(stats.contains("Active members: 3"));

    assert!(h.broadcasts.is_empty());
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn test_recent_is_admin_only() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    h.seed_broadcast(&alice(), "First message").await;

    let reply = service
        .handle_inbound(&admin().address, "RECENT", vec![])
        .await
        .unwrap()
        .unwrap();
    assert!(reply.contains("Recent broadcasts"));
    assert!(reply.contains("First message"));

    // From a non-admin the same text is just a broadcast
    let reply = service
        .handle_inbound(&bob().address, "RECENT", vec![])
        .await
        .unwrap();
    assert_eq!(reply, None);
    assert_eq!(h.broadcasts.all().last().unwrap().text, "RECENT");
}

#[tokio::test]
async fn test_attachment_failure_degrades_to_text_only() {
    let h = TestHarness::new(standard_roster());
    h.blobs.set_failing(true);
    let service = InboundService::new(&h.ctx);

    let media = vec![flock_service::InboundMedia {
        bytes: vec![1, 2, 3],
        content_type: "image/jpeg".to_string(),
    }];
    let reply = service
        .handle_inbound(&alice().address, "photo from today", media)
        .await
        .unwrap();

    assert_eq!(reply, None);
    assert_eq!(h.broadcasts.len(), 1);
    let texts = h.transport.texts();
    assert!(texts[0].contains("photo from today"));
    assert!(texts[0].contains("could not be processed"));
}

// ============================================================================
// Reaction round-trips
// ============================================================================

#[tokio::test]
async fn test_reaction_round_trip_loved_message() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let broadcast = h.seed_broadcast(&alice(), "Good morning!").await;

    let reply = service
        .handle_inbound(&bob().address, "Loved \"Good morning!\"", vec![])
        .await
        .unwrap();

    // Regular member: no reply even for reactions
    assert_eq!(reply, None);

    // No new broadcast row; reactions never become broadcasts
    assert_eq!(h.broadcasts.len(), 1);

    let reaction = h.reactions.get(broadcast.id, &bob().address).unwrap();
    assert_eq!(reaction.emoji, "❤️");
    assert!(reaction.is_active);

    let reloaded = h.reload(broadcast.id).await;
    assert_eq!(reloaded.reaction_summary.as_deref(), Some("1 reaction: ❤️"));
    assert!(reloaded.last_reaction_update.is_some());

    // First reaction ever triggers a summary re-broadcast to the roster
    let updates: Vec<String> = h
        .transport
        .texts()
        .into_iter()
        .filter(|t| t.starts_with("💭"))
        .collect();
    assert!(!updates.is_empty());
    assert!(updates[0].contains("1 reaction: ❤️"));
    assert!(updates[0].contains("Good morning!"));
}

#[tokio::test]
async fn test_reaction_toggle_off_then_back_on() {
    let h = TestHarness::new(standard_roster());
    let broadcast = h.seed_broadcast(&alice(), "Service at 10am").await;
    let aggregator = ReactionAggregator::new(&h.ctx);

    // A -> on
    let first = aggregator
        .apply(&broadcast, &bob().address, &bob().name, "❤️")
        .await
        .unwrap();
    assert_eq!(first.action, ReactionAction::Added);
    assert_eq!(first.total_active, 1);

    // A again -> off
    let second = aggregator
        .apply(&broadcast, &bob().address, &bob().name, "❤️")
        .await
        .unwrap();
    assert_eq!(second.action, ReactionAction::Removed);
    assert_eq!(second.total_active, 0);
    assert_eq!(second.summary, None);
    assert!(!h.reactions.get(broadcast.id, &bob().address).unwrap().is_active);

    // A third time -> on again
    let third = aggregator
        .apply(&broadcast, &bob().address, &bob().name, "❤️")
        .await
        .unwrap();
    assert_eq!(third.action, ReactionAction::Added);
    assert_eq!(third.total_active, 1);
    assert!(h.reactions.get(broadcast.id, &bob().address).unwrap().is_active);
}

#[tokio::test]
async fn test_different_emoji_replaces_not_inserts() {
    let h = TestHarness::new(standard_roster());
    let broadcast = h.seed_broadcast(&alice(), "Choir practice moved").await;
    let aggregator = ReactionAggregator::new(&h.ctx);

    aggregator
        .apply(&broadcast, &bob().address, &bob().name, "❤️")
        .await
        .unwrap();
    let changed = aggregator
        .apply(&broadcast, &bob().address, &bob().name, "😂")
        .await
        .unwrap();

    assert_eq!(changed.action, ReactionAction::Changed);
    assert_eq!(changed.total_active, 1);

    // Single-row-per-(broadcast, reactor) invariant
    assert_eq!(h.reactions.row_count(), 1);
    let row = h.reactions.get(broadcast.id, &bob().address).unwrap();
    assert_eq!(row.emoji, "😂");
    assert_eq!(row.previous_emoji.as_deref(), Some("❤️"));
    assert!(row.is_active);
}

#[tokio::test]
async fn test_summary_always_matches_active_reactions() {
    let h = TestHarness::new(standard_roster());
    let broadcast = h.seed_broadcast(&admin(), "Big announcement").await;
    let aggregator = ReactionAggregator::new(&h.ctx);

    let steps = [
        (alice(), "❤️"),
        (bob(), "❤️"),
        (alice(), "😂"), // change
        (bob(), "❤️"),   // toggle off
        (bob(), "❤️"),   // toggle back on
    ];

    for (reactor, emoji) in steps {
        aggregator
            .apply(&broadcast, &reactor.address, &reactor.name, emoji)
            .await
            .unwrap();

        // Invariant: stored summary equals the deterministic aggregation of
        // active reactions at every point after a mutation
        let counts = h.reactions.active_counts(broadcast.id).await.unwrap();
        let reloaded = h.reload(broadcast.id).await;
        assert_eq!(reloaded.reaction_summary, render_summary(&counts));
    }
}

#[tokio::test]
async fn test_timing_policy_notifies_on_first_and_third() {
    let h = TestHarness::new(vec![
        admin(),
        alice(),
        bob(),
        member("+15550000004", "Cara", false),
        member("+15550000005", "Dan", false),
    ]);
    let broadcast = h.seed_broadcast(&admin(), "Fresh broadcast").await;
    let aggregator = ReactionAggregator::new(&h.ctx);

    let reactors = [alice(), bob(), member("+15550000004", "Cara", false), member("+15550000005", "Dan", false)];
    let mut notifications = Vec::new();

    for reactor in &reactors {
        // Re-fetch so the policy sees the current summary timestamp
        let current = h.reload(broadcast.id).await;
        let outcome = aggregator
            .apply(&current, &reactor.address, &reactor.name, "👍")
            .await
            .unwrap();
        notifications.push(outcome.notify);
    }

    // 1st (first ever) and 3rd (every-third rule) notify; 2nd and 4th do not
    assert_eq!(notifications, vec![true, false, true, false]);
}

#[tokio::test]
async fn test_bare_emoji_attaches_to_most_recent_candidate() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let _older = h.seed_broadcast(&admin(), "Older message").await;
    // Tick the clock so created_at ordering is strict
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = h.seed_broadcast(&alice(), "Newer message").await;

    service
        .handle_inbound(&bob().address, "🙏", vec![])
        .await
        .unwrap();

    assert!(h.reactions.get(newer.id, &bob().address).is_some());
}

#[tokio::test]
async fn test_resolver_skips_reactors_own_broadcasts() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let from_alice = h.seed_broadcast(&alice(), "Alice says hi").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let from_bob = h.seed_broadcast(&bob(), "Bob says hi").await;

    // Bob's bare emoji must not land on his own (most recent) message
    service
        .handle_inbound(&bob().address, "👍", vec![])
        .await
        .unwrap();

    assert!(h.reactions.get(from_bob.id, &bob().address).is_none());
    assert!(h.reactions.get(from_alice.id, &bob().address).is_some());
}

#[tokio::test]
async fn test_fuzzy_match_prefers_quoted_text_over_recency() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let target = h.seed_broadcast(&alice(), "The potluck is moved to Friday").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = h.seed_broadcast(&admin(), "Completely unrelated note").await;

    service
        .handle_inbound(
            &bob().address,
            "Loved \"The potluck is moved to Friday\"",
            vec![],
        )
        .await
        .unwrap();

    assert!(h.reactions.get(target.id, &bob().address).is_some());
    assert!(h.reactions.get(newer.id, &bob().address).is_none());
}

#[tokio::test]
async fn test_reaction_with_no_candidates_is_dropped_silently() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    let reply = service
        .handle_inbound(&bob().address, "Loved \"anything\"", vec![])
        .await
        .unwrap();

    assert_eq!(reply, None);
    assert_eq!(h.reactions.row_count(), 0);
    assert!(h.broadcasts.is_empty());
}

#[tokio::test]
async fn test_admin_reaction_gets_ack() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    h.seed_broadcast(&alice(), "Morning all").await;

    let reply = service
        .handle_inbound(&admin().address, "Liked \"Morning all\"", vec![])
        .await
        .unwrap();

    let reply = reply.unwrap();
    assert!(reply.contains("Reaction added"));
    assert!(reply.contains("👍"));
}

// ============================================================================
// Fan-out behavior
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_fanout_counts_partial_failure() {
    let mut members = roster(5);
    let sender = member("+15550009000", "Sender", false);
    members.push(sender.clone());
    let h = TestHarness::new(members.clone());

    // Recipient #3 fails all attempts
    h.transport.fail_always(&members[2].address);

    let engine = BroadcastEngine::new(&h.ctx);
    let outcome = engine
        .broadcast(&sender, "important news", &[], 0)
        .await
        .unwrap();

    assert_eq!(outcome.sent, 4);
    assert_eq!(outcome.failed, 1);

    let attempts = h.deliveries.all();
    assert_eq!(attempts.len(), 5);

    let failed: Vec<_> = attempts
        .iter()
        .filter(|a| a.status == DeliveryStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].recipient_address, members[2].address);
    assert_eq!(failed[0].retry_count, 2); // 3 attempts = 2 retries
    assert!(failed[0].error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_fanout_retries_transient_failures() {
    let mut members = roster(2);
    let sender = member("+15550009000", "Sender", false);
    members.push(sender.clone());
    let h = TestHarness::new(members.clone());

    // First two attempts fail, third succeeds
    h.transport.fail_times(&members[0].address, 2);

    let engine = BroadcastEngine::new(&h.ctx);
    let outcome = engine.broadcast(&sender, "retry me", &[], 0).await.unwrap();

    assert_eq!(outcome.sent, 2);
    assert_eq!(outcome.failed, 0);

    let recovered = h
        .deliveries
        .all()
        .into_iter()
        .find(|a| a.recipient_address == members[0].address)
        .unwrap();
    assert_eq!(recovered.status, DeliveryStatus::Delivered);
    assert_eq!(recovered.retry_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_hung_recipient_cannot_stall_the_batch() {
    let mut members = roster(3);
    let sender = member("+15550009000", "Sender", false);
    members.push(sender.clone());
    let h = TestHarness::new(members.clone());

    // Recipient #1 hangs far past the per-recipient timeout
    h.transport.delay(&members[0].address, Duration::from_secs(600));

    let engine = BroadcastEngine::new(&h.ctx);
    let outcome = engine.broadcast(&sender, "don't wait up", &[], 0).await.unwrap();

    assert_eq!(outcome.sent, 2);
    assert_eq!(outcome.failed, 1);

    let timed_out = h
        .deliveries
        .all()
        .into_iter()
        .find(|a| a.recipient_address == members[0].address)
        .unwrap();
    assert_eq!(timed_out.status, DeliveryStatus::Failed);
    assert!(timed_out.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_every_send_attempt_is_recorded() {
    let h = TestHarness::new(standard_roster());
    let service = InboundService::new(&h.ctx);

    service
        .handle_inbound(&alice().address, "log everything", vec![])
        .await
        .unwrap();

    let attempts = h.deliveries.all();
    assert_eq!(attempts.len(), 2);
    assert!(attempts.iter().all(|a| a.status == DeliveryStatus::Delivered));
    assert!(attempts.iter().all(|a| a.provider_id.is_some()));
}
