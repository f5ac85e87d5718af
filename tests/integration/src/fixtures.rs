//! In-memory port implementations and the scriptable mock transport

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use flock_core::entities::{
    Broadcast, DeliveryAttempt, Member, Reaction, ReactionCount, ReactionKey,
};
use flock_core::traits::{
    BlobError, BlobStore, BroadcastRepository, DeliveryRepository, DirectoryRepository,
    ReactionRepository, RepoResult, SendReceipt, Transport, TransportError,
};
use flock_core::MessageId;

/// Roster member fixture
pub fn member(address: &str, name: &str, is_admin: bool) -> Member {
    Member::new(address.to_string(), name.to_string(), is_admin)
}

/// A roster of `n` plain members: +15550001001, +15550001002, ...
pub fn roster(n: usize) -> Vec<Member> {
    (1..=n)
        .map(|i| member(&format!("+155500010{i:02}"), &format!("Member {i}"), false))
        .collect()
}

// ============================================================================
// Directory
// ============================================================================

/// In-memory directory
#[derive(Default)]
pub struct MemoryDirectory {
    members: Mutex<Vec<Member>>,
}

impl MemoryDirectory {
    pub fn new(members: Vec<Member>) -> Arc<Self> {
        Arc::new(Self {
            members: Mutex::new(members),
        })
    }
}

#[async_trait]
impl DirectoryRepository for MemoryDirectory {
    async fn active_recipients(&self, exclude: Option<&str>) -> RepoResult<Vec<Member>> {
        Ok(self
            .members
            .lock()
            .iter()
            .filter(|m| m.active && exclude != Some(m.address.as_str()))
            .cloned()
            .collect())
    }

    async fn identity(&self, address: &str) -> RepoResult<Option<Member>> {
        Ok(self
            .members
            .lock()
            .iter()
            .find(|m| m.active && m.address == address)
            .cloned())
    }

    async fn member_count(&self) -> RepoResult<i64> {
        Ok(self.members.lock().iter().filter(|m| m.active).count() as i64)
    }
}

// ============================================================================
// Broadcast ledger
// ============================================================================

/// In-memory append-only broadcast ledger
#[derive(Default)]
pub struct MemoryLedger {
    broadcasts: Mutex<Vec<Broadcast>>,
}

impl MemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All stored broadcasts, in insertion order
    pub fn all(&self) -> Vec<Broadcast> {
        self.broadcasts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.broadcasts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BroadcastRepository for MemoryLedger {
    async fn save(&self, broadcast: &Broadcast) -> RepoResult<()> {
        self.broadcasts.lock().push(broadcast.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Broadcast>> {
        Ok(self.broadcasts.lock().iter().find(|b| b.id == id).cloned())
    }

    async fn recent(
        &self,
        since: DateTime<Utc>,
        exclude_sender: Option<&str>,
        limit: i64,
    ) -> RepoResult<Vec<Broadcast>> {
        let mut matches: Vec<Broadcast> = self
            .broadcasts
            .lock()
            .iter()
            .filter(|b| b.created_at >= since)
            .filter(|b| exclude_sender != Some(b.sender_address.as_str()))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn latest(&self, limit: i64) -> RepoResult<Vec<Broadcast>> {
        let mut all = self.broadcasts.lock().clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> RepoResult<i64> {
        Ok(self
            .broadcasts
            .lock()
            .iter()
            .filter(|b| b.created_at >= since)
            .count() as i64)
    }

    async fn update_summary(
        &self,
        id: MessageId,
        summary: Option<&str>,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut broadcasts = self.broadcasts.lock();
        if let Some(b) = broadcasts.iter_mut().find(|b| b.id == id) {
            b.reaction_summary = summary.map(String::from);
            b.last_reaction_update = Some(at);
        }
        Ok(())
    }
}

// ============================================================================
// Reaction store
// ============================================================================

/// In-memory reaction store keyed by (broadcast, reactor)
#[derive(Default)]
pub struct MemoryReactions {
    rows: Mutex<HashMap<ReactionKey, Reaction>>,
}

impl MemoryReactions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of rows (not active reactions)
    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn get(&self, broadcast_id: MessageId, reactor: &str) -> Option<Reaction> {
        self.rows
            .lock()
            .get(&ReactionKey {
                broadcast_id,
                reactor_address: reactor.to_string(),
            })
            .cloned()
    }

    pub fn all(&self) -> Vec<Reaction> {
        self.rows.lock().values().cloned().collect()
    }
}

#[async_trait]
impl ReactionRepository for MemoryReactions {
    async fn find(
        &self,
        broadcast_id: MessageId,
        reactor_address: &str,
    ) -> RepoResult<Option<Reaction>> {
        Ok(self.get(broadcast_id, reactor_address))
    }

    async fn upsert(&self, reaction: &Reaction) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        let key = reaction.key();
        let mut stored = reaction.clone();
        // processed is monotonic, matching the storage-level behavior
        if let Some(existing) = rows.get(&key) {
            stored.processed = stored.processed || existing.processed;
        }
        rows.insert(key, stored);
        Ok(())
    }

    async fn active_counts(&self, broadcast_id: MessageId) -> RepoResult<Vec<ReactionCount>> {
        let mut tally: HashMap<String, i64> = HashMap::new();
        for reaction in self.rows.lock().values() {
            if reaction.broadcast_id == broadcast_id && reaction.is_active {
                *tally.entry(reaction.emoji.clone()).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<ReactionCount> = tally
            .into_iter()
            .map(|(emoji, count)| ReactionCount::new(emoji, count))
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.emoji.cmp(&b.emoji)));
        Ok(counts)
    }

    async fn unprocessed_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<Reaction>> {
        Ok(self
            .rows
            .lock()
            .values()
            .filter(|r| r.is_active && !r.processed && r.created_at >= since)
            .cloned()
            .collect())
    }

    async fn mark_processed(&self, keys: &[ReactionKey]) -> RepoResult<()> {
        let mut rows = self.rows.lock();
        for key in keys {
            if let Some(reaction) = rows.get_mut(key) {
                reaction.processed = true;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Delivery log
// ============================================================================

/// In-memory delivery log
#[derive(Default)]
pub struct MemoryDeliveries {
    attempts: Mutex<Vec<DeliveryAttempt>>,
}

impl MemoryDeliveries {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<DeliveryAttempt> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl DeliveryRepository for MemoryDeliveries {
    async fn record(&self, attempts: &[DeliveryAttempt]) -> RepoResult<()> {
        self.attempts.lock().extend_from_slice(attempts);
        Ok(())
    }
}

// ============================================================================
// Blob store
// ============================================================================

/// In-memory blob store; can be switched to fail for degradation tests
#[derive(Default)]
pub struct MemoryBlobStore {
    counter: Mutex<u64>,
    failing: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent store call fail
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, _bytes: &[u8], content_type: &str) -> Result<String, BlobError> {
        if *self.failing.lock() {
            return Err(BlobError::Storage("blob store offline".to_string()));
        }
        let mut counter = self.counter.lock();
        *counter += 1;
        Ok(format!(
            "mem://blob/{}.{}",
            *counter,
            content_type.replace('/', "-")
        ))
    }
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Default)]
struct MockTransportState {
    sent: Vec<(String, String)>,
    fail_always: HashSet<String>,
    fail_remaining: HashMap<String, u32>,
    delays: HashMap<String, Duration>,
    counter: u64,
}

/// Scriptable transport double: per-address failures, transient failures,
/// and artificial delays for timeout tests
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockTransportState>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every send to this address fails
    pub fn fail_always(&self, address: &str) {
        self.state.lock().fail_always.insert(address.to_string());
    }

    /// The next `n` sends to this address fail, later ones succeed
    pub fn fail_times(&self, address: &str, n: u32) {
        self.state
            .lock()
            .fail_remaining
            .insert(address.to_string(), n);
    }

    /// Every send to this address stalls for `delay` first
    pub fn delay(&self, address: &str, delay: Duration) {
        self.state.lock().delays.insert(address.to_string(), delay);
    }

    /// All successful sends as (address, text)
    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.lock().sent.clone()
    }

    /// Texts of all successful sends, in order
    pub fn texts(&self) -> Vec<String> {
        self.state
            .lock()
            .sent
            .iter()
            .map(|(_, t)| t.clone())
            .collect()
    }

    /// Successful sends to one address
    pub fn sent_to(&self, address: &str) -> Vec<String> {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|(a, _)| a == address)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, address: &str, text: &str) -> Result<SendReceipt, TransportError> {
        let delay = self.state.lock().delays.get(address).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.fail_always.contains(address) {
            return Err(TransportError::Rejected {
                address: address.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        if let Some(remaining) = state.fail_remaining.get_mut(address) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::Unavailable(
                    "scripted transient".to_string(),
                ));
            }
        }

        state.counter += 1;
        state.sent.push((address.to_string(), text.to_string()));
        Ok(SendReceipt::new(format!("mock-{}", state.counter)))
    }
}
