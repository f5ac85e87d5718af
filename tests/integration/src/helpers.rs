//! Test harness wiring the in-memory ports into a ServiceContext

use std::sync::Arc;

use flock_common::EngineConfig;
use flock_core::entities::{Broadcast, Member};
use flock_core::traits::BroadcastRepository;
use flock_core::{MessageId, MessageIdGenerator};
use flock_service::{ServiceContext, ServiceContextBuilder};

use crate::fixtures::{
    MemoryBlobStore, MemoryDeliveries, MemoryDirectory, MemoryLedger, MemoryReactions,
    MockTransport,
};

/// Everything a scenario test needs: the context plus handles to every double
pub struct TestHarness {
    pub ctx: Arc<ServiceContext>,
    pub directory: Arc<MemoryDirectory>,
    pub broadcasts: Arc<MemoryLedger>,
    pub reactions: Arc<MemoryReactions>,
    pub deliveries: Arc<MemoryDeliveries>,
    pub blobs: Arc<MemoryBlobStore>,
    pub transport: Arc<MockTransport>,
    id_generator: Arc<MessageIdGenerator>,
}

impl TestHarness {
    /// Build a harness over the given roster with default engine tuning
    pub fn new(members: Vec<Member>) -> Self {
        Self::with_engine(members, EngineConfig::default())
    }

    /// Build a harness with custom engine tuning
    pub fn with_engine(members: Vec<Member>, engine: EngineConfig) -> Self {
        let directory = MemoryDirectory::new(members);
        let broadcasts = MemoryLedger::new();
        let reactions = MemoryReactions::new();
        let deliveries = MemoryDeliveries::new();
        let blobs = MemoryBlobStore::new();
        let transport = MockTransport::new();
        let id_generator = Arc::new(MessageIdGenerator::new(1));

        let ctx = ServiceContextBuilder::new()
            .directory(directory.clone())
            .broadcasts(broadcasts.clone())
            .reactions(reactions.clone())
            .deliveries(deliveries.clone())
            .transport(transport.clone())
            .blob_store(blobs.clone())
            .id_generator(id_generator.clone())
            .engine(engine)
            .build()
            .expect("harness context should build");

        Self {
            ctx: Arc::new(ctx),
            directory,
            broadcasts,
            reactions,
            deliveries,
            blobs,
            transport,
            id_generator,
        }
    }

    /// Seed a broadcast directly into the ledger, bypassing fan-out
    pub async fn seed_broadcast(&self, sender: &Member, text: &str) -> Broadcast {
        let broadcast = Broadcast::new(
            self.id_generator.generate(),
            sender.address.clone(),
            sender.name.clone(),
            text.to_string(),
        );
        self.broadcasts
            .save(&broadcast)
            .await
            .expect("memory ledger save cannot fail");
        broadcast
    }

    /// Reload a broadcast to observe aggregator-owned fields
    pub async fn reload(&self, id: MessageId) -> Broadcast {
        self.broadcasts
            .find_by_id(id)
            .await
            .expect("memory ledger read cannot fail")
            .expect("broadcast should exist")
    }
}
