//! Service context - dependency container for engine services
//!
//! Holds the ports (directory, ledger, transport, blob store), the id
//! generator, the engine configuration, and the per-row reaction locks.

use std::sync::Arc;

use dashmap::DashMap;
use flock_common::EngineConfig;
use flock_core::entities::ReactionKey;
use flock_core::traits::{
    BlobStore, BroadcastRepository, DeliveryRepository, DirectoryRepository, ReactionRepository,
    Transport,
};
use flock_core::{MessageId, MessageIdGenerator};
use tokio::sync::Mutex;

/// Service context containing all dependencies
///
/// Passed by reference to every engine service. Provides:
/// - Ledger and directory repositories
/// - The outbound transport and blob store
/// - MessageId generation
/// - Engine tuning (pool size, retries, windows)
/// - The per-(broadcast, reactor) lock registry used by the aggregator
#[derive(Clone)]
pub struct ServiceContext {
    directory: Arc<dyn DirectoryRepository>,
    broadcasts: Arc<dyn BroadcastRepository>,
    reactions: Arc<dyn ReactionRepository>,
    deliveries: Arc<dyn DeliveryRepository>,

    transport: Arc<dyn Transport>,
    blob_store: Arc<dyn BlobStore>,

    id_generator: Arc<MessageIdGenerator>,
    engine: EngineConfig,

    // Row-scoped locks: double-reacts on the same (broadcast, reactor) key
    // serialize here; different reactors proceed concurrently.
    reaction_locks: Arc<DashMap<ReactionKey, Arc<Mutex<()>>>>,
}

impl ServiceContext {
    /// Get the directory repository
    pub fn directory(&self) -> &dyn DirectoryRepository {
        self.directory.as_ref()
    }

    /// Get the broadcast ledger
    pub fn broadcasts(&self) -> &dyn BroadcastRepository {
        self.broadcasts.as_ref()
    }

    /// Get the reaction store
    pub fn reactions(&self) -> &dyn ReactionRepository {
        self.reactions.as_ref()
    }

    /// Get the delivery log
    pub fn deliveries(&self) -> &dyn DeliveryRepository {
        self.deliveries.as_ref()
    }

    /// Get the outbound transport
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Get the attachment blob store
    pub fn blob_store(&self) -> &dyn BlobStore {
        self.blob_store.as_ref()
    }

    /// Get the engine configuration
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Generate a new MessageId
    pub fn generate_id(&self) -> MessageId {
        self.id_generator.generate()
    }

    /// Lock guarding one (broadcast, reactor) reaction row
    pub fn reaction_lock(&self, key: &ReactionKey) -> Arc<Mutex<()>> {
        self.reaction_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("engine", &self.engine)
            .field("reaction_locks", &self.reaction_locks.len())
            .finish()
    }
}

/// Builder for creating ServiceContext
pub struct ServiceContextBuilder {
    directory: Option<Arc<dyn DirectoryRepository>>,
    broadcasts: Option<Arc<dyn BroadcastRepository>>,
    reactions: Option<Arc<dyn ReactionRepository>>,
    deliveries: Option<Arc<dyn DeliveryRepository>>,
    transport: Option<Arc<dyn Transport>>,
    blob_store: Option<Arc<dyn BlobStore>>,
    id_generator: Option<Arc<MessageIdGenerator>>,
    engine: EngineConfig,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            directory: None,
            broadcasts: None,
            reactions: None,
            deliveries: None,
            transport: None,
            blob_store: None,
            id_generator: None,
            engine: EngineConfig::default(),
        }
    }

    pub fn directory(mut self, repo: Arc<dyn DirectoryRepository>) -> Self {
        self.directory = Some(repo);
        self
    }

    pub fn broadcasts(mut self, repo: Arc<dyn BroadcastRepository>) -> Self {
        self.broadcasts = Some(repo);
        self
    }

    pub fn reactions(mut self, repo: Arc<dyn ReactionRepository>) -> Self {
        self.reactions = Some(repo);
        self
    }

    pub fn deliveries(mut self, repo: Arc<dyn DeliveryRepository>) -> Self {
        self.deliveries = Some(repo);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn id_generator(mut self, generator: Arc<MessageIdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    pub fn engine(mut self, config: EngineConfig) -> Self {
        self.engine = config;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> super::error::ServiceResult<ServiceContext> {
        use super::error::ServiceError;

        Ok(ServiceContext {
            directory: self
                .directory
                .ok_or_else(|| ServiceError::validation("directory is required"))?,
            broadcasts: self
                .broadcasts
                .ok_or_else(|| ServiceError::validation("broadcasts is required"))?,
            reactions: self
                .reactions
                .ok_or_else(|| ServiceError::validation("reactions is required"))?,
            deliveries: self
                .deliveries
                .ok_or_else(|| ServiceError::validation("deliveries is required"))?,
            transport: self
                .transport
                .ok_or_else(|| ServiceError::validation("transport is required"))?,
            blob_store: self
                .blob_store
                .ok_or_else(|| ServiceError::validation("blob_store is required"))?,
            id_generator: self
                .id_generator
                .unwrap_or_else(|| Arc::new(MessageIdGenerator::default())),
            engine: self.engine,
            reaction_locks: Arc::new(DashMap::new()),
        })
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
