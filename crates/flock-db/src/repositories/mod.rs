//! PostgreSQL repository implementations

mod broadcast;
mod delivery;
mod directory;
mod error;
mod reaction;

pub use broadcast::PgBroadcastRepository;
pub use delivery::PgDeliveryRepository;
pub use directory::PgDirectoryRepository;
pub use error::map_db_error;
pub use reaction::PgReactionRepository;
