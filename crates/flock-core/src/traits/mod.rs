//! Port traits - interfaces the domain needs, implemented by infrastructure

mod repositories;
mod transport;

pub use repositories::{
    BroadcastRepository, DeliveryRepository, DirectoryRepository, ReactionRepository, RepoResult,
};
pub use transport::{BlobError, BlobStore, SendReceipt, Transport, TransportError};
