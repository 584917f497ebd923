//! Built-in recovery strategies
//!
//! Registered by every manager, in this order:
//!
//! | Name | Applies when the error mentions | Action |
//! |------|--------------------------------|--------|
//! | `database-connection` | database, sqlite | reconnect the database |
//! | `secure-storage` | keytar, keychain, secure storage | switch to fallback credentials |
//! | `network` | network, timeout, econnreset, econnrefused | tell the caller to re-issue |
//! | `filesystem` | enoent, no such file, file not found | create the missing directory |
//! | `memory` | memory, heap | drop the IPC cache |
//!
//! Matching is keyword containment over the lowercased message and its
//! source chain.

mod database;
mod filesystem;
mod memory;
mod network;
mod secure_storage;

pub use database::DatabaseConnectionStrategy;
pub use filesystem::FilesystemStrategy;
pub use memory::MemoryStrategy;
pub use network::NetworkStrategy;
pub use secure_storage::SecureStorageStrategy;

use crate::services::RecoveryServices;
use crate::strategy::RecoveryStrategy;
use std::sync::Arc;

/// Name of the database reconnect strategy
pub const DATABASE_CONNECTION: &str = "database-connection";
/// Name of the credential fallback strategy
pub const SECURE_STORAGE: &str = "secure-storage";
/// Name of the network re-issue strategy
pub const NETWORK: &str = "network";
/// Name of the directory repair strategy
pub const FILESYSTEM: &str = "filesystem";
/// Name of the cache cleanup strategy
pub const MEMORY: &str = "memory";

/// The built-in strategies in registration order.
pub fn builtin(services: &RecoveryServices) -> Vec<(&'static str, Arc<dyn RecoveryStrategy>)> {
    vec![
        (
            DATABASE_CONNECTION,
            Arc::new(DatabaseConnectionStrategy::new(Arc::clone(&services.database))),
        ),
        (
            SECURE_STORAGE,
            Arc::new(SecureStorageStrategy::new(Arc::clone(&services.credentials))),
        ),
        (NETWORK, Arc::new(NetworkStrategy)),
        (
            FILESYSTEM,
            Arc::new(FilesystemStrategy::new(services.data_dir.clone())),
        ),
        (MEMORY, Arc::new(MemoryStrategy::new(services.cache.clone()))),
    ]
}
