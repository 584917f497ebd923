//! Shared test doubles for the recovery integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use fishbowl_recovery::{
    CacheCleaner, CredentialStore, DatabaseConnector, ErrorRecoveryConfig, ErrorRecoveryManager,
    MemoryMonitor, MemoryUsage, RecoveryError, RecoveryServices, Result,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

/// Database double with switchable ping and reconnect behavior.
#[derive(Default)]
pub struct MockDatabase {
    pub reconnects: AtomicU32,
    pub fail_reconnect: AtomicBool,
    pub unhealthy: AtomicBool,
    pub hang_ping: AtomicBool,
}

#[async_trait]
impl DatabaseConnector for MockDatabase {
    async fn reconnect(&self) -> Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_reconnect.load(Ordering::SeqCst) {
            return Err(RecoveryError::Database(
                "SQLITE_CANTOPEN: unable to open database file".to_string(),
            ));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        if self.hang_ping.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(!self.unhealthy.load(Ordering::SeqCst))
    }
}

/// Credential store double.
#[derive(Default)]
pub struct MockCredentials {
    pub fallback_enabled: AtomicBool,
    pub broken: AtomicBool,
    pub panic_on_probe: AtomicBool,
}

#[async_trait]
impl CredentialStore for MockCredentials {
    async fn is_available(&self) -> Result<bool> {
        if self.panic_on_probe.load(Ordering::SeqCst) {
            panic!("keychain daemon crashed");
        }
        if self.broken.load(Ordering::SeqCst) {
            return Err(RecoveryError::CredentialStore("keychain locked".to_string()));
        }
        Ok(true)
    }

    async fn enable_fallback(&self) -> Result<()> {
        self.fallback_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Cache double counting its entries.
pub struct MockCache {
    pub entries: AtomicUsize,
}

#[async_trait]
impl CacheCleaner for MockCache {
    async fn clear(&self) -> usize {
        self.entries.swap(0, Ordering::SeqCst)
    }
}

/// Memory monitor reporting a fixed usage.
pub struct FixedMemory(pub Option<MemoryUsage>);

impl FixedMemory {
    pub fn healthy() -> Self {
        Self(Some(MemoryUsage {
            used_bytes: 2 << 30,
            total_bytes: 16 << 30,
        }))
    }
}

impl MemoryMonitor for FixedMemory {
    fn usage(&self) -> Option<MemoryUsage> {
        self.0
    }
}

/// Collaborators handed to a manager, kept so tests can flip their behavior.
pub struct Harness {
    pub database: Arc<MockDatabase>,
    pub credentials: Arc<MockCredentials>,
    pub cache: Arc<MockCache>,
    pub manager: ErrorRecoveryManager,
}

pub fn services(
    database: Arc<MockDatabase>,
    credentials: Arc<MockCredentials>,
    cache: Arc<MockCache>,
    data_dir: &Path,
) -> RecoveryServices {
    RecoveryServices::builder()
        .database(database)
        .credentials(credentials)
        .cache(cache)
        .memory_monitor(Arc::new(FixedMemory::healthy()))
        .data_dir(data_dir)
        .build()
        .unwrap()
}

pub fn harness_with(config: ErrorRecoveryConfig, data_dir: &Path) -> Harness {
    let database = Arc::new(MockDatabase::default());
    let credentials = Arc::new(MockCredentials::default());
    let cache = Arc::new(MockCache {
        entries: AtomicUsize::new(16),
    });

    let manager = ErrorRecoveryManager::new(
        config,
        services(database.clone(), credentials.clone(), cache.clone(), data_dir),
    );

    Harness {
        database,
        credentials,
        cache,
        manager,
    }
}

pub fn harness(data_dir: &Path) -> Harness {
    harness_with(ErrorRecoveryConfig::default(), data_dir)
}

pub fn err(message: &str) -> std::io::Error {
    std::io::Error::other(message.to_string())
}
