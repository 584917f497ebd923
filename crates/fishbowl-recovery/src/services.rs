//! External collaborators used by the built-in strategies and health checks
//!
//! The manager never talks to SQLite, the OS keychain, or the IPC cache
//! directly. The application hands it implementations of these traits through
//! [`RecoveryServices`].

use crate::error::{RecoveryError, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::System;

/// Access to the application database connection.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Close and reopen the connection.
    async fn reconnect(&self) -> Result<()>;

    /// Cheap liveness check, e.g. `SELECT 1`.
    async fn ping(&self) -> Result<bool>;
}

/// Access to the secure credential store (OS keychain) and its fallback.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether the primary secure backend is usable.
    async fn is_available(&self) -> Result<bool>;

    /// Switch credential reads and writes to the fallback backend.
    async fn enable_fallback(&self) -> Result<()>;
}

/// Process-wide cache that can be dropped to relieve memory pressure.
#[async_trait]
pub trait CacheCleaner: Send + Sync {
    /// Drop cached entries and return how many were released.
    async fn clear(&self) -> usize;
}

/// Memory usage sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Bytes in use
    pub used_bytes: u64,
    /// Bytes available in total
    pub total_bytes: u64,
}

impl MemoryUsage {
    /// Fraction of memory in use, `None` if the total is unknown.
    pub fn ratio(&self) -> Option<f64> {
        (self.total_bytes > 0).then(|| self.used_bytes as f64 / self.total_bytes as f64)
    }
}

/// Source of memory usage samples.
pub trait MemoryMonitor: Send + Sync {
    /// Current usage, `None` if it cannot be determined.
    fn usage(&self) -> Option<MemoryUsage>;
}

/// [`MemoryMonitor`] backed by system-wide statistics from `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemoryMonitor;

impl MemoryMonitor for SystemMemoryMonitor {
    fn usage(&self) -> Option<MemoryUsage> {
        let mut sys = System::new();
        sys.refresh_memory();

        let usage = MemoryUsage {
            used_bytes: sys.used_memory(),
            total_bytes: sys.total_memory(),
        };
        (usage.total_bytes > 0).then_some(usage)
    }
}

/// Everything the built-in strategies and health probes need from the host
/// application.
#[derive(Clone)]
pub struct RecoveryServices {
    pub(crate) database: Arc<dyn DatabaseConnector>,
    pub(crate) credentials: Arc<dyn CredentialStore>,
    pub(crate) cache: Option<Arc<dyn CacheCleaner>>,
    pub(crate) memory: Arc<dyn MemoryMonitor>,
    pub(crate) data_dir: PathBuf,
}

impl RecoveryServices {
    /// Create a builder
    pub fn builder() -> RecoveryServicesBuilder {
        RecoveryServicesBuilder::default()
    }

    /// Directory repaired by the filesystem strategy when the failing
    /// operation did not name a file, and checked by the filesystem probe.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl fmt::Debug for RecoveryServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryServices")
            .field("cache", &self.cache.is_some())
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RecoveryServices`]
#[derive(Default)]
pub struct RecoveryServicesBuilder {
    database: Option<Arc<dyn DatabaseConnector>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    cache: Option<Arc<dyn CacheCleaner>>,
    memory: Option<Arc<dyn MemoryMonitor>>,
    data_dir: Option<PathBuf>,
}

impl RecoveryServicesBuilder {
    /// Set the database connector (required)
    pub fn database(mut self, database: Arc<dyn DatabaseConnector>) -> Self {
        self.database = Some(database);
        self
    }

    /// Set the credential store (required)
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the cache dropped by the memory strategy
    pub fn cache(mut self, cache: Arc<dyn CacheCleaner>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the memory monitor (defaults to [`SystemMemoryMonitor`])
    pub fn memory_monitor(mut self, memory: Arc<dyn MemoryMonitor>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Set the application data directory (defaults to the OS temp dir)
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Build the services bundle
    pub fn build(self) -> Result<RecoveryServices> {
        let database = self
            .database
            .ok_or_else(|| RecoveryError::Config("database connector required".to_string()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| RecoveryError::Config("credential store required".to_string()))?;

        Ok(RecoveryServices {
            database,
            credentials,
            cache: self.cache,
            memory: self.memory.unwrap_or_else(|| Arc::new(SystemMemoryMonitor)),
            data_dir: self.data_dir.unwrap_or_else(std::env::temp_dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Db;

    #[async_trait]
    impl DatabaseConnector for Db {
        async fn reconnect(&self) -> Result<()> {
            Ok(())
        }
        async fn ping(&self) -> Result<bool> {
            Ok(true)
        }
    }

    struct Creds;

    #[async_trait]
    impl CredentialStore for Creds {
        async fn is_available(&self) -> Result<bool> {
            Ok(true)
        }
        async fn enable_fallback(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_builder_requires_database_and_credentials() {
        let err = RecoveryServices::builder().build().unwrap_err();
        assert!(err.to_string().contains("database connector required"));

        let err = RecoveryServices::builder()
            .database(Arc::new(Db))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("credential store required"));
    }

    #[test]
    fn test_builder_defaults() {
        let services = RecoveryServices::builder()
            .database(Arc::new(Db))
            .credentials(Arc::new(Creds))
            .build()
            .unwrap();

        assert!(services.cache.is_none());
        assert_eq!(services.data_dir(), std::env::temp_dir().as_path());
    }

    #[test]
    fn test_memory_ratio() {
        let usage = MemoryUsage {
            used_bytes: 3,
            total_bytes: 4,
        };
        assert_eq!(usage.ratio(), Some(0.75));

        let unknown = MemoryUsage {
            used_bytes: 0,
            total_bytes: 0,
        };
        assert_eq!(unknown.ratio(), None);
    }

    #[test]
    fn test_system_monitor_reports_sane_values() {
        if let Some(usage) = SystemMemoryMonitor.usage() {
            assert!(usage.used_bytes <= usage.total_bytes);
        }
    }
}
