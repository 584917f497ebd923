//! Subsystem health probes

use crate::services::{CredentialStore, DatabaseConnector, MemoryMonitor, RecoveryServices};
use crate::stats::HealthReport;
use async_trait::async_trait;
use fishbowl_core::health::{HealthProbe, ProbeError, run_probe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

struct DatabaseProbe(Arc<dyn DatabaseConnector>);

#[async_trait]
impl HealthProbe for DatabaseProbe {
    async fn probe(&self) -> Result<bool, ProbeError> {
        Ok(self.0.ping().await?)
    }
}

struct SecureStorageProbe(Arc<dyn CredentialStore>);

#[async_trait]
impl HealthProbe for SecureStorageProbe {
    async fn probe(&self) -> Result<bool, ProbeError> {
        Ok(self.0.is_available().await?)
    }
}

/// Healthy when the directory exists and a marker file can be created and
/// removed in it.
struct FilesystemProbe(PathBuf);

#[async_trait]
impl HealthProbe for FilesystemProbe {
    async fn probe(&self) -> Result<bool, ProbeError> {
        if !tokio::fs::metadata(&self.0).await?.is_dir() {
            return Ok(false);
        }
        let marker = self
            .0
            .join(format!(".fishbowl-health-{}", std::process::id()));
        tokio::fs::write(&marker, b"").await?;
        tokio::fs::remove_file(&marker).await?;
        Ok(true)
    }
}

struct MemoryProbe {
    monitor: Arc<dyn MemoryMonitor>,
    threshold: f64,
}

#[async_trait]
impl HealthProbe for MemoryProbe {
    async fn probe(&self) -> Result<bool, ProbeError> {
        let ratio = self
            .monitor
            .usage()
            .and_then(|usage| usage.ratio())
            .ok_or("memory statistics unavailable")?;
        Ok(ratio < self.threshold)
    }
}

/// One probe per subsystem, built once per manager.
pub(crate) struct HealthProbes {
    database: Arc<dyn HealthProbe>,
    secure_storage: Arc<dyn HealthProbe>,
    filesystem: Arc<dyn HealthProbe>,
    memory: Arc<dyn HealthProbe>,
}

impl HealthProbes {
    pub(crate) fn new(services: &RecoveryServices, memory_threshold: f64) -> Self {
        Self {
            database: Arc::new(DatabaseProbe(Arc::clone(&services.database))),
            secure_storage: Arc::new(SecureStorageProbe(Arc::clone(&services.credentials))),
            filesystem: Arc::new(FilesystemProbe(services.data_dir.clone())),
            memory: Arc::new(MemoryProbe {
                monitor: Arc::clone(&services.memory),
                threshold: memory_threshold,
            }),
        }
    }

    /// Run all probes concurrently.
    pub(crate) async fn run(&self, timeout: Duration) -> HealthReport {
        let (database, secure_storage, filesystem, memory) = tokio::join!(
            run_probe("database", Arc::clone(&self.database), timeout),
            run_probe("secure-storage", Arc::clone(&self.secure_storage), timeout),
            run_probe("filesystem", Arc::clone(&self.filesystem), timeout),
            run_probe("memory", Arc::clone(&self.memory), timeout),
        );

        HealthReport {
            database,
            secure_storage,
            filesystem,
            memory,
        }
    }
}
