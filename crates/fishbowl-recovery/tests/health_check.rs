//! `ErrorRecoveryManager::perform_health_check`

mod common;

use common::{FixedMemory, MockCache, MockCredentials, MockDatabase, harness, harness_with};
use fishbowl_recovery::{
    ErrorRecoveryConfig, ErrorRecoveryManager, HealthReport, MemoryUsage, RecoveryServices,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_healthy_environment() {
    let temp = tempfile::tempdir().unwrap();
    let h = harness(temp.path());

    let report = h.manager.perform_health_check().await;
    assert_eq!(
        report,
        HealthReport {
            database: true,
            secure_storage: true,
            filesystem: true,
            memory: true,
        }
    );
    assert!(report.all_healthy());

    let json = serde_json::to_value(report).unwrap();
    for key in ["database", "secureStorage", "filesystem", "memory"] {
        assert!(json[key].is_boolean(), "{key} missing");
    }
}

#[tokio::test]
async fn test_unhealthy_database_and_failing_keychain() {
    let temp = tempfile::tempdir().unwrap();
    let h = harness(temp.path());
    h.database.unhealthy.store(true, Ordering::SeqCst);
    h.credentials.broken.store(true, Ordering::SeqCst);

    let report = h.manager.perform_health_check().await;
    assert!(!report.database);
    assert!(!report.secure_storage);
    assert!(report.filesystem);
    assert!(report.memory);
}

#[tokio::test]
async fn test_panicking_probe_reports_false() {
    let temp = tempfile::tempdir().unwrap();
    let h = harness(temp.path());
    h.credentials.panic_on_probe.store(true, Ordering::SeqCst);

    let report = h.manager.perform_health_check().await;
    assert!(!report.secure_storage);
    assert!(report.database);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_probe_times_out() {
    let temp = tempfile::tempdir().unwrap();
    let h = harness_with(
        ErrorRecoveryConfig::default().with_health_check_timeout(Duration::from_secs(2)),
        temp.path(),
    );
    h.database.hang_ping.store(true, Ordering::SeqCst);

    let started = tokio::time::Instant::now();
    let report = h.manager.perform_health_check().await;

    assert!(!report.database);
    assert!(report.secure_storage);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_missing_data_dir() {
    let temp = tempfile::tempdir().unwrap();
    let h = harness(&temp.path().join("not-created"));

    let report = h.manager.perform_health_check().await;
    assert!(!report.filesystem);
}

fn manager_with_memory(memory: FixedMemory, data_dir: &std::path::Path) -> ErrorRecoveryManager {
    let services = RecoveryServices::builder()
        .database(Arc::new(MockDatabase::default()))
        .credentials(Arc::new(MockCredentials::default()))
        .cache(Arc::new(MockCache {
            entries: AtomicUsize::new(0),
        }))
        .memory_monitor(Arc::new(memory))
        .data_dir(data_dir)
        .build()
        .unwrap();
    ErrorRecoveryManager::new(ErrorRecoveryConfig::default(), services)
}

#[tokio::test]
async fn test_memory_pressure() {
    let temp = tempfile::tempdir().unwrap();

    let pressured = manager_with_memory(
        FixedMemory(Some(MemoryUsage {
            used_bytes: 95,
            total_bytes: 100,
        })),
        temp.path(),
    );
    assert!(!pressured.perform_health_check().await.memory);

    let unknown = manager_with_memory(FixedMemory(None), temp.path());
    assert!(!unknown.perform_health_check().await.memory);

    let fine = manager_with_memory(FixedMemory::healthy(), temp.path());
    assert!(fine.perform_health_check().await.memory);
}
