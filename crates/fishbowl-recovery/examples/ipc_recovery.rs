//! IPC Error Recovery Example
//!
//! Walks through the situations an IPC handler runs into: a recoverable
//! database failure, a keychain outage that degrades to fallback storage, an
//! unknown error, and a channel whose circuit breaker trips.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=fishbowl_recovery=debug cargo run -p fishbowl-recovery --example ipc_recovery
//! ```
//!
//! Configuration is read from `FISHBOWL_RECOVERY_*` environment variables,
//! e.g. `FISHBOWL_RECOVERY_FAILURE_THRESHOLD=2`.

use async_trait::async_trait;
use fishbowl_recovery::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

/// Stand-in for the application's SQLite handle.
struct Sqlite {
    open: AtomicBool,
}

#[async_trait]
impl DatabaseConnector for Sqlite {
    async fn reconnect(&self) -> Result<()> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(self.open.load(Ordering::SeqCst))
    }
}

/// Stand-in for the OS keychain with an encrypted-file fallback.
#[derive(Default)]
struct Keychain {
    fallback: AtomicBool,
}

#[async_trait]
impl CredentialStore for Keychain {
    async fn is_available(&self) -> Result<bool> {
        Ok(!self.fallback.load(Ordering::SeqCst))
    }

    async fn enable_fallback(&self) -> Result<()> {
        self.fallback.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn print_result(label: &str, result: &RecoveryResult) {
    println!(
        "  {label:<28} success={:<5} strategy={:<20} attempts={} message={:?}",
        result.success, result.strategy, result.retry_attempts, result.message
    );
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = tempfile::tempdir()?;
    let services = RecoveryServices::builder()
        .database(Arc::new(Sqlite {
            open: AtomicBool::new(false),
        }))
        .credentials(Arc::new(Keychain::default()))
        .data_dir(data_dir.path())
        .build()?;

    let config = ErrorRecoveryConfig::from_env();
    let manager = ErrorRecoveryManager::try_new(config, services)?;

    println!("Recovering from IPC failures:");

    let result = manager
        .recover_from_error(
            &std::io::Error::other("database connection failed"),
            &RecoveryContext::new("db:agents:create"),
        )
        .await?;
    print_result("db:agents:create", &result);

    let result = manager
        .recover_from_error(
            &std::io::Error::other("keytar operation failed"),
            &RecoveryContext::new("secure:credentials:set"),
        )
        .await?;
    print_result("secure:credentials:set", &result);

    let result = manager
        .recover_from_error(
            &std::io::Error::other("unknown system failure"),
            &RecoveryContext::new("unknown:operation"),
        )
        .await?;
    print_result("unknown:operation", &result);

    let threshold = manager.config().circuit_breaker_failure_threshold;
    manager
        .add_strategy(
            "llm-provider",
            Arc::new(
                ClosureStrategy::matching_keywords(&["provider"], |message, _| {
                    Box::pin(async move {
                        Ok(RecoveryOutcome::failed(format!("Provider still failing: {message}")))
                    })
                })
                .with_max_retries(threshold + 1),
            ),
        )
        .await;

    println!("\nTripping the circuit breaker on llm:chat:send:");
    for _ in 0..=threshold {
        let result = manager
            .recover_from_error(
                &std::io::Error::other("provider returned 503"),
                &RecoveryContext::new("llm:chat:send"),
            )
            .await?;
        print_result("llm:chat:send", &result);
    }

    println!("\nStats:\n{}", serde_json::to_string_pretty(&manager.get_recovery_stats().await)?);
    println!(
        "\nHealth:\n{}",
        serde_json::to_string_pretty(&manager.perform_health_check().await)?
    );

    Ok(())
}
