use crate::context::RecoveryContext;
use crate::error::{OperationError, Result};
use crate::strategy::{RecoveryOutcome, RecoveryStrategy, error_mentions};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const KEYWORDS: &[&str] = &["enoent", "no such file", "file not found"];

/// Creates the directory a failed file operation expected to exist.
///
/// The directory is the parent of `context.file_path` when one is given,
/// otherwise the application data directory. Relative file paths are
/// resolved against the data directory, never the working directory.
pub struct FilesystemStrategy {
    data_dir: PathBuf,
}

impl FilesystemStrategy {
    /// Strategy falling back to `data_dir` when the context names no file.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn target_dir(&self, context: &RecoveryContext) -> PathBuf {
        let Some(path) = context.file_path() else {
            return self.data_dir.clone();
        };
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        };
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.data_dir.clone())
    }
}

#[async_trait]
impl RecoveryStrategy for FilesystemStrategy {
    fn can_recover(&self, error: &OperationError) -> bool {
        let not_found = error
            .downcast_ref::<io::Error>()
            .is_some_and(|err| err.kind() == io::ErrorKind::NotFound);
        not_found || error_mentions(error, KEYWORDS)
    }

    async fn recover(
        &self,
        _error: &OperationError,
        context: &RecoveryContext,
    ) -> Result<RecoveryOutcome> {
        let dir = self.target_dir(context);
        tokio::fs::create_dir_all(&dir).await?;
        info!(channel = %context.channel, dir = %dir.display(), "Ensured directory exists");
        Ok(RecoveryOutcome::recovered(format!(
            "Ensured directory exists: {}",
            dir.display()
        )))
    }

    fn max_retries(&self) -> Option<u32> {
        Some(3)
    }

    fn retry_delay(&self) -> Option<Duration> {
        Some(Duration::from_millis(500))
    }
}
