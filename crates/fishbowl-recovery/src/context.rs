//! Per-call recovery context

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// What the caller knows about the operation that failed.
///
/// `channel` keys both circuit breaking and retry ceilings. Operation-specific
/// fields ride along in `extra` and are flattened into the JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryContext {
    /// IPC channel of the failed operation, e.g. `db:agents:create`
    pub channel: String,

    /// File the operation was touching, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Any other operation-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecoveryContext {
    /// Context for a failure on `channel`.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Default::default()
        }
    }

    /// Attach the file the operation was touching.
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Attach an arbitrary field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The attached file path, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Look up an extra field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let context = RecoveryContext::new("fs:config:copy")
            .with_file_path("/tmp/fishbowl/config.json")
            .with_field("agentId", "agent-1")
            .with_field("attempt", 2);

        assert_eq!(context.channel, "fs:config:copy");
        assert_eq!(context.file_path(), Some(Path::new("/tmp/fishbowl/config.json")));
        assert_eq!(context.field("agentId"), Some(&json!("agent-1")));
        assert_eq!(context.field("attempt"), Some(&json!(2)));
        assert_eq!(context.field("missing"), None);
    }

    #[test]
    fn test_json_shape() {
        let context = RecoveryContext::new("db:agents:create").with_field("agentId", "a1");
        let value = serde_json::to_value(&context).unwrap();
        assert_eq!(value, json!({"channel": "db:agents:create", "agentId": "a1"}));

        let parsed: RecoveryContext = serde_json::from_value(json!({
            "channel": "fs:copy",
            "filePath": "/data/x.db",
            "size": 10
        }))
        .unwrap();
        assert_eq!(parsed.file_path(), Some(Path::new("/data/x.db")));
        assert_eq!(parsed.field("size"), Some(&json!(10)));
        assert!(parsed.field("filePath").is_none());
    }
}
