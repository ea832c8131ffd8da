//! Quirk configuration using JSON file storage

use crate::error::QuirkError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// A rebadged device handled by an existing quirk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuirkAlias {
    pub manufacturer: String,
    pub model: String,
    /// Name of the quirk descriptor to use
    pub quirk: String,
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuirkConfig {
    pub aliases: Vec<QuirkAlias>,
    /// Quirk names that never match
    pub disabled: Vec<String>,
    /// Buffered attribute events per device
    pub event_capacity: usize,
    /// Buffered outbound commands
    pub outbound_capacity: usize,
    /// Epoch year of the time sync payload
    pub time_offset_year: i32,
}

impl Default for QuirkConfig {
    fn default() -> Self {
        Self {
            aliases: Vec::new(),
            disabled: Vec::new(),
            event_capacity: 64,
            outbound_capacity: 32,
            time_offset_year: 1970,
        }
    }
}

impl QuirkConfig {
    /// Quirk name configured for a manufacturer/model pair
    #[must_use]
    pub fn alias_for(&self, manufacturer: &str, model: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|a| a.manufacturer == manufacturer && a.model == model)
            .map(|a| a.quirk.as_str())
    }

    #[must_use]
    pub fn is_disabled(&self, quirk: &str) -> bool {
        self.disabled.iter().any(|d| d == quirk)
    }
}

/// Load the configuration from a JSON file
///
/// A missing or unreadable file yields the defaults.
pub async fn load_config(path: &Path) -> QuirkConfig {
    match fs::read_to_string(path).await {
        Ok(contents) => match serde_json::from_str::<QuirkConfig>(&contents) {
            Ok(config) => {
                tracing::info!(
                    "Loaded quirk config from {:?} ({} aliases, {} disabled)",
                    path,
                    config.aliases.len(),
                    config.disabled.len()
                );
                config
            }
            Err(e) => {
                tracing::warn!("Failed to parse quirk config {:?}: {}", path, e);
                QuirkConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No quirk config at {:?}, using defaults", path);
            QuirkConfig::default()
        }
        Err(e) => {
            tracing::warn!("Failed to read quirk config {:?}: {}", path, e);
            QuirkConfig::default()
        }
    }
}

/// Save the configuration to a JSON file atomically
#[allow(clippy::missing_errors_doc)]
pub async fn save_config(path: &Path, config: &QuirkConfig) -> Result<(), QuirkError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| QuirkError::Config(e.to_string()))?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json).await?;
    fs::rename(&tmp_path, path).await?;

    tracing::debug!("Saved quirk config to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: QuirkConfig = serde_json::from_str(
            r#"{"aliases": [{"manufacturer": "_TZE200_zzzz", "model": "TS0601", "quirk": "saswell"}]}"#,
        )
        .unwrap();

        assert_eq!(config.alias_for("_TZE200_zzzz", "TS0601"), Some("saswell"));
        assert_eq!(config.alias_for("_TZE200_zzzz", "TS0201"), None);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.time_offset_year, 1970);
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("tuya-quirks-missing/none.json");
        assert_eq!(load_config(&path).await, QuirkConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("tuya-quirks-{}", std::process::id()));
        let path = dir.join("quirks.json");
        let config = QuirkConfig {
            disabled: vec!["maxsmart".to_string()],
            time_offset_year: 2000,
            ..QuirkConfig::default()
        };

        save_config(&path, &config).await.unwrap();
        let loaded = load_config(&path).await;
        assert!(loaded.is_disabled("maxsmart"));
        assert_eq!(loaded.time_offset_year, 2000);

        let _ = fs::remove_dir_all(&dir).await;
    }
}
