//! Global configuration loader for Gridmind.
//!
//! Reads `config.toml` from the data directory (`~/.gridmind/` in production)
//! and deserializes it into [`GridmindConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::{Path, PathBuf};

use gridmind_types::config::GridmindConfig;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GridmindConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> GridmindConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GridmindConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GridmindConfig::default();
        }
    };

    match toml::from_str::<GridmindConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GridmindConfig::default()
        }
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `GRIDMIND_DATA_DIR` environment variable
/// 2. Platform-specific home directory (`~/.gridmind` on macOS/Linux)
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GRIDMIND_DATA_DIR") {
        return PathBuf::from(dir);
    }

    // Use home directory fallback: ~/.gridmind
    if let Some(home) = dirs::home_dir() {
        return home.join(".gridmind");
    }

    // Last resort: current directory
    PathBuf::from(".gridmind")
}
