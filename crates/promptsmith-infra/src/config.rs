//! Service configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.promptsmith/` in
//! production) and deserializes it into [`ServiceConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::Path;

use promptsmith_types::config::ServiceConfig;

/// Load service configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`ServiceConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_service_config(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}
