//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    rpc_url = %config.ledger.rpc_url,
    store = %config.content_store.api_url,
    market = %config.ledger.market_symbol,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

fn is_url(value: &str, schemes: &[&str]) -> bool {
  schemes
    .iter()
    .any(|scheme| value.starts_with(&format!("{scheme}://")))
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.bot.name.is_empty(), "bot.name must not be empty");

  // Ledger
  anyhow::ensure!(
    is_url(&config.ledger.rpc_url, &["http", "https", "ws", "wss"])
      || config.ledger.rpc_url.ends_with(".ipc"),
    "ledger.rpc_url must be an http(s)/ws(s) URL or an .ipc path, got {}",
    config.ledger.rpc_url
  );
  anyhow::ensure!(
    config.ledger.tx_timeout_secs > 0,
    "ledger.tx_timeout_secs must be positive"
  );
  anyhow::ensure!(
    !config.ledger.market_symbol.trim().is_empty(),
    "ledger.market_symbol must not be empty"
  );

  // Content store
  anyhow::ensure!(
    is_url(&config.content_store.api_url, &["http", "https"]),
    "content_store.api_url must be an http(s) URL, got {}",
    config.content_store.api_url
  );
  anyhow::ensure!(
    config.content_store.mfs_dir.starts_with('/') && config.content_store.mfs_dir.len() > 1,
    "content_store.mfs_dir must be an absolute, non-root path, got {}",
    config.content_store.mfs_dir
  );
  anyhow::ensure!(
    config.content_store.timeout_secs > 0,
    "content_store.timeout_secs must be positive"
  );

  // Metrics
  if config.metrics.enabled {
    anyhow::ensure!(
      config.metrics.bind_address.parse::<std::net::SocketAddr>().is_ok(),
      "metrics.bind_address must be host:port, got {}",
      config.metrics.bind_address
    );
  }

  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "persistence.data_dir must not be empty"
  );

  Ok(())
}
