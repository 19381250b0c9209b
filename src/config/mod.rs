//! Configuration Module - TOML-based Oracle Configuration
//!
//! Loads and validates configuration from `config.toml`. Endpoints,
//! timeouts and storage locations live here; contract addresses come
//! from the environment (see `addresses`). Round count and timing are
//! compiled in and read from the ledger, never configured.

pub mod addresses;
pub mod loader;

use serde::Deserialize;

/// Top-level oracle configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the oracle connects to anything.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Bot identity and metadata.
  pub bot: BotConfig,
  /// Ledger RPC endpoint and market selection.
  pub ledger: LedgerConfig,
  /// Content-addressable store endpoint.
  pub content_store: ContentStoreConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Persistence configuration.
  #[serde(default)]
  pub persistence: PersistenceConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable bot name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Ledger connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
  /// Node RPC endpoint (http, ws or ipc).
  pub rpc_url: String,
  /// Maximum wait for a transaction to be mined (seconds).
  #[serde(default = "default_tx_timeout")]
  pub tx_timeout_secs: u64,
  /// Market symbol; the market id is its keccak256.
  #[serde(default = "default_market_symbol")]
  pub market_symbol: String,
}

/// Content store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentStoreConfig {
  /// Kubo RPC base URL.
  pub api_url: String,
  /// Mutable directory mirroring the latest report per round.
  #[serde(default = "default_mfs_dir")]
  pub mfs_dir: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Serve `/metrics`, `/live` and `/ready`.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
    }
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for the publication log.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_tx_timeout() -> u64 {
  60
}

fn default_market_symbol() -> String {
  "BTC/USD".to_string()
}

fn default_mfs_dir() -> String {
  "/round-reports".to_string()
}

fn default_timeout() -> u64 {
  30
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_data_dir() -> String {
  "data".to_string()
}
