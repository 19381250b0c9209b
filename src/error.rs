//! Oracle Error Taxonomy
//!
//! Adapters and ports report failures as `anyhow::Error` with context.
//! Use cases classify them into `OracleError` at their boundary so the
//! round loop can decide what to skip: configuration errors abort the
//! run, everything else is logged and the loop moves on.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four publishing steps of a resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
  /// Canonical report upload (plus mutable-directory mirror).
  Report,
  /// Receipt document render + upload.
  Receipt,
  /// Price chart render + upload.
  Chart,
  /// Ledger anchor writes.
  Anchor,
}

impl fmt::Display for PublishStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Report => write!(f, "report"),
      Self::Receipt => write!(f, "receipt"),
      Self::Chart => write!(f, "chart"),
      Self::Anchor => write!(f, "anchor"),
    }
  }
}

/// Classified failures of the round oracle.
#[derive(Debug, Error)]
pub enum OracleError {
  /// Invalid or missing contract address, disabled market, bad constants.
  /// Fatal: the run aborts before the round loop starts.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// A ledger read or write reverted, timed out or could not be sent.
  #[error("ledger action `{action}` failed: {reason}")]
  TransientLedger {
    /// Short action name (`bet_yes`, `heartbeat`, `start_round`, ...).
    action: &'static str,
    /// Rendered cause chain.
    reason: String,
  },

  /// A render or upload failure in one publishing step.
  #[error("artifact step `{step}` failed: {reason}")]
  Artifact {
    /// The step that failed.
    step: PublishStep,
    /// Rendered cause chain.
    reason: String,
  },

  /// The resolved round read back with implausible fields.
  #[error("round {round_id} is inconsistent: {reason}")]
  ReportInconsistency {
    /// Round that was read back.
    round_id: u64,
    /// What was wrong with it.
    reason: String,
  },
}

impl OracleError {
  /// Wrap an adapter error as a transient ledger failure.
  pub fn ledger(action: &'static str, err: &anyhow::Error) -> Self {
    Self::TransientLedger {
      action,
      reason: format!("{err:#}"),
    }
  }

  /// Wrap an adapter error as a failure of one publishing step.
  pub fn artifact(step: PublishStep, err: &anyhow::Error) -> Self {
    Self::Artifact {
      step,
      reason: format!("{err:#}"),
    }
  }

  /// Whether this error must abort the whole run.
  pub const fn is_fatal(&self) -> bool {
    matches!(self, Self::Configuration(_))
  }
}
