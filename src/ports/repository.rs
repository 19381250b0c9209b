//! Repository Port - Publication Log Interface
//!
//! Every built report is appended together with its publication
//! summary. JSONL keeps the log append-only and greppable, and lets an
//! operator re-publish a round from the exact bytes that were built.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::artifact::PublicationSummary;
use crate::domain::report::RoundReport;

/// One line of the publication log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
  /// Identifier of the oracle run that produced the record.
  pub run_id: String,
  /// Wall-clock time of the append.
  pub logged_at: DateTime<Utc>,
  /// The canonical report as built.
  pub report: RoundReport,
  /// What was uploaded and anchored.
  pub summary: PublicationSummary,
}

/// Trait for publication persistence providers.
#[async_trait]
pub trait PublicationRepository: Send + Sync + 'static {
  /// Append a record to the log.
  async fn append(&self, record: &PublicationRecord) -> anyhow::Result<()>;

  /// Load all records, oldest first.
  async fn load_all(&self) -> anyhow::Result<Vec<PublicationRecord>>;

  /// Most recently logged report for `round_id`.
  async fn latest_report(&self, round_id: u64) -> anyhow::Result<Option<RoundReport>>;

  /// Check if the log location is writable.
  async fn is_healthy(&self) -> bool;
}
