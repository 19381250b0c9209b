//! Republish Use Case - Manual Re-trigger of a Round's Publication
//!
//! Loads the last logged report for a round and runs the publisher on
//! it again. The report bytes are the ones originally built, so the
//! report content id is unchanged; anchors are simply rewritten.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::domain::artifact::PublicationSummary;
use crate::error::OracleError;
use crate::ports::content_store::ContentStore;
use crate::ports::ledger::LedgerGateway;
use crate::ports::renderer::ArtifactRenderer;
use crate::ports::repository::{PublicationRecord, PublicationRepository};

use super::publisher::ArtifactPublisher;

/// Re-publishes logged reports.
pub struct Republish<L, S, R, P>
where
  L: LedgerGateway,
  S: ContentStore,
  R: ArtifactRenderer,
  P: PublicationRepository,
{
  publisher: ArtifactPublisher<L, S, R>,
  repository: Arc<P>,
  run_id: String,
}

impl<L, S, R, P> Republish<L, S, R, P>
where
  L: LedgerGateway,
  S: ContentStore,
  R: ArtifactRenderer,
  P: PublicationRepository,
{
  /// Create a new republish use case.
  pub fn new(publisher: ArtifactPublisher<L, S, R>, repository: Arc<P>, run_id: impl Into<String>) -> Self {
    Self {
      publisher,
      repository,
      run_id: run_id.into(),
    }
  }

  /// Publish round `round_id` again from the log.
  #[instrument(skip(self))]
  pub async fn run(&self, round_id: u64) -> Result<PublicationSummary, OracleError> {
    let report = self
      .repository
      .latest_report(round_id)
      .await
      .map_err(|e| OracleError::Configuration(format!("reading publication log: {e:#}")))?
      .ok_or_else(|| {
        OracleError::Configuration(format!("no logged report for round {round_id}"))
      })?;

    info!(round_id, outcome = report.outcome_label(), "Re-publishing logged report");
    let summary = self.publisher.publish(&report).await;

    let record = PublicationRecord {
      run_id: self.run_id.clone(),
      logged_at: Utc::now(),
      report,
      summary: summary.clone(),
    };
    if let Err(e) = self.repository.append(&record).await {
      warn!(round_id, error = %e, "Publication log append failed");
    }

    Ok(summary)
  }
}
