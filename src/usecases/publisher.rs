//! Artifact Publisher Use Case - Upload and Anchor
//!
//! Publishing flow for one report:
//! 1. Upload the canonical JSON, then mirror it into the mutable
//!    directory (mirror failures do not fail the step)
//! 2. Render and upload the receipt
//! 3. Render and upload the chart
//! 4. Anchor every content id obtained, one write per kind
//!
//! Steps are isolated: a failure is recorded in the summary and the
//! remaining steps still run. Step 4 only skips the kinds whose upload
//! failed.
//!
//! When given a readiness flag, every upload result is written to it,
//! so a store outage (or recovery) shows up on `/ready`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use crate::adapters::metrics::OracleMetrics;
use crate::domain::artifact::{Artifact, ArtifactKind, ContentId, PublicationSummary, StepFailure};
use crate::domain::report::RoundReport;
use crate::error::{OracleError, PublishStep};
use crate::ports::content_store::ContentStore;
use crate::ports::ledger::LedgerGateway;
use crate::ports::renderer::ArtifactRenderer;

/// Uploads a report's artifacts and anchors their content ids.
pub struct ArtifactPublisher<L: LedgerGateway, S: ContentStore, R: ArtifactRenderer> {
  ledger: Arc<L>,
  store: Arc<S>,
  renderer: Arc<R>,
  mfs_dir: String,
  metrics: Arc<OracleMetrics>,
  store_health: Option<Arc<AtomicBool>>,
}

impl<L: LedgerGateway, S: ContentStore, R: ArtifactRenderer> ArtifactPublisher<L, S, R> {
  /// Create a new publisher mirroring reports into `mfs_dir`.
  pub fn new(
    ledger: Arc<L>,
    store: Arc<S>,
    renderer: Arc<R>,
    mfs_dir: impl Into<String>,
    metrics: Arc<OracleMetrics>,
  ) -> Self {
    Self {
      ledger,
      store,
      renderer,
      mfs_dir: mfs_dir.into().trim_end_matches('/').to_string(),
      metrics,
      store_health: None,
    }
  }

  /// Record content-store reachability in `flag` after every upload.
  #[must_use]
  pub fn with_store_health(mut self, flag: Arc<AtomicBool>) -> Self {
    self.store_health = Some(flag);
    self
  }

  /// Mutable-directory path of a round's report.
  pub fn mirror_path(&self, round_id: u64) -> String {
    format!("{}/{}", self.mfs_dir, ArtifactKind::Report.file_name(round_id))
  }

  /// Run all four steps for `report`.
  #[instrument(skip(self, report), fields(round_id = report.round_id))]
  pub async fn publish(&self, report: &RoundReport) -> PublicationSummary {
    let started = Instant::now();
    let round_id = report.round_id;
    let mut summary = PublicationSummary::new(round_id);

    for kind in ArtifactKind::ALL {
      let step = step_of(kind);
      match self.upload(kind, report).await {
        Ok(cid) => {
          info!(round_id, step = %step, cid = %cid, "Artifact uploaded");
          self.count(step, "ok");
          if kind == ArtifactKind::Report {
            summary.mirrored = self.mirror(round_id, &cid).await;
          }
          summary.artifacts.push(Artifact { kind, cid });
        }
        Err(err) => {
          error!(round_id, step = %step, error = %err, "Artifact step failed");
          self.fail(&mut summary, step, &err);
        }
      }
    }

    for artifact in &summary.artifacts {
      match self.ledger.anchor(round_id, artifact.kind, &artifact.cid).await {
        Ok(confirmation) => {
          info!(
            round_id,
            kind = %artifact.kind,
            tx_hash = %confirmation.tx_hash,
            "Content id anchored"
          );
          summary.anchored.push(artifact.kind);
        }
        Err(e) => {
          let err = OracleError::artifact(PublishStep::Anchor, &e.context(format!("{} anchor", artifact.kind)));
          error!(round_id, kind = %artifact.kind, error = %err, "Anchor write failed");
          summary.failures.push(StepFailure {
            step: PublishStep::Anchor,
            reason: err.to_string(),
          });
        }
      }
    }
    let anchor_result = if summary.anchored.len() == summary.artifacts.len() { "ok" } else { "failed" };
    self.count(PublishStep::Anchor, anchor_result);

    self.metrics.publish_seconds.observe(started.elapsed().as_secs_f64());
    info!(
      round_id,
      uploaded = summary.artifacts.len(),
      anchored = summary.anchored.len(),
      mirrored = summary.mirrored,
      failures = summary.failures.len(),
      "Round publication finished"
    );
    summary
  }

  /// Produce the bytes of `kind` and upload them.
  async fn upload(&self, kind: ArtifactKind, report: &RoundReport) -> Result<ContentId, OracleError> {
    let step = step_of(kind);
    let bytes = match kind {
      ArtifactKind::Report => report
        .to_canonical_bytes()
        .map_err(|e| OracleError::artifact(step, &anyhow::Error::from(e)))?,
      ArtifactKind::Receipt => self
        .renderer
        .render_receipt(report)
        .map_err(|e| OracleError::artifact(step, &e))?,
      ArtifactKind::Chart => self
        .renderer
        .render_chart(report)
        .map_err(|e| OracleError::artifact(step, &e))?,
    };

    let added = self.store.add(&kind.file_name(report.round_id), bytes).await;
    if let Some(flag) = &self.store_health {
      flag.store(added.is_ok(), Ordering::Relaxed);
    }
    added.map_err(|e| OracleError::artifact(step, &e))
  }

  /// Link the report into the mutable directory, replacing any
  /// previous entry. Returns whether the link was made.
  async fn mirror(&self, round_id: u64, cid: &ContentId) -> bool {
    let path = self.mirror_path(round_id);
    let result: anyhow::Result<()> = async {
      self.store.make_dir(&self.mfs_dir).await?;
      if self.store.remove(&path).await? {
        info!(path = %path, "Replaced previous mirror entry");
      }
      self.store.link(cid, &path).await
    }
    .await;

    match result {
      Ok(()) => true,
      Err(e) => {
        warn!(round_id, path = %path, error = %e, "Mirror into mutable directory failed");
        false
      }
    }
  }

  fn fail(&self, summary: &mut PublicationSummary, step: PublishStep, err: &OracleError) {
    self.count(step, "failed");
    summary.failures.push(StepFailure {
      step,
      reason: err.to_string(),
    });
  }

  fn count(&self, step: PublishStep, result: &str) {
    self
      .metrics
      .artifact_steps
      .with_label_values(&[step.to_string().as_str(), result])
      .inc();
  }
}

const fn step_of(kind: ArtifactKind) -> PublishStep {
  match kind {
    ArtifactKind::Report => PublishStep::Report,
    ArtifactKind::Receipt => PublishStep::Receipt,
    ArtifactKind::Chart => PublishStep::Chart,
  }
}
