//! Artifact Renderer Port - Derived Round Documents
//!
//! Renders the receipt document and the price chart. Implementations
//! must be pure functions of the report: no ledger reads, no clocks,
//! no randomness, so the same report always renders the same bytes.

use crate::domain::report::RoundReport;

/// Renders the two derived artifacts of a round.
pub trait ArtifactRenderer: Send + Sync + 'static {
  /// Human-readable receipt document.
  fn render_receipt(&self, report: &RoundReport) -> anyhow::Result<Vec<u8>>;

  /// Two-point start/end price chart.
  fn render_chart(&self, report: &RoundReport) -> anyhow::Result<Vec<u8>>;
}
