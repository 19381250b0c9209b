//! Render Adapters - Receipt and Chart Documents
//!
//! Both documents are plain UTF-8 text built from report fields only,
//! so rendering is deterministic and needs no native libraries.

pub mod chart;
pub mod receipt;

use crate::domain::report::RoundReport;
use crate::ports::renderer::ArtifactRenderer;

/// Text receipt plus SVG chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRenderer;

impl ArtifactRenderer for StandardRenderer {
    fn render_receipt(&self, report: &RoundReport) -> anyhow::Result<Vec<u8>> {
        receipt::render(report)
    }

    fn render_chart(&self, report: &RoundReport) -> anyhow::Result<Vec<u8>> {
        chart::render(report)
    }
}
