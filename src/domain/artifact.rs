//! Published artifacts and their content identifiers.

use serde::{Deserialize, Serialize};

use crate::error::PublishStep;

/// Kind of artifact published for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Canonical JSON report.
    Report,
    /// Human-readable receipt document.
    Receipt,
    /// Start/end price chart.
    Chart,
}

impl ArtifactKind {
    /// All kinds, in publishing order.
    pub const ALL: [Self; 3] = [Self::Report, Self::Receipt, Self::Chart];

    /// File name used when uploading this artifact for `round_id`.
    pub fn file_name(self, round_id: u64) -> String {
        match self {
            Self::Report => format!("round-{round_id}.json"),
            Self::Receipt => format!("round-{round_id}-receipt.txt"),
            Self::Chart => format!("round-{round_id}-chart.svg"),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Report => write!(f, "report"),
            Self::Receipt => write!(f, "receipt"),
            Self::Chart => write!(f, "chart"),
        }
    }
}

/// Content identifier returned by the content-addressable store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Wrap an identifier string as returned by the store.
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Immutable path of this content (`/ipfs/<cid>`).
    pub fn ipfs_path(&self) -> String {
        format!("/ipfs/{}", self.0)
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub cid: ContentId,
}

/// A publishing step that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: PublishStep,
    pub reason: String,
}

/// Outcome of publishing one round.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicationSummary {
    pub round_id: u64,
    /// Uploaded artifacts, in publishing order.
    pub artifacts: Vec<Artifact>,
    /// Kinds whose anchor write confirmed.
    pub anchored: Vec<ArtifactKind>,
    /// Whether the report was linked into the mutable directory.
    pub mirrored: bool,
    pub failures: Vec<StepFailure>,
}

impl PublicationSummary {
    /// Empty summary for `round_id`.
    pub fn new(round_id: u64) -> Self {
        Self {
            round_id,
            ..Self::default()
        }
    }

    /// Content id uploaded for `kind`, if that step succeeded.
    pub fn cid(&self, kind: ArtifactKind) -> Option<&ContentId> {
        self.artifacts.iter().find(|a| a.kind == kind).map(|a| &a.cid)
    }

    /// True when all three artifacts were uploaded and anchored.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.anchored.len() == ArtifactKind::ALL.len()
    }
}
