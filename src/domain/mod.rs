//! Domain layer - Core round, price and report models.
//!
//! Pure logic with no I/O: round phases and fee arithmetic, the
//! simulated price walk, participant pools, the canonical report and
//! artifact identities.
//! Everything here is testable in isolation.

pub mod artifact;
pub mod participants;
pub mod price;
pub mod report;
pub mod round;

// Re-export core types for convenience
pub use artifact::{Artifact, ArtifactKind, ContentId, PublicationSummary, StepFailure};
pub use participants::{Participants, PoolCursor};
pub use price::{PriceSimulator, Settlement};
pub use report::{ReportContext, RoundReport, SimulatedPrices};
pub use round::{Bet, BetTotals, Round, RoundPhase, RunPlan, Side};
