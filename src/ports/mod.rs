//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `LedgerGateway`: Market house, collateral, feed and anchor contracts
//! - `ContentStore`: Content-addressable storage with a mutable directory
//! - `ArtifactRenderer`: Receipt and chart rendering
//! - `PublicationRepository`: Publication log (JSONL-based)

pub mod content_store;
pub mod ledger;
pub mod renderer;
pub mod repository;
