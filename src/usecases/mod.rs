//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the oracle's workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `MarketSetup`: Market, feed and timing discovery before the loop
//! - `ParticipantFunding`: Mint and approve collateral for participants
//! - `ActivityGenerator`: Synthetic bets and heartbeat transfers
//! - `ReportBuilder`: Canonical report of a resolved round
//! - `ArtifactPublisher`: Upload, mirror and anchor a round's artifacts
//! - `RoundDriver`: The round lifecycle loop
//! - `Republish`: Manual re-publication from the log

pub mod activity;
pub mod funding;
pub mod publisher;
pub mod report_builder;
pub mod republish;
pub mod round_driver;
pub mod setup;
