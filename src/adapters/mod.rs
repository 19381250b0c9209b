//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (EVM RPC, IPFS HTTP RPC, file I/O). Each
//! sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `chain`: EVM ledger interaction via alloy-rs
//! - `ipfs`: Kubo RPC content store
//! - `render`: Receipt and chart documents
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSONL publication log

pub mod chain;
pub mod ipfs;
pub mod metrics;
pub mod persistence;
pub mod render;
