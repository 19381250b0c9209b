//! Persistence Adapters - JSONL-based File Storage
//!
//! Implements the `PublicationRepository` port with an append-only
//! JSONL log. No database dependency.

pub mod publication_log;

pub use publication_log::PublicationLog;
