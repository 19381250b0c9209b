//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics plus liveness/readiness endpoints, served
//! together by one axum 0.7 server.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use self::prometheus::OracleMetrics;
