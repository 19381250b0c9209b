//! Prometheus Metrics Registry - Oracle Observability
//!
//! Round, bet, heartbeat and publishing counters plus ledger clock
//! gauges. All metrics follow the naming convention
//! `bethouse_oracle_*`. The text exposition is served by the health
//! server on `/metrics`.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Centralized Prometheus metrics for the round oracle.
pub struct OracleMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Rounds by result (`published`, `partial`, `skipped`).
    pub rounds: IntCounterVec,
    /// Bet actions by side and result (`confirmed`, `failed`).
    pub bets: IntCounterVec,
    /// Heartbeat transfers by result.
    pub heartbeats: IntCounterVec,
    /// Publishing steps by step and result (`ok`, `failed`).
    pub artifact_steps: IntCounterVec,
    /// Latest observed ledger timestamp.
    pub ledger_clock: IntGauge,
    /// Identifier of the round being driven.
    pub current_round: IntGauge,
    /// Wall-clock time spent publishing one round.
    pub publish_seconds: Histogram,
}

impl OracleMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let rounds = IntCounterVec::new(
            Opts::new("bethouse_oracle_rounds_total", "Rounds driven, by result"),
            &["result"],
        )?;

        let bets = IntCounterVec::new(
            Opts::new("bethouse_oracle_bets_total", "Synthetic bet actions"),
            &["side", "result"],
        )?;

        let heartbeats = IntCounterVec::new(
            Opts::new(
                "bethouse_oracle_heartbeats_total",
                "Heartbeat transfers issued to advance the ledger clock",
            ),
            &["result"],
        )?;

        let artifact_steps = IntCounterVec::new(
            Opts::new(
                "bethouse_oracle_artifact_steps_total",
                "Publishing steps, by step and result",
            ),
            &["step", "result"],
        )?;

        let ledger_clock = IntGauge::new(
            "bethouse_oracle_ledger_timestamp_seconds",
            "Latest observed ledger block timestamp",
        )?;

        let current_round = IntGauge::new(
            "bethouse_oracle_current_round",
            "Identifier of the round being driven",
        )?;

        let publish_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "bethouse_oracle_publish_seconds",
                "Time spent publishing one round",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )?;

        registry.register(Box::new(rounds.clone()))?;
        registry.register(Box::new(bets.clone()))?;
        registry.register(Box::new(heartbeats.clone()))?;
        registry.register(Box::new(artifact_steps.clone()))?;
        registry.register(Box::new(ledger_clock.clone()))?;
        registry.register(Box::new(current_round.clone()))?;
        registry.register(Box::new(publish_seconds.clone()))?;

        Ok(Self {
            registry,
            rounds,
            bets,
            heartbeats,
            artifact_steps,
            ledger_clock,
            current_round,
            publish_seconds,
        })
    }

    /// Record a ledger clock reading.
    pub fn observe_clock(&self, timestamp: u64) {
        self.ledger_clock.set(i64::try_from(timestamp).unwrap_or(i64::MAX));
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
