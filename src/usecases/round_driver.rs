//! Round Driver Use Case - Round Lifecycle State Machine
//!
//! Runs a fixed number of rounds back to back. Each round:
//! 1. Walk the simulated price, write it to the feed, open the round
//! 2. Poll the ledger clock once per interval; while the betting window
//!    is open, let the activity generator place a burst of bets
//! 3. Heartbeat on every tick that does not end the round
//! 4. At the end time: settle the end price, write it, resolve
//! 5. Build the report, publish it, append it to the publication log
//!
//! Every ledger interaction is awaited before the next is issued.
//! Only configuration errors stop the run; anything else skips the
//! rest of the current round and the loop moves on.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::Utc;
use rand::rngs::StdRng;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::adapters::metrics::{HealthState, OracleMetrics};
use crate::domain::artifact::PublicationSummary;
use crate::domain::price::{PriceSimulator, scale_to_feed};
use crate::domain::report::SimulatedPrices;
use crate::domain::round::{Round, RoundPhase, RunPlan};
use crate::error::OracleError;
use crate::ports::content_store::ContentStore;
use crate::ports::ledger::LedgerGateway;
use crate::ports::renderer::ArtifactRenderer;
use crate::ports::repository::{PublicationRecord, PublicationRepository};

use super::activity::ActivityGenerator;
use super::publisher::ArtifactPublisher;
use super::report_builder::ReportBuilder;
use super::setup::RunContext;

/// What one completed round produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
  pub round_id: u64,
  pub bets: usize,
  pub summary: PublicationSummary,
}

/// Totals of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  /// Rounds resolved, reported and published (fully or partially).
  pub completed: Vec<RoundOutcome>,
  /// Rounds abandoned after a ledger or consistency error.
  pub skipped: usize,
}

/// Shared dependencies of the driver.
pub struct DriverDeps<L, S, R, P> {
  pub ledger: Arc<L>,
  pub store: Arc<S>,
  pub renderer: Arc<R>,
  pub repository: Arc<P>,
  pub metrics: Arc<OracleMetrics>,
  pub health: Arc<HealthState>,
}

/// Drives rounds against the ledger clock.
pub struct RoundDriver<L, S, R, P>
where
  L: LedgerGateway,
  S: ContentStore,
  R: ArtifactRenderer,
  P: PublicationRepository,
{
  ledger: Arc<L>,
  repository: Arc<P>,
  metrics: Arc<OracleMetrics>,
  health: Arc<HealthState>,
  context: RunContext,
  plan: RunPlan,
  run_id: String,
  simulator: PriceSimulator,
  activity: ActivityGenerator<L>,
  builder: ReportBuilder<L>,
  publisher: ArtifactPublisher<L, S, R>,
  rng: StdRng,
  last_round_id: Option<u64>,
}

impl<L, S, R, P> RoundDriver<L, S, R, P>
where
  L: LedgerGateway,
  S: ContentStore,
  R: ArtifactRenderer,
  P: PublicationRepository,
{
  /// Create a driver for one run.
  pub fn new(
    deps: DriverDeps<L, S, R, P>,
    context: RunContext,
    mfs_dir: &str,
    plan: RunPlan,
    run_id: impl Into<String>,
    rng: StdRng,
  ) -> Self {
    let activity = ActivityGenerator::new(
      Arc::clone(&deps.ledger),
      context.participants.clone(),
      context.fee_bps,
      Arc::clone(&deps.metrics),
    );
    let publisher = ArtifactPublisher::new(
      Arc::clone(&deps.ledger),
      deps.store,
      deps.renderer,
      mfs_dir,
      Arc::clone(&deps.metrics),
    )
    .with_store_health(Arc::clone(&deps.health.store_healthy));

    Self {
      builder: ReportBuilder::new(Arc::clone(&deps.ledger)),
      ledger: deps.ledger,
      repository: deps.repository,
      metrics: deps.metrics,
      health: deps.health,
      context,
      plan,
      run_id: run_id.into(),
      simulator: PriceSimulator::default(),
      activity,
      publisher,
      rng,
      last_round_id: None,
    }
  }

  /// Execute the planned number of rounds.
  #[instrument(skip(self), fields(run_id = %self.run_id, rounds = self.plan.rounds))]
  pub async fn run(&mut self) -> Result<RunSummary, OracleError> {
    let mut summary = RunSummary::default();
    self.health.loop_running.store(true, Ordering::Relaxed);

    for index in 1..=self.plan.rounds {
      info!(index, total = self.plan.rounds, "Starting round");
      match self.run_round().await {
        Ok(outcome) => {
          let result = if outcome.summary.is_complete() { "published" } else { "partial" };
          self.metrics.rounds.with_label_values(&[result]).inc();
          summary.completed.push(outcome);
        }
        Err(err) if err.is_fatal() => {
          self.health.loop_running.store(false, Ordering::Relaxed);
          return Err(err);
        }
        Err(err) => {
          error!(index, error = %err, "Round skipped");
          self.metrics.rounds.with_label_values(&["skipped"]).inc();
          summary.skipped += 1;
        }
      }
    }

    self.health.loop_running.store(false, Ordering::Relaxed);
    info!(
      completed = summary.completed.len(),
      skipped = summary.skipped,
      "Run finished"
    );
    Ok(summary)
  }

  /// Drive one round from opening to publication.
  pub async fn run_round(&mut self) -> Result<RoundOutcome, OracleError> {
    let (round, start_usd) = self.open_round().await?;
    let round_id = round.id;
    self.activity.begin_round(round_id);

    self.await_end(&round).await;

    let (end_usd, resolved_at) = self.resolve(&round, start_usd).await?;
    let bets = self.activity.finish_round();

    let report = self
      .builder
      .build(
        round_id,
        &self.context.report,
        SimulatedPrices { start_usd, end_usd },
        &bets,
        resolved_at,
      )
      .await?;

    let summary = self.publisher.publish(&report).await;

    let record = PublicationRecord {
      run_id: self.run_id.clone(),
      logged_at: Utc::now(),
      report,
      summary: summary.clone(),
    };
    if let Err(e) = self.repository.append(&record).await {
      warn!(round_id, error = %e, "Publication log append failed");
    }

    Ok(RoundOutcome {
      round_id,
      bets: bets.len(),
      summary,
    })
  }

  /// Seed the start price, open the round and read it back.
  async fn open_round(&mut self) -> Result<(Round, u64), OracleError> {
    let start_usd = self.simulator.next(&mut self.rng);
    let answer = scale_to_feed(start_usd, self.context.report.feed_decimals);

    self
      .ledger
      .update_feed_price(self.context.report.feed_address, answer)
      .await
      .map_err(|e| OracleError::ledger("update_feed_start", &e))?;

    self
      .ledger
      .start_round(self.context.report.market_id)
      .await
      .map_err(|e| OracleError::ledger("start_round", &e))?;

    let round_id = self
      .ledger
      .current_round_id()
      .await
      .map_err(|e| OracleError::ledger("current_round_id", &e))?;

    if let Some(previous) = self.last_round_id {
      if round_id != previous + 1 {
        warn!(previous, round_id, "Round id is not consecutive");
      }
    }
    self.last_round_id = Some(round_id);

    let round = self
      .ledger
      .round(round_id)
      .await
      .map_err(|e| OracleError::ledger("read_round", &e))?;

    self.metrics.current_round.set(i64::try_from(round_id).unwrap_or(i64::MAX));
    info!(
      round_id,
      start_time = round.start_time,
      end_time = round.end_time,
      start_usd,
      "Round opened"
    );
    Ok((round, start_usd))
  }

  /// Poll until the ledger clock reaches the round's end time.
  async fn await_end(&mut self, round: &Round) {
    let window = self.context.report.bet_window_seconds;

    loop {
      let now = match self.ledger.latest_timestamp().await {
        Ok(now) => now,
        Err(e) => {
          warn!(round_id = round.id, error = %e, "Ledger clock read failed");
          self.health.ledger_healthy.store(false, Ordering::Relaxed);
          sleep(self.plan.poll_interval).await;
          continue;
        }
      };
      self.health.ledger_healthy.store(true, Ordering::Relaxed);
      self.metrics.observe_clock(now);

      let phase = round.phase_at(now, window);
      match phase {
        RoundPhase::BettingOpen => {
          let placed = self.activity.tick().await;
          info!(
            round_id = round.id,
            elapsed = now.saturating_sub(round.start_time),
            placed,
            "Betting window open"
          );
        }
        RoundPhase::Resolving | RoundPhase::Resolved => return,
        RoundPhase::NotStarted | RoundPhase::BettingClosed => {}
      }

      self.activity.heartbeat(&mut self.rng).await;
      sleep(self.plan.poll_interval).await;
    }
  }

  /// Settle the end price, resolve, and read the resolution time.
  ///
  /// The returned end price is the one the feed holds when the round
  /// resolves: if the end write fails that is still the start price.
  async fn resolve(&mut self, round: &Round, start_usd: u64) -> Result<(u64, u64), OracleError> {
    let round_id = round.id;
    let (branch, settled_usd) = self.simulator.settle(start_usd, &mut self.rng);
    let answer = scale_to_feed(settled_usd, self.context.report.feed_decimals);

    let end_usd = match self
      .ledger
      .update_feed_price(self.context.report.feed_address, answer)
      .await
    {
      Ok(_) => settled_usd,
      Err(e) => {
        let err = OracleError::ledger("update_feed_end", &e);
        warn!(
          round_id,
          settled_usd,
          error = %err,
          "End price not written, resolving against the start answer"
        );
        start_usd
      }
    };

    self
      .ledger
      .resolve_round(round_id)
      .await
      .map_err(|e| OracleError::ledger("end_round", &e))?;

    let resolved_at = match self.ledger.latest_timestamp().await {
      Ok(now) => now,
      Err(e) => {
        warn!(
          round_id,
          end_time = round.end_time,
          error = %e,
          "Resolution time unavailable, using the round end time"
        );
        round.end_time
      }
    };

    info!(round_id, ?branch, start_usd, end_usd, resolved_at, "Round resolved");
    Ok((end_usd, resolved_at))
  }
}
