//! Report Builder Use Case - Canonical Round Snapshot
//!
//! Reads the resolved round back from the ledger, checks that it is
//! plausible, and merges it with the bets observed locally. A round
//! that fails the checks produces no report and nothing is published
//! for it.
//!
//! Ledger totals are authoritative. Local per-side sums are compared
//! against them only to flag drift: dashboard users can bet on the
//! same round, so a mismatch is a warning and not an error.

use std::sync::Arc;

use alloy::primitives::B256;
use tracing::{info, instrument, warn};

use crate::domain::report::{ReportContext, RoundReport, SimulatedPrices, format_token_amount};
use crate::domain::round::{Bet, BetTotals, Round};
use crate::error::OracleError;
use crate::ports::ledger::LedgerGateway;

/// Plausibility checks on a resolved round.
pub fn check_consistency(round: &Round, requested_id: u64, market_id: B256) -> Result<(), String> {
  if round.id == 0 {
    return Err("round id is zero".into());
  }
  if round.id != requested_id {
    return Err(format!("asked for round {requested_id}, ledger returned {}", round.id));
  }
  if round.market_id.is_zero() {
    return Err("market id is zero".into());
  }
  if round.market_id != market_id {
    return Err(format!("round belongs to market {}", round.market_id));
  }
  if round.start_time == 0 || round.end_time == 0 {
    return Err("start or end time is zero".into());
  }
  if round.end_time <= round.start_time {
    return Err(format!(
      "end time {} is not after start time {}",
      round.end_time, round.start_time
    ));
  }
  if !round.resolved {
    return Err("round is not resolved".into());
  }
  if round.price_start.is_zero() {
    return Err("start price is zero".into());
  }
  Ok(())
}

/// Builds the canonical report of a resolved round.
pub struct ReportBuilder<L: LedgerGateway> {
  ledger: Arc<L>,
}

impl<L: LedgerGateway> ReportBuilder<L> {
  /// Create a new builder.
  pub fn new(ledger: Arc<L>) -> Self {
    Self { ledger }
  }

  /// Read round `round_id` and build its report.
  #[instrument(skip(self, context, bets), fields(bets = bets.len()))]
  pub async fn build(
    &self,
    round_id: u64,
    context: &ReportContext,
    prices: SimulatedPrices,
    bets: &[Bet],
    resolved_at: u64,
  ) -> Result<RoundReport, OracleError> {
    let round = self
      .ledger
      .round(round_id)
      .await
      .map_err(|e| OracleError::ledger("read_round", &e))?;

    check_consistency(&round, round_id, context.market_id)
      .map_err(|reason| OracleError::ReportInconsistency { round_id, reason })?;

    let local = BetTotals::of(bets);
    if !local.matches(&round) {
      warn!(
        round_id,
        local_yes = %format_token_amount(local.yes_net),
        ledger_yes = %format_token_amount(round.total_yes_net),
        local_no = %format_token_amount(local.no_net),
        ledger_no = %format_token_amount(round.total_no_net),
        local_fees = %format_token_amount(local.fees),
        ledger_fees = %format_token_amount(round.fee_accrued),
        "Observed bets do not reconcile with ledger totals"
      );
    }

    let report = RoundReport::assemble(&round, context, prices, bets, resolved_at);

    info!(
      round_id,
      outcome = report.outcome_label(),
      winners = report.winner_count(),
      "Round report built"
    );
    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use alloy::primitives::{I256, U256};

  use super::*;

  fn resolved(id: u64) -> Round {
    Round {
      id,
      market_id: B256::repeat_byte(1),
      start_time: 100,
      end_time: 400,
      price_start: I256::try_from(5_000_000_000_000i64).unwrap(),
      price_end: I256::try_from(5_050_000_000_000i64).unwrap(),
      total_yes_net: U256::ZERO,
      total_no_net: U256::ZERO,
      fee_accrued: U256::ZERO,
      active: false,
      resolved: true,
      outcome_yes: true,
      refund_mode: false,
    }
  }

  #[test]
  fn test_plausible_round_passes() {
    assert!(check_consistency(&resolved(3), 3, B256::repeat_byte(1)).is_ok());
  }

  #[test]
  fn test_each_check_rejects() {
    let market = B256::repeat_byte(1);
    assert!(check_consistency(&resolved(0), 0, market).is_err());
    assert!(check_consistency(&resolved(3), 4, market).is_err());
    assert!(check_consistency(&resolved(3), 3, B256::repeat_byte(2)).is_err());

    let mut r = resolved(3);
    r.market_id = B256::ZERO;
    assert!(check_consistency(&r, 3, market).is_err());

    let mut r = resolved(3);
    r.end_time = r.start_time;
    assert!(check_consistency(&r, 3, market).is_err());

    let mut r = resolved(3);
    r.start_time = 0;
    assert!(check_consistency(&r, 3, market).is_err());

    let mut r = resolved(3);
    r.resolved = false;
    assert_eq!(check_consistency(&r, 3, market).unwrap_err(), "round is not resolved");

    let mut r = resolved(3);
    r.price_start = I256::ZERO;
    assert!(check_consistency(&r, 3, market).is_err());
  }
}
