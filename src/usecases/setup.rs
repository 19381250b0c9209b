//! Market Setup Use Case - Pre-loop Ledger Discovery
//!
//! Resolves everything the round loop needs from the ledger once:
//! the market registration and its feed, the feed decimals, the house
//! fee and timing constants, and the participant pools. Any failure
//! here is a configuration error and the run never starts.

use std::sync::Arc;

use alloy::primitives::keccak256;
use tracing::{info, instrument, warn};

use crate::config::addresses::ContractAddresses;
use crate::domain::participants::{POOL_SIZE, Participants};
use crate::domain::report::ReportContext;
use crate::domain::round::FEE_DENOMINATOR;
use crate::error::OracleError;
use crate::ports::ledger::{LedgerGateway, RoundDurations};

/// Everything fixed for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
  /// Report environment (addresses, feed, timing).
  pub report: ReportContext,
  /// House fee in basis points.
  pub fee_bps: u64,
  /// Betting pools.
  pub participants: Participants,
}

/// Discovers and validates the market before the loop.
pub struct MarketSetup<L: LedgerGateway> {
  ledger: Arc<L>,
}

fn config_err(what: &str, err: &anyhow::Error) -> OracleError {
  OracleError::Configuration(format!("{what}: {err:#}"))
}

/// Check the house timing constants.
pub fn validate_durations(durations: RoundDurations) -> Result<(), OracleError> {
  if durations.round_seconds == 0 {
    return Err(OracleError::Configuration("ROUND_SECONDS is zero".into()));
  }
  if durations.bet_window_seconds >= durations.round_seconds {
    return Err(OracleError::Configuration(format!(
      "betting window ({}s) must be shorter than the round ({}s)",
      durations.bet_window_seconds, durations.round_seconds
    )));
  }
  Ok(())
}

impl<L: LedgerGateway> MarketSetup<L> {
  /// Create a new setup use case.
  pub fn new(ledger: Arc<L>) -> Self {
    Self { ledger }
  }

  /// Resolve the run context for `market_symbol`.
  #[instrument(skip(self, addresses))]
  pub async fn prepare(
    &self,
    market_symbol: &str,
    addresses: &ContractAddresses,
  ) -> Result<RunContext, OracleError> {
    let market_id = keccak256(market_symbol.as_bytes());

    let accounts = self
      .ledger
      .accounts()
      .await
      .map_err(|e| config_err("listing node accounts", &e))?;
    let oracle_address = *accounts
      .first()
      .ok_or_else(|| OracleError::Configuration("ledger node exposes no accounts".into()))?;
    let participants = Participants::from_accounts(&accounts);
    if participants.len() < 2 * POOL_SIZE {
      warn!(
        participants = participants.len(),
        "Fewer participants than two full pools"
      );
    }

    let market = self
      .ledger
      .market(market_id)
      .await
      .map_err(|e| config_err("reading market registration", &e))?;
    if !market.enabled {
      return Err(OracleError::Configuration(format!(
        "market {market_symbol} ({market_id}) is not enabled"
      )));
    }
    if market.feed.is_zero() {
      return Err(OracleError::Configuration(format!(
        "market {market_symbol} has no price feed"
      )));
    }

    let feed_decimals = self
      .ledger
      .feed_decimals(market.feed)
      .await
      .map_err(|e| config_err("reading feed decimals", &e))?;

    let fee_bps = self
      .ledger
      .fee_bps()
      .await
      .map_err(|e| config_err("reading FEE_BET_BPS", &e))?;
    if fee_bps >= FEE_DENOMINATOR {
      return Err(OracleError::Configuration(format!(
        "fee of {fee_bps} bps leaves nothing to stake"
      )));
    }

    let durations = self
      .ledger
      .round_durations()
      .await
      .map_err(|e| config_err("reading round durations", &e))?;
    validate_durations(durations)?;

    info!(
      market = market_symbol,
      market_id = %market_id,
      feed = %market.feed,
      feed_decimals,
      fee_bps,
      round_seconds = durations.round_seconds,
      bet_window_seconds = durations.bet_window_seconds,
      participants = participants.len(),
      "Market setup complete"
    );

    Ok(RunContext {
      report: ReportContext {
        market_id,
        feed_address: market.feed,
        feed_decimals,
        oracle_address,
        bet_house_address: addresses.bet_house,
        collateral_address: addresses.collateral,
        storage_address: addresses.storage,
        round_seconds: durations.round_seconds,
        bet_window_seconds: durations.bet_window_seconds,
      },
      fee_bps,
      participants,
    })
  }
}
