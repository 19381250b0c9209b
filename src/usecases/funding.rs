//! Participant Funding Use Case - Collateral Before the Run
//!
//! Each participant needs collateral and an allowance towards the
//! house before it can bet. Participants whose allowance already
//! covers a full run are left alone; the others get a mint from the
//! oracle account followed by their own approve.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::{info, warn};

use crate::domain::participants::{BET_TOKENS, FUNDING_TOKENS, Participants, tokens};
use crate::domain::round::NUM_ROUNDS;
use crate::error::OracleError;
use crate::ports::ledger::LedgerGateway;

/// Outcome of a funding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FundingSummary {
  /// Participants minted and approved in this pass.
  pub funded: usize,
  /// Participants whose allowance was already sufficient.
  pub already_funded: usize,
  /// Participants whose mint or approve failed.
  pub failed: usize,
}

/// Mints and approves collateral for participants.
pub struct ParticipantFunding<L: LedgerGateway> {
  ledger: Arc<L>,
}

impl<L: LedgerGateway> ParticipantFunding<L> {
  /// Create a new funding use case.
  pub fn new(ledger: Arc<L>) -> Self {
    Self { ledger }
  }

  /// Allowance that covers one bet per round for a whole run.
  pub fn required_allowance() -> U256 {
    tokens(BET_TOKENS) * U256::from(NUM_ROUNDS)
  }

  /// Fund every participant that needs it. Failures are logged and
  /// counted, never propagated: an unfunded participant's bets fail
  /// later and are skipped like any other failed bet.
  pub async fn fund(&self, participants: &Participants) -> FundingSummary {
    let mut summary = FundingSummary::default();
    let required = Self::required_allowance();

    for participant in participants.all() {
      match self.ledger.house_allowance(participant).await {
        Ok(allowance) if allowance >= required => {
          summary.already_funded += 1;
          continue;
        }
        Ok(_) => {}
        Err(e) => {
          warn!(participant = %participant, error = %e, "Allowance read failed, funding anyway");
        }
      }

      match self.fund_one(participant).await {
        Ok(()) => summary.funded += 1,
        Err(err) => {
          warn!(participant = %participant, error = %err, "Funding failed, participant skipped");
          summary.failed += 1;
        }
      }
    }

    info!(
      funded = summary.funded,
      already_funded = summary.already_funded,
      failed = summary.failed,
      "Participant funding complete"
    );
    summary
  }

  async fn fund_one(&self, participant: Address) -> Result<(), OracleError> {
    let amount = tokens(FUNDING_TOKENS);
    self
      .ledger
      .mint(participant, amount)
      .await
      .map_err(|e| OracleError::ledger("mint", &e))?;
    self
      .ledger
      .approve_house(participant, amount)
      .await
      .map_err(|e| OracleError::ledger("approve", &e))?;
    Ok(())
  }
}
