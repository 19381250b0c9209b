//! Activity Generator Use Case - Synthetic Bets and Heartbeats
//!
//! While a round's betting window is open, each polling tick issues a
//! bounded burst of bets: up to three from the YES pool, then up to six
//! from the NO pool. Cursors only move forward, so a participant is
//! tried at most once per round even if its bet fails.
//!
//! Heartbeats are small collateral transfers between two participants.
//! They exist only to mine blocks so the ledger clock keeps moving on
//! nodes that mine on demand.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::adapters::metrics::OracleMetrics;
use crate::domain::participants::{
  BET_TOKENS, HEARTBEAT_TOKENS, NO_PER_TICK, Participants, PoolCursor, YES_PER_TICK, tokens,
};
use crate::domain::round::{Bet, Side};
use crate::error::OracleError;
use crate::ports::ledger::LedgerGateway;

/// Drives synthetic participant activity for one round at a time.
pub struct ActivityGenerator<L: LedgerGateway> {
  ledger: Arc<L>,
  participants: Participants,
  fee_bps: u64,
  bet_amount: U256,
  metrics: Arc<OracleMetrics>,
  round_id: Option<u64>,
  cursor: PoolCursor,
  bets: Vec<Bet>,
}

impl<L: LedgerGateway> ActivityGenerator<L> {
  /// Create a generator over the given pools.
  pub fn new(
    ledger: Arc<L>,
    participants: Participants,
    fee_bps: u64,
    metrics: Arc<OracleMetrics>,
  ) -> Self {
    Self {
      ledger,
      participants,
      fee_bps,
      bet_amount: tokens(BET_TOKENS),
      metrics,
      round_id: None,
      cursor: PoolCursor::default(),
      bets: Vec::new(),
    }
  }

  /// Reset cursors and the bet list for a new round.
  pub fn begin_round(&mut self, round_id: u64) {
    self.round_id = Some(round_id);
    self.cursor = PoolCursor::default();
    self.bets.clear();
  }

  /// Bets confirmed so far in the current round.
  pub fn bets(&self) -> &[Bet] {
    &self.bets
  }

  /// Current pool cursors.
  pub const fn cursor(&self) -> PoolCursor {
    self.cursor
  }

  /// Issue one burst. Returns the number of confirmed bets.
  pub async fn tick(&mut self) -> usize {
    let Some(round_id) = self.round_id else {
      return 0;
    };

    let mut confirmed = 0;
    for (side, cap) in [(Side::Yes, YES_PER_TICK), (Side::No, NO_PER_TICK)] {
      for _ in 0..cap {
        let Some(participant) = self.advance(side) else {
          break;
        };
        if self.place(round_id, participant, side).await {
          confirmed += 1;
        }
      }
    }

    if confirmed == 0 && self.is_exhausted() {
      debug!(round_id, "Both pools exhausted");
    }
    confirmed
  }

  /// Next participant on `side`, moving the cursor past it.
  fn advance(&mut self, side: Side) -> Option<Address> {
    let (pool, cursor) = match side {
      Side::Yes => (&self.participants.yes_pool, &mut self.cursor.yes),
      Side::No => (&self.participants.no_pool, &mut self.cursor.no),
    };
    let participant = pool.get(*cursor).copied()?;
    *cursor += 1;
    Some(participant)
  }

  /// Whether every participant has been tried this round.
  pub fn is_exhausted(&self) -> bool {
    self.cursor.yes >= self.participants.yes_pool.len()
      && self.cursor.no >= self.participants.no_pool.len()
  }

  async fn place(&mut self, round_id: u64, participant: Address, side: Side) -> bool {
    let side_label = side.to_string();
    match self
      .ledger
      .place_bet(participant, round_id, side, self.bet_amount)
      .await
    {
      Ok(confirmation) => {
        let bet = Bet::confirmed(
          participant,
          side,
          self.bet_amount,
          self.fee_bps,
          confirmation.tx_hash,
        );
        info!(
          round_id,
          side = %side,
          participant = %participant,
          tx_hash = %bet.tx_hash,
          "Bet confirmed"
        );
        self.bets.push(bet);
        self
          .metrics
          .bets
          .with_label_values(&[side_label.as_str(), "confirmed"])
          .inc();
        true
      }
      Err(e) => {
        let action = match side {
          Side::Yes => "bet_yes",
          Side::No => "bet_no",
        };
        let err = OracleError::ledger(action, &e);
        warn!(round_id, participant = %participant, error = %err, "Bet failed, participant skipped");
        self
          .metrics
          .bets
          .with_label_values(&[side_label.as_str(), "failed"])
          .inc();
        false
      }
    }
  }

  /// Transfer one token between two random participants. Failures are
  /// logged and ignored.
  pub async fn heartbeat<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
    let Some((from, to)) = self.participants.heartbeat_pair(rng) else {
      return false;
    };

    match self.ledger.transfer(from, to, tokens(HEARTBEAT_TOKENS)).await {
      Ok(_) => {
        debug!(from = %from, to = %to, "Heartbeat transfer");
        self.metrics.heartbeats.with_label_values(&["ok"]).inc();
        true
      }
      Err(e) => {
        let err = OracleError::ledger("heartbeat", &e);
        debug!(error = %err, "Heartbeat failed, ignored");
        self.metrics.heartbeats.with_label_values(&["failed"]).inc();
        false
      }
    }
  }

  /// Close the round and hand over its confirmed bets.
  pub fn finish_round(&mut self) -> Vec<Bet> {
    self.round_id = None;
    std::mem::take(&mut self.bets)
  }
}
