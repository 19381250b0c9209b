//! Round lifecycle domain types.
//!
//! A round is opened by the oracle, accepts bets during its leading
//! window, and is resolved by the oracle once the ledger clock passes
//! its end time. All timing decisions are made against ledger time,
//! never wall-clock time.

use std::time::Duration;

use alloy::primitives::{Address, B256, I256, U256};
use serde::{Deserialize, Serialize};

/// Fee denominator: fees are expressed in basis points.
pub const FEE_DENOMINATOR: u64 = 10_000;

/// Number of rounds executed in one run.
pub const NUM_ROUNDS: u64 = 100;

/// Wall-clock delay between two polls of the ledger clock.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Fixed schedule of one oracle run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    /// How many rounds to execute before exiting.
    pub rounds: u64,
    /// Delay between ledger clock polls.
    pub poll_interval: Duration,
}

impl RunPlan {
    /// The schedule compiled into the binary.
    pub const STANDARD: Self = Self {
        rounds: NUM_ROUNDS,
        poll_interval: POLL_INTERVAL,
    };
}

/// Bet side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// Lifecycle phase of a round as seen from the ledger clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Ledger time is before the round start.
    NotStarted,
    /// Bets are accepted.
    BettingOpen,
    /// Window closed, waiting for the end time.
    BettingClosed,
    /// End time reached: the oracle must settle the price and resolve.
    Resolving,
    /// Terminal.
    Resolved,
}

impl RoundPhase {
    /// Derive the phase from ledger time.
    ///
    /// `Resolving` wins over the betting window so a round whose window
    /// is misconfigured to reach the end time still terminates.
    pub const fn at(now: u64, start_time: u64, end_time: u64, bet_window: u64) -> Self {
        if now < start_time {
            return Self::NotStarted;
        }
        if now >= end_time {
            return Self::Resolving;
        }
        if now - start_time <= bet_window {
            Self::BettingOpen
        } else {
            Self::BettingClosed
        }
    }

    /// Whether bet actions may be issued in this phase.
    pub const fn accepts_bets(self) -> bool {
        matches!(self, Self::BettingOpen)
    }
}

/// A round as stored on the ledger, normalized into one typed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Ledger-assigned identifier (starts at 1).
    pub id: u64,
    /// keccak256 of the market symbol.
    pub market_id: B256,
    /// Ledger timestamp at which the round opened.
    pub start_time: u64,
    /// Ledger timestamp from which the round may be resolved.
    pub end_time: u64,
    /// Raw feed answer captured at start.
    pub price_start: I256,
    /// Raw feed answer captured at resolution (zero until resolved).
    pub price_end: I256,
    /// Net YES stake (after fees).
    pub total_yes_net: U256,
    /// Net NO stake (after fees).
    pub total_no_net: U256,
    /// Fees retained by the house.
    pub fee_accrued: U256,
    /// Whether the round is open.
    pub active: bool,
    /// Whether the round has been resolved.
    pub resolved: bool,
    /// Resolution outcome: price went up.
    pub outcome_yes: bool,
    /// Resolution outcome: price unchanged, stakes refunded.
    pub refund_mode: bool,
}

impl Round {
    /// Phase of this round at the given ledger time.
    pub const fn phase_at(&self, now: u64, bet_window: u64) -> RoundPhase {
        if self.resolved {
            return RoundPhase::Resolved;
        }
        RoundPhase::at(now, self.start_time, self.end_time, bet_window)
    }

    /// Whether a bet on `side` wins under this round's resolution.
    pub const fn is_winner(&self, side: Side) -> bool {
        is_winning_side(side, self.outcome_yes, self.refund_mode)
    }
}

/// Refunded rounds have no winners.
const fn is_winning_side(side: Side, outcome_yes: bool, refund_mode: bool) -> bool {
    if refund_mode {
        return false;
    }
    match side {
        Side::Yes => outcome_yes,
        Side::No => !outcome_yes,
    }
}

/// Fee charged on a gross stake: `gross * fee_bps / 10000`, truncating.
pub fn bet_fee(gross: U256, fee_bps: u64) -> U256 {
    gross * U256::from(fee_bps) / U256::from(FEE_DENOMINATOR)
}

/// A confirmed bet observed by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Participant that placed the bet.
    pub address: Address,
    /// YES or NO.
    pub side: Side,
    /// Stake sent to the house.
    pub gross: U256,
    /// Stake credited to the pool (gross minus fee).
    pub net: U256,
    /// Hash of the confirming transaction.
    pub tx_hash: B256,
}

impl Bet {
    /// Record a confirmed bet, deriving its net amount from the house fee.
    pub fn confirmed(address: Address, side: Side, gross: U256, fee_bps: u64, tx_hash: B256) -> Self {
        let net = gross - bet_fee(gross, fee_bps);
        Self {
            address,
            side,
            gross,
            net,
            tx_hash,
        }
    }

    /// Fee retained on this bet.
    pub fn fee(&self) -> U256 {
        self.gross - self.net
    }
}

/// Per-side sums of a set of bets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BetTotals {
    pub yes_net: U256,
    pub no_net: U256,
    pub fees: U256,
}

impl BetTotals {
    /// Sum a bet list per side.
    pub fn of(bets: &[Bet]) -> Self {
        bets.iter().fold(Self::default(), |mut acc, bet| {
            match bet.side {
                Side::Yes => acc.yes_net += bet.net,
                Side::No => acc.no_net += bet.net,
            }
            acc.fees += bet.fee();
            acc
        })
    }

    /// Whether these sums match the ledger-reported round totals.
    pub fn matches(&self, round: &Round) -> bool {
        self.yes_net == round.total_yes_net
            && self.no_net == round.total_no_net
            && self.fees == round.fee_accrued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHER: u128 = 1_000_000_000_000_000_000;

    fn ether(n: u128) -> U256 {
        U256::from(n * ETHER)
    }

    #[test]
    fn test_phase_boundaries() {
        let (start, end, window) = (1_000, 1_300, 90);
        assert_eq!(RoundPhase::at(999, start, end, window), RoundPhase::NotStarted);
        assert_eq!(RoundPhase::at(1_000, start, end, window), RoundPhase::BettingOpen);
        assert_eq!(RoundPhase::at(1_090, start, end, window), RoundPhase::BettingOpen);
        assert_eq!(RoundPhase::at(1_091, start, end, window), RoundPhase::BettingClosed);
        assert_eq!(RoundPhase::at(1_299, start, end, window), RoundPhase::BettingClosed);
        assert_eq!(RoundPhase::at(1_300, start, end, window), RoundPhase::Resolving);
    }

    #[test]
    fn test_bets_only_accepted_inside_window() {
        assert!(RoundPhase::at(1_045, 1_000, 1_300, 90).accepts_bets());
        assert!(!RoundPhase::at(1_091, 1_000, 1_300, 90).accepts_bets());
        assert!(!RoundPhase::at(1_400, 1_000, 1_300, 90).accepts_bets());
    }

    #[test]
    fn test_fee_truncates() {
        assert_eq!(bet_fee(ether(10), 100), U256::from(ETHER / 10));
        // 199 wei at 1% → 1.99 wei → 1 wei
        assert_eq!(bet_fee(U256::from(199u64), 100), U256::from(1u64));
        assert_eq!(bet_fee(U256::from(99u64), 100), U256::ZERO);
    }

    #[test]
    fn test_confirmed_bet_net() {
        let bet = Bet::confirmed(Address::ZERO, Side::Yes, ether(10), 100, B256::ZERO);
        assert_eq!(bet.net, U256::from(99 * ETHER / 10));
        assert_eq!(bet.fee(), U256::from(ETHER / 10));
    }

    #[test]
    fn test_totals_per_side() {
        let bets = vec![
            Bet::confirmed(Address::ZERO, Side::Yes, ether(10), 100, B256::ZERO),
            Bet::confirmed(Address::ZERO, Side::Yes, ether(10), 100, B256::ZERO),
            Bet::confirmed(Address::ZERO, Side::No, ether(10), 100, B256::ZERO),
        ];
        let totals = BetTotals::of(&bets);
        assert_eq!(totals.yes_net, U256::from(198 * ETHER / 10));
        assert_eq!(totals.no_net, U256::from(99 * ETHER / 10));
        assert_eq!(totals.fees, U256::from(3 * ETHER / 10));
    }

    #[test]
    fn test_winner_rule() {
        assert!(is_winning_side(Side::Yes, true, false));
        assert!(!is_winning_side(Side::No, true, false));
        assert!(is_winning_side(Side::No, false, false));
        assert!(!is_winning_side(Side::Yes, false, true));
        assert!(!is_winning_side(Side::No, false, true));
    }
}
