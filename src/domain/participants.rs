//! Synthetic participants and activity sizing.
//!
//! Participants are the node's unlocked accounts after the oracle
//! account. The first ten bet YES, the next ten bet NO; each pool is
//! walked by a forward-only cursor so every participant bets at most
//! once per round.

use alloy::primitives::{Address, U256};
use rand::Rng;
use rand::seq::index::sample;

/// Participants per pool.
pub const POOL_SIZE: usize = 10;

/// YES bets issued per polling tick, at most.
pub const YES_PER_TICK: usize = 3;

/// NO bets issued per polling tick, at most.
pub const NO_PER_TICK: usize = 6;

/// Stake of every synthetic bet, in whole tokens.
pub const BET_TOKENS: u64 = 10;

/// Heartbeat transfer amount, in whole tokens.
pub const HEARTBEAT_TOKENS: u64 = 1;

/// Collateral minted and approved per participant before the run.
pub const FUNDING_TOKENS: u64 = 100_000;

const TOKEN_DECIMALS: u8 = 18;

/// Whole tokens in base units (18 decimals).
pub fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
}

/// The two disjoint betting pools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participants {
    pub yes_pool: Vec<Address>,
    pub no_pool: Vec<Address>,
}

impl Participants {
    /// Split node accounts into pools. Account 0 is the oracle and
    /// never bets; accounts past the two pools are ignored.
    pub fn from_accounts(accounts: &[Address]) -> Self {
        let players = accounts.get(1..).unwrap_or_default();
        let yes_end = players.len().min(POOL_SIZE);
        let no_end = players.len().min(2 * POOL_SIZE);
        Self {
            yes_pool: players[..yes_end].to_vec(),
            no_pool: players[yes_end..no_end].to_vec(),
        }
    }

    /// Every participant, YES pool first.
    pub fn all(&self) -> impl Iterator<Item = Address> + '_ {
        self.yes_pool.iter().chain(&self.no_pool).copied()
    }

    pub fn len(&self) -> usize {
        self.yes_pool.len() + self.no_pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Two distinct participants picked uniformly, or `None` with
    /// fewer than two participants.
    pub fn heartbeat_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Address, Address)> {
        let all: Vec<Address> = self.all().collect();
        if all.len() < 2 {
            return None;
        }
        let picked = sample(rng, all.len(), 2);
        Some((all[picked.index(0)], all[picked.index(1)]))
    }
}

/// Forward-only position in each pool, reset per round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolCursor {
    pub yes: usize,
    pub no: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn accounts(n: u8) -> Vec<Address> {
        (0..n).map(Address::repeat_byte).collect()
    }

    #[test]
    fn test_pools_skip_oracle_and_are_disjoint() {
        let p = Participants::from_accounts(&accounts(25));
        assert_eq!(p.yes_pool.len(), POOL_SIZE);
        assert_eq!(p.no_pool.len(), POOL_SIZE);
        assert_eq!(p.yes_pool[0], Address::repeat_byte(1));
        assert_eq!(p.no_pool[0], Address::repeat_byte(11));
        assert!(p.yes_pool.iter().all(|a| !p.no_pool.contains(a)));
        assert!(p.all().all(|a| a != Address::repeat_byte(0)));
    }

    #[test]
    fn test_short_account_list() {
        let p = Participants::from_accounts(&accounts(13));
        assert_eq!(p.yes_pool.len(), 10);
        assert_eq!(p.no_pool.len(), 2);
        assert!(Participants::from_accounts(&[]).is_empty());
    }

    #[test]
    fn test_heartbeat_pair_is_distinct() {
        let p = Participants::from_accounts(&accounts(21));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let (from, to) = p.heartbeat_pair(&mut rng).unwrap();
            assert_ne!(from, to);
        }
        assert!(Participants::from_accounts(&accounts(2)).heartbeat_pair(&mut rng).is_none());
    }

    #[test]
    fn test_token_units() {
        assert_eq!(tokens(10), U256::from(10_000_000_000_000_000_000u128));
    }
}
