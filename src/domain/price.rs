//! Simulated feed prices.
//!
//! The oracle does not read a real market: it walks a simulated USD
//! price and writes it to the mock feed before opening and before
//! resolving each round. The simulator owns its state explicitly and
//! takes the random source as an argument so runs are reproducible
//! under a seeded RNG.

use alloy::primitives::{I256, U256};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Initial simulated price in USD.
pub const INITIAL_PRICE_USD: u64 = 50_000;

/// The walk never goes below this price.
pub const MIN_PRICE_USD: u64 = 1_000;

/// Maximum absolute step of one `next()` call.
pub const MAX_STEP_USD: i64 = 1_000;

/// Move applied to the start price when the round settles up or down.
pub const SETTLE_MOVE_USD: u64 = 500;

/// Probability of the up branch at settlement.
const UP_PROBABILITY: f64 = 0.4;

/// Probability of the up or down branch (the rest is unchanged).
const MOVE_PROBABILITY: f64 = 0.8;

/// Direction taken by the end price of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    Up,
    Down,
    Unchanged,
}

impl Settlement {
    /// Draw a settlement branch: 40% up, 40% down, 20% unchanged.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f64 = rng.r#gen();
        if roll < UP_PROBABILITY {
            Self::Up
        } else if roll < MOVE_PROBABILITY {
            Self::Down
        } else {
            Self::Unchanged
        }
    }

    /// Apply this branch to a start price.
    pub const fn apply(self, start_usd: u64) -> u64 {
        match self {
            Self::Up => start_usd + SETTLE_MOVE_USD,
            Self::Down => start_usd.saturating_sub(SETTLE_MOVE_USD),
            Self::Unchanged => start_usd,
        }
    }
}

/// Bounded random walk over a USD price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSimulator {
    current_usd: u64,
}

impl Default for PriceSimulator {
    fn default() -> Self {
        Self::new(INITIAL_PRICE_USD)
    }
}

impl PriceSimulator {
    /// Start a walk at `initial_usd` (floored at the minimum).
    pub fn new(initial_usd: u64) -> Self {
        Self {
            current_usd: initial_usd.max(MIN_PRICE_USD),
        }
    }

    /// Current simulated price.
    pub const fn current(&self) -> u64 {
        self.current_usd
    }

    /// Perturb the price by a symmetric step in `[-1000, 1000)` and return it.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u64 {
        let roll: f64 = rng.r#gen();
        #[allow(clippy::cast_possible_truncation)]
        let delta = ((roll - 0.5) * (2 * MAX_STEP_USD) as f64).floor() as i64;
        let moved = self.current_usd.saturating_add_signed(delta);
        self.current_usd = moved.max(MIN_PRICE_USD);
        self.current_usd
    }

    /// Pick the end price of a round that started at `start_usd`.
    ///
    /// The walk state is left untouched: the next round perturbs from
    /// the last start price.
    pub fn settle<R: Rng + ?Sized>(&self, start_usd: u64, rng: &mut R) -> (Settlement, u64) {
        let branch = Settlement::draw(rng);
        (branch, branch.apply(start_usd))
    }
}

/// Scale a whole-dollar price to the feed's fixed-point representation.
pub fn scale_to_feed(usd: u64, decimals: u8) -> I256 {
    let scale = U256::from(10u64).pow(U256::from(decimals));
    I256::from_raw(U256::from(usd) * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_walk_stays_above_floor() {
        let mut sim = PriceSimulator::new(MIN_PRICE_USD);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            assert!(sim.next(&mut rng) >= MIN_PRICE_USD);
        }
    }

    #[test]
    fn test_walk_step_is_bounded() {
        let mut sim = PriceSimulator::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut previous = sim.current();
        for _ in 0..1_000 {
            let price = sim.next(&mut rng);
            assert!(price.abs_diff(previous) <= MAX_STEP_USD as u64);
            previous = price;
        }
    }

    #[test]
    fn test_settlement_branches() {
        assert_eq!(Settlement::Up.apply(50_000), 50_500);
        assert_eq!(Settlement::Down.apply(50_000), 49_500);
        assert_eq!(Settlement::Unchanged.apply(50_000), 50_000);
    }

    #[test]
    fn test_settle_keeps_walk_state() {
        let sim = PriceSimulator::new(42_000);
        let mut rng = StdRng::seed_from_u64(3);
        let _ = sim.settle(42_000, &mut rng);
        assert_eq!(sim.current(), 42_000);
    }

    #[test]
    fn test_all_branches_reachable() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = [false; 3];
        for _ in 0..200 {
            match Settlement::draw(&mut rng) {
                Settlement::Up => seen[0] = true,
                Settlement::Down => seen[1] = true,
                Settlement::Unchanged => seen[2] = true,
            }
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_scale_to_feed() {
        assert_eq!(scale_to_feed(50_000, 8).to_string(), "5000000000000");
        assert_eq!(scale_to_feed(1, 0).to_string(), "1");
    }
}
