//! Canonical round report.
//!
//! A `RoundReport` is built once per resolved round and never mutated.
//! The JSON report, the receipt document and the price chart are all
//! derived from this value alone, which keeps the three published
//! artifacts mutually consistent.
//!
//! Large integers cross the serialization boundary as decimal strings
//! (round id, raw feed answers) and token amounts as decimal ether
//! strings with trailing zeros trimmed (`"19.8"`, `"10.0"`).

use alloy::primitives::{Address, B256, I256, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::round::{Bet, Round, Side};

/// Environment of the run that does not change between rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    /// Market the rounds are opened on.
    pub market_id: B256,
    /// Price feed registered for the market.
    pub feed_address: Address,
    /// Fixed-point decimals of the feed answer.
    pub feed_decimals: u8,
    /// Account that opens and resolves rounds.
    pub oracle_address: Address,
    /// Market house contract.
    pub bet_house_address: Address,
    /// Collateral token contract.
    pub collateral_address: Address,
    /// Anchor store contract.
    pub storage_address: Address,
    /// Round length read from the house.
    pub round_seconds: u64,
    /// Betting window read from the house.
    pub bet_window_seconds: u64,
}

/// Simulated USD prices written to the feed for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedPrices {
    pub start_usd: u64,
    pub end_usd: u64,
}

/// Ledger totals of a resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    #[serde(with = "ether_amount")]
    pub total_yes_net: U256,
    #[serde(with = "ether_amount")]
    pub total_no_net: U256,
    #[serde(with = "ether_amount")]
    pub fee_accrued: U256,
}

/// One bet as published in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBet {
    pub address: Address,
    pub side: Side,
    #[serde(with = "ether_amount")]
    pub gross: U256,
    #[serde(with = "ether_amount")]
    pub net: U256,
    pub tx_hash: B256,
    pub winner: bool,
}

/// Canonical, immutable snapshot of a resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundReport {
    #[serde(with = "decimal_string")]
    pub round_id: u64,
    pub market_id: B256,
    pub feed_address: Address,
    pub feed_decimals: u8,
    pub oracle_address: Address,
    pub bet_house_address: Address,
    pub collateral_address: Address,
    pub storage_address: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub resolved_at: u64,
    pub round_seconds: u64,
    pub bet_window_seconds: u64,
    pub price_start_usd_sim: u64,
    pub price_end_usd_sim: u64,
    #[serde(with = "decimal_string")]
    pub price_start_feed_raw: I256,
    #[serde(with = "decimal_string")]
    pub price_end_feed_raw: I256,
    pub outcome_yes: bool,
    pub refund_mode: bool,
    pub totals: ReportTotals,
    pub bets: Vec<ReportBet>,
}

impl RoundReport {
    /// Merge a resolved ledger round with the locally observed bets.
    pub fn assemble(
        round: &Round,
        context: &ReportContext,
        prices: SimulatedPrices,
        bets: &[Bet],
        resolved_at: u64,
    ) -> Self {
        let bets = bets
            .iter()
            .map(|bet| ReportBet {
                address: bet.address,
                side: bet.side,
                gross: bet.gross,
                net: bet.net,
                tx_hash: bet.tx_hash,
                winner: round.is_winner(bet.side),
            })
            .collect();

        Self {
            round_id: round.id,
            market_id: round.market_id,
            feed_address: context.feed_address,
            feed_decimals: context.feed_decimals,
            oracle_address: context.oracle_address,
            bet_house_address: context.bet_house_address,
            collateral_address: context.collateral_address,
            storage_address: context.storage_address,
            start_time: round.start_time,
            end_time: round.end_time,
            resolved_at,
            round_seconds: context.round_seconds,
            bet_window_seconds: context.bet_window_seconds,
            price_start_usd_sim: prices.start_usd,
            price_end_usd_sim: prices.end_usd,
            price_start_feed_raw: round.price_start,
            price_end_feed_raw: round.price_end,
            outcome_yes: round.outcome_yes,
            refund_mode: round.refund_mode,
            totals: ReportTotals {
                total_yes_net: round.total_yes_net,
                total_no_net: round.total_no_net,
                fee_accrued: round.fee_accrued,
            },
            bets,
        }
    }

    /// Canonical byte encoding: pretty JSON with two-space indentation.
    ///
    /// Field order is fixed by the struct definition, so equal reports
    /// always encode to equal bytes.
    pub fn to_canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    /// Parse a report previously produced by `to_canonical_bytes`.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Short outcome label: `YES`, `NO` or `REFUND`.
    pub const fn outcome_label(&self) -> &'static str {
        if self.refund_mode {
            "REFUND"
        } else if self.outcome_yes {
            "YES"
        } else {
            "NO"
        }
    }

    /// Start price in USD as published by the feed.
    pub fn feed_price_start(&self) -> Option<Decimal> {
        feed_price(self.price_start_feed_raw, self.feed_decimals)
    }

    /// End price in USD as published by the feed.
    pub fn feed_price_end(&self) -> Option<Decimal> {
        feed_price(self.price_end_feed_raw, self.feed_decimals)
    }

    /// Number of winning bets.
    pub fn winner_count(&self) -> usize {
        self.bets.iter().filter(|b| b.winner).count()
    }
}

/// Convert a raw fixed-point feed answer into an exact decimal.
pub fn feed_price(raw: I256, decimals: u8) -> Option<Decimal> {
    let mantissa = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals))
        .ok()
        .map(|d| d.normalize())
}

/// Format a token amount (18 decimals) as a trimmed decimal string.
pub fn format_token_amount(value: U256) -> String {
    let full = alloy::primitives::utils::format_ether(value);
    match full.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => format!("{full}.0"),
    }
}

/// Serde adapter: any `Display + FromStr` integer as a decimal string.
mod decimal_string {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Serde adapter: 18-decimal token amounts as trimmed ether strings.
mod ether_amount {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_token_amount(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        alloy::primitives::utils::parse_ether(&raw).map_err(de::Error::custom)
    }
}
