//! Ledger Gateway Port - Typed Facade over the Market Contracts
//!
//! Read and write operations against the market house, the collateral
//! token, the anchor store and the price feed. Implementations carry no
//! business logic: they send the call, wait for confirmation and hand
//! back one typed result regardless of how the contract shaped it.
//!
//! Every write blocks until the transaction is mined. Callers issue
//! writes one at a time so a single signer never races its own nonce.

use alloy::primitives::{Address, B256, I256, U256};
use async_trait::async_trait;

use crate::domain::artifact::{ArtifactKind, ContentId};
use crate::domain::round::{Round, Side};

/// Market registration as stored in the house.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketInfo {
  /// Price feed consulted at start and resolution.
  pub feed: Address,
  /// Whether rounds may be opened on this market.
  pub enabled: bool,
}

/// Round timing constants of the house.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundDurations {
  /// Total round length in seconds.
  pub round_seconds: u64,
  /// Leading betting window in seconds.
  pub bet_window_seconds: u64,
}

/// A mined, successful transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfirmation {
  /// Transaction hash.
  pub tx_hash: B256,
  /// Block that included it, when the node reports one.
  pub block_number: Option<u64>,
}

/// Typed gateway over the ledger.
///
/// Write methods without a `from` argument are issued by the oracle
/// account; participant actions name their sender explicitly.
#[async_trait]
pub trait LedgerGateway: Send + Sync + 'static {
  // ── Reads ───────────────────────────────────────────────

  /// Timestamp of the latest block (the ledger clock).
  async fn latest_timestamp(&self) -> anyhow::Result<u64>;

  /// Accounts the node signs for, in node order.
  async fn accounts(&self) -> anyhow::Result<Vec<Address>>;

  /// Market registration by identifier.
  async fn market(&self, market_id: B256) -> anyhow::Result<MarketInfo>;

  /// Identifier of the most recently opened round (0 if none).
  async fn current_round_id(&self) -> anyhow::Result<u64>;

  /// Round by identifier, normalized.
  async fn round(&self, round_id: u64) -> anyhow::Result<Round>;

  /// House fee on each bet, in basis points.
  async fn fee_bps(&self) -> anyhow::Result<u64>;

  /// Round and window durations.
  async fn round_durations(&self) -> anyhow::Result<RoundDurations>;

  /// Fixed-point decimals of a feed.
  async fn feed_decimals(&self, feed: Address) -> anyhow::Result<u8>;

  /// Collateral allowance granted by `owner` to the house.
  async fn house_allowance(&self, owner: Address) -> anyhow::Result<U256>;

  // ── Writes (confirmed before returning) ─────────────────

  /// Open a round on `market_id`.
  async fn start_round(&self, market_id: B256) -> anyhow::Result<TxConfirmation>;

  /// Place a bet on behalf of `from`.
  async fn place_bet(
    &self,
    from: Address,
    round_id: u64,
    side: Side,
    amount: U256,
  ) -> anyhow::Result<TxConfirmation>;

  /// Resolve a round against the feed's current answer.
  async fn resolve_round(&self, round_id: u64) -> anyhow::Result<TxConfirmation>;

  /// Publish a new answer on a mock feed.
  async fn update_feed_price(
    &self,
    feed: Address,
    answer: I256,
  ) -> anyhow::Result<TxConfirmation>;

  /// Collateral transfer between participants.
  async fn transfer(
    &self,
    from: Address,
    to: Address,
    amount: U256,
  ) -> anyhow::Result<TxConfirmation>;

  /// Approve the house to spend `from`'s collateral.
  async fn approve_house(&self, from: Address, amount: U256) -> anyhow::Result<TxConfirmation>;

  /// Mint collateral to `to` (oracle account is the token owner).
  async fn mint(&self, to: Address, amount: U256) -> anyhow::Result<TxConfirmation>;

  /// Anchor a content identifier for `(round_id, kind)`. Last write wins.
  async fn anchor(
    &self,
    round_id: u64,
    kind: ArtifactKind,
    cid: &ContentId,
  ) -> anyhow::Result<TxConfirmation>;
}
