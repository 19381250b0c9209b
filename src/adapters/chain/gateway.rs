//! BetHouse Gateway - `LedgerGateway` over the Deployed Contracts
//!
//! Owns typed contract instances for the house, the collateral token
//! and the anchor store. The feed instance is built per call because
//! its address comes from the market registration.
//!
//! Writes are sent with an explicit `from` (the node signs), then
//! awaited until mined with a bounded timeout. A mined but reverted
//! transaction is an error, so callers never record unconfirmed state.

use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::network::Ethereum;
use alloy::primitives::{Address, B256, I256, U256};
use alloy::providers::{PendingTransactionBuilder, Provider, RootProvider};
use alloy::rpc::types::BlockTransactionsKind;
use alloy::transports::BoxTransport;
use anyhow::{Context, Result, anyhow, ensure};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::config::addresses::ContractAddresses;
use crate::domain::artifact::{ArtifactKind, ContentId};
use crate::domain::round::{Round, Side};
use crate::ports::ledger::{LedgerGateway, MarketInfo, RoundDurations, TxConfirmation};

use super::contracts::{IAnchorStore, IBetHouse, ICollateral, IPriceFeed};
use super::provider::LedgerProvider;

type NodeProvider = RootProvider<BoxTransport>;

/// Alloy-backed implementation of [`LedgerGateway`].
pub struct BetHouseGateway {
    provider: NodeProvider,
    bet_house: IBetHouse::IBetHouseInstance<BoxTransport, NodeProvider>,
    collateral: ICollateral::ICollateralInstance<BoxTransport, NodeProvider>,
    storage: IAnchorStore::IAnchorStoreInstance<BoxTransport, NodeProvider>,
    /// Oracle account: node account 0.
    owner: Address,
    tx_timeout: Duration,
}

impl BetHouseGateway {
    /// Bind the contracts and resolve the oracle account.
    #[instrument(skip_all)]
    pub async fn new(
        provider: &LedgerProvider,
        addresses: ContractAddresses,
        tx_timeout: Duration,
    ) -> Result<Self> {
        let root = provider.root();

        let owner = root
            .get_accounts()
            .await
            .context("Failed to list node accounts")?
            .first()
            .copied()
            .ok_or_else(|| anyhow!("Ledger node exposes no unlocked accounts"))?;

        info!(owner = %owner, chain_id = provider.chain_id(), "Oracle account resolved");

        Ok(Self {
            bet_house: IBetHouse::new(addresses.bet_house, root.clone()),
            collateral: ICollateral::new(addresses.collateral, root.clone()),
            storage: IAnchorStore::new(addresses.storage, root.clone()),
            provider: root,
            owner,
            tx_timeout,
        })
    }

    fn feed(&self, feed: Address) -> IPriceFeed::IPriceFeedInstance<BoxTransport, NodeProvider> {
        IPriceFeed::new(feed, self.provider.clone())
    }

    /// Wait for a sent transaction to be mined and check its status.
    async fn confirm(
        &self,
        action: &'static str,
        pending: PendingTransactionBuilder<BoxTransport, Ethereum>,
    ) -> Result<TxConfirmation> {
        let receipt = pending
            .with_timeout(Some(self.tx_timeout))
            .get_receipt()
            .await
            .with_context(|| format!("{action}: receipt not obtained"))?;

        ensure!(
            receipt.status(),
            "{action}: transaction {} reverted",
            receipt.transaction_hash
        );

        debug!(action, tx_hash = %receipt.transaction_hash, "Transaction confirmed");

        Ok(TxConfirmation {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }
}

fn to_u64(value: U256, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{what} out of range: {value}"))
}

#[async_trait]
impl LedgerGateway for BetHouseGateway {
    async fn latest_timestamp(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest, BlockTransactionsKind::Hashes)
            .await
            .context("Failed to fetch latest block")?
            .ok_or_else(|| anyhow!("Node returned no latest block"))?;
        Ok(block.header.timestamp)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.provider
            .get_accounts()
            .await
            .context("Failed to list node accounts")
    }

    #[instrument(skip(self))]
    async fn market(&self, market_id: B256) -> Result<MarketInfo> {
        let market = self
            .bet_house
            .getMarket(market_id)
            .call()
            .await
            .context("getMarket call failed")?;
        Ok(MarketInfo {
            feed: market.feed,
            enabled: market.enabled,
        })
    }

    async fn current_round_id(&self) -> Result<u64> {
        let id = self
            .bet_house
            .currentRoundId()
            .call()
            .await
            .context("currentRoundId call failed")?
            ._0;
        to_u64(id, "round id")
    }

    #[instrument(skip(self))]
    async fn round(&self, round_id: u64) -> Result<Round> {
        let r = self
            .bet_house
            .rounds(U256::from(round_id))
            .call()
            .await
            .with_context(|| format!("rounds({round_id}) call failed"))?;

        Ok(Round {
            id: round_id,
            market_id: r.marketId,
            start_time: to_u64(r.startTime, "start time")?,
            end_time: to_u64(r.endTime, "end time")?,
            price_start: r.priceStart,
            price_end: r.priceEnd,
            total_yes_net: r.totalYesNet,
            total_no_net: r.totalNoNet,
            fee_accrued: r.feeAccrued,
            active: r.active,
            resolved: r.resolved,
            outcome_yes: r.outcomeYes,
            refund_mode: r.refundMode,
        })
    }

    async fn fee_bps(&self) -> Result<u64> {
        let bps = self
            .bet_house
            .FEE_BET_BPS()
            .call()
            .await
            .context("FEE_BET_BPS call failed")?
            ._0;
        to_u64(bps, "fee bps")
    }

    async fn round_durations(&self) -> Result<RoundDurations> {
        let round_seconds = self
            .bet_house
            .ROUND_SECONDS()
            .call()
            .await
            .context("ROUND_SECONDS call failed")?
            ._0;
        let bet_window_seconds = self
            .bet_house
            .BET_WINDOW_SECONDS()
            .call()
            .await
            .context("BET_WINDOW_SECONDS call failed")?
            ._0;
        Ok(RoundDurations {
            round_seconds: to_u64(round_seconds, "round seconds")?,
            bet_window_seconds: to_u64(bet_window_seconds, "bet window seconds")?,
        })
    }

    async fn feed_decimals(&self, feed: Address) -> Result<u8> {
        Ok(self
            .feed(feed)
            .decimals()
            .call()
            .await
            .context("feed decimals call failed")?
            ._0)
    }

    async fn house_allowance(&self, owner: Address) -> Result<U256> {
        Ok(self
            .collateral
            .allowance(owner, *self.bet_house.address())
            .call()
            .await
            .context("allowance call failed")?
            ._0)
    }

    #[instrument(skip(self))]
    async fn start_round(&self, market_id: B256) -> Result<TxConfirmation> {
        let pending = self
            .bet_house
            .startRound(market_id)
            .from(self.owner)
            .send()
            .await
            .context("startRound send failed")?;
        self.confirm("start_round", pending).await
    }

    #[instrument(skip(self, from, amount), fields(from = %from))]
    async fn place_bet(
        &self,
        from: Address,
        round_id: u64,
        side: Side,
        amount: U256,
    ) -> Result<TxConfirmation> {
        let id = U256::from(round_id);
        let (action, sent) = match side {
            Side::Yes => ("bet_yes", self.bet_house.betYes(id, amount).from(from).send().await),
            Side::No => ("bet_no", self.bet_house.betNo(id, amount).from(from).send().await),
        };
        let pending = sent.with_context(|| format!("{action} send failed"))?;
        self.confirm(action, pending).await
    }

    #[instrument(skip(self))]
    async fn resolve_round(&self, round_id: u64) -> Result<TxConfirmation> {
        let pending = self
            .bet_house
            .endRound(U256::from(round_id))
            .from(self.owner)
            .send()
            .await
            .context("endRound send failed")?;
        self.confirm("end_round", pending).await
    }

    #[instrument(skip(self, answer), fields(answer = %answer))]
    async fn update_feed_price(&self, feed: Address, answer: I256) -> Result<TxConfirmation> {
        let pending = self
            .feed(feed)
            .updateAnswer(answer)
            .from(self.owner)
            .send()
            .await
            .context("updateAnswer send failed")?;
        self.confirm("update_answer", pending).await
    }

    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<TxConfirmation> {
        let pending = self
            .collateral
            .transfer(to, amount)
            .from(from)
            .send()
            .await
            .context("transfer send failed")?;
        self.confirm("transfer", pending).await
    }

    async fn approve_house(&self, from: Address, amount: U256) -> Result<TxConfirmation> {
        let pending = self
            .collateral
            .approve(*self.bet_house.address(), amount)
            .from(from)
            .send()
            .await
            .context("approve send failed")?;
        self.confirm("approve", pending).await
    }

    async fn mint(&self, to: Address, amount: U256) -> Result<TxConfirmation> {
        let pending = self
            .collateral
            .mint(to, amount)
            .from(self.owner)
            .send()
            .await
            .context("mint send failed")?;
        self.confirm("mint", pending).await
    }

    #[instrument(skip(self, cid), fields(cid = %cid))]
    async fn anchor(&self, round_id: u64, kind: ArtifactKind, cid: &ContentId) -> Result<TxConfirmation> {
        let id = U256::from(round_id);
        let cid = cid.as_str().to_owned();
        let sent = match kind {
            ArtifactKind::Report => self.storage.setRoundReport(id, cid).from(self.owner).send().await,
            ArtifactKind::Receipt => self.storage.setRoundReceipt(id, cid).from(self.owner).send().await,
            ArtifactKind::Chart => self.storage.setRoundChart(id, cid).from(self.owner).send().await,
        };
        let pending = sent.with_context(|| format!("anchor {kind} send failed"))?;
        self.confirm("anchor", pending).await
    }
}
