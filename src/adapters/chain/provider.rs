//! Ledger RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Connects to the EVM node that hosts the market contracts and
//! exposes a shared provider instance for all on-chain operations.
//!
//! The node signs for the participants (unlocked accounts), so the
//! provider carries no wallet: transactions are sent with an explicit
//! `from` and the node fills nonce and gas. `on_builtin` picks the
//! transport from the URL scheme (http, ws, ipc) and boxes it.
//!
//! The concrete `RootProvider` backs the contract instances, which need
//! a sized provider. Code that only issues plain RPC calls can take the
//! type-erased handle from [`LedgerProvider::inner`].

use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::transports::BoxTransport;
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::LedgerConfig;

/// Shared ledger RPC provider backed by alloy-rs 0.9.
pub struct LedgerProvider {
    /// The alloy provider connected to the node.
    provider: RootProvider<BoxTransport>,
    /// Chain id reported by the node at connect time.
    chain_id: u64,
}

impl LedgerProvider {
    /// Connect to the node and read its chain id.
    ///
    /// Fails when the URL is malformed or the node does not answer;
    /// both are configuration problems, not transient ones.
    #[instrument(skip_all, fields(rpc_url = %config.rpc_url))]
    pub async fn connect(config: &LedgerConfig) -> Result<Self> {
        let provider: RootProvider<BoxTransport> = ProviderBuilder::new()
            .on_builtin(&config.rpc_url)
            .await
            .context("Failed to connect to ledger RPC")?;

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        info!(chain_id, "Connected to ledger RPC");

        Ok(Self { provider, chain_id })
    }

    /// Type-erased handle for plain RPC calls.
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::new(self.provider.clone())
    }

    /// Concrete provider for binding contract instances.
    pub fn root(&self) -> RootProvider<BoxTransport> {
        self.provider.clone()
    }

    /// Chain id observed at connect time.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }
}
