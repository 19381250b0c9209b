//! Contract Validator - On-chain Verification at Startup
//!
//! Checks that every configured contract address has deployed code
//! before the round loop starts. An address pointing at an EOA or at
//! nothing is a configuration error and aborts the run.

use std::sync::Arc;

use alloy::primitives::Address;
use alloy::providers::Provider;
use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::config::addresses::ContractAddresses;

/// Result of validating a single contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Contract name for logging.
    pub name: &'static str,
    /// Address that was validated.
    pub address: Address,
    /// Whether the contract has deployed code.
    pub has_code: bool,
}

/// Validates contract addresses against on-chain state.
pub struct ContractValidator {
    provider: Arc<dyn Provider + Send + Sync>,
}

impl ContractValidator {
    /// Create a new validator with the given provider.
    pub fn new(provider: Arc<dyn Provider + Send + Sync>) -> Self {
        Self { provider }
    }

    /// Validate all configured contracts.
    ///
    /// Every address is checked and logged; the call fails after the
    /// loop if any of them had no code.
    #[instrument(skip_all)]
    pub async fn validate_all(&self, addresses: &ContractAddresses) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::with_capacity(3);

        for (name, address) in addresses.named() {
            let code = self
                .provider
                .get_code_at(address)
                .await
                .with_context(|| format!("Failed to query code for {name}"))?;
            let has_code = !code.is_empty();

            if has_code {
                info!(contract = name, address = %address, "Contract validated: code exists on-chain");
            } else {
                warn!(contract = name, address = %address, "Contract has no code");
            }

            results.push(ValidationResult {
                name,
                address,
                has_code,
            });
        }

        let missing: Vec<String> = results
            .iter()
            .filter(|r| !r.has_code)
            .map(|r| format!("{} at {}", r.name, r.address))
            .collect();
        anyhow::ensure!(
            missing.is_empty(),
            "No deployed code for: {}",
            missing.join(", ")
        );

        Ok(results)
    }
}
