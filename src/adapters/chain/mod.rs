//! Chain Adapters - EVM Ledger Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - RPC provider management
//! - Market house, collateral, feed and anchor store bindings
//! - The `LedgerGateway` implementation used by the round loop
//! - Contract code checks at startup

pub mod contracts;
pub mod gateway;
pub mod provider;
pub mod validator;

pub use gateway::BetHouseGateway;
pub use provider::LedgerProvider;
pub use validator::ContractValidator;
