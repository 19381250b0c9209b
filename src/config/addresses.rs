//! Contract Address Resolution - Environment First, Prompt Fallback
//!
//! Deploy scripts print the contract addresses; operators export them
//! as `BET_HOUSE_ADDRESS`, `COLLATERAL_ADDRESS` and
//! `IPFS_STORAGE_ADDRESS`. Any missing variable is asked for on the
//! terminal once, before the round loop starts. A blank or malformed
//! answer is a configuration error.

use std::io::{self, BufRead, Write};

use alloy::primitives::Address;

use crate::error::OracleError;

/// Environment variable holding the market house address.
pub const BET_HOUSE_ENV: &str = "BET_HOUSE_ADDRESS";
/// Environment variable holding the collateral token address.
pub const COLLATERAL_ENV: &str = "COLLATERAL_ADDRESS";
/// Environment variable holding the anchor store address.
pub const STORAGE_ENV: &str = "IPFS_STORAGE_ADDRESS";

/// Deployed addresses of the three oracle-facing contracts.
///
/// The feed is not listed: it is discovered through the market
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
  /// Market house.
  pub bet_house: Address,
  /// Collateral token.
  pub collateral: Address,
  /// Content id anchor store.
  pub storage: Address,
}

impl ContractAddresses {
  /// Named addresses, for validation and logging.
  pub const fn named(&self) -> [(&'static str, Address); 3] {
    [
      ("BetHouse", self.bet_house),
      ("Collateral", self.collateral),
      ("AnchorStore", self.storage),
    ]
  }
}

/// Resolve from the process environment, prompting on stdin/stdout.
pub fn resolve_from_env() -> Result<ContractAddresses, OracleError> {
  resolve_with(|key| std::env::var(key).ok(), prompt_stdin)
}

/// Resolve with injectable lookup and prompt.
pub fn resolve_with<E, P>(env: E, mut prompt: P) -> Result<ContractAddresses, OracleError>
where
  E: Fn(&str) -> Option<String>,
  P: FnMut(&str) -> io::Result<String>,
{
  let mut lookup = |key: &'static str, label: &str| -> Result<Address, OracleError> {
    let raw = match env(key).filter(|v| !v.trim().is_empty()) {
      Some(value) => value,
      None => prompt(&format!("{label} address ({key}): "))
        .map_err(|e| OracleError::Configuration(format!("could not read {key}: {e}")))?,
    };
    parse_address(key, &raw)
  };

  Ok(ContractAddresses {
    bet_house: lookup(BET_HOUSE_ENV, "BetHouse")?,
    collateral: lookup(COLLATERAL_ENV, "Collateral")?,
    storage: lookup(STORAGE_ENV, "IpfsRoundStorage")?,
  })
}

fn parse_address(key: &str, raw: &str) -> Result<Address, OracleError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(OracleError::Configuration(format!("{key} is empty")));
  }
  let address: Address = trimmed
    .parse()
    .map_err(|e| OracleError::Configuration(format!("{key} is not an address ({trimmed}): {e}")))?;
  if address == Address::ZERO {
    return Err(OracleError::Configuration(format!("{key} is the zero address")));
  }
  Ok(address)
}

fn prompt_stdin(question: &str) -> io::Result<String> {
  let mut stdout = io::stdout().lock();
  stdout.write_all(question.as_bytes())?;
  stdout.flush()?;
  let mut answer = String::new();
  io::stdin().lock().read_line(&mut answer)?;
  Ok(answer)
}

#[cfg(test)]
mod tests {
  use super::*;

  const HOUSE: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
  const TOKEN: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
  const STORE: &str = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0";

  #[test]
  fn test_environment_wins() {
    let addrs = resolve_with(
      |key| match key {
        BET_HOUSE_ENV => Some(HOUSE.into()),
        COLLATERAL_ENV => Some(TOKEN.into()),
        STORAGE_ENV => Some(STORE.into()),
        _ => None,
      },
      |_| panic!("prompt must not be used"),
    )
    .unwrap();
    assert_eq!(addrs.bet_house, HOUSE.parse::<Address>().unwrap());
    assert_eq!(addrs.storage, STORE.parse::<Address>().unwrap());
  }

  #[test]
  fn test_missing_variable_is_prompted() {
    let mut asked = Vec::new();
    let addrs = resolve_with(
      |key| (key != STORAGE_ENV).then(|| if key == BET_HOUSE_ENV { HOUSE } else { TOKEN }.to_string()),
      |q| {
        asked.push(q.to_string());
        Ok(format!("{STORE}\n"))
      },
    )
    .unwrap();
    assert_eq!(asked.len(), 1);
    assert!(asked[0].contains(STORAGE_ENV));
    assert_eq!(addrs.storage, STORE.parse::<Address>().unwrap());
  }

  #[test]
  fn test_blank_answer_is_configuration_error() {
    let err = resolve_with(|_| None, |_| Ok("\n".into())).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains(BET_HOUSE_ENV));
  }

  #[test]
  fn test_zero_address_rejected() {
    let err = resolve_with(
      |_| Some("0x0000000000000000000000000000000000000000".into()),
      |_| unreachable!(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("zero address"));
  }
}
