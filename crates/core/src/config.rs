//! Engine configuration.
//!
//! Deployment wiring for one chain: the engine's own account, the owner, and
//! the fixed collaborator addresses. Parsed from TOML; addresses stay
//! strings in the serde layer and are validated in [`EngineConfig::resolve`].

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid address for `{field}`: {value}")]
    BadAddress { field: &'static str, value: String },

    #[error("`{field}` must not be the zero address")]
    ZeroAddress { field: &'static str },

    #[error("invalid amount for `{field}`: {value}")]
    BadAmount { field: &'static str, value: String },
}

/// Raw engine configuration as written in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub chain_id: u64,
    /// The engine's own account.
    pub engine: String,
    /// Sole recipient of maintenance sweeps; the only account allowed to
    /// call maintenance operations.
    pub owner: String,
    pub capital_provider: String,
    pub swap_router: String,
    pub factory: String,
    pub quote_oracle: String,
    /// Default minimum profit in target-asset units, decimal string.
    #[serde(default)]
    pub min_profit: Option<String>,
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Parse and validate every field. The owner, capital provider and
    /// router must be real addresses: a zero owner bricks maintenance, a
    /// zero provider makes the callback gate unreachable, and a zero router
    /// would let `set_router`'s own rule be violated at boot.
    pub fn resolve(&self) -> Result<ResolvedEngineConfig, ConfigError> {
        let engine = parse_address("engine", &self.engine)?;
        let owner = require_nonzero("owner", parse_address("owner", &self.owner)?)?;
        let capital_provider = require_nonzero(
            "capital_provider",
            parse_address("capital_provider", &self.capital_provider)?,
        )?;
        let swap_router =
            require_nonzero("swap_router", parse_address("swap_router", &self.swap_router)?)?;
        let factory = parse_address("factory", &self.factory)?;
        let quote_oracle = parse_address("quote_oracle", &self.quote_oracle)?;

        let min_profit = match &self.min_profit {
            Some(raw) => {
                U256::from_str_radix(raw, 10).map_err(|_| ConfigError::BadAmount {
                    field: "min_profit",
                    value: raw.clone(),
                })?
            }
            None => U256::ZERO,
        };

        Ok(ResolvedEngineConfig {
            chain_id: self.chain_id,
            engine,
            owner,
            capital_provider,
            swap_router,
            factory,
            quote_oracle,
            min_profit,
        })
    }
}

/// Validated engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEngineConfig {
    pub chain_id: u64,
    pub engine: Address,
    pub owner: Address,
    pub capital_provider: Address,
    pub swap_router: Address,
    pub factory: Address,
    pub quote_oracle: Address,
    pub min_profit: U256,
}

/// Parse a `0x`-prefixed checksummed or lowercase address.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    Address::from_str(value.trim()).map_err(|_| ConfigError::BadAddress {
        field,
        value: value.to_string(),
    })
}

fn require_nonzero(field: &'static str, address: Address) -> Result<Address, ConfigError> {
    if address.is_zero() {
        return Err(ConfigError::ZeroAddress { field });
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
chain_id = 8453
engine = "0x00000000000000000000000000000000000000E1"
owner = "0x00000000000000000000000000000000000000A1"
capital_provider = "0x00000000000000000000000000000000000000B1"
swap_router = "0x00000000000000000000000000000000000000C1"
factory = "0x00000000000000000000000000000000000000D1"
quote_oracle = "0x00000000000000000000000000000000000000F1"
min_profit = "250000000000000000"
"#;

    #[test]
    fn parses_and_resolves() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        let resolved = config.resolve().unwrap();

        assert_eq!(resolved.chain_id, 8453);
        assert_eq!(resolved.owner, Address::with_last_byte(0xA1));
        assert_eq!(resolved.min_profit, U256::from(250_000_000_000_000_000u64));
    }

    #[test]
    fn min_profit_defaults_to_zero() {
        let raw = SAMPLE.replace("min_profit = \"250000000000000000\"", "");
        let resolved = EngineConfig::from_toml_str(&raw).unwrap().resolve().unwrap();
        assert_eq!(resolved.min_profit, U256::ZERO);
    }

    #[test]
    fn zero_router_is_rejected() {
        let raw = SAMPLE.replace(
            "swap_router = \"0x00000000000000000000000000000000000000C1\"",
            "swap_router = \"0x0000000000000000000000000000000000000000\"",
        );
        let err = EngineConfig::from_toml_str(&raw).unwrap().resolve().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ZeroAddress {
                field: "swap_router"
            }
        ));
    }

    #[test]
    fn malformed_address_is_rejected() {
        let raw = SAMPLE.replace(
            "owner = \"0x00000000000000000000000000000000000000A1\"",
            "owner = \"not-an-address\"",
        );
        let err = EngineConfig::from_toml_str(&raw).unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::BadAddress { field: "owner", .. }));
    }
}
