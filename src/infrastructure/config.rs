use crate::domain::fixed_point::Fixed;
use crate::domain::types::{AccountId, SwapError, SwapResult, TokenId};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Raw family configuration as read from JSON.
#[derive(Debug, Deserialize)]
struct RawFamilyConfig {
    name: String,
    #[serde(default)]
    fee_collector: Option<String>,
    #[serde(default)]
    governance_wallet: Option<String>,
}

/// Raw pool configuration as read from JSON.
#[derive(Debug, Deserialize)]
struct RawPoolConfig {
    token0: String,
    token1: String,
    name: String,
    symbol: String,
    #[serde(default)]
    initial_deposit: Option<RawDeposit>,
}

#[derive(Debug, Deserialize)]
struct RawDeposit {
    amount0: String,
    amount1: String,
}

/// Validated family configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyConfig {
    pub name: String,
    pub fee_collector: Option<AccountId>,
    pub governance_wallet: Option<AccountId>,
}

/// Validated pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub token0: TokenId,
    pub token1: TokenId,
    pub name: String,
    pub symbol: String,
    /// Seed amounts in declaration order, if the pool should be pre-funded
    pub initial_deposit: Option<[Fixed; 2]>,
}

/// Parses a family configuration from a JSON string.
pub fn parse_family_config(json: &str) -> SwapResult<FamilyConfig> {
    let raw: RawFamilyConfig = serde_json::from_str(json)?;

    if raw.name.trim().is_empty() {
        return Err(SwapError::Parse("Family name is empty".to_string()));
    }

    let config = FamilyConfig {
        name: raw.name,
        fee_collector: raw.fee_collector.map(AccountId::new),
        governance_wallet: raw.governance_wallet.map(AccountId::new),
    };

    debug!(family = %config.name, "parsed family config");
    Ok(config)
}

/// Parses a pool configuration from a JSON string.
pub fn parse_pool_config(json: &str) -> SwapResult<PoolConfig> {
    let raw: RawPoolConfig = serde_json::from_str(json)?;

    if raw.name.trim().is_empty() {
        return Err(SwapError::Parse("Pool name is empty".to_string()));
    }
    if raw.symbol.trim().is_empty() {
        return Err(SwapError::Parse("Pool symbol is empty".to_string()));
    }

    let initial_deposit = match raw.initial_deposit {
        Some(deposit) => {
            let amount0 = Fixed::from_str(&deposit.amount0)
                .map_err(|e| SwapError::Parse(format!("Invalid amount0: {}", e)))?;
            let amount1 = Fixed::from_str(&deposit.amount1)
                .map_err(|e| SwapError::Parse(format!("Invalid amount1: {}", e)))?;
            Some([amount0, amount1])
        }
        None => None,
    };

    let config = PoolConfig {
        token0: TokenId::new(raw.token0),
        token1: TokenId::new(raw.token1),
        name: raw.name,
        symbol: raw.symbol,
        initial_deposit,
    };

    debug!(pool = %config.name, "parsed pool config");
    Ok(config)
}

/// Loads and parses a family configuration from a JSON file.
pub fn load_family_config<P: AsRef<Path>>(path: P) -> SwapResult<FamilyConfig> {
    let contents = std::fs::read_to_string(path)?;
    parse_family_config(&contents)
}

/// Loads and parses a pool configuration from a JSON file.
pub fn load_pool_config<P: AsRef<Path>>(path: P) -> SwapResult<PoolConfig> {
    let contents = std::fs::read_to_string(path)?;
    parse_pool_config(&contents)
}
