use crate::domain::fixed_point::Fixed;
use crate::domain::types::{AccountId, SwapResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw share units minted to the pool itself on the first deposit.
///
/// Locked forever so the supply can never return to a manipulable dust
/// level once a pool has been seeded.
pub const BASE_SUPPLY: Fixed = Fixed(1_000);

/// Fungible liquidity-share accounting for one pool.
///
/// Tracks per-account balances, the total supply, and the locked base
/// supply. Minting and burning are checked; callers decide the amounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiquidityLedger {
    balances: HashMap<AccountId, Fixed>,
    locked: Fixed,
    total_supply: Fixed,
}

impl LiquidityLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Total share supply including the locked base supply
    pub fn total_supply(&self) -> Fixed {
        self.total_supply
    }

    /// Shares locked to the pool itself
    pub fn locked(&self) -> Fixed {
        self.locked
    }

    /// Shares held by `account`
    pub fn balance_of(&self, account: &AccountId) -> Fixed {
        self.balances.get(account).copied().unwrap_or_else(Fixed::zero)
    }

    /// Mints `amount` shares to `account`
    pub fn mint(&mut self, account: &AccountId, amount: Fixed) -> SwapResult<()> {
        self.total_supply = self.total_supply.checked_add(amount)?;
        let balance = self.balance_of(account).checked_add(amount)?;
        self.balances.insert(account.clone(), balance);
        Ok(())
    }

    /// Mints `amount` shares to the pool itself, unowned and unspendable
    pub fn mint_locked(&mut self, amount: Fixed) -> SwapResult<()> {
        self.total_supply = self.total_supply.checked_add(amount)?;
        self.locked = self.locked.checked_add(amount)?;
        Ok(())
    }

    /// Burns `amount` shares held by `account`
    pub fn burn(&mut self, account: &AccountId, amount: Fixed) -> SwapResult<()> {
        let balance = self.balance_of(account).checked_sub(amount)?;
        self.total_supply = self.total_supply.checked_sub(amount)?;
        if balance.is_zero() {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), balance);
        }
        Ok(())
    }
}
