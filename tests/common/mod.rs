#![allow(dead_code)]

use decayswap::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// In-memory token ledger with per-account balances and an optional account
/// that refuses share mints.
pub struct MemoryLedger {
    balances: Mutex<HashMap<(TokenId, AccountId), Fixed>>,
    banned: Mutex<Option<AccountId>>,
}

impl MemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            balances: Mutex::new(HashMap::new()),
            banned: Mutex::new(None),
        })
    }

    pub fn credit(&self, token: &TokenId, account: &AccountId, amount: Fixed) {
        let mut balances = self.balances.lock().unwrap();
        let entry = balances
            .entry((token.clone(), account.clone()))
            .or_insert_with(Fixed::zero);
        *entry = entry.checked_add(amount).unwrap();
    }

    pub fn balance(&self, token: &TokenId, account: &AccountId) -> Fixed {
        let balances = self.balances.lock().unwrap();
        balances
            .get(&(token.clone(), account.clone()))
            .copied()
            .unwrap_or_else(Fixed::zero)
    }

    pub fn ban(&self, account: AccountId) {
        *self.banned.lock().unwrap() = Some(account);
    }
}

/// Shared handle to a [`MemoryLedger`] carrying the [`TokenLedger`] impl.
///
/// The trait is foreign to this test crate and `Arc` is not `#[fundamental]`,
/// so the orphan rules forbid implementing it directly for `Arc<MemoryLedger>`.
/// This newtype provides the shared handle the pool needs while the harness
/// keeps its own `Arc` for balance inspection and banning.
pub struct SharedLedger(pub Arc<MemoryLedger>);

impl TokenLedger for SharedLedger {
    fn transfer_in(&self, token: &TokenId, from: &AccountId, amount: Fixed) -> Result<()> {
        let mut balances = self.0.balances.lock().unwrap();
        let entry = balances
            .entry((token.clone(), from.clone()))
            .or_insert_with(Fixed::zero);
        *entry = entry
            .checked_sub(amount)
            .map_err(|_| SwapError::TransferFailed)?;
        Ok(())
    }

    fn transfer_out(&self, token: &TokenId, to: &AccountId, amount: Fixed) -> Result<()> {
        let mut balances = self.0.balances.lock().unwrap();
        let entry = balances
            .entry((token.clone(), to.clone()))
            .or_insert_with(Fixed::zero);
        *entry = entry
            .checked_add(amount)
            .map_err(|_| SwapError::TransferFailed)?;
        Ok(())
    }

    fn can_receive(&self, account: &AccountId) -> bool {
        self.0.banned.lock().unwrap().as_ref() != Some(account)
    }
}

/// Mutable stake table; accounts without an entry carry unit stake.
#[derive(Clone)]
pub struct SharedStakes(Arc<RwLock<HashMap<AccountId, Fixed>>>);

impl SharedStakes {
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(HashMap::new())))
    }

    pub fn set(&self, account: &AccountId, weight: Fixed) {
        self.0.write().unwrap().insert(account.clone(), weight);
    }
}

impl StakeOracle for SharedStakes {
    fn weight_of(&self, voter: &AccountId) -> Fixed {
        self.0
            .read()
            .unwrap()
            .get(voter)
            .copied()
            .unwrap_or_else(Fixed::one)
    }
}

pub fn usdt() -> TokenId {
    TokenId::new("USDT")
}

pub fn weth() -> TokenId {
    TokenId::new("WETH")
}

pub fn dai() -> TokenId {
    TokenId::new("DAI")
}

pub fn alice() -> AccountId {
    AccountId::new("alice")
}

pub fn bob() -> AccountId {
    AccountId::new("bob")
}

pub fn carol() -> AccountId {
    AccountId::new("carol")
}

pub struct Harness {
    pub pool: ThreadSafePool,
    pub ledger: Arc<MemoryLedger>,
    pub family: SharedFamily,
    pub admin: AdminToken,
    pub staking: StakingToken,
    pub stakes: SharedStakes,
}

/// A WETH-USDT pool with alice and bob funded, not yet seeded.
pub fn harness() -> Harness {
    let stakes = SharedStakes::new();
    let (family, admin, staking) =
        PoolFamily::new("test-family".to_string(), Box::new(stakes.clone()));
    let family: SharedFamily = Arc::new(RwLock::new(family));

    let ledger = MemoryLedger::new();
    for account in [alice(), bob()] {
        ledger.credit(&usdt(), &account, Fixed::from_int(1_000_000));
        ledger.credit(&weth(), &account, Fixed::from_int(1_000_000));
    }

    let pool = ThreadSafePool::new(
        Pool::new(
            weth(),
            usdt(),
            "Liquidity WETH-USDT".to_string(),
            "LP-WETH-USDT".to_string(),
            Arc::clone(&family),
            Box::new(SharedLedger(Arc::clone(&ledger))),
        )
        .unwrap(),
    );

    Harness {
        pool,
        ledger,
        family,
        admin,
        staking,
        stakes,
    }
}

/// A harness whose pool alice has seeded with 100 USDT and 1 WETH at time 0.
pub fn seeded() -> Harness {
    let h = harness();
    h.pool
        .deposit(
            [Fixed::from_int(100), Fixed::from_int(1)],
            [Fixed::zero(), Fixed::zero()],
            &alice(),
            0,
        )
        .unwrap();
    h
}

pub fn fp(s: &str) -> Fixed {
    s.parse().unwrap()
}
