//! # DecaySwap
//!
//! A two-asset exchange pool with decaying virtual balances, stake-weighted
//! delayed governance, and proportional liquidity-share accounting.
//!
//! This binary provides an example entry point that walks a pool through a
//! full lifecycle: configuration loading, seeding, a governance vote, a swap
//! against the decayed curve, and a withdrawal, with metrics reported at the
//! end.

use decayswap::utils::logger::setup_logger;
use decayswap::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

/// In-memory token ledger backing the demo accounts.
struct DemoLedger {
    balances: Mutex<HashMap<(TokenId, AccountId), Fixed>>,
}

impl DemoLedger {
    fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
        }
    }

    fn credit(&self, token: &TokenId, account: &AccountId, amount: Fixed) {
        let mut balances = self.balances.lock().expect("Failed to acquire lock");
        let entry = balances
            .entry((token.clone(), account.clone()))
            .or_insert_with(Fixed::zero);
        *entry = entry.checked_add(amount).expect("demo balance overflow");
    }

    fn balance(&self, token: &TokenId, account: &AccountId) -> Fixed {
        let balances = self.balances.lock().expect("Failed to acquire lock");
        balances
            .get(&(token.clone(), account.clone()))
            .copied()
            .unwrap_or_else(Fixed::zero)
    }
}

/// Shared handle to a [`DemoLedger`] that carries the [`TokenLedger`] impl.
///
/// The trait is foreign to this binary crate and `Arc` is not `#[fundamental]`,
/// so the orphan rules forbid implementing it directly for `Arc<DemoLedger>`.
/// This newtype provides the shared handle the pool needs while `main` keeps
/// its own `Arc` for balance inspection.
struct SharedLedger(Arc<DemoLedger>);

impl TokenLedger for SharedLedger {
    fn transfer_in(&self, token: &TokenId, from: &AccountId, amount: Fixed) -> Result<()> {
        let mut balances = self.0.balances.lock().expect("Failed to acquire lock");
        let entry = balances
            .entry((token.clone(), from.clone()))
            .or_insert_with(Fixed::zero);
        *entry = entry
            .checked_sub(amount)
            .map_err(|_| SwapError::TransferFailed)?;
        Ok(())
    }

    fn transfer_out(&self, token: &TokenId, to: &AccountId, amount: Fixed) -> Result<()> {
        let mut balances = self.0.balances.lock().expect("Failed to acquire lock");
        let entry = balances
            .entry((token.clone(), to.clone()))
            .or_insert_with(Fixed::zero);
        *entry = entry
            .checked_add(amount)
            .map_err(|_| SwapError::TransferFailed)?;
        Ok(())
    }
}

/// Fixed stake table standing in for an external staking system.
struct DemoStakes {
    weights: HashMap<AccountId, Fixed>,
}

impl StakeOracle for DemoStakes {
    fn weight_of(&self, voter: &AccountId) -> Fixed {
        self.weights
            .get(voter)
            .copied()
            .unwrap_or_else(Fixed::zero)
    }
}

fn main() -> Result<()> {
    setup_logger().expect("Failed to initialize logger");
    info!("Starting DecaySwap v{}", VERSION);

    let metrics = MetricsCollector::new();

    // Configuration, with built-in defaults when the data files are absent.
    let family_config = match load_family_config("data/family.json") {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load family config: {}", e);
            FamilyConfig {
                name: "demo-family".to_string(),
                fee_collector: None,
                governance_wallet: None,
            }
        }
    };
    let pool_config = match load_pool_config("data/pool.json") {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load pool config: {}", e);
            PoolConfig {
                token0: TokenId::new("USDT"),
                token1: TokenId::new("WETH"),
                name: "Liquidity WETH-USDT".to_string(),
                symbol: "LP-WETH-USDT".to_string(),
                initial_deposit: Some([Fixed::from_int(30_000), Fixed::from_int(10)]),
            }
        }
    };

    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let carol = AccountId::new("carol");

    let mut weights = HashMap::new();
    weights.insert(alice.clone(), Fixed::from_int(3));
    weights.insert(bob.clone(), Fixed::from_int(1));
    let stakes = DemoStakes { weights };

    let (mut family, admin, _staking) =
        PoolFamily::new(family_config.name, Box::new(stakes));
    family.set_fee_collector(&admin, family_config.fee_collector)?;
    family.set_governance_wallet(&admin, family_config.governance_wallet)?;
    let family: SharedFamily = Arc::new(RwLock::new(family));

    let ledger = Arc::new(DemoLedger::new());
    let token0 = pool_config.token0.clone();
    let token1 = pool_config.token1.clone();
    ledger.credit(&token0, &alice, Fixed::from_int(100_000));
    ledger.credit(&token1, &alice, Fixed::from_int(100));
    ledger.credit(&token1, &bob, Fixed::from_int(10));

    let pool = ThreadSafePool::new(Pool::new(
        token0.clone(),
        token1.clone(),
        pool_config.name,
        pool_config.symbol,
        family,
        Box::new(SharedLedger(Arc::clone(&ledger))),
    )?);
    metrics.set_gauge("pools", 1);

    let mut now: Timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs();

    // Seed the pool from the configured deposit.
    if let Some(amounts) = pool_config.initial_deposit {
        let receipt = pool.deposit(amounts, [Fixed::zero(), Fixed::zero()], &alice, now)?;
        metrics.increment_counter("deposits");
        metrics.set_gauge("total_shares", pool.total_shares().to_int() as u64);
        info!(
            shares = %receipt.shares_minted,
            "pool seeded with {} {} and {} {}",
            receipt.deposited[0],
            token0,
            receipt.deposited[1],
            token1
        );
    }

    // Governance: alice and bob vote the swap fee up; the average applies
    // after the delay window.
    pool.vote(Parameter::Fee, &alice, "0.003".parse()?, now)?;
    pool.vote(Parameter::Fee, &bob, "0.005".parse()?, now)?;
    info!(
        pending_fee = %pool.get_parameter(Parameter::Fee, now),
        "fee votes cast, current fee still in force"
    );

    now += APPLY_DELAY;
    let fee = pool.get_parameter(Parameter::Fee, now);
    info!(fee = %fee, "vote window elapsed, stake-weighted fee in force");

    // Trade against the decayed curve, with carol as referral.
    let amount_in = Fixed::from_int(1);
    let quote = pool.get_quote(&token1, &token0, amount_in, now);
    info!(amount_in = %amount_in, quote = %quote, "quoting {} for {}", token1, token0);

    let receipt = pool.swap(&token1, &token0, amount_in, Fixed::zero(), Some(&carol), &bob, now)?;
    metrics.increment_counter("swaps");
    metrics.set_gauge("total_shares", pool.total_shares().to_int() as u64);
    info!(
        amount_out = %receipt.amount_out,
        fee_amount = %receipt.fee_amount,
        referral_shares = %receipt.referral_shares,
        governance_shares = %receipt.governance_shares,
        "swap filled"
    );

    // Withdraw half of alice's position.
    let shares = pool.share_balance_of(&alice);
    let half = shares.div(Fixed::from_int(2), Rounding::Down)?;
    let receipt = pool.withdraw(half, &[], &alice)?;
    metrics.increment_counter("withdrawals");
    metrics.set_gauge("total_shares", pool.total_shares().to_int() as u64);
    info!(
        shares_burned = %receipt.shares_burned,
        "withdrew {} {} and {} {}",
        receipt.withdrawn[0],
        token0,
        receipt.withdrawn[1],
        token1
    );

    info!(
        usdt = %ledger.balance(&token0, &alice),
        weth = %ledger.balance(&token1, &alice),
        shares = %pool.share_balance_of(&alice),
        "alice final position"
    );

    let snapshot = metrics.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
