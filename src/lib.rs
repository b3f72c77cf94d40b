//! # DecaySwap
//!
//! A two-asset exchange pool core implementing:
//! - Constant-product pricing over linearly decaying virtual balances
//! - Stake-weighted governance parameters with a 24-hour application delay
//! - Proportional liquidity-share accounting with a locked base supply
//! - Referral and governance fee-share minting from invariant growth
//!
//! ## Architecture
//!
//! The crate follows domain-driven design principles with clear separation of
//! concerns:
//!
//! - **Domain**: Core business logic (decay tracking, governance stores,
//!   pricing, liquidity accounting, the pool aggregate)
//! - **Infrastructure**: External concerns (JSON configuration, metrics)
//! - **Utils**: Logging setup
//!
//! ## Transaction Model
//!
//! Every operation is a discrete serialized transaction against an ambient
//! whole-second timestamp supplied by the caller. Token movement is delegated
//! to a [`TokenLedger`] collaborator and ordered strictly after internal
//! bookkeeping; a collaborator failure rolls the pool state back atomically.
//!
//! ## Thread Safety
//!
//! [`ThreadSafePool`] wraps a pool in `std::sync::RwLock` for multi-threaded
//! hosts:
//! - Multiple concurrent readers
//! - Single writer exclusion
//! - The lock serializes mutations, preserving the transaction model

pub mod domain;
pub mod infrastructure;

/// Utilities for logging setup
pub mod utils;

// Re-export commonly used types for convenience
pub use domain::{
    decay::{DecayRecord, TokenSlot},
    family::{PoolFamily, SharedFamily},
    fixed_point::{Fixed, Rounding},
    governance::{GovernanceParameterStore, Parameter, ParameterPolicy, APPLY_DELAY},
    ledger::{LiquidityLedger, BASE_SUPPLY},
    pool::{Pool, ThreadSafePool},
    pricing::{DepositReceipt, SwapReceipt, WithdrawReceipt},
    types::*,
};

pub use infrastructure::{
    config::{
        load_family_config, load_pool_config, parse_family_config, parse_pool_config,
        FamilyConfig, PoolConfig,
    },
    metrics::{MetricsCollector, MetricsSnapshot},
};

/// Main result type for the exchange core
pub type Result<T> = std::result::Result<T, SwapError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
