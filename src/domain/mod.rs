//! Domain layer containing core business logic and entities
//!
//! This module contains the core domain entities and business logic for the
//! exchange pool, including decay tracking, governance parameter stores,
//! liquidity accounting, pricing math, and the pool aggregate itself.

/// Linearly decaying virtual balance records and per-token slots
pub mod decay;
/// Pool family aggregate holding shared defaults and capability checks
pub mod family;
/// 18-decimal fixed-point arithmetic primitives
pub mod fixed_point;
/// Stake-weighted parameter voting with delayed application
pub mod governance;
/// Liquidity share supply and holder balances
pub mod ledger;
/// The two-asset pool aggregate and its thread-safe wrapper
pub mod pool;
/// Constant-product pricing and invariant growth math
pub mod pricing;
/// Core types and primitives
pub mod types;

pub use types::*;

pub use decay::{DecayRecord, TokenSlot};
pub use family::{PoolFamily, SharedFamily};
pub use fixed_point::{Fixed, Rounding};
pub use governance::{
    GovernanceParameterStore, Parameter, ParameterPolicy, ParameterSet, APPLY_DELAY,
};
pub use ledger::{LiquidityLedger, BASE_SUPPLY};
pub use pool::{Pool, ThreadSafePool};
pub use pricing::{DepositReceipt, SwapReceipt, WithdrawReceipt};
