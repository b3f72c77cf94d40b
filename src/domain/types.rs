use crate::domain::fixed_point::Fixed;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    /// Creates a token identifier from a string-like value
    pub fn new(id: impl Into<String>) -> Self {
        TokenId(id.into())
    }

    /// Returns true if the identifier is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier for liquidity holders, traders, voters, and wallets
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    /// Creates an account identifier from a string-like value
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ambient transaction timestamp in whole seconds.
///
/// Supplied by the execution context on every operation; the core assumes it
/// is monotonically non-decreasing across calls.
pub type Timestamp = u64;

/// Administrative credential issued at family construction.
///
/// Authorization is capability-based: holding the token for a family is the
/// permission. Operations compare the embedded family id once at entry.
#[derive(Debug, Clone)]
pub struct AdminToken {
    family_id: u64,
}

impl AdminToken {
    pub(crate) fn new(family_id: u64) -> Self {
        Self { family_id }
    }

    pub(crate) fn family_id(&self) -> u64 {
        self.family_id
    }
}

/// Credential held by the staking collaborator, gating stake-change hooks.
#[derive(Debug, Clone)]
pub struct StakingToken {
    family_id: u64,
}

impl StakingToken {
    pub(crate) fn new(family_id: u64) -> Self {
        Self { family_id }
    }

    pub(crate) fn family_id(&self) -> u64 {
        self.family_id
    }
}

/// Token-movement capability provided by the host.
///
/// `transfer_in` pulls funds from a counterparty into pool custody and
/// `transfer_out` pays them back out. Both fail with
/// [`SwapError::TransferFailed`] on insufficient balance/allowance or a
/// non-receiver, and the pool rolls back its own state when they do.
pub trait TokenLedger: Send + Sync {
    /// Moves `amount` of `token` from `from` into pool custody
    fn transfer_in(&self, token: &TokenId, from: &AccountId, amount: Fixed) -> SwapResult<()>;

    /// Moves `amount` of `token` out of pool custody to `to`
    fn transfer_out(&self, token: &TokenId, to: &AccountId, amount: Fixed) -> SwapResult<()>;

    /// Whether `account` can accept liquidity shares.
    ///
    /// Checked up front for configured fee receivers so a bad receiver fails
    /// the trade before any state changes.
    fn can_receive(&self, _account: &AccountId) -> bool {
        true
    }
}

/// Stake-weight oracle provided by the staking collaborator.
pub trait StakeOracle: Send + Sync {
    /// Current stake weight of `voter`, 18-decimal scaled
    fn weight_of(&self, voter: &AccountId) -> Fixed;
}

/// Exchange core errors
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    /// Identical or empty token identities at pool construction
    #[error("Invalid token pair")]
    InvalidTokenPair,

    /// Empty pool name at construction
    #[error("Pool name is empty")]
    NameEmpty,

    /// Empty pool symbol at construction
    #[error("Pool symbol is empty")]
    SymbolEmpty,

    /// Token slot index outside {0, 1}
    #[error("Token index out of range: {index}")]
    IndexOutOfRange {
        /// The rejected index
        index: usize,
    },

    /// Zero amount where a positive amount is required
    #[error("Amount is zero")]
    AmountIsZero,

    /// Deposit produced less than the caller's floor for a token
    #[error("Minimum amount not reached: minimum {minimum}, actual {actual}")]
    MinAmountNotReached {
        /// Caller-supplied floor
        minimum: Fixed,
        /// Amount the operation would have produced
        actual: Fixed,
    },

    /// Swap or withdraw produced less than the caller's floor
    #[error("Insufficient output: minimum {minimum}, actual {actual}")]
    InsufficientOutput {
        /// Caller-supplied floor
        minimum: Fixed,
        /// Amount the operation would have produced
        actual: Fixed,
    },

    /// Trading disabled by the family administrator
    #[error("Factory is shut down")]
    FactoryShutdown,

    /// Governance vote outside the parameter's policy bounds
    #[error("Vote out of range: {value} not in [{min}, {max}]")]
    VoteOutOfRange {
        /// The rejected vote
        value: Fixed,
        /// Policy lower bound
        min: Fixed,
        /// Policy upper bound
        max: Fixed,
    },

    /// Explicit parameter application attempted before the delay elapsed
    #[error("Vote window not elapsed: {remaining}s remaining")]
    VoteWindowNotElapsed {
        /// Seconds until the pending value can apply
        remaining: u64,
    },

    /// Rescue attempted on one of the pool's own tokens
    #[error("Rescue denied for pool tokens")]
    DeniedForPoolTokens,

    /// Collaborator token movement failed
    #[error("Token transfer failed")]
    TransferFailed,

    /// Caller lacks the required credential
    #[error("Unauthorized")]
    Unauthorized,

    /// Checked fixed-point arithmetic failed
    #[error("Arithmetic overflow")]
    Overflow,

    /// Malformed configuration or amount string
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input/output error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for exchange operations
pub type SwapResult<T> = Result<T, SwapError>;
