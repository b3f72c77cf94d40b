use crate::domain::fixed_point::{Fixed, SCALE};
use crate::domain::types::{AccountId, SwapError, SwapResult, Timestamp};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Seconds a pending vote aggregate must rest before it can apply.
///
/// A transaction cannot vote and benefit from the new value inside the same
/// window.
pub const APPLY_DELAY: u64 = 86_400;

/// The five governed scalar parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    /// Trading fee taken from the input amount
    Fee,
    /// Slippage-fee fraction consumed by the external fee-conversion pipeline
    SlippageFee,
    /// Decay window length in whole seconds
    DecayPeriod,
    /// Fraction of fee-driven invariant growth minted to a referral
    ReferralShare,
    /// Fraction of fee-driven invariant growth minted to the governance wallet
    GovernanceShare,
}

impl Parameter {
    /// Every governed parameter, in declaration order.
    pub const ALL: [Parameter; 5] = [
        Parameter::Fee,
        Parameter::SlippageFee,
        Parameter::DecayPeriod,
        Parameter::ReferralShare,
        Parameter::GovernanceShare,
    ];

    /// Admissible range and default for this parameter.
    pub const fn policy(self) -> ParameterPolicy {
        match self {
            Parameter::Fee => ParameterPolicy {
                default: Fixed(0),
                min: Fixed(0),
                max: Fixed(SCALE / 100),
            },
            Parameter::SlippageFee => ParameterPolicy {
                default: Fixed(SCALE),
                min: Fixed(0),
                max: Fixed(SCALE),
            },
            Parameter::DecayPeriod => ParameterPolicy {
                default: Fixed(60 * SCALE),
                min: Fixed(60 * SCALE),
                max: Fixed(3_600 * SCALE),
            },
            Parameter::ReferralShare => ParameterPolicy {
                default: Fixed(SCALE / 10),
                min: Fixed(SCALE / 100),
                max: Fixed(SCALE / 4),
            },
            Parameter::GovernanceShare => ParameterPolicy {
                default: Fixed(0),
                min: Fixed(0),
                max: Fixed(SCALE / 4),
            },
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parameter::Fee => "fee",
            Parameter::SlippageFee => "slippage-fee",
            Parameter::DecayPeriod => "decay-period",
            Parameter::ReferralShare => "referral-share",
            Parameter::GovernanceShare => "governance-share",
        };
        write!(f, "{name}")
    }
}

/// Policy bounds for one governed parameter, 18-decimal scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterPolicy {
    /// Value when no votes are active and no fallback store is chained
    pub default: Fixed,
    /// Inclusive lower vote bound
    pub min: Fixed,
    /// Inclusive upper vote bound
    pub max: Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct VoteEntry {
    value: Fixed,
    weight: Fixed,
}

/// Stake-weighted, delayed voting ledger for one scalar parameter.
///
/// Votes accumulate into a weighted aggregate that becomes the applied value
/// only after [`APPLY_DELAY`] seconds with no further vote-weight change.
/// While no locally-applied value exists the store defers to a fallback
/// supplied by the caller (the live family default at pool scope, the policy
/// default at family scope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceParameterStore {
    parameter: Parameter,
    votes: HashMap<AccountId, VoteEntry>,
    pending_weighted_sum: U256,
    pending_weight_total: U256,
    current: Option<Fixed>,
    window_start: Timestamp,
}

impl GovernanceParameterStore {
    /// Creates an empty store for `parameter`
    pub fn new(parameter: Parameter) -> Self {
        Self {
            parameter,
            votes: HashMap::new(),
            pending_weighted_sum: U256::zero(),
            pending_weight_total: U256::zero(),
            current: None,
            window_start: 0,
        }
    }

    /// The governed parameter
    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    /// The voter's recorded vote, if any
    pub fn vote_of(&self, voter: &AccountId) -> Option<Fixed> {
        self.votes.get(voter).map(|entry| entry.value)
    }

    fn pending_average(&self) -> Option<Fixed> {
        if self.pending_weight_total.is_zero() {
            return None;
        }
        let average = self.pending_weighted_sum / self.pending_weight_total;
        Some(Fixed::from_raw(average.low_u128()))
    }

    /// Applies the pending aggregate if the delay has elapsed.
    fn roll(&mut self, now: Timestamp) {
        if now.saturating_sub(self.window_start) >= APPLY_DELAY {
            let applied = self.pending_average();
            if applied != self.current {
                debug!(
                    parameter = %self.parameter,
                    value = ?applied,
                    "governance parameter applied"
                );
            }
            self.current = applied;
            self.window_start = now;
        }
    }

    /// Records or replaces `voter`'s vote.
    ///
    /// The vote does not affect the applied value until the delay elapses.
    pub fn vote(
        &mut self,
        voter: &AccountId,
        value: Fixed,
        weight: Fixed,
        now: Timestamp,
    ) -> SwapResult<()> {
        let policy = self.parameter.policy();
        if value < policy.min || value > policy.max {
            return Err(SwapError::VoteOutOfRange {
                value,
                min: policy.min,
                max: policy.max,
            });
        }
        if weight.is_zero() {
            return Err(SwapError::AmountIsZero);
        }
        self.roll(now);
        self.remove_entry(voter);
        self.pending_weighted_sum =
            self.pending_weighted_sum + U256::from(value.raw()) * U256::from(weight.raw());
        self.pending_weight_total = self.pending_weight_total + U256::from(weight.raw());
        self.votes.insert(voter.clone(), VoteEntry { value, weight });
        self.window_start = now;
        Ok(())
    }

    /// Removes `voter`'s contribution entirely. No-op without a recorded vote.
    pub fn discard(&mut self, voter: &AccountId, now: Timestamp) {
        if !self.votes.contains_key(voter) {
            return;
        }
        self.roll(now);
        self.remove_entry(voter);
        self.window_start = now;
    }

    /// Rescales `voter`'s contribution after a stake change; zero weight
    /// discards the vote.
    pub fn on_stake_changed(&mut self, voter: &AccountId, new_weight: Fixed, now: Timestamp) {
        let value = match self.votes.get(voter) {
            Some(entry) => entry.value,
            None => return,
        };
        self.roll(now);
        self.remove_entry(voter);
        if !new_weight.is_zero() {
            self.pending_weighted_sum =
                self.pending_weighted_sum + U256::from(value.raw()) * U256::from(new_weight.raw());
            self.pending_weight_total = self.pending_weight_total + U256::from(new_weight.raw());
            self.votes.insert(
                voter.clone(),
                VoteEntry {
                    value,
                    weight: new_weight,
                },
            );
        }
        self.window_start = now;
    }

    fn remove_entry(&mut self, voter: &AccountId) {
        if let Some(entry) = self.votes.remove(voter) {
            self.pending_weighted_sum = self.pending_weighted_sum
                - U256::from(entry.value.raw()) * U256::from(entry.weight.raw());
            self.pending_weight_total = self.pending_weight_total - U256::from(entry.weight.raw());
        }
    }

    /// Current value, applying the pending aggregate first when due.
    pub fn read(&mut self, now: Timestamp, fallback: Fixed) -> Fixed {
        self.roll(now);
        self.current.unwrap_or(fallback)
    }

    /// Value `read` would return at `now`, without mutating the store.
    pub fn peek(&self, now: Timestamp, fallback: Fixed) -> Fixed {
        let applied = if now.saturating_sub(self.window_start) >= APPLY_DELAY {
            self.pending_average()
        } else {
            self.current
        };
        applied.unwrap_or(fallback)
    }

    /// Epoch hook: applies the pending aggregate, failing while the delay is
    /// still running.
    pub fn apply(&mut self, now: Timestamp, fallback: Fixed) -> SwapResult<Fixed> {
        let elapsed = now.saturating_sub(self.window_start);
        if elapsed < APPLY_DELAY {
            return Err(SwapError::VoteWindowNotElapsed {
                remaining: APPLY_DELAY - elapsed,
            });
        }
        Ok(self.read(now, fallback))
    }
}

/// The five governance stores of one scope (a pool or a family).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSet {
    fee: GovernanceParameterStore,
    slippage_fee: GovernanceParameterStore,
    decay_period: GovernanceParameterStore,
    referral_share: GovernanceParameterStore,
    governance_share: GovernanceParameterStore,
}

impl ParameterSet {
    /// Creates empty stores for every parameter
    pub fn new() -> Self {
        Self {
            fee: GovernanceParameterStore::new(Parameter::Fee),
            slippage_fee: GovernanceParameterStore::new(Parameter::SlippageFee),
            decay_period: GovernanceParameterStore::new(Parameter::DecayPeriod),
            referral_share: GovernanceParameterStore::new(Parameter::ReferralShare),
            governance_share: GovernanceParameterStore::new(Parameter::GovernanceShare),
        }
    }

    /// The store governing `parameter`
    pub fn store(&self, parameter: Parameter) -> &GovernanceParameterStore {
        match parameter {
            Parameter::Fee => &self.fee,
            Parameter::SlippageFee => &self.slippage_fee,
            Parameter::DecayPeriod => &self.decay_period,
            Parameter::ReferralShare => &self.referral_share,
            Parameter::GovernanceShare => &self.governance_share,
        }
    }

    /// Mutable access to the store governing `parameter`
    pub fn store_mut(&mut self, parameter: Parameter) -> &mut GovernanceParameterStore {
        match parameter {
            Parameter::Fee => &mut self.fee,
            Parameter::SlippageFee => &mut self.slippage_fee,
            Parameter::DecayPeriod => &mut self.decay_period,
            Parameter::ReferralShare => &mut self.referral_share,
            Parameter::GovernanceShare => &mut self.governance_share,
        }
    }

    /// Propagates a stake change to every store in this scope
    pub fn on_stake_changed(&mut self, voter: &AccountId, new_weight: Fixed, now: Timestamp) {
        for parameter in Parameter::ALL {
            self.store_mut(parameter).on_stake_changed(voter, new_weight, now);
        }
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new()
    }
}
