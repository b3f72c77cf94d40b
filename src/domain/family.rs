use crate::domain::fixed_point::Fixed;
use crate::domain::governance::{Parameter, ParameterSet};
use crate::domain::types::{
    AccountId, AdminToken, StakeOracle, StakingToken, SwapError, SwapResult, Timestamp,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::info;

static NEXT_FAMILY_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle to a family, taken by every pool created under it.
pub type SharedFamily = Arc<RwLock<PoolFamily>>;

/// Administrative scope shared by a group of pools.
///
/// The family owns the fallback governance defaults every member pool reads
/// when it has no locally-applied value, the stake oracle that weights votes,
/// the optional fee receivers, and the one-way shutdown switch. Construction
/// issues the [`AdminToken`] and [`StakingToken`] credentials; authorization
/// is purely capability-based, there is no caller-identity lookup.
pub struct PoolFamily {
    id: u64,
    name: String,
    defaults: ParameterSet,
    shutdown: bool,
    fee_collector: Option<AccountId>,
    governance_wallet: Option<AccountId>,
    stake_oracle: Box<dyn StakeOracle>,
}

impl PoolFamily {
    /// Creates a family and issues its credentials.
    pub fn new(name: String, stake_oracle: Box<dyn StakeOracle>) -> (Self, AdminToken, StakingToken) {
        let id = NEXT_FAMILY_ID.fetch_add(1, Ordering::Relaxed);
        info!(family_id = id, name = %name, "pool family created");
        let family = Self {
            id,
            name,
            defaults: ParameterSet::new(),
            shutdown: false,
            fee_collector: None,
            governance_wallet: None,
            stake_oracle,
        };
        (family, AdminToken::new(id), StakingToken::new(id))
    }

    /// Unique family identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Human-readable family name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the administrator has disabled trading
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Receiver that collects both fee-share mints when configured
    pub fn fee_collector(&self) -> Option<&AccountId> {
        self.fee_collector.as_ref()
    }

    /// Receiver for the governance slice when no collector is configured
    pub fn governance_wallet(&self) -> Option<&AccountId> {
        self.governance_wallet.as_ref()
    }

    /// Current stake weight of `voter` per the family oracle
    pub fn weight_of(&self, voter: &AccountId) -> Fixed {
        self.stake_oracle.weight_of(voter)
    }

    pub(crate) fn check_admin(&self, admin: &AdminToken) -> SwapResult<()> {
        if admin.family_id() != self.id {
            return Err(SwapError::Unauthorized);
        }
        Ok(())
    }

    pub(crate) fn check_staking(&self, staking: &StakingToken) -> SwapResult<()> {
        if staking.family_id() != self.id {
            return Err(SwapError::Unauthorized);
        }
        Ok(())
    }

    /// Permanently disables trading across every member pool.
    pub fn shutdown(&mut self, admin: &AdminToken) -> SwapResult<()> {
        self.check_admin(admin)?;
        if !self.shutdown {
            info!(family_id = self.id, "family shut down, trading disabled");
        }
        self.shutdown = true;
        Ok(())
    }

    /// Sets or clears the fee collector.
    pub fn set_fee_collector(
        &mut self,
        admin: &AdminToken,
        collector: Option<AccountId>,
    ) -> SwapResult<()> {
        self.check_admin(admin)?;
        info!(family_id = self.id, collector = ?collector, "fee collector updated");
        self.fee_collector = collector;
        Ok(())
    }

    /// Sets or clears the governance wallet.
    pub fn set_governance_wallet(
        &mut self,
        admin: &AdminToken,
        wallet: Option<AccountId>,
    ) -> SwapResult<()> {
        self.check_admin(admin)?;
        info!(family_id = self.id, wallet = ?wallet, "governance wallet updated");
        self.governance_wallet = wallet;
        Ok(())
    }

    /// Casts `voter`'s stake-weighted vote on the family default for
    /// `parameter`.
    pub fn default_vote(
        &mut self,
        parameter: Parameter,
        voter: &AccountId,
        value: Fixed,
        now: Timestamp,
    ) -> SwapResult<()> {
        let weight = self.stake_oracle.weight_of(voter);
        self.defaults.store_mut(parameter).vote(voter, value, weight, now)
    }

    /// Withdraws `voter`'s vote on the family default for `parameter`.
    pub fn discard_default_vote(&mut self, parameter: Parameter, voter: &AccountId, now: Timestamp) {
        self.defaults.store_mut(parameter).discard(voter, now);
    }

    /// Family default for `parameter` at `now`, without mutating the store.
    ///
    /// Falls back to the policy default while no voted value has applied.
    pub fn get_default(&self, parameter: Parameter, now: Timestamp) -> Fixed {
        self.defaults
            .store(parameter)
            .peek(now, parameter.policy().default)
    }

    /// Family default for `parameter` at `now`, applying a due pending
    /// aggregate first.
    pub fn read_default(&mut self, parameter: Parameter, now: Timestamp) -> Fixed {
        self.defaults
            .store_mut(parameter)
            .read(now, parameter.policy().default)
    }

    /// Epoch hook: force-applies the pending default for `parameter`.
    pub fn apply_default(&mut self, parameter: Parameter, now: Timestamp) -> SwapResult<Fixed> {
        self.defaults
            .store_mut(parameter)
            .apply(now, parameter.policy().default)
    }

    /// Re-weights `voter`'s family-default votes after a stake change.
    pub fn on_stake_changed(
        &mut self,
        staking: &StakingToken,
        voter: &AccountId,
        now: Timestamp,
    ) -> SwapResult<()> {
        self.check_staking(staking)?;
        let weight = self.stake_oracle.weight_of(voter);
        self.defaults.on_stake_changed(voter, weight, now);
        Ok(())
    }
}

impl fmt::Debug for PoolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolFamily")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("shutdown", &self.shutdown)
            .field("fee_collector", &self.fee_collector)
            .field("governance_wallet", &self.governance_wallet)
            .finish_non_exhaustive()
    }
}
