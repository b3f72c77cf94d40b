use crate::domain::decay::TokenSlot;
use crate::domain::family::SharedFamily;
use crate::domain::fixed_point::{Fixed, Rounding};
use crate::domain::governance::{Parameter, ParameterSet};
use crate::domain::ledger::{LiquidityLedger, BASE_SUPPLY};
use crate::domain::pricing::{
    get_return, invariant_increase, DepositReceipt, SwapReceipt, WithdrawReceipt,
};
use crate::domain::types::{
    AccountId, AdminToken, StakingToken, SwapError, SwapResult, Timestamp, TokenId, TokenLedger,
};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Raw share units guaranteed to the first depositor.
///
/// Together with [`BASE_SUPPLY`] this keeps the initial supply above the
/// level where single-wei rounding could move the share price.
const MIN_INITIAL_SHARES: Fixed = Fixed(99_000);

/// Two-asset exchange pool.
///
/// Composes the decaying token slots, the per-pool governance stores, the
/// liquidity-share ledger, and a handle to the owning family. Token custody
/// is delegated to the [`TokenLedger`] collaborator; every mutating operation
/// finishes its own bookkeeping before invoking it and restores the prior
/// state if the collaborator fails.
pub struct Pool {
    name: String,
    symbol: String,
    slots: [TokenSlot; 2],
    params: ParameterSet,
    ledger: LiquidityLedger,
    family: SharedFamily,
    token_ledger: Box<dyn TokenLedger>,
}

impl Pool {
    /// Creates a pool for two distinct tokens under `family`.
    ///
    /// Slot order is canonical: the lexicographically smaller token identity
    /// becomes slot 0, so deposit and withdraw arrays are position-stable
    /// regardless of construction argument order.
    pub fn new(
        token_a: TokenId,
        token_b: TokenId,
        name: String,
        symbol: String,
        family: SharedFamily,
        token_ledger: Box<dyn TokenLedger>,
    ) -> SwapResult<Self> {
        if token_a == token_b || token_a.is_empty() || token_b.is_empty() {
            return Err(SwapError::InvalidTokenPair);
        }
        if name.is_empty() {
            return Err(SwapError::NameEmpty);
        }
        if symbol.is_empty() {
            return Err(SwapError::SymbolEmpty);
        }
        let (first, second) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        info!(%name, %symbol, token0 = %first, token1 = %second, "pool created");
        Ok(Self {
            name,
            symbol,
            slots: [TokenSlot::new(first), TokenSlot::new(second)],
            params: ParameterSet::new(),
            ledger: LiquidityLedger::new(),
            family,
            token_ledger,
        })
    }

    /// Pool name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Liquidity-share symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Both token identities in canonical slot order
    pub fn tokens(&self) -> [TokenId; 2] {
        [self.slots[0].token.clone(), self.slots[1].token.clone()]
    }

    /// Token identity at `index`
    pub fn token(&self, index: usize) -> SwapResult<&TokenId> {
        self.slots
            .get(index)
            .map(|slot| &slot.token)
            .ok_or(SwapError::IndexOutOfRange { index })
    }

    /// Total liquidity-share supply including the locked base supply
    pub fn total_shares(&self) -> Fixed {
        self.ledger.total_supply()
    }

    /// Liquidity shares held by `account`
    pub fn share_balance_of(&self, account: &AccountId) -> Fixed {
        self.ledger.balance_of(account)
    }

    fn index_of(&self, token: &TokenId) -> Option<usize> {
        self.slots.iter().position(|slot| &slot.token == token)
    }

    fn peek_param(&self, parameter: Parameter, now: Timestamp) -> Fixed {
        let fallback = self
            .family
            .read()
            .expect("Failed to acquire read lock")
            .get_default(parameter, now);
        self.params.store(parameter).peek(now, fallback)
    }

    fn read_param(&mut self, parameter: Parameter, now: Timestamp) -> Fixed {
        let fallback = self
            .family
            .read()
            .expect("Failed to acquire read lock")
            .get_default(parameter, now);
        self.params.store_mut(parameter).read(now, fallback)
    }

    fn decay_period_secs(&self, now: Timestamp) -> u64 {
        self.peek_param(Parameter::DecayPeriod, now).to_int() as u64
    }

    /// Governed parameter value at `now`, falling back to the family default
    /// while no pool-local vote has applied.
    pub fn get_parameter(&self, parameter: Parameter, now: Timestamp) -> Fixed {
        self.peek_param(parameter, now)
    }

    /// Virtual input-side balance of `token`; zero for a foreign token
    pub fn get_balance_to_add(&self, token: &TokenId, now: Timestamp) -> Fixed {
        match self.index_of(token) {
            Some(index) => self.slots[index].balance_to_add(now, self.decay_period_secs(now)),
            None => Fixed::zero(),
        }
    }

    /// Virtual output-side balance of `token`; zero for a foreign token
    pub fn get_balance_to_remove(&self, token: &TokenId, now: Timestamp) -> Fixed {
        match self.index_of(token) {
            Some(index) => self.slots[index].balance_to_remove(now, self.decay_period_secs(now)),
            None => Fixed::zero(),
        }
    }

    /// Quoted output for `amount_in`, or zero when the trade is unfillable
    /// (self-swap, foreign token, unseeded side, or overflow).
    pub fn get_quote(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: Fixed,
        now: Timestamp,
    ) -> Fixed {
        if token_in == token_out {
            return Fixed::zero();
        }
        let (Some(in_idx), Some(out_idx)) = (self.index_of(token_in), self.index_of(token_out))
        else {
            return Fixed::zero();
        };
        let period = self.decay_period_secs(now);
        let fee = self.peek_param(Parameter::Fee, now);
        get_return(
            self.slots[in_idx].balance_to_add(now, period),
            self.slots[out_idx].balance_to_remove(now, period),
            amount_in,
            fee,
        )
        .unwrap_or_else(|_| Fixed::zero())
    }

    /// Swaps `amount_in` of `token_in` for `token_out`.
    ///
    /// Fee-driven invariant growth mints liquidity shares to the referral and
    /// the governance receiver; a configured fee collector supersedes both
    /// destinations and must be able to receive shares or the whole trade
    /// fails before any state change.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &mut self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: Fixed,
        min_return: Fixed,
        referral: Option<&AccountId>,
        caller: &AccountId,
        now: Timestamp,
    ) -> SwapResult<SwapReceipt> {
        let (collector, governance_wallet) = {
            let family = self.family.read().expect("Failed to acquire read lock");
            if family.is_shutdown() {
                return Err(SwapError::FactoryShutdown);
            }
            (
                family.fee_collector().cloned(),
                family.governance_wallet().cloned(),
            )
        };
        if amount_in.is_zero() {
            return Err(SwapError::AmountIsZero);
        }
        let (in_idx, out_idx) = match (self.index_of(token_in), self.index_of(token_out)) {
            (Some(i), Some(o)) if i != o => (i, o),
            _ => {
                return Err(SwapError::InsufficientOutput {
                    minimum: min_return,
                    actual: Fixed::zero(),
                })
            }
        };

        let fee = self.read_param(Parameter::Fee, now);
        let referral_share = self.read_param(Parameter::ReferralShare, now);
        let governance_share = self.read_param(Parameter::GovernanceShare, now);
        let period = self.read_param(Parameter::DecayPeriod, now).to_int() as u64;

        let balance_to_add = self.slots[in_idx].balance_to_add(now, period);
        let balance_to_remove = self.slots[out_idx].balance_to_remove(now, period);
        let amount_out = get_return(balance_to_add, balance_to_remove, amount_in, fee)?;
        if amount_out.is_zero() || amount_out < min_return {
            return Err(SwapError::InsufficientOutput {
                minimum: min_return,
                actual: amount_out,
            });
        }
        let fee_amount = amount_in.checked_sub(amount_in.mul(fee.complement()?, Rounding::Down)?)?;

        let increase = invariant_increase(
            self.ledger.total_supply(),
            self.slots[in_idx].actual_balance.checked_add(amount_in)?,
            balance_to_add,
            self.slots[out_idx].actual_balance.checked_sub(amount_out)?,
            balance_to_remove,
        )?;
        let mut referral_shares = Fixed::zero();
        let mut governance_shares = increase.mul(governance_share, Rounding::Down)?;

        // Resolve mint destinations before touching state. Configured
        // receivers must accept shares; a plain referral that cannot receive
        // just forfeits its slice.
        let mut mints: Vec<(AccountId, Fixed)> = Vec::new();
        if let Some(referral) = referral {
            referral_shares = increase.mul(referral_share, Rounding::Down)?;
            if !referral_shares.is_zero() {
                match collector.as_ref() {
                    Some(dest) => {
                        if !self.token_ledger.can_receive(dest) {
                            return Err(SwapError::TransferFailed);
                        }
                        mints.push((dest.clone(), referral_shares));
                    }
                    None if self.token_ledger.can_receive(referral) => {
                        mints.push((referral.clone(), referral_shares));
                    }
                    None => referral_shares = Fixed::zero(),
                }
            }
        }
        if !governance_shares.is_zero() {
            match collector.as_ref().or(governance_wallet.as_ref()) {
                Some(dest) => {
                    if !self.token_ledger.can_receive(dest) {
                        return Err(SwapError::TransferFailed);
                    }
                    mints.push((dest.clone(), governance_shares));
                }
                None => governance_shares = Fixed::zero(),
            }
        }

        let snapshot = (self.slots.clone(), self.ledger.clone());
        let settled = (|| -> SwapResult<()> {
            self.slots[in_idx].apply_inflow(amount_in, now, period)?;
            self.slots[out_idx].apply_outflow(amount_out, now, period)?;
            for (destination, shares) in &mints {
                self.ledger.mint(destination, *shares)?;
                debug!(destination = %destination, shares = %shares, "fee shares minted");
            }
            self.token_ledger.transfer_in(token_in, caller, amount_in)?;
            self.token_ledger.transfer_out(token_out, caller, amount_out)?;
            Ok(())
        })();
        if let Err(err) = settled {
            warn!(pool = %self.symbol, error = %err, "swap rolled back");
            self.slots = snapshot.0;
            self.ledger = snapshot.1;
            return Err(err);
        }

        info!(
            pool = %self.symbol,
            token_in = %token_in,
            token_out = %token_out,
            amount_in = %amount_in,
            amount_out = %amount_out,
            "swap executed"
        );
        Ok(SwapReceipt {
            amount_out,
            fee_amount,
            referral_shares,
            governance_shares,
        })
    }

    /// Deposits up to `amounts` of each token, in canonical slot order.
    ///
    /// The first deposit seeds the pool at the offered ratio. Subsequent
    /// deposits are capped to the current price ratio on the virtual
    /// input-side balances: only the matching portion of each offer is taken,
    /// and the mint is proportional to that portion of the supply.
    pub fn deposit(
        &mut self,
        amounts: [Fixed; 2],
        min_amounts: [Fixed; 2],
        depositor: &AccountId,
        now: Timestamp,
    ) -> SwapResult<DepositReceipt> {
        let supply = self.ledger.total_supply();
        if supply.is_zero() {
            return self.first_deposit(amounts, min_amounts, depositor, now);
        }

        let period = self.read_param(Parameter::DecayPeriod, now).to_int() as u64;
        let virtual_balances = [
            self.slots[0].balance_to_add(now, period),
            self.slots[1].balance_to_add(now, period),
        ];
        let mut fair_ratio = Fixed(u128::MAX);
        for index in 0..2 {
            let ratio = amounts[index].div(virtual_balances[index], Rounding::Down)?;
            fair_ratio = fair_ratio.min(ratio);
        }
        let shares = supply.mul(fair_ratio, Rounding::Down)?;
        if shares.is_zero() {
            return Err(SwapError::AmountIsZero);
        }
        let mut taken = [Fixed::zero(); 2];
        for index in 0..2 {
            taken[index] = virtual_balances[index]
                .mul(fair_ratio, Rounding::Up)?
                .min(amounts[index]);
            if taken[index] < min_amounts[index] {
                return Err(SwapError::MinAmountNotReached {
                    minimum: min_amounts[index],
                    actual: taken[index],
                });
            }
        }

        let new_supply = supply.checked_add(shares)?;
        let snapshot = (self.slots.clone(), self.ledger.clone());
        let settled = (|| -> SwapResult<()> {
            for index in 0..2 {
                self.slots[index].scale_records(new_supply, supply)?;
                self.slots[index].credit(taken[index])?;
            }
            self.ledger.mint(depositor, shares)?;
            for index in 0..2 {
                let token = self.slots[index].token.clone();
                self.token_ledger.transfer_in(&token, depositor, taken[index])?;
            }
            Ok(())
        })();
        if let Err(err) = settled {
            warn!(pool = %self.symbol, error = %err, "deposit rolled back");
            self.slots = snapshot.0;
            self.ledger = snapshot.1;
            return Err(err);
        }

        info!(
            pool = %self.symbol,
            depositor = %depositor,
            shares = %shares,
            "liquidity deposited"
        );
        Ok(DepositReceipt {
            shares_minted: shares,
            deposited: taken,
        })
    }

    fn first_deposit(
        &mut self,
        amounts: [Fixed; 2],
        min_amounts: [Fixed; 2],
        depositor: &AccountId,
        now: Timestamp,
    ) -> SwapResult<DepositReceipt> {
        for index in 0..2 {
            if amounts[index].is_zero() {
                return Err(SwapError::AmountIsZero);
            }
            if amounts[index] < min_amounts[index] {
                return Err(SwapError::MinAmountNotReached {
                    minimum: min_amounts[index],
                    actual: amounts[index],
                });
            }
        }
        let shares = amounts[0].max(amounts[1]).max(MIN_INITIAL_SHARES);

        let snapshot = (self.slots.clone(), self.ledger.clone());
        let settled = (|| -> SwapResult<()> {
            for index in 0..2 {
                self.slots[index].set_initial(amounts[index], now);
            }
            self.ledger.mint(depositor, shares)?;
            self.ledger.mint_locked(BASE_SUPPLY)?;
            for index in 0..2 {
                let token = self.slots[index].token.clone();
                self.token_ledger
                    .transfer_in(&token, depositor, amounts[index])?;
            }
            Ok(())
        })();
        if let Err(err) = settled {
            warn!(pool = %self.symbol, error = %err, "deposit rolled back");
            self.slots = snapshot.0;
            self.ledger = snapshot.1;
            return Err(err);
        }

        info!(
            pool = %self.symbol,
            depositor = %depositor,
            shares = %shares,
            "pool seeded"
        );
        Ok(DepositReceipt {
            shares_minted: shares,
            deposited: amounts,
        })
    }

    /// Burns `shares` and pays out the proportional slice of each real
    /// balance. An empty `min_amounts` slice waives the slippage floors.
    pub fn withdraw(
        &mut self,
        shares: Fixed,
        min_amounts: &[Fixed],
        account: &AccountId,
    ) -> SwapResult<WithdrawReceipt> {
        if shares.is_zero() {
            return Err(SwapError::AmountIsZero);
        }
        let supply = self.ledger.total_supply();
        let mut withdrawn = [Fixed::zero(); 2];
        for index in 0..2 {
            withdrawn[index] =
                self.slots[index]
                    .actual_balance
                    .mul_div(shares, supply, Rounding::Down)?;
            if let Some(minimum) = min_amounts.get(index) {
                if withdrawn[index] < *minimum {
                    return Err(SwapError::InsufficientOutput {
                        minimum: *minimum,
                        actual: withdrawn[index],
                    });
                }
            }
        }
        let remaining_supply = supply.checked_sub(shares)?;

        let snapshot = (self.slots.clone(), self.ledger.clone());
        let settled = (|| -> SwapResult<()> {
            self.ledger.burn(account, shares)?;
            for index in 0..2 {
                self.slots[index].scale_records(remaining_supply, supply)?;
                self.slots[index].debit(withdrawn[index])?;
            }
            for index in 0..2 {
                let token = self.slots[index].token.clone();
                self.token_ledger
                    .transfer_out(&token, account, withdrawn[index])?;
            }
            Ok(())
        })();
        if let Err(err) = settled {
            warn!(pool = %self.symbol, error = %err, "withdraw rolled back");
            self.slots = snapshot.0;
            self.ledger = snapshot.1;
            return Err(err);
        }

        info!(
            pool = %self.symbol,
            account = %account,
            shares = %shares,
            "liquidity withdrawn"
        );
        Ok(WithdrawReceipt {
            shares_burned: shares,
            withdrawn,
        })
    }

    /// Casts `voter`'s stake-weighted vote on a pool-scoped parameter.
    pub fn vote(
        &mut self,
        parameter: Parameter,
        voter: &AccountId,
        value: Fixed,
        now: Timestamp,
    ) -> SwapResult<()> {
        let weight = self
            .family
            .read()
            .expect("Failed to acquire read lock")
            .weight_of(voter);
        self.params.store_mut(parameter).vote(voter, value, weight, now)
    }

    /// Withdraws `voter`'s pool-scoped vote on `parameter`.
    pub fn discard_vote(&mut self, parameter: Parameter, voter: &AccountId, now: Timestamp) {
        self.params.store_mut(parameter).discard(voter, now);
    }

    /// Epoch hook: force-applies the pending pool-scoped value of
    /// `parameter`.
    pub fn apply_parameter(&mut self, parameter: Parameter, now: Timestamp) -> SwapResult<Fixed> {
        let fallback = self
            .family
            .read()
            .expect("Failed to acquire read lock")
            .get_default(parameter, now);
        self.params.store_mut(parameter).apply(now, fallback)
    }

    /// Re-weights `voter`'s pool-scoped votes after a stake change.
    pub fn on_stake_changed(
        &mut self,
        staking: &StakingToken,
        voter: &AccountId,
        now: Timestamp,
    ) -> SwapResult<()> {
        let weight = {
            let family = self.family.read().expect("Failed to acquire read lock");
            family.check_staking(staking)?;
            family.weight_of(voter)
        };
        self.params.on_stake_changed(voter, weight, now);
        Ok(())
    }

    /// Pays out `amount` of a token the pool does not manage.
    ///
    /// Tokens sent to the pool by mistake have no slot and no owner; the
    /// family administrator can route them to `to`. The two pool tokens are
    /// never rescuable.
    pub fn rescue_funds(
        &self,
        admin: &AdminToken,
        token: &TokenId,
        to: &AccountId,
        amount: Fixed,
    ) -> SwapResult<()> {
        self.family
            .read()
            .expect("Failed to acquire read lock")
            .check_admin(admin)?;
        if self.index_of(token).is_some() {
            return Err(SwapError::DeniedForPoolTokens);
        }
        if amount.is_zero() {
            return Err(SwapError::AmountIsZero);
        }
        info!(pool = %self.symbol, token = %token, to = %to, amount = %amount, "funds rescued");
        self.token_ledger.transfer_out(token, to, amount)
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("slots", &self.slots)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

/// Thread-safe pool handle for multi-threaded hosts.
///
/// Reads take a shared lock; mutations take the exclusive lock, which
/// serializes them and preserves the one-transaction-at-a-time model.
pub struct ThreadSafePool {
    inner: Arc<RwLock<Pool>>,
}

impl ThreadSafePool {
    /// Wraps `pool` for shared use
    pub fn new(pool: Pool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pool)),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Pool> {
        self.inner.read().expect("Failed to acquire read lock")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Pool> {
        self.inner.write().expect("Failed to acquire write lock")
    }

    /// Both token identities in canonical slot order
    pub fn tokens(&self) -> [TokenId; 2] {
        self.read().tokens()
    }

    /// Total liquidity-share supply
    pub fn total_shares(&self) -> Fixed {
        self.read().total_shares()
    }

    /// Liquidity shares held by `account`
    pub fn share_balance_of(&self, account: &AccountId) -> Fixed {
        self.read().share_balance_of(account)
    }

    /// See [`Pool::get_parameter`]
    pub fn get_parameter(&self, parameter: Parameter, now: Timestamp) -> Fixed {
        self.read().get_parameter(parameter, now)
    }

    /// See [`Pool::get_balance_to_add`]
    pub fn get_balance_to_add(&self, token: &TokenId, now: Timestamp) -> Fixed {
        self.read().get_balance_to_add(token, now)
    }

    /// See [`Pool::get_balance_to_remove`]
    pub fn get_balance_to_remove(&self, token: &TokenId, now: Timestamp) -> Fixed {
        self.read().get_balance_to_remove(token, now)
    }

    /// See [`Pool::get_quote`]
    pub fn get_quote(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: Fixed,
        now: Timestamp,
    ) -> Fixed {
        self.read().get_quote(token_in, token_out, amount_in, now)
    }

    /// See [`Pool::swap`]
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: Fixed,
        min_return: Fixed,
        referral: Option<&AccountId>,
        caller: &AccountId,
        now: Timestamp,
    ) -> SwapResult<SwapReceipt> {
        self.write()
            .swap(token_in, token_out, amount_in, min_return, referral, caller, now)
    }

    /// See [`Pool::deposit`]
    pub fn deposit(
        &self,
        amounts: [Fixed; 2],
        min_amounts: [Fixed; 2],
        depositor: &AccountId,
        now: Timestamp,
    ) -> SwapResult<DepositReceipt> {
        self.write().deposit(amounts, min_amounts, depositor, now)
    }

    /// See [`Pool::withdraw`]
    pub fn withdraw(
        &self,
        shares: Fixed,
        min_amounts: &[Fixed],
        account: &AccountId,
    ) -> SwapResult<WithdrawReceipt> {
        self.write().withdraw(shares, min_amounts, account)
    }

    /// See [`Pool::vote`]
    pub fn vote(
        &self,
        parameter: Parameter,
        voter: &AccountId,
        value: Fixed,
        now: Timestamp,
    ) -> SwapResult<()> {
        self.write().vote(parameter, voter, value, now)
    }

    /// See [`Pool::discard_vote`]
    pub fn discard_vote(&self, parameter: Parameter, voter: &AccountId, now: Timestamp) {
        self.write().discard_vote(parameter, voter, now);
    }

    /// See [`Pool::apply_parameter`]
    pub fn apply_parameter(&self, parameter: Parameter, now: Timestamp) -> SwapResult<Fixed> {
        self.write().apply_parameter(parameter, now)
    }

    /// See [`Pool::on_stake_changed`]
    pub fn on_stake_changed(
        &self,
        staking: &StakingToken,
        voter: &AccountId,
        now: Timestamp,
    ) -> SwapResult<()> {
        self.write().on_stake_changed(staking, voter, now)
    }

    /// See [`Pool::rescue_funds`]
    pub fn rescue_funds(
        &self,
        admin: &AdminToken,
        token: &TokenId,
        to: &AccountId,
        amount: Fixed,
    ) -> SwapResult<()> {
        self.read().rescue_funds(admin, token, to, amount)
    }
}

impl Clone for ThreadSafePool {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
