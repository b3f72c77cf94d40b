use crate::domain::fixed_point::{Fixed, Rounding};
use crate::domain::types::{SwapResult, Timestamp, TokenId};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Linear ramp from `old` to `new` over a decay window starting at `start`.
///
/// The effective value is `old` at or before `start`, `new` once the window
/// has fully elapsed, and the linear interpolation in between. A record never
/// mutates on read; balance-changing operations replace it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayRecord {
    /// Value at the start of the window
    pub old: Fixed,
    /// Value once the window has elapsed
    pub new: Fixed,
    /// Window start time
    pub start: Timestamp,
}

impl DecayRecord {
    /// A collapsed record holding `value` with no ramp in progress
    pub fn snapped(value: Fixed, now: Timestamp) -> Self {
        Self {
            old: value,
            new: value,
            start: now,
        }
    }

    /// Evaluates the record at `now` under the given decay period.
    pub fn eval(&self, now: Timestamp, period: u64) -> Fixed {
        if now <= self.start {
            return self.old;
        }
        let elapsed = now - self.start;
        if elapsed >= period {
            return self.new;
        }
        let remaining = period - elapsed;
        // Single widened division keeps mid-ramp values exact to the wei.
        let weighted = U256::from(self.old.raw()) * U256::from(remaining)
            + U256::from(self.new.raw()) * U256::from(elapsed);
        Fixed::from_raw((weighted / U256::from(period)).low_u128())
    }

    fn scale(&mut self, numerator: Fixed, denominator: Fixed) -> SwapResult<()> {
        self.old = self.old.mul_div(numerator, denominator, Rounding::Down)?;
        self.new = self.new.mul_div(numerator, denominator, Rounding::Down)?;
        Ok(())
    }
}

/// One pool token's real balance plus its pair of decaying virtual balances.
///
/// `add_decay` feeds the quote when this token is the input side and
/// `remove_decay` when it is the output side; the two evolve independently
/// so a trade's own direction reprices instantly while the reverse direction
/// ramps over the decay period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSlot {
    /// Token held in this slot
    pub token: TokenId,
    /// Real custodied balance
    pub actual_balance: Fixed,
    /// Virtual balance used when quoting this token as input
    pub add_decay: DecayRecord,
    /// Virtual balance used when quoting this token as output
    pub remove_decay: DecayRecord,
}

impl TokenSlot {
    /// Creates an empty slot for `token`
    pub fn new(token: TokenId) -> Self {
        Self {
            token,
            actual_balance: Fixed::zero(),
            add_decay: DecayRecord::snapped(Fixed::zero(), 0),
            remove_decay: DecayRecord::snapped(Fixed::zero(), 0),
        }
    }

    /// Virtual balance for quoting this token as the input side.
    ///
    /// Never below the real balance: an inflow must reprice its own
    /// direction immediately.
    pub fn balance_to_add(&self, now: Timestamp, period: u64) -> Fixed {
        self.add_decay.eval(now, period).max(self.actual_balance)
    }

    /// Virtual balance for quoting this token as the output side.
    ///
    /// Never above the real balance: the pool cannot quote more than it
    /// custodies.
    pub fn balance_to_remove(&self, now: Timestamp, period: u64) -> Fixed {
        self.remove_decay.eval(now, period).min(self.actual_balance)
    }

    /// Registers `amount` entering this slot.
    ///
    /// The add record snaps to the fresh balance; the remove record restarts
    /// from its evaluated value so the reverse direction ramps without a
    /// price jump.
    pub fn apply_inflow(&mut self, amount: Fixed, now: Timestamp, period: u64) -> SwapResult<()> {
        let remove_now = self.remove_decay.eval(now, period);
        self.actual_balance = self.actual_balance.checked_add(amount)?;
        self.add_decay = DecayRecord::snapped(self.actual_balance, now);
        self.remove_decay = DecayRecord {
            old: remove_now,
            new: self.actual_balance,
            start: now,
        };
        Ok(())
    }

    /// Registers `amount` leaving this slot.
    ///
    /// Mirror image of [`apply_inflow`](Self::apply_inflow): the remove
    /// record snaps, the add record restarts from its evaluated value.
    pub fn apply_outflow(&mut self, amount: Fixed, now: Timestamp, period: u64) -> SwapResult<()> {
        let add_now = self.add_decay.eval(now, period);
        self.actual_balance = self.actual_balance.checked_sub(amount)?;
        self.remove_decay = DecayRecord::snapped(self.actual_balance, now);
        self.add_decay = DecayRecord {
            old: add_now,
            new: self.actual_balance,
            start: now,
        };
        Ok(())
    }

    /// Seeds the slot on the first deposit: both records collapse to the
    /// deposited amount.
    pub fn set_initial(&mut self, amount: Fixed, now: Timestamp) {
        self.actual_balance = amount;
        self.add_decay = DecayRecord::snapped(amount, now);
        self.remove_decay = DecayRecord::snapped(amount, now);
    }

    /// Scales both decay records by `numerator / denominator`.
    ///
    /// Liquidity operations change the share supply from `denominator` to
    /// `numerator`; mid-ramp virtual balances keep their shape but scale
    /// proportionally so the quoted price ratio is preserved.
    pub fn scale_records(&mut self, numerator: Fixed, denominator: Fixed) -> SwapResult<()> {
        self.add_decay.scale(numerator, denominator)?;
        self.remove_decay.scale(numerator, denominator)?;
        Ok(())
    }

    /// Adds tokens without restarting decay; used by deposits after records
    /// are rescaled.
    pub fn credit(&mut self, amount: Fixed) -> SwapResult<()> {
        self.actual_balance = self.actual_balance.checked_add(amount)?;
        Ok(())
    }

    /// Removes tokens without restarting decay; used by withdrawals after
    /// records are rescaled.
    pub fn debit(&mut self, amount: Fixed) -> SwapResult<()> {
        self.actual_balance = self.actual_balance.checked_sub(amount)?;
        Ok(())
    }
}
