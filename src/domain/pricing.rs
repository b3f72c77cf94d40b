use crate::domain::fixed_point::{isqrt, Fixed, Rounding, SCALE};
use crate::domain::types::{SwapError, SwapResult};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Outcome of a completed swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    /// Tokens paid out to the trader
    pub amount_out: Fixed,
    /// Portion of the input retained by the pool as fee
    pub fee_amount: Fixed,
    /// Liquidity shares minted for the referral
    pub referral_shares: Fixed,
    /// Liquidity shares minted for the governance receiver
    pub governance_shares: Fixed,
}

/// Outcome of a completed deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Liquidity shares minted to the depositor
    pub shares_minted: Fixed,
    /// Amounts actually taken per slot, in canonical token order
    pub deposited: [Fixed; 2],
}

/// Outcome of a completed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    /// Liquidity shares burned
    pub shares_burned: Fixed,
    /// Amounts returned per slot, in canonical token order
    pub withdrawn: [Fixed; 2],
}

/// Constant-product output for `amount_in` against the decayed virtual
/// balances, with the fee taken from the input side.
///
/// Returns zero for a zero input or an unseeded side; the caller treats a
/// zero quote as unfillable.
pub fn get_return(
    balance_to_add: Fixed,
    balance_to_remove: Fixed,
    amount_in: Fixed,
    fee: Fixed,
) -> SwapResult<Fixed> {
    if amount_in.is_zero() || balance_to_add.is_zero() || balance_to_remove.is_zero() {
        return Ok(Fixed::zero());
    }
    let taxed = amount_in.mul(fee.complement()?, Rounding::Down)?;
    let new_balance = balance_to_add.checked_add(taxed)?;
    balance_to_remove.mul_div(taxed, new_balance, Rounding::Down)
}

/// Share-mint base from fee-driven invariant growth.
///
/// Compares the post-trade real product against the product of the virtual
/// balances the quote priced off. Growth above one means the trade left more
/// value in the pool than the virtual curve promised (fees plus rounding);
/// the geometric mean of that growth, applied to the share supply, is the
/// amount of new shares that dilutes holders by exactly the growth the pool
/// gained.
pub fn invariant_increase(
    total_supply: Fixed,
    real_in_after: Fixed,
    virtual_in: Fixed,
    real_out_after: Fixed,
    virtual_out: Fixed,
) -> SwapResult<Fixed> {
    if virtual_in.is_zero() || virtual_out.is_zero() {
        return Ok(Fixed::zero());
    }
    let one36 = U256::from(SCALE) * U256::from(SCALE);
    let step = one36
        .checked_mul(U256::from(real_in_after.raw()))
        .ok_or(SwapError::Overflow)?
        / U256::from(virtual_in.raw());
    let ratio = step
        .checked_mul(U256::from(real_out_after.raw()))
        .ok_or(SwapError::Overflow)?
        / U256::from(virtual_out.raw());
    if ratio <= one36 {
        return Ok(Fixed::zero());
    }
    let growth = isqrt(ratio);
    let one18 = U256::from(SCALE);
    let increase = U256::from(total_supply.raw()) * (growth - one18) / growth;
    if increase.bits() > 128 {
        return Err(SwapError::Overflow);
    }
    Ok(Fixed::from_raw(increase.low_u128()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> Fixed {
        s.parse().unwrap()
    }

    #[test]
    fn test_constant_product_no_fee() {
        let out = get_return(
            Fixed::from_int(1),
            Fixed::from_int(100),
            Fixed::from_int(1),
            Fixed::zero(),
        )
        .unwrap();
        assert_eq!(out, Fixed::from_int(50));
    }

    #[test]
    fn test_zero_input_or_unseeded_pool_quotes_zero() {
        assert_eq!(
            get_return(Fixed::from_int(1), Fixed::from_int(100), Fixed::zero(), Fixed::zero())
                .unwrap(),
            Fixed::zero()
        );
        assert_eq!(
            get_return(Fixed::zero(), Fixed::from_int(100), Fixed::from_int(1), Fixed::zero())
                .unwrap(),
            Fixed::zero()
        );
        assert_eq!(
            get_return(Fixed::from_int(1), Fixed::zero(), Fixed::from_int(1), Fixed::zero())
                .unwrap(),
            Fixed::zero()
        );
    }

    #[test]
    fn test_fee_reduces_output_exactly() {
        // Pool (1, 300), 1 token in at a 0.005 fee: taxed input is
        // 0.995000000000000001 of a token after the complement rounding.
        let out = get_return(
            Fixed::from_int(1),
            Fixed::from_int(300),
            Fixed::from_int(1),
            Fixed(4_999_999_999_999_999),
        )
        .unwrap();
        assert_eq!(out.raw(), 149_624_060_150_375_939_925);
    }

    #[test]
    fn test_large_trade_drains_output_side() {
        // Pool (5, 1), one billion tokens in: the output approaches the full
        // reserve from below, one rounding wei at a time.
        let out = get_return(
            Fixed::from_int(5),
            Fixed::from_int(1),
            Fixed::from_int(1_000_000_000),
            Fixed::zero(),
        )
        .unwrap();
        assert_eq!(out.raw(), 999_999_995_000_000_024);
    }

    #[test]
    fn test_output_is_additive_at_fixed_balances() {
        // quote(x) against post-trade snapped balances composes with quote(y).
        let first = get_return(
            Fixed::from_int(1),
            Fixed::from_int(100),
            fp("0.6"),
            Fixed::zero(),
        )
        .unwrap();
        assert_eq!(first, fp("37.5"));

        let second = get_return(
            fp("1.6"),
            Fixed::from_int(100).checked_sub(first).unwrap(),
            Fixed::from_int(1),
            Fixed::zero(),
        )
        .unwrap();
        assert_eq!(second.raw(), 24_038_461_538_461_538_461);

        let combined = get_return(
            Fixed::from_int(1),
            Fixed::from_int(100),
            fp("1.6"),
            Fixed::zero(),
        )
        .unwrap();
        assert_eq!(
            combined,
            first.checked_add(second).unwrap()
        );
    }

    #[test]
    fn test_invariant_increase_from_rounding_dust() {
        // Pool (5, 1) fully decayed, zero fee, one billion tokens in. The
        // only growth is the floored output wei, and the mint base reflects
        // exactly that.
        let supply = Fixed::from_int(5).checked_add(Fixed(1_000)).unwrap();
        let amount_in = Fixed::from_int(1_000_000_000);
        let amount_out = Fixed(999_999_995_000_000_024);

        let increase = invariant_increase(
            supply,
            Fixed::from_int(5).checked_add(amount_in).unwrap(),
            Fixed::from_int(5),
            Fixed::from_int(1).checked_sub(amount_out).unwrap(),
            Fixed::from_int(1),
        )
        .unwrap();
        assert_eq!(increase.raw(), 499_999_934);

        // A tenth to the referral, a hundredth to governance.
        assert_eq!(
            increase.mul(fp("0.1"), Rounding::Down).unwrap().raw(),
            49_999_993
        );
        assert_eq!(
            increase.mul(fp("0.01"), Rounding::Down).unwrap().raw(),
            4_999_999
        );
    }

    #[test]
    fn test_no_increase_without_growth() {
        // An exact constant-product fill leaves the invariant unchanged.
        let increase = invariant_increase(
            Fixed::from_int(100),
            Fixed::from_int(2),
            Fixed::from_int(2),
            Fixed::from_int(50),
            Fixed::from_int(50),
        )
        .unwrap();
        assert_eq!(increase, Fixed::zero());

        let unseeded = invariant_increase(
            Fixed::zero(),
            Fixed::from_int(1),
            Fixed::zero(),
            Fixed::from_int(1),
            Fixed::zero(),
        )
        .unwrap();
        assert_eq!(unseeded, Fixed::zero());
    }
}
