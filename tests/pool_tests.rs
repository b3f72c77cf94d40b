mod common;

use common::*;
use decayswap::*;

#[test]
fn test_seeding_mints_max_amount_and_locks_base() {
    let h = seeded();

    assert_eq!(h.pool.share_balance_of(&alice()), Fixed::from_int(100));
    assert_eq!(
        h.pool.total_shares(),
        Fixed::from_int(100).checked_add(BASE_SUPPLY).unwrap()
    );

    // Custody moved out of alice's wallet.
    assert_eq!(
        h.ledger.balance(&usdt(), &alice()),
        Fixed::from_int(999_900)
    );
    assert_eq!(
        h.ledger.balance(&weth(), &alice()),
        Fixed::from_int(999_999)
    );
}

#[test]
fn test_tokens_are_canonically_ordered() {
    let h = harness();

    // Construction order was WETH then USDT; the pool sorts.
    assert_eq!(h.pool.tokens(), [usdt(), weth()]);
}

#[test]
fn test_quote_is_constant_product() {
    let h = seeded();

    let quote = h.pool.get_quote(&weth(), &usdt(), Fixed::from_int(1), 3_700);
    assert_eq!(quote, Fixed::from_int(50));

    // Unfillable requests quote zero rather than failing.
    assert_eq!(
        h.pool.get_quote(&weth(), &weth(), Fixed::from_int(1), 3_700),
        Fixed::zero()
    );
    assert_eq!(
        h.pool.get_quote(&dai(), &usdt(), Fixed::from_int(1), 3_700),
        Fixed::zero()
    );
    assert_eq!(
        h.pool.get_quote(&weth(), &usdt(), Fixed::zero(), 3_700),
        Fixed::zero()
    );
}

#[test]
fn test_swap_moves_custody_both_ways() {
    let h = seeded();

    let receipt = h
        .pool
        .swap(
            &weth(),
            &usdt(),
            Fixed::from_int(1),
            Fixed::zero(),
            None,
            &bob(),
            100,
        )
        .unwrap();

    assert_eq!(receipt.amount_out, Fixed::from_int(50));
    assert_eq!(receipt.fee_amount, Fixed::zero());
    assert_eq!(receipt.referral_shares, Fixed::zero());
    assert_eq!(receipt.governance_shares, Fixed::zero());

    assert_eq!(
        h.ledger.balance(&weth(), &bob()),
        Fixed::from_int(999_999)
    );
    assert_eq!(
        h.ledger.balance(&usdt(), &bob()),
        Fixed::from_int(1_000_050)
    );
}

#[test]
fn test_swap_rejects_bad_requests() {
    let h = seeded();

    let result = h.pool.swap(
        &weth(),
        &usdt(),
        Fixed::zero(),
        Fixed::zero(),
        None,
        &bob(),
        100,
    );
    assert!(matches!(result, Err(SwapError::AmountIsZero)));

    let result = h.pool.swap(
        &weth(),
        &usdt(),
        Fixed::from_int(1),
        Fixed::from_int(51),
        None,
        &bob(),
        100,
    );
    assert!(matches!(
        result,
        Err(SwapError::InsufficientOutput { minimum, actual })
            if minimum == Fixed::from_int(51) && actual == Fixed::from_int(50)
    ));

    let result = h.pool.swap(
        &dai(),
        &usdt(),
        Fixed::from_int(1),
        Fixed::zero(),
        None,
        &bob(),
        100,
    );
    assert!(matches!(result, Err(SwapError::InsufficientOutput { .. })));
}

#[test]
fn test_same_instant_swaps_compose_additively() {
    let h = seeded();

    let first = h
        .pool
        .swap(&weth(), &usdt(), fp("0.6"), Fixed::zero(), None, &bob(), 100)
        .unwrap();
    assert_eq!(first.amount_out, fp("37.5"));

    // The second leg quotes off the snapped post-trade balances, so the two
    // fills sum to the single-trade quote for the combined amount.
    let second = h
        .pool
        .swap(&weth(), &usdt(), Fixed::from_int(1), Fixed::zero(), None, &bob(), 100)
        .unwrap();
    assert_eq!(second.amount_out.raw(), 24_038_461_538_461_538_461);
}

#[test]
fn test_second_deposit_is_capped_to_pool_ratio() {
    let h = seeded();

    let receipt = h
        .pool
        .deposit(
            [Fixed::from_int(50), fp("0.5")],
            [Fixed::zero(), Fixed::zero()],
            &bob(),
            0,
        )
        .unwrap();

    assert_eq!(receipt.shares_minted.raw(), 50_000_000_000_000_000_500);
    assert_eq!(receipt.deposited, [Fixed::from_int(50), fp("0.5")]);

    // The quoted price is unchanged by a proportional deposit.
    assert_eq!(
        h.pool.get_quote(&weth(), &usdt(), fp("1.5"), 0),
        Fixed::from_int(75)
    );
}

#[test]
fn test_deposit_slippage_floor() {
    let h = seeded();

    // Offering 50 USDT alongside 0.5 WETH can only take 0.5 WETH; demanding
    // 0.6 breaches the floor.
    let result = h.pool.deposit(
        [Fixed::from_int(50), fp("0.5")],
        [Fixed::zero(), fp("0.6")],
        &bob(),
        0,
    );
    assert!(matches!(
        result,
        Err(SwapError::MinAmountNotReached { minimum, actual })
            if minimum == fp("0.6") && actual == fp("0.5")
    ));
}

#[test]
fn test_full_exit_leaves_locked_base() {
    let h = seeded();

    h.pool
        .swap(
            &weth(),
            &usdt(),
            Fixed::from_int(1),
            Fixed::zero(),
            None,
            &bob(),
            100,
        )
        .unwrap();

    let shares = h.pool.share_balance_of(&alice());
    let receipt = h.pool.withdraw(shares, &[], &alice()).unwrap();

    assert_eq!(receipt.shares_burned, Fixed::from_int(100));
    assert_eq!(receipt.withdrawn[0].raw(), 49_999_999_999_999_999_500);
    assert_eq!(receipt.withdrawn[1].raw(), 1_999_999_999_999_999_980);

    assert_eq!(h.pool.share_balance_of(&alice()), Fixed::zero());
    assert_eq!(h.pool.total_shares(), BASE_SUPPLY);
}

#[test]
fn test_withdraw_floor_and_waiver() {
    let h = seeded();

    let result = h
        .pool
        .withdraw(Fixed::from_int(50), &[Fixed::from_int(51)], &alice());
    assert!(matches!(result, Err(SwapError::InsufficientOutput { .. })));

    // An empty floor list waives all minimums.
    let receipt = h.pool.withdraw(Fixed::from_int(50), &[], &alice()).unwrap();
    assert_eq!(receipt.shares_burned, Fixed::from_int(50));
}

#[test]
fn test_referral_and_governance_minting() {
    let h = harness();
    h.family
        .write()
        .unwrap()
        .set_governance_wallet(&h.admin, Some(AccountId::new("dao")))
        .unwrap();

    h.pool
        .deposit(
            [Fixed::from_int(1), Fixed::from_int(5)],
            [Fixed::zero(), Fixed::zero()],
            &alice(),
            0,
        )
        .unwrap();
    h.pool
        .vote(Parameter::GovernanceShare, &alice(), fp("0.01"), 0)
        .unwrap();

    h.ledger
        .credit(&weth(), &bob(), Fixed::from_int(1_000_000_000));
    let receipt = h
        .pool
        .swap(
            &weth(),
            &usdt(),
            Fixed::from_int(1_000_000_000),
            Fixed::zero(),
            Some(&carol()),
            &bob(),
            APPLY_DELAY,
        )
        .unwrap();

    // The floored output leaves one-sided rounding growth behind; a tenth of
    // the growth goes to the referral and a hundredth to governance.
    assert_eq!(receipt.amount_out.raw(), 999_999_995_000_000_024);
    assert_eq!(receipt.referral_shares.raw(), 49_999_993);
    assert_eq!(receipt.governance_shares.raw(), 4_999_999);

    assert_eq!(h.pool.share_balance_of(&carol()).raw(), 49_999_993);
    assert_eq!(
        h.pool.share_balance_of(&AccountId::new("dao")).raw(),
        4_999_999
    );
}

#[test]
fn test_fee_collector_supersedes_referral_and_governance() {
    let h = harness();
    let treasury = AccountId::new("treasury");
    {
        let mut family = h.family.write().unwrap();
        family
            .set_governance_wallet(&h.admin, Some(AccountId::new("dao")))
            .unwrap();
        family
            .set_fee_collector(&h.admin, Some(treasury.clone()))
            .unwrap();
    }

    h.pool
        .deposit(
            [Fixed::from_int(1), Fixed::from_int(5)],
            [Fixed::zero(), Fixed::zero()],
            &alice(),
            0,
        )
        .unwrap();
    h.pool
        .vote(Parameter::GovernanceShare, &alice(), fp("0.01"), 0)
        .unwrap();

    h.ledger
        .credit(&weth(), &bob(), Fixed::from_int(1_000_000_000));
    h.pool
        .swap(
            &weth(),
            &usdt(),
            Fixed::from_int(1_000_000_000),
            Fixed::zero(),
            Some(&carol()),
            &bob(),
            APPLY_DELAY,
        )
        .unwrap();

    assert_eq!(h.pool.share_balance_of(&carol()), Fixed::zero());
    assert_eq!(
        h.pool.share_balance_of(&AccountId::new("dao")),
        Fixed::zero()
    );
    assert_eq!(h.pool.share_balance_of(&treasury).raw(), 54_999_992);
}

#[test]
fn test_shutdown_blocks_swaps_but_not_exits() {
    let h = seeded();
    h.family.write().unwrap().shutdown(&h.admin).unwrap();

    let result = h.pool.swap(
        &weth(),
        &usdt(),
        Fixed::from_int(1),
        Fixed::zero(),
        None,
        &bob(),
        100,
    );
    assert!(matches!(result, Err(SwapError::FactoryShutdown)));

    // Liquidity can still leave.
    let receipt = h.pool.withdraw(Fixed::from_int(50), &[], &alice()).unwrap();
    assert_eq!(receipt.shares_burned, Fixed::from_int(50));
}

#[test]
fn test_rescue_funds_only_for_foreign_tokens() {
    let h = seeded();

    let result = h
        .pool
        .rescue_funds(&h.admin, &usdt(), &carol(), Fixed::from_int(1));
    assert!(matches!(result, Err(SwapError::DeniedForPoolTokens)));

    let result = h.pool.rescue_funds(&h.admin, &dai(), &carol(), Fixed::zero());
    assert!(matches!(result, Err(SwapError::AmountIsZero)));

    // A credential from another family is refused.
    let (_, other_admin, _) =
        PoolFamily::new("other-family".to_string(), Box::new(SharedStakes::new()));
    let result = h
        .pool
        .rescue_funds(&other_admin, &dai(), &carol(), Fixed::from_int(7));
    assert!(matches!(result, Err(SwapError::Unauthorized)));

    h.pool
        .rescue_funds(&h.admin, &dai(), &carol(), Fixed::from_int(7))
        .unwrap();
    assert_eq!(h.ledger.balance(&dai(), &carol()), Fixed::from_int(7));
}

#[test]
fn test_failed_transfer_rolls_the_swap_back() {
    let h = seeded();

    // Carol has no WETH, so the pull leg fails after internal bookkeeping.
    let shares_before = h.pool.total_shares();
    let result = h.pool.swap(
        &weth(),
        &usdt(),
        Fixed::from_int(1),
        Fixed::zero(),
        None,
        &carol(),
        100,
    );
    assert!(matches!(result, Err(SwapError::TransferFailed)));

    assert_eq!(h.pool.total_shares(), shares_before);
    assert_eq!(
        h.pool.get_quote(&weth(), &usdt(), Fixed::from_int(1), 100),
        Fixed::from_int(50)
    );
    assert_eq!(h.ledger.balance(&usdt(), &carol()), Fixed::zero());
}
