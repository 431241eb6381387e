//! Integration Tests
//!
//! Event streams through the full engine: staged commits, asset resolution,
//! transfer filters, referral merges and restarts from a snapshot.

#[cfg(test)]
mod tests {
    use crate::*;
    use points_common::constants::addresses::{
        MSTETH, MSTETH_WSTETH_CURVE_LP, PRE_DEPOSIT_HELPER, STETH, ZIRCUIT_STAKING,
    };
    use points_common::constants::precision::WAD;
    use points_common::constants::timing::EIGEN_LAYER_LAUNCH_TIME;
    use points_common::{
        bps_of, Address, Amount, AssetId, EventType, InvariantKind, PoolKey, Timestamp,
    };
    use points_ledger::MemoryLedger;

    const LAUNCH: Timestamp = EIGEN_LAYER_LAUNCH_TIME;

    fn alice() -> Address {
        Address([0xa1; 20])
    }

    fn bob() -> Address {
        Address([0xb0; 20])
    }

    fn carol() -> Address {
        Address([0xc0; 20])
    }

    fn engine() -> PointsEngine<MemoryLedger, StaticPriceTable> {
        let config = EngineConfig::default();
        let oracle = StaticPriceTable::from_config(&config);
        PointsEngine::new(MemoryLedger::new(), config, oracle).unwrap()
    }

    fn staking_deposit(
        depositor: Address,
        referral: Address,
        asset: Address,
        shares: Amount,
        is_pre_deposit: bool,
        timestamp: Timestamp,
    ) -> ChainEvent {
        ChainEvent::AssetDeposited {
            depositor,
            referral,
            asset,
            amount: shares,
            minted_shares: shares,
            is_pre_deposit,
            timestamp,
        }
    }

    fn mlrt_transfer(from: Address, to: Address, amount: Amount, timestamp: Timestamp) -> ChainEvent {
        ChainEvent::MlrtTransferred { token: MSTETH, from, to, amount, timestamp }
    }

    fn rate_update(new_rate: Amount, timestamp: Timestamp) -> ChainEvent {
        ChainEvent::ExchangeRateUpdated { receipt: MSTETH, underlying: STETH, new_rate, timestamp }
    }

    fn shares_of(engine: &PointsEngine<MemoryLedger, StaticPriceTable>, group: Address, asset: AssetId, user: Address) -> Amount {
        engine
            .store()
            .user_balance(&PoolKey::new(group, asset).balance_of(user))
            .map(|b| b.shares)
            .unwrap_or(0)
    }

    // ============================================================================
    // Staking Deposits
    // ============================================================================

    #[test]
    fn test_deposit_resolves_configured_receipt() {
        let mut engine = engine();
        let outcome = engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, 10 * WAD, false, LAUNCH))
            .unwrap();

        assert!(outcome.notices.is_empty());
        assert_eq!(outcome.events.filter_by_type(EventType::Deposited).len(), 1);
        assert_eq!(shares_of(&engine, alice(), AssetId::Token(MSTETH), alice()), 10 * WAD);
        assert_eq!(engine.store().group(&alice()).unwrap().total_tvl, 10 * WAD);
    }

    #[test]
    fn test_pre_deposit_lands_on_unclaimed_side() {
        let mut engine = engine();
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, 3 * WAD, true, LAUNCH))
            .unwrap();

        let key = PoolKey::new(alice(), AssetId::Token(MSTETH));
        let balance = engine.store().user_balance(&key.balance_of(alice())).unwrap();
        assert_eq!((balance.shares, balance.unclaimed_shares), (0, 3 * WAD));
        let pool = engine.store().pool(&key).unwrap();
        assert_eq!((pool.total_shares, pool.total_unclaimed_shares), (0, 3 * WAD));
    }

    #[test]
    fn test_unknown_underlying_becomes_its_own_asset() {
        let mut engine = engine();
        let unknown = Address([0x99; 20]);
        let outcome = engine
            .handle(&staking_deposit(alice(), Address::ZERO, unknown, WAD, false, LAUNCH))
            .unwrap();

        assert_eq!(
            outcome.notices,
            vec![PointsError::UnknownAsset { asset: AssetId::Token(unknown) }]
        );
        assert_eq!(shares_of(&engine, alice(), AssetId::Token(unknown), alice()), WAD);
        assert!(!engine.store().lp_asset(&AssetId::Token(unknown)).unwrap().registered);
    }

    #[test]
    fn test_registered_receipt_resolves_deposits() {
        let mut engine = engine();
        let underlying = Address([0x50; 20]);
        let receipt = Address([0x51; 20]);

        let outcome = engine
            .handle(&ChainEvent::AssetRegistered { receipt, underlying, timestamp: LAUNCH })
            .unwrap();
        assert_eq!(outcome.events.filter_by_type(EventType::AssetRegistered).len(), 1);

        let outcome = engine
            .handle(&staking_deposit(alice(), Address::ZERO, underlying, 2 * WAD, false, LAUNCH + 1))
            .unwrap();
        assert!(outcome.notices.is_empty());
        assert_eq!(shares_of(&engine, alice(), AssetId::Token(receipt), alice()), 2 * WAD);
    }

    #[test]
    fn test_latest_registration_wins() {
        let mut engine = engine();
        let underlying = Address([0x50; 20]);
        let first = Address([0x90; 20]);
        let second = Address([0x10; 20]);

        for (receipt, timestamp) in [(first, LAUNCH), (second, LAUNCH + 1), (first, LAUNCH + 2)] {
            engine
                .handle(&ChainEvent::AssetRegistered { receipt, underlying, timestamp })
                .unwrap();
        }
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, underlying, WAD, false, LAUNCH + 3))
            .unwrap();

        assert_eq!(shares_of(&engine, alice(), AssetId::Token(first), alice()), WAD);
        assert_eq!(shares_of(&engine, alice(), AssetId::Token(second), alice()), 0);
        let superseded = engine.store().lp_asset(&AssetId::Token(second)).unwrap();
        assert_eq!(superseded.underlying, None);
        assert!(!superseded.registered);
    }

    #[test]
    fn test_zero_minted_shares_still_links_referral() {
        let mut engine = engine();
        engine
            .handle(&staking_deposit(bob(), alice(), STETH, 0, false, LAUNCH))
            .unwrap();

        assert_eq!(engine.store().user(&bob()).unwrap().referrer, Some(alice()));
        assert!(engine.store().user_balances_of(&alice(), &bob()).is_empty());
    }

    // ============================================================================
    // Referrals
    // ============================================================================

    #[test]
    fn test_referral_merges_groups_then_skims() {
        let mut engine = engine();
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, 10 * WAD, false, LAUNCH))
            .unwrap();

        let outcome = engine
            .handle(&staking_deposit(bob(), alice(), STETH, 5 * WAD, false, LAUNCH + 100))
            .unwrap();
        assert_eq!(outcome.events.filter_by_type(EventType::ReferralLinked).len(), 1);
        assert_eq!(outcome.events.filter_by_type(EventType::GroupsMerged).len(), 1);

        let store = engine.store();
        let bob_user = store.user(&bob()).unwrap();
        assert_eq!(bob_user.group, alice());
        assert_eq!(bob_user.referrer, Some(alice()));
        assert_eq!(store.user(&alice()).unwrap().referral_count, 1);
        assert!(store.group(&bob()).is_none());
        assert_eq!(store.group(&alice()).unwrap().total_tvl, 15 * WAD);
        assert_eq!(shares_of(&engine, alice(), AssetId::Token(MSTETH), bob()), 5 * WAD);

        // Bob's harvest on transfer pays alice a tenth, rounded down
        engine.handle(&mlrt_transfer(bob(), carol(), WAD, LAUNCH + 7_200)).unwrap();

        let store = engine.store();
        let bob_points = store.user(&bob()).unwrap().eigenpie_points;
        let alice_referral = store.user(&alice()).unwrap().eigenpie_referral_points;
        assert!(bob_points > 0);
        assert_eq!(alice_referral, bps_of(bob_points, 1_000).unwrap());
        assert_eq!(store.referral_log().len(), 1);
        assert_eq!(store.global().unwrap().total_eigenpie_referral_points, alice_referral);

        // Carol keeps her own group
        assert_eq!(shares_of(&engine, carol(), AssetId::Token(MSTETH), carol()), WAD);
    }

    #[test]
    fn test_failed_merge_rolls_back_whole_deposit() {
        let mut engine = engine();
        let lp = AssetId::Token(MSTETH_WSTETH_CURVE_LP);
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, 10 * WAD, false, LAUNCH))
            .unwrap();
        engine
            .handle(&ChainEvent::LiquidityPoolTransferred {
                pool: MSTETH_WSTETH_CURVE_LP,
                sender: Address::ZERO,
                receiver: alice(),
                amount: 5 * WAD,
                timestamp: LAUNCH + 1,
            })
            .unwrap();

        // Pool total no longer covers alice's LP row, so moving it fails
        let mut store = engine.into_store();
        let mut pool = store.pool(&PoolKey::new(alice(), lp)).unwrap();
        pool.total_shares = 0;
        store.put_pool(pool);
        let config = EngineConfig::default();
        let oracle = StaticPriceTable::from_config(&config);
        let mut engine = PointsEngine::new(store, config, oracle).unwrap();
        let before = engine.store().clone();

        let result = engine.handle(&staking_deposit(alice(), bob(), STETH, 2 * WAD, false, LAUNCH + 60));
        assert!(matches!(
            result,
            Err(PointsError::InvariantViolation { what: InvariantKind::PoolShares, .. })
        ));
        assert_eq!(engine.store(), &before);
        assert_eq!(shares_of(&engine, alice(), AssetId::Token(MSTETH), alice()), 10 * WAD);
        assert!(engine.store().user(&bob()).is_none());
    }

    #[test]
    fn test_referral_merge_after_price_rise() {
        let mut engine = engine();
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, 100 * WAD, false, LAUNCH))
            .unwrap();
        engine.handle(&rate_update(WAD * 105 / 100, LAUNCH + 3_600)).unwrap();

        engine
            .handle(&staking_deposit(alice(), bob(), STETH, WAD, false, LAUNCH + 7_200))
            .unwrap();

        let store = engine.store();
        assert_eq!(store.user(&alice()).unwrap().group, bob());
        assert!(store.group(&alice()).is_none());
        assert_eq!(shares_of(&engine, bob(), AssetId::Token(MSTETH), alice()), 101 * WAD);
        assert_eq!(store.group(&bob()).unwrap().total_tvl, 10_605 * WAD / 100);
        assert_eq!(store.global().unwrap().total_tvl, 10_605 * WAD / 100);
    }

    // ============================================================================
    // Transfers
    // ============================================================================

    #[test]
    fn test_mlrt_transfer_skips_helper_and_integrations() {
        let mut engine = engine();
        let asset = AssetId::Token(MSTETH);
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, 10 * WAD, false, LAUNCH))
            .unwrap();

        engine.handle(&mlrt_transfer(alice(), PRE_DEPOSIT_HELPER, 4 * WAD, LAUNCH + 1)).unwrap();
        engine.handle(&mlrt_transfer(alice(), MSTETH_WSTETH_CURVE_LP, WAD, LAUNCH + 2)).unwrap();
        engine.handle(&mlrt_transfer(ZIRCUIT_STAKING, alice(), 2 * WAD, LAUNCH + 3)).unwrap();

        assert_eq!(shares_of(&engine, alice(), asset, alice()), 7 * WAD);
        for holder in [PRE_DEPOSIT_HELPER, MSTETH_WSTETH_CURVE_LP, ZIRCUIT_STAKING] {
            assert!(engine.store().user(&holder).is_none());
        }
    }

    #[test]
    fn test_lp_transfer_filters_only_zero() {
        let mut engine = engine();
        let lp = AssetId::Token(MSTETH_WSTETH_CURVE_LP);
        let transfer = |sender, receiver, amount, timestamp| ChainEvent::LiquidityPoolTransferred {
            pool: MSTETH_WSTETH_CURVE_LP,
            sender,
            receiver,
            amount,
            timestamp,
        };

        engine.handle(&transfer(Address::ZERO, alice(), 5 * WAD, LAUNCH)).unwrap();
        engine.handle(&transfer(alice(), PRE_DEPOSIT_HELPER, 2 * WAD, LAUNCH + 1)).unwrap();

        assert_eq!(shares_of(&engine, alice(), lp, alice()), 3 * WAD);
        assert_eq!(shares_of(&engine, PRE_DEPOSIT_HELPER, lp, PRE_DEPOSIT_HELPER), 2 * WAD);
    }

    #[test]
    fn test_overdrawn_transfer_rolls_back_whole_event() {
        let mut engine = engine();
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, WAD, false, LAUNCH))
            .unwrap();
        let before = engine.store().clone();

        let result = engine.handle(&mlrt_transfer(alice(), bob(), 2 * WAD, LAUNCH + 3_600));
        assert!(matches!(result, Err(PointsError::InvariantViolation { .. })));
        assert_eq!(engine.store(), &before);
    }

    // ============================================================================
    // Prices
    // ============================================================================

    #[test]
    fn test_exchange_rate_settles_before_repricing() {
        let mut engine = engine();
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, 10 * WAD, false, LAUNCH))
            .unwrap();

        let outcome = engine.handle(&rate_update(2 * WAD, LAUNCH + 3_600)).unwrap();
        assert!(outcome.notices.is_empty());

        let store = engine.store();
        let pool = store.pool(&PoolKey::new(alice(), AssetId::Token(MSTETH))).unwrap();
        assert_eq!(pool.last_reward_timestamp, LAUNCH + 3_600);
        assert!(pool.acc_eigenpie_point_per_share > 0);
        assert_eq!(store.lp_asset(&AssetId::Token(MSTETH)).unwrap().price_to_base, 2 * WAD);
        let staked = AssetId::Staked { venue: ZIRCUIT_STAKING, token: MSTETH };
        assert_eq!(store.lp_asset(&staked).unwrap().price_to_base, 2 * WAD);
        // Held shares are re-valued at the new rate
        assert_eq!(store.group(&alice()).unwrap().total_tvl, 20 * WAD);
        assert_eq!(store.global().unwrap().total_tvl, 20 * WAD);
    }

    #[test]
    fn test_full_exit_after_rate_rise() {
        let mut engine = engine();
        let asset = AssetId::Token(MSTETH);
        engine
            .handle(&staking_deposit(alice(), Address::ZERO, STETH, 100 * WAD, false, LAUNCH))
            .unwrap();
        engine.handle(&rate_update(WAD * 105 / 100, LAUNCH + 3_600)).unwrap();
        assert_eq!(engine.store().group(&alice()).unwrap().total_tvl, 105 * WAD);

        engine.handle(&mlrt_transfer(alice(), bob(), 100 * WAD, LAUNCH + 7_200)).unwrap();

        let store = engine.store();
        assert_eq!(shares_of(&engine, alice(), asset, alice()), 0);
        assert_eq!(shares_of(&engine, bob(), asset, bob()), 100 * WAD);
        assert_eq!(store.group(&alice()).unwrap().total_tvl, 0);
        assert_eq!(store.group(&bob()).unwrap().total_tvl, 105 * WAD);
        assert_eq!(store.global().unwrap().total_tvl, 105 * WAD);
        assert!(store.user(&alice()).unwrap().eigenpie_points > 0);
    }

    #[test]
    fn test_missing_underlying_price_uses_default() {
        let mut engine = engine();
        let unpriced = Address([0x98; 20]);
        let update = ChainEvent::ExchangeRateUpdated {
            receipt: Address([0x97; 20]),
            underlying: unpriced,
            new_rate: 3 * WAD,
            timestamp: LAUNCH,
        };
        let outcome = engine.handle(&update).unwrap();

        assert_eq!(outcome.notices, vec![PointsError::MissingPriceData { token: unpriced }]);
        let asset = engine.store().lp_asset(&AssetId::Token(Address([0x97; 20]))).unwrap();
        assert_eq!(asset.price_to_base, 3 * WAD);
    }

    #[test]
    fn test_rebalance_uses_pushed_reserves() {
        let mut engine = engine();
        engine
            .handle(&ChainEvent::LiquidityPoolTransferred {
                pool: MSTETH_WSTETH_CURVE_LP,
                sender: Address::ZERO,
                receiver: alice(),
                amount: 3 * WAD,
                timestamp: LAUNCH,
            })
            .unwrap();
        engine.oracle_mut().set_pool(
            MSTETH_WSTETH_CURVE_LP,
            LiquidityPoolState {
                mlrt: MSTETH,
                lst: STETH,
                mlrt_balance: 50 * WAD,
                lst_balance: 50 * WAD,
                total_supply: 50 * WAD,
            },
        );

        let event = ChainEvent::LiquidityPoolRebalanced { pool: MSTETH_WSTETH_CURVE_LP, timestamp: LAUNCH + 60 };
        let outcome = engine.handle(&event).unwrap();
        assert!(outcome.notices.is_empty());

        let lp = engine.store().lp_asset(&AssetId::Token(MSTETH_WSTETH_CURVE_LP)).unwrap();
        assert_eq!(lp.price_to_base, 2 * WAD);
        assert_eq!(lp.mlrt_ratio, WAD / 2);
        assert_eq!(engine.store().group(&alice()).unwrap().total_tvl, 6 * WAD);
    }

    // ============================================================================
    // Sweeps and Restarts
    // ============================================================================

    #[test]
    fn test_daily_sweep_boundary() {
        let mut engine = engine();
        let register = |timestamp| ChainEvent::AssetRegistered {
            receipt: Address([0x51; 20]),
            underlying: Address([0x50; 20]),
            timestamp,
        };
        let sweeps = |outcome: &DispatchOutcome| outcome.events.filter_by_type(EventType::PoolsSwept).len();

        // First event: daily sweep plus the sweep for entering the 2x window
        assert_eq!(sweeps(&engine.handle(&register(LAUNCH)).unwrap()), 2);
        assert_eq!(sweeps(&engine.handle(&register(LAUNCH + 86_399)).unwrap()), 0);
        assert_eq!(sweeps(&engine.handle(&register(LAUNCH + 86_400)).unwrap()), 1);
        assert_eq!(
            engine.store().global().unwrap().last_daily_update_timestamp,
            LAUNCH + 86_400
        );
    }

    #[test]
    fn test_restart_from_snapshot_continues_identically() {
        let events = [
            staking_deposit(alice(), Address::ZERO, STETH, 10 * WAD, false, LAUNCH),
            staking_deposit(bob(), alice(), STETH, 4 * WAD, true, LAUNCH + 60),
            mlrt_transfer(alice(), carol(), 3 * WAD, LAUNCH + 3_600),
            staking_deposit(carol(), bob(), STETH, WAD, false, LAUNCH + 90_000),
        ];

        let mut continuous = engine();
        for event in &events {
            continuous.handle(event).unwrap();
        }

        let mut first_half = engine();
        for event in &events[..2] {
            first_half.handle(event).unwrap();
        }
        let bytes = first_half.into_store().snapshot().unwrap();
        let config = EngineConfig::default();
        let oracle = StaticPriceTable::from_config(&config);
        let mut resumed = PointsEngine::new(MemoryLedger::restore(&bytes).unwrap(), config, oracle).unwrap();
        for event in &events[2..] {
            resumed.handle(event).unwrap();
        }

        assert_eq!(resumed.store(), continuous.store());
    }
}
