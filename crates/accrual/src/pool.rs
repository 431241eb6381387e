//! Pool Settlement
//!
//! Advances the two accumulators of a pool up to a block timestamp, and the
//! sweeps that settle many pools at once.
//!
//! ## Reward formulas
//!
//! For `elapsed` seconds since the last settlement:
//!
//! ```text
//! EigenLayer  reward = elapsed' * rate * price * total_shares * mlrt_ratio
//!             acc   += reward / total_shares
//! Eigenpie    reward = elapsed * rate * price * staked * group_boost * global_boost
//!             acc   += reward / staked
//! ```
//!
//! where every product after the first is a floor wad multiply, `elapsed'`
//! only counts time after the EigenLayer launch and `staked` includes
//! pre-deposit shares.

use points_common::{
    add, global_boost, wad_div, wad_mul, Amount, AssetId, Pool, PointsError, PointsEvent,
    PointsResult, PoolKey, Timestamp,
};
use points_ledger::LedgerStore;

use crate::Accrual;

/// Raw emission over `elapsed` seconds at `rate` per second
fn emission(elapsed: Timestamp, rate: Amount) -> PointsResult<Amount> {
    u128::from(elapsed).checked_mul(rate).ok_or(PointsError::Overflow)
}

impl<S: LedgerStore> Accrual<'_, S> {
    /// Bring a pool's accumulators up to `now`
    ///
    /// Empty pools and timestamps at or before the last settlement only
    /// move `last_reward_timestamp` forward.
    pub fn settle(&mut self, key: PoolKey, now: Timestamp) -> PointsResult<Pool> {
        let config = self.config;
        let mut pool = self.store.load_or_create_pool(key);
        let staked = pool.total_staked()?;

        if now <= pool.last_reward_timestamp || staked == 0 {
            pool.last_reward_timestamp = pool.last_reward_timestamp.max(now);
            self.store.put_pool(pool.clone());
            return Ok(pool);
        }

        let asset = self
            .store
            .load_or_create_lp_asset(key.asset, || config.new_lp_asset(key.asset));

        let launch = config.eigen_layer_launch_timestamp;
        if now > launch && pool.total_shares > 0 {
            let since = pool.last_reward_timestamp.max(launch);
            let reward = emission(now - since, asset.eigen_layer_points_per_sec)?;
            let reward = wad_mul(reward, asset.price_to_base)?;
            let reward = wad_mul(reward, pool.total_shares)?;
            let reward = wad_mul(reward, asset.mlrt_ratio)?;
            pool.acc_eigen_layer_point_per_share = add(
                pool.acc_eigen_layer_point_per_share,
                wad_div(reward, pool.total_shares)?,
            )?;
        }

        let group = self.store.load_or_create_group(key.group);
        let global = self.store.load_or_create_global();
        let reward = emission(now - pool.last_reward_timestamp, asset.eigenpie_points_per_sec)?;
        let reward = wad_mul(reward, asset.price_to_base)?;
        let reward = wad_mul(reward, staked)?;
        let reward = wad_mul(reward, group.group_boost)?;
        let reward = wad_mul(reward, global.global_boost)?;
        pool.acc_eigenpie_point_per_share =
            add(pool.acc_eigenpie_point_per_share, wad_div(reward, staked)?)?;

        log::debug!(
            "settled pool {}/{} over {}s: acc_el={} acc_ep={}",
            key.group,
            key.asset,
            now - pool.last_reward_timestamp,
            pool.acc_eigen_layer_point_per_share,
            pool.acc_eigenpie_point_per_share
        );

        pool.last_reward_timestamp = now;
        self.store.put_pool(pool.clone());
        Ok(pool)
    }

    /// Settle every known pool of `asset`, returning how many were visited
    pub fn update_pools_for_asset(&mut self, asset: AssetId, now: Timestamp) -> PointsResult<usize> {
        let keys = self.store.pools_for_asset(&asset);
        for key in &keys {
            self.settle(*key, now)?;
        }
        Ok(keys.len())
    }

    /// Settle every known pool
    pub fn update_all_pools(&mut self, now: Timestamp) -> PointsResult<usize> {
        let keys = self.store.all_pools();
        for key in &keys {
            self.settle(*key, now)?;
        }

        let pools = u32::try_from(keys.len()).unwrap_or(u32::MAX);
        self.emit(PointsEvent::PoolsSwept { pools, timestamp: now });
        Ok(keys.len())
    }

    /// Sweep all pools when a full sweep interval has passed since the last one
    pub fn daily_update_all_pools(&mut self, now: Timestamp) -> PointsResult<bool> {
        let global = self.store.load_or_create_global();
        if now.saturating_sub(global.last_daily_update_timestamp) < self.config.daily_sweep_interval {
            return Ok(false);
        }

        let swept = self.update_all_pools(now)?;
        let mut global = self.store.load_or_create_global();
        global.last_daily_update_timestamp = now;
        self.store.put_global(global);

        log::debug!("daily sweep at {} settled {} pools", now, swept);
        Ok(true)
    }

    /// Apply the global boost scheduled for `now`
    ///
    /// On a change every pool is settled first, so time up to `now` accrues
    /// at the old multiplier.
    pub fn refresh_global_boost(&mut self, now: Timestamp) -> PointsResult<bool> {
        let scheduled = global_boost(now, &self.config.global_boost_schedule);
        let current = self.store.load_or_create_global().global_boost;
        if scheduled == current {
            return Ok(false);
        }

        self.update_all_pools(now)?;
        let mut global = self.store.load_or_create_global();
        global.global_boost = scheduled;
        self.store.put_global(global);

        log::info!("global boost {} -> {} at {}", current, scheduled, now);
        self.emit(PointsEvent::GlobalBoostChanged {
            old_boost: current,
            new_boost: scheduled,
            timestamp: now,
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use points_common::constants::precision::WAD;
    use points_common::{Address, EngineConfig, EventType, UserBalance};
    use points_ledger::MemoryLedger;

    const LAUNCH: Timestamp = 1_707_163_200;

    fn group() -> Address {
        Address([0x01; 20])
    }

    fn key() -> PoolKey {
        PoolKey::new(group(), AssetId::Token(Address([0x70; 20])))
    }

    /// Pool with `shares` claimed shares recorded directly in the ledger
    fn seed_pool(ledger: &mut MemoryLedger, shares: Amount, unclaimed: Amount, last: Timestamp) {
        let mut pool = Pool::new(key());
        pool.total_shares = shares;
        pool.total_unclaimed_shares = unclaimed;
        pool.last_reward_timestamp = last;
        ledger.put_pool(pool);
        let mut balance = UserBalance::new(key().balance_of(group()));
        balance.shares = shares;
        balance.unclaimed_shares = unclaimed;
        ledger.put_user_balance(balance);
    }

    #[test]
    fn test_empty_pool_only_moves_timestamp() {
        let config = EngineConfig::default();
        let mut ledger = MemoryLedger::new();
        let mut accrual = Accrual::new(&mut ledger, &config);

        let pool = accrual.settle(key(), 500).unwrap();
        assert_eq!(pool.last_reward_timestamp, 500);
        assert_eq!(pool.acc_eigenpie_point_per_share, 0);

        // Never moves backwards
        let pool = accrual.settle(key(), 100).unwrap();
        assert_eq!(pool.last_reward_timestamp, 500);
    }

    #[test]
    fn test_pre_launch_accrues_eigenpie_only() {
        let config = EngineConfig::default();
        let mut ledger = MemoryLedger::new();
        seed_pool(&mut ledger, 10 * WAD, 0, 0);
        let mut accrual = Accrual::new(&mut ledger, &config);

        let pool = accrual.settle(key(), 3_600).unwrap();
        assert_eq!(pool.acc_eigen_layer_point_per_share, 0);
        // 3600 * (1e18 / 3600) per unit at unity price and boosts
        assert_eq!(pool.acc_eigenpie_point_per_share, 3_600 * (WAD / 3_600));
    }

    #[test]
    fn test_eigen_layer_counts_only_post_launch_time() {
        let config = EngineConfig::default();
        let mut ledger = MemoryLedger::new();
        seed_pool(&mut ledger, 10 * WAD, 0, LAUNCH - 1_000);
        let mut accrual = Accrual::new(&mut ledger, &config);

        let pool = accrual.settle(key(), LAUNCH + 100).unwrap();
        assert_eq!(pool.acc_eigen_layer_point_per_share, 100 * (WAD / 3_600));
        assert_eq!(pool.acc_eigenpie_point_per_share, 1_100 * (WAD / 3_600));
    }

    #[test]
    fn test_unclaimed_shares_skip_eigen_layer() {
        let config = EngineConfig::default();
        let mut ledger = MemoryLedger::new();
        seed_pool(&mut ledger, 0, 10 * WAD, LAUNCH);
        let mut accrual = Accrual::new(&mut ledger, &config);

        let pool = accrual.settle(key(), LAUNCH + 3_600).unwrap();
        assert_eq!(pool.acc_eigen_layer_point_per_share, 0);
        assert!(pool.acc_eigenpie_point_per_share > 0);
    }

    #[test]
    fn test_boosts_scale_eigenpie() {
        let config = EngineConfig::default();
        let mut ledger = MemoryLedger::new();
        seed_pool(&mut ledger, 10 * WAD, 0, 0);
        let mut g = ledger.load_or_create_group(group());
        g.group_boost = WAD * 12 / 10;
        ledger.put_group(g);
        let mut global = ledger.load_or_create_global();
        global.global_boost = 2 * WAD;
        ledger.put_global(global);

        let mut accrual = Accrual::new(&mut ledger, &config);
        let pool = accrual.settle(key(), 3_600).unwrap();

        let raw = 3_600 * (WAD / 3_600);
        let expected = wad_mul(wad_mul(raw * 10, WAD * 12 / 10).unwrap(), 2 * WAD).unwrap();
        assert_eq!(pool.acc_eigenpie_point_per_share, wad_div(expected, 10 * WAD).unwrap());
    }

    #[test]
    fn test_daily_sweep_interval() {
        let config = EngineConfig::default();
        let mut ledger = MemoryLedger::new();
        seed_pool(&mut ledger, WAD, 0, 0);
        let mut accrual = Accrual::new(&mut ledger, &config);

        assert!(!accrual.daily_update_all_pools(86_399).unwrap());
        assert!(accrual.daily_update_all_pools(86_400).unwrap());
        assert_eq!(accrual.store().global().unwrap().last_daily_update_timestamp, 86_400);
        assert_eq!(accrual.store().pool(&key()).unwrap().last_reward_timestamp, 86_400);
        assert!(!accrual.daily_update_all_pools(86_400 + 86_399).unwrap());
        assert_eq!(accrual.events().filter_by_type(EventType::PoolsSwept).len(), 1);
    }

    #[test]
    fn test_global_boost_change_sweeps_at_old_rate() {
        let config = EngineConfig::default();
        let mut ledger = MemoryLedger::new();
        seed_pool(&mut ledger, WAD, 0, 1_707_782_400 - 100);
        let mut global = ledger.load_or_create_global();
        global.global_boost = 2 * WAD;
        ledger.put_global(global);

        let mut accrual = Accrual::new(&mut ledger, &config);
        assert!(!accrual.refresh_global_boost(1_707_782_400).unwrap());

        let acc_before = accrual.store().pool(&key()).unwrap().acc_eigenpie_point_per_share;
        assert!(accrual.refresh_global_boost(1_707_782_400 + 50).unwrap());

        let pool = accrual.store().pool(&key()).unwrap();
        // 150 seconds settled at 2x before the switch to 1x
        let gained = pool.acc_eigenpie_point_per_share - acc_before;
        assert_eq!(gained, 2 * 150 * (WAD / 3_600));
        assert_eq!(accrual.store().global().unwrap().global_boost, WAD);

        let events = accrual.take_events();
        assert_eq!(events.filter_by_type(EventType::GlobalBoostChanged).len(), 1);
        assert!(accrual.events().is_empty());
    }

    #[test]
    fn test_update_pools_for_asset_skips_other_assets() {
        let config = EngineConfig::default();
        let mut ledger = MemoryLedger::new();
        seed_pool(&mut ledger, WAD, 0, 0);
        let other = PoolKey::new(group(), AssetId::Token(Address([0x71; 20])));
        ledger.load_or_create_pool(other);

        let mut accrual = Accrual::new(&mut ledger, &config);
        assert_eq!(accrual.update_pools_for_asset(key().asset, 10).unwrap(), 1);
        assert_eq!(accrual.store().pool(&other).unwrap().last_reward_timestamp, 0);
        assert_eq!(accrual.store().pool(&key()).unwrap().last_reward_timestamp, 10);
    }
}
