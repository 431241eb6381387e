//! Positions
//!
//! Deposits, withdrawals and harvests on one user's balance row. Every
//! operation settles the pool first, so the accumulators a harvest reads are
//! current, and leaves both point debts equal to the balance times the
//! matching accumulator.

use sha2::{Digest, Sha256};

use points_common::{
    add, bps_of, sub_checked, tier_boost, wad_mul, Address, Amount, AssetId, BalanceKey,
    InvariantKind, PointsError, PointsEvent, PointsResult, Pool, PoolKey, ReferralLogEntry,
    Timestamp, UserBalance,
};
use points_ledger::LedgerStore;

use crate::Accrual;

/// Points credited by one harvest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestResult {
    pub eigen_layer_points: Amount,
    pub eigenpie_points: Amount,
    /// Credited to `referrer`, on top of `eigenpie_points`
    pub referral_skim: Amount,
    pub referrer: Option<Address>,
}

impl HarvestResult {
    pub fn is_empty(&self) -> bool {
        self.eigen_layer_points == 0 && self.eigenpie_points == 0
    }
}

enum TvlChange {
    Add(Amount),
    Remove(Amount),
}

impl TvlChange {
    fn between(before: Amount, after: Amount) -> Self {
        if after >= before {
            Self::Add(after - before)
        } else {
            Self::Remove(before - after)
        }
    }
}

/// Debts matching the balance at the pool's current accumulators
fn reset_debts(balance: &mut UserBalance, pool: &Pool) -> PointsResult<()> {
    balance.eigen_layer_points_debt = wad_mul(balance.shares, pool.acc_eigen_layer_point_per_share)?;
    balance.eigenpie_points_debt = wad_mul(balance.total_staked()?, pool.acc_eigenpie_point_per_share)?;
    Ok(())
}

/// Audit log id: sha256(referrer || referee || timestamp || sequence), big-endian integers
pub fn referral_log_id(referrer: &Address, referee: &Address, timestamp: Timestamp, sequence: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(referrer.as_bytes());
    hasher.update(referee.as_bytes());
    hasher.update(timestamp.to_be_bytes());
    hasher.update(sequence.to_be_bytes());
    hasher.finalize().into()
}

impl<S: LedgerStore> Accrual<'_, S> {
    /// Credit `shares` to a balance
    ///
    /// Pre-deposit shares go to the unclaimed side. Returns whatever the
    /// balance had pending before the change.
    pub fn deposit(
        &mut self,
        key: BalanceKey,
        shares: Amount,
        now: Timestamp,
        is_pre_deposit: bool,
    ) -> PointsResult<HarvestResult> {
        let mut pool = self.settle(key.pool_key(), now)?;
        // Group membership scans only see users with a row
        self.store.load_or_create_user(key.user);

        let existing = self.store.load_or_create_user_balance(key);
        let harvested = if existing.total_staked()? > 0 {
            self.credit_pending(key, now)?
        } else {
            HarvestResult::default()
        };

        let staked_before = pool.total_staked()?;
        let mut balance = self.store.load_or_create_user_balance(key);
        if is_pre_deposit {
            balance.unclaimed_shares = add(balance.unclaimed_shares, shares)?;
            pool.total_unclaimed_shares = add(pool.total_unclaimed_shares, shares)?;
        } else {
            balance.shares = add(balance.shares, shares)?;
            pool.total_shares = add(pool.total_shares, shares)?;
        }
        reset_debts(&mut balance, &pool)?;
        let staked_after = pool.total_staked()?;
        self.store.put_user_balance(balance);
        self.store.put_pool(pool);

        let group_tvl = self.revalue_pool(key.pool_key(), staked_before, staked_after)?;

        log::debug!("deposit {} of {} by {} into group {}", shares, key.asset, key.user, key.group);
        self.emit(PointsEvent::Deposited {
            group: key.group,
            asset: key.asset,
            user: key.user,
            shares,
            is_pre_deposit,
            group_tvl,
            timestamp: now,
        });
        Ok(harvested)
    }

    /// Remove `shares` from a balance
    ///
    /// # Errors
    /// `InvariantViolation` if the balance, the pool total, or either TVL
    /// would go negative.
    pub fn withdraw(
        &mut self,
        key: BalanceKey,
        shares: Amount,
        now: Timestamp,
        is_pre_deposit: bool,
    ) -> PointsResult<HarvestResult> {
        let mut pool = self.settle(key.pool_key(), now)?;
        let harvested = self.credit_pending(key, now)?;

        let staked_before = pool.total_staked()?;
        let mut balance = self.store.load_or_create_user_balance(key);
        if is_pre_deposit {
            balance.unclaimed_shares =
                sub_checked(balance.unclaimed_shares, shares, InvariantKind::UserUnclaimedShares)?;
            pool.total_unclaimed_shares =
                sub_checked(pool.total_unclaimed_shares, shares, InvariantKind::PoolUnclaimedShares)?;
        } else {
            balance.shares = sub_checked(balance.shares, shares, InvariantKind::UserShares)?;
            pool.total_shares = sub_checked(pool.total_shares, shares, InvariantKind::PoolShares)?;
        }
        reset_debts(&mut balance, &pool)?;
        let staked_after = pool.total_staked()?;
        self.store.put_user_balance(balance);
        self.store.put_pool(pool);

        let group_tvl = self.revalue_pool(key.pool_key(), staked_before, staked_after)?;

        log::debug!("withdraw {} of {} by {} from group {}", shares, key.asset, key.user, key.group);
        self.emit(PointsEvent::Withdrawn {
            group: key.group,
            asset: key.asset,
            user: key.user,
            shares,
            is_pre_deposit,
            group_tvl,
            timestamp: now,
        });
        Ok(harvested)
    }

    /// Points accrued to a balance since its debts were last reset
    ///
    /// Reads the pool as stored; call [`Accrual::settle`] first for a
    /// figure current to a timestamp.
    pub fn pending_points(&self, key: &BalanceKey) -> PointsResult<(Amount, Amount)> {
        let pool = self.store.pool(&key.pool_key()).unwrap_or_else(|| Pool::new(key.pool_key()));
        let balance = self.store.user_balance(key).unwrap_or_else(|| UserBalance::new(*key));

        let eigen_layer = sub_checked(
            wad_mul(balance.shares, pool.acc_eigen_layer_point_per_share)?,
            balance.eigen_layer_points_debt,
            InvariantKind::PointsDebt,
        )?;
        let eigenpie = sub_checked(
            wad_mul(balance.total_staked()?, pool.acc_eigenpie_point_per_share)?,
            balance.eigenpie_points_debt,
            InvariantKind::PointsDebt,
        )?;
        Ok((eigen_layer, eigenpie))
    }

    /// Claim a balance's pending points without changing it
    ///
    /// Reads the pool as stored, like [`Accrual::pending_points`]. Debts are
    /// reset afterwards, so a second harvest with no settlement in between
    /// credits nothing.
    pub fn harvest(&mut self, key: BalanceKey, now: Timestamp) -> PointsResult<HarvestResult> {
        let harvested = self.credit_pending(key, now)?;
        if let Some(mut balance) = self.store.user_balance(&key) {
            let pool = self.store.load_or_create_pool(key.pool_key());
            reset_debts(&mut balance, &pool)?;
            self.store.put_user_balance(balance);
        }
        Ok(harvested)
    }

    /// Credit pending points to the balance owner and their referrer
    ///
    /// Debts are left as they are; the caller resets them after changing
    /// the balance.
    fn credit_pending(&mut self, key: BalanceKey, now: Timestamp) -> PointsResult<HarvestResult> {
        let (eigen_layer, eigenpie) = self.pending_points(&key)?;

        let mut user = self.store.load_or_create_user(key.user);
        user.eigen_layer_points = add(user.eigen_layer_points, eigen_layer)?;
        user.eigenpie_points = add(user.eigenpie_points, eigenpie)?;
        let referrer = user.referrer;
        self.store.put_user(user);

        let mut referral_skim = 0;
        if let Some(referrer) = referrer {
            referral_skim = bps_of(eigenpie, self.config.referral_skim_bps)?;
            if referral_skim > 0 {
                let mut referrer_user = self.store.load_or_create_user(referrer);
                referrer_user.eigenpie_referral_points =
                    add(referrer_user.eigenpie_referral_points, referral_skim)?;
                let accumulated = referrer_user.eigenpie_referral_points;
                self.store.put_user(referrer_user);
                self.log_referral(referrer, key.user, referral_skim, accumulated, now)?;
            }
        }

        let mut global = self.store.load_or_create_global();
        global.total_eigen_layer_points = add(global.total_eigen_layer_points, eigen_layer)?;
        global.total_eigenpie_points = add(global.total_eigenpie_points, eigenpie)?;
        global.total_eigenpie_referral_points =
            add(global.total_eigenpie_referral_points, referral_skim)?;
        self.store.put_global(global);

        let result = HarvestResult {
            eigen_layer_points: eigen_layer,
            eigenpie_points: eigenpie,
            referral_skim,
            referrer,
        };
        if !result.is_empty() {
            self.emit(PointsEvent::PointsHarvested {
                user: key.user,
                asset: key.asset,
                eigen_layer_points: eigen_layer,
                eigenpie_points: eigenpie,
                referral_skim,
                timestamp: now,
            });
        }
        Ok(result)
    }

    fn log_referral(
        &mut self,
        referrer: Address,
        referee: Address,
        points_earned: Amount,
        points_accumulated: Amount,
        now: Timestamp,
    ) -> PointsResult<()> {
        let mut global = self.store.load_or_create_global();
        let sequence = global.referral_log_count;
        global.referral_log_count = sequence.checked_add(1).ok_or(PointsError::Overflow)?;
        self.store.put_global(global);

        self.store.append_referral_log(ReferralLogEntry {
            id: referral_log_id(&referrer, &referee, now, sequence),
            referrer,
            referee,
            points_earned,
            points_accumulated,
            timestamp: now,
        });
        Ok(())
    }

    /// Re-value a pool whose staked total moved, at its asset's current price
    ///
    /// Group TVL is the sum of its pools, each valued as a whole. Returns
    /// the group TVL.
    fn revalue_pool(
        &mut self,
        key: PoolKey,
        staked_before: Amount,
        staked_after: Amount,
    ) -> PointsResult<Amount> {
        let config = self.config;
        let price = self
            .store
            .load_or_create_lp_asset(key.asset, || config.new_lp_asset(key.asset))
            .price_to_base;
        let change = TvlChange::between(wad_mul(staked_before, price)?, wad_mul(staked_after, price)?);
        self.change_tvl(key.group, change)
    }

    /// Carry a price change of `asset` into every holding group's TVL
    ///
    /// Each pool's staked total is re-valued from `old_price` to
    /// `new_price` and the group re-tiered. Must follow every change of the
    /// stored price.
    pub fn revalue_asset(
        &mut self,
        asset: AssetId,
        old_price: Amount,
        new_price: Amount,
    ) -> PointsResult<()> {
        if old_price == new_price {
            return Ok(());
        }
        for key in self.store.pools_for_asset(&asset) {
            let staked = match self.store.pool(&key) {
                Some(pool) => pool.total_staked()?,
                None => continue,
            };
            if staked == 0 {
                continue;
            }
            let change = TvlChange::between(wad_mul(staked, old_price)?, wad_mul(staked, new_price)?);
            let group_tvl = self.change_tvl(key.group, change)?;
            log::debug!("group {} revalued to {} after {} repriced", key.group, group_tvl, asset);
        }
        Ok(())
    }

    /// Move group and global TVL, then re-tier the group. Returns the group TVL.
    fn change_tvl(&mut self, group_address: Address, change: TvlChange) -> PointsResult<Amount> {
        let mut group = self.store.load_or_create_group(group_address);
        let mut global = self.store.load_or_create_global();

        match change {
            TvlChange::Add(value) => {
                group.total_tvl = add(group.total_tvl, value)?;
                global.total_tvl = add(global.total_tvl, value)?;
            }
            TvlChange::Remove(value) => {
                group.total_tvl = sub_checked(group.total_tvl, value, InvariantKind::GroupTvl)?;
                global.total_tvl = sub_checked(global.total_tvl, value, InvariantKind::GlobalTvl)?;
            }
        }
        group.group_boost = tier_boost(group.total_tvl, &self.config.group_boost_tiers);

        let total_tvl = group.total_tvl;
        self.store.put_group(group);
        self.store.put_global(global);
        Ok(total_tvl)
    }
}
