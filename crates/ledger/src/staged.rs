//! Staged ledger overlay
//!
//! Buffers every write made while one input event is processed. Reads see
//! the buffered writes first (read-your-writes), scans merge buffered rows
//! with the base. [`StagedLedger::commit`] applies the buffer to the base;
//! dropping the overlay without committing leaves the base untouched.

use std::collections::{BTreeMap, BTreeSet};

use points_common::{
    Address, AssetId, BalanceKey, GlobalState, Group, LpAsset, Pool, PoolKey, ReferralLogEntry,
    User, UserBalance,
};

use crate::LedgerStore;

/// Write-buffering view over a base store
///
/// `None` in a map marks a staged deletion.
pub struct StagedLedger<'a, S: LedgerStore> {
    base: &'a mut S,
    users: BTreeMap<Address, User>,
    groups: BTreeMap<Address, Option<Group>>,
    lp_assets: BTreeMap<AssetId, LpAsset>,
    pools: BTreeMap<PoolKey, Option<Pool>>,
    balances: BTreeMap<BalanceKey, Option<UserBalance>>,
    global: Option<GlobalState>,
    referral_log: Vec<ReferralLogEntry>,
}

impl<'a, S: LedgerStore> StagedLedger<'a, S> {
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            users: BTreeMap::new(),
            groups: BTreeMap::new(),
            lp_assets: BTreeMap::new(),
            pools: BTreeMap::new(),
            balances: BTreeMap::new(),
            global: None,
            referral_log: Vec::new(),
        }
    }

    /// Number of staged row writes, deletions included
    pub fn pending_writes(&self) -> usize {
        self.users.len()
            + self.groups.len()
            + self.lp_assets.len()
            + self.pools.len()
            + self.balances.len()
            + usize::from(self.global.is_some())
            + self.referral_log.len()
    }

    /// Apply every staged write to the base store
    pub fn commit(self) {
        let writes = self.pending_writes();
        let base = self.base;

        for user in self.users.into_values() {
            base.put_user(user);
        }
        for (address, group) in self.groups {
            match group {
                Some(group) => base.put_group(group),
                None => base.remove_group(&address),
            }
        }
        for asset in self.lp_assets.into_values() {
            base.put_lp_asset(asset);
        }
        for (key, pool) in self.pools {
            match pool {
                Some(pool) => base.put_pool(pool),
                None => base.remove_pool(&key),
            }
        }
        for (key, balance) in self.balances {
            match balance {
                Some(balance) => base.put_user_balance(balance),
                None => base.remove_user_balance(&key),
            }
        }
        if let Some(global) = self.global {
            base.put_global(global);
        }
        for entry in self.referral_log {
            base.append_referral_log(entry);
        }

        log::debug!("committed {} staged writes", writes);
    }

    /// Base pool keys with staged pools added and staged deletions removed
    fn merge_pool_keys(&self, base_keys: Vec<PoolKey>) -> Vec<PoolKey> {
        let mut keys: BTreeSet<PoolKey> = base_keys.into_iter().collect();
        for (key, staged) in &self.pools {
            match staged {
                Some(_) => keys.insert(*key),
                None => keys.remove(key),
            };
        }
        keys.into_iter().collect()
    }

    /// Drop every staged write
    pub fn discard(self) {
        log::debug!("discarded {} staged writes", self.pending_writes());
    }
}

impl<S: LedgerStore> LedgerStore for StagedLedger<'_, S> {
    fn user(&self, address: &Address) -> Option<User> {
        match self.users.get(address) {
            Some(user) => Some(user.clone()),
            None => self.base.user(address),
        }
    }

    fn put_user(&mut self, user: User) {
        self.users.insert(user.address, user);
    }

    fn group(&self, address: &Address) -> Option<Group> {
        match self.groups.get(address) {
            Some(staged) => staged.clone(),
            None => self.base.group(address),
        }
    }

    fn put_group(&mut self, group: Group) {
        self.groups.insert(group.address, Some(group));
    }

    fn remove_group(&mut self, address: &Address) {
        self.groups.insert(*address, None);
    }

    fn lp_asset(&self, asset: &AssetId) -> Option<LpAsset> {
        match self.lp_assets.get(asset) {
            Some(staged) => Some(staged.clone()),
            None => self.base.lp_asset(asset),
        }
    }

    fn put_lp_asset(&mut self, asset: LpAsset) {
        self.lp_assets.insert(asset.asset, asset);
    }

    fn pool(&self, key: &PoolKey) -> Option<Pool> {
        match self.pools.get(key) {
            Some(staged) => staged.clone(),
            None => self.base.pool(key),
        }
    }

    fn put_pool(&mut self, pool: Pool) {
        self.pools.insert(pool.key(), Some(pool));
    }

    fn remove_pool(&mut self, key: &PoolKey) {
        self.pools.insert(*key, None);
    }

    fn user_balance(&self, key: &BalanceKey) -> Option<UserBalance> {
        match self.balances.get(key) {
            Some(staged) => staged.clone(),
            None => self.base.user_balance(key),
        }
    }

    fn put_user_balance(&mut self, balance: UserBalance) {
        self.balances.insert(balance.key(), Some(balance));
    }

    fn remove_user_balance(&mut self, key: &BalanceKey) {
        self.balances.insert(*key, None);
    }

    fn global(&self) -> Option<GlobalState> {
        match &self.global {
            Some(global) => Some(global.clone()),
            None => self.base.global(),
        }
    }

    fn put_global(&mut self, global: GlobalState) {
        self.global = Some(global);
    }

    fn append_referral_log(&mut self, entry: ReferralLogEntry) {
        self.referral_log.push(entry);
    }

    fn referral_log(&self) -> Vec<ReferralLogEntry> {
        let mut log = self.base.referral_log();
        log.extend(self.referral_log.iter().cloned());
        log
    }

    fn group_members(&self, group: &Address) -> Vec<Address> {
        let mut members: BTreeSet<Address> = self
            .base
            .group_members(group)
            .into_iter()
            .filter(|address| match self.users.get(address) {
                Some(staged) => staged.group == *group,
                None => true,
            })
            .collect();
        members.extend(
            self.users
                .values()
                .filter(|user| user.group == *group)
                .map(|user| user.address),
        );
        members.into_iter().collect()
    }

    fn user_balances_of(&self, group: &Address, user: &Address) -> Vec<UserBalance> {
        let mut rows: BTreeMap<BalanceKey, UserBalance> = self
            .base
            .user_balances_of(group, user)
            .into_iter()
            .map(|balance| (balance.key(), balance))
            .collect();

        for (key, staged) in &self.balances {
            if key.group != *group || key.user != *user {
                continue;
            }
            match staged {
                Some(balance) => {
                    rows.insert(*key, balance.clone());
                }
                None => {
                    rows.remove(key);
                }
            }
        }
        rows.into_values().collect()
    }

    fn pools_for_asset(&self, asset: &AssetId) -> Vec<PoolKey> {
        self.merge_pool_keys(self.base.pools_for_asset(asset))
            .into_iter()
            .filter(|key| key.asset == *asset)
            .collect()
    }

    fn all_pools(&self) -> Vec<PoolKey> {
        self.merge_pool_keys(self.base.all_pools())
    }

    fn lp_asset_by_underlying(&self, underlying: &Address) -> Option<LpAsset> {
        if let Some(staged) = self
            .lp_assets
            .values()
            .find(|asset| asset.underlying == Some(*underlying))
        {
            return Some(staged.clone());
        }
        // A staged copy of the base match may have been re-pointed elsewhere.
        self.base
            .lp_asset_by_underlying(underlying)
            .filter(|asset| !self.lp_assets.contains_key(&asset.asset))
    }
}
