//! In-memory ledger
//!
//! `BTreeMap` tables, so every scan is in key order. Survives a restart
//! through [`MemoryLedger::snapshot`] / [`MemoryLedger::restore`].

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use points_common::{
    Address, AssetId, BalanceKey, GlobalState, Group, LpAsset, PointsError, PointsResult, Pool,
    PoolKey, ReferralLogEntry, User, UserBalance,
};

use crate::LedgerStore;

/// Ledger backed by ordered maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    users: BTreeMap<Address, User>,
    groups: BTreeMap<Address, Group>,
    lp_assets: BTreeMap<AssetId, LpAsset>,
    pools: BTreeMap<PoolKey, Pool>,
    balances: BTreeMap<BalanceKey, UserBalance>,
    global: Option<GlobalState>,
    referral_log: Vec<ReferralLogEntry>,
}

/// Flat copy of every table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LedgerSnapshot {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub lp_assets: Vec<LpAsset>,
    pub pools: Vec<Pool>,
    pub balances: Vec<UserBalance>,
    pub global: Option<GlobalState>,
    pub referral_log: Vec<ReferralLogEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users, groups, pools and balance rows
    pub fn row_counts(&self) -> (usize, usize, usize, usize) {
        (self.users.len(), self.groups.len(), self.pools.len(), self.balances.len())
    }

    pub fn to_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            users: self.users.values().cloned().collect(),
            groups: self.groups.values().cloned().collect(),
            lp_assets: self.lp_assets.values().cloned().collect(),
            pools: self.pools.values().cloned().collect(),
            balances: self.balances.values().cloned().collect(),
            global: self.global.clone(),
            referral_log: self.referral_log.clone(),
        }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            users: snapshot.users.into_iter().map(|u| (u.address, u)).collect(),
            groups: snapshot.groups.into_iter().map(|g| (g.address, g)).collect(),
            lp_assets: snapshot.lp_assets.into_iter().map(|a| (a.asset, a)).collect(),
            pools: snapshot.pools.into_iter().map(|p| (p.key(), p)).collect(),
            balances: snapshot.balances.into_iter().map(|b| (b.key(), b)).collect(),
            global: snapshot.global,
            referral_log: snapshot.referral_log,
        }
    }

    /// Serialize every table with borsh
    pub fn snapshot(&self) -> PointsResult<Vec<u8>> {
        borsh::to_vec(&self.to_snapshot()).map_err(|_| PointsError::InvalidInput {
            param: "snapshot",
            reason: "serialization failed",
        })
    }

    /// Rebuild a ledger from [`MemoryLedger::snapshot`] bytes
    pub fn restore(bytes: &[u8]) -> PointsResult<Self> {
        let snapshot: LedgerSnapshot = borsh::from_slice(bytes).map_err(|_| PointsError::InvalidInput {
            param: "snapshot",
            reason: "malformed bytes",
        })?;
        log::debug!(
            "restored ledger: {} users, {} pools, {} balances",
            snapshot.users.len(),
            snapshot.pools.len(),
            snapshot.balances.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }
}

impl LedgerStore for MemoryLedger {
    fn user(&self, address: &Address) -> Option<User> {
        self.users.get(address).cloned()
    }

    fn put_user(&mut self, user: User) {
        self.users.insert(user.address, user);
    }

    fn group(&self, address: &Address) -> Option<Group> {
        self.groups.get(address).cloned()
    }

    fn put_group(&mut self, group: Group) {
        self.groups.insert(group.address, group);
    }

    fn remove_group(&mut self, address: &Address) {
        self.groups.remove(address);
    }

    fn lp_asset(&self, asset: &AssetId) -> Option<LpAsset> {
        self.lp_assets.get(asset).cloned()
    }

    fn put_lp_asset(&mut self, asset: LpAsset) {
        self.lp_assets.insert(asset.asset, asset);
    }

    fn pool(&self, key: &PoolKey) -> Option<Pool> {
        self.pools.get(key).cloned()
    }

    fn put_pool(&mut self, pool: Pool) {
        self.pools.insert(pool.key(), pool);
    }

    fn remove_pool(&mut self, key: &PoolKey) {
        self.pools.remove(key);
    }

    fn user_balance(&self, key: &BalanceKey) -> Option<UserBalance> {
        self.balances.get(key).cloned()
    }

    fn put_user_balance(&mut self, balance: UserBalance) {
        self.balances.insert(balance.key(), balance);
    }

    fn remove_user_balance(&mut self, key: &BalanceKey) {
        self.balances.remove(key);
    }

    fn global(&self) -> Option<GlobalState> {
        self.global.clone()
    }

    fn put_global(&mut self, global: GlobalState) {
        self.global = Some(global);
    }

    fn append_referral_log(&mut self, entry: ReferralLogEntry) {
        self.referral_log.push(entry);
    }

    fn referral_log(&self) -> Vec<ReferralLogEntry> {
        self.referral_log.clone()
    }

    fn group_members(&self, group: &Address) -> Vec<Address> {
        self.users
            .values()
            .filter(|user| user.group == *group)
            .map(|user| user.address)
            .collect()
    }

    fn user_balances_of(&self, group: &Address, user: &Address) -> Vec<UserBalance> {
        // Keys order by group first; AssetId::Token(ZERO) is the smallest asset.
        let start = BalanceKey {
            group: *group,
            asset: AssetId::Token(Address::ZERO),
            user: Address::ZERO,
        };
        self.balances
            .range(start..)
            .take_while(|(key, _)| key.group == *group)
            .filter(|(key, _)| key.user == *user)
            .map(|(_, balance)| balance.clone())
            .collect()
    }

    fn pools_for_asset(&self, asset: &AssetId) -> Vec<PoolKey> {
        self.pools.keys().filter(|key| key.asset == *asset).copied().collect()
    }

    fn all_pools(&self) -> Vec<PoolKey> {
        self.pools.keys().copied().collect()
    }

    fn lp_asset_by_underlying(&self, underlying: &Address) -> Option<LpAsset> {
        self.lp_assets
            .values()
            .find(|asset| asset.underlying == Some(*underlying))
            .cloned()
    }
}
