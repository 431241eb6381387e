//! Restaking Points Ledger
//!
//! Keyed storage for every entity the engine persists. The engine only ever
//! talks to [`LedgerStore`]; the indexing host decides what sits behind it.
//!
//! ## Key Features
//!
//! - **Typed tables**: users, groups, assets, pools, balances, global state
//! - **Get-or-create**: `load_or_create_*` persist defaults on first access
//!   and hand back owned values
//! - **Scans**: group membership, a member's balances, pools per asset
//! - **Staged writes**: [`StagedLedger`] buffers one event's writes and
//!   applies them all at once or not at all
//! - **Snapshots**: [`MemoryLedger`] round-trips through borsh bytes

pub mod memory;
pub mod staged;

pub use memory::{LedgerSnapshot, MemoryLedger};
pub use staged::StagedLedger;

use points_common::{
    Address, AssetId, BalanceKey, Group, GlobalState, LpAsset, Pool, PoolKey, ReferralLogEntry,
    User, UserBalance,
};

/// Storage contract of the points engine
///
/// Reads return owned copies. Writes replace the whole row. Scans return
/// rows in key order so that every sweep visits pools deterministically.
pub trait LedgerStore {
    // ============ Users ============

    fn user(&self, address: &Address) -> Option<User>;
    fn put_user(&mut self, user: User);

    // ============ Groups ============

    fn group(&self, address: &Address) -> Option<Group>;
    fn put_group(&mut self, group: Group);
    fn remove_group(&mut self, address: &Address);

    // ============ Assets ============

    fn lp_asset(&self, asset: &AssetId) -> Option<LpAsset>;
    fn put_lp_asset(&mut self, asset: LpAsset);

    // ============ Pools ============

    fn pool(&self, key: &PoolKey) -> Option<Pool>;
    fn put_pool(&mut self, pool: Pool);
    fn remove_pool(&mut self, key: &PoolKey);

    // ============ Balances ============

    fn user_balance(&self, key: &BalanceKey) -> Option<UserBalance>;
    fn put_user_balance(&mut self, balance: UserBalance);
    fn remove_user_balance(&mut self, key: &BalanceKey);

    // ============ Global ============

    fn global(&self) -> Option<GlobalState>;
    fn put_global(&mut self, global: GlobalState);

    // ============ Referral Audit Log ============

    fn append_referral_log(&mut self, entry: ReferralLogEntry);
    fn referral_log(&self) -> Vec<ReferralLogEntry>;

    // ============ Scans ============

    /// Addresses of every user whose group is `group`
    fn group_members(&self, group: &Address) -> Vec<Address>;

    /// Every balance row `user` holds under `group`
    fn user_balances_of(&self, group: &Address, user: &Address) -> Vec<UserBalance>;

    /// Keys of every pool tracking `asset`, across all groups
    fn pools_for_asset(&self, asset: &AssetId) -> Vec<PoolKey>;

    /// Keys of every known pool
    fn all_pools(&self) -> Vec<PoolKey>;

    /// Registered asset minted for deposits of `underlying`
    fn lp_asset_by_underlying(&self, underlying: &Address) -> Option<LpAsset>;

    // ============ Get-or-create ============

    /// Load a user, persisting a fresh one (its own group) if absent
    fn load_or_create_user(&mut self, address: Address) -> User {
        match self.user(&address) {
            Some(user) => user,
            None => {
                let user = User::new(address);
                self.put_user(user.clone());
                user
            }
        }
    }

    /// Load a group, persisting an empty unity-boost one if absent
    fn load_or_create_group(&mut self, address: Address) -> Group {
        match self.group(&address) {
            Some(group) => group,
            None => {
                let group = Group::new(address);
                self.put_group(group.clone());
                group
            }
        }
    }

    /// Load an asset, persisting `default()` if absent
    fn load_or_create_lp_asset<F>(&mut self, asset: AssetId, default: F) -> LpAsset
    where
        F: FnOnce() -> LpAsset,
    {
        match self.lp_asset(&asset) {
            Some(existing) => existing,
            None => {
                let created = default();
                self.put_lp_asset(created.clone());
                created
            }
        }
    }

    fn load_or_create_pool(&mut self, key: PoolKey) -> Pool {
        match self.pool(&key) {
            Some(pool) => pool,
            None => {
                let pool = Pool::new(key);
                self.put_pool(pool.clone());
                pool
            }
        }
    }

    fn load_or_create_user_balance(&mut self, key: BalanceKey) -> UserBalance {
        match self.user_balance(&key) {
            Some(balance) => balance,
            None => {
                let balance = UserBalance::new(key);
                self.put_user_balance(balance.clone());
                balance
            }
        }
    }

    fn load_or_create_global(&mut self) -> GlobalState {
        match self.global() {
            Some(global) => global,
            None => {
                let global = GlobalState::default();
                self.put_global(global.clone());
                global
            }
        }
    }
}
