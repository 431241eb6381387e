//! Referral Groups
//!
//! A user's first referral links them to the referrer and folds the
//! depositor's whole group into the referrer's group, so everyone shares one
//! TVL tier from then on.
//!
//! Merges run in two phases: [`Accrual::plan_merge`] only reads and lists
//! what has to move, [`Accrual::apply_merge`] moves it. Atomicity is the
//! caller's concern; the dispatch layer runs both inside one staged ledger.

use points_common::{
    Address, Amount, AssetId, PointsError, PointsEvent, PointsResult, PoolKey, Timestamp,
};
use points_ledger::LedgerStore;

use crate::Accrual;

/// One balance row to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRow {
    pub user: Address,
    pub asset: AssetId,
    pub shares: Amount,
    pub unclaimed_shares: Amount,
}

/// Everything a merge of `source` into `target` touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub source: Address,
    pub target: Address,
    pub members: Vec<Address>,
    pub rows: Vec<MergeRow>,
}

impl<S: LedgerStore> Accrual<'_, S> {
    /// Link `depositor` to `referrer` if this is the depositor's first referral
    ///
    /// Ignored for a zero referrer, a self-referral, or a depositor that
    /// already has a referrer. Returns whether a link was made.
    pub fn establish_referral(
        &mut self,
        depositor: Address,
        referrer: Address,
        now: Timestamp,
    ) -> PointsResult<bool> {
        if referrer.is_zero() || referrer == depositor {
            return Ok(false);
        }
        let depositor_user = self.store.load_or_create_user(depositor);
        if depositor_user.referrer.is_some() {
            return Ok(false);
        }
        let referrer_user = self.store.load_or_create_user(referrer);

        if depositor_user.group != referrer_user.group {
            self.merge_groups(depositor_user.group, referrer_user.group, now)?;
        }

        // Reload: the merge reassigned groups
        let mut depositor_user = self.store.load_or_create_user(depositor);
        depositor_user.referrer = Some(referrer);
        self.store.put_user(depositor_user);

        let mut referrer_user = self.store.load_or_create_user(referrer);
        referrer_user.referral_count = referrer_user
            .referral_count
            .checked_add(1)
            .ok_or(PointsError::Overflow)?;
        self.store.put_user(referrer_user);

        log::info!("{} referred by {}", depositor, referrer);
        self.emit(PointsEvent::ReferralLinked { referee: depositor, referrer, timestamp: now });
        Ok(true)
    }

    /// Collect every member of `source` and their balance rows under it
    pub fn plan_merge(&self, source: Address, target: Address) -> MergePlan {
        let members = self.store.group_members(&source);
        let rows = members
            .iter()
            .flat_map(|member| self.store.user_balances_of(&source, member))
            .map(|balance| MergeRow {
                user: balance.user,
                asset: balance.asset,
                shares: balance.shares,
                unclaimed_shares: balance.unclaimed_shares,
            })
            .collect();

        MergePlan { source, target, members, rows }
    }

    /// Move every planned row into the target group, then retire the source
    ///
    /// Each row is withdrawn from the source pool and deposited into the
    /// target pool, claimed and pre-deposit shares separately, so both
    /// groups' TVL and the pending points follow the shares. Source pools
    /// left with nothing staked are removed along with the source group.
    pub fn apply_merge(&mut self, plan: &MergePlan, now: Timestamp) -> PointsResult<()> {
        for row in &plan.rows {
            let from = PoolKey::new(plan.source, row.asset).balance_of(row.user);
            let to = PoolKey::new(plan.target, row.asset).balance_of(row.user);

            if row.shares > 0 {
                self.withdraw(from, row.shares, now, false)?;
                self.deposit(to, row.shares, now, false)?;
            }
            if row.unclaimed_shares > 0 {
                self.withdraw(from, row.unclaimed_shares, now, true)?;
                self.deposit(to, row.unclaimed_shares, now, true)?;
            }
            self.store.remove_user_balance(&from);
        }

        // Retire source pools left empty
        let mut retired = 0usize;
        for key in self.store.all_pools().into_iter().filter(|key| key.group == plan.source) {
            let empty = match self.store.pool(&key) {
                Some(pool) => pool.total_staked()? == 0,
                None => false,
            };
            if empty {
                self.store.remove_pool(&key);
                retired += 1;
            }
        }

        for member in &plan.members {
            let mut user = self.store.load_or_create_user(*member);
            user.group = plan.target;
            self.store.put_user(user);
        }
        self.store.remove_group(&plan.source);

        log::info!(
            "merged group {} into {}: {} members, {} balances, {} pools retired",
            plan.source,
            plan.target,
            plan.members.len(),
            plan.rows.len(),
            retired
        );
        self.emit(PointsEvent::GroupsMerged {
            source: plan.source,
            target: plan.target,
            members_moved: u32::try_from(plan.members.len()).unwrap_or(u32::MAX),
            balances_moved: u32::try_from(plan.rows.len()).unwrap_or(u32::MAX),
            timestamp: now,
        });
        Ok(())
    }

    /// Fold `source` into `target`
    ///
    /// # Errors
    /// `InvalidInput` when both are the same group; otherwise whatever a
    /// row move fails with.
    pub fn merge_groups(
        &mut self,
        source: Address,
        target: Address,
        now: Timestamp,
    ) -> PointsResult<MergePlan> {
        if source == target {
            return Err(PointsError::InvalidInput {
                param: "target",
                reason: "cannot merge a group into itself",
            });
        }
        let plan = self.plan_merge(source, target);
        self.apply_merge(&plan, now)?;
        Ok(plan)
    }
}
