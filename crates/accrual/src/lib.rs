//! Restaking Points Accrual
//!
//! Accumulator-per-share accounting over a [`LedgerStore`].
//!
//! ## Key Features
//!
//! - **Settlement**: advances a pool's two accumulators to a timestamp
//! - **Positions**: deposit, withdraw and harvest with per-user debts
//! - **Sweeps**: per asset, all pools, daily, and on global boost changes
//! - **Referrals**: first-referral linking with two-phase group merges
//! - **Audit log**: one entry per referral skim
//!
//! Every operation runs on an [`Accrual`] context that carries the store,
//! the configuration and the engine event log. Nothing is global.

pub mod groups;
pub mod pool;
pub mod position;


pub use groups::{MergePlan, MergeRow};
pub use position::HarvestResult;

use points_common::{EngineConfig, EventLog, PointsEvent};
use points_ledger::LedgerStore;

/// Accrual context for one batch of operations
pub struct Accrual<'a, S: LedgerStore> {
    store: &'a mut S,
    config: &'a EngineConfig,
    events: EventLog,
}

impl<'a, S: LedgerStore> Accrual<'a, S> {
    pub fn new(store: &'a mut S, config: &'a EngineConfig) -> Self {
        Self { store, config, events: EventLog::new() }
    }

    pub fn store(&self) -> &S {
        self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.store
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Events emitted so far
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Hand the collected events to the caller, leaving the log empty
    pub fn take_events(&mut self) -> EventLog {
        std::mem::take(&mut self.events)
    }

    /// Record an engine event
    pub fn emit(&mut self, event: PointsEvent) {
        self.events.emit(event);
    }
}
