//! Restaking Points Dispatch
//!
//! Translates indexed protocol events into accrual operations.
//!
//! ## Processing an event
//!
//! 1. A [`StagedLedger`] is opened over the engine's store
//! 2. The event's handler runs against it
//! 3. The daily sweep and the global boost refresh run at the event time
//! 4. The staged writes commit, or are discarded if any step failed
//!
//! An event is therefore applied completely or not at all. Soft conditions
//! (an unknown asset, a missing price) do not fail the event; they come back
//! as notices in the [`DispatchOutcome`].

pub mod handlers;
pub mod inputs;
pub mod oracle;
pub mod resolve;

mod integration_tests;

pub use inputs::ChainEvent;
pub use oracle::{LiquidityPoolState, PriceOracle, StaticPriceTable};

use points_accrual::Accrual;
use points_common::{EngineConfig, EventLog, PointsError, PointsResult};
use points_ledger::{LedgerStore, StagedLedger};

/// What processing one event produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Recoverable conditions hit while applying the event
    pub notices: Vec<PointsError>,
    /// Engine events emitted, in order
    pub events: EventLog,
}

/// Working state of one event
pub struct DispatchContext<'a, S: LedgerStore, O: PriceOracle> {
    pub accrual: Accrual<'a, S>,
    pub config: &'a EngineConfig,
    pub oracle: &'a O,
    pub notices: Vec<PointsError>,
}

impl<'a, S: LedgerStore, O: PriceOracle> DispatchContext<'a, S, O> {
    pub fn new(accrual: Accrual<'a, S>, config: &'a EngineConfig, oracle: &'a O) -> Self {
        Self { accrual, config, oracle, notices: Vec::new() }
    }

    /// Close the context, handing back notices and events
    pub fn finish(mut self) -> DispatchOutcome {
        DispatchOutcome { notices: self.notices, events: self.accrual.take_events() }
    }
}

/// Points engine over a ledger and a price source
pub struct PointsEngine<S: LedgerStore, O: PriceOracle> {
    store: S,
    config: EngineConfig,
    oracle: O,
}

impl<S: LedgerStore, O: PriceOracle> PointsEngine<S, O> {
    /// Create an engine after checking the configuration
    ///
    /// # Errors
    /// `InvalidInput` if the configuration is inconsistent.
    pub fn new(store: S, config: EngineConfig, oracle: O) -> PointsResult<Self> {
        config.validate()?;
        Ok(Self { store, config, oracle })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Mutable oracle, for hosts that push fresh prices between events
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Give the store back, e.g. to snapshot it
    pub fn into_store(self) -> S {
        self.store
    }

    /// Apply one event atomically
    ///
    /// # Errors
    /// Any fatal error from the handler or the sweeps. Nothing is written
    /// to the store in that case.
    pub fn handle(&mut self, event: &ChainEvent) -> PointsResult<DispatchOutcome> {
        let now = event.timestamp();
        let mut staged = StagedLedger::new(&mut self.store);

        let result = {
            let accrual = Accrual::new(&mut staged, &self.config);
            let mut ctx = DispatchContext::new(accrual, &self.config, &self.oracle);
            run(&mut ctx, event).map(|()| ctx.finish())
        };

        match result {
            Ok(outcome) => {
                staged.commit();
                for notice in &outcome.notices {
                    log::debug!("{} at {}: {}", event.kind(), now, notice);
                }
                Ok(outcome)
            }
            Err(err) => {
                staged.discard();
                log::error!("{} at {} aborted: {} ({})", event.kind(), now, err.code(), err);
                Err(err)
            }
        }
    }
}

/// Handler, then the time-driven sweeps
fn run<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    event: &ChainEvent,
) -> PointsResult<()> {
    let now = event.timestamp();
    handlers::apply(ctx, event)?;
    ctx.accrual.daily_update_all_pools(now)?;
    ctx.accrual.refresh_global_boost(now)?;
    Ok(())
}
