//! Price Oracle
//!
//! Base-currency prices of underlying tokens and reserve snapshots of the
//! mLRT/LST liquidity pools. The engine only reads through [`PriceOracle`];
//! where the data comes from (an RPC client, a cached table) is up to the
//! host.

use std::collections::BTreeMap;

use points_common::{Address, Amount, EngineConfig};

/// Reserves of a two-token mLRT/LST liquidity pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityPoolState {
    /// Restaked receipt token (coin 0)
    pub mlrt: Address,
    /// Liquid staking token (coin 1)
    pub lst: Address,
    pub mlrt_balance: Amount,
    pub lst_balance: Amount,
    /// LP tokens outstanding
    pub total_supply: Amount,
}

impl LiquidityPoolState {
    /// True when the pool cannot be priced
    pub fn is_empty(&self) -> bool {
        self.total_supply == 0 || (self.mlrt_balance == 0 && self.lst_balance == 0)
    }
}

/// Source of prices and pool reserves
pub trait PriceOracle {
    /// Price of `token` in base currency (wad), if known
    fn base_price(&self, token: &Address) -> Option<Amount>;

    /// Current reserves of the liquidity pool at `pool`, if known
    fn liquidity_pool(&self, pool: &Address) -> Option<LiquidityPoolState>;
}

/// Fixed price table with optional pool snapshots
#[derive(Debug, Clone, Default)]
pub struct StaticPriceTable {
    prices: BTreeMap<Address, Amount>,
    pools: BTreeMap<Address, LiquidityPoolState>,
}

impl StaticPriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the configured base prices
    pub fn from_config(config: &EngineConfig) -> Self {
        let prices = config
            .base_prices
            .iter()
            .map(|entry| (entry.token, entry.price))
            .collect();
        Self { prices, pools: BTreeMap::new() }
    }

    pub fn set_price(&mut self, token: Address, price: Amount) {
        self.prices.insert(token, price);
    }

    /// Record the latest reserves of `pool`
    pub fn set_pool(&mut self, pool: Address, state: LiquidityPoolState) {
        self.pools.insert(pool, state);
    }

    pub fn with_pool(mut self, pool: Address, state: LiquidityPoolState) -> Self {
        self.set_pool(pool, state);
        self
    }
}

impl PriceOracle for StaticPriceTable {
    fn base_price(&self, token: &Address) -> Option<Amount> {
        self.prices.get(token).copied()
    }

    fn liquidity_pool(&self, pool: &Address) -> Option<LiquidityPoolState> {
        self.pools.get(pool).copied()
    }
}
