//! Event Handlers
//!
//! One function per [`ChainEvent`] variant. Each works on the staged
//! context only; the engine decides afterwards whether the writes commit.

use points_common::{
    add, wad_div, wad_mul, Address, Amount, AssetId, PointsError, PointsEvent, PointsResult,
    PoolKey, Timestamp,
};
use points_ledger::LedgerStore;

use crate::inputs::ChainEvent;
use crate::oracle::PriceOracle;
use crate::DispatchContext;

/// Route an event to its handler
pub fn apply<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    event: &ChainEvent,
) -> PointsResult<()> {
    match *event {
        ChainEvent::AssetRegistered { receipt, underlying, timestamp } => {
            handle_asset_registered(ctx, receipt, underlying, timestamp)
        }
        ChainEvent::AssetDeposited {
            depositor,
            referral,
            asset,
            amount,
            minted_shares,
            is_pre_deposit,
            timestamp,
        } => handle_asset_deposited(
            ctx,
            depositor,
            referral,
            asset,
            amount,
            minted_shares,
            is_pre_deposit,
            timestamp,
        ),
        ChainEvent::MlrtTransferred { token, from, to, amount, timestamp } => {
            handle_mlrt_transfer(ctx, token, from, to, amount, timestamp)
        }
        ChainEvent::LiquidityPoolTransferred { pool, sender, receiver, amount, timestamp } => {
            handle_lp_transfer(ctx, pool, sender, receiver, amount, timestamp)
        }
        ChainEvent::LiquidityPoolRebalanced { pool, timestamp } => {
            handle_lp_rebalance(ctx, pool, timestamp)
        }
        ChainEvent::ExchangeRateUpdated { receipt, underlying, new_rate, timestamp } => {
            handle_exchange_rate(ctx, receipt, underlying, new_rate, timestamp)
        }
        ChainEvent::ExternalDeposit { venue, token, depositor, amount, timestamp } => {
            handle_external(ctx, venue, token, depositor, amount, timestamp, Direction::In)
        }
        ChainEvent::ExternalWithdraw { venue, token, depositor, amount, timestamp } => {
            handle_external(ctx, venue, token, depositor, amount, timestamp, Direction::Out)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

// ============ Shared Steps ============

/// Move claimed shares of `asset` in or out of `user`'s current group
fn move_shares<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    user: Address,
    asset: AssetId,
    shares: Amount,
    now: Timestamp,
    direction: Direction,
) -> PointsResult<()> {
    let group = ctx.group_of(user);
    let key = PoolKey::new(group, asset).balance_of(user);
    match direction {
        Direction::In => ctx.accrual.deposit(key, shares, now, false)?,
        Direction::Out => ctx.accrual.withdraw(key, shares, now, false)?,
    };
    Ok(())
}

/// Apply a new price (and optionally mLRT ratio) to an asset
///
/// Group and global TVL move with the price, so holders can always exit
/// at the price in force.
fn reprice<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    asset: AssetId,
    price: Amount,
    mlrt_ratio: Option<Amount>,
    now: Timestamp,
) -> PointsResult<()> {
    let config = ctx.config;
    let mut lp_asset = ctx
        .accrual
        .store_mut()
        .load_or_create_lp_asset(asset, || config.new_lp_asset(asset));
    let old_price = lp_asset.price_to_base;
    lp_asset.price_to_base = price;
    if let Some(ratio) = mlrt_ratio {
        lp_asset.mlrt_ratio = ratio;
    }
    let ratio = lp_asset.mlrt_ratio;
    ctx.accrual.store_mut().put_lp_asset(lp_asset);
    ctx.accrual.revalue_asset(asset, old_price, price)?;

    log::debug!("repriced {}: {} -> {} (mlrt ratio {})", asset, old_price, price, ratio);
    ctx.accrual.emit(PointsEvent::AssetRepriced {
        asset,
        old_price,
        new_price: price,
        mlrt_ratio: ratio,
        timestamp: now,
    });
    Ok(())
}

// ============ Handlers ============

fn handle_asset_registered<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    receipt: Address,
    underlying: Address,
    now: Timestamp,
) -> PointsResult<()> {
    let config = ctx.config;
    let asset = AssetId::Token(receipt);

    // Only the latest registration for an underlying stays live
    while let Some(mut superseded) = ctx.accrual.store().lp_asset_by_underlying(&underlying) {
        if superseded.asset != asset {
            log::info!("receipt {} superseded for {}", superseded.asset, underlying);
        }
        superseded.underlying = None;
        superseded.registered = false;
        ctx.accrual.store_mut().put_lp_asset(superseded);
    }

    let mut lp_asset = ctx
        .accrual
        .store_mut()
        .load_or_create_lp_asset(asset, || config.new_lp_asset(asset));
    lp_asset.underlying = Some(underlying);
    lp_asset.registered = true;
    ctx.accrual.store_mut().put_lp_asset(lp_asset);

    log::info!("registered receipt {} for {}", receipt, underlying);
    ctx.accrual.emit(PointsEvent::AssetRegistered { asset, underlying, timestamp: now });
    Ok(())
}

fn handle_asset_deposited<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    depositor: Address,
    referral: Address,
    underlying: Address,
    amount: Amount,
    minted_shares: Amount,
    is_pre_deposit: bool,
    now: Timestamp,
) -> PointsResult<()> {
    let receipt = ctx.resolve_receipt(underlying);

    if minted_shares > 0 {
        let group = ctx.group_of(depositor);
        let key = PoolKey::new(group, AssetId::Token(receipt)).balance_of(depositor);
        ctx.accrual.deposit(key, minted_shares, now, is_pre_deposit)?;
    } else {
        log::debug!("deposit of {} {} by {} minted no shares", amount, underlying, depositor);
    }

    ctx.accrual.establish_referral(depositor, referral, now)?;
    Ok(())
}

/// Receipt transfers skip mints, burns, the pre-deposit helper and
/// integration contracts on either side
fn handle_mlrt_transfer<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    token: Address,
    from: Address,
    to: Address,
    amount: Amount,
    now: Timestamp,
) -> PointsResult<()> {
    let asset = AssetId::Token(token);
    if ctx.tracks_holder(&from) {
        move_shares(ctx, from, asset, amount, now, Direction::Out)?;
    }
    if ctx.tracks_holder(&to) {
        move_shares(ctx, to, asset, amount, now, Direction::In)?;
    }
    Ok(())
}

fn handle_lp_transfer<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    pool: Address,
    sender: Address,
    receiver: Address,
    amount: Amount,
    now: Timestamp,
) -> PointsResult<()> {
    let asset = AssetId::Token(pool);
    if !sender.is_zero() {
        move_shares(ctx, sender, asset, amount, now, Direction::Out)?;
    }
    if !receiver.is_zero() {
        move_shares(ctx, receiver, asset, amount, now, Direction::In)?;
    }
    Ok(())
}

/// Settle the LP token's pools at the old price, then reprice from reserves
fn handle_lp_rebalance<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    pool: Address,
    now: Timestamp,
) -> PointsResult<()> {
    let asset = AssetId::Token(pool);
    ctx.accrual.update_pools_for_asset(asset, now)?;

    let state = match ctx.oracle.liquidity_pool(&pool) {
        Some(state) if !state.is_empty() => state,
        _ => {
            log::warn!("no usable reserves for pool {}, price unchanged", pool);
            ctx.notice(PointsError::MissingPriceData { token: pool });
            return Ok(());
        }
    };

    let config = ctx.config;
    let mlrt_asset = AssetId::Token(state.mlrt);
    let mlrt_price = ctx
        .accrual
        .store_mut()
        .load_or_create_lp_asset(mlrt_asset, || config.new_lp_asset(mlrt_asset))
        .price_to_base;
    let lst_price = ctx.base_price(state.lst);

    let mlrt_tvl = wad_mul(state.mlrt_balance, mlrt_price)?;
    let lst_tvl = wad_mul(state.lst_balance, lst_price)?;
    let pool_tvl = add(mlrt_tvl, lst_tvl)?;
    if pool_tvl == 0 {
        log::warn!("pool {} holds no value, price unchanged", pool);
        ctx.notice(PointsError::MissingPriceData { token: pool });
        return Ok(());
    }

    let mlrt_ratio = wad_div(mlrt_tvl, pool_tvl)?;
    let price = wad_div(pool_tvl, state.total_supply)?;
    reprice(ctx, asset, price, Some(mlrt_ratio), now)
}

/// Reprice a receipt token and every staking-venue key holding it
fn handle_exchange_rate<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    receipt: Address,
    underlying: Address,
    new_rate: Amount,
    now: Timestamp,
) -> PointsResult<()> {
    let underlying_price = ctx.base_price(underlying);
    let price = wad_mul(new_rate, underlying_price)?;

    let mut assets = vec![AssetId::Token(receipt)];
    assets.extend(ctx.config.staked_assets_of(&receipt));
    for asset in assets {
        ctx.accrual.update_pools_for_asset(asset, now)?;
        reprice(ctx, asset, price, None, now)?;
    }
    Ok(())
}

fn handle_external<S: LedgerStore, O: PriceOracle>(
    ctx: &mut DispatchContext<'_, S, O>,
    venue: Address,
    token: Address,
    depositor: Address,
    amount: Amount,
    now: Timestamp,
    direction: Direction,
) -> PointsResult<()> {
    if !ctx.config.venue_accepts(&venue, &token) {
        log::debug!("ignoring {} at unsupported venue {}", token, venue);
        return Ok(());
    }
    move_shares(ctx, depositor, AssetId::Staked { venue, token }, amount, now, direction)
}
