//! Mathematical Utilities for the Points Engine
//!
//! Checked wad arithmetic. Products of two wad values overflow `u128`
//! long before the result does, so every multiply goes through a 256-bit
//! intermediate and is narrowed back afterwards.

use alloy_primitives::U256;

use crate::constants::precision::{BPS_DENOMINATOR, WAD};
use crate::errors::{InvariantKind, PointsError, PointsResult};

/// Calculate `a * b / denominator`, rounding down
///
/// # Errors
/// `DivisionByZero` for a zero denominator, `Overflow` if the quotient
/// does not fit `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> PointsResult<u128> {
    if denominator == 0 {
        return Err(PointsError::DivisionByZero);
    }

    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(PointsError::Overflow)?;
    let quotient = product / U256::from(denominator);

    u128::try_from(quotient).map_err(|_| PointsError::Overflow)
}

/// Wad multiply: `a * b / 1e18`
pub fn wad_mul(a: u128, b: u128) -> PointsResult<u128> {
    mul_div(a, b, WAD)
}

/// Wad divide: `a * 1e18 / b`
pub fn wad_div(a: u128, b: u128) -> PointsResult<u128> {
    mul_div(a, WAD, b)
}

/// Portion of `amount` given in basis points, rounding down
pub fn bps_of(amount: u128, bps: u128) -> PointsResult<u128> {
    mul_div(amount, bps, BPS_DENOMINATOR)
}

/// Convert a basis-point multiplier (10000 = 1x) to wad scale
pub fn bps_to_wad(bps: u128) -> u128 {
    WAD / BPS_DENOMINATOR * bps
}

/// Checked addition
pub fn add(a: u128, b: u128) -> PointsResult<u128> {
    a.checked_add(b).ok_or(PointsError::Overflow)
}

/// Subtraction that refuses to go negative
///
/// # Errors
/// `InvariantViolation` tagged with `what` when `amount > current`.
pub fn sub_checked(current: u128, amount: u128, what: InvariantKind) -> PointsResult<u128> {
    current
        .checked_sub(amount)
        .ok_or(PointsError::underflow(what, current, amount))
}
