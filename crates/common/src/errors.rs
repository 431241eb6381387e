//! Error Types for the Points Engine
//!
//! Typed errors with stable codes. Fatal errors abort the event being
//! processed; soft conditions ([`PointsError::UnknownAsset`] and
//! [`PointsError::MissingPriceData`]) are reported back to the caller as
//! notices while the event still applies.

use core::fmt;

use crate::types::{Address, AssetId};

/// Result type alias for points engine operations
pub type PointsResult<T> = Result<T, PointsError>;

/// Main error enum for all points engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointsError {
    // ============ Accounting Errors ============
    /// A balance, total or TVL would go negative
    InvariantViolation {
        what: InvariantKind,
        available: u128,
        requested: u128,
    },

    // ============ Asset / Price Errors ============
    /// Event references an asset with no registration or rate data
    UnknownAsset { asset: AssetId },

    /// Oracle has no price for a referenced token
    MissingPriceData { token: Address },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Division by zero
    DivisionByZero,

    // ============ Input Validation Errors ============
    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },
}

/// Quantity whose invariant was about to be broken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    /// User's claimed shares in a pool
    UserShares,
    /// User's pre-deposit shares in a pool
    UserUnclaimedShares,
    /// Pool's total claimed shares
    PoolShares,
    /// Pool's total pre-deposit shares
    PoolUnclaimedShares,
    /// Group's value locked
    GroupTvl,
    /// Protocol-wide value locked
    GlobalTvl,
    /// Recorded debt exceeds accrued points
    PointsDebt,
}

impl PointsError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvariantViolation { .. } => "E001_INVARIANT_VIOLATION",
            Self::UnknownAsset { .. } => "E010_UNKNOWN_ASSET",
            Self::MissingPriceData { .. } => "E011_MISSING_PRICE",
            Self::Overflow => "E080_OVERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::InvalidInput { .. } => "E090_INVALID_INPUT",
        }
    }

    /// Returns true if the event still applies with a fallback
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownAsset { .. } | Self::MissingPriceData { .. })
    }

    /// Shorthand for a balance underflow
    pub fn underflow(what: InvariantKind, available: u128, requested: u128) -> Self {
        Self::InvariantViolation { what, available, requested }
    }
}

impl fmt::Display for PointsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvariantViolation { what, available, requested } => write!(
                f,
                "{}: {:?} would go negative (available {}, requested {})",
                self.code(),
                what,
                available,
                requested
            ),
            Self::UnknownAsset { asset } => write!(f, "{}: asset {}", self.code(), asset),
            Self::MissingPriceData { token } => write!(f, "{}: token {}", self.code(), token),
            Self::InvalidInput { param, reason } => {
                write!(f, "{}: {} {}", self.code(), param, reason)
            }
            Self::Overflow | Self::DivisionByZero => f.write_str(self.code()),
        }
    }
}

impl std::error::Error for PointsError {}
