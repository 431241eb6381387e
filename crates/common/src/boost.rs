//! Boost Calculator
//!
//! Pure functions for the two Eigenpie point multipliers:
//! - **Group boost**: tiered by a referral group's value locked
//! - **Global boost**: a step function over block timestamps
//!
//! Both return wad-scaled multipliers (1e18 = 1x).

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::boost::UNITY;
use crate::math::bps_to_wad;
use crate::types::{Amount, Timestamp};

/// One group TVL tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BoostTier {
    /// Minimum value locked for the tier (wad base units, inclusive)
    pub min_tvl: Amount,
    /// Multiplier in basis points (10000 = 1x)
    pub multiplier_bps: u128,
}

/// One window of the global boost schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BoostWindow {
    /// Last timestamp covered by the window (inclusive); `None` is open-ended
    pub until: Option<Timestamp>,
    /// Multiplier (wad)
    pub multiplier: Amount,
}

impl BoostWindow {
    /// Returns true if `timestamp` falls at or before the window's end
    pub fn covers(&self, timestamp: Timestamp) -> bool {
        self.until.map_or(true, |until| timestamp <= until)
    }
}

/// Group boost for a value locked
///
/// `tiers` are ascending by threshold. The highest tier whose threshold does
/// not exceed `tvl` wins; below every threshold the boost is 1x.
pub fn tier_boost(tvl: Amount, tiers: &[BoostTier]) -> Amount {
    tiers
        .iter()
        .rev()
        .find(|tier| tvl >= tier.min_tvl)
        .map(|tier| bps_to_wad(tier.multiplier_bps))
        .unwrap_or(UNITY)
}

/// Global boost in effect at `timestamp`
///
/// The first window covering the timestamp wins. Past the last bounded
/// window with no open-ended one, the boost is 1x.
pub fn global_boost(timestamp: Timestamp, schedule: &[BoostWindow]) -> Amount {
    schedule
        .iter()
        .find(|window| window.covers(timestamp))
        .map(|window| window.multiplier)
        .unwrap_or(UNITY)
}
