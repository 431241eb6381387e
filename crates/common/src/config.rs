//! Engine Configuration
//!
//! Every tunable of the engine in one value that is threaded through each
//! accrual call. `EngineConfig::default()` reproduces mainnet; a host may
//! deserialize a partial document on top of it (missing fields keep their
//! defaults).

use serde::{Deserialize, Serialize};

use crate::boost::{BoostTier, BoostWindow};
use crate::constants::{addresses, boost, precision, prices, rates, referral, timing};
use crate::errors::{PointsError, PointsResult};
use crate::types::{Address, Amount, AssetId, LpAsset, Timestamp};

/// Eigenpie rate override for one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    pub asset: AssetId,
    /// Points per hour per unit of value (wad)
    pub points_per_hour: Amount,
}

/// Underlying token and the receipt minted for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptMapping {
    pub underlying: Address,
    pub receipt: Address,
}

/// External staking contract and the receipts it accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingVenue {
    pub venue: Address,
    pub tokens: Vec<Address>,
}

/// Static price of a token in base currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePrice {
    pub token: Address,
    pub price: Amount,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// EigenLayer points accrue strictly after this timestamp
    pub eigen_layer_launch_timestamp: Timestamp,
    pub eigen_layer_points_per_sec: Amount,
    /// Eigenpie points per hour for assets without a tier
    pub eigenpie_points_per_hour: Amount,
    pub eigenpie_rate_tiers: Vec<RateTier>,
    /// Ascending by `min_tvl`
    pub group_boost_tiers: Vec<BoostTier>,
    /// Ascending by `until`, open-ended window last
    pub global_boost_schedule: Vec<BoostWindow>,
    pub referral_skim_bps: u128,
    pub daily_sweep_interval: Timestamp,
    pub pre_deposit_helper: Address,
    /// Contracts that never accrue points from receipt transfers
    pub integration_contracts: Vec<Address>,
    pub receipt_tokens: Vec<ReceiptMapping>,
    pub staking_venues: Vec<StakingVenue>,
    pub base_prices: Vec<BasePrice>,
    /// Fallback when the oracle has no price
    pub default_price: Amount,
}

impl Default for EngineConfig {
    fn default() -> Self {
        use addresses::*;

        let tier = |asset: AssetId, points_per_hour| RateTier { asset, points_per_hour };
        let staked = |token| AssetId::Staked { venue: ZIRCUIT_STAKING, token };

        Self {
            eigen_layer_launch_timestamp: timing::EIGEN_LAYER_LAUNCH_TIME,
            eigen_layer_points_per_sec: rates::EIGEN_LAYER_POINTS_PER_SEC,
            eigenpie_points_per_hour: rates::EIGENPIE_POINTS_PER_HOUR,
            eigenpie_rate_tiers: vec![
                tier(AssetId::Token(MSTETH_WSTETH_CURVE_LP), rates::EIGENPIE_POINTS_PER_HOUR_2X),
                tier(AssetId::Token(MSTETH_WSTETH_RANGE_LP), rates::EIGENPIE_POINTS_PER_HOUR_2X),
                tier(staked(MSTETH), rates::EIGENPIE_POINTS_PER_HOUR_2X),
                tier(staked(MWBETH), rates::EIGENPIE_POINTS_PER_HOUR_2X),
                tier(AssetId::Token(MSWETH_SWETH_CURVE_LP), rates::EIGENPIE_POINTS_PER_HOUR_3X),
                tier(AssetId::Token(MSWETH_SWETH_RANGE_LP), rates::EIGENPIE_POINTS_PER_HOUR_3X),
                tier(staked(MSWETH), rates::EIGENPIE_POINTS_PER_HOUR_3X),
            ],
            group_boost_tiers: boost::GROUP_BOOST_TIERS.to_vec(),
            global_boost_schedule: boost::GLOBAL_BOOST_SCHEDULE.to_vec(),
            referral_skim_bps: referral::SKIM_BPS,
            daily_sweep_interval: timing::DAILY_SWEEP_INTERVAL,
            pre_deposit_helper: PRE_DEPOSIT_HELPER,
            integration_contracts: INTEGRATION_CONTRACTS.to_vec(),
            receipt_tokens: RECEIPT_TOKENS
                .iter()
                .map(|&(underlying, receipt)| ReceiptMapping { underlying, receipt })
                .collect(),
            staking_venues: vec![StakingVenue {
                venue: ZIRCUIT_STAKING,
                tokens: ZIRCUIT_TOKENS.to_vec(),
            }],
            base_prices: prices::LST_PRICES
                .iter()
                .map(|&(token, price)| BasePrice { token, price })
                .collect(),
            default_price: prices::DEFAULT_PRICE,
        }
    }
}

impl EngineConfig {
    /// Check internal consistency of the tables
    ///
    /// # Errors
    /// `InvalidInput` naming the first offending field.
    pub fn validate(&self) -> PointsResult<()> {
        let ascending_tiers = self
            .group_boost_tiers
            .windows(2)
            .all(|pair| pair[0].min_tvl < pair[1].min_tvl);
        if !ascending_tiers {
            return Err(PointsError::InvalidInput {
                param: "group_boost_tiers",
                reason: "thresholds must be strictly ascending",
            });
        }

        let ascending_windows = self.global_boost_schedule.windows(2).all(|pair| {
            match (pair[0].until, pair[1].until) {
                (Some(a), Some(b)) => a < b,
                (Some(_), None) => true,
                (None, _) => false,
            }
        });
        if !ascending_windows {
            return Err(PointsError::InvalidInput {
                param: "global_boost_schedule",
                reason: "windows must be ascending with the open-ended one last",
            });
        }

        if self.referral_skim_bps > precision::BPS_DENOMINATOR {
            return Err(PointsError::InvalidInput {
                param: "referral_skim_bps",
                reason: "exceeds 100%",
            });
        }

        if self.daily_sweep_interval == 0 {
            return Err(PointsError::InvalidInput {
                param: "daily_sweep_interval",
                reason: "must be positive",
            });
        }

        if self.default_price == 0 {
            return Err(PointsError::InvalidInput {
                param: "default_price",
                reason: "must be positive",
            });
        }

        Ok(())
    }

    /// Eigenpie points per second for `asset`
    pub fn eigenpie_points_per_sec(&self, asset: &AssetId) -> Amount {
        let per_hour = self
            .eigenpie_rate_tiers
            .iter()
            .find(|tier| tier.asset == *asset)
            .map(|tier| tier.points_per_hour)
            .unwrap_or(self.eigenpie_points_per_hour);
        per_hour / rates::SECONDS_PER_HOUR
    }

    /// Default record for an asset seen for the first time
    pub fn new_lp_asset(&self, asset: AssetId) -> LpAsset {
        LpAsset::new(asset, self.eigen_layer_points_per_sec, self.eigenpie_points_per_sec(&asset))
    }

    /// Configured receipt token for a deposited underlying
    pub fn receipt_for(&self, underlying: &Address) -> Option<Address> {
        self.receipt_tokens
            .iter()
            .find(|mapping| mapping.underlying == *underlying)
            .map(|mapping| mapping.receipt)
    }

    /// True for addresses whose receipt transfers never accrue points
    pub fn is_excluded_holder(&self, address: &Address) -> bool {
        address.is_zero()
            || *address == self.pre_deposit_helper
            || self.integration_contracts.contains(address)
    }

    /// True if `venue` is a configured staking venue accepting `token`
    pub fn venue_accepts(&self, venue: &Address, token: &Address) -> bool {
        self.staking_venues
            .iter()
            .any(|v| v.venue == *venue && v.tokens.contains(token))
    }

    /// Staking-venue asset keys tracking `token`
    pub fn staked_assets_of(&self, token: &Address) -> Vec<AssetId> {
        self.staking_venues
            .iter()
            .filter(|v| v.tokens.contains(token))
            .map(|v| AssetId::Staked { venue: v.venue, token: *token })
            .collect()
    }

    /// Configured static price of `token`
    pub fn base_price(&self, token: &Address) -> Option<Amount> {
        self.base_prices
            .iter()
            .find(|entry| entry.token == *token)
            .map(|entry| entry.price)
    }
}
