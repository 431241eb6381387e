//! Protocol Constants
//!
//! Magic numbers and mainnet addresses for the points engine. Every value
//! here is also the default of the matching [`EngineConfig`] field, so a
//! deployment only needs a config file when it diverges from mainnet.
//!
//! [`EngineConfig`]: crate::config::EngineConfig

/// Fixed-point precision
pub mod precision {
    /// One unit in wad scale (1e18)
    pub const WAD: u128 = 1_000_000_000_000_000_000;

    /// Basis points denominator
    pub const BPS_DENOMINATOR: u128 = 10_000;
}

/// Point emission rates
pub mod rates {
    use super::precision::WAD;

    /// Seconds per hour, the unit the rates are quoted in
    pub const SECONDS_PER_HOUR: u128 = 3_600;

    /// EigenLayer points per second per unit of base-currency value (1 per hour)
    pub const EIGEN_LAYER_POINTS_PER_SEC: u128 = WAD / SECONDS_PER_HOUR;

    /// Eigenpie points per hour per unit of value for untiered assets
    pub const EIGENPIE_POINTS_PER_HOUR: u128 = WAD;

    /// Eigenpie points per hour for 2x tier assets
    pub const EIGENPIE_POINTS_PER_HOUR_2X: u128 = 2 * WAD;

    /// Eigenpie points per hour for 3x tier assets
    pub const EIGENPIE_POINTS_PER_HOUR_3X: u128 = 3 * WAD;
}

/// Timing parameters (UNIX seconds)
pub mod timing {
    /// EigenLayer points start accruing strictly after this instant
    /// (2024-02-05 20:00 UTC)
    pub const EIGEN_LAYER_LAUNCH_TIME: u64 = 1_707_163_200;

    /// Minimum spacing between two full pool sweeps
    pub const DAILY_SWEEP_INTERVAL: u64 = 24 * 3_600;
}

/// Boost tables
pub mod boost {
    use super::precision::WAD;
    use crate::boost::{BoostTier, BoostWindow};

    /// Unity multiplier (1x, wad scaled)
    pub const UNITY: u128 = WAD;

    /// Group TVL tiers, ascending by threshold
    pub const GROUP_BOOST_TIERS: [BoostTier; 5] = [
        BoostTier { min_tvl: 100 * WAD, multiplier_bps: 12_000 },
        BoostTier { min_tvl: 500 * WAD, multiplier_bps: 14_000 },
        BoostTier { min_tvl: 1_000 * WAD, multiplier_bps: 16_000 },
        BoostTier { min_tvl: 2_000 * WAD, multiplier_bps: 18_000 },
        BoostTier { min_tvl: 5_000 * WAD, multiplier_bps: 20_000 },
    ];

    /// Global boost campaign windows, each bound inclusive
    pub const GLOBAL_BOOST_SCHEDULE: [BoostWindow; 4] = [
        // launch to 2024-02-13 00:00 UTC
        BoostWindow { until: Some(1_707_782_400), multiplier: 2 * WAD },
        // to 2024-02-24 09:00 UTC
        BoostWindow { until: Some(1_708_765_200), multiplier: WAD },
        // to 2024-03-05 09:00 UTC
        BoostWindow { until: Some(1_709_629_200), multiplier: 2 * WAD },
        BoostWindow { until: None, multiplier: WAD },
    ];
}

/// Referral parameters
pub mod referral {
    /// Share of every Eigenpie harvest credited to the referrer (10%)
    pub const SKIM_BPS: u128 = 1_000;
}

/// Mainnet addresses
pub mod addresses {
    use crate::types::Address;

    /// Zero address, used by mint/burn transfer legs
    pub const ZERO: Address = Address::ZERO;

    /// Pre-deposit helper contract, custodies pre-deposit receipts
    pub const PRE_DEPOSIT_HELPER: Address = Address::from_hex_const("0xcc5460cf8f81caa790b87910364e67ddb50e242b");

    // Liquid staking tokens
    pub const STETH: Address = Address::from_hex_const("0xae7ab96520de3a18e5e111b5eaab095312d7fe84");
    pub const WSTETH: Address = Address::from_hex_const("0x7f39c581f595b53c5cb19bd0b3f8da6c935e2ca0");
    pub const RETH: Address = Address::from_hex_const("0xae78736cd615f374d3085123a210448e74fc6393");
    pub const SFRXETH: Address = Address::from_hex_const("0xac3e018457b222d93114458476f3e3416abbe38f");
    pub const METH: Address = Address::from_hex_const("0xd5f7838f5c461feff7fe49ea5ebaf7728bb0adfa");
    pub const WBETH: Address = Address::from_hex_const("0xa2e3356610840701bdf5611a53974510ae27e2e1");
    pub const SWETH: Address = Address::from_hex_const("0xf951e335afb289353dc249e82926178eac7ded78");
    pub const CBETH: Address = Address::from_hex_const("0xbe9895146f7af43049ca1c1ae358b0541ea49704");
    pub const ETHX: Address = Address::from_hex_const("0xa35b1b31ce002fbf2058d22f30f95d405200a15b");
    pub const ANKRETH: Address = Address::from_hex_const("0xe95a203b1a91a908f9b9ce46459d101078c2c3cb");
    pub const OSETH: Address = Address::from_hex_const("0xf1c9acdc66974dfb6decb12aa385b9cd01190e38");
    pub const OETH: Address = Address::from_hex_const("0x856c4efb76c1d1ae02e20ceb03a2a6a08b0b8dc3");
    pub const LSETH: Address = Address::from_hex_const("0x8c1bed5b9a0928467c9b1341da1d7bd5e10b6549");

    // Restaked receipt tokens (mLRTs)
    pub const MSTETH: Address = Address::from_hex_const("0x49446a0874197839d15395b908328a74ccc96bc0");
    pub const MRETH: Address = Address::from_hex_const("0xd05728038681bcc79b2d5aeb4d9b002e66c93a40");
    pub const MSFRXETH: Address = Address::from_hex_const("0x879054273cb2dad631980fa4efe6d25eefe08aa4");
    pub const MMETH: Address = Address::from_hex_const("0x8a053350ca5f9352a16ded26ab333e2d251dad7c");
    pub const MWBETH: Address = Address::from_hex_const("0xe46a5e19b19711332e33f33c2db3ea143e86bc10");
    pub const MSWETH: Address = Address::from_hex_const("0x32bd822d615a3658a68b6fdd30c2fcb2c996d678");
    pub const MCBETH: Address = Address::from_hex_const("0xd09124e8a1e3d620e8807ad1d968021a5495cee8");
    pub const METHX: Address = Address::from_hex_const("0x9a1722b1f4a1bb2f271211ade8e851afc54f77e5");
    pub const MANKRETH: Address = Address::from_hex_const("0x5a4a503f4745c06a07e29d9a9dd88ab52f7a505b");
    pub const MOSETH: Address = Address::from_hex_const("0x352a3144e88d23427993938cfd780291d95ef091");
    pub const MOETH: Address = Address::from_hex_const("0x310718274509a38cc5559a1ff48c5edbe75a382b");
    pub const MLSETH: Address = Address::from_hex_const("0xa939c02dba8f237b40d2a3e96ad4252b00bb8a72");

    // External staking venue
    pub const ZIRCUIT_STAKING: Address = Address::from_hex_const("0xf047ab4c75cebf0eb9ed34ae2c186f3611aeafa6");

    // DEX liquidity pools
    pub const MSTETH_WSTETH_CURVE_LP: Address = Address::from_hex_const("0xc040041088b008eac1bf5fb886eac8c1e244b60f");
    pub const MSTETH_WSTETH_RANGE_LP: Address = Address::from_hex_const("0x3e0c9e83f2718c2a05b2dd42e672b335cdf13824");
    pub const MSTETH_WSTETH_PCS_LP: Address = Address::from_hex_const("0x350d6d813be7b64681f91f16a98ef360bd42b66b");
    pub const MSWETH_SWETH_CURVE_LP: Address = Address::from_hex_const("0x2022d9af896ecf0f1f5b48cddab9e74b5aabcf00");
    pub const MSWETH_SWETH_RANGE_LP: Address = Address::from_hex_const("0xe4b7ac5a573056cff9c361bc68ad779f7da9d342");
    pub const MSWETH_SWETH_PCS_LP: Address = Address::from_hex_const("0x6177811663a60ac211566be5873c5ed441d9e948");

    /// Underlying LST to restaked receipt token
    pub const RECEIPT_TOKENS: [(Address, Address); 12] = [
        (STETH, MSTETH),
        (RETH, MRETH),
        (SFRXETH, MSFRXETH),
        (METH, MMETH),
        (WBETH, MWBETH),
        (SWETH, MSWETH),
        (CBETH, MCBETH),
        (ETHX, METHX),
        (ANKRETH, MANKRETH),
        (OSETH, MOSETH),
        (OETH, MOETH),
        (LSETH, MLSETH),
    ];

    /// Contracts holding receipts on behalf of users; transfers to or from
    /// them are tracked by their own integration instead
    pub const INTEGRATION_CONTRACTS: [Address; 7] = [
        MSTETH_WSTETH_RANGE_LP,
        MSTETH_WSTETH_CURVE_LP,
        MSTETH_WSTETH_PCS_LP,
        MSWETH_SWETH_CURVE_LP,
        MSWETH_SWETH_RANGE_LP,
        MSWETH_SWETH_PCS_LP,
        ZIRCUIT_STAKING,
    ];

    /// Receipt tokens accepted by the Zircuit staking venue
    pub const ZIRCUIT_TOKENS: [Address; 3] = [MSTETH, MSWETH, MWBETH];
}

/// Static LST prices in base currency (wad), used by the bundled price table
pub mod prices {
    use super::addresses::*;
    use super::precision::WAD;
    use crate::types::Address;

    /// Default price when the oracle has nothing for a token
    pub const DEFAULT_PRICE: u128 = WAD;

    pub const LST_PRICES: [(Address, u128); 13] = [
        (STETH, WAD),
        (WSTETH, WAD * 1_159 / 1_000),
        (RETH, WAD * 1_101 / 1_000),
        (SFRXETH, WAD * 1_077 / 1_000),
        (METH, WAD * 1_024 / 1_000),
        (WBETH, WAD * 1_033 / 1_000),
        (SWETH, WAD * 1_053 / 1_000),
        (CBETH, WAD * 1_065 / 1_000),
        (ETHX, WAD * 1_023 / 1_000),
        (ANKRETH, WAD * 1_149 / 1_000),
        (OSETH, WAD * 1_009 / 1_000),
        (OETH, WAD),
        (LSETH, WAD * 1_042 / 1_000),
    ];
}
