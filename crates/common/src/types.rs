//! Core Types for the Points Engine
//!
//! Addresses, composite keys, and every entity the ledger persists.

use core::fmt;
use core::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{boost::UNITY, precision::WAD};
use crate::errors::{PointsError, PointsResult};

/// Type alias for wad-scaled amounts (shares, points, prices, multipliers)
pub type Amount = u128;

/// Type alias for block timestamps (UNIX seconds)
pub type Timestamp = u64;

// ============ Addresses ============

/// 20-byte account or contract address.
///
/// Parsing accepts any hex case, so two spellings of one address always
/// compare equal; display is lowercase and `0x`-prefixed.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address
    pub const ZERO: Address = Address([0u8; 20]);

    /// Parse a 40-digit hex literal at compile time.
    ///
    /// # Panics
    /// On malformed input; meant for `const` items where that is a build error.
    pub const fn from_hex_const(s: &str) -> Address {
        let bytes = s.as_bytes();
        let start = if bytes.len() >= 2 && bytes[0] == b'0' && (bytes[1] == b'x' || bytes[1] == b'X') {
            2
        } else {
            0
        };
        assert!(bytes.len() - start == 40, "address literal must have 40 hex digits");

        let mut out = [0u8; 20];
        let mut i = 0;
        while i < 20 {
            let hi = hex_nibble(bytes[start + 2 * i]);
            let lo = hex_nibble(bytes[start + 2 * i + 1]);
            out[i] = (hi << 4) | lo;
            i += 1;
        }
        Address(out)
    }

    /// Returns true for the zero address
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

const fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit in address literal"),
    }
}

impl FromStr for Address {
    type Err = PointsError;

    fn from_str(s: &str) -> PointsResult<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let decoded = hex::decode(digits).map_err(|_| PointsError::InvalidInput {
            param: "address",
            reason: "not valid hex",
        })?;
        let bytes: [u8; 20] = decoded.try_into().map_err(|_| PointsError::InvalidInput {
            param: "address",
            reason: "must be 20 bytes",
        })?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ============ Keys ============

/// Key of a deposit-bearing asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum AssetId {
    /// A receipt token or LP token held directly
    Token(Address),
    /// A token deposited into an external staking venue
    Staked { venue: Address, token: Address },
}

impl AssetId {
    /// The token whose balance this asset tracks
    pub fn token(&self) -> Address {
        match self {
            Self::Token(token) => *token,
            Self::Staked { token, .. } => *token,
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => write!(f, "{}", token),
            Self::Staked { venue, token } => {
                write!(f, "{}{}", venue, hex::encode(token.as_bytes()))
            }
        }
    }
}

/// Pool identity: one asset inside one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolKey {
    pub group: Address,
    pub asset: AssetId,
}

impl PoolKey {
    pub fn new(group: Address, asset: AssetId) -> Self {
        Self { group, asset }
    }

    /// Key of `user`'s balance row in this pool
    pub fn balance_of(&self, user: Address) -> BalanceKey {
        BalanceKey { group: self.group, asset: self.asset, user }
    }
}

/// UserBalance identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BalanceKey {
    pub group: Address,
    pub asset: AssetId,
    pub user: Address,
}

impl BalanceKey {
    pub fn pool_key(&self) -> PoolKey {
        PoolKey { group: self.group, asset: self.asset }
    }
}

// ============ Entities ============

/// A depositor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct User {
    pub address: Address,
    /// Who referred this user, set at most once
    pub referrer: Option<Address>,
    /// Number of users this user referred
    pub referral_count: u64,
    /// Group the user currently belongs to
    pub group: Address,
    pub eigen_layer_points: Amount,
    pub eigenpie_points: Amount,
    /// Points skimmed from referees' harvests
    pub eigenpie_referral_points: Amount,
}

impl User {
    /// A fresh user, founding its own group
    pub fn new(address: Address) -> Self {
        Self {
            address,
            referrer: None,
            referral_count: 0,
            group: address,
            eigen_layer_points: 0,
            eigenpie_points: 0,
            eigenpie_referral_points: 0,
        }
    }
}

/// A referral group sharing one boost tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Group {
    pub address: Address,
    /// Member deposits valued in base currency
    pub total_tvl: Amount,
    /// Tier multiplier derived from `total_tvl` (wad)
    pub group_boost: Amount,
}

impl Group {
    pub fn new(address: Address) -> Self {
        Self { address, total_tvl: 0, group_boost: UNITY }
    }
}

/// Rate and price data of a trackable asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LpAsset {
    pub asset: AssetId,
    /// Exchange rate to base currency (wad)
    pub price_to_base: Amount,
    /// Fraction of value attributable to the restaked leg (wad, LP tokens only)
    pub mlrt_ratio: Amount,
    pub eigen_layer_points_per_sec: Amount,
    pub eigenpie_points_per_sec: Amount,
    /// Underlying token deposited to mint this receipt, when registered
    pub underlying: Option<Address>,
    /// False while the asset only exists with default data
    pub registered: bool,
}

impl LpAsset {
    /// Asset at unity price with the given rates, not yet registered
    pub fn new(asset: AssetId, eigen_layer_points_per_sec: Amount, eigenpie_points_per_sec: Amount) -> Self {
        Self {
            asset,
            price_to_base: WAD,
            mlrt_ratio: WAD,
            eigen_layer_points_per_sec,
            eigenpie_points_per_sec,
            underlying: None,
            registered: false,
        }
    }
}

/// Accumulator state of one (group, asset) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Pool {
    pub group: Address,
    pub asset: AssetId,
    pub total_shares: Amount,
    /// Pre-deposit shares, earning Eigenpie points only
    pub total_unclaimed_shares: Amount,
    pub acc_eigen_layer_point_per_share: Amount,
    pub acc_eigenpie_point_per_share: Amount,
    pub last_reward_timestamp: Timestamp,
}

impl Pool {
    pub fn new(key: PoolKey) -> Self {
        Self {
            group: key.group,
            asset: key.asset,
            total_shares: 0,
            total_unclaimed_shares: 0,
            acc_eigen_layer_point_per_share: 0,
            acc_eigenpie_point_per_share: 0,
            last_reward_timestamp: 0,
        }
    }

    pub fn key(&self) -> PoolKey {
        PoolKey { group: self.group, asset: self.asset }
    }

    /// Claimed plus pre-deposit shares
    pub fn total_staked(&self) -> PointsResult<Amount> {
        self.total_shares
            .checked_add(self.total_unclaimed_shares)
            .ok_or(PointsError::Overflow)
    }
}

/// One user's position in one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UserBalance {
    pub group: Address,
    pub asset: AssetId,
    pub user: Address,
    pub shares: Amount,
    pub unclaimed_shares: Amount,
    /// EigenLayer accumulator value already credited
    pub eigen_layer_points_debt: Amount,
    /// Eigenpie accumulator value already credited
    pub eigenpie_points_debt: Amount,
}

impl UserBalance {
    pub fn new(key: BalanceKey) -> Self {
        Self {
            group: key.group,
            asset: key.asset,
            user: key.user,
            shares: 0,
            unclaimed_shares: 0,
            eigen_layer_points_debt: 0,
            eigenpie_points_debt: 0,
        }
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey { group: self.group, asset: self.asset, user: self.user }
    }

    /// Claimed plus pre-deposit shares
    pub fn total_staked(&self) -> PointsResult<Amount> {
        self.shares
            .checked_add(self.unclaimed_shares)
            .ok_or(PointsError::Overflow)
    }

    /// True when the row holds nothing
    pub fn is_empty(&self) -> bool {
        self.shares == 0 && self.unclaimed_shares == 0
    }
}

/// Protocol-wide singleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct GlobalState {
    /// Time-boxed multiplier currently applied (wad)
    pub global_boost: Amount,
    pub total_tvl: Amount,
    pub total_eigen_layer_points: Amount,
    pub total_eigenpie_points: Amount,
    pub total_eigenpie_referral_points: Amount,
    pub last_daily_update_timestamp: Timestamp,
    /// Number of referral log entries written so far
    pub referral_log_count: u64,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            global_boost: UNITY,
            total_tvl: 0,
            total_eigen_layer_points: 0,
            total_eigenpie_points: 0,
            total_eigenpie_referral_points: 0,
            last_daily_update_timestamp: 0,
            referral_log_count: 0,
        }
    }
}

/// Append-only audit record of one referral skim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ReferralLogEntry {
    pub id: [u8; 32],
    pub referrer: Address,
    pub referee: Address,
    /// Points credited by this harvest
    pub points_earned: Amount,
    /// Referrer's referral points after the credit
    pub points_accumulated: Amount,
    pub timestamp: Timestamp,
}
