//! Engine Events
//!
//! Events are emitted while an input event is processed and returned to the
//! host alongside the notices, so an indexer can build audit trails or
//! dashboards without diffing the ledger.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, AssetId, Timestamp};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Position Events (0x01 - 0x1F)
    Deposited = 0x01,
    Withdrawn = 0x02,
    PointsHarvested = 0x03,

    // Referral Events (0x20 - 0x3F)
    ReferralLinked = 0x20,
    GroupsMerged = 0x21,

    // Pool Events (0x40 - 0x5F)
    PoolsSwept = 0x40,
    GlobalBoostChanged = 0x41,

    // Asset Events (0x60 - 0x7F)
    AssetRegistered = 0x60,
    AssetRepriced = 0x61,
}

/// Main event enum containing all engine events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PointsEvent {
    // ============ Position Events ============

    /// Shares credited to a user's balance
    Deposited {
        group: Address,
        asset: AssetId,
        user: Address,
        shares: Amount,
        is_pre_deposit: bool,
        group_tvl: Amount,
        timestamp: Timestamp,
    },

    /// Shares removed from a user's balance
    Withdrawn {
        group: Address,
        asset: AssetId,
        user: Address,
        shares: Amount,
        is_pre_deposit: bool,
        group_tvl: Amount,
        timestamp: Timestamp,
    },

    /// Pending points credited to a user
    PointsHarvested {
        user: Address,
        asset: AssetId,
        eigen_layer_points: Amount,
        eigenpie_points: Amount,
        referral_skim: Amount,
        timestamp: Timestamp,
    },

    // ============ Referral Events ============

    /// Depositor linked to a referrer
    ReferralLinked {
        referee: Address,
        referrer: Address,
        timestamp: Timestamp,
    },

    /// Source group folded into target
    GroupsMerged {
        source: Address,
        target: Address,
        members_moved: u32,
        balances_moved: u32,
        timestamp: Timestamp,
    },

    // ============ Pool Events ============

    /// Full settlement sweep over every known pool
    PoolsSwept {
        pools: u32,
        timestamp: Timestamp,
    },

    /// Global boost moved to a new schedule window
    GlobalBoostChanged {
        old_boost: Amount,
        new_boost: Amount,
        timestamp: Timestamp,
    },

    // ============ Asset Events ============

    /// Receipt linked to its underlying
    AssetRegistered {
        asset: AssetId,
        underlying: Address,
        timestamp: Timestamp,
    },

    /// New price (and for LP tokens, mLRT ratio) applied to an asset
    AssetRepriced {
        asset: AssetId,
        old_price: Amount,
        new_price: Amount,
        mlrt_ratio: Amount,
        timestamp: Timestamp,
    },
}

impl PointsEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Deposited { .. } => EventType::Deposited,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::PointsHarvested { .. } => EventType::PointsHarvested,
            Self::ReferralLinked { .. } => EventType::ReferralLinked,
            Self::GroupsMerged { .. } => EventType::GroupsMerged,
            Self::PoolsSwept { .. } => EventType::PoolsSwept,
            Self::GlobalBoostChanged { .. } => EventType::GlobalBoostChanged,
            Self::AssetRegistered { .. } => EventType::AssetRegistered,
            Self::AssetRepriced { .. } => EventType::AssetRepriced,
        }
    }

    /// Get the block timestamp of the event
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Deposited { timestamp, .. }
            | Self::Withdrawn { timestamp, .. }
            | Self::PointsHarvested { timestamp, .. }
            | Self::ReferralLinked { timestamp, .. }
            | Self::GroupsMerged { timestamp, .. }
            | Self::PoolsSwept { timestamp, .. }
            | Self::GlobalBoostChanged { timestamp, .. }
            | Self::AssetRegistered { timestamp, .. }
            | Self::AssetRepriced { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events while one input is processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<PointsEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: PointsEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[PointsEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<PointsEvent> {
        self.events
    }

    /// Move every event of `other` to the end of this log
    pub fn append(&mut self, other: &mut EventLog) {
        self.events.append(&mut other.events);
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&PointsEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
