//! Chain Inputs
//!
//! Decoded protocol events as the indexing host delivers them, one per
//! block log, in canonical chain order.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use points_common::{Address, Amount, Timestamp};

/// An indexed protocol event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum ChainEvent {
    // ============ Protocol Config ============

    /// A receipt token was added or replaced for an underlying LST
    AssetRegistered {
        receipt: Address,
        underlying: Address,
        timestamp: Timestamp,
    },

    // ============ Staking ============

    /// An underlying LST was deposited and receipt shares minted
    AssetDeposited {
        depositor: Address,
        /// Zero when the deposit carries no referral
        referral: Address,
        /// Deposited underlying token
        asset: Address,
        amount: Amount,
        minted_shares: Amount,
        is_pre_deposit: bool,
        timestamp: Timestamp,
    },

    /// Receipt token transfer
    MlrtTransferred {
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
        timestamp: Timestamp,
    },

    // ============ Liquidity Pools ============

    /// LP token transfer, mints and burns included
    LiquidityPoolTransferred {
        pool: Address,
        sender: Address,
        receiver: Address,
        amount: Amount,
        timestamp: Timestamp,
    },

    /// Reserves moved (liquidity added or removed, or a trade)
    LiquidityPoolRebalanced {
        pool: Address,
        timestamp: Timestamp,
    },

    // ============ Price Provider ============

    /// New receipt-to-underlying exchange rate (wad)
    ExchangeRateUpdated {
        receipt: Address,
        underlying: Address,
        new_rate: Amount,
        timestamp: Timestamp,
    },

    // ============ External Staking Venues ============

    ExternalDeposit {
        venue: Address,
        token: Address,
        depositor: Address,
        amount: Amount,
        timestamp: Timestamp,
    },

    ExternalWithdraw {
        venue: Address,
        token: Address,
        depositor: Address,
        amount: Amount,
        timestamp: Timestamp,
    },
}

impl ChainEvent {
    /// Block timestamp of the event
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::AssetRegistered { timestamp, .. }
            | Self::AssetDeposited { timestamp, .. }
            | Self::MlrtTransferred { timestamp, .. }
            | Self::LiquidityPoolTransferred { timestamp, .. }
            | Self::LiquidityPoolRebalanced { timestamp, .. }
            | Self::ExchangeRateUpdated { timestamp, .. }
            | Self::ExternalDeposit { timestamp, .. }
            | Self::ExternalWithdraw { timestamp, .. } => *timestamp,
        }
    }

    /// Short name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssetRegistered { .. } => "asset_registered",
            Self::AssetDeposited { .. } => "asset_deposited",
            Self::MlrtTransferred { .. } => "mlrt_transferred",
            Self::LiquidityPoolTransferred { .. } => "lp_transferred",
            Self::LiquidityPoolRebalanced { .. } => "lp_rebalanced",
            Self::ExchangeRateUpdated { .. } => "exchange_rate_updated",
            Self::ExternalDeposit { .. } => "external_deposit",
            Self::ExternalWithdraw { .. } => "external_withdraw",
        }
    }
}
