//! Restaking Points Common Library
//!
//! Shared types, constants, and utilities for every crate of the points
//! engine. Nothing in here touches storage: the functions are pure and the
//! types are plain owned values that the ledger persists.
//!
//! ## Accounting model
//!
//! Points accrue per (group, asset) pool using an accumulator-per-share:
//! - **Wad math**: every quantity is a fixed-point integer scaled by 1e18
//! - **Two point tracks**: EigenLayer points (claimed shares, after launch)
//!   and Eigenpie points (claimed + pre-deposit shares, boosted)
//! - **Group boost**: tiered multiplier from a referral group's TVL
//! - **Global boost**: time-boxed multiplier from a fixed schedule
//! - **Referral skim**: a fixed share of every Eigenpie harvest is credited
//!   to the harvester's referrer
//!
//! ## Modules
//!
//! - [`constants`]: protocol constants and mainnet addresses
//! - [`errors`]: typed errors with stable codes
//! - [`types`]: addresses, keys and persisted entities
//! - [`math`]: checked wad arithmetic over 256-bit intermediates
//! - [`boost`]: group tier and global schedule multipliers
//! - [`config`]: engine configuration with mainnet defaults
//! - [`events`]: engine event log

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod boost;
pub mod config;
pub mod events;

// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use math::*;
pub use boost::*;
pub use config::*;
pub use events::*;
