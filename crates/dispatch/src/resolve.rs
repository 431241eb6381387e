//! Address and price resolution
//!
//! Lookups that can fall back to a default. A fallback never fails the
//! event; it is reported as a notice and logged at warn level.

use points_common::{Address, Amount, AssetId, PointsError};
use points_ledger::LedgerStore;

use crate::oracle::PriceOracle;
use crate::DispatchContext;

impl<S: LedgerStore, O: PriceOracle> DispatchContext<'_, S, O> {
    /// Receipt token minted for deposits of `underlying`
    ///
    /// Configured mappings win over registered assets. With neither, the
    /// underlying itself is used as the key and an `UnknownAsset` notice is
    /// recorded.
    pub fn resolve_receipt(&mut self, underlying: Address) -> Address {
        if let Some(receipt) = self.config.receipt_for(&underlying) {
            return receipt;
        }
        if let Some(asset) = self.accrual.store().lp_asset_by_underlying(&underlying) {
            return asset.asset.token();
        }

        log::warn!("no receipt token known for underlying {}", underlying);
        self.notice(PointsError::UnknownAsset { asset: AssetId::Token(underlying) });
        underlying
    }

    /// Base-currency price of `token`, or the configured default
    pub fn base_price(&mut self, token: Address) -> Amount {
        match self.oracle.base_price(&token) {
            Some(price) => price,
            None => {
                log::warn!(
                    "no base price for {}, using default {}",
                    token,
                    self.config.default_price
                );
                self.notice(PointsError::MissingPriceData { token });
                self.config.default_price
            }
        }
    }

    /// Group `user` currently belongs to, creating the user if needed
    pub fn group_of(&mut self, user: Address) -> Address {
        self.accrual.store_mut().load_or_create_user(user).group
    }

    /// Whether receipt transfers to or from `holder` accrue points
    pub fn tracks_holder(&self, holder: &Address) -> bool {
        !self.config.is_excluded_holder(holder)
    }

    pub(crate) fn notice(&mut self, notice: PointsError) {
        self.notices.push(notice);
    }
}
