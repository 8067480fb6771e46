//! Target market seam: the external money market holding a position's debt.
//!
//! Two variants exist in the wild and they report risk differently. An
//! Euler-style vault returns risk-adjusted collateral and liability in a
//! unit of account at 18 decimals. An Aave-style pool returns raw totals in
//! 8-decimal USD plus its own pre-computed, risk-weighted health ratio. The
//! health engine owns the rescaling and combination rules; this seam only
//! reports what the market reports.

use alloy::primitives::{Address, U256};

use crate::ChainError;

/// Point-in-time account risk data, in the market's native representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSnapshot {
    /// Euler-style `accountLiquidity`: risk-adjusted values in the unit of
    /// account, 18 decimals.
    Euler {
        collateral_value: U256,
        liability_value: U256,
    },
    /// Aave-style `getUserAccountData`: 8-decimal USD bases plus the pool's
    /// own 18-decimal health ratio (risk-weighted, not simple
    /// collateral/debt).
    Aave {
        total_collateral_base: U256,
        total_debt_base: U256,
        health_factor: U256,
    },
}

/// A target market, parameterized over the two variants.
pub trait TargetMarket: Send + Sync {
    fn address(&self) -> Address;

    /// Read the account's current risk state. Never cached by callers:
    /// health is a point-in-time measurement.
    fn account_snapshot(&self, account: Address) -> Result<MarketSnapshot, ChainError>;

    /// Realize the caller's wrapped collateral claim into underlying, sent
    /// to `receiver`. Euler-style markets redeem through the collateral
    /// vault; Aave-style markets withdraw from the pool. `U256::MAX`
    /// realizes the full claim. Returns the underlying amount released.
    fn close_position(
        &self,
        caller: Address,
        amount: U256,
        receiver: Address,
    ) -> Result<U256, ChainError>;
}

impl core::fmt::Debug for dyn TargetMarket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TargetMarket").field("address", &self.address()).finish()
    }
}
