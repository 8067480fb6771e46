//! Receipt vault seam: the ERC-4626-style wrapper for the collateral asset.

use alloy::primitives::{Address, U256};

use crate::ChainError;

/// Mint-side subset of the wrapped collateral vault. The engine mints
/// receipt units for the violator during settlement; redemption flows back
/// through the position or the target market.
pub trait ReceiptVault: Send + Sync {
    fn address(&self) -> Address;

    /// Underlying required to mint exactly `shares` receipt units.
    fn preview_mint(&self, shares: U256) -> Result<U256, ChainError>;

    /// Mint exactly `shares` receipt units to `receiver`, pulling the
    /// required underlying from the caller. Returns the underlying consumed.
    fn mint(&self, caller: Address, shares: U256, receiver: Address) -> Result<U256, ChainError>;
}
