//! Intermediate ledger seam: Twyne's internal buffer accounting.

use alloy::primitives::{Address, U256};

use crate::ChainError;

/// The intermediate vault tracking how much of a position's deposit is
/// reserved against internal borrowing. Source of the internal health
/// factor.
pub trait IntermediateLedger: Send + Sync {
    fn address(&self) -> Address;

    /// The valuation currency collateral and liability are compared in.
    fn unit_of_account(&self) -> Address;

    /// Risk-adjusted `(collateral, liability)` for the position's liability
    /// sub-account, in the unit of account at 18 decimals.
    fn account_liquidity(&self, account: Address) -> Result<(U256, U256), ChainError>;

    /// Liquidate a violator on the ledger. A zero `repay_assets` sweeps
    /// residual bad debt without repaying anything.
    fn liquidate(
        &self,
        caller: Address,
        violator: Address,
        collateral: Address,
        repay_assets: U256,
        min_yield: U256,
    ) -> Result<(), ChainError>;
}
