//! Collateral position (Twyne collateral vault) seam and its factory.

use alloy::primitives::{Address, U256};

use crate::ChainError;

/// One borrower's collateral vault: a deposit of wrapped collateral backing a
/// borrow in an external target market, buffered by the intermediate ledger.
///
/// Address getters are constant for the lifetime of the position; state reads
/// hit live chain state. Mutating legs take the acting account explicitly,
/// standing in for `msg.sender`.
pub trait CollateralPosition: Send + Sync {
    fn address(&self) -> Address;

    /// The wrapped collateral receipt token the deposit is denominated in.
    fn asset(&self) -> Address;

    /// The underlying token behind the wrapped collateral.
    fn underlying_asset(&self) -> Address;

    /// The asset borrowed from the target market.
    fn target_asset(&self) -> Address;

    fn target_market(&self) -> Address;

    fn intermediate_ledger(&self) -> Address;

    /// Internal liquidation LTV, 4-decimal fixed point (10_000 = 100%).
    fn internal_liq_ltv(&self) -> u16;

    /// External liquidation buffer, 4-decimal fixed point (10_000 = 1.0x).
    fn external_liq_buffer(&self) -> u16;

    fn can_liquidate(&self) -> Result<bool, ChainError>;

    /// Whether the target market already force-closed this position. Once
    /// set, the position can only be resolved through the external
    /// settlement path.
    fn is_externally_liquidated(&self) -> Result<bool, ChainError>;

    /// Maximum repayable debt, in the target asset.
    fn max_repay(&self) -> Result<U256, ChainError>;

    /// Wrapped collateral still reserved against the intermediate ledger.
    fn max_release(&self) -> Result<U256, ChainError>;

    /// Full wrapped deposit, owned plus reserved.
    fn total_assets_deposited_or_reserved(&self) -> Result<U256, ChainError>;

    /// The position's own split formula: how many wrapped units belong to
    /// the violator given the external debt value and the position's
    /// collateral value, both in the unit of account.
    fn collateral_for_borrower(
        &self,
        debt_value: U256,
        collateral_value: U256,
    ) -> Result<U256, ChainError>;

    /// Seize the position for the acting account.
    fn liquidate(&self, caller: Address) -> Result<(), ChainError>;

    /// Repay position debt, pulling the target asset from the caller.
    fn repay(&self, caller: Address, amount: U256) -> Result<(), ChainError>;

    /// Redeem seized wrapped collateral into underlying for `receiver`.
    /// `U256::MAX` redeems the full redeemable balance. Returns the amount
    /// of underlying released.
    fn redeem_underlying(
        &self,
        caller: Address,
        amount: U256,
        receiver: Address,
    ) -> Result<U256, ChainError>;

    /// Acknowledge an external force-close, settling remaining debt from the
    /// caller and releasing remaining collateral per the position's own
    /// accounting.
    fn handle_external_liquidation(&self, caller: Address) -> Result<(), ChainError>;
}

/// Membership gate: only positions created by the factory may be liquidated.
pub trait PositionFactory: Send + Sync {
    fn is_recognized_position(&self, position: Address) -> bool;
}
