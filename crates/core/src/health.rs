//! Dual health-factor engine.
//!
//! A Twyne position carries two independent liquidation triggers: the
//! external health factor read from the target market's own risk model, and
//! the internal health factor read from the intermediate ledger. Either one
//! dropping below 1.0 (WAD) makes the position liquidatable. The internal
//! trigger only means something once external debt exists, since the buffer
//! covers reaction time to an external liquidation; it is gated to the
//! maximum value while external debt is zero.
//!
//! Every query reads current collaborator state; health is a point-in-time
//! measurement and is never cached.

use std::sync::Arc;

use alloy::primitives::U256;
use tracing::debug;
use twyne_chain::{CollateralPosition, ContractRegistry, MarketSnapshot};

use crate::errors::EngineError;
use crate::wad;

/// Ephemeral health reading for one position, recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    /// External trigger: buffered market health factor, WAD.
    pub ext_hf: U256,
    /// Internal trigger: LTV-weighted ledger health factor, WAD.
    pub in_hf: U256,
    /// External debt value, unit of account, 18 decimals.
    pub external_debt_value: U256,
    /// Internal liability value, unit of account, 18 decimals.
    pub internal_debt_value: U256,
}

impl HealthSnapshot {
    /// Either trigger below 1.0 marks the position liquidatable.
    pub fn is_liquidatable(&self) -> bool {
        wad::is_liquidatable(self.ext_hf) || wad::is_liquidatable(self.in_hf)
    }
}

/// Pure, read-only health computation against live market state.
pub struct HealthFactorEngine {
    registry: Arc<ContractRegistry>,
}

impl HealthFactorEngine {
    pub fn new(registry: Arc<ContractRegistry>) -> Self {
        Self { registry }
    }

    /// Raw internal health factor: `collateral * 1e18 / liability` over the
    /// ledger's risk-adjusted view of the position's liability sub-account.
    /// `U256::MAX` when the liability is zero; never errors on it.
    pub fn internal_hf(&self, position: &dyn CollateralPosition) -> Result<U256, EngineError> {
        let ledger = self.registry.ledger(position.intermediate_ledger())?;
        let (collateral, liability) = ledger.account_liquidity(position.address())?;
        Ok(wad::hf_ratio(collateral, liability))
    }

    /// Raw external health factor. Aave-style pools report their own
    /// risk-weighted ratio, reused verbatim; Euler-style vaults get the same
    /// division rule as the internal side.
    pub fn external_hf(&self, position: &dyn CollateralPosition) -> Result<U256, EngineError> {
        let market = self.registry.market(position.target_market())?;
        match market.account_snapshot(position.address())? {
            MarketSnapshot::Euler {
                collateral_value,
                liability_value,
            } => Ok(wad::hf_ratio(collateral_value, liability_value)),
            MarketSnapshot::Aave { health_factor, .. } => Ok(health_factor),
        }
    }

    /// The composite reading liquidation decisions run on.
    pub fn health(&self, position: &dyn CollateralPosition) -> Result<HealthSnapshot, EngineError> {
        let market = self.registry.market(position.target_market())?;
        let ledger = self.registry.ledger(position.intermediate_ledger())?;

        let (external_debt_value, raw_ratio) = match market.account_snapshot(position.address())? {
            MarketSnapshot::Euler {
                collateral_value,
                liability_value,
            } => (
                liability_value,
                wad::hf_ratio(collateral_value, liability_value),
            ),
            MarketSnapshot::Aave {
                total_debt_base,
                health_factor,
                ..
            } => (wad::from_aave_base(total_debt_base), health_factor),
        };

        let ext_hf = if external_debt_value.is_zero() {
            U256::MAX
        } else {
            wad::buffer_scaled(raw_ratio, position.external_liq_buffer())
        };

        let (internal_collateral, internal_debt_value) =
            ledger.account_liquidity(position.address())?;

        // The internal buffer exists to cover reaction time to an external
        // liquidation; with no external debt there is nothing to react to.
        let in_hf = if external_debt_value.is_zero() || internal_debt_value.is_zero() {
            U256::MAX
        } else {
            wad::hf_ratio(
                wad::ltv_weighted(internal_collateral, position.internal_liq_ltv()),
                internal_debt_value,
            )
        };

        debug!(
            position = %position.address(),
            ext_hf = %ext_hf,
            in_hf = %in_hf,
            external_debt = %external_debt_value,
            internal_debt = %internal_debt_value,
            "health snapshot"
        );

        Ok(HealthSnapshot {
            ext_hf,
            in_hf,
            external_debt_value,
            internal_debt_value,
        })
    }
}
