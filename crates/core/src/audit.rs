//! Audit records for settled liquidations.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Which settlement path a liquidation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiquidationPath {
    /// Actively unhealthy position, dual-flashloan settlement.
    Internal,
    /// Externally force-closed position with remaining debt.
    ExternalSettlement,
    /// Externally force-closed position with no remaining debt.
    ExternalZeroDebt,
}

/// Record of one settled liquidation.
#[derive(Debug, Clone, Serialize)]
pub struct LiquidationAudit {
    pub position: Address,
    pub path: LiquidationPath,
    /// Target asset used to clear the position's debt.
    pub repaid: U256,
    /// Underlying realized from seized collateral.
    pub redeemed: U256,
    /// Target asset kept by the engine after loan repayment.
    pub profit: U256,
    pub at: DateTime<Utc>,
}

impl LiquidationAudit {
    pub fn emit(&self) {
        info!(
            position = %self.position,
            path = ?self.path,
            repaid = %self.repaid,
            redeemed = %self.redeemed,
            profit = %self.profit,
            at = %self.at,
            "liquidation settled"
        );
    }
}
