//! Ordered, all-or-nothing settlement batches.
//!
//! The settlement legs of a liquidation run as a fixed, ordered group of
//! cross-contract operations issued on the engine's behalf. Execution is
//! fail-fast: the first failing step propagates and the host chain discards
//! every effect of the enclosing transaction.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::debug;
use twyne_chain::{CollateralPosition, IntermediateLedger};

use crate::errors::EngineError;

/// One step of a settlement batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOp {
    /// Seize the position for the engine.
    Seize,
    /// Repay the position's debt in full, pulling the target asset from the
    /// engine.
    RepayInternalDebt { amount: U256 },
    /// Redeem seized wrapped collateral into underlying for `receiver`;
    /// `U256::MAX` redeems the full redeemable balance.
    RedeemUnderlying { amount: U256, receiver: Address },
    /// Acknowledge an external force-close on the position.
    AcknowledgeExternal,
    /// Zero-amount ledger liquidation sweeping residual bad debt.
    SweepBadDebt,
}

/// What a batch produced beyond its side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Underlying released by redeem steps.
    pub redeemed: U256,
}

/// Executes batches against one position and its ledger.
pub struct BatchExecutor<'a> {
    position: &'a Arc<dyn CollateralPosition>,
    ledger: &'a Arc<dyn IntermediateLedger>,
    caller: Address,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        position: &'a Arc<dyn CollateralPosition>,
        ledger: &'a Arc<dyn IntermediateLedger>,
        caller: Address,
    ) -> Self {
        Self {
            position,
            ledger,
            caller,
        }
    }

    /// Run the steps in order, stopping at the first failure.
    pub fn execute<I>(&self, ops: I) -> Result<BatchOutcome, EngineError>
    where
        I: IntoIterator<Item = BatchOp>,
    {
        let mut outcome = BatchOutcome::default();

        for (step, op) in ops.into_iter().enumerate() {
            debug!(
                position = %self.position.address(),
                step,
                op = ?op,
                "executing batch step"
            );

            match op {
                BatchOp::Seize => self.position.liquidate(self.caller)?,
                BatchOp::RepayInternalDebt { amount } => {
                    self.position.repay(self.caller, amount)?
                }
                BatchOp::RedeemUnderlying { amount, receiver } => {
                    let released =
                        self.position
                            .redeem_underlying(self.caller, amount, receiver)?;
                    outcome.redeemed += released;
                }
                BatchOp::AcknowledgeExternal => {
                    self.position.handle_external_liquidation(self.caller)?
                }
                BatchOp::SweepBadDebt => self.ledger.liquidate(
                    self.caller,
                    self.position.address(),
                    self.position.asset(),
                    U256::ZERO,
                    U256::ZERO,
                )?,
            }
        }

        Ok(outcome)
    }
}
