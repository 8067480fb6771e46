//! Flash-capital liquidation orchestrator.
//!
//! Top-level state machine for liquidating Twyne collateral positions
//! without pre-funded capital. Both settlement paths are financed entirely
//! by flash loans; the capital provider drives re-entry into the engine
//! through the callback entry point, so the whole sequence is a call-stack
//! continuation: control leaves the orchestrator, runs the continuation,
//! and must return before the provider resumes.
//!
//! There is no separate re-entrancy lock. The provider synchronously owns
//! the call stack for the loan's duration, and the callback gate only
//! admits the provider itself. Across competing liquidators, the position's
//! own guards reject late entrants; that rejection surfaces here as an
//! ordinary eligibility failure.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use chrono::Utc;
use tracing::{info, instrument, warn};
use twyne_chain::{
    safe_transfer, ChainError, CollateralPosition, ContractRegistry, IntermediateLedger,
    PositionFactory, QuoteOracle, ReceiptVault, SwapRouter, TargetMarket, Token, NATIVE_ASSET,
};

use crate::approvals::ApprovalScope;
use crate::audit::{LiquidationAudit, LiquidationPath};
use crate::batch::{BatchExecutor, BatchOp};
use crate::callback::{CallbackContext, CapitalProvider, FlashLoanReceiver};
use crate::errors::EngineError;
use crate::health::HealthFactorEngine;

/// Where the engine currently is in a liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Validating,
    AwaitingOuterLoan,
    AwaitingInnerLoan,
    Settling,
    ProfitCheck,
}

/// Collaborator handles and running totals for the liquidation in flight.
///
/// The callback context carries only value data; this is where the live
/// handles stay, on the orchestrator's own stack frame for the duration of
/// the top-level call.
struct ActiveLiquidation {
    position: Arc<dyn CollateralPosition>,
    market: Arc<dyn TargetMarket>,
    ledger: Arc<dyn IntermediateLedger>,
    receipt_vault: Arc<dyn ReceiptVault>,
    target_token: Arc<dyn Token>,
    underlying_token: Arc<dyn Token>,
    max_repay: U256,
    repaid: U256,
    redeemed: U256,
}

pub struct LiquidationOrchestrator {
    /// The engine's own account.
    engine: Address,
    /// Sole maintenance authority and sweep recipient.
    owner: Address,
    registry: Arc<ContractRegistry>,
    factory: Arc<dyn PositionFactory>,
    provider: Arc<dyn CapitalProvider>,
    router: Arc<dyn SwapRouter>,
    oracle: Arc<dyn QuoteOracle>,
    health: HealthFactorEngine,
    phase: EnginePhase,
    active: Option<ActiveLiquidation>,
}

impl LiquidationOrchestrator {
    pub fn new(
        engine: Address,
        owner: Address,
        registry: Arc<ContractRegistry>,
        factory: Arc<dyn PositionFactory>,
        provider: Arc<dyn CapitalProvider>,
        router: Arc<dyn SwapRouter>,
        oracle: Arc<dyn QuoteOracle>,
    ) -> Self {
        let health = HealthFactorEngine::new(registry.clone());
        Self {
            engine,
            owner,
            registry,
            factory,
            provider,
            router,
            oracle,
            health,
            phase: EnginePhase::Idle,
            active: None,
        }
    }

    pub fn address(&self) -> Address {
        self.engine
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Read-only access to the health engine backing eligibility decisions.
    pub fn health_engine(&self) -> &HealthFactorEngine {
        &self.health
    }

    /// Liquidate an actively unhealthy position.
    ///
    /// `flash_amount` sizes the nested underlying-collateral loan and is
    /// supplied by the caller, which knows how much headroom the mint leg
    /// needs. Reverts with no effect if the position is unrecognized, not
    /// liquidatable, already force-closed externally, or if realized profit
    /// ends up below `min_profit`.
    #[instrument(skip(self, swap_payload), fields(engine = %self.engine))]
    pub fn liquidate_position(
        &mut self,
        position: Address,
        flash_amount: U256,
        swap_payload: Bytes,
        min_profit: U256,
    ) -> Result<U256, EngineError> {
        let result = self.run_internal(position, flash_amount, swap_payload, min_profit);
        self.active = None;
        self.phase = EnginePhase::Idle;
        result
    }

    /// Settle a position the target market already force-closed.
    #[instrument(skip(self, swap_payload), fields(engine = %self.engine))]
    pub fn liquidate_externally_liquidated_position(
        &mut self,
        position: Address,
        swap_payload: Bytes,
        min_profit: U256,
    ) -> Result<U256, EngineError> {
        let result = self.run_external(position, swap_payload, min_profit);
        self.active = None;
        self.phase = EnginePhase::Idle;
        result
    }

    fn run_internal(
        &mut self,
        position: Address,
        flash_amount: U256,
        swap_payload: Bytes,
        min_profit: U256,
    ) -> Result<U256, EngineError> {
        self.phase = EnginePhase::Validating;

        if !self.factory.is_recognized_position(position) {
            return Err(EngineError::UnrecognizedPosition(position));
        }
        let position = self.registry.position(position)?;
        let address = position.address();

        // A force-closed position resolves only through the external path.
        if position.is_externally_liquidated()? {
            return Err(EngineError::ExternallyLiquidated(address));
        }
        if !position.can_liquidate()? {
            return Err(EngineError::NotLiquidatable(address));
        }

        let active = self.resolve(position)?;
        let target_token = active.target_token.clone();
        let loan = active.max_repay;
        let pre_balance = target_token.balance_of(self.engine);

        info!(
            position = %address,
            loan = %loan,
            flash_amount = %flash_amount,
            "starting internal liquidation"
        );

        let _approvals = ApprovalScope::open(
            self.engine,
            [
                (active.target_token.clone(), address),
                (active.underlying_token.clone(), self.router.address()),
                (
                    active.underlying_token.clone(),
                    active.receipt_vault.address(),
                ),
            ],
        )?;

        let context = CallbackContext::OuterInternal {
            position: address,
            collateral_flash_amount: flash_amount,
            swap_payload,
        };

        self.active = Some(active);
        self.phase = EnginePhase::AwaitingOuterLoan;

        let provider = self.provider.clone();
        provider.flash_loan(self, target_token.address(), loan, context.encode())?;

        self.phase = EnginePhase::ProfitCheck;
        let profit = self.check_profit(&target_token, pre_balance, min_profit)?;
        self.emit_audit(address, LiquidationPath::Internal, profit);
        Ok(profit)
    }

    fn run_external(
        &mut self,
        position: Address,
        swap_payload: Bytes,
        min_profit: U256,
    ) -> Result<U256, EngineError> {
        self.phase = EnginePhase::Validating;

        if !self.factory.is_recognized_position(position) {
            return Err(EngineError::UnrecognizedPosition(position));
        }
        let position = self.registry.position(position)?;
        let address = position.address();

        if !position.is_externally_liquidated()? {
            return Err(EngineError::NotExternallyLiquidated(address));
        }

        let active = self.resolve(position)?;
        let max_repay = active.max_repay;

        if max_repay.is_zero() {
            // Nothing left to repay: acknowledge the force-close and sweep
            // residual bad debt. No flash capital, no debt to arbitrage.
            info!(position = %address, "settling external liquidation with zero debt");
            self.phase = EnginePhase::Settling;
            BatchExecutor::new(&active.position, &active.ledger, self.engine)
                .execute([BatchOp::AcknowledgeExternal, BatchOp::SweepBadDebt])?;

            self.phase = EnginePhase::ProfitCheck;
            let profit = U256::ZERO;
            if profit < min_profit {
                return Err(EngineError::ProfitShortfall {
                    realized: profit,
                    minimum: min_profit,
                });
            }
            self.emit_audit(address, LiquidationPath::ExternalZeroDebt, profit);
            return Ok(profit);
        }

        let target_token = active.target_token.clone();
        let pre_balance = target_token.balance_of(self.engine);

        info!(
            position = %address,
            loan = %max_repay,
            "starting external settlement"
        );

        let _approvals = ApprovalScope::open(
            self.engine,
            [
                (active.target_token.clone(), address),
                (active.underlying_token.clone(), self.router.address()),
            ],
        )?;

        let context = CallbackContext::ExternalSettlement {
            position: address,
            swap_payload,
        };

        self.active = Some(active);
        self.phase = EnginePhase::AwaitingOuterLoan;

        let provider = self.provider.clone();
        provider.flash_loan(self, target_token.address(), max_repay, context.encode())?;

        self.phase = EnginePhase::ProfitCheck;
        let profit = self.check_profit(&target_token, pre_balance, min_profit)?;
        self.emit_audit(address, LiquidationPath::ExternalSettlement, profit);
        Ok(profit)
    }

    /// Resolve the position's collaborators into live handles.
    fn resolve(
        &self,
        position: Arc<dyn CollateralPosition>,
    ) -> Result<ActiveLiquidation, EngineError> {
        let market = self.registry.market(position.target_market())?;
        let ledger = self.registry.ledger(position.intermediate_ledger())?;
        let receipt_vault = self.registry.vault(position.asset())?;
        let target_token = self.registry.token(position.target_asset())?;
        let underlying_token = self.registry.token(position.underlying_asset())?;
        let max_repay = position.max_repay()?;

        Ok(ActiveLiquidation {
            position,
            market,
            ledger,
            receipt_vault,
            target_token,
            underlying_token,
            max_repay,
            repaid: U256::ZERO,
            redeemed: U256::ZERO,
        })
    }

    /// First continuation: outer target-asset loan received, take the nested
    /// underlying loan.
    fn continue_outer_internal(
        &mut self,
        amount: U256,
        collateral_flash_amount: U256,
        swap_payload: Bytes,
    ) -> Result<(), EngineError> {
        let (position, target_token, underlying_token) = {
            let active = self.active.as_ref().ok_or(EngineError::UnexpectedCallback)?;
            (
                active.position.address(),
                active.target_token.clone(),
                active.underlying_token.clone(),
            )
        };

        self.phase = EnginePhase::AwaitingInnerLoan;
        let context = CallbackContext::InnerInternal {
            position,
            swap_payload,
        };

        let provider = self.provider.clone();
        provider.flash_loan(
            self,
            underlying_token.address(),
            collateral_flash_amount,
            context.encode(),
        )?;

        // Inner settlement done; return the outer loan before this frame
        // ends.
        safe_transfer(
            target_token.as_ref(),
            self.engine,
            self.provider.address(),
            amount,
        )?;
        Ok(())
    }

    /// Second continuation: underlying loan received, settle the position.
    fn continue_inner_internal(
        &mut self,
        amount: U256,
        swap_payload: Bytes,
    ) -> Result<(), EngineError> {
        self.phase = EnginePhase::Settling;

        let (position, ledger, receipt_vault, underlying_token, max_repay) = {
            let active = self.active.as_ref().ok_or(EngineError::UnexpectedCallback)?;
            (
                active.position.clone(),
                active.ledger.clone(),
                active.receipt_vault.clone(),
                active.underlying_token.clone(),
                active.max_repay,
            )
        };

        // Size the violator's claim off the live external debt and the
        // position's collateral value in the unit of account.
        let debt_value = self.health.health(position.as_ref())?.external_debt_value;
        let wrapped_deposit = position.total_assets_deposited_or_reserved()?;
        let collateral_value =
            self.oracle
                .quote(wrapped_deposit, position.asset(), ledger.unit_of_account())?;

        let borrower_claim = position.collateral_for_borrower(debt_value, collateral_value)?;

        // The caller sized the underlying loan; make sure it actually covers
        // the mint before touching the position.
        let required = receipt_vault.preview_mint(borrower_claim)?;
        if required > amount {
            return Err(EngineError::Chain(ChainError::InsufficientBalance {
                token: underlying_token.address(),
                holder: self.engine,
                have: amount,
                need: required,
            }));
        }

        let minted = receipt_vault.mint(self.engine, borrower_claim, position.address())?;

        info!(
            position = %position.address(),
            debt_value = %debt_value,
            collateral_value = %collateral_value,
            borrower_claim = %borrower_claim,
            minted = %minted,
            "settling internal liquidation"
        );

        let outcome = BatchExecutor::new(&position, &ledger, self.engine).execute([
            BatchOp::Seize,
            BatchOp::RepayInternalDebt { amount: max_repay },
            BatchOp::RedeemUnderlying {
                amount: U256::MAX,
                receiver: self.engine,
            },
        ])?;

        if !swap_payload.is_empty() {
            self.run_swap(&swap_payload)?;
        }

        if let Some(active) = self.active.as_mut() {
            active.repaid = max_repay;
            active.redeemed = outcome.redeemed;
        }

        // Return the underlying loan before this frame ends.
        safe_transfer(
            underlying_token.as_ref(),
            self.engine,
            self.provider.address(),
            amount,
        )?;
        Ok(())
    }

    /// Continuation for force-closed positions with remaining debt.
    fn continue_external_settlement(
        &mut self,
        amount: U256,
        swap_payload: Bytes,
    ) -> Result<(), EngineError> {
        self.phase = EnginePhase::Settling;

        let (position, market, ledger, target_token) = {
            let active = self.active.as_ref().ok_or(EngineError::UnexpectedCallback)?;
            (
                active.position.clone(),
                active.market.clone(),
                active.ledger.clone(),
                active.target_token.clone(),
            )
        };

        BatchExecutor::new(&position, &ledger, self.engine)
            .execute([BatchOp::AcknowledgeExternal, BatchOp::SweepBadDebt])?;

        // The acknowledge step released the liquidator's wrapped reward;
        // realize it into underlying through the market itself.
        let realized = market.close_position(self.engine, U256::MAX, self.engine)?;

        info!(
            position = %position.address(),
            repaid = %amount,
            realized = %realized,
            "settled external liquidation"
        );

        if !swap_payload.is_empty() {
            self.run_swap(&swap_payload)?;
        }

        if let Some(active) = self.active.as_mut() {
            active.repaid = amount;
            active.redeemed = realized;
        }

        safe_transfer(
            target_token.as_ref(),
            self.engine,
            self.provider.address(),
            amount,
        )?;
        Ok(())
    }

    fn run_swap(&self, payload: &Bytes) -> Result<(), EngineError> {
        match self.router.execute(self.engine, payload) {
            Ok(ret) if ret.is_empty() => Err(EngineError::EmptySwapReturn),
            Ok(_) => Ok(()),
            // Re-raise the router's own reason verbatim for diagnosis.
            Err(err) => Err(EngineError::SwapFailed {
                reason: err.to_string(),
            }),
        }
    }

    fn check_profit(
        &self,
        target_token: &Arc<dyn Token>,
        pre_balance: U256,
        min_profit: U256,
    ) -> Result<U256, EngineError> {
        let balance = target_token.balance_of(self.engine);
        let profit = balance.saturating_sub(pre_balance);
        if profit < min_profit {
            warn!(
                realized = %profit,
                minimum = %min_profit,
                "profit shortfall, unwinding liquidation"
            );
            return Err(EngineError::ProfitShortfall {
                realized: profit,
                minimum: min_profit,
            });
        }
        Ok(profit)
    }

    fn emit_audit(&self, position: Address, path: LiquidationPath, profit: U256) {
        let (repaid, redeemed) = self
            .active
            .as_ref()
            .map(|active| (active.repaid, active.redeemed))
            .unwrap_or((U256::ZERO, U256::ZERO));

        LiquidationAudit {
            position,
            path,
            repaid,
            redeemed,
            profit,
            at: Utc::now(),
        }
        .emit();
    }

    // Owner-restricted maintenance, independent of the liquidation state
    // machine.

    /// Transfer residual token balance to the owner.
    pub fn sweep(&self, caller: Address, token: Address, amount: U256) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        let token = self.registry.token(token)?;
        safe_transfer(token.as_ref(), self.engine, self.owner, amount)?;
        Ok(())
    }

    /// Transfer residual native balance to the owner.
    pub fn sweep_eth(&self, caller: Address, amount: U256) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        let native = self.registry.token(NATIVE_ASSET)?;
        safe_transfer(native.as_ref(), self.engine, self.owner, amount)?;
        Ok(())
    }

    /// Point the engine at a new swap router.
    pub fn set_router(
        &mut self,
        caller: Address,
        router: Arc<dyn SwapRouter>,
    ) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        if router.address().is_zero() {
            return Err(EngineError::ZeroAddress);
        }
        info!(router = %router.address(), "router updated");
        self.router = router;
        Ok(())
    }

    fn require_owner(&self, caller: Address) -> Result<(), EngineError> {
        if caller != self.owner {
            return Err(EngineError::Unauthorized { caller });
        }
        Ok(())
    }
}

impl FlashLoanReceiver for LiquidationOrchestrator {
    /// Provider-only entry point. Anything not attested as coming from the
    /// capital provider is rejected before the payload is even decoded.
    fn on_flash_loan(
        &mut self,
        caller: Address,
        _token: Address,
        amount: U256,
        data: &Bytes,
    ) -> Result<(), EngineError> {
        if caller != self.provider.address() {
            return Err(EngineError::Unauthorized { caller });
        }

        let context = CallbackContext::decode(data)?;

        let expected = self
            .active
            .as_ref()
            .ok_or(EngineError::UnexpectedCallback)?
            .position
            .address();
        if context.position() != expected {
            return Err(EngineError::CallbackPositionMismatch {
                expected,
                got: context.position(),
            });
        }

        match context {
            CallbackContext::OuterInternal {
                collateral_flash_amount,
                swap_payload,
                ..
            } => self.continue_outer_internal(amount, collateral_flash_amount, swap_payload),
            CallbackContext::InnerInternal { swap_payload, .. } => {
                self.continue_inner_internal(amount, swap_payload)
            }
            CallbackContext::ExternalSettlement { swap_payload, .. } => {
                self.continue_external_settlement(amount, swap_payload)
            }
        }
    }
}
