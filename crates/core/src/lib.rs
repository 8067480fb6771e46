//! Twyne liquidation engine.
//!
//! This crate provides the core of the layered-protocol liquidator:
//! - WAD fixed-point health arithmetic with zero-liability and saturation rules
//! - The dual health-factor engine (external market trigger + internal buffer trigger)
//! - The flash-capital liquidation orchestrator and its callback router
//! - Ordered, fail-fast batch execution of settlement legs
//! - Scoped token approvals with guaranteed teardown
//! - Owner-restricted maintenance operations and audit records
//! - TOML engine configuration
//!
//! Execution is single-threaded per transaction: the only suspension points
//! are the capital provider's synchronous re-entrant callbacks, modeled here
//! as call-stack re-entry into the orchestrator.

mod approvals;
mod audit;
mod batch;
mod callback;
pub mod config;
mod errors;
mod health;
mod orchestrator;
pub mod wad;

pub use approvals::ApprovalScope;
pub use audit::{LiquidationAudit, LiquidationPath};
pub use batch::{BatchExecutor, BatchOp, BatchOutcome};
pub use callback::{CallbackContext, CapitalProvider, FlashLoanReceiver};
pub use config::{EngineConfig, ResolvedEngineConfig};
pub use errors::EngineError;
pub use health::{HealthFactorEngine, HealthSnapshot};
pub use orchestrator::{EnginePhase, LiquidationOrchestrator};
