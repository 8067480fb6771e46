//! Engine error taxonomy.
//!
//! Every error is propagate-only: the model is "succeed completely and
//! profitably, or have no effect at all". Rollback of tentative transfers is
//! the host chain's job; deciding whether to retry with adjusted parameters
//! belongs to the off-chain scheduler, not this layer.

use alloy::primitives::{Address, U256};
use thiserror::Error;
use twyne_chain::{ChainError, TokenCallError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller is not the capital provider on the callback path, or not the
    /// owner on maintenance operations.
    #[error("caller {caller} is not authorized")]
    Unauthorized { caller: Address },

    /// Target was not created by the position factory.
    #[error("{0} is not a recognized collateral position")]
    UnrecognizedPosition(Address),

    /// Position is not currently liquidatable.
    #[error("position {0} is not liquidatable")]
    NotLiquidatable(Address),

    /// External settlement requested for a position the target market has
    /// not force-closed.
    #[error("position {0} has not been externally liquidated")]
    NotExternallyLiquidated(Address),

    /// Internal liquidation requested for a force-closed position; those
    /// resolve only through the external settlement path.
    #[error("position {0} was externally liquidated; use the external settlement path")]
    ExternallyLiquidated(Address),

    /// Realized profit below the caller-declared minimum. Fatal at the end
    /// of the sequence; atomicity unwinds the liquidation itself.
    #[error("realized profit {realized} below caller minimum {minimum}")]
    ProfitShortfall { realized: U256, minimum: U256 },

    /// The swap router failed with its own reason, re-raised verbatim.
    #[error("swap router failed: {reason}")]
    SwapFailed { reason: String },

    /// The swap router returned no data.
    #[error("swap router returned no data")]
    EmptySwapReturn,

    /// Callback payload carried a discriminant outside the known set.
    #[error("unknown callback tag {0}")]
    UnknownCallbackTag(u8),

    /// Callback payload could not be decoded.
    #[error("malformed callback payload: {0}")]
    MalformedPayload(String),

    /// Provider callback arrived while no liquidation is in flight.
    #[error("callback received outside an active liquidation")]
    UnexpectedCallback,

    /// Callback context names a different position than the one in flight.
    #[error("callback context names {got}, active liquidation is {expected}")]
    CallbackPositionMismatch { expected: Address, got: Address },

    /// Zero address supplied where a contract address is required.
    #[error("zero address where a contract address is required")]
    ZeroAddress,

    /// Non-standard token approve/transfer semantics.
    #[error(transparent)]
    TokenCall(#[from] TokenCallError),

    /// A collaborator contract call failed.
    #[error(transparent)]
    Chain(#[from] ChainError),
}
