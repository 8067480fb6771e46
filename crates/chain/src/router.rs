//! Swap router seam.

use alloy::primitives::{Address, Bytes};

use crate::ChainError;

/// A router executing an opaque, off-chain-prepared swap payload.
///
/// On failure the router either reverts with its own reason (surfaced as
/// [`ChainError::CallReverted`]) or returns empty data; the engine converts
/// the latter into an explicit empty-swap failure.
pub trait SwapRouter: Send + Sync {
    fn address(&self) -> Address;

    /// Execute the payload on behalf of the caller. Returns the router's raw
    /// return data.
    fn execute(&self, caller: Address, payload: &Bytes) -> Result<Bytes, ChainError>;
}
