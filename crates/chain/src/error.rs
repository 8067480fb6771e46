//! Error type for collaborator contract calls.

use alloy::primitives::{Address, U256};
use thiserror::Error;

/// Failure of a call into a collaborator contract.
///
/// Every variant maps to a revert on the host chain: the enclosing
/// transaction is discarded, so callers only ever propagate these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The callee reverted with a reason string.
    #[error("call to {contract} reverted: {reason}")]
    CallReverted { contract: Address, reason: String },

    /// No contract is registered under the given address.
    #[error("no contract registered at {0}")]
    UnknownContract(Address),

    /// A transfer or pull exceeded the holder's balance.
    #[error("insufficient balance of {token} for {holder}: have {have}, need {need}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        have: U256,
        need: U256,
    },

    /// A pull exceeded the spender's allowance.
    #[error("insufficient allowance of {token} granted by {owner} to {spender}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
    },

    /// A flash loan was not returned in full before its callback ended.
    #[error("flash loan of {amount} {token} not repaid")]
    LoanNotRepaid { token: Address, amount: U256 },
}
