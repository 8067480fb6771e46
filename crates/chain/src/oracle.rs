//! Quote oracle seam.

use alloy::primitives::{Address, U256};

use crate::ChainError;

/// Values token amounts in another denomination, typically the intermediate
/// ledger's unit of account.
pub trait QuoteOracle: Send + Sync {
    fn address(&self) -> Address;

    /// Value of `amount` of `base`, expressed in `quote`.
    fn quote(&self, amount: U256, base: Address, quote: Address) -> Result<U256, ChainError>;
}
