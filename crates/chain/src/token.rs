//! ERC-20 token seam with raw-returndata call semantics.
//!
//! Token calls expose the raw return data instead of a decoded boolean so the
//! engine can apply the tolerant success rule used for non-standard tokens:
//! a call succeeded iff it returned ABI-encoded `true`, or returned nothing
//! from a contract that has code. Anything else is a [`TokenCallError`].

use alloy::primitives::{address, Address, Bytes, U256};
use thiserror::Error;
use tracing::trace;

use crate::ChainError;

/// Sentinel address under which the chain's native coin is tracked,
/// following the aggregator convention.
pub const NATIVE_ASSET: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// An ERC-20 token (or the native coin under [`NATIVE_ASSET`]).
///
/// Mutating calls take the acting account explicitly: the engine account
/// stands in for `msg.sender`.
pub trait Token: Send + Sync {
    fn address(&self) -> Address;

    /// Whether the token address holds code. Tokens without code cannot
    /// succeed silently.
    fn has_code(&self) -> bool {
        true
    }

    fn balance_of(&self, holder: Address) -> U256;

    /// Set `spender`'s allowance over `owner`'s balance. Returns the raw
    /// return data of the call.
    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<Bytes, ChainError>;

    /// Move `amount` from `from` to `to`. Returns the raw return data.
    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<Bytes, ChainError>;
}

impl core::fmt::Debug for dyn Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Token").field("address", &self.address()).finish()
    }
}

/// Failure of a token interaction under the tolerant success rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenCallError {
    /// The token explicitly returned `false`.
    #[error("token {token} returned false from {call}")]
    ReturnedFalse { token: Address, call: &'static str },

    /// The token returned data that is not an ABI-encoded boolean.
    #[error("token {token} returned malformed data from {call}")]
    MalformedReturn { token: Address, call: &'static str },

    /// The token returned nothing and has no code, so the empty return
    /// cannot be trusted as success.
    #[error("token {token} has no code")]
    NoCode { token: Address },

    /// The call itself reverted.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Approve with non-standard-token tolerance.
pub fn safe_approve(
    token: &dyn Token,
    owner: Address,
    spender: Address,
    amount: U256,
) -> Result<(), TokenCallError> {
    let ret = token.approve(owner, spender, amount)?;
    interpret_return(token, "approve", &ret)
}

/// Transfer with non-standard-token tolerance.
pub fn safe_transfer(
    token: &dyn Token,
    from: Address,
    to: Address,
    amount: U256,
) -> Result<(), TokenCallError> {
    let ret = token.transfer(from, to, amount)?;
    interpret_return(token, "transfer", &ret)
}

fn interpret_return(
    token: &dyn Token,
    call: &'static str,
    ret: &Bytes,
) -> Result<(), TokenCallError> {
    if ret.is_empty() {
        return if token.has_code() {
            trace!(token = %token.address(), call, "accepting empty return as success");
            Ok(())
        } else {
            Err(TokenCallError::NoCode {
                token: token.address(),
            })
        };
    }

    match decode_bool_word(ret) {
        Some(true) => Ok(()),
        Some(false) => Err(TokenCallError::ReturnedFalse {
            token: token.address(),
            call,
        }),
        None => Err(TokenCallError::MalformedReturn {
            token: token.address(),
            call,
        }),
    }
}

/// Decode a single ABI-encoded boolean word. Solidity encodes `bool` as a
/// 32-byte word holding 0 or 1; anything else is malformed.
fn decode_bool_word(ret: &[u8]) -> Option<bool> {
    if ret.len() != 32 || ret[..31].iter().any(|b| *b != 0) {
        return None;
    }
    match ret[31] {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Token stub returning a fixed payload from every call.
    struct FixedReturn {
        ret: Vec<u8>,
        has_code: bool,
    }

    impl Token for FixedReturn {
        fn address(&self) -> Address {
            Address::with_last_byte(0xAA)
        }

        fn has_code(&self) -> bool {
            self.has_code
        }

        fn balance_of(&self, _holder: Address) -> U256 {
            U256::ZERO
        }

        fn approve(&self, _: Address, _: Address, _: U256) -> Result<Bytes, ChainError> {
            Ok(Bytes::from(self.ret.clone()))
        }

        fn transfer(&self, _: Address, _: Address, _: U256) -> Result<Bytes, ChainError> {
            Ok(Bytes::from(self.ret.clone()))
        }
    }

    fn bool_word(value: u8) -> Vec<u8> {
        let mut word = vec![0u8; 32];
        word[31] = value;
        word
    }

    #[test]
    fn explicit_true_succeeds() {
        let token = FixedReturn {
            ret: bool_word(1),
            has_code: true,
        };
        assert!(safe_transfer(&token, Address::ZERO, Address::ZERO, U256::ZERO).is_ok());
    }

    #[test]
    fn explicit_false_fails() {
        let token = FixedReturn {
            ret: bool_word(0),
            has_code: true,
        };
        let err = safe_transfer(&token, Address::ZERO, Address::ZERO, U256::ZERO).unwrap_err();
        assert!(matches!(err, TokenCallError::ReturnedFalse { .. }));
    }

    #[test]
    fn empty_return_with_code_succeeds() {
        // USDT-style token: approve/transfer return nothing.
        let token = FixedReturn {
            ret: vec![],
            has_code: true,
        };
        assert!(safe_approve(&token, Address::ZERO, Address::ZERO, U256::MAX).is_ok());
    }

    #[test]
    fn empty_return_without_code_fails() {
        let token = FixedReturn {
            ret: vec![],
            has_code: false,
        };
        let err = safe_approve(&token, Address::ZERO, Address::ZERO, U256::MAX).unwrap_err();
        assert!(matches!(err, TokenCallError::NoCode { .. }));
    }

    #[test]
    fn garbage_return_fails() {
        let token = FixedReturn {
            ret: vec![0xde, 0xad, 0xbe, 0xef],
            has_code: true,
        };
        let err = safe_transfer(&token, Address::ZERO, Address::ZERO, U256::ZERO).unwrap_err();
        assert!(matches!(err, TokenCallError::MalformedReturn { .. }));

        // A 32-byte word that is neither 0 nor 1 is also malformed.
        let token = FixedReturn {
            ret: bool_word(2),
            has_code: true,
        };
        let err = safe_transfer(&token, Address::ZERO, Address::ZERO, U256::ZERO).unwrap_err();
        assert!(matches!(err, TokenCallError::MalformedReturn { .. }));
    }

    #[test]
    fn revert_propagates() {
        struct Reverting;
        impl Token for Reverting {
            fn address(&self) -> Address {
                Address::with_last_byte(0xBB)
            }
            fn balance_of(&self, _holder: Address) -> U256 {
                U256::ZERO
            }
            fn approve(&self, _: Address, _: Address, _: U256) -> Result<Bytes, ChainError> {
                Err(ChainError::CallReverted {
                    contract: self.address(),
                    reason: "paused".to_string(),
                })
            }
            fn transfer(&self, _: Address, _: Address, _: U256) -> Result<Bytes, ChainError> {
                unreachable!()
            }
        }

        let err = safe_approve(&Reverting, Address::ZERO, Address::ZERO, U256::MAX).unwrap_err();
        assert!(matches!(err, TokenCallError::Chain(_)));
    }
}
