//! Scoped token approvals with guaranteed teardown.
//!
//! A liquidation leg needs spending rights on a handful of (token, spender)
//! pairs for exactly one top-level call. [`ApprovalScope`] grants the
//! maximum allowance for each pair on open and revokes every grant to zero
//! when dropped, on success and error unwind alike. The scope is a
//! capability: never persisted, always paired acquire/release around a
//! single call.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use smallvec::SmallVec;
use tracing::{debug, error};
use twyne_chain::{safe_approve, Token};

use crate::errors::EngineError;

struct Grant {
    token: Arc<dyn Token>,
    spender: Address,
}

pub struct ApprovalScope {
    owner: Address,
    grants: SmallVec<[Grant; 4]>,
}

impl ApprovalScope {
    /// Grant maximum allowance for each pair. If a later grant fails, the
    /// earlier ones are revoked by the partially built scope's drop.
    pub fn open<I>(owner: Address, pairs: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (Arc<dyn Token>, Address)>,
    {
        let mut scope = Self {
            owner,
            grants: SmallVec::new(),
        };

        for (token, spender) in pairs {
            safe_approve(token.as_ref(), owner, spender, U256::MAX)?;
            debug!(token = %token.address(), spender = %spender, "approval granted");
            scope.grants.push(Grant { token, spender });
        }

        Ok(scope)
    }
}

impl Drop for ApprovalScope {
    fn drop(&mut self) {
        for grant in &self.grants {
            match safe_approve(grant.token.as_ref(), self.owner, grant.spender, U256::ZERO) {
                Ok(()) => {
                    debug!(token = %grant.token.address(), spender = %grant.spender, "approval revoked")
                }
                Err(err) => {
                    // Teardown must not panic; the enclosing transaction is
                    // already unwinding or committing.
                    error!(
                        token = %grant.token.address(),
                        spender = %grant.spender,
                        error = %err,
                        "failed to revoke approval during scope teardown"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use twyne_chain::ChainError;

    /// Token recording every approval, optionally failing for one spender.
    struct RecordingToken {
        address: Address,
        allowances: Mutex<HashMap<(Address, Address), U256>>,
        fail_for: Option<Address>,
    }

    impl RecordingToken {
        fn new(address: Address) -> Arc<Self> {
            Arc::new(Self {
                address,
                allowances: Mutex::new(HashMap::new()),
                fail_for: None,
            })
        }

        fn failing_for(address: Address, spender: Address) -> Arc<Self> {
            Arc::new(Self {
                address,
                allowances: Mutex::new(HashMap::new()),
                fail_for: Some(spender),
            })
        }

        fn allowance(&self, owner: Address, spender: Address) -> U256 {
            self.allowances
                .lock()
                .get(&(owner, spender))
                .copied()
                .unwrap_or(U256::ZERO)
        }
    }

    impl Token for RecordingToken {
        fn address(&self) -> Address {
            self.address
        }
        fn balance_of(&self, _holder: Address) -> U256 {
            U256::ZERO
        }
        fn approve(
            &self,
            owner: Address,
            spender: Address,
            amount: U256,
        ) -> Result<Bytes, ChainError> {
            if self.fail_for == Some(spender) {
                return Err(ChainError::CallReverted {
                    contract: self.address,
                    reason: "approval rejected".to_string(),
                });
            }
            self.allowances.lock().insert((owner, spender), amount);
            Ok(Bytes::new())
        }
        fn transfer(&self, _: Address, _: Address, _: U256) -> Result<Bytes, ChainError> {
            Ok(Bytes::new())
        }
    }

    const OWNER: Address = Address::with_last_byte(0x01);
    const SPENDER_A: Address = Address::with_last_byte(0x02);
    const SPENDER_B: Address = Address::with_last_byte(0x03);

    #[test]
    fn grants_max_then_revokes_to_zero() {
        let token = RecordingToken::new(Address::with_last_byte(0x10));

        {
            let _scope = ApprovalScope::open(
                OWNER,
                [
                    (token.clone() as Arc<dyn Token>, SPENDER_A),
                    (token.clone() as Arc<dyn Token>, SPENDER_B),
                ],
            )
            .unwrap();

            assert_eq!(token.allowance(OWNER, SPENDER_A), U256::MAX);
            assert_eq!(token.allowance(OWNER, SPENDER_B), U256::MAX);
        }

        assert_eq!(token.allowance(OWNER, SPENDER_A), U256::ZERO);
        assert_eq!(token.allowance(OWNER, SPENDER_B), U256::ZERO);
    }

    #[test]
    fn revokes_on_error_unwind() {
        let token = RecordingToken::new(Address::with_last_byte(0x11));

        let result: Result<(), EngineError> = (|| {
            let _scope =
                ApprovalScope::open(OWNER, [(token.clone() as Arc<dyn Token>, SPENDER_A)])?;
            Err(EngineError::EmptySwapReturn)
        })();

        assert!(result.is_err());
        assert_eq!(token.allowance(OWNER, SPENDER_A), U256::ZERO);
    }

    #[test]
    fn partial_open_failure_revokes_earlier_grants() {
        let good = RecordingToken::new(Address::with_last_byte(0x12));
        let bad = RecordingToken::failing_for(Address::with_last_byte(0x13), SPENDER_B);

        let err = ApprovalScope::open(
            OWNER,
            [
                (good.clone() as Arc<dyn Token>, SPENDER_A),
                (bad as Arc<dyn Token>, SPENDER_B),
            ],
        )
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(err, EngineError::TokenCall(_)));
        assert_eq!(good.allowance(OWNER, SPENDER_A), U256::ZERO);
    }
}
