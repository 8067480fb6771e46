//! Capital provider callback: context codec and trust boundary.
//!
//! The capital provider drives re-entry into the engine: it invokes the
//! fixed callback exactly once per loan, synchronously, before its own
//! `flash_loan` call returns. The context payload is a tagged union encoded
//! as `(uint8 tag, bytes payload)`; decoding reads the discriminant first,
//! then exactly one type-specific payload. Unknown tags are a hard error,
//! never a silent fall-through. The context carries only value data
//! (addresses and amounts), never capability handles.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolValue;

use crate::errors::EngineError;

sol! {
    /// Outer envelope: discriminant plus type-specific payload.
    #[derive(Debug)]
    struct TaggedCallback {
        uint8 tag;
        bytes payload;
    }

    /// First continuation of an internal liquidation: borrow the underlying
    /// collateral asset, nested inside the target-asset loan.
    #[derive(Debug)]
    struct OuterInternalPayload {
        address position;
        uint256 collateralFlashAmount;
        bytes swapPayload;
    }

    /// Second continuation of an internal liquidation: settle the position.
    #[derive(Debug)]
    struct InnerInternalPayload {
        address position;
        bytes swapPayload;
    }

    /// Continuation of an external settlement with remaining debt.
    #[derive(Debug)]
    struct ExternalSettlementPayload {
        address position;
        bytes swapPayload;
    }
}

const TAG_OUTER_INTERNAL: u8 = 1;
const TAG_INNER_INTERNAL: u8 = 2;
const TAG_EXTERNAL_SETTLEMENT: u8 = 3;

/// Decoded continuation state for a provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackContext {
    OuterInternal {
        position: Address,
        collateral_flash_amount: U256,
        swap_payload: Bytes,
    },
    InnerInternal {
        position: Address,
        swap_payload: Bytes,
    },
    ExternalSettlement {
        position: Address,
        swap_payload: Bytes,
    },
}

impl CallbackContext {
    /// The position the continuation refers to.
    pub fn position(&self) -> Address {
        match self {
            Self::OuterInternal { position, .. }
            | Self::InnerInternal { position, .. }
            | Self::ExternalSettlement { position, .. } => *position,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Self::OuterInternal { .. } => TAG_OUTER_INTERNAL,
            Self::InnerInternal { .. } => TAG_INNER_INTERNAL,
            Self::ExternalSettlement { .. } => TAG_EXTERNAL_SETTLEMENT,
        }
    }

    /// ABI-encode the context for transport through the provider.
    pub fn encode(&self) -> Bytes {
        let payload = match self {
            Self::OuterInternal {
                position,
                collateral_flash_amount,
                swap_payload,
            } => OuterInternalPayload {
                position: *position,
                collateralFlashAmount: *collateral_flash_amount,
                swapPayload: swap_payload.clone(),
            }
            .abi_encode(),
            Self::InnerInternal {
                position,
                swap_payload,
            } => InnerInternalPayload {
                position: *position,
                swapPayload: swap_payload.clone(),
            }
            .abi_encode(),
            Self::ExternalSettlement {
                position,
                swap_payload,
            } => ExternalSettlementPayload {
                position: *position,
                swapPayload: swap_payload.clone(),
            }
            .abi_encode(),
        };

        let envelope = TaggedCallback {
            tag: self.tag(),
            payload: Bytes::from(payload),
        };
        Bytes::from(envelope.abi_encode())
    }

    /// Decode an envelope: discriminant first, then the matching payload.
    pub fn decode(data: &[u8]) -> Result<Self, EngineError> {
        let envelope = TaggedCallback::abi_decode(data, true)
            .map_err(|e| EngineError::MalformedPayload(e.to_string()))?;

        match envelope.tag {
            TAG_OUTER_INTERNAL => {
                let inner = OuterInternalPayload::abi_decode(&envelope.payload, true)
                    .map_err(|e| EngineError::MalformedPayload(e.to_string()))?;
                Ok(Self::OuterInternal {
                    position: inner.position,
                    collateral_flash_amount: inner.collateralFlashAmount,
                    swap_payload: inner.swapPayload,
                })
            }
            TAG_INNER_INTERNAL => {
                let inner = InnerInternalPayload::abi_decode(&envelope.payload, true)
                    .map_err(|e| EngineError::MalformedPayload(e.to_string()))?;
                Ok(Self::InnerInternal {
                    position: inner.position,
                    swap_payload: inner.swapPayload,
                })
            }
            TAG_EXTERNAL_SETTLEMENT => {
                let inner = ExternalSettlementPayload::abi_decode(&envelope.payload, true)
                    .map_err(|e| EngineError::MalformedPayload(e.to_string()))?;
                Ok(Self::ExternalSettlement {
                    position: inner.position,
                    swap_payload: inner.swapPayload,
                })
            }
            tag => Err(EngineError::UnknownCallbackTag(tag)),
        }
    }
}

/// The engine side of the flash loan: invoked by the capital provider while
/// its `flash_loan` frame is live. The receiver must have returned the full
/// amount by transfer before this returns.
pub trait FlashLoanReceiver {
    fn on_flash_loan(
        &mut self,
        caller: Address,
        token: Address,
        amount: U256,
        data: &Bytes,
    ) -> Result<(), EngineError>;
}

/// An uncollateralized capital source.
///
/// Invariant: the provider calls back into `receiver` exactly once per loan,
/// synchronously, before `flash_loan` returns, and fails the whole call if
/// the loan was not repaid by the time the callback returned.
pub trait CapitalProvider: Send + Sync {
    fn address(&self) -> Address;

    fn flash_loan(
        &self,
        receiver: &mut dyn FlashLoanReceiver,
        token: Address,
        amount: U256,
        data: Bytes,
    ) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        let position = Address::with_last_byte(0x11);
        let contexts = [
            CallbackContext::OuterInternal {
                position,
                collateral_flash_amount: U256::from(1_200u64),
                swap_payload: Bytes::from(vec![1, 2, 3]),
            },
            CallbackContext::InnerInternal {
                position,
                swap_payload: Bytes::new(),
            },
            CallbackContext::ExternalSettlement {
                position,
                swap_payload: Bytes::from(vec![9; 64]),
            },
        ];

        for ctx in contexts {
            let decoded = CallbackContext::decode(&ctx.encode()).unwrap();
            assert_eq!(decoded, ctx);
            assert_eq!(decoded.position(), position);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let envelope = TaggedCallback {
            tag: 7,
            payload: Bytes::new(),
        };
        let err = CallbackContext::decode(&envelope.abi_encode()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownCallbackTag(7)));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let ctx = CallbackContext::InnerInternal {
            position: Address::with_last_byte(0x22),
            swap_payload: Bytes::from(vec![5; 32]),
        };
        let encoded = ctx.encode();
        let err = CallbackContext::decode(&encoded[..encoded.len() - 1]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedPayload(_)));
    }

    #[test]
    fn tag_mismatched_payload_is_rejected() {
        // An outer-internal payload wrapped under the inner-internal tag must
        // not decode into a different variant silently.
        let inner = OuterInternalPayload {
            position: Address::with_last_byte(0x33),
            collateralFlashAmount: U256::from(5u64),
            swapPayload: Bytes::new(),
        };
        let envelope = TaggedCallback {
            tag: TAG_INNER_INTERNAL,
            payload: Bytes::from(inner.abi_encode()),
        };

        // Three words decode as (address, offset, len) only if the layout
        // happens to line up; reject or decode to a same-shape variant, but
        // never to OuterInternal.
        match CallbackContext::decode(&envelope.abi_encode()) {
            Ok(ctx) => assert!(matches!(ctx, CallbackContext::InnerInternal { .. })),
            Err(err) => assert!(matches!(err, EngineError::MalformedPayload(_))),
        }
    }
}
