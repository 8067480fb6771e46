//! Off-chain swap payload preparation for the Twyne liquidation engine.
//!
//! This crate provides the HTTP client that prepares the opaque router
//! payload a liquidation forwards on-chain, plus the pure validation rules
//! applied to a payload before any transaction is built.

mod swap;

pub use swap::{
    decode_calldata, ensure_swap_amount, min_return_of, validate_external_payload, ShortfallError,
    SwapPayload, SwapPayloadClient, SwapPayloadSource, SwapRequest,
};
