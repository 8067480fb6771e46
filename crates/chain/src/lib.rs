//! Twyne collaborator contract layer.
//!
//! This crate models every external contract the liquidation engine talks to
//! as a trait seam:
//! - Collateral positions (Twyne collateral vaults) and their factory
//! - Target markets in two variants (Euler-style vault, Aave-style pool)
//! - The intermediate ledger backing Twyne's internal risk buffer
//! - ERC-4626-style receipt vaults for the wrapped collateral asset
//! - ERC-20 tokens with raw-returndata call semantics
//! - Swap routers executing opaque, off-chain-prepared payloads
//! - A quote oracle valuing assets in the unit of account
//!
//! The [`ContractRegistry`] resolves addresses to live handles so the engine
//! can follow address references the way on-chain code follows them.

mod error;
mod ledger;
mod market;
mod oracle;
mod position;
mod registry;
mod router;
mod token;
mod vault;

pub use error::ChainError;
pub use ledger::IntermediateLedger;
pub use market::{MarketSnapshot, TargetMarket};
pub use oracle::QuoteOracle;
pub use position::{CollateralPosition, PositionFactory};
pub use registry::ContractRegistry;
pub use router::SwapRouter;
pub use token::{safe_approve, safe_transfer, Token, TokenCallError, NATIVE_ASSET};
pub use vault::ReceiptVault;
