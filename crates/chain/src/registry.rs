//! Address-keyed directory of live collaborator handles.

use std::sync::Arc;

use alloy::primitives::Address;
use dashmap::DashMap;

use crate::{
    ChainError, CollateralPosition, IntermediateLedger, QuoteOracle, ReceiptVault, TargetMarket,
    Token,
};

/// Resolves contract addresses to handles, the way on-chain code follows
/// address references. Positions expose their collaborators as addresses
/// only; the engine looks the handles up here.
#[derive(Default)]
pub struct ContractRegistry {
    tokens: DashMap<Address, Arc<dyn Token>>,
    markets: DashMap<Address, Arc<dyn TargetMarket>>,
    ledgers: DashMap<Address, Arc<dyn IntermediateLedger>>,
    vaults: DashMap<Address, Arc<dyn ReceiptVault>>,
    oracles: DashMap<Address, Arc<dyn QuoteOracle>>,
    positions: DashMap<Address, Arc<dyn CollateralPosition>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_token(&self, token: Arc<dyn Token>) {
        self.tokens.insert(token.address(), token);
    }

    pub fn register_market(&self, market: Arc<dyn TargetMarket>) {
        self.markets.insert(market.address(), market);
    }

    pub fn register_ledger(&self, ledger: Arc<dyn IntermediateLedger>) {
        self.ledgers.insert(ledger.address(), ledger);
    }

    pub fn register_vault(&self, vault: Arc<dyn ReceiptVault>) {
        self.vaults.insert(vault.address(), vault);
    }

    pub fn register_oracle(&self, oracle: Arc<dyn QuoteOracle>) {
        self.oracles.insert(oracle.address(), oracle);
    }

    pub fn register_position(&self, position: Arc<dyn CollateralPosition>) {
        self.positions.insert(position.address(), position);
    }

    pub fn token(&self, address: Address) -> Result<Arc<dyn Token>, ChainError> {
        self.tokens
            .get(&address)
            .map(|entry| entry.clone())
            .ok_or(ChainError::UnknownContract(address))
    }

    pub fn market(&self, address: Address) -> Result<Arc<dyn TargetMarket>, ChainError> {
        self.markets
            .get(&address)
            .map(|entry| entry.clone())
            .ok_or(ChainError::UnknownContract(address))
    }

    pub fn ledger(&self, address: Address) -> Result<Arc<dyn IntermediateLedger>, ChainError> {
        self.ledgers
            .get(&address)
            .map(|entry| entry.clone())
            .ok_or(ChainError::UnknownContract(address))
    }

    pub fn vault(&self, address: Address) -> Result<Arc<dyn ReceiptVault>, ChainError> {
        self.vaults
            .get(&address)
            .map(|entry| entry.clone())
            .ok_or(ChainError::UnknownContract(address))
    }

    pub fn oracle(&self, address: Address) -> Result<Arc<dyn QuoteOracle>, ChainError> {
        self.oracles
            .get(&address)
            .map(|entry| entry.clone())
            .ok_or(ChainError::UnknownContract(address))
    }

    pub fn position(&self, address: Address) -> Result<Arc<dyn CollateralPosition>, ChainError> {
        self.positions
            .get(&address)
            .map(|entry| entry.clone())
            .ok_or(ChainError::UnknownContract(address))
    }
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("tokens", &self.tokens.len())
            .field("markets", &self.markets.len())
            .field("ledgers", &self.ledgers.len())
            .field("vaults", &self.vaults.len())
            .field("oracles", &self.oracles.len())
            .field("positions", &self.positions.len())
            .finish()
    }
}
