//! 1inch-style swap payload client and payload validation.
//!
//! The engine treats the swap payload as opaque; everything about it is
//! decided off-chain, here. Two rules guard payload preparation:
//! - A zero input amount is only legal when settling an externally
//!   liquidated position (100% of the target-asset debt was liquidated, so
//!   nothing needs swapping). Anywhere else it is an error.
//! - For an external settlement the payload's embedded minimum return must
//!   cover the remaining debt, or the settlement would be unable to repay
//!   its flash loan; such payloads are rejected before a transaction is
//!   built.

use alloy::primitives::{Address, Bytes, U256};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Byte range of the minimum-return word inside the router calldata.
const MIN_RETURN_RANGE: std::ops::Range<usize> = 196..228;

/// A prepared, opaque swap payload ready to hand to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPayload {
    /// Router the payload must be executed against.
    pub router: Address,
    /// Raw router calldata.
    pub data: Bytes,
    /// Minimum return embedded in the calldata, when present.
    pub min_return: Option<U256>,
}

/// Everything needed to prepare one payload.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub src_token: Address,
    pub dst_token: Address,
    pub amount: U256,
    /// Maximum acceptable slippage in percent.
    pub slippage: f64,
    /// Whether the payload settles an externally liquidated position.
    pub externally_liquidated: bool,
    /// Recipient of the swapped tokens.
    pub recipient: Address,
}

/// Seam for the scheduler: anything that can prepare payloads.
#[async_trait]
pub trait SwapPayloadSource: Send + Sync {
    /// Prepare a payload, or `None` when no swap is needed.
    async fn swap_payload(&self, request: &SwapRequest) -> Result<Option<SwapPayload>>;
}

/// External-settlement payload whose minimum return cannot cover the debt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("swap min return {min_return} below required repay {required}, shortfall {shortfall}")]
pub struct ShortfallError {
    pub min_return: U256,
    pub required: U256,
    pub shortfall: U256,
}

/// Zero-amount rule. Returns whether a swap is needed at all.
pub fn ensure_swap_amount(amount: U256, externally_liquidated: bool) -> Result<bool> {
    if amount.is_zero() {
        if !externally_liquidated {
            bail!("swap amount is zero outside an external settlement");
        }
        return Ok(false);
    }
    Ok(true)
}

/// Extract the minimum-return word from router calldata, if the calldata is
/// long enough to carry one.
pub fn min_return_of(data: &[u8]) -> Option<U256> {
    data.get(MIN_RETURN_RANGE)
        .map(U256::from_be_slice)
}

/// Reject an external-settlement payload that cannot repay `required`.
pub fn validate_external_payload(data: &[u8], required: U256) -> Result<(), ShortfallError> {
    if required.is_zero() {
        return Ok(());
    }
    let min_return = min_return_of(data).unwrap_or(U256::ZERO);
    if min_return < required {
        return Err(ShortfallError {
            min_return,
            required,
            shortfall: required - min_return,
        });
    }
    Ok(())
}

/// Decode `0x`-prefixed router calldata.
pub fn decode_calldata(raw: &str) -> Result<Bytes> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let data = hex::decode(stripped).context("invalid hex in router calldata")?;
    Ok(Bytes::from(data))
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    tx: SwapTransaction,
}

#[derive(Debug, Deserialize)]
struct SwapTransaction {
    to: String,
    data: String,
}

/// Aggregator swap API client (1inch v6 wire format).
pub struct SwapPayloadClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chain_id: u64,
    /// Account the aggregator quotes on behalf of.
    taker: Address,
}

impl SwapPayloadClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.1inch.dev/swap/v6.0";

    pub fn new(chain_id: u64, api_key: impl Into<String>, taker: Address) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            chain_id,
            taker,
        }
    }

    /// Point the client at a different aggregator deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self, request: &SwapRequest) -> Result<SwapResponse> {
        let url = format!("{}/{}/swap", self.base_url, self.chain_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[
                ("src", format!("{:#x}", request.src_token)),
                ("dst", format!("{:#x}", request.dst_token)),
                ("amount", request.amount.to_string()),
                ("slippage", request.slippage.to_string()),
                ("from", format!("{:#x}", self.taker)),
                ("receiver", format!("{:#x}", request.recipient)),
                ("disableEstimate", "true".to_string()),
            ])
            .send()
            .await
            .context("swap API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("swap API returned {status}: {body}");
        }

        response
            .json::<SwapResponse>()
            .await
            .context("malformed swap API response")
    }
}

#[async_trait]
impl SwapPayloadSource for SwapPayloadClient {
    async fn swap_payload(&self, request: &SwapRequest) -> Result<Option<SwapPayload>> {
        if !ensure_swap_amount(request.amount, request.externally_liquidated)? {
            debug!("zero-amount external settlement, no swap payload needed");
            return Ok(None);
        }

        let response = self.fetch(request).await?;
        let data = decode_calldata(&response.tx.data)?;
        let router: Address = response
            .tx
            .to
            .parse()
            .context("invalid router address in swap API response")?;
        let min_return = min_return_of(&data);

        debug!(
            router = %router,
            bytes = data.len(),
            min_return = ?min_return,
            "prepared swap payload"
        );

        if request.externally_liquidated {
            // The caller still owes the flash loan; a payload that cannot
            // cover it is useless, fail fast here.
            if let Err(err) = validate_external_payload(&data, request.amount) {
                warn!(error = %err, "rejecting external settlement payload");
                bail!(err);
            }
        }

        Ok(Some(SwapPayload {
            router,
            data,
            min_return,
        }))
    }
}
