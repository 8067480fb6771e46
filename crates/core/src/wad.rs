//! WAD fixed-point arithmetic for health factor calculations.
//!
//! Health factors are 18-decimal fixed point. Two hard rules apply
//! everywhere: a zero liability yields `U256::MAX` instead of dividing by
//! zero, and multiplications that would overflow saturate to `U256::MAX`
//! instead of erroring. A saturated health factor reads as "infinitely
//! healthy", which is exactly what an unbounded ratio means.

use alloy::primitives::U256;

/// WAD constant: 1e18 for 18-decimal fixed-point arithmetic
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// 4-decimal factor scale shared by liquidation LTVs and buffers (10000 = 100%)
pub const MAXFACTOR: U256 = U256::from_limbs([10_000u64, 0, 0, 0]);

/// Rescale factor from Aave's 8-decimal base currency to WAD (1e10)
pub const AAVE_BASE_SCALE: U256 = U256::from_limbs([10_000_000_000u64, 0, 0, 0]);

/// Health ratio `collateral * 1e18 / liability` with integer truncation.
/// Returns `U256::MAX` when the liability is zero.
#[inline(always)]
pub fn hf_ratio(collateral: U256, liability: U256) -> U256 {
    if liability.is_zero() {
        return U256::MAX;
    }
    match collateral.checked_mul(WAD) {
        Some(scaled) => scaled / liability,
        None => U256::MAX,
    }
}

/// Apply a 4-decimal buffer factor to a ratio: `ratio * buffer / 10000`,
/// saturating to `U256::MAX` when the multiplication overflows.
#[inline(always)]
pub fn buffer_scaled(ratio: U256, buffer: u16) -> U256 {
    match ratio.checked_mul(U256::from(buffer)) {
        Some(scaled) => scaled / MAXFACTOR,
        None => U256::MAX,
    }
}

/// Weight a collateral value by a 4-decimal LTV: `value * ltv / 10000`.
#[inline(always)]
pub fn ltv_weighted(value: U256, ltv: u16) -> U256 {
    match value.checked_mul(U256::from(ltv)) {
        Some(scaled) => scaled / MAXFACTOR,
        None => U256::MAX,
    }
}

/// Rescale an 8-decimal Aave base value to 18 decimals.
#[inline(always)]
pub fn from_aave_base(value: U256) -> U256 {
    value.checked_mul(AAVE_BASE_SCALE).unwrap_or(U256::MAX)
}

/// Check whether a health factor marks a position liquidatable (HF < 1.0).
#[inline(always)]
pub fn is_liquidatable(hf: U256) -> bool {
    hf < WAD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hf_ratio_zero_liability_is_max() {
        assert_eq!(hf_ratio(U256::ZERO, U256::ZERO), U256::MAX);
        assert_eq!(hf_ratio(U256::from(1_000u64), U256::ZERO), U256::MAX);
        assert_eq!(hf_ratio(U256::MAX, U256::ZERO), U256::MAX);
    }

    #[test]
    fn hf_ratio_exact_truncating_division() {
        // 1000 collateral / 500 liability = 2.0
        let hf = hf_ratio(U256::from(1_000u64) * WAD, U256::from(500u64) * WAD);
        assert_eq!(hf, U256::from(2u64) * WAD);

        // Truncation: (1e18 + 1) * 1e18 / 3 must match integer division exactly
        let collateral = WAD + U256::from(1u64);
        let liability = U256::from(3u64);
        assert_eq!(hf_ratio(collateral, liability), collateral * WAD / liability);
    }

    #[test]
    fn hf_ratio_saturates_on_overflow() {
        // Collateral large enough that * 1e18 exceeds U256
        assert_eq!(hf_ratio(U256::MAX, U256::from(2u64)), U256::MAX);
    }

    #[test]
    fn buffer_scaled_identity_and_scaling() {
        let ratio = U256::from(95u64) * WAD / U256::from(100u64);

        // 10000 = 1.0x leaves the ratio unchanged
        assert_eq!(buffer_scaled(ratio, 10_000), ratio);

        // 12000 = 1.2x
        assert_eq!(
            buffer_scaled(ratio, 12_000),
            ratio * U256::from(12_000u64) / MAXFACTOR
        );
    }

    #[test]
    fn buffer_scaled_saturates_instead_of_overflowing() {
        assert_eq!(buffer_scaled(U256::MAX, 10_000), U256::MAX);
        assert_eq!(buffer_scaled(U256::MAX, 1), U256::MAX);
    }

    #[test]
    fn aave_base_rescaling() {
        // $1234.56 in 8-decimal base -> 18-decimal WAD
        let base = U256::from(123_456_000_000u64);
        assert_eq!(from_aave_base(base), base * AAVE_BASE_SCALE);
    }

    #[test]
    fn liquidatable_boundary() {
        assert!(is_liquidatable(WAD - U256::from(1u64)));
        assert!(!is_liquidatable(WAD));
        assert!(!is_liquidatable(U256::MAX));
    }
}
