//! Conversion between native integer units and human denominations.
//!
//! All arithmetic is exact. Native amounts are integers scaled by
//! `10^asset.decimals`; denominations are arbitrary-precision decimals.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use swap_types::{Asset, NativeAmount};
use thiserror::Error;

/// Largest power of ten a denomination may be scaled up by.
const MAX_SCALE_UP: u32 = 1_000;

/// A denomination that has no native representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
	#[error("Amount exponent is out of range (scaling by 10^{0})")]
	OutOfRange(i128),
}

fn pow10(exp: u32) -> BigInt {
	BigInt::from(10u32).pow(exp)
}

/// Renders a native amount in the asset's denomination.
///
/// Output has no exponent and no trailing fractional zeros: 150000000
/// satoshis render as `"1.5"`, 100000000 as `"1"`.
pub fn to_denomination(native: &NativeAmount, asset: &Asset) -> String {
	let digits = native.as_bigint().to_string();
	let decimals = asset.decimals as usize;
	if decimals == 0 {
		return digits;
	}

	let padded = format!("{:0>width$}", digits, width = decimals + 1);
	let (whole, fraction) = padded.split_at(padded.len() - decimals);
	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() {
		whole.to_string()
	} else {
		format!("{}.{}", whole, fraction)
	}
}

/// Same value as a decimal, for comparisons in denomination space.
pub fn to_decimal(native: &NativeAmount, asset: &Asset) -> BigDecimal {
	BigDecimal::new(native.as_bigint().clone(), i64::from(asset.decimals))
}

/// Native units of `amount`, truncated, and whether digits were dropped.
fn split_native(amount: &BigDecimal, asset: &Asset) -> Result<(BigInt, bool), AmountError> {
	debug_assert!(!amount.is_negative(), "negative amount {}", amount);
	let (digits, scale) = amount.as_bigint_and_exponent();
	if digits.is_negative() || digits.is_zero() {
		return Ok((BigInt::zero(), false));
	}

	let shift = i128::from(asset.decimals) - i128::from(scale);
	if shift >= 0 {
		let up = u32::try_from(shift)
			.ok()
			.filter(|up| *up <= MAX_SCALE_UP)
			.ok_or(AmountError::OutOfRange(shift))?;
		return Ok((digits * pow10(up), false));
	}

	// Dropping more places than there are digits always leaves zero
	let width = digits.magnitude().to_string().len();
	let down = match u32::try_from(shift.unsigned_abs()) {
		Ok(down) if (down as usize) <= width => down,
		_ => return Ok((BigInt::zero(), true)),
	};
	let divisor = pow10(down);
	let remainder = &digits % &divisor;
	Ok((digits / divisor, !remainder.is_zero()))
}

/// Converts a denomination into native units, truncating sub-unit digits.
///
/// Negative input is a caller bug; release builds clamp it to zero.
pub fn to_native(amount: &BigDecimal, asset: &Asset) -> Result<NativeAmount, AmountError> {
	let (native, _) = split_native(amount, asset)?;
	Ok(NativeAmount::from_bigint(native).unwrap_or_default())
}

/// Like `to_native`, but rounds any sub-unit remainder up.
///
/// Used for minimum bounds: an integer amount is at least `min` exactly when
/// it is at least `ceil(min)` in native units.
pub fn to_native_ceil(amount: &BigDecimal, asset: &Asset) -> Result<NativeAmount, AmountError> {
	let (native, truncated) = split_native(amount, asset)?;
	let native = if truncated { native + 1u32 } else { native };
	Ok(NativeAmount::from_bigint(native).unwrap_or_default())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	fn btc() -> Asset {
		Asset::new("bitcoin", "BTC", 8)
	}

	fn dec(s: &str) -> BigDecimal {
		BigDecimal::from_str(s).unwrap()
	}

	#[test]
	fn test_denomination_formatting() {
		assert_eq!(to_denomination(&NativeAmount::from(150_000_000u64), &btc()), "1.5");
		assert_eq!(to_denomination(&NativeAmount::from(100_000_000u64), &btc()), "1");
		assert_eq!(to_denomination(&NativeAmount::from(1u64), &btc()), "0.00000001");
		assert_eq!(to_denomination(&NativeAmount::zero(), &btc()), "0");

		let no_decimals = Asset::new("ripple", "XRP", 0);
		assert_eq!(to_denomination(&NativeAmount::from(42u64), &no_decimals), "42");
	}

	#[test]
	fn test_to_native_truncates() {
		let cents = Asset::new("fiat", "USD", 2);
		assert_eq!(to_native(&dec("1.005"), &cents).unwrap(), NativeAmount::from(100u64));
		assert_eq!(to_native(&dec("0.001"), &btc()).unwrap(), NativeAmount::from(100_000u64));
		assert_eq!(to_native(&dec("10"), &btc()).unwrap(), NativeAmount::from(1_000_000_000u64));
		assert_eq!(to_native(&dec("1e2"), &btc()).unwrap(), NativeAmount::from(10_000_000_000u64));
	}

	#[test]
	fn test_ceil_only_bumps_remainders() {
		let cents = Asset::new("fiat", "USD", 2);
		assert_eq!(to_native_ceil(&dec("1.001"), &cents).unwrap(), NativeAmount::from(101u64));
		assert_eq!(to_native_ceil(&dec("1.00"), &cents).unwrap(), NativeAmount::from(100u64));
		assert_eq!(to_native_ceil(&dec("1e-30"), &cents).unwrap(), NativeAmount::from(1u64));
	}

	#[test]
	fn test_round_trip_beyond_u128() {
		let eth = Asset::new("ethereum", "ETH", 18);
		let native: NativeAmount = "340282366920938463463374607431768211457123456789"
			.parse()
			.unwrap();
		let denomination = to_denomination(&native, &eth);
		assert_eq!(to_native(&dec(&denomination), &eth).unwrap(), native);

		for raw in ["1", "10", "123456789", "100000000", "99999999999"] {
			let native: NativeAmount = raw.parse().unwrap();
			let back = to_native(&dec(&to_denomination(&native, &btc())), &btc()).unwrap();
			assert_eq!(back, native);
		}
	}

	#[test]
	fn test_extreme_exponents() {
		// Far below one native unit
		assert!(to_native(&dec("1e-4294967304"), &btc()).unwrap().is_zero());
		assert!(to_native(&dec("123e-2000000000"), &btc()).unwrap().is_zero());
		assert_eq!(
			to_native_ceil(&dec("1e-4294967304"), &btc()).unwrap(),
			NativeAmount::from(1u64)
		);

		// Far above anything representable
		assert!(matches!(
			to_native(&dec("1e4294967288"), &btc()),
			Err(AmountError::OutOfRange(_))
		));
		assert!(to_native_ceil(&dec("5e2000"), &btc()).is_err());

		// Exactly as many places dropped as there are digits
		assert!(to_native(&dec("0.000000009"), &btc()).unwrap().is_zero());
	}
}
