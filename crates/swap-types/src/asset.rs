//! Asset and native amount types.
//!
//! Native amounts are integers expressed in an asset's smallest indivisible
//! unit. They routinely exceed 64-bit range (18-decimal tokens), so they are
//! backed by an arbitrary-precision integer and travel as decimal strings.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A wallet asset: a currency on a network, optionally a sub-token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
	/// Wallet network identifier (e.g., "bitcoin", "ethereum").
	pub network: String,
	/// Currency code (e.g., "BTC", "USDT").
	pub currency_code: String,
	/// Contract address or other sub-token identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_id: Option<String>,
	/// Number of decimal places between the denomination and native units.
	pub decimals: u32,
}

impl Asset {
	pub fn new(network: impl Into<String>, currency_code: impl Into<String>, decimals: u32) -> Self {
		Self {
			network: network.into(),
			currency_code: currency_code.into(),
			token_id: None,
			decimals,
		}
	}

	pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
		self.token_id = Some(token_id.into());
		self
	}

	/// Whether this asset is a token riding on another network's native coin.
	pub fn is_token(&self) -> bool {
		self.token_id.is_some()
	}
}

impl fmt::Display for Asset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{}", self.currency_code, self.network)
	}
}

/// Errors raised when parsing a native amount string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
	#[error("Amount is empty")]
	Empty,
	#[error("Amount '{0}' is not a non-negative integer")]
	NotAnInteger(String),
}

/// Non-negative integer amount in an asset's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NativeAmount(BigInt);

impl NativeAmount {
	pub fn zero() -> Self {
		Self(BigInt::zero())
	}

	/// Wraps an integer, returning `None` when it is negative.
	pub fn from_bigint(value: BigInt) -> Option<Self> {
		if value.is_negative() {
			None
		} else {
			Some(Self(value))
		}
	}

	pub fn as_bigint(&self) -> &BigInt {
		&self.0
	}

	pub fn into_bigint(self) -> BigInt {
		self.0
	}

	pub fn is_zero(&self) -> bool {
		self.0.is_zero()
	}
}

impl From<u64> for NativeAmount {
	fn from(value: u64) -> Self {
		Self(BigInt::from(value))
	}
}

impl From<u128> for NativeAmount {
	fn from(value: u128) -> Self {
		Self(BigInt::from(value))
	}
}

impl FromStr for NativeAmount {
	type Err = AmountParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if trimmed.is_empty() {
			return Err(AmountParseError::Empty);
		}
		if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
			return Err(AmountParseError::NotAnInteger(s.to_string()));
		}
		trimmed
			.parse::<BigInt>()
			.map(Self)
			.map_err(|_| AmountParseError::NotAnInteger(s.to_string()))
	}
}

impl fmt::Display for NativeAmount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for NativeAmount {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0.to_string())
	}
}

impl<'de> Deserialize<'de> for NativeAmount {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}
