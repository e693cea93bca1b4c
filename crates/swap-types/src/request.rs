//! Swap request types.
//!
//! A `SwapRequest` is what the caller hands the engine. It is normalized into
//! a `NormalizedRequest` before any policy check or network call so that every
//! later stage sees canonical currency codes and a parsed amount.

use crate::{Asset, NativeAmount, SwapError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the swap the requested amount refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteDirection {
	/// The amount is what the caller spends.
	From,
	/// The amount is what the caller wants to receive.
	To,
	/// Spend the whole spendable balance; the amount is ignored.
	Max,
}

/// A leg of the swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	From,
	To,
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Side::From => write!(f, "from"),
			Side::To => write!(f, "to"),
		}
	}
}

impl QuoteDirection {
	/// The side whose asset denominates the request amount.
	pub fn side(&self) -> Side {
		match self {
			QuoteDirection::To => Side::To,
			QuoteDirection::From | QuoteDirection::Max => Side::From,
		}
	}
}

/// A caller's swap request as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
	pub from_asset: Asset,
	pub to_asset: Asset,
	/// Native amount as a non-negative integer string.
	pub native_amount: String,
	pub quote_direction: QuoteDirection,
}

/// A request in canonical form with its amount parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRequest {
	pub from_asset: Asset,
	pub to_asset: Asset,
	pub native_amount: NativeAmount,
	pub quote_direction: QuoteDirection,
}

fn normalize_asset(asset: &Asset) -> Result<Asset, SwapError> {
	let network = asset.network.trim().to_lowercase();
	let currency_code = asset.currency_code.trim().to_uppercase();
	if network.is_empty() {
		return Err(SwapError::InvalidRequest(
			"Asset network must not be empty".to_string(),
		));
	}
	if currency_code.is_empty() {
		return Err(SwapError::InvalidRequest(
			"Asset currency code must not be empty".to_string(),
		));
	}
	Ok(Asset {
		network,
		currency_code,
		token_id: asset
			.token_id
			.as_ref()
			.map(|id| id.trim().to_string())
			.filter(|id| !id.is_empty()),
		decimals: asset.decimals,
	})
}

impl SwapRequest {
	pub fn new(
		from_asset: Asset,
		to_asset: Asset,
		native_amount: impl Into<String>,
		quote_direction: QuoteDirection,
	) -> Self {
		Self {
			from_asset,
			to_asset,
			native_amount: native_amount.into(),
			quote_direction,
		}
	}

	/// Canonicalizes codes and networks and parses the amount.
	///
	/// With `QuoteDirection::Max` the amount is ignored and set to zero until
	/// the max-swappable resolver replaces it.
	pub fn normalize(&self) -> Result<NormalizedRequest, SwapError> {
		let from_asset = normalize_asset(&self.from_asset)?;
		let to_asset = normalize_asset(&self.to_asset)?;

		if from_asset == to_asset {
			return Err(SwapError::InvalidRequest(format!(
				"Cannot swap {} into itself",
				from_asset
			)));
		}

		let native_amount = match self.quote_direction {
			QuoteDirection::Max => NativeAmount::zero(),
			_ => {
				let amount: NativeAmount = self
					.native_amount
					.parse()
					.map_err(|e| SwapError::InvalidRequest(format!("{}", e)))?;
				if amount.is_zero() {
					return Err(SwapError::InvalidRequest(
						"Amount must be greater than zero".to_string(),
					));
				}
				amount
			}
		};

		Ok(NormalizedRequest {
			from_asset,
			to_asset,
			native_amount,
			quote_direction: self.quote_direction,
		})
	}
}

impl NormalizedRequest {
	/// Returns the asset on the given side.
	pub fn asset(&self, side: Side) -> &Asset {
		match side {
			Side::From => &self.from_asset,
			Side::To => &self.to_asset,
		}
	}

	/// Replaces the amount with a resolved one and pins the direction to `From`.
	pub fn with_resolved_amount(mut self, amount: NativeAmount) -> Self {
		self.native_amount = amount;
		self.quote_direction = QuoteDirection::From;
		self
	}
}
