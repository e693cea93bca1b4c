//! Raw backend replies and assembled quotes.

use crate::{NativeAmount, NormalizedRequest, Side};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Role of a transaction within a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
	/// Token allowance grant; carries a payload, no value transfer.
	Approval,
	/// The actual swap send.
	Swap,
}

/// A transaction described by a backend, before amount conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStep {
	pub kind: StepKind,
	pub target_address: String,
	/// Opaque call data.
	#[serde(default)]
	pub payload: Vec<u8>,
	/// Fee the backend wants attached, in native units of the fee asset.
	#[serde(default)]
	pub fee_override: Option<NativeAmount>,
}

/// Backend-declared limits in the denomination of `side`'s asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLimits {
	pub min: Option<BigDecimal>,
	pub max: Option<BigDecimal>,
}

/// Backend reply after the adapter's schema parse.
///
/// Amounts are in the backend's denomination; the engine converts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuote {
	pub order_id: Option<String>,
	pub deposit_address: Option<String>,
	/// Memo, destination tag or extra id accompanying the deposit address.
	pub memo: Option<String>,
	pub limits: RawLimits,
	/// Side whose asset the limits are expressed in.
	pub limit_side: Side,
	pub from_amount: BigDecimal,
	pub to_amount: BigDecimal,
	/// Network fee the wallet must reserve, in from-asset denomination.
	pub network_fee: Option<BigDecimal>,
	/// Ordered transactions for multi-step on-chain flows.
	#[serde(default)]
	pub steps: Vec<RawStep>,
	/// The reply is an address-bound commitment rather than an estimate.
	pub is_firm: bool,
}

impl RawQuote {
	/// A non-binding reply carrying only amounts.
	pub fn estimate(from_amount: BigDecimal, to_amount: BigDecimal) -> Self {
		Self {
			order_id: None,
			deposit_address: None,
			memo: None,
			limits: RawLimits::default(),
			limit_side: Side::From,
			from_amount,
			to_amount,
			network_fee: None,
			steps: Vec::new(),
			is_firm: false,
		}
	}

	pub fn with_limits(mut self, min: Option<BigDecimal>, max: Option<BigDecimal>) -> Self {
		self.limits = RawLimits { min, max };
		self
	}

	pub fn with_network_fee(mut self, fee: BigDecimal) -> Self {
		self.network_fee = Some(fee);
		self
	}

	pub fn with_deposit(mut self, address: impl Into<String>, memo: Option<String>) -> Self {
		self.deposit_address = Some(address.into());
		self.memo = memo;
		self
	}

	pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
		self.order_id = Some(order_id.into());
		self
	}

	pub fn with_steps(mut self, steps: Vec<RawStep>) -> Self {
		self.steps = steps;
		self
	}

	pub fn firm(mut self) -> Self {
		self.is_firm = true;
		self
	}
}

/// Receive address reported by the wallet runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveAddress {
	pub address: String,
	/// Legacy format alias (e.g., P2PKH for a segwit wallet).
	#[serde(default)]
	pub legacy_address: Option<String>,
}

impl ReceiveAddress {
	pub fn new(address: impl Into<String>) -> Self {
		Self {
			address: address.into(),
			legacy_address: None,
		}
	}

	/// Picks the legacy alias when preferred and available.
	pub fn select(&self, prefer_legacy: bool) -> &str {
		match (&self.legacy_address, prefer_legacy) {
			(Some(legacy), true) => legacy,
			_ => &self.address,
		}
	}
}

/// One transaction the wallet must sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStep {
	pub kind: StepKind,
	pub target_address: String,
	pub native_amount: NativeAmount,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub memo: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub payload: Vec<u8>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fee_override: Option<NativeAmount>,
}

/// A time-boxed, backend-agnostic swap offer ready for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
	pub request: NormalizedRequest,
	/// Name of the backend that issued the quote.
	pub backend: String,
	pub from_native_amount: NativeAmount,
	pub to_native_amount: NativeAmount,
	pub deposit_address: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub memo: Option<String>,
	/// Wallet address refunds go to.
	pub refund_address: String,
	/// Wallet address the proceeds are paid to.
	pub payout_address: String,
	/// Unix timestamp (seconds) after which the quote must not be executed.
	pub expires_at: u64,
	pub is_estimate: bool,
	pub order_id: String,
	pub steps: Vec<TransactionStep>,
}

impl Quote {
	pub fn is_expired(&self, now: u64) -> bool {
		now >= self.expires_at
	}

	/// The step carrying the actual swap send.
	pub fn swap_step(&self) -> Option<&TransactionStep> {
		self.steps.last()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_receive_address_selection() {
		let plain = ReceiveAddress::new("bc1qxyz");
		assert_eq!(plain.select(true), "bc1qxyz");

		let with_legacy = ReceiveAddress {
			address: "bc1qxyz".to_string(),
			legacy_address: Some("1Legacy".to_string()),
		};
		assert_eq!(with_legacy.select(true), "1Legacy");
		assert_eq!(with_legacy.select(false), "bc1qxyz");
	}
}
