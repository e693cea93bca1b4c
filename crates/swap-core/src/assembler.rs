//! Turns a backend order reply into an executable `Quote`.

use crate::amount::{to_native, AmountError};
use std::time::Duration;
use swap_types::{
	NativeAmount, NormalizedRequest, Quote, QuoteDirection, RawQuote, ReceiveAddress, StepKind,
	SwapError, SwapResult, TransactionStep,
};
use uuid::Uuid;

/// Wallet addresses a quote is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapAddresses {
	/// Where the backend refunds to, on the from network.
	pub refund: String,
	/// Where the proceeds go, on the to network.
	pub payout: String,
}

impl SwapAddresses {
	pub fn select(refund: &ReceiveAddress, payout: &ReceiveAddress, prefer_legacy: bool) -> Self {
		Self {
			refund: refund.select(prefer_legacy).to_string(),
			payout: payout.select(prefer_legacy).to_string(),
		}
	}
}

/// Native from/to amounts of a quote.
///
/// The requested side keeps the caller's exact amount; the other side comes
/// from the backend reply.
fn native_amounts(
	backend: &str,
	request: &NormalizedRequest,
	raw: &RawQuote,
) -> SwapResult<(NativeAmount, NativeAmount)> {
	let invalid = |e: AmountError| SwapError::invalid_response(backend, e.to_string());
	Ok(match request.quote_direction {
		QuoteDirection::To => (
			to_native(&raw.from_amount, &request.from_asset).map_err(invalid)?,
			request.native_amount.clone(),
		),
		QuoteDirection::From | QuoteDirection::Max => (
			request.native_amount.clone(),
			to_native(&raw.to_amount, &request.to_asset).map_err(invalid)?,
		),
	})
}

fn build_steps(
	backend: &str,
	raw: &RawQuote,
	from_native: &NativeAmount,
) -> SwapResult<Vec<TransactionStep>> {
	if raw.steps.is_empty() {
		let deposit = raw
			.deposit_address
			.as_deref()
			.filter(|address| !address.is_empty())
			.ok_or_else(|| SwapError::invalid_response(backend, "Reply has no deposit address"))?;
		return Ok(vec![TransactionStep {
			kind: StepKind::Swap,
			target_address: deposit.to_string(),
			native_amount: from_native.clone(),
			memo: raw.memo.clone(),
			payload: Vec::new(),
			fee_override: None,
		}]);
	}

	let last = raw.steps.len() - 1;
	raw.steps
		.iter()
		.enumerate()
		.map(|(index, step)| match (step.kind, index == last) {
			(StepKind::Approval, false) => Ok(TransactionStep {
				kind: StepKind::Approval,
				target_address: step.target_address.clone(),
				native_amount: NativeAmount::zero(),
				memo: None,
				payload: step.payload.clone(),
				fee_override: step.fee_override.clone(),
			}),
			(StepKind::Swap, true) => Ok(TransactionStep {
				kind: StepKind::Swap,
				target_address: step.target_address.clone(),
				native_amount: from_native.clone(),
				memo: raw.memo.clone(),
				payload: step.payload.clone(),
				fee_override: step.fee_override.clone(),
			}),
			(kind, _) => Err(SwapError::invalid_response(
				backend,
				format!("Unexpected {:?} transaction at position {}", kind, index),
			)),
		})
		.collect()
}

/// Builds the quote for `request` from the backend's order reply.
///
/// `request` must carry the resolved amount (never `Max`). The quote
/// expires `lifetime` after `now`.
pub fn assemble(
	request: &NormalizedRequest,
	backend: &str,
	raw: RawQuote,
	addresses: &SwapAddresses,
	lifetime: Duration,
	now: u64,
) -> SwapResult<Quote> {
	let (from_native_amount, to_native_amount) = native_amounts(backend, request, &raw)?;
	let steps = build_steps(backend, &raw, &from_native_amount)?;
	let deposit_address = match raw.deposit_address.as_deref() {
		Some(address) if !address.is_empty() => address.to_string(),
		_ => steps
			.last()
			.map(|step| step.target_address.clone())
			.unwrap_or_default(),
	};

	Ok(Quote {
		request: request.clone(),
		backend: backend.to_string(),
		from_native_amount,
		to_native_amount,
		deposit_address,
		memo: raw.memo,
		refund_address: addresses.refund.clone(),
		payout_address: addresses.payout.clone(),
		expires_at: now.saturating_add(lifetime.as_secs()),
		is_estimate: !raw.is_firm,
		order_id: raw.order_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
		steps,
	})
}
