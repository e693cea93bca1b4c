//! Max-swappable resolution.
//!
//! Spending the whole balance needs the backend's fee reservation, which in
//! turn depends on the amount spent. The resolver probes the backend with a
//! candidate amount, subtracts the reported fee from the balance and repeats
//! until the candidate stops moving.

use crate::amount::to_native;
use crate::engine::fetch_request;
use num_traits::One;
use swap_fetcher::QuoteFetcherInterface;
use swap_types::{NativeAmount, NormalizedRequest, SwapError, SwapResult};
use swap_wallet::WalletService;
use tracing::debug;

/// Default probe budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Resolves the largest from amount that leaves room for the fee reservation.
///
/// Stops on a fixed point, or when two consecutive candidates differ by a
/// single native unit (the smaller one wins). When the budget runs out the
/// last candidate is returned.
pub async fn resolve_max_swappable(
	fetcher: &dyn QuoteFetcherInterface,
	wallet: &WalletService,
	request: &NormalizedRequest,
	max_iterations: u32,
) -> SwapResult<NativeAmount> {
	let from_asset = &request.from_asset;
	let balance = wallet.balance(from_asset).await?;
	if balance.is_zero() {
		return Err(SwapError::InsufficientFunds {
			balance,
			fee: NativeAmount::zero(),
		});
	}

	let mut candidate = balance.clone();
	for iteration in 1..=max_iterations.max(1) {
		let probe = request.clone().with_resolved_amount(candidate.clone());
		let raw = fetcher
			.estimate(&fetch_request(fetcher.policy(), &probe, None))
			.await?;

		let fee = raw
			.network_fee
			.as_ref()
			.map(|fee| to_native(fee, from_asset))
			.transpose()
			.map_err(|e| SwapError::invalid_response(fetcher.name(), e.to_string()))?
			.unwrap_or_default();
		let next = match NativeAmount::from_bigint(balance.as_bigint() - fee.as_bigint()) {
			Some(next) if !next.is_zero() => next,
			_ => return Err(SwapError::InsufficientFunds { balance, fee }),
		};
		debug!(
			"Max probe {}: candidate {} fee {} next {}",
			iteration, candidate, fee, next
		);

		if next == candidate {
			return Ok(next);
		}
		if (next.as_bigint() - candidate.as_bigint()).magnitude().is_one() {
			return Ok(next.min(candidate));
		}
		candidate = next;
	}

	debug!(
		"Max resolution for {} stopped after {} probes at {}",
		from_asset, max_iterations, candidate
	);
	Ok(candidate)
}
