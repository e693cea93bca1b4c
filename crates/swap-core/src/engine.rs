//! Quote orchestration for a single backend.

use crate::amount::{to_denomination, to_native, to_native_ceil, AmountError};
use crate::assembler::{assemble, SwapAddresses};
use crate::limits::check_bounds;
use crate::policy::{transcribe, validate_pair};
use crate::resolver::{resolve_max_swappable, DEFAULT_MAX_ITERATIONS};
use crate::sequencer::ExecutionSequencer;
use std::sync::Arc;
use swap_fetcher::{FetchRequest, QuoteFetcherInterface};
use swap_types::{
	current_timestamp, CurrencyPolicy, NormalizedRequest, Quote, QuoteDirection, RawQuote, Side,
	SwapError, SwapRequest, SwapResult,
};
use swap_wallet::WalletService;
use tracing::{debug, info};

/// Presents a normalized request to a backend.
///
/// Networks are transcribed through the policy, and the amount is rendered
/// in the denomination of the side the direction names.
pub fn fetch_request(
	policy: &CurrencyPolicy,
	request: &NormalizedRequest,
	addresses: Option<&SwapAddresses>,
) -> FetchRequest {
	let side = request.quote_direction.side();
	FetchRequest {
		request: request.clone(),
		from_network: transcribe(policy, &request.from_asset.network),
		to_network: transcribe(policy, &request.to_asset.network),
		amount: to_denomination(&request.native_amount, request.asset(side)),
		refund_address: addresses.map(|a| a.refund.clone()),
		payout_address: addresses.map(|a| a.payout.clone()),
	}
}

/// Engine that turns swap requests into executable quotes from one backend.
pub struct SwapEngine {
	fetcher: Box<dyn QuoteFetcherInterface>,
	wallet: Arc<WalletService>,
	max_iterations: u32,
}

impl SwapEngine {
	pub fn new(fetcher: Box<dyn QuoteFetcherInterface>, wallet: Arc<WalletService>) -> Self {
		Self {
			fetcher,
			wallet,
			max_iterations: DEFAULT_MAX_ITERATIONS,
		}
	}

	/// Overrides the max-swappable probe budget.
	pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
		self.max_iterations = max_iterations;
		self
	}

	pub fn backend(&self) -> &str {
		self.fetcher.name()
	}

	/// Fetches an executable quote for `request`.
	///
	/// Validation and policy failures return before any network call. Limits
	/// are checked on the estimate reply, so a violating request never
	/// reaches the backend's order endpoint.
	pub async fn fetch_quote(&self, request: &SwapRequest) -> SwapResult<Quote> {
		let request = request.normalize()?;
		let backend = self.fetcher.name();
		let policy = self.fetcher.policy();
		validate_pair(backend, policy, &request)?;

		info!(
			"Fetching {:?} quote {} -> {} from {}",
			request.quote_direction, request.from_asset, request.to_asset, backend
		);

		let ((refund, payout), request) = tokio::try_join!(
			async {
				self.wallet
					.swap_addresses(&request.from_asset, &request.to_asset)
					.await
					.map_err(SwapError::from)
			},
			self.resolve_amount(&request),
		)?;
		let addresses = SwapAddresses::select(&refund, &payout, policy.prefer_legacy_address);
		let fetch = fetch_request(policy, &request, Some(&addresses));

		let estimate = self.fetcher.estimate(&fetch).await?;
		self.check_limits(&request, &estimate)?;

		let order = self.fetcher.create_order(&fetch).await?;
		let quote = assemble(
			&request,
			backend,
			order,
			&addresses,
			self.fetcher.quote_lifetime(),
			current_timestamp(),
		)?;

		info!(
			"Quote {} from {}: {} {} -> {} {}, {} step(s), expires at {}",
			quote.order_id,
			backend,
			quote.from_native_amount,
			quote.request.from_asset,
			quote.to_native_amount,
			quote.request.to_asset,
			quote.steps.len(),
			quote.expires_at
		);
		Ok(quote)
	}

	/// Hands a quote to a fresh sequencer bound to this engine's wallet.
	pub fn sequencer(&self, quote: Quote) -> ExecutionSequencer {
		ExecutionSequencer::new(quote, Arc::clone(&self.wallet))
	}

	async fn resolve_amount(&self, request: &NormalizedRequest) -> SwapResult<NormalizedRequest> {
		if request.quote_direction != QuoteDirection::Max {
			return Ok(request.clone());
		}
		let amount = resolve_max_swappable(
			self.fetcher.as_ref(),
			&self.wallet,
			request,
			self.max_iterations,
		)
		.await?;
		debug!("Resolved max amount of {}: {}", request.from_asset, amount);
		Ok(request.clone().with_resolved_amount(amount))
	}

	fn check_limits(&self, request: &NormalizedRequest, estimate: &RawQuote) -> SwapResult<()> {
		let side = estimate.limit_side;
		let asset = request.asset(side);
		let invalid = |e: AmountError| SwapError::invalid_response(self.fetcher.name(), e.to_string());
		let amount = if side == request.quote_direction.side() {
			request.native_amount.clone()
		} else {
			match side {
				Side::From => to_native(&estimate.from_amount, asset),
				Side::To => to_native(&estimate.to_amount, asset),
			}
			.map_err(invalid)?
		};
		let min = estimate
			.limits
			.min
			.as_ref()
			.map(|m| to_native_ceil(m, asset))
			.transpose()
			.map_err(invalid)?;
		let max = estimate
			.limits
			.max
			.as_ref()
			.map(|m| to_native(m, asset))
			.transpose()
			.map_err(invalid)?;

		check_bounds(&amount, min.as_ref(), max.as_ref(), side).map_err(|violation| {
			info!(
				"{} rejects {} {}: {}",
				self.fetcher.name(),
				amount,
				asset,
				violation
			);
			SwapError::from(violation)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{ScriptedFetcher, ScriptedWallet};
	use bigdecimal::BigDecimal;
	use std::str::FromStr;
	use swap_types::{Asset, BoundKind, Disallowed, NativeAmount};

	fn dec(s: &str) -> BigDecimal {
		BigDecimal::from_str(s).unwrap()
	}

	fn btc() -> Asset {
		Asset::new("bitcoin", "BTC", 8)
	}

	fn eth() -> Asset {
		Asset::new("ethereum", "ETH", 18)
	}

	fn limited_estimate(request: &FetchRequest) -> SwapResult<RawQuote> {
		Ok(RawQuote::estimate(dec(&request.amount), dec("16"))
			.with_limits(Some(dec("0.001")), Some(dec("10"))))
	}

	fn deposit_order(request: &FetchRequest) -> SwapResult<RawQuote> {
		assert_eq!(request.refund_address.as_deref(), Some("bitcoin-address"));
		Ok(RawQuote::estimate(dec(&request.amount), dec("16"))
			.with_deposit("bc1qdeposit", None)
			.with_order_id("order-1")
			.firm())
	}

	fn engine(fetcher: ScriptedFetcher, balance: u64) -> (SwapEngine, Arc<ScriptedFetcher>) {
		let fetcher = Arc::new(fetcher);
		let wallet = Arc::new(WalletService::new(Box::new(ScriptedWallet::new(balance))));
		(
			SwapEngine::new(Box::new(SharedFetcher(Arc::clone(&fetcher))), wallet),
			fetcher,
		)
	}

	/// Lets a test keep counting calls after handing the fetcher to the engine.
	struct SharedFetcher(Arc<ScriptedFetcher>);

	#[async_trait::async_trait]
	impl QuoteFetcherInterface for SharedFetcher {
		fn config_schema(&self) -> Box<dyn swap_types::ConfigSchema> {
			self.0.config_schema()
		}
		fn name(&self) -> &str {
			self.0.name()
		}
		fn policy(&self) -> &CurrencyPolicy {
			self.0.policy()
		}
		fn quote_lifetime(&self) -> std::time::Duration {
			self.0.quote_lifetime()
		}
		async fn estimate(&self, request: &FetchRequest) -> SwapResult<RawQuote> {
			self.0.estimate(request).await
		}
		async fn create_order(&self, request: &FetchRequest) -> SwapResult<RawQuote> {
			self.0.create_order(request).await
		}
	}

	#[tokio::test]
	async fn test_quote_within_limits() {
		let (engine, fetcher) = engine(
			ScriptedFetcher::new(limited_estimate).with_order(deposit_order),
			0,
		);
		let quote = engine
			.fetch_quote(&SwapRequest::new(btc(), eth(), "100000000", QuoteDirection::From))
			.await
			.unwrap();

		assert_eq!(quote.backend, "scripted");
		assert_eq!(quote.steps.len(), 1);
		assert_eq!(quote.steps[0].target_address, "bc1qdeposit");
		assert_eq!(quote.refund_address, "bitcoin-address");
		assert_eq!(quote.payout_address, "ethereum-address");
		assert_eq!(fetcher.order_calls(), 1);
	}

	#[tokio::test]
	async fn test_below_minimum_never_orders() {
		let (engine, fetcher) = engine(
			ScriptedFetcher::new(limited_estimate).with_order(deposit_order),
			0,
		);
		let error = engine
			.fetch_quote(&SwapRequest::new(btc(), eth(), "10000", QuoteDirection::From))
			.await
			.unwrap_err();

		match error {
			SwapError::LimitViolation(violation) => {
				assert_eq!(violation.bound_kind, BoundKind::BelowMinimum);
				assert_eq!(violation.bound, NativeAmount::from(100_000u64));
				assert_eq!(violation.side, Side::From);
			}
			other => panic!("unexpected error: {:?}", other),
		}
		assert_eq!(fetcher.order_calls(), 0);
	}

	#[tokio::test]
	async fn test_above_maximum() {
		let (engine, _) = engine(
			ScriptedFetcher::new(limited_estimate).with_order(deposit_order),
			0,
		);
		let error = engine
			.fetch_quote(&SwapRequest::new(btc(), eth(), "1100000000", QuoteDirection::From))
			.await
			.unwrap_err();
		assert!(matches!(
			error,
			SwapError::LimitViolation(v) if v.bound_kind == BoundKind::AboveMaximum
		));
	}

	#[tokio::test]
	async fn test_unrepresentable_limit_is_invalid_response() {
		let (engine, fetcher) = engine(
			ScriptedFetcher::new(|request| {
				Ok(RawQuote::estimate(dec(&request.amount), dec("16"))
					.with_limits(None, Some(dec("1e4294967288"))))
			})
			.with_order(deposit_order),
			0,
		);
		let error = engine
			.fetch_quote(&SwapRequest::new(btc(), eth(), "100000000", QuoteDirection::From))
			.await
			.unwrap_err();
		assert!(matches!(error, SwapError::InvalidResponse { .. }));
		assert!(!error.is_retryable());
		assert_eq!(fetcher.order_calls(), 0);
	}

	#[tokio::test]
	async fn test_disallowed_pair_fails_before_network() {
		let fetcher = ScriptedFetcher::new(limited_estimate)
			.with_policy(CurrencyPolicy::new().disallow_to("ethereum", Disallowed::all()));
		let (engine, fetcher) = engine(fetcher, 0);

		let error = engine
			.fetch_quote(&SwapRequest::new(btc(), eth(), "100000000", QuoteDirection::From))
			.await
			.unwrap_err();
		assert!(matches!(error, SwapError::UnsupportedPair { .. }));
		assert_eq!(fetcher.estimate_calls(), 0);
	}

	#[tokio::test]
	async fn test_max_request_spends_balance_minus_fee() {
		let fetcher = ScriptedFetcher::new(|request| {
			Ok(RawQuote::estimate(dec(&request.amount), dec("16")).with_network_fee(dec("0.0001")))
		})
		.with_order(deposit_order);
		let (engine, _) = engine(fetcher, 100_000_000);

		let quote = engine
			.fetch_quote(&SwapRequest::new(btc(), eth(), "0", QuoteDirection::Max))
			.await
			.unwrap();
		assert_eq!(quote.from_native_amount, NativeAmount::from(99_990_000u64));
		assert_eq!(quote.request.quote_direction, QuoteDirection::From);
	}

	#[tokio::test]
	async fn test_transcribed_networks_and_legacy_addresses() {
		let policy = CurrencyPolicy::new()
			.transcribe_as("bitcoin", "btc")
			.with_legacy_addresses();
		let fetcher = ScriptedFetcher::new(limited_estimate)
			.with_policy(policy)
			.with_order(|request| {
				assert_eq!(request.from_network, "btc");
				assert_eq!(request.to_network, "ethereum");
				assert_eq!(request.amount, "1");
				assert_eq!(request.refund_address.as_deref(), Some("bitcoin-legacy"));
				Ok(RawQuote::estimate(dec("1"), dec("16")).with_deposit("1Deposit", None))
			});
		let (engine, _) = engine(fetcher, 0);

		let quote = engine
			.fetch_quote(&SwapRequest::new(btc(), eth(), "100000000", QuoteDirection::From))
			.await
			.unwrap();
		assert!(quote.is_estimate);
	}
}
