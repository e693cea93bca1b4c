//! Quote fetchers: the per-backend half of the swap engine.
//!
//! Every backend is reached through `QuoteFetcherInterface`. An adapter owns
//! its wire format, authentication and endpoints; the engine only sees the
//! `RawQuote` each adapter parses out of its replies. Adapters never retry.
//! Transport failures, unsupported pairs and other non-2xx statuses are
//! classified at the HTTP boundary and returned to the caller as is.

use async_trait::async_trait;
use std::time::Duration;
use swap_types::{
	ConfigSchema, CurrencyPolicy, NormalizedRequest, QuoteDirection, RawQuote, SwapResult,
	ValidationError,
};

pub mod http;

/// Re-export implementations
pub mod implementations {
	pub mod aggregator;
	pub mod exchange;
}

/// A normalized request as presented to a backend.
#[derive(Debug, Clone)]
pub struct FetchRequest {
	pub request: NormalizedRequest,
	/// Backend label of the from network after transcription.
	pub from_network: String,
	/// Backend label of the to network after transcription.
	pub to_network: String,
	/// Amount in the denomination of the side named by the direction.
	pub amount: String,
	/// Refund address on the from network. Absent for estimates made
	/// before address lookup finished.
	pub refund_address: Option<String>,
	/// Payout address on the to network.
	pub payout_address: Option<String>,
}

impl FetchRequest {
	pub fn direction(&self) -> QuoteDirection {
		self.request.quote_direction
	}

	/// Wire name of the direction. `max` is never sent; it is resolved first.
	pub fn direction_label(&self) -> &'static str {
		match self.request.quote_direction {
			QuoteDirection::To => "to",
			QuoteDirection::From | QuoteDirection::Max => "from",
		}
	}
}

/// Interface every backend adapter implements.
#[async_trait]
pub trait QuoteFetcherInterface: Send + Sync {
	/// Returns the settings schema for this adapter.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Configured backend name.
	fn name(&self) -> &str;

	/// Currency policy table of this backend.
	fn policy(&self) -> &CurrencyPolicy;

	/// How long an assembled quote stays executable.
	fn quote_lifetime(&self) -> Duration;

	/// Preliminary, idempotent quote. Limits and fee reservations come from here.
	async fn estimate(&self, request: &FetchRequest) -> SwapResult<RawQuote>;

	/// Authoritative order call. Commits backend-side state, so it is made at
	/// most once per quote.
	async fn create_order(&self, request: &FetchRequest) -> SwapResult<RawQuote>;
}

/// Settings schema of the adapter registered under `kind`.
pub fn fetcher_schema(kind: &str) -> Option<Box<dyn ConfigSchema>> {
	match kind {
		"exchange" => Some(Box::new(implementations::exchange::ExchangeFetcherSchema)),
		"aggregator" => Some(Box::new(implementations::aggregator::AggregatorFetcherSchema)),
		_ => None,
	}
}

/// Factory function to create a fetcher from configuration.
///
/// `kind` selects the adapter (`exchange` or `aggregator`); `settings` is the
/// adapter's own table, validated against its schema before construction.
pub fn create_fetcher(
	kind: &str,
	name: &str,
	settings: &toml::Value,
	policy: CurrencyPolicy,
	quote_lifetime: Duration,
) -> Result<Box<dyn QuoteFetcherInterface>, ValidationError> {
	match kind {
		"exchange" => implementations::exchange::create_fetcher(name, settings, policy, quote_lifetime),
		"aggregator" => {
			implementations::aggregator::create_fetcher(name, settings, policy, quote_lifetime)
		}
		other => Err(ValidationError::InvalidValue {
			field: "kind".to_string(),
			message: format!("Unknown backend kind '{}'", other),
		}),
	}
}
