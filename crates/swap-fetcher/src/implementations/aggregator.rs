//! On-chain DEX aggregator adapter.
//!
//! Same-network swaps only. The estimate comes from `GET /v1/quote`; the
//! order call `GET /v1/build` returns the transactions to sign: an optional
//! token approval followed by the router swap call. The build reply is bound
//! to the taker address and therefore firm.

use crate::http::{self, ErrorBody, HttpSettings};
use crate::{FetchRequest, QuoteFetcherInterface};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use swap_types::{
	Asset, ConfigSchema, CurrencyPolicy, Field, FieldType, NativeAmount, RawLimits, RawQuote,
	RawStep, Schema, Side, StepKind, SwapError, SwapResult, ValidationError,
};
use tracing::{debug, info};

/// Token id the aggregator uses for a network's native coin.
const NATIVE_TOKEN: &str = "native";

// ================================
// AGGREGATOR API MODELS
// ================================

/// Reply of `GET /v1/quote`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
	pub sell_amount: BigDecimal,
	pub buy_amount: BigDecimal,
	/// Gas cost estimate in the network's native coin.
	#[serde(default)]
	pub estimated_gas: Option<BigDecimal>,
	#[serde(default)]
	pub min_sell_amount: Option<BigDecimal>,
	#[serde(default)]
	pub max_sell_amount: Option<BigDecimal>,
}

/// Transaction entry in a build reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTransaction {
	#[serde(rename = "type")]
	pub kind: StepKind,
	pub to: String,
	/// Hex-encoded calldata, `0x` prefixed.
	#[serde(default)]
	pub data: String,
	/// Fee cap in native units of the network coin.
	#[serde(default)]
	pub max_fee: Option<NativeAmount>,
}

/// Reply of `GET /v1/build`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
	pub id: String,
	pub sell_amount: BigDecimal,
	pub buy_amount: BigDecimal,
	pub transactions: Vec<BuildTransaction>,
}

/// Error code for a pair without a route.
const NO_ROUTE: &str = "no_route";

fn is_unsupported(status: StatusCode, body: &ErrorBody) -> bool {
	status == StatusCode::NOT_FOUND && body.code.as_deref() == Some(NO_ROUTE)
}

fn token_param(asset: &Asset) -> String {
	asset
		.token_id
		.clone()
		.unwrap_or_else(|| NATIVE_TOKEN.to_string())
}

/// Adapter for an on-chain swap aggregator.
pub struct AggregatorFetcher {
	name: String,
	settings: HttpSettings,
	policy: CurrencyPolicy,
	quote_lifetime: Duration,
	/// Slippage tolerance in basis points sent with build requests.
	slippage_bps: u32,
	client: Client,
}

impl AggregatorFetcher {
	pub fn new(
		name: impl Into<String>,
		settings: HttpSettings,
		policy: CurrencyPolicy,
		quote_lifetime: Duration,
		slippage_bps: u32,
	) -> Result<Self, ValidationError> {
		let client = settings.build_client()?;
		Ok(Self {
			name: name.into(),
			settings,
			policy,
			quote_lifetime,
			slippage_bps,
			client,
		})
	}

	/// Cross-network requests never reach the backend.
	fn ensure_same_network(&self, request: &FetchRequest) -> SwapResult<()> {
		if request.from_network != request.to_network {
			return Err(SwapError::UnsupportedPair {
				backend: self.name.clone(),
				from: request.request.from_asset.to_string(),
				to: request.request.to_asset.to_string(),
			});
		}
		Ok(())
	}

	fn query(&self, request: &FetchRequest) -> Vec<(&'static str, String)> {
		let amount_key = match request.direction_label() {
			"to" => "buyAmount",
			_ => "sellAmount",
		};
		vec![
			("chain", request.from_network.clone()),
			("sellToken", token_param(&request.request.from_asset)),
			("buyToken", token_param(&request.request.to_asset)),
			(amount_key, request.amount.clone()),
		]
	}

	fn parse_steps(&self, transactions: Vec<BuildTransaction>) -> SwapResult<Vec<RawStep>> {
		transactions
			.into_iter()
			.map(|tx| {
				let data = tx.data.strip_prefix("0x").unwrap_or(&tx.data);
				let payload = hex::decode(data).map_err(|e| {
					SwapError::invalid_response(&self.name, format!("Bad calldata: {}", e))
				})?;
				Ok(RawStep {
					kind: tx.kind,
					target_address: tx.to,
					payload,
					fee_override: tx.max_fee,
				})
			})
			.collect()
	}
}

/// Configuration schema for AggregatorFetcher.
pub struct AggregatorFetcherSchema;

impl ConfigSchema for AggregatorFetcherSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let (required, mut optional) = HttpSettings::schema_fields();
		optional.push(Field::new(
			"slippage_bps",
			FieldType::Integer {
				min: Some(0),
				max: Some(5_000),
			},
		));
		Schema::new(required, optional).validate(config)
	}
}

#[async_trait]
impl QuoteFetcherInterface for AggregatorFetcher {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AggregatorFetcherSchema)
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn policy(&self) -> &CurrencyPolicy {
		&self.policy
	}

	fn quote_lifetime(&self) -> Duration {
		self.quote_lifetime
	}

	async fn estimate(&self, request: &FetchRequest) -> SwapResult<RawQuote> {
		self.ensure_same_network(request)?;
		debug!(
			"Requesting {} quote on {} for {}",
			self.name, request.from_network, request.amount
		);

		let response = self
			.client
			.get(self.settings.url("/v1/quote"))
			.query(&self.query(request))
			.send()
			.await
			.map_err(|e| http::transport_error(&self.name, e))?;

		let quote: QuoteResponse =
			http::read_json(&self.name, &request.request, response, is_unsupported).await?;

		let mut raw = RawQuote::estimate(quote.sell_amount, quote.buy_amount)
			.with_limits(quote.min_sell_amount, quote.max_sell_amount);
		// Gas is paid in the network coin; it only reserves from the balance
		// when the coin itself is what is being sold.
		if !request.request.from_asset.is_token() {
			raw.network_fee = quote.estimated_gas;
		}
		Ok(raw)
	}

	async fn create_order(&self, request: &FetchRequest) -> SwapResult<RawQuote> {
		self.ensure_same_network(request)?;
		let taker = request.refund_address.as_deref().ok_or_else(|| {
			SwapError::InvalidRequest("Taker address is required to build a swap".to_string())
		})?;
		let recipient = request.payout_address.as_deref().unwrap_or(taker);

		let mut query = self.query(request);
		query.push(("taker", taker.to_string()));
		query.push(("recipient", recipient.to_string()));
		query.push(("slippageBps", self.slippage_bps.to_string()));

		let response = self
			.client
			.get(self.settings.url("/v1/build"))
			.query(&query)
			.send()
			.await
			.map_err(|e| http::transport_error(&self.name, e))?;

		let build: BuildResponse =
			http::read_json(&self.name, &request.request, response, is_unsupported).await?;

		let steps = self.parse_steps(build.transactions)?;
		match steps.last() {
			Some(last) if last.kind == StepKind::Swap => {}
			_ => {
				return Err(SwapError::invalid_response(
					&self.name,
					"Build reply does not end with a swap transaction",
				))
			}
		}

		info!(
			"{} built swap {} with {} transaction(s)",
			self.name,
			build.id,
			steps.len()
		);

		Ok(RawQuote {
			order_id: Some(build.id),
			deposit_address: None,
			memo: None,
			limits: RawLimits::default(),
			limit_side: Side::From,
			from_amount: build.sell_amount,
			to_amount: build.buy_amount,
			network_fee: None,
			steps,
			is_firm: true,
		})
	}
}

/// Factory function to create an aggregator fetcher from configuration.
///
/// Configuration parameters:
/// - `base_url`: API root (required)
/// - `api_key`: sent in `api_key_header` (default `authorization`)
/// - `timeout_ms`: request timeout (default 10000)
/// - `slippage_bps`: slippage tolerance for built swaps (default 50)
pub fn create_fetcher(
	name: &str,
	settings: &toml::Value,
	policy: CurrencyPolicy,
	quote_lifetime: Duration,
) -> Result<Box<dyn crate::QuoteFetcherInterface>, ValidationError> {
	AggregatorFetcherSchema.validate(settings)?;
	let http_settings = HttpSettings::from_toml(settings, "authorization");
	let slippage_bps = settings
		.get("slippage_bps")
		.and_then(|v| v.as_integer())
		.unwrap_or(50) as u32;

	Ok(Box::new(AggregatorFetcher::new(
		name,
		http_settings,
		policy,
		quote_lifetime,
		slippage_bps,
	)?))
}
