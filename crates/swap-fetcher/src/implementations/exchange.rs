//! Centralized exchange adapter.
//!
//! Deposit-address flow: an estimate call returns amounts, limits and the
//! network fee; the order call returns a deposit address (plus memo or extra
//! id for shared-address ledgers) bound to the caller's payout address.
//! Limits are expressed in the from currency.

use crate::http::{self, ErrorBody, HttpSettings};
use crate::{FetchRequest, QuoteFetcherInterface};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swap_types::{
	ConfigSchema, CurrencyPolicy, RawLimits, RawQuote, Side, SwapError, SwapResult,
	ValidationError,
};
use tracing::{debug, info};

// ================================
// EXCHANGE API MODELS
// ================================

/// Reply of `GET /v1/estimate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
	pub from_amount: BigDecimal,
	pub to_amount: BigDecimal,
	#[serde(default)]
	pub min_amount: Option<BigDecimal>,
	#[serde(default)]
	pub max_amount: Option<BigDecimal>,
	#[serde(default)]
	pub network_fee: Option<BigDecimal>,
}

/// Body of `POST /v1/orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody<'a> {
	pub from: String,
	pub to: String,
	pub from_network: &'a str,
	pub to_network: &'a str,
	pub amount: &'a str,
	pub direction: &'a str,
	pub refund_address: &'a str,
	pub payout_address: &'a str,
}

/// Reply of `POST /v1/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
	pub id: String,
	pub deposit_address: String,
	#[serde(default, alias = "depositMemo")]
	pub deposit_extra_id: Option<String>,
	pub from_amount: BigDecimal,
	pub to_amount: BigDecimal,
	#[serde(default)]
	pub min_amount: Option<BigDecimal>,
	#[serde(default)]
	pub max_amount: Option<BigDecimal>,
}

/// Error code the exchange uses for pairs it does not serve.
const PAIR_NOT_SUPPORTED: &str = "pair_not_supported";

fn is_unsupported(status: StatusCode, body: &ErrorBody) -> bool {
	status == StatusCode::UNPROCESSABLE_ENTITY
		|| body.code.as_deref() == Some(PAIR_NOT_SUPPORTED)
}

/// Adapter for a deposit-address exchange API.
pub struct ExchangeFetcher {
	name: String,
	settings: HttpSettings,
	policy: CurrencyPolicy,
	quote_lifetime: Duration,
	client: Client,
}

impl ExchangeFetcher {
	pub fn new(
		name: impl Into<String>,
		settings: HttpSettings,
		policy: CurrencyPolicy,
		quote_lifetime: Duration,
	) -> Result<Self, ValidationError> {
		let client = settings.build_client()?;
		Ok(Self {
			name: name.into(),
			settings,
			policy,
			quote_lifetime,
			client,
		})
	}

	fn query(&self, request: &FetchRequest) -> Vec<(&'static str, String)> {
		vec![
			("from", request.request.from_asset.currency_code.to_lowercase()),
			("to", request.request.to_asset.currency_code.to_lowercase()),
			("fromNetwork", request.from_network.clone()),
			("toNetwork", request.to_network.clone()),
			("amount", request.amount.clone()),
			("direction", request.direction_label().to_string()),
		]
	}
}

/// Configuration schema for ExchangeFetcher.
pub struct ExchangeFetcherSchema;

impl ConfigSchema for ExchangeFetcherSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		HttpSettings::schema().validate(config)
	}
}

#[async_trait]
impl QuoteFetcherInterface for ExchangeFetcher {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(ExchangeFetcherSchema)
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
		debug!(
			"Requesting {} estimate for {} {} -> {}",
			self.name, request.amount, request.request.from_asset, request.request.to_asset
		);

		let response = self
			.client
			.get(self.settings.url("/v1/estimate"))
			.query(&self.query(request))
			.send()
			.await
			.map_err(|e| http::transport_error(&self.name, e))?;

		let estimate: EstimateResponse =
			http::read_json(&self.name, &request.request, response, is_unsupported).await?;

		let mut raw = RawQuote::estimate(estimate.from_amount, estimate.to_amount)
			.with_limits(estimate.min_amount, estimate.max_amount);
		raw.network_fee = estimate.network_fee;
		Ok(raw)
	}

	async fn create_order(&self, request: &FetchRequest) -> SwapResult<RawQuote> {
		let refund_address = request.refund_address.as_deref().ok_or_else(|| {
			SwapError::InvalidRequest("Refund address is required to create an order".to_string())
		})?;
		let payout_address = request.payout_address.as_deref().ok_or_else(|| {
			SwapError::InvalidRequest("Payout address is required to create an order".to_string())
		})?;

		let body = CreateOrderBody {
			from: request.request.from_asset.currency_code.to_lowercase(),
			to: request.request.to_asset.currency_code.to_lowercase(),
			from_network: &request.from_network,
			to_network: &request.to_network,
			amount: &request.amount,
			direction: request.direction_label(),
			refund_address,
			payout_address,
		};

		let response = self
			.client
			.post(self.settings.url("/v1/orders"))
			.json(&body)
			.send()
			.await
			.map_err(|e| http::transport_error(&self.name, e))?;

		let order: OrderResponse =
			http::read_json(&self.name, &request.request, response, is_unsupported).await?;

		if order.deposit_address.trim().is_empty() {
			return Err(SwapError::invalid_response(
				&self.name,
				"Order has no deposit address",
			));
		}

		info!("{} created order {}", self.name, order.id);

		Ok(RawQuote {
			order_id: Some(order.id),
			deposit_address: Some(order.deposit_address),
			memo: order.deposit_extra_id.filter(|m| !m.is_empty()),
			limits: RawLimits {
				min: order.min_amount,
				max: order.max_amount,
			},
			limit_side: Side::From,
			from_amount: order.from_amount,
			to_amount: order.to_amount,
			network_fee: None,
			steps: Vec::new(),
			is_firm: true,
		})
	}
}

/// Factory function to create an exchange fetcher from configuration.
///
/// Configuration parameters:
/// - `base_url`: API root (required)
/// - `api_key`: sent in `api_key_header` (default `x-api-key`)
/// - `timeout_ms`: request timeout (default 10000)
pub fn create_fetcher(
	name: &str,
	settings: &toml::Value,
	policy: CurrencyPolicy,
	quote_lifetime: Duration,
) -> Result<Box<dyn crate::QuoteFetcherInterface>, ValidationError> {
	ExchangeFetcherSchema.validate(settings)?;
	let http_settings = HttpSettings::from_toml(settings, "x-api-key");
	Ok(Box::new(ExchangeFetcher::new(
		name,
		http_settings,
		policy,
		quote_lifetime,
	)?))
}
