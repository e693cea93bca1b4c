//! HTTP plumbing shared by the adapters.
//!
//! Builds per-backend clients and classifies replies into the engine's error
//! taxonomy: transport failures become `BackendUnavailable`, replies the
//! adapter recognizes as "pair not served" become `UnsupportedPair`, any
//! other non-2xx becomes `BackendProtocol` with the status attached, and a
//! 2xx body that does not match the adapter's schema is `InvalidResponse`.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use swap_types::{
	Field, FieldType, NormalizedRequest, Schema, SwapError, SwapResult, ValidationError,
};
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_USER_AGENT: &str = "swap-engine/0.1";

/// Connection settings common to every HTTP adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
	pub base_url: String,
	pub api_key: Option<String>,
	pub api_key_header: String,
	pub timeout: Duration,
}

impl HttpSettings {
	/// Fields every HTTP adapter accepts. Adapters extend these.
	pub fn schema_fields() -> (Vec<Field>, Vec<Field>) {
		(
			vec![Field::new("base_url", FieldType::Url)],
			vec![
				Field::new("api_key", FieldType::String),
				Field::new("api_key_header", FieldType::String),
				Field::new(
					"timeout_ms",
					FieldType::Integer {
						min: Some(1),
						max: Some(120_000),
					},
				),
			],
		)
	}

	pub fn schema() -> Schema {
		let (required, optional) = Self::schema_fields();
		Schema::new(required, optional)
	}

	/// Reads settings from an adapter table. Call after schema validation.
	pub fn from_toml(config: &toml::Value, default_key_header: &str) -> Self {
		let base_url = config
			.get("base_url")
			.and_then(|v| v.as_str())
			.unwrap_or_default()
			.trim_end_matches('/')
			.to_string();
		let timeout_ms = config
			.get("timeout_ms")
			.and_then(|v| v.as_integer())
			.map(|ms| ms as u64)
			.unwrap_or(DEFAULT_TIMEOUT_MS);

		Self {
			base_url,
			api_key: config
				.get("api_key")
				.and_then(|v| v.as_str())
				.filter(|k| !k.is_empty())
				.map(String::from),
			api_key_header: config
				.get("api_key_header")
				.and_then(|v| v.as_str())
				.unwrap_or(default_key_header)
				.to_string(),
			timeout: Duration::from_millis(timeout_ms),
		}
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	/// Builds a client with the timeout, user agent and API key header set.
	pub fn build_client(&self) -> Result<Client, ValidationError> {
		let mut headers = HeaderMap::new();
		headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

		if let Some(key) = &self.api_key {
			let name = HeaderName::from_bytes(self.api_key_header.as_bytes()).map_err(|e| {
				ValidationError::InvalidValue {
					field: "api_key_header".to_string(),
					message: e.to_string(),
				}
			})?;
			let mut value =
				HeaderValue::from_str(key).map_err(|e| ValidationError::InvalidValue {
					field: "api_key".to_string(),
					message: e.to_string(),
				})?;
			value.set_sensitive(true);
			headers.insert(name, value);
		}

		Client::builder()
			.timeout(self.timeout)
			.default_headers(headers)
			.build()
			.map_err(|e| ValidationError::InvalidValue {
				field: "base_url".to_string(),
				message: format!("Failed to build HTTP client: {}", e),
			})
	}
}

/// Error body shape most backends share.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
	#[serde(default, alias = "error")]
	pub code: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
}

/// Maps a failed send to `BackendUnavailable`.
///
/// A request that could not be built (bad URL or header) fails the same way
/// on every attempt and is reported as `BackendMisconfigured` instead.
pub fn transport_error(backend: &str, error: reqwest::Error) -> SwapError {
	if error.is_builder() {
		warn!("Cannot build request to {}: {}", backend, error);
		return SwapError::BackendMisconfigured {
			backend: backend.to_string(),
			reason: error.to_string(),
		};
	}
	warn!("Transport failure talking to {}: {}", backend, error);
	let reason = if error.is_timeout() {
		"Request timed out".to_string()
	} else if error.is_connect() {
		format!("Connection failed: {}", error)
	} else {
		error.to_string()
	};
	SwapError::unavailable(backend, reason)
}

/// Reads a reply, classifying non-2xx statuses and parsing 2xx bodies.
///
/// `is_unsupported` decides, from status and error body, whether the backend
/// is saying it does not serve the requested pair.
pub async fn read_json<T, F>(
	backend: &str,
	request: &NormalizedRequest,
	response: Response,
	is_unsupported: F,
) -> SwapResult<T>
where
	T: DeserializeOwned,
	F: Fn(StatusCode, &ErrorBody) -> bool,
{
	let status = response.status();
	let body = response
		.bytes()
		.await
		.map_err(|e| transport_error(backend, e))?;

	if !status.is_success() {
		let error_body: ErrorBody = serde_json::from_slice(&body).unwrap_or_default();
		if is_unsupported(status, &error_body) {
			debug!(
				"{} does not serve {} -> {} (HTTP {})",
				backend, request.from_asset, request.to_asset, status
			);
			return Err(SwapError::UnsupportedPair {
				backend: backend.to_string(),
				from: request.from_asset.to_string(),
				to: request.to_asset.to_string(),
			});
		}

		let reason = error_body
			.message
			.or(error_body.code)
			.or_else(|| status.canonical_reason().map(String::from))
			.unwrap_or_else(|| format!("HTTP Error {}", status.as_u16()));
		return Err(SwapError::BackendProtocol {
			backend: backend.to_string(),
			status_code: status.as_u16(),
			reason,
		});
	}

	serde_json::from_slice(&body)
		.map_err(|e| SwapError::invalid_response(backend, format!("Unexpected reply: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_settings_from_toml() {
		let config: toml::Value = toml::from_str(
			r#"
base_url = "https://api.example.com/"
api_key = "secret"
timeout_ms = 2500
"#,
		)
		.unwrap();

		let settings = HttpSettings::from_toml(&config, "x-api-key");
		assert_eq!(settings.base_url, "https://api.example.com");
		assert_eq!(settings.url("/v1/estimate"), "https://api.example.com/v1/estimate");
		assert_eq!(settings.api_key.as_deref(), Some("secret"));
		assert_eq!(settings.api_key_header, "x-api-key");
		assert_eq!(settings.timeout, Duration::from_millis(2500));
		assert!(settings.build_client().is_ok());
	}

	#[test]
	fn test_schema_requires_base_url() {
		let config: toml::Value = toml::from_str("api_key = \"k\"").unwrap();
		assert!(matches!(
			HttpSettings::schema().validate(&config),
			Err(ValidationError::MissingField(f)) if f == "base_url"
		));
	}

	#[tokio::test]
	async fn test_unbuildable_request_is_not_retryable() {
		let error = Client::new()
			.get("http://exa mple.com/v1/quote")
			.send()
			.await
			.unwrap_err();
		let mapped = transport_error("router", error);
		assert!(matches!(mapped, SwapError::BackendMisconfigured { ref backend, .. } if backend == "router"));
		assert!(!mapped.is_retryable());
	}

	#[test]
	fn test_invalid_header_name_rejected() {
		let settings = HttpSettings {
			base_url: "http://localhost".to_string(),
			api_key: Some("k".to_string()),
			api_key_header: "bad header".to_string(),
			timeout: Duration::from_secs(1),
		};
		assert!(settings.build_client().is_err());
	}
}
