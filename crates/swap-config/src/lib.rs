//! Configuration loading for the swap engine host.
//!
//! Files are TOML, JSON or YAML (picked by extension). `${VAR}` references
//! are substituted from the environment before parsing, and a handful of
//! `SWAP_` variables override parsed values.

use regex::Regex;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
	Toml,
	Json,
	Yaml,
}

/// Configuration loader with environment variable substitution
#[derive(Debug, Clone)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "SWAP_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<EngineConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;
		info!("Loading configuration from {}", file_path);

		let mut config = self.load_from_file(file_path).await?;
		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<EngineConfig, ConfigError> {
		let format = match Path::new(file_path).extension().and_then(|s| s.to_str()) {
			Some("toml") => Format::Toml,
			Some("json") => Format::Json,
			Some("yaml") | Some("yml") => Format::Yaml,
			_ => {
				return Err(ConfigError::ParseError(format!(
					"Unsupported config format: {}",
					file_path
				)))
			}
		};

		let content = match tokio::fs::read_to_string(file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(file_path.to_string()))
			}
			Err(e) => return Err(e.into()),
		};

		let substituted = self.substitute_env_vars(&content)?;
		Self::parse(&substituted, format)
	}

	fn parse(content: &str, format: Format) -> Result<EngineConfig, ConfigError> {
		match format {
			Format::Toml => toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string())),
			Format::Json => {
				serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			Format::Yaml => {
				serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
		}
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut EngineConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.engine.log_level = log_level;
		}

		if let Ok(max_iterations) = env::var(format!("{}MAX_ITERATIONS", self.env_prefix)) {
			config.engine.max_iterations = max_iterations.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid max iterations: {}", e))
			})?;
		}

		Ok(())
	}

	fn validate_config(&self, config: &EngineConfig) -> Result<(), ConfigError> {
		if config.engine.max_iterations == 0 {
			return Err(ConfigError::ValidationError(
				"engine.max_iterations must be at least 1".to_string(),
			));
		}

		if config.enabled_backends().next().is_none() {
			return Err(ConfigError::ValidationError(
				"At least one backend must be enabled".to_string(),
			));
		}

		for (name, backend) in config.enabled_backends() {
			if backend.quote_lifetime_secs == 0 {
				return Err(ConfigError::ValidationError(format!(
					"backends.{}: quote_lifetime_secs must be positive",
					name
				)));
			}

			let schema = swap_fetcher::fetcher_schema(&backend.kind).ok_or_else(|| {
				ConfigError::ValidationError(format!(
					"backends.{}: unknown kind '{}'",
					name, backend.kind
				))
			})?;
			schema
				.validate(&backend.settings_value())
				.map_err(|e| ConfigError::ValidationError(format!("backends.{}: {}", name, e)))?;
		}

		match config.wallet.kind.as_str() {
			"memory" => {
				use swap_types::ConfigSchema;
				swap_wallet::implementations::memory::MemoryWalletSchema
					.validate(&config.wallet.settings_value())
					.map_err(|e| ConfigError::ValidationError(format!("wallet: {}", e)))
			}
			other => Err(ConfigError::ValidationError(format!(
				"wallet: unknown kind '{}'",
				other
			))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	const BASE: &str = r#"
[engine]
max_iterations = 7

[wallet.accounts."BTC@bitcoin"]
address = "bc1qrefund"
balance = "100000000"

[backends.fastswap]
kind = "exchange"
base_url = "https://api.fastswap.example"
api_key = "${SWAP_TEST_FASTSWAP_KEY}"

[backends.fastswap.policy]
whitelist_networks = true

[backends.fastswap.policy.transcription]
bitcoin = "btc"
ethereum = "eth"

[backends.router]
kind = "aggregator"
enabled = false
base_url = "https://router.example"
"#;

	fn write_config(content: &str, suffix: &str) -> NamedTempFile {
		let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[tokio::test]
	async fn test_load_toml_with_substitution() {
		env::set_var("SWAP_TEST_FASTSWAP_KEY", "secret-key");
		let file = write_config(BASE, ".toml");

		let config = ConfigLoader::new()
			.with_env_prefix("SWAP_TEST_A_")
			.with_file(file.path())
			.load()
			.await
			.unwrap();

		assert_eq!(config.engine.max_iterations, 7);
		assert_eq!(config.engine.log_level, "info");
		assert_eq!(config.wallet.kind, "memory");

		let backend = config.backend("fastswap").unwrap();
		assert_eq!(backend.quote_lifetime_secs, 600);
		assert!(backend.policy.whitelist_networks);
		assert_eq!(
			backend.settings.get("api_key").and_then(|v| v.as_str()),
			Some("secret-key")
		);
		assert!(config.backend("router").is_none());
		assert_eq!(config.enabled_backends().count(), 1);
	}

	#[tokio::test]
	async fn test_env_overrides() {
		env::set_var("SWAP_TEST_FASTSWAP_KEY", "secret-key");
		env::set_var("SWAP_TEST_B_LOG_LEVEL", "debug");
		env::set_var("SWAP_TEST_B_MAX_ITERATIONS", "3");
		let file = write_config(BASE, ".toml");

		let config = ConfigLoader::new()
			.with_env_prefix("SWAP_TEST_B_")
			.with_file(file.path())
			.load()
			.await
			.unwrap();
		assert_eq!(config.engine.log_level, "debug");
		assert_eq!(config.engine.max_iterations, 3);
	}

	#[tokio::test]
	async fn test_missing_env_var() {
		let file = write_config("[engine]\nlog_level = \"${SWAP_TEST_UNSET_VARIABLE}\"\n", ".toml");
		let result = ConfigLoader::new().with_file(file.path()).load().await;
		assert!(matches!(result, Err(ConfigError::EnvVarNotFound(v)) if v == "SWAP_TEST_UNSET_VARIABLE"));
	}

	#[tokio::test]
	async fn test_requires_enabled_backend() {
		let file = write_config(
			r#"
[backends.router]
kind = "aggregator"
enabled = false
base_url = "https://router.example"
"#,
			".toml",
		);
		let result = ConfigLoader::new().with_file(file.path()).load().await;
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));
	}

	#[tokio::test]
	async fn test_adapter_settings_are_validated() {
		let file = write_config(
			r#"
[backends.fastswap]
kind = "exchange"
base_url = "ftp://not-http"
"#,
			".toml",
		);
		let result = ConfigLoader::new().with_file(file.path()).load().await;
		assert!(matches!(
			result,
			Err(ConfigError::ValidationError(msg)) if msg.starts_with("backends.fastswap")
		));

		let malformed = write_config(
			"[backends.fastswap]\nkind = \"exchange\"\nbase_url = \"http://exa mple.com\"\n",
			".toml",
		);
		let result = ConfigLoader::new().with_file(malformed.path()).load().await;
		assert!(matches!(
			result,
			Err(ConfigError::ValidationError(msg)) if msg.contains("base_url")
		));

		let unknown = write_config("[backends.x]\nkind = \"orderbook\"\n", ".toml");
		let result = ConfigLoader::new().with_file(unknown.path()).load().await;
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));
	}

	#[tokio::test]
	async fn test_json_and_yaml_formats() {
		let json = write_config(
			r#"{
  "backends": {
    "router": { "kind": "aggregator", "base_url": "https://router.example", "slippage_bps": 30 }
  }
}"#,
			".json",
		);
		let config = ConfigLoader::new().with_file(json.path()).load().await.unwrap();
		assert_eq!(config.backend("router").unwrap().kind, "aggregator");

		let yaml = write_config(
			"backends:\n  fastswap:\n    kind: exchange\n    base_url: https://api.fastswap.example\n",
			".yaml",
		);
		let config = ConfigLoader::new().with_file(yaml.path()).load().await.unwrap();
		assert!(config.backend("fastswap").is_some());
	}

	#[tokio::test]
	async fn test_missing_file_and_unknown_extension() {
		let result = ConfigLoader::new()
			.with_file("/nonexistent/swap.toml")
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

		let ini = write_config("a = b", ".ini");
		let result = ConfigLoader::new().with_file(ini.path()).load().await;
		assert!(matches!(result, Err(ConfigError::ParseError(_))));
	}
}
