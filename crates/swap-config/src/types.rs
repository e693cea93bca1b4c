//! Configuration types for the swap engine host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use swap_types::CurrencyPolicy;

/// Complete engine configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
	/// Engine-wide settings
	#[serde(default)]
	pub engine: EngineSettings,
	/// Wallet runtime the engine talks to
	#[serde(default)]
	pub wallet: WalletConfig,
	/// Backends by name
	#[serde(default)]
	pub backends: BTreeMap<String, BackendConfig>,
}

impl EngineConfig {
	/// Enabled backends, ordered by name.
	pub fn enabled_backends(&self) -> impl Iterator<Item = (&String, &BackendConfig)> {
		self.backends.iter().filter(|(_, backend)| backend.enabled)
	}

	/// An enabled backend by name.
	pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
		self.backends.get(name).filter(|backend| backend.enabled)
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
	/// Probe budget of the max-swappable resolver
	#[serde(default = "default_max_iterations")]
	pub max_iterations: u32,
	/// Log filter used when `RUST_LOG` is unset
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			max_iterations: default_max_iterations(),
			log_level: default_log_level(),
		}
	}
}

/// Wallet runtime selection; remaining keys are the runtime's own settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
	#[serde(default = "default_wallet_kind")]
	pub kind: String,
	#[serde(flatten)]
	pub settings: toml::Table,
}

impl Default for WalletConfig {
	fn default() -> Self {
		Self {
			kind: default_wallet_kind(),
			settings: toml::Table::new(),
		}
	}
}

impl WalletConfig {
	pub fn settings_value(&self) -> toml::Value {
		toml::Value::Table(self.settings.clone())
	}
}

/// One backend; keys other than the ones below go to the adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
	/// Adapter kind (`exchange` or `aggregator`)
	pub kind: String,
	#[serde(default = "default_true")]
	pub enabled: bool,
	/// Seconds an assembled quote stays executable
	#[serde(default = "default_quote_lifetime_secs")]
	pub quote_lifetime_secs: u64,
	#[serde(default)]
	pub policy: CurrencyPolicy,
	#[serde(flatten)]
	pub settings: toml::Table,
}

impl BackendConfig {
	pub fn quote_lifetime(&self) -> Duration {
		Duration::from_secs(self.quote_lifetime_secs)
	}

	pub fn settings_value(&self) -> toml::Value {
		toml::Value::Table(self.settings.clone())
	}
}

fn default_max_iterations() -> u32 {
	5
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_wallet_kind() -> String {
	"memory".to_string()
}

fn default_true() -> bool {
	true
}

fn default_quote_lifetime_secs() -> u64 {
	600
}
