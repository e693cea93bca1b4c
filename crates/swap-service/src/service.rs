//! Wiring from configuration to a ready engine.

use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use swap_config::EngineConfig;
use swap_core::SwapEngine;
use swap_types::Asset;
use swap_wallet::WalletService;
use tracing::info;

/// Parses `CODE@network` into an asset.
pub fn parse_asset(spec: &str, decimals: u32, token_id: Option<&str>) -> Result<Asset> {
	let (code, network) = spec
		.split_once('@')
		.ok_or_else(|| anyhow!("Asset '{}' must look like CODE@network", spec))?;
	if code.is_empty() || network.is_empty() {
		bail!("Asset '{}' must look like CODE@network", spec);
	}

	let asset = Asset::new(network, code, decimals);
	Ok(match token_id {
		Some(id) => asset.with_token_id(id),
		None => asset,
	})
}

/// Builds the configured wallet runtime.
pub fn build_wallet(config: &EngineConfig) -> Result<Arc<WalletService>> {
	let provider = match config.wallet.kind.as_str() {
		"memory" => swap_wallet::implementations::memory::create_wallet(
			&config.wallet.settings_value(),
		)
		.context("Failed to create memory wallet")?,
		other => bail!("Unknown wallet kind '{}'", other),
	};
	Ok(Arc::new(WalletService::new(provider)))
}

/// Builds an engine for `backend`, or for the first enabled backend.
pub fn build_engine(
	config: &EngineConfig,
	backend: Option<&str>,
	wallet: Arc<WalletService>,
) -> Result<SwapEngine> {
	let (name, backend_config) = match backend {
		Some(name) => config
			.backend(name)
			.map(|b| (name.to_string(), b))
			.ok_or_else(|| anyhow!("Backend '{}' is not configured or disabled", name))?,
		None => config
			.enabled_backends()
			.next()
			.map(|(name, b)| (name.clone(), b))
			.ok_or_else(|| anyhow!("No enabled backend"))?,
	};

	let fetcher = swap_fetcher::create_fetcher(
		&backend_config.kind,
		&name,
		&backend_config.settings_value(),
		backend_config.policy.clone(),
		backend_config.quote_lifetime(),
	)
	.with_context(|| format!("Failed to create backend '{}'", name))?;

	info!("Using backend {} ({})", name, backend_config.kind);
	Ok(SwapEngine::new(fetcher, wallet).with_max_iterations(config.engine.max_iterations))
}
