//! Pair eligibility checks against a backend's currency policy.

use std::collections::HashMap;
use swap_types::{Asset, CurrencyPolicy, Disallowed, NormalizedRequest, SwapError, SwapResult};

fn lookup<'a, V>(table: &'a HashMap<String, V>, network: &str) -> Option<&'a V> {
	table
		.get(network)
		.or_else(|| {
			table
				.iter()
				.find(|(key, _)| key.eq_ignore_ascii_case(network))
				.map(|(_, value)| value)
		})
}

fn leg_disallowed(table: &HashMap<String, Disallowed>, asset: &Asset) -> bool {
	lookup(table, &asset.network)
		.map(|entry| entry.covers(&asset.currency_code))
		.unwrap_or(false)
}

fn unsupported(backend: &str, request: &NormalizedRequest) -> SwapError {
	SwapError::UnsupportedPair {
		backend: backend.to_string(),
		from: request.from_asset.to_string(),
		to: request.to_asset.to_string(),
	}
}

/// Whether neither leg of the request is blacklisted.
pub fn is_pair_allowed(policy: &CurrencyPolicy, request: &NormalizedRequest) -> bool {
	!leg_disallowed(&policy.disallowed_from, &request.from_asset)
		&& !leg_disallowed(&policy.disallowed_to, &request.to_asset)
}

/// Backend label for a wallet network id. Unmapped ids pass through.
pub fn transcribe(policy: &CurrencyPolicy, network: &str) -> String {
	lookup(&policy.transcription, network)
		.cloned()
		.unwrap_or_else(|| network.to_string())
}

/// Rejects requests touching a network missing from the transcription table.
pub fn enforce_whitelisted_networks(
	backend: &str,
	policy: &CurrencyPolicy,
	request: &NormalizedRequest,
) -> SwapResult<()> {
	let served = |asset: &Asset| lookup(&policy.transcription, &asset.network).is_some();
	if served(&request.from_asset) && served(&request.to_asset) {
		Ok(())
	} else {
		Err(unsupported(backend, request))
	}
}

/// Every policy check the engine runs before talking to a backend.
pub fn validate_pair(
	backend: &str,
	policy: &CurrencyPolicy,
	request: &NormalizedRequest,
) -> SwapResult<()> {
	if !is_pair_allowed(policy, request) {
		return Err(unsupported(backend, request));
	}
	if policy.whitelist_networks {
		enforce_whitelisted_networks(backend, policy, request)?;
	}
	Ok(())
}
