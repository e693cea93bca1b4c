//! Per-backend currency policy tables.
//!
//! Backend quirks (unsupported networks, blacklisted codes, network label
//! spellings, legacy address preference) are data, not branching code. Each
//! backend carries one `CurrencyPolicy` value loaded from configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// What is disallowed on a given network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Disallowed {
	/// Every code on the network. Written as the string `"all"` in config.
	All(AllMarker),
	/// Only the listed currency codes.
	Codes(BTreeSet<String>),
}

/// Marker for a wholly disallowed network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllMarker {
	All,
}

impl Disallowed {
	pub fn all() -> Self {
		Disallowed::All(AllMarker::All)
	}

	pub fn codes<I, S>(codes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Disallowed::Codes(codes.into_iter().map(|c| c.into().to_uppercase()).collect())
	}

	/// Whether `code` is disallowed under this entry.
	pub fn covers(&self, code: &str) -> bool {
		match self {
			Disallowed::All(_) => true,
			Disallowed::Codes(codes) => codes.iter().any(|c| c.eq_ignore_ascii_case(code)),
		}
	}
}

/// Currency policy of a single backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPolicy {
	/// Networks and codes that cannot be sent to the backend.
	#[serde(default)]
	pub disallowed_from: HashMap<String, Disallowed>,
	/// Networks and codes the backend cannot pay out.
	#[serde(default)]
	pub disallowed_to: HashMap<String, Disallowed>,
	/// Wallet network id to backend network label.
	#[serde(default)]
	pub transcription: HashMap<String, String>,
	/// Only networks present in `transcription` are served.
	#[serde(default)]
	pub whitelist_networks: bool,
	/// Use the wallet's legacy address format when one exists.
	#[serde(default)]
	pub prefer_legacy_address: bool,
}

impl CurrencyPolicy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn disallow_from(mut self, network: impl Into<String>, entry: Disallowed) -> Self {
		self.disallowed_from.insert(network.into(), entry);
		self
	}

	pub fn disallow_to(mut self, network: impl Into<String>, entry: Disallowed) -> Self {
		self.disallowed_to.insert(network.into(), entry);
		self
	}

	pub fn transcribe_as(mut self, network: impl Into<String>, label: impl Into<String>) -> Self {
		self.transcription.insert(network.into(), label.into());
		self
	}

	pub fn with_whitelisted_networks(mut self) -> Self {
		self.whitelist_networks = true;
		self
	}

	pub fn with_legacy_addresses(mut self) -> Self {
		self.prefer_legacy_address = true;
		self
	}
}
