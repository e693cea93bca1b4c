//! In-memory wallet runtime.
//!
//! Balances and addresses come from configuration. Signing serializes the
//! step, broadcasting hands out sequential transaction ids. Useful for tests
//! and for running the quote service without a real wallet attached.

use crate::{WalletError, WalletInterface};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use swap_types::{
	Asset, ConfigSchema, Field, FieldType, NativeAmount, ReceiveAddress, Schema,
	SignedTransaction, TransactionStep, TxId, ValidationError,
};
use tokio::sync::Mutex;
use tracing::info;

/// Configured state of one asset wallet.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryAccount {
	pub address: String,
	#[serde(default)]
	pub legacy_address: Option<String>,
	pub balance: NativeAmount,
}

/// Wallet runtime backed by in-memory tables.
pub struct MemoryWallet {
	/// Accounts keyed by `CODE@network`.
	accounts: HashMap<String, MemoryAccount>,
	next_tx: AtomicU64,
	history: Mutex<Vec<SignedTransaction>>,
}

fn account_key(asset: &Asset) -> String {
	format!(
		"{}@{}",
		asset.currency_code.to_uppercase(),
		asset.network.to_lowercase()
	)
}

impl MemoryWallet {
	pub fn new() -> Self {
		Self {
			accounts: HashMap::new(),
			next_tx: AtomicU64::new(1),
			history: Mutex::new(Vec::new()),
		}
	}

	pub fn with_account(mut self, asset: &Asset, account: MemoryAccount) -> Self {
		self.accounts.insert(account_key(asset), account);
		self
	}

	/// Transactions recorded so far, oldest first.
	pub async fn history(&self) -> Vec<SignedTransaction> {
		self.history.lock().await.clone()
	}

	fn account(&self, asset: &Asset) -> Result<&MemoryAccount, WalletError> {
		self.accounts
			.get(&account_key(asset))
			.ok_or_else(|| WalletError::UnknownAsset(asset.to_string()))
	}
}

impl Default for MemoryWallet {
	fn default() -> Self {
		Self::new()
	}
}

/// Configuration schema for MemoryWallet.
pub struct MemoryWalletSchema;

impl ConfigSchema for MemoryWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![],
			// Optional fields
			vec![Field::new(
				"accounts",
				FieldType::Table(Schema::new(vec![], vec![])),
			)],
		);
		schema.validate(config)?;

		if let Some(accounts) = config.get("accounts").and_then(|v| v.as_table()) {
			let account_schema = Schema::new(
				vec![
					Field::new("address", FieldType::String),
					Field::new("balance", FieldType::String).with_validator(|value| {
						let raw = value.as_str().unwrap_or_default();
						raw.parse::<NativeAmount>()
							.map(|_| ())
							.map_err(|e| e.to_string())
					}),
				],
				vec![Field::new("legacy_address", FieldType::String)],
			);
			for (key, account) in accounts {
				if !key.contains('@') {
					return Err(ValidationError::InvalidValue {
						field: format!("accounts.{}", key),
						message: "Account keys must look like CODE@network".to_string(),
					});
				}
				account_schema.validate(account)?;
			}
		}

		Ok(())
	}
}

#[async_trait]
impl WalletInterface for MemoryWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryWalletSchema)
	}

	async fn receive_address(&self, asset: &Asset) -> Result<ReceiveAddress, WalletError> {
		let account = self.account(asset)?;
		Ok(ReceiveAddress {
			address: account.address.clone(),
			legacy_address: account.legacy_address.clone(),
		})
	}

	async fn balance(&self, asset: &Asset) -> Result<NativeAmount, WalletError> {
		Ok(self.account(asset)?.balance.clone())
	}

	async fn sign(
		&self,
		asset: &Asset,
		step: &TransactionStep,
	) -> Result<SignedTransaction, WalletError> {
		let account = self.account(asset)?;
		if step.native_amount > account.balance {
			return Err(WalletError::SigningFailed(format!(
				"Step spends {} but {} holds {}",
				step.native_amount, asset, account.balance
			)));
		}
		let raw = serde_json::to_vec(step).map_err(|e| WalletError::SigningFailed(e.to_string()))?;
		Ok(SignedTransaction {
			network: asset.network.clone(),
			raw,
		})
	}

	async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxId, WalletError> {
		let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
		let txid = TxId(format!("0x{}", hex::encode(n.to_be_bytes())));
		info!("Broadcast {} on {}", txid, tx.network);
		Ok(txid)
	}

	async fn record_transaction(&self, tx: &SignedTransaction) -> Result<(), WalletError> {
		self.history.lock().await.push(tx.clone());
		Ok(())
	}
}

/// Factory function to create a memory wallet from configuration.
///
/// Configuration parameters:
/// - `accounts`: table keyed by `CODE@network` with `address`, optional
///   `legacy_address` and `balance` (native integer string)
pub fn create_wallet(config: &toml::Value) -> Result<Box<dyn WalletInterface>, ValidationError> {
	MemoryWalletSchema.validate(config)?;

	let mut wallet = MemoryWallet::new();
	if let Some(accounts) = config.get("accounts").and_then(|v| v.as_table()) {
		for (key, value) in accounts {
			let account: MemoryAccount = toml::Value::try_into(value.clone()).map_err(
				|e: toml::de::Error| ValidationError::InvalidValue {
					field: format!("accounts.{}", key),
					message: e.to_string(),
				},
			)?;
			let (code, network) = key.split_once('@').unwrap_or((key.as_str(), ""));
			let asset = Asset::new(network, code, 0);
			wallet = wallet.with_account(&asset, account);
		}
	}

	Ok(Box::new(wallet))
}

#[cfg(test)]
mod tests {
	use super::*;
	use swap_types::StepKind;

	fn btc() -> Asset {
		Asset::new("bitcoin", "BTC", 8)
	}

	fn wallet() -> MemoryWallet {
		MemoryWallet::new().with_account(
			&btc(),
			MemoryAccount {
				address: "bc1qrefund".to_string(),
				legacy_address: Some("1Refund".to_string()),
				balance: NativeAmount::from(50_000u64),
			},
		)
	}

	fn step(amount: u64) -> TransactionStep {
		TransactionStep {
			kind: StepKind::Swap,
			target_address: "bc1qdeposit".to_string(),
			native_amount: NativeAmount::from(amount),
			memo: None,
			payload: Vec::new(),
			fee_override: None,
		}
	}

	#[tokio::test]
	async fn test_lookup_is_case_insensitive() {
		let wallet = wallet();
		let address = wallet
			.receive_address(&Asset::new("Bitcoin", "btc", 8))
			.await
			.unwrap();
		assert_eq!(address.legacy_address.as_deref(), Some("1Refund"));
		assert!(matches!(
			wallet.balance(&Asset::new("ethereum", "ETH", 18)).await,
			Err(WalletError::UnknownAsset(_))
		));
	}

	#[tokio::test]
	async fn test_sign_broadcast_record() {
		let wallet = wallet();
		let signed = wallet.sign(&btc(), &step(10_000)).await.unwrap();
		let first = wallet.broadcast(&signed).await.unwrap();
		let second = wallet.broadcast(&signed).await.unwrap();
		assert_ne!(first, second);

		wallet.record_transaction(&signed).await.unwrap();
		assert_eq!(wallet.history().await.len(), 1);

		assert!(matches!(
			wallet.sign(&btc(), &step(60_000)).await,
			Err(WalletError::SigningFailed(_))
		));
	}

	#[tokio::test]
	async fn test_create_wallet_from_config() {
		let config: toml::Value = toml::from_str(
			r#"
[accounts."BTC@bitcoin"]
address = "bc1qrefund"
balance = "100000000"

[accounts."ETH@ethereum"]
address = "0xpayout"
balance = "0"
"#,
		)
		.unwrap();

		let wallet = create_wallet(&config).unwrap();
		assert_eq!(
			wallet.balance(&btc()).await.unwrap(),
			NativeAmount::from(100_000_000u64)
		);

		let bad: toml::Value = toml::from_str(
			r#"
[accounts."BTC@bitcoin"]
address = "bc1qrefund"
balance = "-3"
"#,
		)
		.unwrap();
		assert!(create_wallet(&bad).is_err());
	}
}
