//! Wallet runtime boundary for the swap engine.
//!
//! The engine never inspects wallet internals. It consumes exactly five
//! operations through `WalletInterface`: receive address and balance lookups,
//! signing, broadcasting and recording of transactions.

use async_trait::async_trait;
use swap_types::{
	Asset, ConfigSchema, NativeAmount, ReceiveAddress, SignedTransaction, SwapError,
	TransactionStep, TxId,
};
use thiserror::Error;
use tracing::debug;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors reported by a wallet runtime.
#[derive(Debug, Error)]
pub enum WalletError {
	#[error("Unknown asset: {0}")]
	UnknownAsset(String),
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Broadcast rejected: {0}")]
	BroadcastRejected(String),
	#[error("Wallet runtime error: {0}")]
	Runtime(String),
}

impl From<WalletError> for SwapError {
	fn from(error: WalletError) -> Self {
		SwapError::Wallet(error.to_string())
	}
}

/// Operations the host wallet supplies to the engine.
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Returns the settings schema of this wallet implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Receive address for `asset`, with its legacy alias when the wallet has one.
	async fn receive_address(&self, asset: &Asset) -> Result<ReceiveAddress, WalletError>;

	/// Spendable balance of `asset` in native units.
	async fn balance(&self, asset: &Asset) -> Result<NativeAmount, WalletError>;

	/// Signs a step spending from the `asset` wallet.
	async fn sign(
		&self,
		asset: &Asset,
		step: &TransactionStep,
	) -> Result<SignedTransaction, WalletError>;

	/// Broadcasts a signed transaction and returns its id.
	async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxId, WalletError>;

	/// Saves a broadcast transaction to the wallet's history.
	async fn record_transaction(&self, tx: &SignedTransaction) -> Result<(), WalletError>;
}

/// Thin service over a wallet runtime used by the engine.
pub struct WalletService {
	provider: Box<dyn WalletInterface>,
}

impl WalletService {
	pub fn new(provider: Box<dyn WalletInterface>) -> Self {
		Self { provider }
	}

	/// Looks up the refund (from) and payout (to) addresses concurrently.
	pub async fn swap_addresses(
		&self,
		from: &Asset,
		to: &Asset,
	) -> Result<(ReceiveAddress, ReceiveAddress), WalletError> {
		let (refund, payout) = tokio::try_join!(
			self.provider.receive_address(from),
			self.provider.receive_address(to)
		)?;
		debug!(
			"Resolved addresses: refund {} for {}, payout {} for {}",
			refund.address, from, payout.address, to
		);
		Ok((refund, payout))
	}

	pub async fn balance(&self, asset: &Asset) -> Result<NativeAmount, WalletError> {
		self.provider.balance(asset).await
	}

	pub async fn sign(
		&self,
		asset: &Asset,
		step: &TransactionStep,
	) -> Result<SignedTransaction, WalletError> {
		self.provider.sign(asset, step).await
	}

	pub async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxId, WalletError> {
		self.provider.broadcast(tx).await
	}

	pub async fn record_transaction(&self, tx: &SignedTransaction) -> Result<(), WalletError> {
		self.provider.record_transaction(tx).await
	}
}
