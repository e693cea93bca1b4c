//! Scripted fetcher and wallet doubles for unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use swap_fetcher::{FetchRequest, QuoteFetcherInterface};
use swap_types::{
	Asset, ConfigSchema, CurrencyPolicy, NativeAmount, RawQuote, ReceiveAddress, Schema,
	SignedTransaction, SwapError, SwapResult, TransactionStep, TxId, ValidationError,
};
use swap_wallet::{WalletError, WalletInterface};

type Reply = Box<dyn Fn(&FetchRequest) -> SwapResult<RawQuote> + Send + Sync>;

struct AnySchema;

impl ConfigSchema for AnySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub struct ScriptedFetcher {
	pub policy: CurrencyPolicy,
	estimate: Reply,
	order: Reply,
	pub estimates: AtomicUsize,
	pub orders: AtomicUsize,
}

impl ScriptedFetcher {
	pub fn new(
		estimate: impl Fn(&FetchRequest) -> SwapResult<RawQuote> + Send + Sync + 'static,
	) -> Self {
		Self {
			policy: CurrencyPolicy::default(),
			estimate: Box::new(estimate),
			order: Box::new(|_| Err(SwapError::unavailable("scripted", "no order reply"))),
			estimates: AtomicUsize::new(0),
			orders: AtomicUsize::new(0),
		}
	}

	pub fn with_order(
		mut self,
		order: impl Fn(&FetchRequest) -> SwapResult<RawQuote> + Send + Sync + 'static,
	) -> Self {
		self.order = Box::new(order);
		self
	}

	pub fn with_policy(mut self, policy: CurrencyPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn estimate_calls(&self) -> usize {
		self.estimates.load(Ordering::SeqCst)
	}

	pub fn order_calls(&self) -> usize {
		self.orders.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl QuoteFetcherInterface for ScriptedFetcher {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AnySchema)
	}

	fn name(&self) -> &str {
		"scripted"
	}

	fn policy(&self) -> &CurrencyPolicy {
		&self.policy
	}

	fn quote_lifetime(&self) -> Duration {
		Duration::from_secs(600)
	}

	async fn estimate(&self, request: &FetchRequest) -> SwapResult<RawQuote> {
		self.estimates.fetch_add(1, Ordering::SeqCst);
		(self.estimate)(request)
	}

	async fn create_order(&self, request: &FetchRequest) -> SwapResult<RawQuote> {
		self.orders.fetch_add(1, Ordering::SeqCst);
		(self.order)(request)
	}
}

/// Wallet whose failures are scripted per call.
pub struct ScriptedWallet {
	pub balance: NativeAmount,
	/// Zero-based sign call that fails.
	pub fail_sign_at: Option<usize>,
	/// Broadcasts never resolve.
	pub hang_broadcast: bool,
	/// `record_transaction` errors.
	pub fail_record: bool,
	signs: AtomicUsize,
	broadcasts: AtomicUsize,
}

impl ScriptedWallet {
	pub fn new(balance: u64) -> Self {
		Self {
			balance: NativeAmount::from(balance),
			fail_sign_at: None,
			hang_broadcast: false,
			fail_record: false,
			signs: AtomicUsize::new(0),
			broadcasts: AtomicUsize::new(0),
		}
	}
}

#[async_trait]
impl WalletInterface for ScriptedWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AnySchema)
	}

	async fn receive_address(&self, asset: &Asset) -> Result<ReceiveAddress, WalletError> {
		Ok(ReceiveAddress {
			address: format!("{}-address", asset.network),
			legacy_address: Some(format!("{}-legacy", asset.network)),
		})
	}

	async fn balance(&self, _asset: &Asset) -> Result<NativeAmount, WalletError> {
		Ok(self.balance.clone())
	}

	async fn sign(
		&self,
		asset: &Asset,
		step: &TransactionStep,
	) -> Result<SignedTransaction, WalletError> {
		let call = self.signs.fetch_add(1, Ordering::SeqCst);
		if self.fail_sign_at == Some(call) {
			return Err(WalletError::SigningFailed("device disconnected".to_string()));
		}
		Ok(SignedTransaction {
			network: asset.network.clone(),
			raw: step.target_address.as_bytes().to_vec(),
		})
	}

	async fn broadcast(&self, _tx: &SignedTransaction) -> Result<TxId, WalletError> {
		if self.hang_broadcast {
			std::future::pending::<()>().await;
		}
		let n = self.broadcasts.fetch_add(1, Ordering::SeqCst);
		Ok(TxId(format!("tx-{}", n)))
	}

	async fn record_transaction(&self, _tx: &SignedTransaction) -> Result<(), WalletError> {
		if self.fail_record {
			return Err(WalletError::Runtime("history store offline".to_string()));
		}
		Ok(())
	}
}
