//! Quote execution.
//!
//! A sequencer owns one quote and drives its steps through the wallet in
//! order. Each step is signed, broadcast and recorded before the next one is
//! signed. The first terminal outcome is kept and returned again on every
//! later call, so retrying a finished execution never re-sends anything.

use std::sync::Arc;
use swap_types::{
	current_timestamp, CompletedStep, ExecutionReport, ExecutionStage, Quote, QuoteState,
	StepState, SwapError, SwapResult,
};
use swap_wallet::WalletService;
use tracing::{info, warn};

pub struct ExecutionSequencer {
	quote: Quote,
	wallet: Arc<WalletService>,
	state: QuoteState,
	step_states: Vec<StepState>,
	completed: Vec<CompletedStep>,
	outcome: Option<SwapResult<ExecutionReport>>,
}

impl ExecutionSequencer {
	pub fn new(quote: Quote, wallet: Arc<WalletService>) -> Self {
		let step_states = vec![StepState::Pending; quote.steps.len()];
		Self {
			quote,
			wallet,
			state: QuoteState::Unexecuted,
			step_states,
			completed: Vec::new(),
			outcome: None,
		}
	}

	pub fn quote(&self) -> &Quote {
		&self.quote
	}

	pub fn state(&self) -> QuoteState {
		self.state
	}

	pub fn step_states(&self) -> &[StepState] {
		&self.step_states
	}

	/// Executes the quote against the wall clock.
	pub async fn execute(&mut self) -> SwapResult<ExecutionReport> {
		self.execute_at(current_timestamp()).await
	}

	/// Executes the quote as of `now` (Unix seconds).
	pub async fn execute_at(&mut self, now: u64) -> SwapResult<ExecutionReport> {
		if let Some(outcome) = &self.outcome {
			return outcome.clone();
		}
		if self.state == QuoteState::Executing {
			return Err(SwapError::ExecutionInProgress {
				order_id: self.quote.order_id.clone(),
			});
		}

		if self.quote.is_expired(now) {
			warn!(
				"Quote {} expired at {}, refusing to execute",
				self.quote.order_id, self.quote.expires_at
			);
			return self.finish(Err(SwapError::QuoteExpired {
				order_id: self.quote.order_id.clone(),
				expired_at: self.quote.expires_at,
			}));
		}

		self.state = QuoteState::Executing;
		info!(
			"Executing quote {} from {} ({} step(s))",
			self.quote.order_id,
			self.quote.backend,
			self.quote.steps.len()
		);
		let result = self.run_steps().await;
		self.finish(result)
	}

	fn finish(&mut self, result: SwapResult<ExecutionReport>) -> SwapResult<ExecutionReport> {
		self.state = if result.is_ok() {
			QuoteState::Completed
		} else {
			QuoteState::Failed
		};
		self.outcome = Some(result.clone());
		result
	}

	async fn run_steps(&mut self) -> SwapResult<ExecutionReport> {
		let wallet = Arc::clone(&self.wallet);
		let from_asset = self.quote.request.from_asset.clone();

		for index in 0..self.quote.steps.len() {
			self.step_states[index] = StepState::Signing;
			let step = self.quote.steps[index].clone();
			let signed = match wallet.sign(&from_asset, &step).await {
				Ok(signed) => signed,
				Err(e) => return Err(self.step_failed(index, ExecutionStage::Signing, e.to_string())),
			};

			self.step_states[index] = StepState::Broadcasting;
			let txid = match wallet.broadcast(&signed).await {
				Ok(txid) => txid,
				Err(e) => {
					return Err(self.step_failed(index, ExecutionStage::Broadcasting, e.to_string()))
				}
			};

			// Best effort once broadcast
			if let Err(e) = wallet.record_transaction(&signed).await {
				warn!("Failed to record transaction {}: {}", txid, e);
			}

			info!(
				"Step {} of quote {} broadcast as {}",
				index, self.quote.order_id, txid
			);
			self.step_states[index] = StepState::Confirmed;
			self.completed.push(CompletedStep { index, txid });
		}

		Ok(ExecutionReport {
			order_id: self.quote.order_id.clone(),
			steps: self.completed.clone(),
		})
	}

	fn step_failed(&mut self, index: usize, stage: ExecutionStage, reason: String) -> SwapError {
		self.step_states[index] = StepState::Failed;
		warn!(
			"Step {} of quote {} failed while {}: {}",
			index, self.quote.order_id, stage, reason
		);
		if self.completed.is_empty() {
			SwapError::StepFailed {
				index,
				stage,
				reason,
			}
		} else {
			SwapError::PartialExecution {
				completed: self.completed.clone(),
				failed_step: index,
				stage,
				reason,
			}
		}
	}
}
