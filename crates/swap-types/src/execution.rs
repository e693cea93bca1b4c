//! Execution state of a quote and its transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction id returned by the wallet runtime on broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A signed transaction produced by the wallet runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
	/// Network the transaction belongs to.
	pub network: String,
	/// Serialized signed bytes.
	pub raw: Vec<u8>,
}

/// Progress of a single transaction step.
///
/// `Confirmed` means the wallet runtime accepted the broadcast; on-chain
/// inclusion is not awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
	Pending,
	Signing,
	Broadcasting,
	Confirmed,
	Failed,
}

/// Progress of a quote as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteState {
	Unexecuted,
	Executing,
	Completed,
	Failed,
}

impl QuoteState {
	pub fn is_terminal(&self) -> bool {
		matches!(self, QuoteState::Completed | QuoteState::Failed)
	}
}

/// Stage at which a step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStage {
	Signing,
	Broadcasting,
}

impl fmt::Display for ExecutionStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExecutionStage::Signing => write!(f, "signing"),
			ExecutionStage::Broadcasting => write!(f, "broadcasting"),
		}
	}
}

/// A step that was broadcast successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedStep {
	pub index: usize,
	pub txid: TxId,
}

/// Outcome of a fully executed quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
	pub order_id: String,
	pub steps: Vec<CompletedStep>,
}

impl ExecutionReport {
	/// Txid of the swap send (the last step).
	pub fn swap_txid(&self) -> Option<&TxId> {
		self.steps.last().map(|s| &s.txid)
	}
}
