//! Error taxonomy surfaced to callers of the swap engine.

use crate::{CompletedStep, ExecutionStage, NativeAmount, Side};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type SwapResult<T> = std::result::Result<T, SwapError>;

/// Which bound a limit check violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundKind {
	BelowMinimum,
	AboveMaximum,
}

impl fmt::Display for BoundKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BoundKind::BelowMinimum => write!(f, "below the minimum"),
			BoundKind::AboveMaximum => write!(f, "above the maximum"),
		}
	}
}

/// An amount outside backend-declared limits.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Amount is {bound_kind} of {bound} on the {side} side")]
pub struct LimitViolation {
	pub bound_kind: BoundKind,
	/// The violated bound in native units of the side's asset.
	pub bound: NativeAmount,
	pub side: Side,
}

/// Errors returned by the swap engine and its adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
	#[error("Invalid request: {0}")]
	InvalidRequest(String),

	#[error("Pair {from} -> {to} is not supported by {backend}")]
	UnsupportedPair {
		backend: String,
		from: String,
		to: String,
	},

	#[error(transparent)]
	LimitViolation(#[from] LimitViolation),

	#[error("Insufficient funds: balance {balance} does not cover fee reservation {fee}")]
	InsufficientFunds {
		balance: NativeAmount,
		fee: NativeAmount,
	},

	#[error("Backend {backend} unavailable: {reason}")]
	BackendUnavailable { backend: String, reason: String },

	#[error("Backend {backend} returned HTTP {status_code}: {reason}")]
	BackendProtocol {
		backend: String,
		status_code: u16,
		reason: String,
	},

	#[error("Backend {backend} is misconfigured: {reason}")]
	BackendMisconfigured { backend: String, reason: String },

	#[error("Invalid response from {backend}: {reason}")]
	InvalidResponse { backend: String, reason: String },

	#[error("Quote {order_id} expired at {expired_at}")]
	QuoteExpired { order_id: String, expired_at: u64 },

	#[error("Step {index} failed while {stage}: {reason}")]
	StepFailed {
		index: usize,
		stage: ExecutionStage,
		reason: String,
	},

	#[error(
		"Partial execution: {} step(s) completed before step {failed_step} failed while {stage}: {reason}",
		completed.len()
	)]
	PartialExecution {
		completed: Vec<CompletedStep>,
		failed_step: usize,
		stage: ExecutionStage,
		reason: String,
	},

	#[error("Execution already in progress for quote {order_id}")]
	ExecutionInProgress { order_id: String },

	#[error("Wallet error: {0}")]
	Wallet(String),
}

impl SwapError {
	/// Whether the same call may succeed if repeated.
	///
	/// Only transport failures qualify; everything else needs a changed
	/// request or a different backend.
	pub fn is_retryable(&self) -> bool {
		matches!(self, SwapError::BackendUnavailable { .. })
	}

	/// HTTP status attached to a protocol error.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			SwapError::BackendProtocol { status_code, .. } => Some(*status_code),
			_ => None,
		}
	}

	pub fn unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::BackendUnavailable {
			backend: backend.into(),
			reason: reason.into(),
		}
	}

	pub fn invalid_response(backend: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidResponse {
			backend: backend.into(),
			reason: reason.into(),
		}
	}
}
