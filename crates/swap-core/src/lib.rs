//! Swap quote orchestration engine.
//!
//! Takes a caller's swap request through normalization, policy validation,
//! optional max-balance resolution, limit enforcement and the backend order
//! call, and assembles the result into a time-boxed `Quote`. Quotes are
//! executed by an `ExecutionSequencer` against the wallet runtime.

pub mod amount;
pub mod assembler;
pub mod engine;
pub mod limits;
pub mod policy;
pub mod resolver;
pub mod sequencer;

#[cfg(test)]
mod test_support;

pub use assembler::{assemble, SwapAddresses};
pub use engine::{fetch_request, SwapEngine};
pub use resolver::{resolve_max_swappable, DEFAULT_MAX_ITERATIONS};
pub use sequencer::ExecutionSequencer;
