//! Common types for the swap quote engine.
//!
//! This crate holds the data model shared by the engine, the wallet runtime
//! boundary and the backend adapters: assets and native amounts, swap
//! requests, currency policies, raw and assembled quotes, execution state and
//! the error taxonomy surfaced to callers.

pub mod asset;
pub mod errors;
pub mod execution;
pub mod policy;
pub mod quote;
pub mod request;
pub mod validation;

pub use asset::*;
pub use errors::*;
pub use execution::*;
pub use policy::*;
pub use quote::*;
pub use request::*;
pub use validation::*;

/// Current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
	chrono::Utc::now().timestamp().max(0) as u64
}
