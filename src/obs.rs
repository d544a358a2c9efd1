//! Observability helpers shared by the token, container, and metrics layers.
//!
//! # Feature Flags
//!
//! - Spans named `card_host.op` carry the `op` (operation) and `stage` (call site) fields and are
//!   always emitted through `tracing`.
//! - Enable `metrics` to increment the `card_host_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`. Container creations are also counted
//!   per kind in `card_host_container_total`, and the registry size is published as the
//!   `card_host_live_containers` gauge.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Token issuance on a cache miss.
	TokenFetch,
	/// Container creation through the registry.
	Acquire,
	/// Container teardown through the registry.
	Release,
	/// Card-count poll against the platform.
	MetricsPoll,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::TokenFetch => "token_fetch",
			OpKind::Acquire => "acquire",
			OpKind::Release => "release",
			OpKind::MetricsPoll => "metrics_poll",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure, propagated or recovered.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto its outcome label.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure }
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
