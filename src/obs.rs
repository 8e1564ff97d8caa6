//! Optional observability helpers for pacer operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `request_pacer.op` with the `op`
//!   (operation) and `stage` (call site) fields, plus warnings for absorbed coordination
//!   failures.
//! - Enable `metrics` to increment the `request_pacer_op_total` counter for every
//!   attempt/success/failure/fail-open, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pacer operations observed across the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Token issuance against the coordinator.
	Reauthenticate,
	/// Wait-time negotiation for a single project.
	WaitTime,
	/// Per-request interception and delay.
	Pace,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Reauthenticate => "reauthenticate",
			OpKind::WaitTime => "wait_time",
			OpKind::Pace => "pace",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a pacer operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Retries exhausted; the operation degraded to a zero delay.
	FailOpen,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
			OpOutcome::FailOpen => "fail_open",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
