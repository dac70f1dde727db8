//! Optional observability helpers for background and refresh work.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_warden.task` with the `task`
//!   (work kind) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `session_warden_task_total` counter for every
//!   attempt/success/failure, labeled by `task` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Work kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
	/// Token refresh coordination.
	Refresh,
	/// Cache memory-reclamation sweep.
	CacheSweep,
	/// Rate-limit record sweep.
	LimiterSweep,
}
impl TaskKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TaskKind::Refresh => "refresh",
			TaskKind::CacheSweep => "cache_sweep",
			TaskKind::LimiterSweep => "limiter_sweep",
		}
	}
}
impl Display for TaskKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskOutcome {
	/// Entry to an observed helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl TaskOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TaskOutcome::Attempt => "attempt",
			TaskOutcome::Success => "success",
			TaskOutcome::Failure => "failure",
		}
	}
}
impl Display for TaskOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
