// self
use crate::obs::{TaskKind, TaskOutcome};

/// Records a task outcome via the global metrics recorder (when enabled).
pub fn record_task_outcome(kind: TaskKind, outcome: TaskOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"session_warden_task_total",
			"task" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
