// self
use crate::{_prelude::*, obs::TaskKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedTask<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedTask<F> = F;

/// A span builder used by observed crate work.
#[derive(Clone, Debug)]
pub struct TaskSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl TaskSpan {
	/// Creates a new span tagged with the provided task kind + stage.
	pub fn new(kind: TaskKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("session_warden.task", task = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> TaskSpanGuard {
		#[cfg(feature = "tracing")]
		{
			TaskSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			TaskSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedTask<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`TaskSpan::entered`].
pub struct TaskSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for TaskSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TaskSpanGuard(..)")
	}
}
