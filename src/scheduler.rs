//! Periodic refresh scheduling with explicit Idle/Active states.
//!
//! The scheduler owns the crate's background task for the token path. Activation performs
//! one immediate freshness pass, then ticks on a fixed interval — 14 minutes by default,
//! safely inside a presumed 15-minute-or-longer token lifetime so at least one renewal
//! attempt lands before expiry. Deactivation cancels the pending tick on every exit path,
//! including drops, so no callback can fire into a torn-down context.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	refresh::RefreshCoordinator,
};

/// Timing configuration for [`RefreshScheduler`].
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
	/// Interval between periodic freshness checks.
	pub tick_interval: Duration,
	/// Fallback delay before retrying a transient failure that carried no Retry-After hint.
	pub retry_delay: Duration,
}
impl SchedulerConfig {
	/// Default interval between freshness checks.
	pub const DEFAULT_TICK_INTERVAL: Duration = Duration::minutes(14);
	/// Default retry delay after a transient refresh failure.
	pub const DEFAULT_RETRY_DELAY: Duration = Duration::seconds(30);

	/// Creates the default configuration.
	pub fn new() -> Self {
		Self {
			tick_interval: Self::DEFAULT_TICK_INTERVAL,
			retry_delay: Self::DEFAULT_RETRY_DELAY,
		}
	}

	/// Overrides the tick interval.
	pub fn with_tick_interval(mut self, interval: Duration) -> Self {
		self.tick_interval = interval;

		self
	}

	/// Overrides the transient-failure retry delay.
	pub fn with_retry_delay(mut self, delay: Duration) -> Self {
		self.retry_delay = delay;

		self
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !self.tick_interval.is_positive() || !self.retry_delay.is_positive() {
			return Err(ConfigError::NonPositiveInterval);
		}

		Ok(())
	}
}
impl Default for SchedulerConfig {
	fn default() -> Self {
		Self::new()
	}
}

/// Two-state (Idle/Active) periodic refresh driver.
///
/// An empty session is not an error for the periodic path: ticks that find no token simply
/// skip, and the scheduler stays active until deactivated.
pub struct RefreshScheduler {
	coordinator: Arc<RefreshCoordinator>,
	config: SchedulerConfig,
	task: Mutex<Option<JoinHandle<()>>>,
}
impl RefreshScheduler {
	/// Creates an idle scheduler around `coordinator`.
	pub fn new(
		coordinator: Arc<RefreshCoordinator>,
		config: SchedulerConfig,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self { coordinator, config, task: Mutex::new(None) })
	}

	/// Transitions Idle→Active, spawning the periodic task.
	///
	/// The first freshness pass runs immediately; subsequent passes follow the configured
	/// tick interval. Returns `false` (and changes nothing) when already active.
	pub fn activate(&self) -> bool {
		let mut slot = self.task.lock();

		if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
			return false;
		}

		let coordinator = self.coordinator.clone();
		let config = self.config;

		*slot = Some(tokio::spawn(async move {
			loop {
				let next_tick = tick_once(&coordinator, &config).await;

				tokio::time::sleep(next_tick).await;
			}
		}));

		true
	}

	/// Transitions Active→Idle, cancelling the pending tick. Reports whether a task was
	/// actually cancelled.
	pub fn deactivate(&self) -> bool {
		match self.task.lock().take() {
			Some(handle) => {
				handle.abort();

				true
			},
			None => false,
		}
	}

	/// Returns `true` while the periodic task is running.
	pub fn is_active(&self) -> bool {
		self.task.lock().as_ref().is_some_and(|handle| !handle.is_finished())
	}

	/// Manual renewal entry point outside the timer; shares the coordinator's singleflight
	/// refresh path.
	pub async fn refresh_now(&self) -> Result<TokenSecret> {
		self.coordinator.force_refresh().await
	}
}
impl Drop for RefreshScheduler {
	fn drop(&mut self) {
		if let Some(handle) = self.task.get_mut().take() {
			handle.abort();
		}
	}
}
impl Debug for RefreshScheduler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshScheduler")
			.field("config", &self.config)
			.field("active", &self.is_active())
			.finish()
	}
}

/// Runs one freshness pass and returns the delay until the next one.
async fn tick_once(coordinator: &RefreshCoordinator, config: &SchedulerConfig) -> StdDuration {
	let tick = to_std(config.tick_interval);

	match coordinator.refresh_if_stale().await {
		// An empty session is a skip, not a failure; the previous token (or none) stands.
		Ok(_) | Err(Error::NoSession) => tick,
		Err(Error::Transient(err)) => {
			let hint = err.retry_after().unwrap_or(config.retry_delay);

			#[cfg(feature = "tracing")]
			tracing::warn!(
				error = %err,
				retry_in_seconds = hint.whole_seconds(),
				"Token refresh failed transiently; retrying early."
			);

			to_std(hint).min(tick)
		},
		Err(err) => {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %err, "Token refresh failed; keeping the current token.");
			#[cfg(not(feature = "tracing"))]
			let _ = err;

			tick
		},
	}
}

fn to_std(duration: Duration) -> StdDuration {
	StdDuration::try_from(duration).unwrap_or(StdDuration::ZERO)
}
