//! Background sweepers that bound the memory of the cache and the rate limiter.
//!
//! Sweeping is an optimization, never a correctness requirement: expired cache entries and
//! elapsed limiter windows are already treated as absent on every read path. Each sweeper
//! runs on a fixed cadence (five minutes by default) plus a small random jitter so
//! co-located processes do not sweep in phase. Handles cancel their task on drop — the same
//! discipline the refresh scheduler applies to its timer.

// std
use std::time::Duration as StdDuration;
// crates.io
use rand::Rng;
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	cache::MemoryCache,
	error::ConfigError,
	limit::FixedWindowLimiter,
	obs::{self, TaskKind, TaskOutcome},
};

/// Default sweep cadence.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::minutes(5);

/// Cancels its background sweeper when dropped or shut down.
#[derive(Debug)]
pub struct SweepHandle(JoinHandle<()>);
impl SweepHandle {
	/// Stops the sweeper explicitly.
	pub fn shutdown(self) {
		self.0.abort();
	}

	/// Returns `true` while the sweeper is running.
	pub fn is_running(&self) -> bool {
		!self.0.is_finished()
	}
}
impl Drop for SweepHandle {
	fn drop(&mut self) {
		self.0.abort();
	}
}

/// Spawns a periodic cleanup task for `cache`.
pub fn spawn_cache_sweeper<V>(
	cache: Arc<MemoryCache<V>>,
	every: Duration,
) -> Result<SweepHandle, ConfigError>
where
	V: Clone + Send + Sync + 'static,
{
	let interval = positive_interval(every)?;

	Ok(SweepHandle(tokio::spawn(async move {
		loop {
			tokio::time::sleep(interval + jitter(interval)).await;

			let reclaimed = cache.cleanup();

			obs::record_task_outcome(TaskKind::CacheSweep, TaskOutcome::Success);
			#[cfg(feature = "tracing")]
			tracing::debug!(reclaimed, "Cache sweep finished.");
			#[cfg(not(feature = "tracing"))]
			let _ = reclaimed;
		}
	})))
}

/// Spawns a periodic sweep task for `limiter`.
pub fn spawn_limiter_sweeper(
	limiter: Arc<FixedWindowLimiter>,
	every: Duration,
) -> Result<SweepHandle, ConfigError> {
	let interval = positive_interval(every)?;

	Ok(SweepHandle(tokio::spawn(async move {
		loop {
			tokio::time::sleep(interval + jitter(interval)).await;

			let reclaimed = limiter.sweep();

			obs::record_task_outcome(TaskKind::LimiterSweep, TaskOutcome::Success);
			#[cfg(feature = "tracing")]
			tracing::debug!(reclaimed, "Rate-limit sweep finished.");
			#[cfg(not(feature = "tracing"))]
			let _ = reclaimed;
		}
	})))
}

fn positive_interval(every: Duration) -> Result<StdDuration, ConfigError> {
	if !every.is_positive() {
		return Err(ConfigError::NonPositiveInterval);
	}

	Ok(StdDuration::try_from(every).unwrap_or(StdDuration::ZERO))
}

/// Random jitter up to a tenth of the sweep interval.
fn jitter(interval: StdDuration) -> StdDuration {
	let ceiling = (interval.as_millis() / 10) as u64;

	StdDuration::from_millis(rand::rng().random_range(0..=ceiling))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::cache::CacheConfig;

	#[test]
	fn non_positive_intervals_are_rejected() {
		assert!(matches!(
			positive_interval(Duration::ZERO),
			Err(ConfigError::NonPositiveInterval)
		));
		assert!(matches!(
			positive_interval(Duration::seconds(-5)),
			Err(ConfigError::NonPositiveInterval)
		));
		assert!(positive_interval(Duration::minutes(5)).is_ok());
	}

	#[test]
	fn jitter_stays_within_a_tenth_of_the_interval() {
		let interval = StdDuration::from_secs(300);

		for _ in 0..32 {
			assert!(jitter(interval) <= StdDuration::from_secs(30));
		}
	}

	#[tokio::test]
	async fn dropped_handles_cancel_their_sweeper() {
		let cache = Arc::new(MemoryCache::<String>::new(CacheConfig::new()));
		let handle = spawn_cache_sweeper(cache, Duration::minutes(5))
			.expect("Sweeper with a positive interval should spawn.");

		assert!(handle.is_running());
		drop(handle);
	}
}
