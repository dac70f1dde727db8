//! Fixed-window request budgets with static policy tiers.
//!
//! A window is a fixed wall-clock span: the per-client count restarts when the window
//! elapses rather than sliding continuously. Budgets are static configuration — stricter
//! for authentication traffic than for general traffic — never computed or adaptive.
//! Rejection is a well-defined decision value carrying retry-after metadata, not an error.

// self
use crate::{_prelude::*, auth::ClientId};

/// Boxed future returned by [`RateLimitPolicy::evaluate`].
pub type RateLimitFuture<'a> = Pin<Box<dyn Future<Output = Result<RateLimitDecision>> + 'a + Send>>;

/// Strategy consulted before admitting a request from a client.
///
/// The built-in [`FixedWindowLimiter`] decides synchronously; the trait exists so callers
/// can swap in a shared backend (e.g., a remote counter) without touching call sites.
pub trait RateLimitPolicy
where
	Self: Send + Sync,
{
	/// Decides whether the request described by `context` may proceed.
	fn evaluate(&self, context: &RateLimitContext) -> RateLimitFuture<'_>;
}

/// Context shared with a [`RateLimitPolicy`] before work is admitted.
#[derive(Clone, Debug)]
pub struct RateLimitContext {
	/// Client the request originates from (typically a source IP).
	pub client: ClientId,
	/// Logical operation being attempted.
	pub operation: String,
	/// Timestamp observed before invoking the policy.
	pub observed_at: OffsetDateTime,
}
impl RateLimitContext {
	/// Creates a new context for the given client and operation.
	pub fn new(client: ClientId, operation: impl Into<String>) -> Self {
		Self { client, operation: operation.into(), observed_at: OffsetDateTime::now_utc() }
	}

	/// Overrides the timestamp associated with the observation.
	pub fn with_observed_at(mut self, instant: OffsetDateTime) -> Self {
		self.observed_at = instant;

		self
	}
}

/// Result emitted by a rate limit check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed; remaining-quota metadata attached.
	Allow(QuotaSnapshot),
	/// The request must be rejected until the window resets.
	Reject(RetryDirective),
}
impl RateLimitDecision {
	/// Returns `true` for [`RateLimitDecision::Allow`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow(_))
	}

	/// Retry-after duration for rejections, `None` when allowed.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Allow(_) => None,
			Self::Reject(directive) => Some(directive.retry_after),
		}
	}
}

/// Remaining-quota metadata attached to allowed requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaSnapshot {
	/// Requests left in the current window.
	pub remaining: u32,
	/// Instant the window resets.
	pub resets_at: OffsetDateTime,
}

/// Advises callers when to retry after a rejection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Duration until the window resets.
	pub retry_after: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, retry_after: Duration) -> Self {
		Self { earliest_retry_at, retry_after, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}
}

/// Static request budget for one traffic class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPolicy {
	/// Maximum requests admitted per window.
	pub max_requests: u32,
	/// Fixed window length.
	pub window: Duration,
}
impl WindowPolicy {
	/// Creates a custom budget.
	pub const fn new(max_requests: u32, window: Duration) -> Self {
		Self { max_requests, window }
	}

	/// General-traffic tier: 100 requests per 15 minutes.
	pub const fn general() -> Self {
		Self::new(100, Duration::minutes(15))
	}

	/// Authentication tier: 5 requests per 15 minutes.
	pub const fn authentication() -> Self {
		Self::new(5, Duration::minutes(15))
	}
}

#[derive(Clone, Copy, Debug)]
struct WindowRecord {
	count: u32,
	resets_at: OffsetDateTime,
}

/// Fixed-window counter keyed by [`ClientId`].
///
/// A record whose window elapsed is logically absent even while physically present: the
/// next request from that client starts a fresh window. [`sweep`](Self::sweep) only bounds
/// memory.
#[derive(Debug)]
pub struct FixedWindowLimiter {
	policy: WindowPolicy,
	records: RwLock<HashMap<ClientId, WindowRecord>>,
}
impl FixedWindowLimiter {
	/// Creates a limiter enforcing `policy`.
	pub fn new(policy: WindowPolicy) -> Self {
		Self { policy, records: RwLock::new(HashMap::new()) }
	}

	/// The static policy this limiter enforces.
	pub fn policy(&self) -> WindowPolicy {
		self.policy
	}

	/// Admits or rejects a request from `client` at the current instant.
	pub fn check(&self, client: &ClientId) -> RateLimitDecision {
		self.check_at(client, OffsetDateTime::now_utc())
	}

	/// Instant-passing variant of [`check`](Self::check).
	pub fn check_at(&self, client: &ClientId, instant: OffsetDateTime) -> RateLimitDecision {
		let mut guard = self.records.write();
		let record = guard
			.entry(client.clone())
			.and_modify(|record| {
				if instant > record.resets_at {
					record.count = 0;
					record.resets_at = instant + self.policy.window;
				}
			})
			.or_insert_with(|| WindowRecord {
				count: 0,
				resets_at: instant + self.policy.window,
			});

		record.count = record.count.saturating_add(1);

		if record.count > self.policy.max_requests {
			RateLimitDecision::Reject(RetryDirective::new(
				record.resets_at,
				record.resets_at - instant,
			))
		} else {
			RateLimitDecision::Allow(QuotaSnapshot {
				remaining: self.policy.max_requests - record.count,
				resets_at: record.resets_at,
			})
		}
	}

	/// Drops records whose window elapsed, returning how many were reclaimed.
	pub fn sweep(&self) -> usize {
		self.sweep_at(OffsetDateTime::now_utc())
	}

	/// Instant-passing variant of [`sweep`](Self::sweep).
	pub fn sweep_at(&self, instant: OffsetDateTime) -> usize {
		let mut guard = self.records.write();
		let before = guard.len();

		guard.retain(|_, record| instant <= record.resets_at);

		before - guard.len()
	}

	/// Number of clients with a physically present record.
	pub fn tracked_clients(&self) -> usize {
		self.records.read().len()
	}
}
impl RateLimitPolicy for FixedWindowLimiter {
	fn evaluate(&self, context: &RateLimitContext) -> RateLimitFuture<'_> {
		let decision = self.check_at(&context.client, context.observed_at);

		Box::pin(async move { Ok(decision) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn client(value: &str) -> ClientId {
		ClientId::new(value).expect("Client fixture should be valid.")
	}

	#[test]
	fn requests_over_the_budget_are_rejected_with_retry_after() {
		let limiter = FixedWindowLimiter::new(WindowPolicy::new(3, Duration::minutes(15)));
		let now = macros::datetime!(2025-04-01 09:00 UTC);
		let ip = client("198.51.100.4");

		for expected_remaining in [2, 1, 0] {
			match limiter.check_at(&ip, now) {
				RateLimitDecision::Allow(quota) =>
					assert_eq!(quota.remaining, expected_remaining),
				RateLimitDecision::Reject(_) => panic!("Request within budget was rejected."),
			}
		}

		let fourth = limiter.check_at(&ip, now + Duration::minutes(1));

		assert!(!fourth.is_allowed());

		let retry_after =
			fourth.retry_after().expect("A rejection must carry a retry-after hint.");

		assert!(retry_after.is_positive());
		assert_eq!(retry_after, Duration::minutes(14));
	}

	#[test]
	fn window_rollover_restarts_the_count() {
		let limiter = FixedWindowLimiter::new(WindowPolicy::new(2, Duration::minutes(15)));
		let now = macros::datetime!(2025-04-01 09:00 UTC);
		let ip = client("198.51.100.4");

		limiter.check_at(&ip, now);
		limiter.check_at(&ip, now);

		assert!(!limiter.check_at(&ip, now).is_allowed());

		// One second past the reset instant, the old record is logically absent.
		let after_reset = now + Duration::minutes(15) + Duration::SECOND;

		match limiter.check_at(&ip, after_reset) {
			RateLimitDecision::Allow(quota) => {
				assert_eq!(quota.remaining, 1, "The count must restart at 1 after rollover.");
				assert_eq!(quota.resets_at, after_reset + Duration::minutes(15));
			},
			RateLimitDecision::Reject(_) => panic!("Post-rollover request was rejected."),
		}
	}

	#[test]
	fn clients_are_budgeted_independently() {
		let limiter = FixedWindowLimiter::new(WindowPolicy::new(1, Duration::minutes(15)));
		let now = macros::datetime!(2025-04-01 09:00 UTC);

		assert!(limiter.check_at(&client("203.0.113.1"), now).is_allowed());
		assert!(!limiter.check_at(&client("203.0.113.1"), now).is_allowed());
		assert!(limiter.check_at(&client("203.0.113.2"), now).is_allowed());
	}

	#[test]
	fn sweep_reclaims_only_elapsed_windows() {
		let limiter = FixedWindowLimiter::new(WindowPolicy::new(5, Duration::minutes(15)));
		let now = macros::datetime!(2025-04-01 09:00 UTC);

		limiter.check_at(&client("203.0.113.1"), now);
		limiter.check_at(&client("203.0.113.2"), now + Duration::minutes(10));

		assert_eq!(limiter.tracked_clients(), 2);

		// The first window resets at 09:15; sweep just past it.
		let reclaimed = limiter.sweep_at(now + Duration::minutes(15) + Duration::SECOND);

		assert_eq!(reclaimed, 1);
		assert_eq!(limiter.tracked_clients(), 1);
	}

	#[test]
	fn static_tiers_carry_expected_budgets() {
		assert_eq!(WindowPolicy::general().max_requests, 100);
		assert_eq!(WindowPolicy::authentication().max_requests, 5);
		assert_eq!(WindowPolicy::general().window, Duration::minutes(15));
	}

	#[tokio::test]
	async fn policy_trait_reports_the_same_decisions() {
		let limiter = FixedWindowLimiter::new(WindowPolicy::new(1, Duration::minutes(15)));
		let context = RateLimitContext::new(client("203.0.113.9"), "login")
			.with_observed_at(macros::datetime!(2025-04-01 09:00 UTC));
		let first = limiter
			.evaluate(&context)
			.await
			.expect("In-memory evaluation should never error.");

		assert!(first.is_allowed());

		let second = limiter
			.evaluate(&context)
			.await
			.expect("In-memory evaluation should never error.");

		assert!(!second.is_allowed());
		assert!(second.retry_after().is_some_and(|delay| delay.is_positive()));
	}
}
