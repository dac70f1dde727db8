//! Refresh coordination with singleflight guards, CAS persistence, and metrics.
//!
//! [`RefreshCoordinator::refresh_if_stale`] lets any caller demand a usable token without
//! worrying about concurrent renewals: each attempt serializes on a singleflight guard,
//! re-reads the session inside the guard, and only contacts the auth service when the
//! freshness verdict warrants it. Replacement tokens are persisted through
//! [`SessionStore::compare_and_swap`] so a renewal that lost a race can neither clobber a
//! newer token nor resurrect a cleared session.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{FreshnessChecker, TokenSecret},
	http::AuthClient,
	obs::{self, TaskKind, TaskOutcome, TaskSpan},
	session::{SessionStore, SwapOutcome},
};

/// Coordinates token renewals for one session.
pub struct RefreshCoordinator {
	store: Arc<dyn SessionStore>,
	auth: Arc<dyn AuthClient>,
	checker: FreshnessChecker,
	metrics: Arc<RefreshMetrics>,
	singleflight: AsyncMutex<()>,
}
impl RefreshCoordinator {
	/// Creates a coordinator around the provided session store and auth collaborator.
	pub fn new(
		store: Arc<dyn SessionStore>,
		auth: Arc<dyn AuthClient>,
		checker: FreshnessChecker,
	) -> Self {
		Self {
			store,
			auth,
			checker,
			metrics: Default::default(),
			singleflight: AsyncMutex::new(()),
		}
	}

	/// Shared metrics recorder for refresh outcomes.
	pub fn metrics(&self) -> Arc<RefreshMetrics> {
		self.metrics.clone()
	}

	/// The freshness checker the coordinator consults.
	pub fn checker(&self) -> &FreshnessChecker {
		&self.checker
	}

	/// Renews the session token if its freshness verdict warrants it.
	///
	/// Returns the token that is authoritative after the call: the untouched current token
	/// when it was still fresh, the replacement on a successful renewal, or the concurrent
	/// winner when another refresh rotated first.
	pub async fn refresh_if_stale(&self) -> Result<TokenSecret> {
		self.run(false, "refresh_if_stale").await
	}

	/// Renews the session token unconditionally; the manual-refresh entry point.
	pub async fn force_refresh(&self) -> Result<TokenSecret> {
		self.run(true, "force_refresh").await
	}

	async fn run(&self, force: bool, stage: &'static str) -> Result<TokenSecret> {
		const KIND: TaskKind = TaskKind::Refresh;

		let span = TaskSpan::new(KIND, stage);

		obs::record_task_outcome(KIND, TaskOutcome::Attempt);

		let result = span.instrument(self.run_guarded(force)).await;

		match &result {
			Ok(_) => obs::record_task_outcome(KIND, TaskOutcome::Success),
			Err(_) => obs::record_task_outcome(KIND, TaskOutcome::Failure),
		}

		result
	}

	async fn run_guarded(&self, force: bool) -> Result<TokenSecret> {
		let _singleflight = self.singleflight.lock().await;
		let now = OffsetDateTime::now_utc();
		let current = self.store.fetch().await?.ok_or(Error::NoSession)?;

		self.metrics.record_attempt();

		if !force && !self.checker.evaluate_at(&current, now).needs_refresh() {
			self.metrics.record_reuse();

			return Ok(current);
		}

		let replacement = match self.auth.refresh(&current).await {
			Ok(token) => token,
			Err(err) => {
				self.metrics.record_failure();

				return Err(err);
			},
		};
		let outcome = self
			.store
			.compare_and_swap(Some(current.expose()), replacement.clone())
			.await
			.inspect_err(|_| self.metrics.record_failure())?;

		match outcome {
			SwapOutcome::Updated => {
				self.metrics.record_renewal();

				#[cfg(feature = "tracing")]
				tracing::debug!(
					fingerprint = %replacement.fingerprint(),
					"Session token rotated."
				);

				Ok(replacement)
			},
			SwapOutcome::Mismatch => {
				// Another refresh won while this one was in flight; hand back the winner
				// instead of double-rotating.
				match self
					.store
					.fetch()
					.await
					.inspect_err(|_| self.metrics.record_failure())?
				{
					Some(winner) => {
						self.metrics.record_reuse();

						Ok(winner)
					},
					None => {
						self.metrics.record_failure();

						Err(Error::NoSession)
					},
				}
			},
			SwapOutcome::Missing => {
				// The session was cleared while the renewal was in flight; a logout wins and
				// the freshly minted token is discarded.
				self.metrics.record_failure();

				Err(Error::NoSession)
			},
		}
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator").field("checker", &self.checker).finish()
	}
}
