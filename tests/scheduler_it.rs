// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use session_warden::{
	auth::{FreshnessChecker, TokenSecret},
	http::{AuthClient, AuthFuture, Credentials},
	refresh::RefreshCoordinator,
	scheduler::{RefreshScheduler, SchedulerConfig},
	session::{MemorySessionStore, SessionStore},
};

fn bearer_token(expires_at: OffsetDateTime) -> TokenSecret {
	let encode = |value: &serde_json::Value| {
		URL_SAFE_NO_PAD
			.encode(serde_json::to_vec(value).expect("Token fixture JSON should serialize."))
	};
	let header = encode(&json!({ "alg": "none", "typ": "JWT" }));
	let payload = encode(&json!({
		"sub": "scheduled-user",
		"iat": (expires_at - Duration::hours(1)).unix_timestamp(),
		"exp": expires_at.unix_timestamp(),
	}));

	TokenSecret::new(format!("{header}.{payload}.fixture"))
}

#[derive(Debug, Default)]
struct SpyAuthClient {
	refresh_calls: AtomicU64,
}
impl SpyAuthClient {
	fn refresh_calls(&self) -> u64 {
		self.refresh_calls.load(Ordering::Relaxed)
	}
}
impl AuthClient for SpyAuthClient {
	fn issue<'a>(&'a self, _credentials: &'a Credentials) -> AuthFuture<'a, TokenSecret> {
		Box::pin(async move { Ok(bearer_token(OffsetDateTime::now_utc() + Duration::hours(1))) })
	}

	fn refresh<'a>(&'a self, _current: &'a TokenSecret) -> AuthFuture<'a, TokenSecret> {
		Box::pin(async move {
			self.refresh_calls.fetch_add(1, Ordering::Relaxed);

			Ok(bearer_token(OffsetDateTime::now_utc() + Duration::hours(1)))
		})
	}
}

fn scheduler_around(
	store: MemorySessionStore,
	auth: Arc<SpyAuthClient>,
	tick: Duration,
) -> RefreshScheduler {
	let coordinator =
		Arc::new(RefreshCoordinator::new(Arc::new(store), auth, FreshnessChecker::new()));

	RefreshScheduler::new(coordinator, SchedulerConfig::new().with_tick_interval(tick))
		.expect("Scheduler fixture configuration should be valid.")
}

#[tokio::test]
async fn activation_performs_an_immediate_check() {
	let stale = bearer_token(OffsetDateTime::now_utc() + Duration::minutes(1));
	let store = MemorySessionStore::with_token(stale.clone());
	let auth = Arc::new(SpyAuthClient::default());
	let scheduler = scheduler_around(store.clone(), auth.clone(), Duration::minutes(14));

	assert!(!scheduler.is_active());
	assert!(scheduler.activate());
	assert!(scheduler.is_active());

	tokio::time::sleep(StdDuration::from_millis(100)).await;

	assert_eq!(auth.refresh_calls(), 1, "The first pass must run without waiting a tick.");

	let persisted = store
		.fetch()
		.await
		.expect("Fetching the renewed token should succeed.")
		.expect("The renewed token should be persisted.");

	assert_ne!(persisted.expose(), stale.expose());

	scheduler.deactivate();
}

#[tokio::test]
async fn activation_is_idempotent() {
	let store =
		MemorySessionStore::with_token(bearer_token(OffsetDateTime::now_utc() + Duration::hours(2)));
	let auth = Arc::new(SpyAuthClient::default());
	let scheduler = scheduler_around(store, auth, Duration::minutes(14));

	assert!(scheduler.activate());
	assert!(!scheduler.activate(), "Activating an active scheduler must be a no-op.");

	scheduler.deactivate();
}

#[tokio::test]
async fn deactivation_cancels_pending_work() {
	// A stale token and a short tick would drive renewals on every pass; deactivating
	// immediately must prevent all of them.
	let store =
		MemorySessionStore::with_token(bearer_token(OffsetDateTime::now_utc() + Duration::minutes(1)));
	let auth = Arc::new(SpyAuthClient::default());
	let scheduler = scheduler_around(store, auth.clone(), Duration::milliseconds(20));

	assert!(scheduler.activate());
	assert!(scheduler.deactivate());
	assert!(!scheduler.is_active());

	let observed = auth.refresh_calls();

	tokio::time::sleep(StdDuration::from_millis(120)).await;

	assert_eq!(
		auth.refresh_calls(),
		observed,
		"No refresh attempt may land after deactivation."
	);
	assert!(!scheduler.deactivate(), "Deactivating an idle scheduler must report false.");
}

#[tokio::test]
async fn dropping_the_scheduler_cancels_its_timer() {
	let store =
		MemorySessionStore::with_token(bearer_token(OffsetDateTime::now_utc() + Duration::minutes(1)));
	let auth = Arc::new(SpyAuthClient::default());

	{
		let scheduler = scheduler_around(store, auth.clone(), Duration::milliseconds(20));

		scheduler.activate();
	}

	let observed = auth.refresh_calls();

	tokio::time::sleep(StdDuration::from_millis(120)).await;

	assert_eq!(
		auth.refresh_calls(),
		observed,
		"A dropped scheduler must not leave a ticking task behind."
	);
}

#[tokio::test]
async fn empty_sessions_are_skipped_while_staying_active() {
	let store = MemorySessionStore::default();
	let auth = Arc::new(SpyAuthClient::default());
	let scheduler = scheduler_around(store, auth.clone(), Duration::milliseconds(20));

	scheduler.activate();
	tokio::time::sleep(StdDuration::from_millis(100)).await;

	assert_eq!(auth.refresh_calls(), 0, "Ticks without a token must be no-ops.");
	assert!(scheduler.is_active(), "An empty session must not deactivate the scheduler.");

	scheduler.deactivate();
}

#[tokio::test]
async fn fresh_tokens_pass_ticks_untouched() {
	let fresh = bearer_token(OffsetDateTime::now_utc() + Duration::hours(2));
	let store = MemorySessionStore::with_token(fresh.clone());
	let auth = Arc::new(SpyAuthClient::default());
	let scheduler = scheduler_around(store.clone(), auth.clone(), Duration::milliseconds(20));

	scheduler.activate();
	tokio::time::sleep(StdDuration::from_millis(100)).await;
	scheduler.deactivate();

	assert_eq!(auth.refresh_calls(), 0, "A fresh token must never trigger a renewal.");

	let held = store
		.fetch()
		.await
		.expect("Fetching the untouched token should succeed.")
		.expect("The fresh token should remain present.");

	assert_eq!(held.expose(), fresh.expose());
}

#[tokio::test]
async fn refresh_now_works_from_the_idle_state() {
	let store =
		MemorySessionStore::with_token(bearer_token(OffsetDateTime::now_utc() + Duration::hours(2)));
	let auth = Arc::new(SpyAuthClient::default());
	let scheduler = scheduler_around(store, auth.clone(), Duration::minutes(14));
	let renewed = scheduler
		.refresh_now()
		.await
		.expect("A manual refresh should succeed without activation.");

	assert_eq!(auth.refresh_calls(), 1, "Manual refresh must renew unconditionally.");
	assert!(renewed.expose().contains('.'));
	assert!(!scheduler.is_active(), "Manual refresh must not change the scheduler state.");
}
