//! Demonstrates keeping a session token fresh against a mock auth service: issue a token,
//! activate the scheduler with a short tick, watch a renewal land, and shut down cleanly.

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use time::Duration;
// self
use session_warden::{
	auth::FreshnessChecker,
	http::{AuthClient, AuthEndpoints, Credentials, ReqwestAuthClient},
	refresh::RefreshCoordinator,
	scheduler::{RefreshScheduler, SchedulerConfig},
	session::{MemorySessionStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	// An unsigned two-minute token; short enough that the default five-minute refresh
	// threshold asks for a renewal on the very first tick.
	server
		.mock_async(|when, then| {
			when.method(POST).path("/login");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "token": demo_token(120) }));
		})
		.await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "token": demo_token(3_600) }));
		})
		.await;
	let endpoints = AuthEndpoints::parse(&server.url("/login"), &server.url("/refresh"))?;
	let auth = ReqwestAuthClient::new(endpoints)?;
	let issued = auth.issue(&Credentials::new("demo@example.com", "demo-secret")).await?;

	println!("Issued token fingerprint: {}.", issued.fingerprint());

	let store = Arc::new(MemorySessionStore::with_token(issued));
	let coordinator = Arc::new(RefreshCoordinator::new(
		store.clone(),
		Arc::new(auth),
		FreshnessChecker::new(),
	));
	let scheduler = RefreshScheduler::new(
		coordinator,
		SchedulerConfig::new().with_tick_interval(Duration::seconds(2)),
	)?;

	scheduler.activate();
	tokio::time::sleep(StdDuration::from_secs(1)).await;
	scheduler.deactivate();

	let held = store.fetch().await?.expect("The renewed token should be held.");

	println!("Renewed token fingerprint: {}.", held.fingerprint());

	refresh_mock.assert_async().await;

	Ok(())
}

fn demo_token(lifetime_secs: i64) -> String {
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

	let now = time::OffsetDateTime::now_utc();
	let encode = |value: &serde_json::Value| {
		URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).expect("Demo JSON should serialize."))
	};
	let header = encode(&json!({ "alg": "none", "typ": "JWT" }));
	let payload = encode(&json!({
		"sub": "demo-user",
		"iat": now.unix_timestamp(),
		"exp": now.unix_timestamp() + lifetime_secs,
	}));

	format!("{header}.{payload}.demo")
}
