//! Session freshness and request shaping for bearer-token clients—proactive refresh
//! scheduling, TTL caching, and fixed-window budgets in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod error;
pub mod http;
pub mod limit;
pub mod obs;
pub mod refresh;
pub mod scheduler;
pub mod session;
pub mod sweep;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience fixtures and doubles for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicU64, Ordering},
	};
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use serde_json::json;
	// self
	use crate::{
		auth::TokenSecret,
		http::{AuthClient, AuthFuture, Credentials},
	};

	/// Builds a structurally valid (unsigned) bearer token whose payload carries the provided
	/// subject and instants.
	pub fn make_bearer_token(
		subject: &str,
		issued_at: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> TokenSecret {
		let header = json!({ "alg": "none", "typ": "JWT" });
		let payload = json!({
			"sub": subject,
			"iat": issued_at.unix_timestamp(),
			"exp": expires_at.unix_timestamp(),
		});
		let encode = |value: &serde_json::Value| {
			URL_SAFE_NO_PAD
				.encode(serde_json::to_vec(value).expect("Token fixture JSON should serialize."))
		};

		TokenSecret::new(format!("{}.{}.fixture", encode(&header), encode(&payload)))
	}

	/// Programmable [`AuthClient`] double that counts calls and serves canned responses.
	///
	/// Responses are consumed FIFO; once the queue is empty, every call succeeds with a fresh
	/// one-hour fixture token.
	#[derive(Debug, Default)]
	pub struct StubAuthClient {
		issue_calls: AtomicU64,
		refresh_calls: AtomicU64,
		responses: Mutex<VecDeque<Result<TokenSecret>>>,
	}
	impl StubAuthClient {
		/// Creates a stub with an empty response queue.
		pub fn new() -> Self {
			Self::default()
		}

		/// Enqueues the next response to serve.
		pub fn push_response(&self, response: Result<TokenSecret>) {
			self.responses.lock().push_back(response);
		}

		/// Number of issue calls observed so far.
		pub fn issue_calls(&self) -> u64 {
			self.issue_calls.load(Ordering::Relaxed)
		}

		/// Number of refresh calls observed so far.
		pub fn refresh_calls(&self) -> u64 {
			self.refresh_calls.load(Ordering::Relaxed)
		}

		fn next_response(&self) -> Result<TokenSecret> {
			self.responses.lock().pop_front().unwrap_or_else(|| {
				let now = OffsetDateTime::now_utc();

				Ok(make_bearer_token("stub", now, now + Duration::hours(1)))
			})
		}
	}
	impl AuthClient for StubAuthClient {
		fn issue<'a>(&'a self, _credentials: &'a Credentials) -> AuthFuture<'a, TokenSecret> {
			Box::pin(async move {
				self.issue_calls.fetch_add(1, Ordering::Relaxed);

				self.next_response()
			})
		}

		fn refresh<'a>(&'a self, _current: &'a TokenSecret) -> AuthFuture<'a, TokenSecret> {
			Box::pin(async move {
				self.refresh_calls.fetch_add(1, Ordering::Relaxed);

				self.next_response()
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
