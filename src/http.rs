//! Auth-service collaborator contracts and the reqwest-backed client.
//!
//! The module exposes [`AuthClient`] so downstream crates can integrate any transport or
//! protocol for token issuance and refresh. The built-in [`ReqwestAuthClient`] speaks a
//! minimal JSON contract: POST credentials to the issue endpoint, POST the current bearer
//! token to the refresh endpoint, each answered by `{"token": "..."}`.

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	RequestBuilder, StatusCode,
	header::{AUTHORIZATION, HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};
#[cfg(feature = "reqwest")]
use crate::error::{TransientError, TransportError};

/// Boxed future returned by [`AuthClient`] operations.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Collaborator contract for the external service that mints and renews bearer tokens.
///
/// The crate never inspects how the service authenticates requests or signs tokens; it only
/// needs the two exchanges below, each producing an opaque [`TokenSecret`].
pub trait AuthClient
where
	Self: Send + Sync,
{
	/// Exchanges login credentials for an initial bearer token.
	fn issue<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a, TokenSecret>;

	/// Exchanges the current bearer token for a fresh one.
	fn refresh<'a>(&'a self, current: &'a TokenSecret) -> AuthFuture<'a, TokenSecret>;
}

/// Login credentials presented to the issue endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
	/// Account identifier (e-mail address or username).
	pub identifier: String,
	/// Account secret; callers must avoid logging it.
	pub secret: String,
}
impl Credentials {
	/// Creates a credentials pair.
	pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { identifier: identifier.into(), secret: secret.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("identifier", &self.identifier)
			.field("secret", &"<redacted>")
			.finish()
	}
}

/// Endpoint pair for the auth service.
#[derive(Clone, Debug)]
pub struct AuthEndpoints {
	/// Token issuance endpoint (login).
	pub issue_url: Url,
	/// Token refresh endpoint.
	pub refresh_url: Url,
}
impl AuthEndpoints {
	/// Builds the pair from already-parsed URLs.
	pub fn new(issue_url: Url, refresh_url: Url) -> Self {
		Self { issue_url, refresh_url }
	}

	/// Parses both endpoints from strings.
	pub fn parse(issue_url: &str, refresh_url: &str) -> Result<Self, ConfigError> {
		Ok(Self {
			issue_url: Url::parse(issue_url)
				.map_err(|source| ConfigError::InvalidEndpoint { source })?,
			refresh_url: Url::parse(refresh_url)
				.map_err(|source| ConfigError::InvalidEndpoint { source })?,
		})
	}
}

#[cfg(feature = "reqwest")]
#[derive(Deserialize)]
struct TokenEnvelope {
	token: String,
}

/// Reqwest-backed [`AuthClient`] speaking the JSON token-envelope contract.
///
/// Token endpoints should not follow redirects — a token must come back from the URL it was
/// requested at, never from a delegate. [`ReqwestAuthClient::new`] builds its transport with
/// redirects disabled; configure any custom client passed to
/// [`with_client`](Self::with_client) the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestAuthClient {
	client: ReqwestClient,
	endpoints: AuthEndpoints,
}
#[cfg(feature = "reqwest")]
impl ReqwestAuthClient {
	/// Creates a client with a redirect-free reqwest transport.
	pub fn new(endpoints: AuthEndpoints) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Ok(Self::with_client(client, endpoints))
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient, endpoints: AuthEndpoints) -> Self {
		Self { client, endpoints }
	}

	async fn dispatch(
		&self,
		request: RequestBuilder,
		denied: impl FnOnce(String) -> Error,
	) -> Result<TokenSecret> {
		let response = request.send().await.map_err(TransportError::from)?;
		let status = response.status();
		let retry_after = parse_retry_after(response.headers());
		let body = response.bytes().await.map_err(TransportError::from)?;

		if !status.is_success() {
			return Err(classify_status(status, &body, retry_after, denied));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let envelope: TokenEnvelope = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TransientError::ResponseParse {
				source,
				status: Some(status.as_u16()),
			})?;

		Ok(TokenSecret::new(envelope.token))
	}
}
#[cfg(feature = "reqwest")]
impl AuthClient for ReqwestAuthClient {
	fn issue<'a>(&'a self, credentials: &'a Credentials) -> AuthFuture<'a, TokenSecret> {
		Box::pin(async move {
			let request = self.client.post(self.endpoints.issue_url.clone()).json(credentials);

			self.dispatch(request, |reason| Error::InvalidClient { reason }).await
		})
	}

	fn refresh<'a>(&'a self, current: &'a TokenSecret) -> AuthFuture<'a, TokenSecret> {
		Box::pin(async move {
			let request = self
				.client
				.post(self.endpoints.refresh_url.clone())
				.header(AUTHORIZATION, format!("Bearer {}", current.expose()));

			self.dispatch(request, |reason| Error::InvalidGrant { reason }).await
		})
	}
}

#[cfg(feature = "reqwest")]
fn classify_status(
	status: StatusCode,
	body: &[u8],
	retry_after: Option<Duration>,
	denied: impl FnOnce(String) -> Error,
) -> Error {
	let reason = String::from_utf8_lossy(body).trim().to_string();
	let reason = if reason.is_empty() {
		status.canonical_reason().unwrap_or("unknown").to_string()
	} else {
		reason
	};

	match status {
		StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN =>
			denied(reason),
		_ => TransientError::AuthEndpoint {
			message: reason,
			status: Some(status.as_u16()),
			retry_after,
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credentials_debug_redacts_the_secret() {
		let credentials = Credentials::new("user@example.com", "hunter2");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("user@example.com"));
		assert!(!rendered.contains("hunter2"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn endpoints_parse_and_reject() {
		let endpoints =
			AuthEndpoints::parse("https://auth.example.com/login", "https://auth.example.com/refresh")
				.expect("Valid endpoint URLs should parse.");

		assert_eq!(endpoints.issue_url.path(), "/login");
		assert_eq!(endpoints.refresh_url.path(), "/refresh");
		assert!(matches!(
			AuthEndpoints::parse("not a url", "https://auth.example.com/refresh"),
			Err(ConfigError::InvalidEndpoint { .. })
		));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_parses_seconds_and_rfc2822() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "120".parse().expect("Numeric header should parse."));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));

		let future = OffsetDateTime::now_utc() + Duration::minutes(10);
		let formatted = future.format(&Rfc2822).expect("Future instant should format.");

		headers.insert(RETRY_AFTER, formatted.parse().expect("Date header should parse."));

		let parsed = parse_retry_after(&headers).expect("Date-based hint should parse.");

		assert!(parsed > Duration::minutes(9));
		assert!(parsed <= Duration::minutes(10));
	}
}
