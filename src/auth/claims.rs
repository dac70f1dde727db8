//! Bearer-token payload decoding and claim accessors.
//!
//! A bearer token is three dot-separated, unpadded base64url segments (header, payload,
//! signature). Only the payload is consumed locally; signature verification stays with the
//! issuing service.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Errors produced while decoding a bearer-token payload.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// Token does not consist of exactly three dot-separated segments.
	#[error("Bearer token must contain three dot-separated segments, found {segments}.")]
	MalformedStructure {
		/// Number of segments found.
		segments: usize,
	},
	/// Payload segment is not valid unpadded base64url.
	#[error("Bearer token payload is not valid base64.")]
	PayloadEncoding(#[from] base64::DecodeError),
	/// Payload decodes but does not parse as claims JSON.
	#[error("Bearer token payload is not valid claims JSON.")]
	PayloadParse(#[source] serde_path_to_error::Error<serde_json::error::Error>),
}

/// Claims carried in a bearer-token payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// Subject identifier, when the issuer provides one.
	#[serde(default, rename = "sub")]
	pub subject: Option<String>,
	/// Expiry instant, encoded as seconds since the epoch.
	#[serde(rename = "exp", with = "time::serde::timestamp")]
	pub expires_at: OffsetDateTime,
	/// Issued-at instant, when present.
	#[serde(default, rename = "iat", with = "time::serde::timestamp::option")]
	pub issued_at: Option<OffsetDateTime>,
}
impl Claims {
	/// Decodes the payload segment of `token` without verifying its signature.
	pub fn decode(token: &TokenSecret) -> Result<Self, ClaimsError> {
		let segments = token.expose().split('.').collect::<Vec<_>>();

		if segments.len() != 3 {
			return Err(ClaimsError::MalformedStructure { segments: segments.len() });
		}

		let payload = URL_SAFE_NO_PAD.decode(segments[1])?;
		let mut deserializer = serde_json::Deserializer::from_slice(&payload);

		serde_path_to_error::deserialize(&mut deserializer).map_err(ClaimsError::PayloadParse)
	}

	/// Time left before the expiry claim at `instant`; negative once past due.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}

	/// Returns `true` once `instant` is at or past the expiry claim.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::make_bearer_token;

	#[test]
	fn decode_round_trips_fixture_payloads() {
		let issued = OffsetDateTime::from_unix_timestamp(1_700_000_000)
			.expect("Issued-at fixture timestamp should be valid.");
		let expires = issued + Duration::hours(1);
		let token = make_bearer_token("user-42", issued, expires);
		let claims = Claims::decode(&token).expect("Fixture token should decode successfully.");

		assert_eq!(claims.subject.as_deref(), Some("user-42"));
		assert_eq!(claims.issued_at, Some(issued));
		assert_eq!(claims.expires_at, expires);
	}

	#[test]
	fn decode_rejects_malformed_structures() {
		let err = Claims::decode(&TokenSecret::new("only-one-segment"))
			.expect_err("A segmentless string must be rejected.");

		assert!(matches!(err, ClaimsError::MalformedStructure { segments: 1 }));

		let err = Claims::decode(&TokenSecret::new("a.b.c.d"))
			.expect_err("Four segments must be rejected.");

		assert!(matches!(err, ClaimsError::MalformedStructure { segments: 4 }));
	}

	#[test]
	fn decode_rejects_bad_encodings_and_bad_json() {
		assert!(matches!(
			Claims::decode(&TokenSecret::new("head.%%%.sig")),
			Err(ClaimsError::PayloadEncoding(_))
		));

		// "bm90LWpzb24" is base64url for "not-json".
		assert!(matches!(
			Claims::decode(&TokenSecret::new("head.bm90LWpzb24.sig")),
			Err(ClaimsError::PayloadParse(_))
		));
	}

	#[test]
	fn remaining_and_expiry_track_the_instant() {
		let expires = OffsetDateTime::from_unix_timestamp(1_700_003_600)
			.expect("Expiry fixture timestamp should be valid.");
		let claims = Claims { subject: None, expires_at: expires, issued_at: None };
		let before = expires - Duration::minutes(10);

		assert_eq!(claims.remaining_at(before), Duration::minutes(10));
		assert!(!claims.is_expired_at(before));
		assert!(claims.is_expired_at(expires));
		assert_eq!(claims.remaining_at(expires + Duration::seconds(30)), Duration::seconds(-30));
	}
}
