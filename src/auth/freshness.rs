//! Token freshness verdicts and the configurable decode-failure policy.

// self
use crate::{
	_prelude::*,
	auth::{Claims, TokenSecret},
};

/// Policy applied when a stored token cannot be decoded.
///
/// The default preserves the historical fail-open behavior: an undecodable token is treated
/// as still usable. Callers relying on freshness verdicts for any security decision must use
/// [`DecodeFailurePolicy::FailClosed`] — an unverifiable token proves nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeFailurePolicy {
	/// Treat undecodable tokens as still usable.
	#[default]
	FailOpen,
	/// Treat undecodable tokens as expired.
	FailClosed,
}

/// Freshness verdict for a bearer token at some instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
	/// Token is valid beyond the refresh threshold.
	Fresh {
		/// Time left before the expiry claim.
		remaining: Duration,
	},
	/// Token is valid but inside the refresh threshold.
	ExpiringSoon {
		/// Time left before the expiry claim.
		remaining: Duration,
	},
	/// Token is past its expiry claim.
	Expired {
		/// Time elapsed since the expiry claim.
		overdue: Duration,
	},
	/// Token payload could not be decoded; nothing can be proven about it.
	Unverifiable,
}
impl Freshness {
	/// Remaining validity when the token decoded; negative once expired, `None` when
	/// unverifiable.
	pub fn remaining(&self) -> Option<Duration> {
		match self {
			Self::Fresh { remaining } | Self::ExpiringSoon { remaining } => Some(*remaining),
			Self::Expired { overdue } => Some(-*overdue),
			Self::Unverifiable => None,
		}
	}

	/// Returns `true` when the verdict warrants replacing the token.
	///
	/// Unverifiable tokens always warrant a refresh: whatever the decode-failure policy says
	/// about trusting them, a replacement is strictly better.
	pub fn needs_refresh(&self) -> bool {
		!matches!(self, Self::Fresh { .. })
	}
}

/// Stateless freshness checker with a refresh threshold and a decode-failure policy.
#[derive(Clone, Copy, Debug)]
pub struct FreshnessChecker {
	refresh_threshold: Duration,
	decode_failure: DecodeFailurePolicy,
}
impl FreshnessChecker {
	/// Default window before expiry in which a token counts as expiring soon.
	pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::minutes(5);

	/// Creates a checker with the default threshold and the fail-open decode policy.
	pub fn new() -> Self {
		Self {
			refresh_threshold: Self::DEFAULT_REFRESH_THRESHOLD,
			decode_failure: DecodeFailurePolicy::default(),
		}
	}

	/// Overrides the refresh threshold (negative values clamp to zero).
	pub fn with_refresh_threshold(mut self, threshold: Duration) -> Self {
		self.refresh_threshold = if threshold.is_negative() { Duration::ZERO } else { threshold };

		self
	}

	/// Overrides the decode-failure policy.
	pub fn with_decode_failure(mut self, policy: DecodeFailurePolicy) -> Self {
		self.decode_failure = policy;

		self
	}

	/// The configured refresh threshold.
	pub fn refresh_threshold(&self) -> Duration {
		self.refresh_threshold
	}

	/// The configured decode-failure policy.
	pub fn decode_failure(&self) -> DecodeFailurePolicy {
		self.decode_failure
	}

	/// Evaluates `token` against `instant`. Pure; never panics on garbage input.
	pub fn evaluate_at(&self, token: &TokenSecret, instant: OffsetDateTime) -> Freshness {
		let Ok(claims) = Claims::decode(token) else {
			return Freshness::Unverifiable;
		};
		let remaining = claims.remaining_at(instant);

		if remaining <= Duration::ZERO {
			Freshness::Expired { overdue: -remaining }
		} else if remaining <= self.refresh_threshold {
			Freshness::ExpiringSoon { remaining }
		} else {
			Freshness::Fresh { remaining }
		}
	}

	/// Evaluates `token` against the current UTC clock.
	pub fn evaluate(&self, token: &TokenSecret) -> Freshness {
		self.evaluate_at(token, OffsetDateTime::now_utc())
	}

	/// Applies the decode-failure policy to a verdict.
	pub fn treat_as_expired(&self, verdict: &Freshness) -> bool {
		match verdict {
			Freshness::Expired { .. } => true,
			Freshness::Unverifiable =>
				matches!(self.decode_failure, DecodeFailurePolicy::FailClosed),
			Freshness::Fresh { .. } | Freshness::ExpiringSoon { .. } => false,
		}
	}
}
impl Default for FreshnessChecker {
	fn default() -> Self {
		Self::new()
	}
}
