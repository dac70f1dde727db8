//! Session holder contracts and built-in token storage implementations.
//!
//! A session holds at most one bearer token. The token is superseded wholesale on refresh,
//! never mutated in place, and [`SessionStore::compare_and_swap`] exists so a renewal that
//! lost a race can neither clobber a newer token nor resurrect a cleared session.

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`SessionStore`] operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionError>> + 'a + Send>>;

/// Storage contract for the single bearer token a session holds.
///
/// Implementations decide where the token lives (process memory, disk, a keychain); the
/// scheduler and coordinator only ever speak this interface.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the session token.
	fn save(&self, token: TokenSecret) -> SessionFuture<'_, ()>;

	/// Fetches the current session token, if one is held.
	fn fetch(&self) -> SessionFuture<'_, Option<TokenSecret>>;

	/// Discards the session token.
	fn clear(&self) -> SessionFuture<'_, ()>;

	/// Atomically replaces the token if the held value matches `expected`.
	///
	/// `expected: None` means "nothing should be held"; pairing it with an empty store
	/// installs the replacement.
	fn compare_and_swap<'a>(
		&'a self,
		expected: Option<&'a str>,
		replacement: TokenSecret,
	) -> SessionFuture<'a, SwapOutcome>;
}

/// Result of a compare-and-swap replacement attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapOutcome {
	/// The held token matched `expected` and was replaced.
	Updated,
	/// A different token is held; another writer rotated first.
	Mismatch,
	/// No token is held; the session was cleared while the swap was in flight.
	Missing,
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage mechanism.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

pub(crate) fn swap_slot(
	slot: &mut Option<TokenSecret>,
	expected: Option<&str>,
	replacement: TokenSecret,
) -> SwapOutcome {
	let outcome = match (slot.as_ref(), expected) {
		(Some(current), Some(expected)) if current.expose() == expected => SwapOutcome::Updated,
		(Some(_), _) => SwapOutcome::Mismatch,
		(None, None) => SwapOutcome::Updated,
		(None, Some(_)) => SwapOutcome::Missing,
	};

	if matches!(outcome, SwapOutcome::Updated) {
		*slot = Some(replacement);
	}

	outcome
}
