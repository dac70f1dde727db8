//! Thread-safe in-memory [`SessionStore`] for tests and in-process clients.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	session::{self, SessionFuture, SessionStore, SwapOutcome},
};

type Slot = Arc<RwLock<Option<TokenSecret>>>;

/// Keeps the session token in process memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(Slot);
impl MemorySessionStore {
	/// Creates a store already holding `token`.
	pub fn with_token(token: TokenSecret) -> Self {
		Self(Arc::new(RwLock::new(Some(token))))
	}
}
impl SessionStore for MemorySessionStore {
	fn save(&self, token: TokenSecret) -> SessionFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(token);

			Ok(())
		})
	}

	fn fetch(&self) -> SessionFuture<'_, Option<TokenSecret>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn clear(&self) -> SessionFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = None;

			Ok(())
		})
	}

	fn compare_and_swap<'a>(
		&'a self,
		expected: Option<&'a str>,
		replacement: TokenSecret,
	) -> SessionFuture<'a, SwapOutcome> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(session::swap_slot(&mut slot.write(), expected, replacement)) })
	}
}
