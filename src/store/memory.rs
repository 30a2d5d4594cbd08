//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{PersistedState, SessionStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<PersistedState>>>;

/// Keeps the snapshot in-process; nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl SessionStore for MemoryStore {
	fn save(&self, snapshot: PersistedState) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(snapshot);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<PersistedState>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = None;

			Ok(())
		})
	}
}
