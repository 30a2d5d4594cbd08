//! Persistence contracts for session and local-state snapshots.
//!
//! The original client persists its auth and dashboard stores across page loads;
//! here that concern is a small trait so hosts can choose where snapshots live.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	session::{Session, SessionHandle},
	state::{AppState, FavoriteCity, Post},
};

/// Boxed future returned by [`SessionStore`] implementations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// One persistable snapshot: the session plus the local state that depends on it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PersistedState {
	/// Session snapshot, including credentials.
	pub session: Session,
	/// Pinned dashboard cities.
	pub favorite_cities: Vec<FavoriteCity>,
	/// Social feed entries, newest first.
	pub posts: Vec<Post>,
}
impl PersistedState {
	/// Captures the current session and local state.
	pub fn capture(session: &SessionHandle, state: &AppState) -> Self {
		Self {
			session: session.snapshot(),
			favorite_cities: state.favorite_cities(),
			posts: state.posts(),
		}
	}

	/// Restores this snapshot into live handles.
	pub fn restore_into(self, session: &SessionHandle, state: &AppState) {
		session.restore(self.session);
		state.restore(self.favorite_cities, self.posts);
	}
}

/// Persistence backend contract for [`PersistedState`] snapshots.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the snapshot.
	fn save(&self, snapshot: PersistedState) -> StoreFuture<'_, ()>;

	/// Fetches the persisted snapshot, if present.
	fn load(&self) -> StoreFuture<'_, Option<PersistedState>>;

	/// Removes any persisted snapshot.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
