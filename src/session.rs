//! Injectable session context shared by the gateway and API operations.

pub mod secret;
pub mod user;

pub use secret::*;
pub use user::*;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::_prelude::*;

/// Snapshot of the active session.
///
/// Created empty at startup, populated on sign-in, and cleared on sign-out or
/// unrecoverable refresh failure. Reads taken from [`SessionHandle`] are snapshots;
/// only the gateway's refresh path and explicit sign-in/sign-out mutate the shared
/// state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Session {
	/// Signed-in user identity, if any.
	pub user: Option<User>,
	/// Short-lived bearer credential authorizing API calls.
	pub access_token: Option<TokenSecret>,
	/// Longer-lived credential exchanged for a new access credential.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the current session was established.
	pub signed_in_at: Option<OffsetDateTime>,
}
impl Session {
	/// Returns `true` if an access credential is present.
	pub fn is_authenticated(&self) -> bool {
		self.access_token.is_some()
	}
}

/// Cloneable, thread-safe handle owning the process-wide session.
///
/// The handle is passed explicitly to the gateway instead of living in ambient global
/// state, so tests can provision isolated sessions per scenario.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle {
	inner: Arc<RwLock<Session>>,
	loading: Arc<AtomicBool>,
}
impl SessionHandle {
	/// Creates an empty, signed-out handle.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a handle pre-populated with an existing session (e.g. restored from disk).
	pub fn from_session(session: Session) -> Self {
		Self { inner: Arc::new(RwLock::new(session)), loading: Arc::default() }
	}

	/// Returns a snapshot of the current session.
	pub fn snapshot(&self) -> Session {
		self.inner.read().clone()
	}

	/// Returns the current access credential, if any.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.inner.read().access_token.clone()
	}

	/// Returns the current refresh credential, if any.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.inner.read().refresh_token.clone()
	}

	/// Returns the signed-in user identity, if any.
	pub fn user(&self) -> Option<User> {
		self.inner.read().user.clone()
	}

	/// Returns `true` if an access credential is present.
	pub fn is_authenticated(&self) -> bool {
		self.inner.read().is_authenticated()
	}

	/// Establishes a new session after a successful sign-in.
	pub fn sign_in(&self, user: User, access: TokenSecret, refresh: Option<TokenSecret>) {
		let mut guard = self.inner.write();

		guard.user = Some(user);
		guard.access_token = Some(access);
		guard.refresh_token = refresh;
		guard.signed_in_at = Some(OffsetDateTime::now_utc());
	}

	/// Rotates both credentials after a successful refresh, keeping the user identity.
	pub fn install_tokens(&self, access: TokenSecret, refresh: TokenSecret) {
		let mut guard = self.inner.write();

		guard.access_token = Some(access);
		guard.refresh_token = Some(refresh);
	}

	/// Replaces the stored user identity without touching credentials.
	pub fn set_user(&self, user: User) {
		self.inner.write().user = Some(user);
	}

	/// Replaces the whole session, e.g. when restoring a persisted snapshot.
	pub fn restore(&self, session: Session) {
		*self.inner.write() = session;
	}

	/// Clears the session entirely.
	pub fn sign_out(&self) {
		*self.inner.write() = Session::default();
	}

	/// Marks whether a gateway call is currently in flight.
	pub fn set_loading(&self, loading: bool) {
		self.loading.store(loading, Ordering::Relaxed);
	}

	/// Returns `true` while a gateway call is in flight.
	pub fn is_loading(&self) -> bool {
		self.loading.load(Ordering::Relaxed)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn fixture_user() -> User {
		User {
			id: "u-1".into(),
			name: "Ada".into(),
			email: "ada@example.com".into(),
			phone_number: "+4915200000000".into(),
			city: "Berlin".into(),
		}
	}

	#[test]
	fn sign_in_populates_and_sign_out_clears() {
		let handle = SessionHandle::new();

		assert!(!handle.is_authenticated());

		handle.sign_in(
			fixture_user(),
			TokenSecret::new("access-1"),
			Some(TokenSecret::new("refresh-1")),
		);

		assert!(handle.is_authenticated());
		assert_eq!(handle.user().map(|u| u.email), Some("ada@example.com".into()));
		assert!(handle.snapshot().signed_in_at.is_some());

		handle.sign_out();

		let cleared = handle.snapshot();

		assert!(cleared.user.is_none());
		assert!(cleared.access_token.is_none());
		assert!(cleared.refresh_token.is_none());
		assert!(cleared.signed_in_at.is_none());
	}

	#[test]
	fn install_tokens_keeps_identity() {
		let handle = SessionHandle::new();

		handle.sign_in(
			fixture_user(),
			TokenSecret::new("access-old"),
			Some(TokenSecret::new("refresh-old")),
		);
		handle.install_tokens(TokenSecret::new("access-new"), TokenSecret::new("refresh-new"));

		assert_eq!(handle.access_token().as_ref().map(TokenSecret::expose), Some("access-new"));
		assert_eq!(handle.refresh_token().as_ref().map(TokenSecret::expose), Some("refresh-new"));
		assert_eq!(handle.user().map(|u| u.id), Some("u-1".into()));
	}

	#[test]
	fn clones_share_state() {
		let handle = SessionHandle::new();
		let twin = handle.clone();

		handle.sign_in(fixture_user(), TokenSecret::new("shared"), None);

		assert!(twin.is_authenticated());

		twin.set_loading(true);

		assert!(handle.is_loading());
	}
}
