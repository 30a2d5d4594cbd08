//! Signed-in user identity as returned by the backend.

// self
use crate::_prelude::*;

/// Identity fields carried in the login response and stored in the session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Backend-assigned user identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Email address used for sign-in.
	pub email: String,
	/// Phone number used for OTP verification.
	pub phone_number: String,
	/// Home city shown on the dashboard.
	pub city: String,
}
