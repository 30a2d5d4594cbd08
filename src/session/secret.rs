//! Redacting wrapper for bearer and refresh credentials.

// self
use crate::_prelude::*;

/// Credential wrapper keeping token material out of logs and debug output.
///
/// Serialization round-trips the plain value so sessions can be persisted; the
/// `Debug` and `Display` renderings never reveal it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a credential string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw credential. Callers must not log the returned string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_redact_but_serde_round_trips() {
		let secret = TokenSecret::new("bearer-material");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");

		let serialized =
			serde_json::to_string(&secret).expect("Secret should serialize transparently.");

		assert_eq!(serialized, "\"bearer-material\"");

		let restored: TokenSecret =
			serde_json::from_str(&serialized).expect("Secret should deserialize transparently.");

		assert_eq!(restored, secret);
	}
}
