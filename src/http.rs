//! Transport primitives for backend and weather-provider calls.
//!
//! The module exposes [`ApiTransport`] so downstream crates can integrate custom HTTP
//! stacks: the gateway only ever sees [`ApiCall`] descriptions going out and
//! [`RawResponse`] values coming back, and every status-based decision (success,
//! failure detail, 401 recovery) is made on top of that seam. The default
//! [`ReqwestTransport`] implementation is feature-gated behind `reqwest`.

// std
use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::AUTHORIZATION;
// self
use crate::{_prelude::*, error::ProtocolError, session::TokenSecret};

/// Boxed future returned by [`ApiTransport`] implementations.
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, crate::error::TransportError>> + 'a + Send>>;

/// HTTP methods used by the RunCast backend and the weather provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP DELETE.
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A fully resolved outbound HTTP call.
///
/// Additional fields may be added in future releases, so downstream code should
/// construct values through [`ApiCall::new`] and the builder-style helpers.
#[derive(Clone, Debug)]
pub struct ApiCall {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Bearer credential to attach, if the call is authenticated.
	pub bearer: Option<TokenSecret>,
	/// JSON request body, if any.
	pub body: Option<serde_json::Value>,
	/// Per-call timeout; `None` lets the transport's own default apply.
	pub timeout: Option<Duration>,
}
impl ApiCall {
	/// Creates a call with no credential, body, or timeout.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, bearer: None, body: None, timeout: None }
	}

	/// Attaches a bearer credential.
	pub fn with_bearer(mut self, bearer: TokenSecret) -> Self {
		self.bearer = Some(bearer);

		self
	}

	/// Attaches a JSON body.
	pub fn with_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Sets a per-call timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

/// Status and body captured from a completed HTTP exchange.
#[derive(Clone, Debug, Default)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Returns `true` for the backend's single success status.
	pub fn is_success(&self) -> bool {
		self.status == 200
	}

	/// Decodes the body as the expected JSON shape.
	pub fn json<T>(&self) -> Result<T, ProtocolError>
	where
		T: serde::de::DeserializeOwned,
	{
		crate::error::parse_slice(&self.body, Some(self.status))
	}

	/// Decodes the body as a free-form JSON value, treating an empty body as `null`.
	pub fn json_value(&self) -> Result<serde_json::Value, ProtocolError> {
		if self.body.is_empty() {
			return Ok(serde_json::Value::Null);
		}

		self.json()
	}

	/// Extracts the backend's `detail` failure message, if the body carries one.
	pub fn detail(&self) -> Option<String> {
		let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;

		value.get("detail").and_then(serde_json::Value::as_str).map(str::to_owned)
	}
}

/// Abstraction over HTTP stacks capable of executing client calls.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back the
/// gateway and the weather client simultaneously (typically behind `Arc<T>`), and the
/// returned futures must be `Send` so callers can hop executors freely.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the call and captures the response status and body.
	///
	/// Implementations must return [`TransportError`](crate::error::TransportError)
	/// only for failures below the HTTP layer (connection, TLS, timeout); responses
	/// with non-success statuses are still `Ok` so the gateway can classify them.
	fn execute(&self, call: ApiCall) -> TransportFuture<'_, RawResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The wrapper never follows cross-origin redirects for credentialed calls; configure
/// any custom [`ReqwestClient`] accordingly before passing it in.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn execute(&self, call: ApiCall) -> TransportFuture<'_, RawResponse> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match call.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, call.url);

			if let Some(bearer) = &call.bearer {
				builder = builder.header(AUTHORIZATION, format!("Bearer {}", bearer.expose()));
			}
			if let Some(body) = &call.body {
				builder = builder.json(body);
			}
			if let Some(timeout) = call.timeout.and_then(|t| std::time::Duration::try_from(t).ok())
			{
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(RawResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn method_tokens_are_canonical() {
		assert_eq!(Method::Get.as_str(), "GET");
		assert_eq!(Method::Put.to_string(), "PUT");
	}

	#[test]
	fn detail_extraction_handles_malformed_bodies() {
		let with_detail = RawResponse {
			status: 422,
			body: b"{\"detail\":\"Phone number already in use\"}".to_vec(),
		};

		assert_eq!(with_detail.detail(), Some("Phone number already in use".into()));

		let empty = RawResponse { status: 500, body: Vec::new() };

		assert_eq!(empty.detail(), None);

		let not_json = RawResponse { status: 502, body: b"<html>bad gateway</html>".to_vec() };

		assert_eq!(not_json.detail(), None);
	}

	#[test]
	fn empty_success_body_decodes_as_null() {
		let response = RawResponse { status: 200, body: Vec::new() };
		let value = response.json_value().expect("Empty body should decode as JSON null.");

		assert!(value.is_null());
	}
}
