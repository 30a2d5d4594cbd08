//! Crate-level error types shared by the gateway, API operations, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Persistence-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Backend response violated the expected wire contract.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend rejected the request with a non-success status.
	#[error("Request failed with status {status}: {message}")]
	Api {
		/// HTTP status code returned by the backend.
		status: u16,
		/// Message extracted from the response `detail` field, or a generic fallback.
		message: String,
	},
	/// Session could not be recovered; the caller must sign in again.
	#[error("Session expired: {reason}.")]
	SessionExpired {
		/// Explanation of why recovery was impossible.
		reason: String,
	},
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A base URL or endpoint path could not be parsed.
	#[error("Endpoint URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(e: url::ParseError) -> Self {
		Self::InvalidUrl { source: e }
	}
}

/// Wire-contract violations detected while decoding backend responses.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Response body could not be parsed as the expected JSON shape.
	#[error("Response body is malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure, including the path of the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response being decoded, when available.
		status: Option<u16>,
	},
	/// Request payload could not be serialized to JSON.
	#[error("Request payload could not be serialized.")]
	RequestSerialize(#[from] serde_json::Error),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Deserializes a JSON value into `T`, reporting the path of any offending field.
pub(crate) fn parse_value<T>(
	value: serde_json::Value,
	status: Option<u16>,
) -> Result<T, ProtocolError>
where
	T: serde::de::DeserializeOwned,
{
	serde_path_to_error::deserialize(value)
		.map_err(|source| ProtocolError::ResponseParse { source, status })
}

/// Deserializes raw response bytes into `T`, reporting the path of any offending field.
pub(crate) fn parse_slice<T>(bytes: &[u8], status: Option<u16>) -> Result<T, ProtocolError>
where
	T: serde::de::DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ProtocolError::ResponseParse { source, status })
}
