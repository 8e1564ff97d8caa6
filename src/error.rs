//! Pacer-level error types shared across the session, coordinator, and interception layers.

// self
use crate::_prelude::*;

/// Pacer-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical pacer error exposed by public APIs.
///
/// Only setup-time and authentication failures ever reach callers. Wait-time
/// coordination failures are absorbed by the bounded-retry loop and degrade to a
/// zero delay; they appear here solely through [`CoordinationError`], which is
/// logged rather than propagated.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal at setup time.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token issuance against the coordinator failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures raised during pacer setup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Coordinator base URL environment variable is unset.
	#[error("Coordinator base URL environment variable `{var}` is unset.")]
	CoordinatorUrlMissing {
		/// Name of the environment variable consulted.
		var: &'static str,
	},
	/// Coordinator base URL cannot be parsed or extended with endpoint paths.
	#[error("Coordinator base URL is invalid.")]
	CoordinatorUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Organization or project identifier failed validation.
	#[error("Identifier is invalid.")]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Transport adapter cannot accept a pre-send hook.
	#[error("Transport `{name}` does not support pre-send hooks.")]
	UnsupportedTransport {
		/// Adapter label supplied by the implementation.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Token-issuance failures surfaced by [`AuthSession::reauthenticate`].
///
/// [`AuthSession::reauthenticate`]: crate::auth::AuthSession::reauthenticate
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint rejected the issuance call with status {status}.")]
	Issuance {
		/// HTTP status code returned by the token endpoint.
		status: u16,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned a malformed issuance payload.")]
	IssuancePayload {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Underlying transport failed before a status was available.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Classification of absorbed wait-time failures.
///
/// Values of this type never propagate to the request path; the coordinator
/// client logs them, counts the attempt, and ultimately fails open to a zero
/// delay. They are public so custom transports and tests can assert on the
/// classification.
#[derive(Debug, ThisError)]
pub enum CoordinationError {
	/// Coordinator answered with a status that is neither success nor an
	/// authorization failure (e.g. a persistent 500).
	#[error("Coordinator returned an unexpected status {status}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the wait-time endpoint.
		status: u16,
	},
	/// Coordinator accepted the call but the payload could not be parsed.
	#[error("Coordinator returned a malformed wait-time payload.")]
	Payload {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Underlying transport failed before a status was available.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// In-loop re-authentication failed; the attempt is consumed.
	#[error(transparent)]
	Auth(#[from] AuthError),
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the coordinator.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
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
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
