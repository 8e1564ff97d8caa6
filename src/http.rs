//! Transport primitives for coordinator calls.
//!
//! The module exposes [`CoordinatorHttpClient`], the pacer's only dependency on an
//! HTTP stack. The coordinator protocol consists solely of JSON `POST` calls, so the
//! capability is deliberately narrow: submit a [`CoordinatorRequest`], get back the
//! status code and raw body as a [`CoordinatorResponse`]. Adapters are selected at
//! configuration time by explicit construction—[`ReqwestHttpClient`] is the built-in
//! default—never by runtime type inspection.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Boxed future returned by [`CoordinatorHttpClient::send`].
pub type SendFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<CoordinatorResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing coordinator calls.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be
/// shared across concurrent intercepted requests behind an `Arc`. The returned
/// future must be `Send` for the same reason. Implementations should carry a
/// bounded per-call timeout; an unbounded hang would defeat the bounded-retry,
/// fail-open design of the wait-time protocol.
pub trait CoordinatorHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes a single coordinator call.
	fn send(&self, request: CoordinatorRequest) -> SendFuture<'_, Self::TransportError>;
}

/// A JSON `POST` aimed at a coordinator endpoint.
#[derive(Clone, Debug)]
pub struct CoordinatorRequest {
	/// Fully resolved endpoint URL.
	pub url: Url,
	/// Header name/value pairs attached to the call.
	pub headers: Vec<(&'static str, String)>,
	/// JSON request body.
	pub body: serde_json::Value,
}
impl CoordinatorRequest {
	/// Creates a `POST` request for the given endpoint and body.
	pub fn post(url: Url, body: serde_json::Value) -> Self {
		Self { url, headers: Vec::new(), body }
	}

	/// Attaches a header to the request.
	pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.headers.push((name, value.into()));

		self
	}
}

/// Status code and raw body captured from a coordinator response.
#[derive(Clone, Debug)]
pub struct CoordinatorResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body bytes.
	pub body: Vec<u8>,
}

/// Standard envelope wrapping every coordinator response payload.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
	pub data: T,
}

/// Decodes a JSON response body, reporting the path of any parse failure.
pub(crate) fn decode_json<T>(
	body: &[u8],
) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: serde::de::DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Pass a custom [`ReqwestClient`] configured with a request timeout when deploying
/// against a coordinator that may hang; the pacer itself imposes no deadline.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl CoordinatorHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn send(&self, request: CoordinatorRequest) -> SendFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.post(request.url);

			for (name, value) in &request.headers {
				builder = builder.header(*name, value);
			}

			let response = builder.json(&request.body).send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(CoordinatorResponse { status, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn decode_json_reports_failure_path() {
		#[derive(Debug, Deserialize)]
		struct Payload {
			#[allow(dead_code)]
			wait_time: u64,
		}

		let err = decode_json::<Envelope<Payload>>(br#"{"data":{"wait_time":"soon"}}"#)
			.expect_err("Non-numeric wait_time should fail to parse.");

		assert_eq!(err.path().to_string(), "data.wait_time");
	}

	#[test]
	fn request_builder_accumulates_headers() {
		let request = CoordinatorRequest::post(
			Url::parse("https://coordinator.example.com/requests")
				.expect("Fixture URL should parse."),
			serde_json::json!({}),
		)
		.with_header("orgidentifier", "acme")
		.with_header("authtoken", "tkn1");

		assert_eq!(request.headers.len(), 2);
		assert_eq!(request.headers[0], ("orgidentifier", "acme".into()));
	}
}
