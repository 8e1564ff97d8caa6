//! Client-side request pacer—intercept outgoing HTTP requests, ask a remote rate
//! coordinator how long to wait, and enforce the verdict locally with bounded-retry,
//! fail-open delays.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod intercept;
pub mod obs;
pub mod project;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{config::PacerConfig, http::ReqwestHttpClient, intercept::PacingInterceptor};

	/// Pacer type alias used by reqwest-backed integration tests.
	pub type ReqwestTestPacer = PacingInterceptor<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`PacingInterceptor`] from the provided configuration, backed by the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_pacer(config: PacerConfig) -> ReqwestTestPacer {
		PacingInterceptor::with_http_client(config, test_reqwest_http_client())
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
