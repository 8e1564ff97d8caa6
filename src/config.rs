//! Pacer configuration: the account descriptor, project routes, and coordinator
//! endpoints. All values are supplied once at setup time and immutable afterwards.

// self
use crate::{
	_prelude::*,
	auth::{OrgId, RefreshCredential},
	error::ConfigError,
	project::ProjectRoute,
};

/// Environment variable consulted by [`CoordinatorEndpoints::from_env`].
pub const COORDINATOR_URL_ENV: &str = "PACER_COORDINATOR_URL";

/// Validated coordinator endpoint set, derived once from the base URL.
#[derive(Clone, Debug)]
pub struct CoordinatorEndpoints {
	requests: Url,
	tokens: Url,
}
impl CoordinatorEndpoints {
	/// Derives the wait-time and token-issuance endpoints from a base URL.
	pub fn new(base: Url) -> Result<Self, ConfigError> {
		let mut base = base;

		// `Url::join` replaces the last segment unless the path ends with a slash.
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		let requests =
			base.join("requests").map_err(|source| ConfigError::CoordinatorUrl { source })?;
		let tokens = base.join("tokens").map_err(|source| ConfigError::CoordinatorUrl { source })?;

		Ok(Self { requests, tokens })
	}

	/// Reads the base URL from the [`COORDINATOR_URL_ENV`] environment variable.
	pub fn from_env() -> Result<Self, ConfigError> {
		let raw = std::env::var(COORDINATOR_URL_ENV)
			.map_err(|_| ConfigError::CoordinatorUrlMissing { var: COORDINATOR_URL_ENV })?;
		let base = Url::parse(&raw).map_err(|source| ConfigError::CoordinatorUrl { source })?;

		Self::new(base)
	}

	/// Wait-time endpoint (`POST {base}/requests`).
	pub fn requests(&self) -> &Url {
		&self.requests
	}

	/// Token-issuance endpoint (`POST {base}/tokens`).
	pub fn tokens(&self) -> &Url {
		&self.tokens
	}
}

/// Account descriptor identifying the caller against the coordinator.
#[derive(Clone, Debug)]
pub struct AccountConfig {
	/// Organization identifier attached to every coordinator call.
	pub org: OrgId,
	/// Credential used solely to obtain new auth tokens.
	pub refresh_credential: RefreshCredential,
}
impl AccountConfig {
	/// Creates an account descriptor from an organization and refresh credential.
	pub fn new(org: OrgId, refresh_credential: impl Into<String>) -> Self {
		Self { org, refresh_credential: RefreshCredential::new(refresh_credential) }
	}
}

/// Complete pacer configuration, supplied once at setup time.
#[derive(Clone, Debug)]
pub struct PacerConfig {
	/// Coordinator endpoint set.
	pub coordinator: CoordinatorEndpoints,
	/// Account descriptor.
	pub account: AccountConfig,
	/// Ordered project routes; first match wins for lookup, and interception
	/// evaluates every matching route.
	pub projects: Vec<ProjectRoute>,
}
impl PacerConfig {
	/// Creates a configuration with no project routes.
	pub fn new(coordinator: CoordinatorEndpoints, account: AccountConfig) -> Self {
		Self { coordinator, account, projects: Vec::new() }
	}

	/// Appends a project route, preserving configured order.
	pub fn with_project(mut self, route: ProjectRoute) -> Self {
		self.projects.push(route);

		self
	}

	/// Appends several project routes, preserving configured order.
	pub fn with_projects(mut self, routes: impl IntoIterator<Item = ProjectRoute>) -> Self {
		self.projects.extend(routes);

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	#[test]
	fn endpoints_derive_from_bare_host() {
		let endpoints = CoordinatorEndpoints::new(url("https://coordinator.example.com"))
			.expect("Bare host should derive endpoints.");

		assert_eq!(endpoints.requests().as_str(), "https://coordinator.example.com/requests");
		assert_eq!(endpoints.tokens().as_str(), "https://coordinator.example.com/tokens");
	}

	#[test]
	fn endpoints_preserve_base_path_with_or_without_trailing_slash() {
		for base in ["https://coordinator.example.com/api", "https://coordinator.example.com/api/"]
		{
			let endpoints = CoordinatorEndpoints::new(url(base))
				.expect("Base with a path should derive endpoints.");

			assert_eq!(
				endpoints.requests().as_str(),
				"https://coordinator.example.com/api/requests",
			);
			assert_eq!(endpoints.tokens().as_str(), "https://coordinator.example.com/api/tokens");
		}
	}
}
