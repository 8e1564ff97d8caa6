//! The coordinator session—exclusive owner of the single process-wide auth token.

// self
use crate::{
	_prelude::*,
	auth::{AuthToken, OrgId, RefreshCredential},
	config::CoordinatorEndpoints,
	error::{AuthError, TransportError},
	http::{CoordinatorHttpClient, CoordinatorRequest, Envelope, decode_json},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenIssuancePayload {
	auth_token: String,
}

/// Holds the current auth token and the logic to obtain a fresh one.
///
/// Exactly one token value is held process-wide; concurrent callers share the
/// session behind an `Arc`. Concurrent re-authentication is an accepted race:
/// simultaneous calls each issue their own token request and the last success
/// overwrites the slot. The session never clears the slot on failure—whether a
/// stale token remains usable is the caller's policy decision.
pub struct AuthSession<C>
where
	C: ?Sized + CoordinatorHttpClient,
{
	http: Arc<C>,
	endpoints: CoordinatorEndpoints,
	org: OrgId,
	refresh_credential: RefreshCredential,
	token: RwLock<Option<AuthToken>>,
}
impl<C> AuthSession<C>
where
	C: ?Sized + CoordinatorHttpClient,
{
	/// Creates a session for the given account against the coordinator.
	pub fn new(
		http: impl Into<Arc<C>>,
		endpoints: CoordinatorEndpoints,
		org: OrgId,
		refresh_credential: RefreshCredential,
	) -> Self {
		Self {
			http: http.into(),
			endpoints,
			org,
			refresh_credential,
			token: RwLock::new(None),
		}
	}

	/// Organization identifier this session authenticates for.
	pub fn org(&self) -> &OrgId {
		&self.org
	}

	/// Returns the token currently held, without performing I/O.
	pub fn current_token(&self) -> Option<AuthToken> {
		self.token.read().clone()
	}

	/// Obtains a fresh token from the coordinator, replacing the held one.
	///
	/// Exactly one network call per invocation; no internal retries. On any
	/// transport failure or non-success response the previously held token is
	/// left untouched and the error is returned to the caller.
	pub async fn reauthenticate(&self) -> Result<AuthToken, AuthError> {
		const KIND: OpKind = OpKind::Reauthenticate;

		let span = OpSpan::new(KIND, "reauthenticate");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let body = serde_json::json!({
					"refreshToken": self.refresh_credential.expose(),
					"orgIdentifier": self.org.as_ref(),
				});
				let request = CoordinatorRequest::post(self.endpoints.tokens().clone(), body)
					.with_header("Content-Type", "application/json");
				let response =
					self.http.send(request).await.map_err(TransportError::network)?;

				if response.status != 200 {
					return Err(AuthError::Issuance { status: response.status });
				}

				let envelope = decode_json::<Envelope<TokenIssuancePayload>>(&response.body)
					.map_err(|source| AuthError::IssuancePayload { source })?;
				let token = AuthToken::new(envelope.data.auth_token);

				*self.token.write() = Some(token.clone());

				Ok(token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}
}
impl<C> Debug for AuthSession<C>
where
	C: ?Sized + CoordinatorHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthSession")
			.field("org", &self.org)
			.field("token_held", &self.token.read().is_some())
			.finish()
	}
}
