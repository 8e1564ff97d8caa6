//! Wait-time negotiation with the coordinator, including the bounded-retry state
//! machine that handles expired tokens and fails open on everything else.
//!
//! [`CoordinatorClient::wait_time`] is infallible by design: a remote pacing
//! authority must never become a single point of total failure for the caller's
//! own outbound traffic. Token expiry (401) is the one failure mode treated as
//! cheaply recoverable and retried with re-authentication; every other failure
//! consumes an attempt and, once attempts are exhausted, the operation degrades
//! to a zero delay.

mod metrics;

pub use metrics::CoordinatorMetrics;

// crates.io
use time::OffsetDateTime;
// self
use crate::{
	_prelude::*,
	auth::{AuthSession, ProjectId},
	config::CoordinatorEndpoints,
	error::{CoordinationError, TransportError},
	http::{CoordinatorHttpClient, CoordinatorRequest, Envelope, decode_json},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Header carrying the organization identifier on wait-time calls.
pub const ORG_IDENTIFIER_HEADER: &str = "orgidentifier";
/// Header carrying the auth token on wait-time calls.
pub const AUTH_TOKEN_HEADER: &str = "authtoken";

/// Total send attempts per wait-time operation: the initial attempt plus up to
/// three re-authentication retries.
const MAX_ATTEMPTS: u8 = 4;

/// Non-negative delay verdict, in milliseconds. Zero means proceed immediately.
#[derive(
	Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WaitTime(u64);
impl WaitTime {
	/// Proceed immediately; also the fail-open terminal value.
	pub const ZERO: Self = Self(0);

	/// Creates a verdict from milliseconds.
	pub const fn from_millis(millis: u64) -> Self {
		Self(millis)
	}

	/// Verdict in milliseconds.
	pub const fn as_millis(self) -> u64 {
		self.0
	}

	/// Whether the verdict is "proceed immediately".
	pub const fn is_zero(self) -> bool {
		self.0 == 0
	}

	/// Converts the verdict into a sleepable duration.
	pub const fn as_duration(self) -> std::time::Duration {
		std::time::Duration::from_millis(self.0)
	}
}
impl Display for WaitTime {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}ms", self.0)
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WaitTimePayload {
	wait_time: u64,
}

/// Bounded-retry states for a single wait-time operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RetryState {
	/// Issue the next wait-time attempt, if any remain.
	Attempting,
	/// The coordinator rejected the token; obtain a fresh one before retrying.
	Reauthenticating,
	/// All attempts consumed; fail open with a zero delay.
	Exhausted,
}

/// Outcome classification for a single send attempt.
enum Classified {
	/// Coordinator accepted the call and returned a verdict.
	Granted(WaitTime),
	/// Coordinator rejected the token as invalid or expired (401).
	TokenRejected,
	/// Anything else—absorbed, logged, and counted against the attempt budget.
	Failed(CoordinationError),
}

/// Obtains wait-time verdicts for projects, transparently recovering from
/// expired tokens.
pub struct CoordinatorClient<C>
where
	C: ?Sized + CoordinatorHttpClient,
{
	/// HTTP transport shared with the session.
	pub http: Arc<C>,
	/// Session owning the auth token and account identity.
	pub session: Arc<AuthSession<C>>,
	/// Coordinator endpoint set.
	pub endpoints: CoordinatorEndpoints,
	/// Attempt/verdict counters for this client.
	pub metrics: Arc<CoordinatorMetrics>,
}
impl<C> CoordinatorClient<C>
where
	C: ?Sized + CoordinatorHttpClient,
{
	/// Creates a client that reuses the caller-provided transport and session.
	pub fn with_http_client(
		session: Arc<AuthSession<C>>,
		endpoints: CoordinatorEndpoints,
		http: impl Into<Arc<C>>,
	) -> Self {
		Self { http: http.into(), session, endpoints, metrics: Default::default() }
	}

	/// Asks the coordinator how long to wait before the next request for `project`.
	///
	/// Never fails and never blocks beyond the bounded retry window. If no token
	/// is held, one uncounted re-authentication happens before the first attempt.
	/// A 401 triggers re-authentication and a retry; at most [`MAX_ATTEMPTS`]
	/// sends are issued and at most three re-authentication retries occur. When
	/// attempts are exhausted the operation returns [`WaitTime::ZERO`]—the
	/// explicit fail-open terminal, recorded as such.
	pub async fn wait_time(&self, project: &ProjectId) -> WaitTime {
		const KIND: OpKind = OpKind::WaitTime;

		let span = OpSpan::new(KIND, "wait_time");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		span.instrument(async move {
			if self.session.current_token().is_none() {
				if let Err(err) = self.session.reauthenticate().await {
					// The loop below still runs; the coordinator's 401s keep it bounded.
					obs::record_absorbed(KIND, &err);
				}
			}

			let mut attempts = 0_u8;
			let mut state = RetryState::Attempting;

			loop {
				match state {
					RetryState::Attempting => {
						if attempts >= MAX_ATTEMPTS {
							state = RetryState::Exhausted;

							continue;
						}

						attempts += 1;

						self.metrics.record_attempt();

						match self.attempt(project).await {
							Classified::Granted(wait) => {
								self.metrics.record_granted();
								obs::record_op_outcome(KIND, OpOutcome::Success);

								return wait;
							},
							Classified::TokenRejected => {
								self.metrics.record_token_rejection();

								state = if attempts >= MAX_ATTEMPTS {
									RetryState::Exhausted
								} else {
									RetryState::Reauthenticating
								};
							},
							Classified::Failed(failure) => {
								obs::record_absorbed(KIND, &failure);
							},
						}
					},
					RetryState::Reauthenticating => {
						if let Err(err) = self.session.reauthenticate().await {
							// Counting the failure keeps a dead token endpoint from
							// spinning the machine.
							attempts += 1;

							obs::record_absorbed(KIND, &CoordinationError::Auth(err));
						}

						state = RetryState::Attempting;
					},
					RetryState::Exhausted => {
						self.metrics.record_fail_open();
						obs::record_op_outcome(KIND, OpOutcome::FailOpen);

						return WaitTime::ZERO;
					},
				}
			}
		})
		.await
	}

	async fn attempt(&self, project: &ProjectId) -> Classified {
		let body = serde_json::json!({
			"projectIdentifier": project.as_ref(),
			"requestTimestamp": unix_millis(),
		});
		let mut request = CoordinatorRequest::post(self.endpoints.requests().clone(), body)
			.with_header(ORG_IDENTIFIER_HEADER, self.session.org().as_ref());

		if let Some(token) = self.session.current_token() {
			request = request.with_header(AUTH_TOKEN_HEADER, token.expose());
		}

		let response = match self.http.send(request).await {
			Ok(response) => response,
			Err(err) =>
				return Classified::Failed(CoordinationError::Transport(TransportError::network(
					err,
				))),
		};

		match response.status {
			200 => match decode_json::<Envelope<WaitTimePayload>>(&response.body) {
				Ok(envelope) => Classified::Granted(WaitTime::from_millis(envelope.data.wait_time)),
				Err(source) => Classified::Failed(CoordinationError::Payload { source }),
			},
			401 => Classified::TokenRejected,
			status => Classified::Failed(CoordinationError::UnexpectedStatus { status }),
		}
	}
}
impl<C> Debug for CoordinatorClient<C>
where
	C: ?Sized + CoordinatorHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CoordinatorClient")
			.field("endpoints", &self.endpoints)
			.field("session", &self.session)
			.finish()
	}
}

fn unix_millis() -> i64 {
	(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn wait_time_converts_to_duration() {
		let wait = WaitTime::from_millis(150);

		assert_eq!(wait.as_duration(), std::time::Duration::from_millis(150));
		assert!(!wait.is_zero());
		assert!(WaitTime::ZERO.is_zero());
		assert_eq!(format!("{wait}"), "150ms");
	}

	#[test]
	fn payload_rejects_negative_wait_time() {
		decode_json::<Envelope<WaitTimePayload>>(br#"{"data":{"waitTime":-5}}"#)
			.expect_err("Negative waitTime should fail to parse.");

		let envelope = decode_json::<Envelope<WaitTimePayload>>(br#"{"data":{"waitTime":150}}"#)
			.expect("Non-negative waitTime should parse.");

		assert_eq!(envelope.data.wait_time, 150);
	}
}
