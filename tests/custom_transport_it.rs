//! Exercises the bounded-retry state machine against a scripted custom transport,
//! covering the sequences httpmock cannot express deterministically.

// std
use std::{
	collections::VecDeque,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::Mutex,
};
// crates.io
use url::Url;
// self
use request_pacer::{
	auth::{OrgId, ProjectId},
	config::{AccountConfig, CoordinatorEndpoints, PacerConfig},
	coordinator::{AUTH_TOKEN_HEADER, WaitTime},
	http::{CoordinatorHttpClient, CoordinatorRequest, CoordinatorResponse, SendFuture},
	intercept::PacingInterceptor,
};

#[derive(Debug)]
struct ScriptedTransportError;
impl Display for ScriptedTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Scripted transport failure.")
	}
}
impl StdError for ScriptedTransportError {}

enum Step {
	Respond(u16, serde_json::Value),
	Fail,
}

/// Records each call's path and whether an auth token was attached, then plays
/// back the next scripted step.
struct ScriptedHttpClient {
	script: Mutex<VecDeque<Step>>,
	log: Mutex<Vec<(String, bool)>>,
}
impl ScriptedHttpClient {
	fn new(script: impl IntoIterator<Item = Step>) -> Self {
		Self { script: Mutex::new(script.into_iter().collect()), log: Mutex::new(Vec::new()) }
	}

	fn calls(&self) -> Vec<(String, bool)> {
		self.log.lock().expect("Call log lock should not be poisoned.").clone()
	}
}
impl CoordinatorHttpClient for ScriptedHttpClient {
	type TransportError = ScriptedTransportError;

	fn send(&self, request: CoordinatorRequest) -> SendFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let token_attached =
				request.headers.iter().any(|(name, _)| *name == AUTH_TOKEN_HEADER);

			self.log
				.lock()
				.expect("Call log lock should not be poisoned.")
				.push((request.url.path().to_string(), token_attached));

			let step = self
				.script
				.lock()
				.expect("Script lock should not be poisoned.")
				.pop_front()
				.expect("Scripted transport ran out of steps.");

			match step {
				Step::Respond(status, body) => Ok(CoordinatorResponse {
					status,
					body: serde_json::to_vec(&body)
						.expect("Scripted body should serialize successfully."),
				}),
				Step::Fail => Err(ScriptedTransportError),
			}
		})
	}
}

fn build_pacer(script: impl IntoIterator<Item = Step>) -> PacingInterceptor<ScriptedHttpClient> {
	let endpoints = CoordinatorEndpoints::new(
		Url::parse("https://coordinator.example.com").expect("Fixture URL should parse."),
	)
	.expect("Fixture endpoints should derive.");
	let org = OrgId::new("acme").expect("Org fixture should be considered valid.");
	let config = PacerConfig::new(endpoints, AccountConfig::new(org, "refresh-1"));

	PacingInterceptor::with_http_client(config, ScriptedHttpClient::new(script))
}

fn issuance(token: &str) -> Step {
	Step::Respond(200, serde_json::json!({ "data": { "authToken": token } }))
}

fn verdict(wait_time: u64) -> Step {
	Step::Respond(200, serde_json::json!({ "data": { "waitTime": wait_time } }))
}

fn project(id: &str) -> ProjectId {
	ProjectId::new(id).expect("Project fixture should be considered valid.")
}

#[tokio::test]
async fn transport_errors_consume_attempts_and_fail_open() {
	let pacer = build_pacer([issuance("tkn1"), Step::Fail, Step::Fail, Step::Fail, Step::Fail]);
	let wait = pacer.coordinator.wait_time(&project("ord-1")).await;

	assert_eq!(wait, WaitTime::ZERO);

	let calls = pacer.coordinator.http.calls();

	assert_eq!(calls.len(), 5, "One issuance plus four bounded attempts expected.");
	assert_eq!(calls[0].0, "/tokens");
	assert!(calls[1..].iter().all(|(path, token)| path == "/requests" && *token));
}

#[tokio::test]
async fn mixed_failures_retry_until_a_verdict_lands() {
	let pacer = build_pacer([
		issuance("tkn1"),
		Step::Respond(500, serde_json::json!({})),
		Step::Fail,
		verdict(30),
	]);
	let wait = pacer.coordinator.wait_time(&project("ord-1")).await;

	assert_eq!(wait, WaitTime::from_millis(30));
	assert_eq!(pacer.coordinator.metrics.attempts(), 3);
	assert_eq!(pacer.coordinator.metrics.granted(), 1);
}

#[tokio::test]
async fn failed_in_loop_reauthentication_consumes_an_attempt() {
	let pacer = build_pacer([
		issuance("tkn1"),
		Step::Respond(401, serde_json::json!({})),
		Step::Respond(500, serde_json::json!({})), // reauthentication fails
		Step::Respond(401, serde_json::json!({})),
		issuance("tkn2"),
		verdict(60),
	]);
	let wait = pacer.coordinator.wait_time(&project("ord-1")).await;

	assert_eq!(wait, WaitTime::from_millis(60));

	let paths: Vec<_> =
		pacer.coordinator.http.calls().into_iter().map(|(path, _)| path).collect();

	assert_eq!(paths, ["/tokens", "/requests", "/tokens", "/requests", "/tokens", "/requests"]);
}

#[tokio::test]
async fn dead_token_endpoint_cannot_spin_the_machine() {
	let pacer = build_pacer([
		Step::Fail, // initial, uncounted issuance
		Step::Respond(401, serde_json::json!({})),
		Step::Fail, // in-loop issuance, consumes an attempt
		Step::Respond(401, serde_json::json!({})),
		Step::Fail,
	]);
	let wait = pacer.coordinator.wait_time(&project("ord-1")).await;

	assert_eq!(wait, WaitTime::ZERO);

	let calls = pacer.coordinator.http.calls();

	assert_eq!(calls.len(), 5);
	// With no token held, attempts go out without the auth header.
	assert!(calls.iter().filter(|(path, _)| path == "/requests").all(|(_, token)| !token));
}
