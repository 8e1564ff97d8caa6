//! End-to-end demo: configure the pacer against a mock coordinator, register it on
//! a paced reqwest client, and watch a matching request get delayed.

// std
use std::{sync::Arc, time::Instant};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use request_pacer::{
	auth::{OrgId, ProjectId},
	config::{AccountConfig, CoordinatorEndpoints, PacerConfig},
	intercept::{HookRegistrar, PacedReqwestClient, ReqwestPacer},
	project::ProjectRoute,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	// Stand-in coordinator: issues one token and tells every caller to wait 250ms.
	let coordinator = MockServer::start_async().await;

	coordinator
		.mock_async(|when, then| {
			when.method(POST).path("/tokens");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"authToken":"demo-token"}}"#);
		})
		.await;
	coordinator
		.mock_async(|when, then| {
			when.method(POST).path("/requests");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"waitTime":250}}"#);
		})
		.await;

	// Stand-in upstream the application actually talks to.
	let upstream = MockServer::start_async().await;

	upstream
		.mock_async(|when, then| {
			when.method(GET).path("/orders/42");
			then.status(200).body("order 42");
		})
		.await;

	let endpoints = CoordinatorEndpoints::new(Url::parse(&coordinator.base_url())?)?;
	let account = AccountConfig::new(OrgId::new("acme")?, "demo-refresh-credential");
	let config = PacerConfig::new(endpoints, account)
		.with_project(ProjectRoute::new(ProjectId::new("ord-1")?, "/orders"));
	let pacer = ReqwestPacer::new(config);
	let client = PacedReqwestClient::default();

	client.register_pre_send_hook(Arc::new(pacer))?;

	let request = client.inner().get(upstream.url("/orders/42")).build()?;
	let started = Instant::now();
	let response = client.execute(request).await?;

	println!(
		"Upstream answered `{}` after {}ms of coordinator-mandated pacing.",
		response.text().await?,
		started.elapsed().as_millis(),
	);

	Ok(())
}
