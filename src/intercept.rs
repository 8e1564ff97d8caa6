//! Per-request interception—the pacing policy, the pre-send hook capability, and
//! the paced reqwest client adapter.
//!
//! [`PacingInterceptor`] is the orchestrating unit invoked once per outgoing
//! request: it evaluates every configured project route against the target URL,
//! asks the coordinator for a verdict per match, and sleeps out each non-zero
//! verdict before the request proceeds. It is a pass-through transform—the
//! request's method, headers, and body are never touched, only its timing.

// self
use crate::{
	_prelude::*,
	auth::AuthSession,
	config::PacerConfig,
	coordinator::CoordinatorClient,
	error::ConfigError,
	http::CoordinatorHttpClient,
	obs::{OpKind, OpSpan},
	project::ProjectSet,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Boxed future returned by [`PreSendHook::before_send`].
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Hook invoked by a transport adapter before each outgoing request is sent.
///
/// Hooks observe only the target URL and may suspend; they must not assume any
/// way to alter or abort the request. Failure inside a hook has no channel back
/// to the request path by design.
pub trait PreSendHook
where
	Self: Send + Sync,
{
	/// Called with the request's target URL before transmission.
	fn before_send<'a>(&'a self, target: &'a Url) -> HookFuture<'a>;
}

/// Capability to accept pre-send hooks, implemented by transport adapters.
pub trait HookRegistrar {
	/// Registers a hook to run before every outgoing request.
	///
	/// Adapters that cannot interpose on outgoing requests return
	/// [`ConfigError::UnsupportedTransport`]; registration failures are fatal at
	/// setup time.
	fn register_pre_send_hook(&self, hook: Arc<dyn PreSendHook>) -> Result<(), ConfigError>;
}

#[cfg(feature = "reqwest")]
/// Pacer specialized for the crate's default reqwest transport.
pub type ReqwestPacer = PacingInterceptor<ReqwestHttpClient>;

/// The per-request orchestration policy.
pub struct PacingInterceptor<C>
where
	C: ?Sized + CoordinatorHttpClient,
{
	/// Wait-time client consulted once per matching route.
	pub coordinator: CoordinatorClient<C>,
	/// Ordered project routes evaluated against every intercepted request.
	pub projects: ProjectSet,
}
impl<C> PacingInterceptor<C>
where
	C: CoordinatorHttpClient,
{
	/// Builds the full pacer stack (session, coordinator, routes) from a
	/// configuration and a caller-provided transport.
	pub fn with_http_client(config: PacerConfig, http_client: impl Into<Arc<C>>) -> Self {
		let http = http_client.into();
		let session = Arc::new(AuthSession::new(
			Arc::clone(&http),
			config.coordinator.clone(),
			config.account.org,
			config.account.refresh_credential,
		));
		let coordinator = CoordinatorClient::with_http_client(session, config.coordinator, http);

		Self { coordinator, projects: ProjectSet::new(config.projects) }
	}

	/// Applies the pacing policy for one outgoing request.
	///
	/// Every matching route is evaluated in configured order—a request may match
	/// several projects and accumulates their delays sequentially. A request
	/// matching nothing triggers no coordinator call and returns immediately.
	pub async fn pace(&self, target: &Url) {
		let span = OpSpan::new(OpKind::Pace, "pace");

		span.instrument(async move {
			let target = target.as_str();

			for route in self.projects.matches(target) {
				let wait = self.coordinator.wait_time(route.project()).await;

				if !wait.is_zero() {
					tokio::time::sleep(wait.as_duration()).await;
				}
			}
		})
		.await
	}
}
impl<C> PreSendHook for PacingInterceptor<C>
where
	C: CoordinatorHttpClient,
{
	fn before_send<'a>(&'a self, target: &'a Url) -> HookFuture<'a> {
		Box::pin(self.pace(target))
	}
}
#[cfg(feature = "reqwest")]
impl PacingInterceptor<ReqwestHttpClient> {
	/// Builds the pacer with a default reqwest transport.
	///
	/// Use [`PacingInterceptor::with_http_client`] to supply a custom
	/// [`ReqwestClient`], e.g. one configured with a request timeout.
	pub fn new(config: PacerConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Debug for PacingInterceptor<C>
where
	C: ?Sized + CoordinatorHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PacingInterceptor")
			.field("coordinator", &self.coordinator)
			.field("projects", &self.projects)
			.finish()
	}
}

/// Reqwest adapter that runs registered hooks before dispatching each request.
///
/// Selected by explicit construction—wrap the [`ReqwestClient`] the application
/// already uses, register the [`PacingInterceptor`] as a hook, and route sends
/// through [`PacedReqwestClient::execute`]. Requests are forwarded unmodified;
/// hooks only affect timing.
#[cfg(feature = "reqwest")]
#[derive(Default)]
pub struct PacedReqwestClient {
	client: ReqwestClient,
	hooks: RwLock<Vec<Arc<dyn PreSendHook>>>,
}
#[cfg(feature = "reqwest")]
impl PacedReqwestClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn new(client: ReqwestClient) -> Self {
		Self { client, hooks: RwLock::new(Vec::new()) }
	}

	/// The wrapped client, for building requests.
	pub fn inner(&self) -> &ReqwestClient {
		&self.client
	}

	/// Runs every registered hook against the request's URL, then sends it.
	pub async fn execute(
		&self,
		request: reqwest::Request,
	) -> Result<reqwest::Response, ReqwestError> {
		let hooks = self.hooks.read().clone();

		for hook in &hooks {
			hook.before_send(request.url()).await;
		}

		self.client.execute(request).await
	}
}
#[cfg(feature = "reqwest")]
impl HookRegistrar for PacedReqwestClient {
	fn register_pre_send_hook(&self, hook: Arc<dyn PreSendHook>) -> Result<(), ConfigError> {
		self.hooks.write().push(hook);

		Ok(())
	}
}
