//! Authenticated request gateway with single-flight credential refresh.
//!
//! [`Gateway::send`] attaches the session's bearer credential to every call and
//! transparently recovers from an expired access credential: the first 401 in a
//! failure wave performs the `POST /refresh` exchange while later arrivals queue on a
//! fair guard and drain—in arrival order—once that single refresh settles. Requests
//! are retried at most once, transport failures force sign-out, and a missing or
//! rejected refresh credential ends the session.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{ApiCall, ApiTransport, Method, RawResponse},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::{SessionHandle, TokenSecret},
	state::AppState,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Fallback failure message when a response body carries no `detail` field.
pub const GENERIC_FAILURE: &str = "An error occurred";

const REFRESH_PATH: &str = "/refresh";

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport stack.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Connection parameters for the RunCast backend.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	/// Base URL request paths are resolved against.
	pub base_url: Url,
	/// Timeout applied to the credential refresh call; `None` disables it.
	///
	/// Queued callers block on the in-flight refresh, so an unbounded refresh would
	/// stall every request in the wave. Defaults to ten seconds.
	pub refresh_timeout: Option<Duration>,
}
impl GatewayConfig {
	/// Default timeout for the credential refresh call.
	pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::seconds(10);

	/// Creates a config with the default refresh timeout.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, refresh_timeout: Some(Self::DEFAULT_REFRESH_TIMEOUT) }
	}

	/// Overrides or disables the refresh timeout.
	pub fn with_refresh_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.refresh_timeout = timeout;

		self
	}
}

/// An outbound backend request described by method, path, and optional JSON body.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path resolved against [`GatewayConfig::base_url`].
	pub path: String,
	/// JSON request body, if any.
	pub body: Option<serde_json::Value>,
}
impl ApiRequest {
	/// Creates a GET request.
	pub fn get(path: impl Into<String>) -> Self {
		Self { method: Method::Get, path: path.into(), body: None }
	}

	/// Creates a POST request with a JSON body.
	pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
		Self { method: Method::Post, path: path.into(), body: Some(body) }
	}

	/// Creates a PUT request with a JSON body.
	pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
		Self { method: Method::Put, path: path.into(), body: Some(body) }
	}
}

/// Success result carried back from [`Gateway::send`].
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// The body's `message` field, or `"Success"` when absent.
	pub message: String,
	/// Parsed JSON response body.
	pub data: serde_json::Value,
}

/// Rotated credential pair returned by the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshedTokens {
	access_token: String,
	refresh_token: String,
}

/// Issues authenticated backend calls and coordinates credential recovery.
///
/// The gateway owns the transport, the injected session handle, and the dependent
/// local state it must clear on forced sign-out. All of its shared pieces live behind
/// `Arc`s, so clones are cheap and observe the same session.
pub struct Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	config: GatewayConfig,
	session: SessionHandle,
	state: AppState,
	refresh_guard: Arc<AsyncMutex<()>>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(
		config: GatewayConfig,
		session: SessionHandle,
		state: AppState,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			config,
			session,
			state,
			refresh_guard: Default::default(),
			refresh_metrics: Default::default(),
		}
	}

	/// Returns the injected session handle.
	pub fn session(&self) -> &SessionHandle {
		&self.session
	}

	/// Returns the local application state the gateway clears on forced sign-out.
	pub fn state(&self) -> &AppState {
		&self.state
	}

	/// Returns the shared credential recovery counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Clears the session and all dependent local state.
	pub fn sign_out(&self) {
		self.session.sign_out();
		self.state.clear();
	}

	/// Issues a backend call, recovering once from an expired access credential.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Api;

		let span = CallSpan::new(KIND, "send");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.session.set_loading(true);

		let result = span.instrument(self.send_with_recovery(&request)).await;

		self.session.set_loading(false);

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn send_with_recovery(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let stale = self.session.access_token();
		let response = self.dispatch(request, stale.as_ref()).await?;

		if response.status != 401 {
			return Self::classify(response);
		}

		// Every 401 in a wave funnels into one refresh; late arrivals queue on the
		// guard and drain in arrival order once it settles.
		let fresh = self.recover_credentials(stale).await?;
		let retried = self.dispatch(request, Some(&fresh)).await?;

		// The retried call is classified as-is; a second 401 is a plain failure.
		Self::classify(retried)
	}

	async fn dispatch(
		&self,
		request: &ApiRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<RawResponse> {
		let url = self.endpoint(&request.path)?;
		let mut call = ApiCall::new(request.method, url);

		if let Some(bearer) = bearer {
			call = call.with_bearer(bearer.clone());
		}
		if let Some(body) = &request.body {
			call = call.with_body(body.clone());
		}

		match self.transport.execute(call).await {
			Ok(response) => Ok(response),
			Err(err) => {
				// Session state cannot be trusted without connectivity.
				self.sign_out();

				Err(err.into())
			},
		}
	}

	/// Recovers a usable access credential, refreshing at most once per failure wave.
	///
	/// `stale` is the credential the failing request was sent with. After acquiring
	/// the guard, a differing session credential means an earlier caller in the wave
	/// already completed the refresh, so the fresh credential is reused directly.
	async fn recover_credentials(&self, stale: Option<TokenSecret>) -> Result<TokenSecret> {
		let _draining = self.refresh_guard.lock().await;

		if let Some(current) = self.session.access_token() {
			if stale.as_ref() != Some(&current) {
				return Ok(current);
			}
		}

		self.refresh_metrics.record_attempt();

		let Some(refresh) = self.session.refresh_token() else {
			self.refresh_metrics.record_failure();
			self.sign_out();

			return Err(Error::SessionExpired {
				reason: "no refresh credential is available".into(),
			});
		};

		match self.exchange_refresh_token(&refresh).await {
			Ok((access, refresh)) => {
				self.session.install_tokens(access.clone(), refresh);
				self.refresh_metrics.record_success();

				Ok(access)
			},
			Err(err) => {
				self.refresh_metrics.record_failure();
				self.sign_out();

				Err(err)
			},
		}
	}

	/// Exchanges the refresh credential for a rotated pair.
	///
	/// The call bypasses [`Gateway::send`] entirely, so it can never re-enter the
	/// recovery path, and it carries the configured timeout so a stalled refresh
	/// cannot block queued callers indefinitely.
	async fn exchange_refresh_token(
		&self,
		refresh: &TokenSecret,
	) -> Result<(TokenSecret, TokenSecret)> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "exchange_refresh_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = self.endpoint(REFRESH_PATH)?;
				let mut call = ApiCall::new(Method::Post, url)
					.with_body(serde_json::json!({ "refresh_token": refresh.expose() }));

				if let Some(timeout) = self.config.refresh_timeout {
					call = call.with_timeout(timeout);
				}

				let response = self.transport.execute(call).await?;

				if !response.is_success() {
					return Err(Error::Api {
						status: response.status,
						message: response.detail().unwrap_or_else(|| GENERIC_FAILURE.into()),
					});
				}

				let tokens: RefreshedTokens = response.json()?;

				Ok((TokenSecret::new(tokens.access_token), TokenSecret::new(tokens.refresh_token)))
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	fn endpoint(&self, path: &str) -> Result<Url> {
		self.config.base_url.join(path).map_err(|e| ConfigError::from(e).into())
	}

	fn classify(response: RawResponse) -> Result<ApiResponse> {
		if response.is_success() {
			let data = response.json_value()?;
			let message = data
				.get("message")
				.and_then(serde_json::Value::as_str)
				.unwrap_or("Success")
				.to_owned();

			return Ok(ApiResponse { message, data });
		}

		Err(Error::Api {
			status: response.status,
			message: response.detail().unwrap_or_else(|| GENERIC_FAILURE.into()),
		})
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway with its own reqwest-backed transport.
	pub fn new(config: GatewayConfig, session: SessionHandle, state: AppState) -> Self {
		Self::with_transport(config, session, state, ReqwestTransport::default())
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			session: self.session.clone(),
			state: self.state.clone(),
			refresh_guard: self.refresh_guard.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_timeout", &self.config.refresh_timeout)
			.field("authenticated", &self.session.is_authenticated())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU64, Ordering};
	// self
	use super::*;
	use crate::{
		http::TransportFuture,
		session::User,
		state::{FavoriteCity, Post, RunDuration},
	};

	/// Transport scripted around one valid bearer credential and one refresh rotation.
	struct ScriptedTransport {
		accepted: &'static str,
		refresh_calls: AtomicU64,
		refresh_status: u16,
	}
	impl ScriptedTransport {
		fn new(accepted: &'static str) -> Self {
			Self { accepted, refresh_calls: AtomicU64::new(0), refresh_status: 200 }
		}

		fn failing_refresh(accepted: &'static str) -> Self {
			Self { refresh_status: 401, ..Self::new(accepted) }
		}
	}
	impl ApiTransport for ScriptedTransport {
		fn execute(&self, call: ApiCall) -> TransportFuture<'_, RawResponse> {
			let response = if call.url.path() == "/refresh" {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);

				if self.refresh_status == 200 {
					RawResponse {
						status: 200,
						body: format!(
							"{{\"access_token\":\"{}\",\"refresh_token\":\"rotated-refresh\"}}",
							self.accepted,
						)
						.into_bytes(),
					}
				} else {
					RawResponse {
						status: self.refresh_status,
						body: b"{\"detail\":\"refresh token revoked\"}".to_vec(),
					}
				}
			} else if call.bearer.as_ref().map(TokenSecret::expose) == Some(self.accepted) {
				RawResponse { status: 200, body: b"{\"message\":\"ok\"}".to_vec() }
			} else {
				RawResponse { status: 401, body: b"{\"detail\":\"token expired\"}".to_vec() }
			};

			Box::pin(async move { Ok(response) })
		}
	}

	fn scripted_gateway(transport: ScriptedTransport) -> Gateway<ScriptedTransport> {
		let config = GatewayConfig::new(
			Url::parse("http://backend.test").expect("Test base URL should parse."),
		);
		let gateway =
			Gateway::with_transport(config, SessionHandle::new(), AppState::default(), transport);

		gateway.session().sign_in(
			User::default(),
			TokenSecret::new("stale-access"),
			Some(TokenSecret::new("valid-refresh")),
		);

		gateway
	}

	fn seeded_state() -> AppState {
		let state = AppState::default();

		state.add_city(FavoriteCity {
			id: 1,
			name: "Berlin".into(),
			admin1: None,
			country: None,
			latitude: 52.52,
			longitude: 13.40,
			temperature: "18°C".into(),
			weather_code: 2,
		});
		let duration = RunDuration::from_str("00:27:30").expect("Duration fixture should parse.");

		state.add_post(Post::new("p-1", "runner", "Runner", "Morning run", 5_000., duration));

		state
	}

	#[tokio::test]
	async fn concurrent_wave_refreshes_once_and_drains_all() {
		let gateway = scripted_gateway(ScriptedTransport::new("fresh-access"));
		let request = ApiRequest::get("/get_user_details");
		let (a, b, c) = tokio::join!(
			gateway.send(request.clone()),
			gateway.send(request.clone()),
			gateway.send(request),
		);

		assert_eq!(a.expect("First queued request should succeed after refresh.").message, "ok");
		assert_eq!(b.expect("Second queued request should succeed after refresh.").message, "ok");
		assert_eq!(c.expect("Third queued request should succeed after refresh.").message, "ok");
		assert_eq!(gateway.transport.refresh_calls.load(Ordering::SeqCst), 1);
		assert_eq!(gateway.refresh_metrics().successes(), 1);
		assert_eq!(
			gateway.session().access_token().as_ref().map(TokenSecret::expose),
			Some("fresh-access"),
		);
	}

	#[tokio::test]
	async fn failed_refresh_rejects_wave_and_clears_session() {
		let gateway = scripted_gateway(ScriptedTransport::failing_refresh("never-issued"));
		let request = ApiRequest::get("/get_user_details");
		let (a, b) = tokio::join!(gateway.send(request.clone()), gateway.send(request));

		assert!(a.is_err(), "First request must fail when the refresh is rejected.");
		assert!(b.is_err(), "Queued request must fail alongside the rejected refresh.");
		assert_eq!(gateway.transport.refresh_calls.load(Ordering::SeqCst), 1);
		assert!(gateway.session().snapshot().access_token.is_none());
		assert!(gateway.session().snapshot().refresh_token.is_none());
		assert!(gateway.session().snapshot().user.is_none());
	}

	#[tokio::test]
	async fn missing_refresh_credential_signs_out_without_network_refresh() {
		let gateway = scripted_gateway(ScriptedTransport::new("fresh-access"));

		// Replace the seeded session with one that has no refresh credential.
		gateway.session().sign_out();
		gateway.session().sign_in(User::default(), TokenSecret::new("stale-access"), None);

		let err = gateway
			.send(ApiRequest::get("/get_user_details"))
			.await
			.expect_err("A 401 without a refresh credential must end the session.");

		assert!(matches!(err, Error::SessionExpired { .. }));
		assert_eq!(gateway.transport.refresh_calls.load(Ordering::SeqCst), 0);
		assert!(!gateway.session().is_authenticated());
	}

	#[tokio::test]
	async fn forced_sign_out_clears_dependent_state() {
		let state = seeded_state();
		let config = GatewayConfig::new(
			Url::parse("http://backend.test").expect("Test base URL should parse."),
		);
		let gateway = Gateway::with_transport(
			config,
			SessionHandle::new(),
			state.clone(),
			ScriptedTransport::failing_refresh("never-issued"),
		);

		gateway.session().sign_in(
			User::default(),
			TokenSecret::new("stale-access"),
			Some(TokenSecret::new("revoked-refresh")),
		);

		let _ = gateway.send(ApiRequest::get("/get_user_details")).await;

		assert!(state.favorite_cities().is_empty());
		assert!(state.posts().is_empty());
	}

	#[test]
	fn classify_reads_message_detail_and_fallbacks() {
		let ok = RawResponse { status: 200, body: b"{\"message\":\"Registered\"}".to_vec() };
		let classified = Gateway::<ScriptedTransport>::classify(ok)
			.expect("Success response should classify as Ok.");

		assert_eq!(classified.message, "Registered");

		let ok_without_message = RawResponse { status: 200, body: b"{\"id\":7}".to_vec() };
		let classified = Gateway::<ScriptedTransport>::classify(ok_without_message)
			.expect("Success response without message should classify as Ok.");

		assert_eq!(classified.message, "Success");

		let failure = RawResponse { status: 500, body: b"not json".to_vec() };
		let err = Gateway::<ScriptedTransport>::classify(failure)
			.expect_err("Non-success status should classify as Err.");

		match err {
			Error::Api { status, message } => {
				assert_eq!(status, 500);
				assert_eq!(message, GENERIC_FAILURE);
			},
			other => panic!("Unexpected error variant: {other:?}"),
		}
	}
}
