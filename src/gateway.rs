//! Gateway facade consumed by the HTTP routing layer.
//!
//! Each operation applies the access-control layers cheapest first: bearer token,
//! per-principal admission, payload validation, and only then the dispatcher. Every
//! rejection surfaces as an [`Error`] whose [`category`](Error::category) tells the caller
//! whether to re-authenticate, back off, or fix the request.

// self
use crate::{
	_prelude::*,
	auth::{
		HashCost, IssuedToken, Password, Principal, PrincipalId, TokenSecret, TokenService,
		bearer_token,
	},
	config::GatewayConfig,
	dispatch::Dispatcher,
	engine::{EngineError, EngineStatus},
	error::AuthError,
	limit::{FixedWindowLimiter, RateLimitPolicy, RateLimitRule},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::{FileIdentityStore, IdentityStore, MemoryIdentityStore},
	sync::{SyncPayload, SyncRequest, SyncResult},
};

/// Liveness answer; requires no authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
	/// Always `ok`.
	pub status: &'static str,
}

/// Successful login answer.
#[derive(Clone, Debug, Serialize)]
pub struct LoginResponse {
	/// Signed bearer token.
	pub access_token: TokenSecret,
	/// Always `bearer`.
	pub token_type: &'static str,
	/// Instant the token stops being accepted.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl From<IssuedToken> for LoginResponse {
	fn from(token: IssuedToken) -> Self {
		Self {
			access_token: token.access_token,
			token_type: token.token_type,
			expires_at: token.expires_at,
		}
	}
}

/// Engine health plus the gateway's own whitelist size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusReport {
	/// Engine-reported health, or a fallback when the engine could not answer.
	#[serde(flatten)]
	pub engine: EngineStatus,
	/// Number of tables the gateway will forward.
	pub whitelisted_tables: usize,
}

/// Authenticated, rate-limited entry point for login, status, and sync.
#[derive(Clone)]
pub struct Gateway {
	tokens: TokenService,
	login_limiter: Arc<dyn RateLimitPolicy>,
	request_limiter: Arc<dyn RateLimitPolicy>,
	dispatcher: Dispatcher,
}
impl Gateway {
	/// Wires a gateway with the default `3/minute` login and `5/minute` request limits.
	pub fn new(tokens: TokenService, dispatcher: Dispatcher) -> Self {
		Self {
			tokens,
			login_limiter: Arc::new(FixedWindowLimiter::new(RateLimitRule::per_minute(3))),
			request_limiter: Arc::new(FixedWindowLimiter::new(RateLimitRule::per_minute(5))),
			dispatcher,
		}
	}

	/// Replaces the limiter guarding login attempts.
	pub fn with_login_limiter(mut self, limiter: Arc<dyn RateLimitPolicy>) -> Self {
		self.login_limiter = limiter;

		self
	}

	/// Replaces the limiter guarding authenticated calls.
	pub fn with_request_limiter(mut self, limiter: Arc<dyn RateLimitPolicy>) -> Self {
		self.request_limiter = limiter;

		self
	}

	/// Validates `config` and wires every component it describes.
	pub fn from_config(config: &GatewayConfig) -> Result<Self> {
		Self::from_config_with(config, HashCost::default())
	}

	/// Same as [`from_config`](Self::from_config), hashing plain passwords with `cost`.
	pub fn from_config_with(config: &GatewayConfig, cost: HashCost) -> Result<Self> {
		config.validate()?;

		let identities: Arc<dyn IdentityStore> = match &config.identity_file {
			Some(path) => Arc::new(FileIdentityStore::open(path)?),
			None => {
				let records = config.principal_records_with(cost)?;

				Arc::new(MemoryIdentityStore::from_records(records)?)
			},
		};
		let tokens =
			TokenService::new(config.signing_secret()?, identities)?.with_ttl(config.token.ttl());
		let whitelist = Arc::new(config.whitelist.clone());
		let engine = config.engine.build(whitelist.len())?;
		let dispatcher =
			Dispatcher::new(whitelist, engine).with_options(config.dispatch.options());

		#[cfg(feature = "tracing")]
		tracing::info!(
			engine = config.engine.label(),
			whitelisted = config.whitelist.len(),
			"Gateway configured."
		);

		Ok(Self::new(tokens, dispatcher)
			.with_login_limiter(Arc::new(FixedWindowLimiter::new(config.rate_limit.login)))
			.with_request_limiter(Arc::new(FixedWindowLimiter::new(config.rate_limit.requests))))
	}

	/// Token service used for issuance and verification.
	pub fn tokens(&self) -> &TokenService {
		&self.tokens
	}

	/// Dispatcher used for sync calls.
	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	/// Liveness probe.
	pub fn health(&self) -> HealthReport {
		HealthReport { status: "ok" }
	}

	/// Exchanges credentials for a token on behalf of `client`.
	///
	/// `client` identifies the calling connection (typically its remote address) and keys
	/// the login limiter.
	pub async fn login(
		&self,
		client: &str,
		username: &str,
		password: &Password,
	) -> Result<LoginResponse> {
		self.login_at(client, username, password, OffsetDateTime::now_utc()).await
	}

	/// Same as [`login`](Self::login) at an explicit instant.
	///
	/// The login limiter is consulted before the credential check so guessing is throttled
	/// even for unknown principals. It is keyed by the client rather than the attempted
	/// username, so failed guesses never lock a principal out from elsewhere.
	pub async fn login_at(
		&self,
		client: &str,
		username: &str,
		password: &Password,
		now: OffsetDateTime,
	) -> Result<LoginResponse> {
		let span = OpSpan::new(OpKind::Login, "gateway.login");

		observe(OpKind::Login, span.instrument(async move {
			self.login_limiter.admit_at(client.trim(), now)?;

			let id = PrincipalId::new(username.trim()).map_err(|_| AuthError::InvalidCredential)?;
			let token = self.tokens.issue_at(&id, password, now).await?;

			Ok(token.into())
		}))
		.await
	}

	/// Reports engine health for an authenticated caller.
	pub async fn status(&self, authorization: Option<&str>) -> Result<StatusReport> {
		self.status_at(authorization, OffsetDateTime::now_utc()).await
	}

	/// Same as [`status`](Self::status) at an explicit instant.
	pub async fn status_at(
		&self,
		authorization: Option<&str>,
		now: OffsetDateTime,
	) -> Result<StatusReport> {
		let span = OpSpan::new(OpKind::Status, "gateway.status");

		observe(OpKind::Status, span.instrument(async move {
			self.authenticate_at(authorization, now)?;

			let deadline = self.dispatcher.options().resource_timeout;
			let call = self.dispatcher.engine().status();
			let engine = match tokio::time::timeout(deadline, call).await {
				Ok(Ok(status)) => status,
				Ok(Err(e)) => fallback_status(e),
				Err(_) => fallback_status(EngineError::Timeout),
			};

			Ok(StatusReport { engine, whitelisted_tables: self.dispatcher.whitelist().len() })
		}))
		.await
	}

	/// Runs a sync for an authenticated caller.
	pub async fn sync(
		&self,
		authorization: Option<&str>,
		payload: SyncPayload,
	) -> Result<SyncResult> {
		self.sync_at(authorization, payload, OffsetDateTime::now_utc()).await
	}

	/// Parses a JSON body and runs a sync.
	///
	/// The body is only parsed after the caller is authenticated and admitted.
	pub async fn sync_json(
		&self,
		authorization: Option<&str>,
		body: &[u8],
	) -> Result<SyncResult> {
		self.sync_json_at(authorization, body, OffsetDateTime::now_utc()).await
	}

	/// Same as [`sync_json`](Self::sync_json) at an explicit instant.
	pub async fn sync_json_at(
		&self,
		authorization: Option<&str>,
		body: &[u8],
		now: OffsetDateTime,
	) -> Result<SyncResult> {
		let span = OpSpan::new(OpKind::Sync, "gateway.sync_json");

		observe(OpKind::Sync, span.instrument(async move {
			let principal = self.authenticate_at(authorization, now)?;
			let request = SyncPayload::from_json(body)?.into_request()?;

			Ok(self.dispatcher.dispatch(&principal, request).await)
		}))
		.await
	}

	/// Same as [`sync`](Self::sync) at an explicit instant.
	pub async fn sync_at(
		&self,
		authorization: Option<&str>,
		payload: SyncPayload,
		now: OffsetDateTime,
	) -> Result<SyncResult> {
		let span = OpSpan::new(OpKind::Sync, "gateway.sync");

		observe(OpKind::Sync, span.instrument(async move {
			let principal = self.authenticate_at(authorization, now)?;
			let request = SyncRequest::try_from(payload)?;

			Ok(self.dispatcher.dispatch(&principal, request).await)
		}))
		.await
	}

	/// Verifies the bearer header and admits the principal.
	pub fn authenticate_at(
		&self,
		authorization: Option<&str>,
		now: OffsetDateTime,
	) -> Result<Principal> {
		let token = bearer_token(authorization)?;
		let principal = self.tokens.verify_at(token, now).into_result()?;

		self.request_limiter.admit_at(&principal.id, now)?;

		Ok(principal)
	}
}
impl Debug for Gateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("tokens", &self.tokens)
			.field("dispatcher", &self.dispatcher)
			.finish_non_exhaustive()
	}
}

async fn observe<T, F>(kind: OpKind, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	obs::record_op_outcome(kind, OpOutcome::Attempt);

	let result = fut.await;

	match &result {
		Ok(_) => obs::record_op_outcome(kind, OpOutcome::Success),
		Err(e) => {
			obs::record_op_outcome(kind, OpOutcome::Failure);

			#[cfg(feature = "tracing")]
			tracing::warn!(
				op = kind.as_str(),
				category = %e.category(),
				error = %e,
				"Request rejected."
			);
			#[cfg(not(feature = "tracing"))]
			let _ = e;
		},
	}

	result
}

fn fallback_status(error: EngineError) -> EngineStatus {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %error, "Engine status unavailable; reporting fallback.");

	EngineStatus::fallback(error)
}
