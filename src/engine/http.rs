//! Engine binding that forwards work to a remote sync runner over HTTP.
//!
//! The runner exposes two endpoints relative to its base URL:
//!
//! - `POST sync` with `{"tables": [...], "dry_run": bool}` answering
//!   `{"results": {"<table>": {"ok": bool, "reason": "..."}}}`.
//! - `GET status` answering an [`EngineStatus`] document.
//!
//! Redirects are never followed; a runner that answers with one is misconfigured.

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	auth::ResourceName,
	engine::{BatchOutcome, EngineCapability, EngineError, EngineFuture, EngineStatus, SyncEngine},
	error::ConfigError,
	sync::ResourceSet,
};

#[derive(Serialize)]
struct SyncCall<'a> {
	tables: &'a ResourceSet,
	dry_run: bool,
}

#[derive(Deserialize)]
struct SyncReply {
	results: BTreeMap<String, RemoteOutcome>,
}

#[derive(Deserialize)]
struct RemoteOutcome {
	ok: bool,
	#[serde(default)]
	reason: Option<String>,
}

/// Builder for [`HttpEngine`].
#[derive(Debug)]
pub struct HttpEngineBuilder {
	base_url: Url,
	timeout: Option<StdDuration>,
	client: Option<ReqwestClient>,
}
impl HttpEngineBuilder {
	/// Sets the per-request timeout applied by the internally built client.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Uses a caller-provided client instead of building one.
	pub fn client(mut self, client: ReqwestClient) -> Self {
		self.client = Some(client);

		self
	}

	/// Finalizes the engine.
	pub fn build(self) -> Result<HttpEngine, ConfigError> {
		let client = match self.client {
			Some(client) => client,
			None => {
				let mut builder = ReqwestClient::builder().redirect(Policy::none());

				if let Some(timeout) = self.timeout {
					builder = builder.timeout(timeout);
				}

				builder.build()?
			},
		};
		let mut base_url = self.base_url;

		// `Url::join` replaces the last segment unless the path ends with a slash.
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		Ok(HttpEngine { base_url, client })
	}
}

/// Batched engine backed by a remote runner.
#[derive(Clone, Debug)]
pub struct HttpEngine {
	base_url: Url,
	client: ReqwestClient,
}
impl HttpEngine {
	/// Starts building an engine for the runner at `base_url`.
	pub fn builder(base_url: Url) -> HttpEngineBuilder {
		HttpEngineBuilder { base_url, timeout: None, client: None }
	}

	/// Normalized base URL (always ends with `/`).
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, path: &str) -> Result<Url, EngineError> {
		self.base_url
			.join(path)
			.map_err(|e| EngineError::Protocol { message: format!("invalid endpoint: {e}") })
	}

	async fn sync(&self, resources: &ResourceSet, dry_run: bool) -> Result<BatchOutcome, EngineError> {
		let url = self.endpoint("sync")?;
		let reply = self
			.client
			.post(url)
			.json(&SyncCall { tables: resources, dry_run })
			.send()
			.await?
			.error_for_status()?
			.json::<SyncReply>()
			.await?;
		let mut results = reply.results;
		let outcomes = resources
			.iter()
			.filter_map(|resource| {
				let remote = results.remove(&**resource)?;
				let outcome = if remote.ok {
					Ok(())
				} else {
					Err(EngineError::failed(
						remote.reason.unwrap_or_else(|| "engine reported failure".into()),
					))
				};

				Some((resource.clone(), outcome))
			})
			.collect();

		Ok(outcomes)
	}
}
impl SyncEngine for HttpEngine {
	fn capability(&self) -> EngineCapability {
		EngineCapability::Batched
	}

	fn execute<'a>(&'a self, resource: &'a ResourceName, dry_run: bool) -> EngineFuture<'a, ()> {
		Box::pin(async move {
			let single = ResourceSet::from_iter([resource.clone()]);

			self.sync(&single, dry_run).await?.remove(&**resource).unwrap_or_else(|| {
				Err(EngineError::Protocol { message: format!("no result for `{resource}`") })
			})
		})
	}

	fn execute_many<'a>(
		&'a self,
		resources: &'a ResourceSet,
		dry_run: bool,
	) -> EngineFuture<'a, BatchOutcome> {
		Box::pin(self.sync(resources, dry_run))
	}

	fn status(&self) -> EngineFuture<'_, EngineStatus> {
		Box::pin(async move {
			let url = self.endpoint("status")?;
			let status = self
				.client
				.get(url)
				.send()
				.await?
				.error_for_status()?
				.json::<EngineStatus>()
				.await?;

			Ok(status)
		})
	}
}
