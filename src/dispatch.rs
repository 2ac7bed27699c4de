//! Whitelist-gated dispatch of synchronization requests to the bound engine.
//!
//! Every dispatch walks the same path: the requested set is partitioned by the
//! [`Whitelist`]; if nothing survives the result is `ALL_DENIED`; a dry run marks the
//! survivors as simulated without touching the engine; otherwise the engine is called
//! (per resource with bounded parallelism, or once for batched engines) and the outcomes
//! are aggregated. Engine errors never escape: they become `failed` outcomes.

// std
use std::time::Duration as StdDuration;
// crates.io
use async_lock::Semaphore;
use futures::future;
// self
use crate::{
	_prelude::*,
	auth::{Principal, ResourceName},
	engine::{EngineCapability, EngineError, SyncEngine},
	error::ConfigError,
	obs,
	sync::{ResourceOutcome, ResourceSet, SyncRequest, SyncResult},
	whitelist::{Authorization, Whitelist},
};

/// Tuning knobs for engine calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchOptions {
	/// Maximum number of per-resource engine calls in flight for one request.
	pub max_concurrency: usize,
	/// Deadline for a single engine call (or a whole batch).
	pub resource_timeout: StdDuration,
}
impl DispatchOptions {
	/// Rejects zero concurrency or a zero deadline.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_concurrency == 0 {
			return Err(ConfigError::NonPositive { setting: "dispatch.max_concurrency" });
		}
		if self.resource_timeout.is_zero() {
			return Err(ConfigError::NonPositive { setting: "dispatch.resource_timeout_secs" });
		}

		Ok(())
	}
}
impl Default for DispatchOptions {
	fn default() -> Self {
		Self { max_concurrency: 4, resource_timeout: StdDuration::from_secs(30) }
	}
}

/// Orchestrates whitelist partitioning and engine calls.
#[derive(Clone)]
pub struct Dispatcher {
	whitelist: Arc<Whitelist>,
	engine: Arc<dyn SyncEngine>,
	options: DispatchOptions,
}
impl Dispatcher {
	/// Creates a dispatcher with default options.
	pub fn new(whitelist: Arc<Whitelist>, engine: Arc<dyn SyncEngine>) -> Self {
		Self { whitelist, engine, options: DispatchOptions::default() }
	}

	/// Overrides the dispatch options.
	pub fn with_options(mut self, options: DispatchOptions) -> Self {
		self.options = options;

		self
	}

	/// Whitelist consulted by this dispatcher.
	pub fn whitelist(&self) -> &Whitelist {
		&self.whitelist
	}

	/// Engine bound to this dispatcher.
	pub fn engine(&self) -> &Arc<dyn SyncEngine> {
		&self.engine
	}

	/// Options in effect.
	pub fn options(&self) -> DispatchOptions {
		self.options
	}

	/// Runs `request` on behalf of `principal` and returns the aggregated result.
	pub async fn dispatch(&self, principal: &Principal, request: SyncRequest) -> SyncResult {
		let SyncRequest { resources, dry_run } = request;
		let Authorization { allowed, denied } = self.whitelist.authorize(&resources);
		let mut outcomes = denied
			.into_iter()
			.map(|name| (name, ResourceOutcome::SkippedNotWhitelisted))
			.collect::<BTreeMap<_, _>>();

		if allowed.is_empty() {
			#[cfg(feature = "tracing")]
			tracing::warn!(
				principal = %principal.id,
				requested = %resources,
				"No requested table is whitelisted."
			);
		} else if dry_run {
			outcomes.extend(allowed.into_iter().map(|name| (name, ResourceOutcome::simulated())));
		} else {
			outcomes.extend(self.execute(&allowed).await);
		}

		outcomes.values().for_each(obs::record_resource_outcome);

		let result = SyncResult::from_outcomes(
			principal.id.clone(),
			dry_run,
			outcomes,
			OffsetDateTime::now_utc(),
		);

		#[cfg(feature = "tracing")]
		tracing::info!(
			principal = %principal.id,
			status = %result.status,
			dry_run,
			"Dispatch finished."
		);

		result
	}

	async fn execute(&self, allowed: &ResourceSet) -> Vec<(ResourceName, ResourceOutcome)> {
		let outcomes = match self.engine.capability() {
			EngineCapability::PerResource => self.execute_each(allowed).await,
			EngineCapability::Batched => self.execute_batch(allowed).await,
		};

		#[cfg(feature = "tracing")]
		for (name, outcome) in &outcomes {
			if let ResourceOutcome::Failed { reason } = outcome {
				tracing::warn!(resource = %name, reason = %reason, "Engine failed resource.");
			}
		}

		outcomes
	}

	async fn execute_each(&self, allowed: &ResourceSet) -> Vec<(ResourceName, ResourceOutcome)> {
		let permits = Semaphore::new(self.options.max_concurrency.max(1));
		let permits = &permits;
		let calls = allowed.iter().map(|resource| async move {
			let _permit = permits.acquire().await;
			let call = self.engine.execute(resource, false);
			let outcome = match tokio::time::timeout(self.options.resource_timeout, call).await {
				Ok(Ok(())) => ResourceOutcome::succeeded(),
				Ok(Err(e)) => ResourceOutcome::failed(e.to_string()),
				Err(_) => ResourceOutcome::failed(EngineError::Timeout.to_string()),
			};

			(resource.clone(), outcome)
		});

		future::join_all(calls).await
	}

	async fn execute_batch(&self, allowed: &ResourceSet) -> Vec<(ResourceName, ResourceOutcome)> {
		let call = self.engine.execute_many(allowed, false);
		let mut batch = match tokio::time::timeout(self.options.resource_timeout, call).await {
			Ok(Ok(batch)) => batch,
			Ok(Err(e)) => return fail_all(allowed, &e),
			Err(_) => return fail_all(allowed, &EngineError::Timeout),
		};

		allowed
			.iter()
			.map(|name| {
				let outcome = match batch.remove(name) {
					Some(Ok(())) => ResourceOutcome::succeeded(),
					Some(Err(e)) => ResourceOutcome::failed(e.to_string()),
					None => ResourceOutcome::failed("missing from engine response"),
				};

				(name.clone(), outcome)
			})
			.collect()
	}
}
impl Debug for Dispatcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("whitelist", &self.whitelist)
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}

fn fail_all(allowed: &ResourceSet, error: &EngineError) -> Vec<(ResourceName, ResourceOutcome)> {
	let reason = error.to_string();

	allowed.iter().map(|name| (name.clone(), ResourceOutcome::failed(reason.clone()))).collect()
}
