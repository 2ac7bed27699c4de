//! Deterministic engine double driven by a script of failures and delays.

// std
use std::{
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration as StdDuration,
};
// self
use crate::{
	_prelude::*,
	auth::ResourceName,
	engine::{BatchOutcome, EngineCapability, EngineError, EngineFuture, EngineStatus, SyncEngine},
	sync::ResourceSet,
};

/// Engine that fails or stalls the resources it was told to and succeeds for the rest.
///
/// Every call is recorded so tests can assert what reached the engine.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
	capability: EngineCapability,
	failures: HashMap<String, String>,
	delays: HashMap<String, StdDuration>,
	batch_failure: Option<String>,
	status_failure: Option<String>,
	calls: Mutex<Vec<(ResourceName, bool)>>,
	batches: AtomicUsize,
}
impl ScriptedEngine {
	/// Creates an engine that succeeds for everything.
	pub fn new() -> Self {
		Self::default()
	}

	/// Switches the engine to batched calls.
	pub fn batched(mut self) -> Self {
		self.capability = EngineCapability::Batched;

		self
	}

	/// Fails `resource` with `reason`.
	pub fn fail(mut self, resource: impl Into<String>, reason: impl Into<String>) -> Self {
		self.failures.insert(resource.into(), reason.into());

		self
	}

	/// Delays `resource` by `delay` before answering.
	pub fn delay(mut self, resource: impl Into<String>, delay: StdDuration) -> Self {
		self.delays.insert(resource.into(), delay);

		self
	}

	/// Fails every batched call as a whole.
	pub fn fail_batches(mut self, reason: impl Into<String>) -> Self {
		self.batch_failure = Some(reason.into());

		self
	}

	/// Fails status calls.
	pub fn fail_status(mut self, reason: impl Into<String>) -> Self {
		self.status_failure = Some(reason.into());

		self
	}

	/// Resources the engine was asked to run, in call order, with their dry-run flag.
	pub fn calls(&self) -> Vec<(ResourceName, bool)> {
		self.calls.lock().clone()
	}

	/// Number of per-resource runs recorded.
	pub fn call_count(&self) -> usize {
		self.calls.lock().len()
	}

	/// Number of batched calls received.
	pub fn batch_count(&self) -> usize {
		self.batches.load(Ordering::SeqCst)
	}

	async fn run(&self, resource: &ResourceName, dry_run: bool) -> Result<(), EngineError> {
		self.calls.lock().push((resource.clone(), dry_run));

		if let Some(delay) = self.delays.get(&**resource) {
			tokio::time::sleep(*delay).await;
		}

		match self.failures.get(&**resource) {
			Some(reason) => Err(EngineError::failed(reason.clone())),
			None => Ok(()),
		}
	}
}
impl SyncEngine for ScriptedEngine {
	fn capability(&self) -> EngineCapability {
		self.capability
	}

	fn execute<'a>(&'a self, resource: &'a ResourceName, dry_run: bool) -> EngineFuture<'a, ()> {
		Box::pin(self.run(resource, dry_run))
	}

	fn execute_many<'a>(
		&'a self,
		resources: &'a ResourceSet,
		dry_run: bool,
	) -> EngineFuture<'a, BatchOutcome> {
		Box::pin(async move {
			self.batches.fetch_add(1, Ordering::SeqCst);

			if let Some(reason) = &self.batch_failure {
				return Err(EngineError::failed(reason.clone()));
			}

			let mut outcomes = BatchOutcome::new();

			for resource in resources {
				outcomes.insert(resource.clone(), self.run(resource, dry_run).await);
			}

			Ok(outcomes)
		})
	}

	fn status(&self) -> EngineFuture<'_, EngineStatus> {
		Box::pin(async move {
			if let Some(reason) = &self.status_failure {
				return Err(EngineError::failed(reason.clone()));
			}

			let tables = self.failures.len() + self.delays.len();

			Ok(EngineStatus {
				sqlserver: true,
				mysql: true,
				configured_tables: tables,
				enabled_tables: tables,
				system_health: "scripted".into(),
			})
		})
	}
}
