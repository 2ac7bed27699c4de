//! In-process engine that simulates success.

// self
use crate::{
	_prelude::*,
	auth::ResourceName,
	engine::{EngineFuture, EngineStatus, SyncEngine},
};

/// Engine that accepts every well-formed table and reports both stores healthy.
#[derive(Clone, Debug, Default)]
pub struct MockEngine {
	configured_tables: usize,
}
impl MockEngine {
	/// Health label reported by [`SyncEngine::status`].
	pub const HEALTH: &'static str = "healthy-mock";

	/// Creates a mock reporting `configured_tables` tables.
	pub fn new(configured_tables: usize) -> Self {
		Self { configured_tables }
	}
}
impl SyncEngine for MockEngine {
	fn execute<'a>(&'a self, resource: &'a ResourceName, dry_run: bool) -> EngineFuture<'a, ()> {
		Box::pin(async move {
			#[cfg(feature = "tracing")]
			tracing::debug!(resource = %resource, dry_run, "Mock engine accepted resource.");
			#[cfg(not(feature = "tracing"))]
			let _ = (resource, dry_run);

			Ok(())
		})
	}

	fn status(&self) -> EngineFuture<'_, EngineStatus> {
		let status = EngineStatus {
			sqlserver: true,
			mysql: true,
			configured_tables: self.configured_tables,
			enabled_tables: self.configured_tables,
			system_health: Self::HEALTH.into(),
		};

		Box::pin(async move { Ok(status) })
	}
}
