//! Pluggable synchronization engine contract and its bindings.
//!
//! The dispatcher only talks to [`SyncEngine`]. Which implementation sits behind it is
//! decided once at startup through [`EngineBinding`]:
//!
//! - [`MockEngine`] simulates success for every table and never touches a backing store.
//! - [`HttpEngine`] (feature `reqwest`) forwards work to an out-of-process sync runner.
//! - `ScriptedEngine` (`cfg(test)` or feature `test`) replays configured failures and
//!   delays; it backs the test suites.

#[cfg(feature = "reqwest")] pub mod http;
pub mod mock;
#[cfg(any(test, feature = "test"))] pub mod scripted;

#[cfg(feature = "reqwest")] pub use http::HttpEngine;
pub use mock::MockEngine;
#[cfg(any(test, feature = "test"))] pub use scripted::ScriptedEngine;

// self
use crate::{_prelude::*, auth::ResourceName, error::ConfigError, sync::ResourceSet};

/// Boxed future returned by [`SyncEngine`] implementations.
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EngineError>> + 'a + Send>>;

/// Per-resource results of a batched call.
pub type BatchOutcome = BTreeMap<ResourceName, Result<(), EngineError>>;

/// Call shape an engine prefers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EngineCapability {
	/// One [`SyncEngine::execute`] call per resource.
	#[default]
	PerResource,
	/// A single [`SyncEngine::execute_many`] call covering every resource.
	Batched,
}

/// Work performer behind the dispatcher.
///
/// Engines own their retry policy; the dispatcher calls each resource at most once.
pub trait SyncEngine
where
	Self: Send + Sync,
{
	/// Preferred call shape.
	fn capability(&self) -> EngineCapability {
		EngineCapability::PerResource
	}

	/// Synchronizes one resource.
	fn execute<'a>(&'a self, resource: &'a ResourceName, dry_run: bool) -> EngineFuture<'a, ()>;

	/// Synchronizes several resources in one call.
	///
	/// The outer error fails the whole batch. The default runs [`execute`](Self::execute)
	/// sequentially and never fails as a whole.
	fn execute_many<'a>(
		&'a self,
		resources: &'a ResourceSet,
		dry_run: bool,
	) -> EngineFuture<'a, BatchOutcome> {
		Box::pin(async move {
			let mut outcomes = BatchOutcome::new();

			for resource in resources {
				let outcome = self.execute(resource, dry_run).await;

				outcomes.insert(resource.clone(), outcome);
			}

			Ok(outcomes)
		})
	}

	/// Reports backing-store connectivity and table counts.
	fn status(&self) -> EngineFuture<'_, EngineStatus>;
}

/// Health snapshot reported by an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
	/// SQL Server source reachable.
	pub sqlserver: bool,
	/// MySQL target reachable.
	pub mysql: bool,
	/// Tables known to the engine.
	pub configured_tables: usize,
	/// Tables the engine will actually synchronize.
	pub enabled_tables: usize,
	/// Free-form health summary.
	pub system_health: String,
}
impl EngineStatus {
	/// Report used when the engine cannot be reached.
	pub fn fallback(reason: impl Display) -> Self {
		Self {
			sqlserver: false,
			mysql: false,
			configured_tables: 0,
			enabled_tables: 0,
			system_health: format!("fallback: {reason}"),
		}
	}
}

/// Failure scoped to one engine call.
#[derive(Debug, ThisError)]
pub enum EngineError {
	/// The engine ran the resource and reported a failure.
	#[error("{reason}")]
	Failed {
		/// Engine-provided reason.
		reason: String,
	},
	/// The engine did not answer within the per-resource deadline.
	#[error("timeout")]
	Timeout,
	/// The remote runner answered with a non-success status.
	#[error("engine responded with HTTP {status}")]
	Remote {
		/// HTTP status code.
		status: u16,
	},
	/// The remote runner could not be reached.
	#[error("engine unreachable: {source}")]
	Connectivity {
		/// Underlying transport failure.
		#[source]
		source: Box<dyn StdError + Send + Sync>,
	},
	/// The remote runner answered with an unexpected body.
	#[error("engine protocol error: {message}")]
	Protocol {
		/// Parser or shape message.
		message: String,
	},
}
impl EngineError {
	/// Failure with a reason.
	pub fn failed(reason: impl Into<String>) -> Self {
		Self::Failed { reason: reason.into() }
	}

	/// Wraps a transport failure.
	pub fn connectivity(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Connectivity { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for EngineError {
	fn from(e: ReqwestError) -> Self {
		if let Some(status) = e.status() {
			return Self::Remote { status: status.as_u16() };
		}
		if e.is_decode() {
			return Self::Protocol { message: e.to_string() };
		}

		Self::connectivity(e)
	}
}

/// Startup selector for the engine implementation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineBinding {
	/// In-process simulator.
	#[default]
	Mock,
	/// Remote sync runner reached over HTTP.
	Http {
		/// Runner base URL.
		base_url: Url,
		/// Request timeout in seconds.
		#[serde(default = "EngineBinding::default_timeout_secs")]
		timeout_secs: u64,
	},
}
impl EngineBinding {
	const DEFAULT_TIMEOUT_SECS: u64 = 30;

	fn default_timeout_secs() -> u64 {
		Self::DEFAULT_TIMEOUT_SECS
	}

	/// Parses the `DATASYNC_ENGINE` form: `mock` or an `http(s)://` base URL.
	pub fn parse(raw: &str) -> Result<Self, ConfigError> {
		let raw = raw.trim();

		if raw.is_empty() || raw.eq_ignore_ascii_case("mock") {
			return Ok(Self::Mock);
		}

		let base_url =
			Url::parse(raw).map_err(|source| ConfigError::InvalidEngineUrl { source })?;

		Ok(Self::Http { base_url, timeout_secs: Self::DEFAULT_TIMEOUT_SECS })
	}

	/// Stable label for logs.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Mock => "mock",
			Self::Http { .. } => "http",
		}
	}

	/// Builds the bound engine. `configured_tables` is what the mock reports.
	pub fn build(&self, configured_tables: usize) -> Result<Arc<dyn SyncEngine>, ConfigError> {
		match self {
			Self::Mock => Ok(Arc::new(MockEngine::new(configured_tables))),
			#[cfg(feature = "reqwest")]
			Self::Http { base_url, timeout_secs } => {
				if *timeout_secs == 0 {
					return Err(ConfigError::NonPositive { setting: "engine.timeout_secs" });
				}

				let engine = HttpEngine::builder(base_url.clone())
					.timeout(std::time::Duration::from_secs(*timeout_secs))
					.build()?;

				Ok(Arc::new(engine))
			},
			#[cfg(not(feature = "reqwest"))]
			Self::Http { .. } => Err(ConfigError::EngineUnavailable { binding: self.label() }),
		}
	}
}
