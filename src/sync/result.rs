//! Per-resource outcomes and the aggregated result of one dispatch.

// self
use crate::{
	_prelude::*,
	auth::{PrincipalId, ResourceName},
};

/// Terminal status of a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
	/// No requested resource passed the whitelist.
	AllDenied,
	/// Dry run; the engine was not invoked.
	Simulated,
	/// Every allowed resource succeeded.
	Completed,
	/// Some allowed resources succeeded and some failed.
	PartialFailure,
	/// Every allowed resource failed.
	Failed,
}
impl SyncStatus {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AllDenied => "ALL_DENIED",
			Self::Simulated => "SIMULATED",
			Self::Completed => "COMPLETED",
			Self::PartialFailure => "PARTIAL_FAILURE",
			Self::Failed => "FAILED",
		}
	}
}
impl Display for SyncStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome recorded for a single resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResourceOutcome {
	/// The resource synchronized (or would have, when `simulated`).
	Succeeded {
		/// `true` for dry runs.
		simulated: bool,
	},
	/// The engine reported a failure or the call timed out.
	Failed {
		/// Engine-provided reason.
		reason: String,
	},
	/// The resource is not in the whitelist and never reached the engine.
	SkippedNotWhitelisted,
}
impl ResourceOutcome {
	/// Outcome for a real, successful run.
	pub const fn succeeded() -> Self {
		Self::Succeeded { simulated: false }
	}

	/// Outcome for a dry run.
	pub const fn simulated() -> Self {
		Self::Succeeded { simulated: true }
	}

	/// Failure with a reason.
	pub fn failed(reason: impl Into<String>) -> Self {
		Self::Failed { reason: reason.into() }
	}

	/// Returns `true` for [`ResourceOutcome::Succeeded`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Succeeded { .. })
	}

	/// Returns `true` for [`ResourceOutcome::Failed`].
	pub fn is_failure(&self) -> bool {
		matches!(self, Self::Failed { .. })
	}

	/// Returns `true` for [`ResourceOutcome::SkippedNotWhitelisted`].
	pub fn is_skipped(&self) -> bool {
		matches!(self, Self::SkippedNotWhitelisted)
	}

	/// Stable label used for metrics.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Succeeded { simulated: true } => "simulated",
			Self::Succeeded { simulated: false } => "succeeded",
			Self::Failed { .. } => "failed",
			Self::SkippedNotWhitelisted => "skipped_not_whitelisted",
		}
	}
}

/// Structured result handed back for every dispatch, even when every resource failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
	/// Aggregated status.
	pub status: SyncStatus,
	/// Whether the request was a dry run.
	pub dry_run: bool,
	/// Principal that asked for the run.
	pub requested_by: PrincipalId,
	/// One outcome per requested resource.
	pub outcomes: BTreeMap<ResourceName, ResourceOutcome>,
	/// Instant the dispatch finished.
	#[serde(with = "time::serde::rfc3339")]
	pub finished_at: OffsetDateTime,
}
impl SyncResult {
	/// Aggregates outcomes into a result, deriving the overall status.
	pub fn from_outcomes(
		requested_by: PrincipalId,
		dry_run: bool,
		outcomes: BTreeMap<ResourceName, ResourceOutcome>,
		finished_at: OffsetDateTime,
	) -> Self {
		let status = Self::aggregate(dry_run, outcomes.values());

		Self { status, dry_run, requested_by, outcomes, finished_at }
	}

	fn aggregate<'a>(dry_run: bool, outcomes: impl Iterator<Item = &'a ResourceOutcome>) -> SyncStatus {
		let (mut succeeded, mut failed) = (0_usize, 0_usize);

		for outcome in outcomes {
			match outcome {
				ResourceOutcome::Succeeded { .. } => succeeded += 1,
				ResourceOutcome::Failed { .. } => failed += 1,
				ResourceOutcome::SkippedNotWhitelisted => {},
			}
		}

		match (succeeded, failed) {
			(0, 0) => SyncStatus::AllDenied,
			_ if dry_run => SyncStatus::Simulated,
			(_, 0) => SyncStatus::Completed,
			(0, _) => SyncStatus::Failed,
			_ => SyncStatus::PartialFailure,
		}
	}

	/// Outcome recorded for `name`.
	pub fn outcome(&self, name: &str) -> Option<&ResourceOutcome> {
		self.outcomes.get(name)
	}

	/// Resources that succeeded (including simulated ones).
	pub fn succeeded(&self) -> impl Iterator<Item = &ResourceName> {
		self.outcomes.iter().filter(|(_, o)| o.is_success()).map(|(name, _)| name)
	}

	/// Resources that failed, with their reasons.
	pub fn failed(&self) -> impl Iterator<Item = (&ResourceName, &str)> {
		self.outcomes.iter().filter_map(|(name, o)| match o {
			ResourceOutcome::Failed { reason } => Some((name, reason.as_str())),
			_ => None,
		})
	}

	/// Resources that were skipped by the whitelist.
	pub fn skipped(&self) -> impl Iterator<Item = &ResourceName> {
		self.outcomes.iter().filter(|(_, o)| o.is_skipped()).map(|(name, _)| name)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn outcomes(
		entries: &[(&str, ResourceOutcome)],
	) -> BTreeMap<ResourceName, ResourceOutcome> {
		entries
			.iter()
			.map(|(name, outcome)| {
				(ResourceName::new(name).expect("Table fixture should be valid."), outcome.clone())
			})
			.collect()
	}

	fn result(dry_run: bool, entries: &[(&str, ResourceOutcome)]) -> SyncResult {
		SyncResult::from_outcomes(
			PrincipalId::new("admin").expect("Principal fixture should be valid."),
			dry_run,
			outcomes(entries),
			macros::datetime!(2025-06-01 12:00 UTC),
		)
	}

	#[test]
	fn status_follows_outcome_mix() {
		let skipped = ResourceOutcome::SkippedNotWhitelisted;
		let ok = ResourceOutcome::succeeded();
		let bad = ResourceOutcome::failed("boom");

		assert_eq!(result(false, &[("a", skipped.clone())]).status, SyncStatus::AllDenied);
		assert_eq!(result(true, &[("a", skipped.clone())]).status, SyncStatus::AllDenied);
		assert_eq!(
			result(true, &[("a", ResourceOutcome::simulated()), ("b", skipped.clone())]).status,
			SyncStatus::Simulated
		);
		assert_eq!(result(false, &[("a", ok.clone()), ("b", skipped)]).status, SyncStatus::Completed);
		assert_eq!(
			result(false, &[("a", ok), ("b", bad.clone())]).status,
			SyncStatus::PartialFailure
		);
		assert_eq!(result(false, &[("a", bad)]).status, SyncStatus::Failed);
	}

	#[test]
	fn views_partition_outcomes() {
		let result = result(false, &[
			("a", ResourceOutcome::succeeded()),
			("b", ResourceOutcome::failed("timeout")),
			("c", ResourceOutcome::SkippedNotWhitelisted),
		]);

		assert_eq!(result.succeeded().map(|name| &**name).collect::<Vec<_>>(), ["a"]);
		assert_eq!(
			result.failed().map(|(name, reason)| (&**name, reason)).collect::<Vec<_>>(),
			[("b", "timeout")]
		);
		assert_eq!(result.skipped().map(|name| &**name).collect::<Vec<_>>(), ["c"]);
	}

	#[test]
	fn serializes_with_stable_labels() {
		let result = result(true, &[("kpi_jornadas", ResourceOutcome::simulated())]);
		let json = serde_json::to_value(&result).expect("Result should serialize.");

		assert_eq!(json["status"], "SIMULATED");
		assert_eq!(json["requested_by"], "admin");
		assert_eq!(json["outcomes"]["kpi_jornadas"]["outcome"], "succeeded");
		assert_eq!(json["outcomes"]["kpi_jornadas"]["simulated"], true);
		assert_eq!(json["finished_at"], "2025-06-01T12:00:00Z");
	}
}
