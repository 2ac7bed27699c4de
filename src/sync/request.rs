//! Validated synchronization requests and their JSON payload form.

// self
use crate::{_prelude::*, error::ValidationError, sync::ResourceSet};

/// Non-empty set of tables plus the dry-run flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncRequest {
	/// Tables the caller asked to synchronize.
	pub resources: ResourceSet,
	/// When `true` the engine is never invoked.
	pub dry_run: bool,
}
impl SyncRequest {
	/// Builds a request, rejecting an empty resource set.
	pub fn new(resources: ResourceSet, dry_run: bool) -> Result<Self, ValidationError> {
		if resources.is_empty() {
			return Err(ValidationError::EmptyResources);
		}

		Ok(Self { resources, dry_run })
	}

	/// Parses raw names and builds a request.
	pub fn from_names<I, S>(names: I, dry_run: bool) -> Result<Self, ValidationError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::new(ResourceSet::parse(names)?, dry_run)
	}
}

/// Wire shape of a sync call: `{"tables": [...], "dry_run": true}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPayload {
	/// Raw table names as supplied by the client.
	pub tables: Vec<String>,
	/// Dry-run flag; omitted means `true`.
	#[serde(default = "SyncPayload::default_dry_run")]
	pub dry_run: bool,
}
impl SyncPayload {
	const fn default_dry_run() -> bool {
		true
	}

	/// Parses a JSON body, reporting the path of the first offending field.
	pub fn from_json(bytes: &[u8]) -> Result<Self, ValidationError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut de).map_err(|e| {
			let path = e.path().to_string();

			ValidationError::Payload { path, message: e.into_inner().to_string() }
		})
	}

	/// Validates the payload into a [`SyncRequest`].
	pub fn into_request(self) -> Result<SyncRequest, ValidationError> {
		SyncRequest::from_names(self.tables, self.dry_run)
	}
}
impl TryFrom<SyncPayload> for SyncRequest {
	type Error = ValidationError;

	fn try_from(payload: SyncPayload) -> Result<Self, Self::Error> {
		payload.into_request()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn dry_run_defaults_to_true() {
		let payload = SyncPayload::from_json(br#"{"tables":["kpi_jornadas"]}"#)
			.expect("Payload without dry_run should parse.");
		let request = payload.into_request().expect("Payload should validate.");

		assert!(request.dry_run);
		assert!(request.resources.contains("kpi_jornadas"));
	}

	#[test]
	fn type_errors_name_the_field() {
		let err = SyncPayload::from_json(br#"{"tables":["a"],"dry_run":"yes"}"#)
			.expect_err("A string dry_run must be rejected.");

		assert!(matches!(err, ValidationError::Payload { ref path, .. } if path == "dry_run"));

		let err = SyncPayload::from_json(br#"{"tables":"a,b"}"#)
			.expect_err("A scalar tables field must be rejected.");

		assert!(matches!(err, ValidationError::Payload { ref path, .. } if path == "tables"));
	}

	#[test]
	fn empty_and_injected_lists_are_rejected() {
		let empty = SyncPayload { tables: Vec::new(), dry_run: false };

		assert_eq!(empty.into_request(), Err(ValidationError::EmptyResources));

		let injected = SyncPayload { tables: vec!["kpi jornadas".into()], dry_run: false };

		assert!(matches!(injected.into_request(), Err(ValidationError::InvalidResource { .. })));
	}
}
