//! Resource whitelist gate.

// crates.io
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, auth::ResourceName, error::ValidationError, sync::ResourceSet};

/// Immutable set of resources eligible for synchronization.
///
/// An empty whitelist admits nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Whitelist {
	allowed: ResourceSet,
}
impl Whitelist {
	/// Creates a whitelist from an already validated set.
	pub fn new(allowed: ResourceSet) -> Self {
		Self { allowed }
	}

	/// Parses a whitelist from raw names.
	pub fn parse<I, S>(names: I) -> Result<Self, ValidationError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Ok(Self::new(ResourceSet::parse(names)?))
	}

	/// Parses the `ALLOWED_TABLES` forms: a JSON list, a comma-separated list, or blank.
	pub fn parse_list(raw: &str) -> Result<Self, ValidationError> {
		let raw = raw.trim();

		if raw.is_empty() {
			return Ok(Self::default());
		}
		if raw.starts_with('[') {
			let names = serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
				ValidationError::Payload { path: "whitelist".into(), message: e.to_string() }
			})?;

			return Self::parse(names);
		}

		Self::parse(raw.split(',').map(str::trim).filter(|name| !name.is_empty()))
	}

	/// Number of whitelisted resources.
	pub fn len(&self) -> usize {
		self.allowed.len()
	}

	/// Returns `true` when nothing may be synchronized.
	pub fn is_empty(&self) -> bool {
		self.allowed.is_empty()
	}

	/// Returns `true` if `name` is whitelisted.
	pub fn allows(&self, name: &str) -> bool {
		self.allowed.contains(name)
	}

	/// Whitelisted resources.
	pub fn resources(&self) -> &ResourceSet {
		&self.allowed
	}

	/// Partitions `requested` into whitelisted and denied resources.
	pub fn authorize(&self, requested: &ResourceSet) -> Authorization {
		let (allowed, denied) =
			requested.iter().cloned().partition::<Vec<ResourceName>, _>(|name| self.allows(name));

		Authorization {
			allowed: allowed.into_iter().collect(),
			denied: denied.into_iter().collect(),
		}
	}
}
impl<'de> Deserialize<'de> for Whitelist {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			List(Vec<String>),
			Csv(String),
		}

		let parsed = match Repr::deserialize(deserializer)? {
			Repr::List(names) => Self::parse(names),
			Repr::Csv(raw) => Self::parse_list(&raw),
		};

		parsed.map_err(DeError::custom)
	}
}

/// Partition produced by [`Whitelist::authorize`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Authorization {
	/// Requested resources present in the whitelist.
	pub allowed: ResourceSet,
	/// Requested resources absent from the whitelist.
	pub denied: ResourceSet,
}
impl Authorization {
	/// Returns `true` when no requested resource was allowed.
	pub fn is_all_denied(&self) -> bool {
		self.allowed.is_empty()
	}
}
