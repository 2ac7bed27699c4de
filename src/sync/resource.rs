//! Normalized sets of resource (table) names.

// std
use std::collections::btree_set::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::{_prelude::*, auth::ResourceName, error::ValidationError};

/// Deduplicated, sorted set of resource names.
///
/// Ordering is stable so results, logs, and engine batches list tables the same way on
/// every run.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceSet(BTreeSet<ResourceName>);
impl ResourceSet {
	/// Builds a set from raw names, validating each one.
	pub fn parse<I, S>(names: I) -> Result<Self, ValidationError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		names
			.into_iter()
			.map(|name| {
				let name = name.as_ref();

				ResourceName::new(name).map_err(|source| ValidationError::InvalidResource {
					name: name.to_owned(),
					source,
				})
			})
			.collect()
	}

	/// Number of distinct resources.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no resources are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains(name)
	}

	/// Adds a resource, returning `false` if it was already present.
	pub fn insert(&mut self, name: ResourceName) -> bool {
		self.0.insert(name)
	}

	/// Iterator over resources in sorted order.
	pub fn iter(&self) -> Iter<'_, ResourceName> {
		self.0.iter()
	}

	/// Returns `true` if every resource in `self` is also in `other`.
	pub fn is_subset(&self, other: &Self) -> bool {
		self.0.is_subset(&other.0)
	}

	/// Returns `true` if `self` and `other` share no resource.
	pub fn is_disjoint(&self, other: &Self) -> bool {
		self.0.is_disjoint(&other.0)
	}
}
impl FromIterator<ResourceName> for ResourceSet {
	fn from_iter<T: IntoIterator<Item = ResourceName>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}
impl IntoIterator for ResourceSet {
	type IntoIter = std::collections::btree_set::IntoIter<ResourceName>;
	type Item = ResourceName;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
impl<'a> IntoIterator for &'a ResourceSet {
	type IntoIter = Iter<'a, ResourceName>;
	type Item = &'a ResourceName;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
impl Debug for ResourceSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.0.iter().map(|name| &**name)).finish()
	}
}
impl Display for ResourceSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for (idx, name) in self.0.iter().enumerate() {
			if idx > 0 {
				f.write_str(",")?;
			}

			f.write_str(name)?;
		}

		Ok(())
	}
}
impl Serialize for ResourceSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for name in &self.0 {
			seq.serialize_element(name)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ResourceSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ResourceSet::parse(values).map_err(DeError::custom)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn names_normalize_and_dedupe() {
		let set = ResourceSet::parse(["kpi_turnos", "kpi_jornadas", "kpi_turnos"])
			.expect("Resource set fixture should be valid.");

		assert_eq!(set.len(), 2);
		assert_eq!(set.to_string(), "kpi_jornadas,kpi_turnos");
		assert!(set.contains("kpi_turnos"));
	}

	#[test]
	fn invalid_names_report_the_offender() {
		let err = ResourceSet::parse(["kpi_jornadas", "users; DROP TABLE"])
			.expect_err("Injected names must be rejected.");

		assert!(matches!(
			err,
			ValidationError::InvalidResource { ref name, .. } if name == "users; DROP TABLE"
		));
	}

	#[test]
	fn serde_validates_entries() {
		let set: ResourceSet =
			serde_json::from_str("[\"b\",\"a\"]").expect("Resource list should deserialize.");

		assert_eq!(serde_json::to_string(&set).expect("Set should serialize."), "[\"a\",\"b\"]");
		assert!(serde_json::from_str::<ResourceSet>("[\"a;b\"]").is_err());
	}
}
