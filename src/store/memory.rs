//! In-memory [`IdentityStore`] populated at bootstrap.

// self
use crate::{
	_prelude::*,
	auth::PrincipalId,
	store::{IdentityStore, PrincipalRecord, StoreError, StoreFuture},
};

type RecordMap = Arc<HashMap<PrincipalId, PrincipalRecord>>;

/// Immutable identity store shared across request tasks without locking.
#[derive(Clone, Debug, Default)]
pub struct MemoryIdentityStore(RecordMap);
impl MemoryIdentityStore {
	/// Builds a store from bootstrap records, rejecting duplicate identifiers.
	pub fn from_records(
		records: impl IntoIterator<Item = PrincipalRecord>,
	) -> Result<Self, StoreError> {
		let mut map = HashMap::new();

		for record in records {
			if map.contains_key(&record.id) {
				return Err(StoreError::DuplicatePrincipal { id: record.id.to_string() });
			}

			map.insert(record.id.clone(), record);
		}

		Ok(Self(Arc::new(map)))
	}

	/// Number of known principals.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no principal can log in.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	fn lookup_now(map: &RecordMap, id: &PrincipalId) -> Option<PrincipalRecord> {
		map.get(id).cloned()
	}
}
impl IdentityStore for MemoryIdentityStore {
	fn lookup<'a>(&'a self, id: &'a PrincipalId) -> StoreFuture<'a, Option<PrincipalRecord>> {
		Box::pin(async move { Ok(Self::lookup_now(&self.0, id)) })
	}
}
