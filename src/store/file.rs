//! File-backed [`IdentityStore`] for deployments that keep principals outside the main config.

// std
use std::{
	fs,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::PrincipalId,
	store::{IdentityStore, MemoryIdentityStore, PrincipalRecord, StoreError, StoreFuture},
};

/// Loads a JSON array of [`PrincipalRecord`]s once at startup and serves it read-only.
#[derive(Clone, Debug)]
pub struct FileIdentityStore {
	path: PathBuf,
	inner: MemoryIdentityStore,
}
impl FileIdentityStore {
	/// Opens the store at `path`, eagerly loading every record.
	///
	/// A missing or empty file yields an empty store.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();
		let records = Self::load_snapshot(&path)?;
		let inner = MemoryIdentityStore::from_records(records)?;

		Ok(Self { path, inner })
	}

	/// Path the records were loaded from.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Number of loaded principals.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` when the file held no principals.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	fn load_snapshot(path: &Path) -> Result<Vec<PrincipalRecord>, StoreError> {
		if !path.exists() {
			return Ok(Vec::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Vec::new());
		}

		let de = &mut serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(de).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner()),
		})
	}
}
impl IdentityStore for FileIdentityStore {
	fn lookup<'a>(&'a self, id: &'a PrincipalId) -> StoreFuture<'a, Option<PrincipalRecord>> {
		self.inner.lookup(id)
	}
}
