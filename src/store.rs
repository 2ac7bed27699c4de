//! Identity store contracts and built-in read-only implementations.

pub mod file;
pub mod memory;

pub use file::FileIdentityStore;
pub use memory::MemoryIdentityStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialHash, Principal, PrincipalId, Role},
};

/// Boxed future returned by [`IdentityStore`] implementations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Lookup contract consumed by the token service during login.
///
/// Records are created at bootstrap and never mutated by requests, so implementations only
/// need to serve concurrent reads.
pub trait IdentityStore
where
	Self: Send + Sync,
{
	/// Fetches the record for `id`, or `None` when the principal is unknown.
	fn lookup<'a>(&'a self, id: &'a PrincipalId) -> StoreFuture<'a, Option<PrincipalRecord>>;
}

/// Stored principal: identifier, credential hash, and role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
	/// Unique principal identifier.
	pub id: PrincipalId,
	/// Argon2 hash of the principal's password.
	pub credential_hash: CredentialHash,
	/// Role granted to the principal.
	#[serde(default)]
	pub role: Role,
}
impl PrincipalRecord {
	/// Creates a record.
	pub fn new(id: PrincipalId, credential_hash: CredentialHash, role: Role) -> Self {
		Self { id, credential_hash, role }
	}

	/// Principal view of the record (without the credential).
	pub fn principal(&self) -> Principal {
		Principal::new(self.id.clone(), self.role)
	}
}

/// Error type produced by [`IdentityStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The same principal identifier appears more than once.
	#[error("Principal `{id}` is defined more than once.")]
	DuplicatePrincipal {
		/// Repeated identifier.
		id: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::{Error, ErrorCategory};

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "identity file unreadable".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Storage(_)));
		assert_eq!(gateway_error.category(), ErrorCategory::Unavailable);
		assert!(gateway_error.to_string().contains("identity file unreadable"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn records_default_to_admin_role() {
		let json = serde_json::json!({
			"id": "admin",
			"credential_hash": "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHRzYWx0$0vC7pSPCJTQxGNEDmV1h4vX4B7HkOwF1q7qNSw7Xx8E",
		});
		let record: PrincipalRecord =
			serde_json::from_value(json).expect("Record fixture should deserialize.");

		assert_eq!(record.role, Role::Admin);
		assert_eq!(record.principal().id.as_ref(), "admin");
	}
}
