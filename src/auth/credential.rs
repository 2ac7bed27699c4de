//! Password wrappers and Argon2id credential hashes.

// crates.io
use argon2::{
	Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
	password_hash::{Error as HashError, SaltString},
};
// self
use crate::_prelude::*;

/// Plain-text password supplied at login; redacted in every formatter.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct Password(String);
impl Password {
	/// Wraps a password string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner password. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for Password {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Password").field(&"<redacted>").finish()
	}
}
impl From<&str> for Password {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for Password {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

/// Argon2 cost parameters used when deriving a new [`CredentialHash`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashCost {
	/// Memory cost in KiB.
	pub memory_kib: u32,
	/// Iteration count.
	pub iterations: u32,
	/// Degree of parallelism.
	pub lanes: u32,
}
impl HashCost {
	/// Cheapest parameters argon2 accepts; only suitable for fixtures.
	pub const MINIMAL: Self = Self { memory_kib: 8, iterations: 1, lanes: 1 };
}
impl Default for HashCost {
	fn default() -> Self {
		Self {
			memory_kib: Params::DEFAULT_M_COST,
			iterations: Params::DEFAULT_T_COST,
			lanes: Params::DEFAULT_P_COST,
		}
	}
}

/// Argon2 PHC-format credential hash.
///
/// Verification parameters are read back from the PHC string, so hashes derived with
/// different [`HashCost`] values verify side by side.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialHash(String);
impl CredentialHash {
	/// Parses an existing PHC string.
	pub fn parse(value: impl Into<String>) -> Result<Self, HashError> {
		let value = value.into();

		PasswordHash::new(&value)?;

		Ok(Self(value))
	}

	/// Derives a fresh hash with the default Argon2id cost.
	pub fn derive(password: &Password) -> Result<Self, HashError> {
		Self::derive_with(password, HashCost::default())
	}

	/// Derives a fresh hash with explicit cost parameters.
	pub fn derive_with(password: &Password, cost: HashCost) -> Result<Self, HashError> {
		let params = Params::new(cost.memory_kib, cost.iterations, cost.lanes, None)?;
		let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
		let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())?;
		let hash = hasher.hash_password(password.expose().as_bytes(), &salt)?;

		Ok(Self(hash.to_string()))
	}

	/// Checks the password against the hash; the digest comparison is constant-time.
	pub fn verify(&self, password: &Password) -> bool {
		let Ok(parsed) = PasswordHash::new(&self.0) else {
			return false;
		};

		Argon2::default().verify_password(password.expose().as_bytes(), &parsed).is_ok()
	}

	/// Returns the PHC string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl TryFrom<String> for CredentialHash {
	type Error = HashError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}
impl From<CredentialHash> for String {
	fn from(value: CredentialHash) -> Self {
		value.0
	}
}
impl Debug for CredentialHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("CredentialHash").field(&"<redacted>").finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn derived_hash_verifies_only_the_original_password() {
		let password = Password::new("adminadmin");
		let hash = CredentialHash::derive_with(&password, HashCost::MINIMAL)
			.expect("Hash derivation should succeed with minimal cost.");

		assert!(hash.as_str().starts_with("$argon2id$"));
		assert!(hash.verify(&password));
		assert!(!hash.verify(&Password::new("adminadmin ")));
		assert!(!hash.verify(&Password::new("")));
	}

	#[test]
	fn salts_differ_between_derivations() {
		let password = Password::new("same");
		let lhs = CredentialHash::derive_with(&password, HashCost::MINIMAL)
			.expect("First derivation should succeed.");
		let rhs = CredentialHash::derive_with(&password, HashCost::MINIMAL)
			.expect("Second derivation should succeed.");

		assert_ne!(lhs, rhs);
		assert!(lhs.verify(&password) && rhs.verify(&password));
	}

	#[test]
	fn parse_rejects_non_phc_strings() {
		assert!(CredentialHash::parse("adminadmin").is_err());
		assert!(serde_json::from_str::<CredentialHash>("\"plain-text\"").is_err());
	}

	#[test]
	fn formatters_redact() {
		let password = Password::new("super-secret");
		let hash = CredentialHash::derive_with(&password, HashCost::MINIMAL)
			.expect("Hash derivation should succeed with minimal cost.");

		assert_eq!(format!("{password:?}"), "Password(\"<redacted>\")");
		assert_eq!(format!("{hash:?}"), "CredentialHash(\"<redacted>\")");
	}
}
