//! Secret wrappers that keep token material out of logs.

// self
use crate::_prelude::*;

/// Redacted wrapper around an issued access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// HMAC key used to sign and verify tokens; read-only after startup.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct SigningSecret(Arc<[u8]>);
impl SigningSecret {
	/// Wraps the provided key material.
	pub fn new(value: impl AsRef<[u8]>) -> Self {
		Self(Arc::from(value.as_ref()))
	}

	/// Returns the raw key bytes.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}

	/// Returns `true` if the key is empty or whitespace-only.
	pub fn is_blank(&self) -> bool {
		self.0.iter().all(u8::is_ascii_whitespace)
	}
}
impl From<String> for SigningSecret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningSecret").field(&"<redacted>").finish()
	}
}
