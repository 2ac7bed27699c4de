//! Token claim payloads and the issued-token record handed to callers.

// self
use crate::{
	_prelude::*,
	auth::{Principal, PrincipalId, Role, token::secret::TokenSecret},
};

/// Lifecycle status for a token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is currently valid.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Signed claim set embedded in every token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Principal the token speaks for.
	pub sub: PrincipalId,
	/// Role captured at issuance.
	pub role: Role,
	/// Issued-at instant (unix seconds).
	#[serde(with = "time::serde::timestamp")]
	pub iat: OffsetDateTime,
	/// Expiry instant (unix seconds); the token is invalid at and after it.
	#[serde(with = "time::serde::timestamp")]
	pub exp: OffsetDateTime,
	/// Random nonce that keeps every token's signed material unique.
	pub jti: String,
}
impl TokenClaims {
	/// Builds claims for a principal valid for `ttl` starting at `issued_at`.
	pub fn new(principal: &Principal, issued_at: OffsetDateTime, ttl: Duration) -> Self {
		// Claims carry whole seconds; truncate so round trips compare equal.
		let iat = issued_at.replace_nanosecond(0).unwrap_or(issued_at);

		Self {
			sub: principal.id.clone(),
			role: principal.role,
			iat,
			exp: iat + ttl,
			jti: format!("{:032x}", rand::random::<u128>()),
		}
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.exp {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Returns `true` if the claims have expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Principal described by the claims.
	pub fn principal(&self) -> Principal {
		Principal::new(self.sub.clone(), self.role)
	}
}

/// Token returned by a successful login.
#[derive(Clone, Serialize)]
pub struct IssuedToken {
	/// Opaque signed token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Authorization scheme, always `bearer`.
	pub token_type: &'static str,
	/// Principal the token was issued to.
	pub principal: Principal,
	/// Issued-at instant.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl IssuedToken {
	/// Scheme used in `Authorization` headers.
	pub const TOKEN_TYPE: &'static str = "bearer";

	/// Remaining lifetime relative to `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for IssuedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("principal", &self.principal)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
