//! Token issuance and verification.
//!
//! Tokens are two base64url (no padding) segments joined by `.`: the JSON-encoded
//! [`TokenClaims`] and an HMAC-SHA256 tag over the first segment. The signing key is the
//! only state and is read-only after construction, so a single [`TokenService`] can be
//! shared across every request task.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{
		Password, Principal, PrincipalId,
		token::{
			claims::{IssuedToken, TokenClaims},
			secret::{SigningSecret, TokenSecret},
		},
	},
	error::{AuthError, ConfigError},
	store::IdentityStore,
};

type HmacSha256 = Hmac<Sha256>;

/// Outcome of verifying a presented token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenVerdict {
	/// Signature verified and the token is unexpired.
	Valid(Principal),
	/// Signature verified but the expiry has passed.
	Expired {
		/// Instant the token stopped being valid.
		expired_at: OffsetDateTime,
	},
	/// The token is not in the expected shape.
	Malformed,
	/// The signature does not match the service secret.
	BadSignature,
}
impl TokenVerdict {
	/// Converts the verdict into a result so callers can use `?`.
	pub fn into_result(self) -> Result<Principal, AuthError> {
		match self {
			Self::Valid(principal) => Ok(principal),
			Self::Expired { expired_at } => Err(AuthError::TokenExpired { expired_at }),
			Self::Malformed => Err(AuthError::TokenMalformed),
			Self::BadSignature => Err(AuthError::TokenInvalidSignature),
		}
	}

	/// Returns `true` for [`TokenVerdict::Valid`].
	pub fn is_valid(&self) -> bool {
		matches!(self, Self::Valid(_))
	}
}

/// Issues and verifies signed, time-bounded tokens.
#[derive(Clone)]
pub struct TokenService {
	mac: HmacSha256,
	ttl: Duration,
	identities: Arc<dyn IdentityStore>,
}
impl TokenService {
	/// Lifetime applied when none is configured.
	pub const DEFAULT_TTL: Duration = Duration::hours(8);

	/// Creates a service signing with `secret` and authenticating against `identities`.
	pub fn new(
		secret: &SigningSecret,
		identities: Arc<dyn IdentityStore>,
	) -> Result<Self, ConfigError> {
		if secret.is_blank() {
			return Err(ConfigError::MissingSecret);
		}

		let mac = HmacSha256::new_from_slice(secret.expose())
			.map_err(|_| ConfigError::MissingSecret)?;

		Ok(Self { mac, ttl: Self::DEFAULT_TTL, identities })
	}

	/// Overrides the token lifetime.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Configured token lifetime.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Authenticates `principal_id` with `credential` and issues a token valid from now.
	pub async fn issue(
		&self,
		principal_id: &PrincipalId,
		credential: &Password,
	) -> Result<IssuedToken> {
		self.issue_at(principal_id, credential, OffsetDateTime::now_utc()).await
	}

	/// Same as [`issue`](Self::issue) with an explicit issuance instant.
	///
	/// Unknown principals and wrong passwords both fail with
	/// [`AuthError::InvalidCredential`].
	pub async fn issue_at(
		&self,
		principal_id: &PrincipalId,
		credential: &Password,
		now: OffsetDateTime,
	) -> Result<IssuedToken> {
		let record = <dyn IdentityStore>::lookup(self.identities.as_ref(), principal_id)
			.await?
			.filter(|record| record.credential_hash.verify(credential))
			.ok_or(AuthError::InvalidCredential)?;

		Ok(self.mint_at(&record.principal(), now))
	}

	/// Signs a token for an already-authenticated principal.
	pub fn mint_at(&self, principal: &Principal, now: OffsetDateTime) -> IssuedToken {
		let claims = TokenClaims::new(principal, now, self.ttl);
		let access_token = self.sign(&claims);

		IssuedToken {
			access_token,
			token_type: IssuedToken::TOKEN_TYPE,
			principal: principal.clone(),
			issued_at: claims.iat,
			expires_at: claims.exp,
		}
	}

	/// Verifies `token` against the current clock.
	pub fn verify(&self, token: &str) -> TokenVerdict {
		self.verify_at(token, OffsetDateTime::now_utc())
	}

	/// Verifies `token` at `now`.
	///
	/// The signature is checked before the expiry, so a tampered token is reported as
	/// [`TokenVerdict::BadSignature`] even when its claims have lapsed.
	pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> TokenVerdict {
		let Some((payload, signature)) = token.trim().split_once('.') else {
			return TokenVerdict::Malformed;
		};
		let Ok(tag) = URL_SAFE_NO_PAD.decode(signature) else {
			return TokenVerdict::Malformed;
		};
		let mut mac = self.mac.clone();

		mac.update(payload.as_bytes());

		if mac.verify_slice(&tag).is_err() {
			return TokenVerdict::BadSignature;
		}

		let Some(claims) = URL_SAFE_NO_PAD
			.decode(payload)
			.ok()
			.and_then(|bytes| serde_json::from_slice::<TokenClaims>(&bytes).ok())
		else {
			return TokenVerdict::Malformed;
		};

		if claims.is_expired_at(now) {
			return TokenVerdict::Expired { expired_at: claims.exp };
		}

		TokenVerdict::Valid(claims.principal())
	}

	fn sign(&self, claims: &TokenClaims) -> TokenSecret {
		// Serializing plain strings, enums, and integers cannot fail.
		let json = serde_json::to_vec(claims).unwrap_or_default();
		let payload = URL_SAFE_NO_PAD.encode(json);
		let mut mac = self.mac.clone();

		mac.update(payload.as_bytes());

		let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

		TokenSecret::new(format!("{payload}.{tag}"))
	}
}
impl Debug for TokenService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenService").field("ttl", &self.ttl).finish()
	}
}

/// Extracts the token from an `Authorization` header value (`Bearer <token>`).
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
	let header = header.map(str::trim).filter(|value| !value.is_empty());
	let Some(header) = header else {
		return Err(AuthError::MissingToken);
	};
	let Some((scheme, token)) = header.split_once(' ') else {
		return Err(AuthError::TokenMalformed);
	};

	if !scheme.eq_ignore_ascii_case("bearer") {
		return Err(AuthError::TokenMalformed);
	}

	let token = token.trim();

	if token.is_empty() {
		return Err(AuthError::MissingToken);
	}

	Ok(token)
}
