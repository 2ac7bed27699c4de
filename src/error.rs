//! Gateway-level error types shared by the token service, rate limiter, and facade.

// self
use crate::{_prelude::*, auth::IdentifierError, limit::RetryDirective};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical gateway error exposed by public APIs.
///
/// Engine failures never appear here; they are recorded per resource inside
/// [`SyncResult`](crate::sync::SyncResult).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Identity could not be established.
	#[error(transparent)]
	Authentication(#[from] AuthError),
	/// Admission denied by the rate limiter.
	#[error(transparent)]
	RateLimited(#[from] RateLimitError),
	/// Request payload failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Identity store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl Error {
	/// Stable category used by the routing layer to pick a response.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::Authentication(_) => ErrorCategory::Unauthenticated,
			Self::RateLimited(_) => ErrorCategory::RateLimited,
			Self::Validation(_) => ErrorCategory::ValidationFailed,
			Self::Config(_) | Self::Storage(_) => ErrorCategory::Unavailable,
		}
	}

	/// Retry hint carried by rate-limit rejections.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::RateLimited(RateLimitError::Exceeded { directive, .. }) =>
				Some(directive.retry_after),
			_ => None,
		}
	}
}

/// Distinct, stable status signals surfaced to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	/// Re-authenticate (bad credentials or token).
	Unauthenticated,
	/// Retry after the advertised delay.
	RateLimited,
	/// Fix the request; retrying unchanged will fail again.
	ValidationFailed,
	/// Gateway misconfiguration or backing store outage.
	Unavailable,
}
impl ErrorCategory {
	/// HTTP status code conventionally paired with the category.
	pub const fn status_code(self) -> u16 {
		match self {
			Self::Unauthenticated => 401,
			Self::RateLimited => 429,
			Self::ValidationFailed => 400,
			Self::Unavailable => 503,
		}
	}

	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unauthenticated => "unauthenticated",
			Self::RateLimited => "rate_limited",
			Self::ValidationFailed => "validation_failed",
			Self::Unavailable => "unavailable",
		}
	}
}
impl Display for ErrorCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Identity and token failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// Unknown principal or wrong password; the two are not distinguished.
	#[error("Invalid credentials.")]
	InvalidCredential,
	/// No bearer token was supplied.
	#[error("Missing bearer token.")]
	MissingToken,
	/// Token could not be parsed.
	#[error("Token is malformed.")]
	TokenMalformed,
	/// Token signature does not match the service secret.
	#[error("Token signature is invalid.")]
	TokenInvalidSignature,
	/// Token is authentic but past its expiry.
	#[error("Token expired at {expired_at}.")]
	TokenExpired {
		/// Instant the token stopped being valid.
		expired_at: OffsetDateTime,
	},
}
impl AuthError {
	/// Returns `true` when a fresh login resolves the failure.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::TokenExpired { .. } | Self::MissingToken)
	}
}

/// Admission failures raised by a [`RateLimitPolicy`](crate::limit::RateLimitPolicy).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RateLimitError {
	/// The principal spent its budget for the current window.
	#[error("Rate limit of {limit} requests exceeded for `{key}`; retry in {}s.", .directive.retry_after.whole_seconds())]
	Exceeded {
		/// Limiter key (principal identifier or calling client).
		key: String,
		/// Configured per-window limit.
		limit: u32,
		/// When the caller may try again.
		directive: RetryDirective,
	},
}

/// Request payload validation failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// The resource list was empty.
	#[error("At least one table must be requested.")]
	EmptyResources,
	/// A resource name failed validation.
	#[error("Invalid table name `{name}`: {source}")]
	InvalidResource {
		/// Offending name as supplied.
		name: String,
		/// Underlying validation failure.
		#[source]
		source: IdentifierError,
	},
	/// The payload did not match the expected shape.
	#[error("Invalid payload at `{path}`: {message}.")]
	Payload {
		/// Path of the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
}

/// Configuration and bootstrap failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Token signing secret is absent or blank.
	#[error("Token signing secret is required.")]
	MissingSecret,
	/// A numeric setting must be positive.
	#[error("Setting `{setting}` must be greater than zero.")]
	NonPositive {
		/// Setting name.
		setting: &'static str,
	},
	/// A rate rule string could not be parsed.
	#[error("Rate rule `{value}` is invalid; expected `<count>/<second|minute|hour|day>`.")]
	InvalidRateRule {
		/// Raw rule string.
		value: String,
	},
	/// A configured identifier or table name is invalid.
	#[error("Configured identifier is invalid.")]
	InvalidIdentifier(#[from] IdentifierError),
	/// A configured credential hash could not be parsed or produced.
	#[error("Credential for principal `{principal}` is invalid: {reason}.")]
	InvalidCredential {
		/// Principal the credential belongs to.
		principal: String,
		/// Hashing library message.
		reason: String,
	},
	/// A principal entry carries neither a hash nor a password.
	#[error("Principal `{principal}` has no credential configured.")]
	MissingCredential {
		/// Principal identifier.
		principal: String,
	},
	/// The engine base URL cannot be parsed.
	#[error("Engine URL is invalid.")]
	InvalidEngineUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Engine binding names a transport that is not compiled in.
	#[error("Engine binding `{binding}` is not available in this build.")]
	EngineUnavailable {
		/// Binding label.
		binding: &'static str,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: Box<dyn StdError + Send + Sync>,
	},
	/// Both an identity file and inline principals were configured.
	#[error("Configure either `identity_file` or `principals`, not both.")]
	ConflictingIdentitySources,
	/// Configuration document could not be parsed.
	#[error("Configuration is invalid at `{path}`: {message}.")]
	Parse {
		/// Path of the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
	/// Configuration file could not be read.
	#[error("Configuration file could not be read.")]
	Io(#[from] std::io::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn categories_map_to_distinct_status_codes() {
		let codes = [
			ErrorCategory::Unauthenticated,
			ErrorCategory::RateLimited,
			ErrorCategory::ValidationFailed,
			ErrorCategory::Unavailable,
		]
		.map(ErrorCategory::status_code);

		assert_eq!(codes, [401, 429, 400, 503]);
	}

	#[test]
	fn rate_limit_errors_expose_retry_hint() {
		let now = OffsetDateTime::UNIX_EPOCH;
		let err: Error = RateLimitError::Exceeded {
			key: "admin".into(),
			limit: 5,
			directive: RetryDirective::new(now + Duration::seconds(12), Duration::seconds(12)),
		}
		.into();

		assert_eq!(err.category(), ErrorCategory::RateLimited);
		assert_eq!(err.retry_after(), Some(Duration::seconds(12)));
		assert!(err.to_string().contains("retry in 12s"));
	}

	#[test]
	fn expired_tokens_ask_for_login_but_forgeries_do_not() {
		assert!(AuthError::TokenExpired { expired_at: OffsetDateTime::UNIX_EPOCH }.requires_login());
		assert!(!AuthError::TokenInvalidSignature.requires_login());
		assert!(!AuthError::TokenMalformed.requires_login());
	}
}
