//! Startup configuration: a JSON document plus environment overrides.
//!
//! Every section is optional except the signing secret. Environment variables are applied
//! on top of the document by [`GatewayConfig::apply_env`], then [`GatewayConfig::validate`]
//! runs once before the gateway is wired.

// std
use std::{
	env,
	path::{Path, PathBuf},
	time::Duration as StdDuration,
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialHash, HashCost, Password, PrincipalId, Role, SigningSecret},
	dispatch::DispatchOptions,
	engine::EngineBinding,
	error::ConfigError,
	limit::RateLimitRule,
	store::PrincipalRecord,
	whitelist::Whitelist,
};

/// Signing secret for tokens.
pub const ENV_SECRET: &str = "JWT_SECRET";
/// Token lifetime in hours.
pub const ENV_TTL_HOURS: &str = "ACCESS_TOKEN_EXPIRE_HOURS";
/// Login rate rule (`N/unit`).
pub const ENV_RATE_LIMIT_LOGIN: &str = "RATE_LIMIT_LOGIN";
/// Authenticated request rate rule (`N/unit`).
pub const ENV_RATE_LIMIT_SYNC: &str = "RATE_LIMIT_SYNC";
/// Whitelisted tables (JSON list, CSV, or blank).
pub const ENV_ALLOWED_TABLES: &str = "ALLOWED_TABLES";
/// Engine binding (`mock` or a base URL).
pub const ENV_ENGINE: &str = "DATASYNC_ENGINE";
/// Bootstrap admin username.
pub const ENV_ADMIN_USERNAME: &str = "ADMIN_USERNAME";
/// Bootstrap admin Argon2 PHC hash.
pub const ENV_ADMIN_PASSWORD_HASH: &str = "ADMIN_PASSWORD_HASH";
/// Bootstrap admin plain password, hashed at startup.
pub const ENV_ADMIN_PASSWORD_PLAIN: &str = "ADMIN_PASSWORD_PLAIN";

const DEFAULT_ADMIN: &str = "admin";

/// Complete gateway configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatewayConfig {
	/// Token signing settings.
	#[serde(default)]
	pub token: TokenSettings,
	/// Login and request rate rules.
	#[serde(default)]
	pub rate_limit: RateLimitSettings,
	/// Tables eligible for synchronization; empty admits nothing.
	#[serde(default)]
	pub whitelist: Whitelist,
	/// Engine binding selected at startup.
	#[serde(default)]
	pub engine: EngineBinding,
	/// Engine call tuning.
	#[serde(default)]
	pub dispatch: DispatchSettings,
	/// Inline principals bootstrapped into a memory identity store.
	#[serde(default)]
	pub principals: Vec<PrincipalEntry>,
	/// JSON file of principal records, used instead of `principals`.
	#[serde(default)]
	pub identity_file: Option<PathBuf>,
}
impl GatewayConfig {
	/// Parses a JSON document, reporting the path of the first offending field.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de).map_err(|e| {
			let path = e.path().to_string();

			ConfigError::Parse { path, message: e.into_inner().to_string() }
		})
	}

	/// Reads and parses a JSON file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		Self::from_json_str(&std::fs::read_to_string(path)?)
	}

	/// Builds a configuration purely from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut config = Self::default();

		config.apply_env()?;

		Ok(config)
	}

	/// Applies overrides from the process environment.
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_env_vars(env::vars())
	}

	/// Applies overrides from an explicit variable set.
	pub fn apply_env_vars<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let vars =
			vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect::<HashMap<String, String>>();
		let get = |key: &str| vars.get(key).map(String::as_str);

		if let Some(secret) = get(ENV_SECRET) {
			self.token.secret = Some(SigningSecret::new(secret));
		}
		if let Some(hours) = get(ENV_TTL_HOURS) {
			self.token.ttl_hours = hours.trim().parse().map_err(|e: std::num::ParseIntError| {
				ConfigError::Parse { path: ENV_TTL_HOURS.into(), message: e.to_string() }
			})?;
		}
		if let Some(rule) = get(ENV_RATE_LIMIT_LOGIN) {
			self.rate_limit.login = rule.parse()?;
		}
		if let Some(rule) = get(ENV_RATE_LIMIT_SYNC) {
			self.rate_limit.requests = rule.parse()?;
		}
		if let Some(tables) = get(ENV_ALLOWED_TABLES) {
			self.whitelist = Whitelist::parse_list(tables).map_err(|e| ConfigError::Parse {
				path: ENV_ALLOWED_TABLES.into(),
				message: e.to_string(),
			})?;
		}
		if let Some(engine) = get(ENV_ENGINE) {
			self.engine = EngineBinding::parse(engine)?;
		}

		let hash = get(ENV_ADMIN_PASSWORD_HASH).filter(|v| !v.trim().is_empty());
		let plain = get(ENV_ADMIN_PASSWORD_PLAIN).filter(|v| !v.is_empty());
		let username = get(ENV_ADMIN_USERNAME).map(str::trim).filter(|v| !v.is_empty());

		if username.is_some() || hash.is_some() || plain.is_some() {
			let id = PrincipalId::new(username.unwrap_or(DEFAULT_ADMIN))?;
			let credential_hash = hash
				.map(|raw| {
					CredentialHash::parse(raw.trim()).map_err(|e| ConfigError::InvalidCredential {
						principal: id.to_string(),
						reason: e.to_string(),
					})
				})
				.transpose()?;
			let entry = PrincipalEntry {
				id,
				credential_hash,
				password: plain.map(Password::new),
				role: Role::Admin,
			};

			self.principals.retain(|existing| existing.id != entry.id);
			self.principals.push(entry);
		}

		Ok(())
	}

	/// Checks every setting that can be checked without touching the network.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.signing_secret()?;

		if self.token.ttl_hours == 0 {
			return Err(ConfigError::NonPositive { setting: "token.ttl_hours" });
		}

		self.rate_limit.login.validate("rate_limit.login")?;
		self.rate_limit.requests.validate("rate_limit.requests")?;
		self.dispatch.options().validate()?;

		if self.identity_file.is_some() && !self.principals.is_empty() {
			return Err(ConfigError::ConflictingIdentitySources);
		}

		for entry in &self.principals {
			if entry.credential_hash.is_none() && entry.password.is_none() {
				return Err(ConfigError::MissingCredential { principal: entry.id.to_string() });
			}
		}

		Ok(())
	}

	/// Signing secret, rejecting an absent or blank one.
	pub fn signing_secret(&self) -> Result<&SigningSecret, ConfigError> {
		self.token
			.secret
			.as_ref()
			.filter(|secret| !secret.is_blank())
			.ok_or(ConfigError::MissingSecret)
	}

	/// Converts inline principals into records with the default hashing cost.
	pub fn principal_records(&self) -> Result<Vec<PrincipalRecord>, ConfigError> {
		self.principal_records_with(HashCost::default())
	}

	/// Converts inline principals into records, hashing plain passwords with `cost`.
	///
	/// Plain passwords are dropped once hashed; only the hash reaches the store.
	pub fn principal_records_with(
		&self,
		cost: HashCost,
	) -> Result<Vec<PrincipalRecord>, ConfigError> {
		self.principals.iter().map(|entry| entry.to_record(cost)).collect()
	}
}

/// Token settings.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenSettings {
	/// HMAC signing secret; required.
	#[serde(default)]
	pub secret: Option<SigningSecret>,
	/// Token lifetime in hours.
	#[serde(default = "TokenSettings::default_ttl_hours")]
	pub ttl_hours: u32,
}
impl TokenSettings {
	fn default_ttl_hours() -> u32 {
		8
	}

	/// Token lifetime.
	pub fn ttl(&self) -> Duration {
		Duration::hours(self.ttl_hours.into())
	}
}
impl Default for TokenSettings {
	fn default() -> Self {
		Self { secret: None, ttl_hours: Self::default_ttl_hours() }
	}
}

/// Rate rules for the two limiters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct RateLimitSettings {
	/// Login attempts, keyed by the calling client.
	#[serde(default = "RateLimitSettings::default_login")]
	pub login: RateLimitRule,
	/// Authenticated status and sync calls, keyed by the verified principal.
	#[serde(default = "RateLimitSettings::default_requests")]
	pub requests: RateLimitRule,
}
impl RateLimitSettings {
	fn default_login() -> RateLimitRule {
		RateLimitRule::per_minute(3)
	}

	fn default_requests() -> RateLimitRule {
		RateLimitRule::per_minute(5)
	}
}
impl Default for RateLimitSettings {
	fn default() -> Self {
		Self { login: Self::default_login(), requests: Self::default_requests() }
	}
}

/// Engine call tuning as written in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct DispatchSettings {
	/// Per-request engine call parallelism.
	#[serde(default = "DispatchSettings::default_max_concurrency")]
	pub max_concurrency: usize,
	/// Per-resource deadline in seconds.
	#[serde(default = "DispatchSettings::default_resource_timeout_secs")]
	pub resource_timeout_secs: u64,
}
impl DispatchSettings {
	fn default_max_concurrency() -> usize {
		4
	}

	fn default_resource_timeout_secs() -> u64 {
		30
	}

	/// Runtime options.
	pub fn options(&self) -> DispatchOptions {
		DispatchOptions {
			max_concurrency: self.max_concurrency,
			resource_timeout: StdDuration::from_secs(self.resource_timeout_secs),
		}
	}
}
impl Default for DispatchSettings {
	fn default() -> Self {
		Self {
			max_concurrency: Self::default_max_concurrency(),
			resource_timeout_secs: Self::default_resource_timeout_secs(),
		}
	}
}

/// Principal declared in configuration.
///
/// Exactly one of `credential_hash` or `password` is expected; when both are present the
/// hash wins.
#[derive(Clone, Debug, Deserialize)]
pub struct PrincipalEntry {
	/// Username.
	pub id: PrincipalId,
	/// Argon2 PHC hash.
	#[serde(default)]
	pub credential_hash: Option<CredentialHash>,
	/// Plain password, hashed at bootstrap.
	#[serde(default)]
	pub password: Option<Password>,
	/// Granted role.
	#[serde(default)]
	pub role: Role,
}
impl PrincipalEntry {
	fn to_record(&self, cost: HashCost) -> Result<PrincipalRecord, ConfigError> {
		let credential_hash = match (&self.credential_hash, &self.password) {
			(Some(hash), _) => hash.clone(),
			(None, Some(password)) => CredentialHash::derive_with(password, cost).map_err(|e| {
				ConfigError::InvalidCredential { principal: self.id.to_string(), reason: e.to_string() }
			})?,
			(None, None) =>
				return Err(ConfigError::MissingCredential { principal: self.id.to_string() }),
		};

		Ok(PrincipalRecord::new(self.id.clone(), credential_hash, self.role))
	}
}
