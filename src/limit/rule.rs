//! Rate rules such as `5/minute`.

// crates.io
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, error::ConfigError};

/// At most `limit` requests per `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RateLimitRule {
	/// Requests admitted per window.
	pub limit: u32,
	/// Window length.
	pub window: Duration,
}
impl RateLimitRule {
	/// Creates a rule.
	pub const fn new(limit: u32, window: Duration) -> Self {
		Self { limit, window }
	}

	/// `limit` requests per minute.
	pub const fn per_minute(limit: u32) -> Self {
		Self::new(limit, Duration::MINUTE)
	}

	/// Rejects zero limits and non-positive windows.
	pub fn validate(&self, setting: &'static str) -> Result<(), ConfigError> {
		if self.limit == 0 || !self.window.is_positive() {
			return Err(ConfigError::NonPositive { setting });
		}

		Ok(())
	}
}
impl FromStr for RateLimitRule {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ConfigError::InvalidRateRule { value: s.to_owned() };
		let (count, unit) = s.split_once('/').ok_or_else(invalid)?;
		let limit = count.trim().parse::<u32>().map_err(|_| invalid())?;
		let window = match unit.trim().to_ascii_lowercase().trim_end_matches('s') {
			"second" | "sec" => Duration::SECOND,
			"minute" | "min" => Duration::MINUTE,
			"hour" => Duration::HOUR,
			"day" => Duration::DAY,
			_ => return Err(invalid()),
		};

		Ok(Self::new(limit, window))
	}
}
impl Display for RateLimitRule {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}s", self.limit, self.window.whole_seconds())
	}
}
impl<'de> Deserialize<'de> for RateLimitRule {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			Text(String),
			Table { limit: u32, window_secs: u32 },
		}

		match Repr::deserialize(deserializer)? {
			Repr::Text(raw) => raw.parse().map_err(DeError::custom),
			Repr::Table { limit, window_secs } =>
				Ok(Self::new(limit, Duration::seconds(window_secs.into()))),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_count_per_unit_strings() {
		assert_eq!(
			"5/minute".parse::<RateLimitRule>().expect("Rule should parse."),
			RateLimitRule::per_minute(5)
		);
		assert_eq!(
			" 3 / Minutes ".parse::<RateLimitRule>().expect("Rule should parse."),
			RateLimitRule::per_minute(3)
		);
		assert_eq!(
			"100/hour".parse::<RateLimitRule>().expect("Rule should parse."),
			RateLimitRule::new(100, Duration::HOUR)
		);
		assert!("five/minute".parse::<RateLimitRule>().is_err());
		assert!("5/fortnight".parse::<RateLimitRule>().is_err());
		assert!("5".parse::<RateLimitRule>().is_err());
	}

	#[test]
	fn deserializes_from_string_or_table() {
		let text: RateLimitRule =
			serde_json::from_str("\"10/second\"").expect("String form should deserialize.");
		let table: RateLimitRule = serde_json::from_str("{\"limit\":7,\"window_secs\":30}")
			.expect("Table form should deserialize.");

		assert_eq!(text, RateLimitRule::new(10, Duration::SECOND));
		assert_eq!(table, RateLimitRule::new(7, Duration::seconds(30)));
		assert!(serde_json::from_str::<RateLimitRule>("\"oops\"").is_err());
	}

	#[test]
	fn validation_rejects_zero() {
		assert!(RateLimitRule::per_minute(0).validate("rate_limit.requests").is_err());
		assert!(RateLimitRule::new(1, Duration::ZERO).validate("rate_limit.requests").is_err());
		assert!(RateLimitRule::per_minute(1).validate("rate_limit.requests").is_ok());
	}
}
