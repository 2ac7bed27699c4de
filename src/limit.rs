//! Per-principal admission control.
//!
//! [`FixedWindowLimiter`] keeps one counter per key behind its own lock. Known keys are
//! fetched under a shared read lock; the map is only write-locked to insert a new key, so
//! keys never contend with each other while a window decision is being made.

pub mod rule;

pub use rule::*;

// self
use crate::{_prelude::*, error::RateLimitError};

/// Policy consulted before a request is processed.
pub trait RateLimitPolicy
where
	Self: Send + Sync,
{
	/// Admits or rejects the next request for `key` at `now`.
	fn admit_at(&self, key: &str, now: OffsetDateTime) -> Result<Admission, RateLimitError>;

	/// Admits or rejects the next request for `key` against the current clock.
	fn admit(&self, key: &str) -> Result<Admission, RateLimitError> {
		self.admit_at(key, OffsetDateTime::now_utc())
	}
}

/// Successful admission details.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
	/// Requests admitted in the current window, including this one.
	pub count: u32,
	/// Requests still available in the current window.
	pub remaining: u32,
	/// Instant the current window closes.
	pub resets_at: OffsetDateTime,
}

/// Advises callers when to retry after a rejection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Delay from the rejection until `earliest_retry_at`.
	pub retry_after: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, retry_after: Duration) -> Self {
		Self { earliest_retry_at, retry_after, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}
}

#[derive(Debug)]
struct RateWindowCounter {
	window_start: OffsetDateTime,
	count: u32,
}

#[derive(Debug)]
struct CounterMap {
	entries: HashMap<String, Arc<Mutex<RateWindowCounter>>>,
	// Map size that triggers the next prune scan when a new key arrives.
	prune_watermark: usize,
}

/// Fixed-window limiter admitting at most `rule.limit` requests per key per window.
#[derive(Debug)]
pub struct FixedWindowLimiter {
	rule: RateLimitRule,
	counters: RwLock<CounterMap>,
}
impl FixedWindowLimiter {
	const PRUNE_THRESHOLD: usize = 1024;

	/// Creates a limiter enforcing `rule`.
	pub fn new(rule: RateLimitRule) -> Self {
		let counters =
			CounterMap { entries: HashMap::new(), prune_watermark: Self::PRUNE_THRESHOLD };

		Self { rule, counters: RwLock::new(counters) }
	}

	/// Rule enforced by this limiter.
	pub fn rule(&self) -> RateLimitRule {
		self.rule
	}

	/// Number of keys currently tracked.
	pub fn tracked_keys(&self) -> usize {
		self.counters.read().entries.len()
	}

	/// Drops counters whose window has elapsed and that no request is holding.
	pub fn prune_at(&self, now: OffsetDateTime) -> usize {
		let mut counters = self.counters.write();

		prune_entries(&mut counters.entries, self.rule.window, now)
	}

	fn counter(&self, key: &str, now: OffsetDateTime) -> Arc<Mutex<RateWindowCounter>> {
		let existing = self.counters.read().entries.get(key).cloned();

		if let Some(counter) = existing {
			return counter;
		}

		let mut counters = self.counters.write();

		if let Some(counter) = counters.entries.get(key) {
			return counter.clone();
		}
		if counters.entries.len() >= counters.prune_watermark {
			prune_entries(&mut counters.entries, self.rule.window, now);

			// Live keys survive the scan; wait for the map to double before scanning again.
			counters.prune_watermark = (counters.entries.len() * 2).max(Self::PRUNE_THRESHOLD);
		}

		let counter = Arc::new(Mutex::new(RateWindowCounter { window_start: now, count: 0 }));

		counters.entries.insert(key.to_owned(), counter.clone());

		counter
	}
}
impl RateLimitPolicy for FixedWindowLimiter {
	fn admit_at(&self, key: &str, now: OffsetDateTime) -> Result<Admission, RateLimitError> {
		let RateLimitRule { limit, window } = self.rule;
		let counter = self.counter(key, now);
		let mut state = counter.lock();

		if now >= state.window_start + window {
			state.window_start = now;
			state.count = 0;
		}

		let resets_at = state.window_start + window;

		if state.count >= limit {
			let retry_after = resets_at - now;

			return Err(RateLimitError::Exceeded {
				key: key.to_owned(),
				limit,
				directive: RetryDirective::new(resets_at, retry_after)
					.with_reason(format!("{limit} requests per {}s", window.whole_seconds())),
			});
		}

		state.count += 1;

		Ok(Admission { count: state.count, remaining: limit - state.count, resets_at })
	}
}

fn prune_entries(
	entries: &mut HashMap<String, Arc<Mutex<RateWindowCounter>>>,
	window: Duration,
	now: OffsetDateTime,
) -> usize {
	let before = entries.len();

	entries.retain(|_, counter| {
		// The write lock is held, so nobody can clone the handle meanwhile.
		if Arc::strong_count(counter) > 1 {
			return true;
		}

		match counter.try_lock() {
			Some(state) => now < state.window_start + window,
			None => true,
		}
	});

	before - entries.len()
}

#[cfg(test)]
mod tests {
	// std
	use std::thread;
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn limiter(limit: u32) -> FixedWindowLimiter {
		FixedWindowLimiter::new(RateLimitRule::new(limit, Duration::seconds(60)))
	}

	#[test]
	fn limit_plus_one_is_rejected_then_window_resets() {
		let limiter = limiter(3);
		let start = macros::datetime!(2025-03-01 10:00 UTC);

		for expected in 1..=3 {
			let admission = limiter
				.admit_at("admin", start + Duration::seconds((expected - 1).into()))
				.expect("Requests within the limit should be admitted.");

			assert_eq!(admission.count, expected);
			assert_eq!(admission.remaining, 3 - expected);
		}

		let err = limiter
			.admit_at("admin", start + Duration::seconds(20))
			.expect_err("The fourth request must be rejected.");
		let RateLimitError::Exceeded { limit, directive, .. } = err;

		assert_eq!(limit, 3);
		assert_eq!(directive.retry_after, Duration::seconds(40));
		assert_eq!(directive.earliest_retry_at, start + Duration::seconds(60));

		let fresh = limiter
			.admit_at("admin", start + Duration::seconds(60))
			.expect("A new window should admit again.");

		assert_eq!(fresh.count, 1);
		assert_eq!(fresh.resets_at, start + Duration::seconds(120));
	}

	#[test]
	fn rejections_do_not_extend_the_window_or_count() {
		let limiter = limiter(1);
		let start = macros::datetime!(2025-03-01 10:00 UTC);

		limiter.admit_at("admin", start).expect("First request should be admitted.");

		for offset in [1, 10, 59] {
			let RateLimitError::Exceeded { directive, .. } = limiter
				.admit_at("admin", start + Duration::seconds(offset))
				.expect_err("Requests past the limit must be rejected.");

			assert_eq!(directive.retry_after, Duration::seconds(60 - offset));
		}

		assert!(limiter.admit_at("admin", start + Duration::seconds(60)).is_ok());
	}

	#[test]
	fn principals_have_independent_budgets() {
		let limiter = limiter(1);
		let now = macros::datetime!(2025-03-01 10:00 UTC);

		assert!(limiter.admit_at("alice", now).is_ok());
		assert!(limiter.admit_at("bob", now).is_ok());
		assert!(limiter.admit_at("alice", now).is_err());
		assert_eq!(limiter.tracked_keys(), 2);
	}

	#[test]
	fn concurrent_requests_never_exceed_the_limit() {
		let limiter = limiter(5);
		let now = macros::datetime!(2025-03-01 10:00 UTC);
		let admitted = thread::scope(|scope| {
			let handles = (0..32)
				.map(|_| scope.spawn(|| limiter.admit_at("admin", now).is_ok()))
				.collect::<Vec<_>>();

			handles
				.into_iter()
				.map(|handle| handle.join().expect("Limiter thread should not panic."))
				.filter(|ok| *ok)
				.count()
		});

		assert_eq!(admitted, 5);
	}

	#[test]
	fn prune_drops_only_elapsed_windows() {
		let limiter = limiter(2);
		let start = macros::datetime!(2025-03-01 10:00 UTC);

		limiter.admit_at("stale", start).expect("Stale key should be admitted.");
		limiter
			.admit_at("fresh", start + Duration::seconds(50))
			.expect("Fresh key should be admitted.");

		assert_eq!(limiter.prune_at(start + Duration::seconds(61)), 1);
		assert_eq!(limiter.tracked_keys(), 1);
	}

	#[test]
	fn existing_keys_reuse_their_counter() {
		let limiter = limiter(2);
		let now = macros::datetime!(2025-03-01 10:00 UTC);

		limiter.admit_at("admin", now).expect("First request should be admitted.");

		let second = limiter.admit_at("admin", now).expect("Second request should be admitted.");

		assert_eq!(second.count, 2);
		assert_eq!(limiter.tracked_keys(), 1);
	}

	#[test]
	fn crossing_the_threshold_prunes_elapsed_windows() {
		let limiter = limiter(1);
		let start = macros::datetime!(2025-03-01 10:00 UTC);

		for i in 0..FixedWindowLimiter::PRUNE_THRESHOLD {
			limiter.admit_at(&format!("client-{i}"), start).expect("Fresh keys should be admitted.");
		}

		limiter
			.admit_at("late", start + Duration::seconds(60))
			.expect("A new key should be admitted.");

		assert_eq!(limiter.tracked_keys(), 1);
	}

	#[test]
	fn live_keys_defer_the_next_prune_scan() {
		let limiter = limiter(1);
		let start = macros::datetime!(2025-03-01 10:00 UTC);
		let threshold = FixedWindowLimiter::PRUNE_THRESHOLD;

		for i in 0..threshold {
			limiter.admit_at(&format!("client-{i}"), start).expect("Fresh keys should be admitted.");
		}

		// Every window is still open, so the scan drops nothing.
		limiter.admit_at("early", start + Duration::seconds(1)).expect("Key should be admitted.");

		assert_eq!(limiter.tracked_keys(), threshold + 1);

		// The watermark doubled, so elapsed windows linger until an explicit prune.
		limiter.admit_at("late", start + Duration::seconds(61)).expect("Key should be admitted.");

		assert_eq!(limiter.tracked_keys(), threshold + 2);
		assert_eq!(limiter.prune_at(start + Duration::seconds(61)), threshold + 1);
		assert_eq!(limiter.tracked_keys(), 1);
	}
}
