//! Demonstrates the request-shaping utilities: a TTL cache absorbing repeated lookups and a
//! fixed-window limiter rejecting a burst with retry-after metadata.

// crates.io
use color_eyre::Result;
use time::Duration;
// self
use session_warden::{
	auth::ClientId,
	cache::{CacheConfig, MemoryCache},
	limit::{FixedWindowLimiter, RateLimitDecision, WindowPolicy},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let cache = MemoryCache::new(CacheConfig::new());

	// First lookup misses and fills; the rest are served from cache.
	for _ in 0..4 {
		if cache.get("profile:42").is_none() {
			cache.set("profile:42", "{\"name\":\"Demo User\"}".to_string());
		}
	}

	let stats = cache.stats();

	println!(
		"Cache: {} hits, {} misses, {} entries, {:.0}% hit rate.",
		stats.hits, stats.misses, stats.total_entries, stats.hit_rate
	);

	let limiter = FixedWindowLimiter::new(WindowPolicy::new(3, Duration::minutes(15)));
	let client = ClientId::new("203.0.113.9")?;

	for attempt in 1..=5 {
		match limiter.check(&client) {
			RateLimitDecision::Allow(quota) =>
				println!("Request {attempt}: allowed ({} remaining).", quota.remaining),
			RateLimitDecision::Reject(directive) => println!(
				"Request {attempt}: rejected, retry in {} seconds.",
				directive.retry_after.whole_seconds()
			),
		}
	}

	println!(
		"Authentication tier allows {} requests per window.",
		WindowPolicy::authentication().max_requests
	);

	Ok(())
}
