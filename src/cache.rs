//! String-keyed in-memory cache with per-entry expiry and hit/miss accounting.
//!
//! An entry past its expiry is logically absent even while physically present: every read
//! path treats it as a miss and reclaims it opportunistically.
//! [`cleanup`](MemoryCache::cleanup) only bounds memory — it is never needed for
//! correctness.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Configuration for [`MemoryCache`].
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
	/// TTL applied by [`MemoryCache::set`] when none is given explicitly.
	pub default_ttl: Duration,
}
impl CacheConfig {
	/// Default entry TTL.
	pub const DEFAULT_TTL: Duration = Duration::minutes(5);

	/// Creates the default configuration.
	pub fn new() -> Self {
		Self { default_ttl: Self::DEFAULT_TTL }
	}

	/// Overrides the default TTL (negative values clamp to zero).
	pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
		self.default_ttl = if ttl.is_negative() { Duration::ZERO } else { ttl };

		self
	}
}
impl Default for CacheConfig {
	fn default() -> Self {
		Self::new()
	}
}

/// Point-in-time cache statistics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
	/// Reads answered from a live entry.
	pub hits: u64,
	/// Reads that found nothing usable.
	pub misses: u64,
	/// Physically present entries, swept or not.
	pub total_entries: usize,
	/// Percentage of reads answered from cache; `0.0` before any access.
	pub hit_rate: f64,
}

#[derive(Clone, Debug)]
struct Entry<V> {
	value: V,
	expires_at: OffsetDateTime,
}
impl<V> Entry<V> {
	fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}
}

/// Explicitly constructed, injectable TTL cache.
///
/// Writes overwrite unconditionally — there are no update-in-place semantics, a new
/// [`set`](Self::set) replaces the entry wholesale. Access is synchronized with a
/// reader-writer lock; last write wins on racing writers.
pub struct MemoryCache<V> {
	entries: RwLock<HashMap<String, Entry<V>>>,
	config: CacheConfig,
	hits: AtomicU64,
	misses: AtomicU64,
}
impl<V> MemoryCache<V>
where
	V: Clone,
{
	/// Creates an empty cache with the provided configuration.
	pub fn new(config: CacheConfig) -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
			config,
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
		}
	}

	/// Stores `value` under `key` with the default TTL, replacing any existing entry.
	pub fn set(&self, key: impl Into<String>, value: V) {
		self.set_with_ttl(key, value, self.config.default_ttl);
	}

	/// Stores `value` under `key`, expiring `ttl` from now.
	pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
		self.set_with_ttl_at(key, value, ttl, OffsetDateTime::now_utc());
	}

	/// Instant-passing variant of [`set_with_ttl`](Self::set_with_ttl).
	pub fn set_with_ttl_at(
		&self,
		key: impl Into<String>,
		value: V,
		ttl: Duration,
		instant: OffsetDateTime,
	) {
		self.entries.write().insert(key.into(), Entry { value, expires_at: instant + ttl });
	}

	/// Returns the live value under `key`, counting a hit or a miss.
	pub fn get(&self, key: &str) -> Option<V> {
		self.get_at(key, OffsetDateTime::now_utc())
	}

	/// Instant-passing variant of [`get`](Self::get).
	pub fn get_at(&self, key: &str, instant: OffsetDateTime) -> Option<V> {
		// `Some(None)` marks a present-but-expired entry that still needs reclaiming.
		let lookup = {
			let guard = self.entries.read();

			guard.get(key).map(|entry| {
				(!entry.is_expired_at(instant)).then(|| entry.value.clone())
			})
		};

		match lookup {
			Some(Some(value)) => {
				self.hits.fetch_add(1, Ordering::Relaxed);

				Some(value)
			},
			Some(None) => {
				let mut guard = self.entries.write();

				if guard.get(key).is_some_and(|entry| entry.is_expired_at(instant)) {
					guard.remove(key);
				}

				self.misses.fetch_add(1, Ordering::Relaxed);

				None
			},
			None => {
				self.misses.fetch_add(1, Ordering::Relaxed);

				None
			},
		}
	}

	/// Removes `key`, reporting whether an entry (live or stale) was present.
	pub fn remove(&self, key: &str) -> bool {
		self.entries.write().remove(key).is_some()
	}

	/// Drops every entry. Counters are left untouched.
	pub fn clear(&self) {
		self.entries.write().clear();
	}

	/// Sweeps expired entries, returning how many were reclaimed.
	pub fn cleanup(&self) -> usize {
		self.cleanup_at(OffsetDateTime::now_utc())
	}

	/// Instant-passing variant of [`cleanup`](Self::cleanup).
	pub fn cleanup_at(&self, instant: OffsetDateTime) -> usize {
		let mut guard = self.entries.write();
		let before = guard.len();

		guard.retain(|_, entry| !entry.is_expired_at(instant));

		before - guard.len()
	}

	/// Number of physically present entries, including not-yet-swept stale ones.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when no entries are physically present.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Snapshot of hit/miss accounting.
	pub fn stats(&self) -> CacheStats {
		let hits = self.hits.load(Ordering::Relaxed);
		let misses = self.misses.load(Ordering::Relaxed);
		let accesses = hits + misses;
		let hit_rate =
			if accesses == 0 { 0.0 } else { hits as f64 / accesses as f64 * 100.0 };

		CacheStats { hits, misses, total_entries: self.entries.read().len(), hit_rate }
	}
}
impl<V> Debug for MemoryCache<V> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryCache")
			.field("entries", &self.entries.read().len())
			.field("config", &self.config)
			.finish()
	}
}
