// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token lookups.
#[derive(Debug, Default)]
pub struct TokenMetrics {
	cache_hits: AtomicU64,
	issuances: AtomicU64,
	failures: AtomicU64,
}
impl TokenMetrics {
	/// Returns how many lookups were served from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns how many issuer requests were sent (coalesced callers count once).
	pub fn issuances(&self) -> u64 {
		self.issuances.load(Ordering::Relaxed)
	}

	/// Returns how many issuer requests failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_issuance(&self) {
		self.issuances.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
