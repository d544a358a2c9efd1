//! Single-credential cache with expiry-buffer validity and synchronous persistence.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{self, SessionStore, StorageKey, StoreError},
};

/// Holds at most one credential and mirrors it into a [`SessionStore`].
pub struct TokenCache {
	store: Arc<dyn SessionStore>,
	current: RwLock<Option<Credential>>,
	buffer: Duration,
}
impl TokenCache {
	/// Margin before expiry at which a credential stops being served.
	pub const REFRESH_BUFFER: Duration = Duration::seconds(70);

	/// Creates a cache over `store`, restoring any persisted credential.
	pub fn new(store: Arc<dyn SessionStore>) -> Self {
		let current = Self::restore(store.as_ref());

		Self { store, current: RwLock::new(current), buffer: Self::REFRESH_BUFFER }
	}

	/// Overrides the refresh buffer; negative values clamp to zero.
	pub fn with_buffer(mut self, buffer: Duration) -> Self {
		self.buffer = if buffer.is_negative() { Duration::ZERO } else { buffer };

		self
	}

	/// Active refresh buffer.
	pub fn buffer(&self) -> Duration {
		self.buffer
	}

	/// Returns the cached credential, valid or not.
	pub fn read(&self) -> Option<Credential> {
		self.current.read().clone()
	}

	/// Returns the cached credential only if it is still valid at `now`.
	pub fn read_valid_at(&self, now: OffsetDateTime) -> Option<Credential> {
		self.read().filter(|credential| self.is_valid(Some(credential), now))
	}

	/// Replaces the cached credential and persists it before returning.
	///
	/// The in-memory copy is replaced even if persistence fails, so the running process keeps
	/// serving the fresh token; the error reports that it will not survive a reload.
	pub fn write(&self, credential: &Credential) -> Result<(), StoreError> {
		let mut guard = self.current.write();

		*guard = Some(credential.clone());

		self.store.set(StorageKey::CachedToken, credential.token.expose())?;

		match credential.expires_at {
			Some(exp) => self.store.set(StorageKey::TokenExpiry, &exp.to_string()),
			None => self.store.remove(StorageKey::TokenExpiry),
		}
	}

	/// Drops the cached credential from memory and storage.
	pub fn clear(&self) -> Result<(), StoreError> {
		let mut guard = self.current.write();

		*guard = None;

		self.store.remove(StorageKey::CachedToken)?;
		self.store.remove(StorageKey::TokenExpiry)
	}

	/// Returns `true` when `credential` exists, has a known expiry, and outlives the buffer.
	pub fn is_valid(&self, credential: Option<&Credential>, now: OffsetDateTime) -> bool {
		credential.is_some_and(|credential| credential.is_usable_at(now, self.buffer))
	}

	fn restore(store: &dyn SessionStore) -> Option<Credential> {
		let token = store::read_lenient(store, StorageKey::CachedToken)?;
		let expires_at = store::read_lenient(store, StorageKey::TokenExpiry)
			.and_then(|raw| raw.trim().parse::<i64>().ok());

		Some(Credential::with_expiry(token, expires_at))
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let guard = self.current.read();

		f.debug_struct("TokenCache")
			.field("cached", &guard.is_some())
			.field("expires_at", &guard.as_ref().and_then(|c| c.expires_at))
			.field("buffer", &self.buffer)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryStore;

	fn at(secs: i64) -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(secs).expect("Fixture timestamp should be valid.")
	}

	#[test]
	fn validity_uses_the_refresh_buffer() {
		let cache = TokenCache::new(Arc::new(MemoryStore::default()));
		let now = at(1_700_000_000);
		let base = now.unix_timestamp();
		let buffer = TokenCache::REFRESH_BUFFER.whole_seconds();
		let short = Credential::with_expiry("a", Some(base + buffer - 1));
		let long = Credential::with_expiry("b", Some(base + buffer + 1));

		assert!(!cache.is_valid(Some(&short), now));
		assert!(cache.is_valid(Some(&long), now));
		assert!(!cache.is_valid(Some(&Credential::with_expiry("c", None)), now));
		assert!(!cache.is_valid(None, now));
	}

	#[test]
	fn writes_persist_and_restore() {
		let store = MemoryStore::default();
		let cache = TokenCache::new(Arc::new(store.clone()));

		cache
			.write(&Credential::with_expiry("token-1", Some(1_700_000_500)))
			.expect("Cache writes should succeed.");

		assert_eq!(
			store.get(StorageKey::TokenExpiry).expect("Reads should succeed."),
			Some("1700000500".into())
		);

		let restored = TokenCache::new(Arc::new(store.clone()));

		assert_eq!(restored.read(), Some(Credential::with_expiry("token-1", Some(1_700_000_500))));

		cache
			.write(&Credential::with_expiry("token-2", None))
			.expect("Cache writes should succeed.");

		assert_eq!(store.get(StorageKey::TokenExpiry).expect("Reads should succeed."), None);
	}

	#[test]
	fn clear_removes_persisted_values() {
		let store = MemoryStore::default();
		let cache = TokenCache::new(Arc::new(store.clone()));

		cache
			.write(&Credential::with_expiry("token-1", Some(1_700_000_500)))
			.expect("Cache writes should succeed.");
		cache.clear().expect("Cache clears should succeed.");

		assert_eq!(cache.read(), None);
		assert!(store.is_empty());
		assert_eq!(TokenCache::new(Arc::new(store)).read(), None);
	}

	#[test]
	fn garbage_expiry_restores_as_unknown() {
		let store = MemoryStore::seeded([
			(StorageKey::CachedToken, "token-1"),
			(StorageKey::TokenExpiry, "tomorrow"),
		]);
		let cache = TokenCache::new(Arc::new(store));

		assert_eq!(cache.read().and_then(|c| c.expires_at), None);
		assert_eq!(cache.read_valid_at(at(0)), None);
	}
}
