//! Key/value persistence contract and built-in stores for host session state.
//!
//! Everything the host persists is a best-effort cache: a missing or unreadable value means a
//! cold start, never a fatal error. Writes are synchronous so a reader in the same process observes
//! them as soon as the call returns.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Synchronous string key/value backend for session state.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if any.
	fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError>;

	/// Removes the value stored under `key`; removing a missing key succeeds.
	fn remove(&self, key: StorageKey) -> Result<(), StoreError>;
}

/// Names of the values the host persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
	/// End-user subject identifier.
	SubjectId,
	/// End-user display name.
	DisplayName,
	/// Last issued bearer token.
	CachedToken,
	/// Expiry of the last issued token, epoch seconds.
	TokenExpiry,
	/// UI theme preference.
	Theme,
}
impl StorageKey {
	/// Every key the host writes.
	pub const ALL: [StorageKey; 5] = [
		StorageKey::SubjectId,
		StorageKey::DisplayName,
		StorageKey::CachedToken,
		StorageKey::TokenExpiry,
		StorageKey::Theme,
	];

	/// Returns the storage name used by the browser host, so both share persisted state.
	pub const fn as_str(self) -> &'static str {
		match self {
			StorageKey::SubjectId => "atomic_id",
			StorageKey::DisplayName => "atomic_user_name",
			StorageKey::CachedToken => "atomic_cached_token",
			StorageKey::TokenExpiry => "atomic_token_expiry",
			StorageKey::Theme => "theme",
		}
	}
}
impl Display for StorageKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Reads a value, logging and discarding backend failures so callers see a cold start.
pub(crate) fn read_lenient(store: &dyn SessionStore, key: StorageKey) -> Option<String> {
	match store.get(key) {
		Ok(value) => value,
		Err(e) => {
			tracing::warn!(
				key = key.as_str(),
				error = %e,
				"Session store read failed; treating as absent."
			);

			None
		},
	}
}
