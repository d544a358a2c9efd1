//! Thread-safe in-memory [`SessionStore`] for tests and non-persistent hosts.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StorageKey, StoreError},
};

type StoreMap = Arc<RwLock<HashMap<StorageKey, String>>>;

/// In-process backend; clones share the same map, like tabs sharing one browser storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Builds a store pre-populated with the provided entries.
	pub fn seeded<I, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (StorageKey, V)>,
		V: Into<String>,
	{
		let map = entries.into_iter().map(|(key, value)| (key, value.into())).collect();

		Self(Arc::new(RwLock::new(map)))
	}

	/// Returns the number of stored values.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl SessionStore for MemoryStore {
	fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(&key).cloned())
	}

	fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
		self.0.write().insert(key, value.to_owned());

		Ok(())
	}

	fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
		self.0.write().remove(&key);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn clones_share_state() {
		let store = MemoryStore::default();
		let other = store.clone();

		store.set(StorageKey::Theme, "dark").expect("Memory store writes should succeed.");

		assert_eq!(
			other.get(StorageKey::Theme).expect("Memory store reads should succeed."),
			Some("dark".into())
		);

		other.remove(StorageKey::Theme).expect("Memory store removals should succeed.");
		other.remove(StorageKey::Theme).expect("Removing twice should still succeed.");

		assert!(store.is_empty());
	}
}
