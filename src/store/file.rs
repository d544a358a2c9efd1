//! File-backed [`SessionStore`] so desktop and CLI hosts keep their session across restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{SessionStore, StorageKey, StoreError},
};

type Snapshot = BTreeMap<String, String>;

/// Persists session values to a JSON object file after each mutation.
///
/// Keys the host does not know are preserved so several tools can share one file.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Opens the store, discarding a corrupt file instead of failing.
	pub fn open_or_reset(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		match Self::open(&path) {
			Err(StoreError::Serialization { message }) => {
				tracing::warn!(
					path = %path.display(),
					%message,
					"Discarding unreadable session file."
				);

				let store = Self { path, inner: Default::default() };

				store.persist_locked(&store.inner.read())?;

				Ok(store)
			},
			other => other,
		}
	}

	/// Path of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		if !path.exists() {
			return Ok(Snapshot::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Snapshot::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize session snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl SessionStore for FileStore {
	fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
		Ok(self.inner.read().get(key.as_str()).cloned())
	}

	fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
		let mut guard = self.inner.write();
		let previous = guard.insert(key.as_str().to_owned(), value.to_owned());

		self.persist_locked(&guard).inspect_err(|_| {
			match previous {
				Some(previous) => guard.insert(key.as_str().to_owned(), previous),
				None => guard.remove(key.as_str()),
			};
		})
	}

	fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		let Some(previous) = guard.remove(key.as_str()) else {
			return Ok(());
		};

		self.persist_locked(&guard).inspect_err(|_| {
			guard.insert(key.as_str().to_owned(), previous);
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"card_host_file_store_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn values_survive_reopen() {
		let path = temp_path("reopen");
		let store = FileStore::open(&path).expect("Failed to open file store.");

		store.set(StorageKey::CachedToken, "token-1").expect("Failed to persist token.");
		store.set(StorageKey::TokenExpiry, "1700000000").expect("Failed to persist expiry.");
		store.remove(StorageKey::TokenExpiry).expect("Failed to remove expiry.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store.");

		assert_eq!(
			reopened.get(StorageKey::CachedToken).expect("Reads should succeed."),
			Some("token-1".into())
		);
		assert_eq!(reopened.get(StorageKey::TokenExpiry).expect("Reads should succeed."), None);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session file {}: {e}", path.display())
		});
	}

	#[test]
	fn foreign_keys_are_preserved() {
		let path = temp_path("foreign");

		fs::write(&path, r#"{"other_tool":"keep-me"}"#).expect("Failed to seed session file.");

		let store = FileStore::open(&path).expect("Failed to open seeded file store.");

		store.set(StorageKey::Theme, "dark").expect("Failed to persist theme.");

		let raw = fs::read_to_string(&path).expect("Failed to read session file.");

		assert!(raw.contains("keep-me"));
		assert!(raw.contains("\"theme\""));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session file {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_files_reset_to_cold_start() {
		let path = temp_path("corrupt");

		fs::write(&path, "{not json").expect("Failed to seed corrupt session file.");

		assert!(matches!(FileStore::open(&path), Err(StoreError::Serialization { .. })));

		let store = FileStore::open_or_reset(&path).expect("Reset should recover the file.");

		assert_eq!(store.get(StorageKey::SubjectId).expect("Reads should succeed."), None);
		assert!(FileStore::open(&path).is_ok());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary session file {}: {e}", path.display())
		});
	}
}
