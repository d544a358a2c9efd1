//! End-user identity and its persisted directory.

// self
use crate::{
	_prelude::*,
	auth::SubjectId,
	store::{self, SessionStore, StorageKey, StoreError},
};

/// The end user the host authenticates as.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Stable platform end-user key.
	pub subject_id: SubjectId,
	/// Name forwarded to the issuer as a claim.
	pub display_name: String,
}
impl Identity {
	/// Creates an identity with the provided subject and display name.
	pub fn new(subject_id: SubjectId, display_name: impl Into<String>) -> Self {
		Self { subject_id, display_name: display_name.into() }
	}

	/// JSON claims payload sent to the issuer.
	pub fn claims(&self) -> serde_json::Value {
		serde_json::json!({ "name": self.display_name })
	}
}

/// Reads and writes the persisted identity.
///
/// A missing subject is generated on first read so the same end user is recognised across
/// reloads and across other hosts that share the identifier.
#[derive(Clone)]
pub struct IdentityDirectory {
	store: Arc<dyn SessionStore>,
}
impl IdentityDirectory {
	/// Wraps the provided store.
	pub fn new(store: Arc<dyn SessionStore>) -> Self {
		Self { store }
	}

	/// Returns the persisted subject, generating and persisting one on a cold start.
	pub fn subject_id(&self) -> Result<SubjectId, StoreError> {
		if let Some(raw) = store::read_lenient(self.store.as_ref(), StorageKey::SubjectId) {
			match SubjectId::new(&raw) {
				Ok(subject) => return Ok(subject),
				Err(e) => {
					tracing::warn!(error = %e, "Persisted subject id is invalid; regenerating.");
				},
			}
		}

		let subject = SubjectId::generate();

		self.store.set(StorageKey::SubjectId, &subject)?;

		Ok(subject)
	}

	/// Returns the persisted subject without generating one; invalid values read as absent.
	pub fn stored_subject(&self) -> Option<SubjectId> {
		store::read_lenient(self.store.as_ref(), StorageKey::SubjectId)
			.and_then(|raw| SubjectId::new(raw).ok())
	}

	/// Persists `subject`; returns `true` if it differs from the previously stored subject.
	pub fn set_subject_id(&self, subject: &SubjectId) -> Result<bool, StoreError> {
		let previous = store::read_lenient(self.store.as_ref(), StorageKey::SubjectId);

		self.store.set(StorageKey::SubjectId, subject)?;

		Ok(previous.as_deref() != Some(subject.as_ref()))
	}

	/// Returns the persisted display name, empty when unset.
	pub fn display_name(&self) -> String {
		store::read_lenient(self.store.as_ref(), StorageKey::DisplayName).unwrap_or_default()
	}

	/// Persists the display name.
	pub fn set_display_name(&self, name: &str) -> Result<(), StoreError> {
		self.store.set(StorageKey::DisplayName, name)
	}

	/// Returns the current identity, generating a subject if needed.
	pub fn identity(&self) -> Result<Identity, StoreError> {
		Ok(Identity::new(self.subject_id()?, self.display_name()))
	}

	/// Returns `true` when a subject has been persisted.
	pub fn is_authenticated(&self) -> bool {
		store::read_lenient(self.store.as_ref(), StorageKey::SubjectId).is_some()
	}

	/// Forgets the persisted identity.
	pub fn clear(&self) -> Result<(), StoreError> {
		self.store.remove(StorageKey::SubjectId)?;
		self.store.remove(StorageKey::DisplayName)
	}
}
impl Debug for IdentityDirectory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityDirectory")
			.field("authenticated", &self.is_authenticated())
			.finish()
	}
}
