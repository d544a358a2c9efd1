//! Strongly typed identifiers shared by the identity, container, and metrics layers.

// crates.io
use uuid::Uuid;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, $crate::auth::IdentifierError> {
				let view = value.as_ref();

				$crate::auth::id::validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl std::ops::Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = $crate::auth::IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$crate::auth::id::validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl std::borrow::Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = $crate::auth::IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}
pub(crate) use def_id;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (subject, slot, container).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (subject, slot, container).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (subject, slot, container).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! {
	SubjectId,
	"Stable end-user key shared with the platform and used to partition the token cache.",
	"Subject"
}

impl SubjectId {
	/// Generates a random version 4 UUID subject identifier.
	pub fn generate() -> Self {
		Self(Uuid::new_v4().to_string())
	}
}

pub(crate) fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_empty() {
		assert!(SubjectId::new(" user-123").is_err(), "Leading whitespace must be rejected.");
		assert!(SubjectId::new("user-123 ").is_err(), "Trailing whitespace must be rejected.");
		assert!(SubjectId::new("").is_err());

		let subject = SubjectId::new("user-123").expect("Subject fixture should be valid.");

		assert_eq!(subject.as_ref(), "user-123");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let subject: SubjectId =
			serde_json::from_str("\"user-42\"").expect("Subject should deserialize successfully.");

		assert_eq!(subject.as_ref(), "user-42");
		assert!(serde_json::from_str::<SubjectId>("\"with space\"").is_err());
	}

	#[test]
	fn length_limit_is_enforced() {
		SubjectId::new("a".repeat(IDENTIFIER_MAX_LEN)).expect("Exact length should succeed.");

		assert!(SubjectId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn generated_subjects_look_like_v4_uuids() {
		let first = SubjectId::generate();
		let second = SubjectId::generate();

		assert_ne!(first, second);
		assert_eq!(first.len(), 36);

		let groups: Vec<&str> = first.split('-').collect();

		assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
		let parsed = Uuid::parse_str(&first).expect("Generated subjects should parse as UUIDs.");

		assert_eq!(parsed.get_version(), Some(uuid::Version::Random));
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<SubjectId, u8> = HashMap::from_iter([(
			SubjectId::new("user-123").expect("Subject used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("user-123"), Some(&7));
	}
}
