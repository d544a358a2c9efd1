//! Persisted UI preferences.

// self
use crate::{
	_prelude::*,
	store::{self, SessionStore, StorageKey, StoreError},
};

/// Colour theme chosen by the end user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
	/// Light palette.
	Light,
	/// Dark palette.
	Dark,
	/// Follow the operating system.
	#[default]
	System,
}
impl Theme {
	/// Returns the persisted label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Theme::Light => "light",
			Theme::Dark => "dark",
			Theme::System => "system",
		}
	}
}
impl FromStr for Theme {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"light" => Ok(Theme::Light),
			"dark" => Ok(Theme::Dark),
			"system" => Ok(Theme::System),
			_ => Err(()),
		}
	}
}

/// Reads the persisted theme; unknown or missing values fall back to [`Theme::System`].
pub fn theme(store: &dyn SessionStore) -> Theme {
	store::read_lenient(store, StorageKey::Theme)
		.and_then(|raw| raw.parse().ok())
		.unwrap_or_default()
}

/// Persists the theme preference.
pub fn set_theme(store: &dyn SessionStore, theme: Theme) -> Result<(), StoreError> {
	store.set(StorageKey::Theme, theme.as_str())
}
