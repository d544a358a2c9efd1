//! Container kinds and their slot-key conventions.

// self
use crate::{_prelude::*, error::ConfigError};

/// Layout a container renders with; each kind has its own platform creation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
	/// One card at a time.
	Single,
	/// Carousel of fixed-width cards.
	ListHorizontal,
	/// Vertical card list with optional header and toast.
	ListVertical,
	/// Single-card banner at the top of a page.
	Banner,
	/// Embedded list whose subviews open as overlays.
	OverlayEmbed,
	/// Modal stream container; has no mount point.
	Modal,
}
impl ContainerKind {
	/// Every kind, in declaration order.
	pub const ALL: [Self; 6] = [
		Self::Single,
		Self::ListHorizontal,
		Self::ListVertical,
		Self::Banner,
		Self::OverlayEmbed,
		Self::Modal,
	];

	/// Stable label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Single => "single",
			Self::ListHorizontal => "list-horizontal",
			Self::ListVertical => "list-vertical",
			Self::Banner => "banner",
			Self::OverlayEmbed => "overlay-embed",
			Self::Modal => "modal",
		}
	}

	/// Prefix applied to the container id to form the default slot key.
	pub fn slot_prefix(self) -> Option<&'static str> {
		match self {
			Self::ListHorizontal | Self::ListVertical => None,
			Self::Single => Some("single-"),
			Self::Banner => Some("banner-"),
			Self::OverlayEmbed => Some("embed-"),
			Self::Modal => Some("modal-"),
		}
	}

	/// Whether containers of this kind render into a mount point.
	pub fn requires_mount(self) -> bool {
		!matches!(self, Self::Modal)
	}
}
impl Display for ContainerKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ContainerKind {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| ConfigError::UnknownKind { kind: s.to_owned() })
	}
}
