//! Declarative description of one container: what to render, where, and how.

// self
use crate::{
	_prelude::*,
	container::{ContainerKind, SlotKey, StreamContainerId},
	error::ConfigError,
	platform::MountPoint,
};

/// Visual parameters; each kind reads the subset it supports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualParams {
	/// Carousel card width in pixels (horizontal lists).
	pub card_width: Option<u32>,
	/// Maximum card width in pixels (modals).
	pub max_width: Option<u32>,
	/// Card list title (vertical lists).
	pub title: Option<String>,
	/// Header visibility (vertical lists, shown by default).
	pub show_header: Option<bool>,
	/// Toast visibility (vertical lists, shown by default).
	pub show_toast: Option<bool>,
}
impl VisualParams {
	/// Largest accepted card width.
	pub const MAX_CARD_WIDTH: u32 = 4_096;
}

/// Everything the registry needs to create one container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerDescriptor {
	/// Registry key; defaults from the kind and container id.
	pub slot_key: SlotKey,
	/// Stream container rendered.
	pub container_id: StreamContainerId,
	/// Creation path.
	pub kind: ContainerKind,
	/// Host element; absent for modals.
	pub mount: Option<MountPoint>,
	/// Visual parameters.
	pub visual: VisualParams,
}
impl ContainerDescriptor {
	/// Creates a descriptor with the default slot key and no mount point.
	pub fn new(kind: ContainerKind, container_id: StreamContainerId) -> Self {
		Self {
			slot_key: Self::default_slot_key(kind, &container_id),
			container_id,
			kind,
			mount: None,
			visual: VisualParams::default(),
		}
	}

	/// Parses the kind label before building; unknown labels are configuration errors.
	pub fn parse(kind: &str, container_id: &str) -> Result<Self, ConfigError> {
		let kind = kind.parse()?;
		let container_id = StreamContainerId::new(container_id)?;

		Ok(Self::new(kind, container_id))
	}

	/// Slot key the host uses for `container_id` rendered as `kind`.
	pub fn default_slot_key(kind: ContainerKind, container_id: &StreamContainerId) -> SlotKey {
		let raw = match kind.slot_prefix() {
			Some(prefix) => format!("{prefix}{container_id}"),
			None => container_id.to_string(),
		};

		// Only the length limit can reject a prefixed valid id; keep the key distinct regardless.
		SlotKey::new(&raw).unwrap_or(SlotKey(raw))
	}

	/// Sets the mount point.
	pub fn with_mount(mut self, mount: MountPoint) -> Self {
		self.mount = Some(mount);

		self
	}

	/// Overrides the slot key.
	pub fn with_slot_key(mut self, slot_key: SlotKey) -> Self {
		self.slot_key = slot_key;

		self
	}

	/// Replaces the visual parameters.
	pub fn with_visual(mut self, visual: VisualParams) -> Self {
		self.visual = visual;

		self
	}

	/// Sets the carousel card width.
	pub fn with_card_width(mut self, width: u32) -> Self {
		self.visual.card_width = Some(width);

		self
	}

	/// Checks the mount point against the kind and the widths against their bounds.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match (self.kind.requires_mount(), &self.mount) {
			(true, None) => return Err(ConfigError::MissingMountPoint { kind: self.kind.as_str() }),
			(false, Some(_)) =>
				return Err(ConfigError::UnexpectedMountPoint { kind: self.kind.as_str() }),
			_ => {},
		}

		for width in [self.visual.card_width, self.visual.max_width].into_iter().flatten() {
			if width == 0 || width > VisualParams::MAX_CARD_WIDTH {
				return Err(ConfigError::InvalidCardWidth { width });
			}
		}

		Ok(())
	}
}
