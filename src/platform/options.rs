//! Configuration objects passed to the platform's container-creation calls.
//!
//! Field names serialize to the platform's camelCase option names. Callbacks are carried
//! alongside and skipped by serde.

// self
use crate::{_prelude::*, container::StreamContainerId};

/// Callback receiving `(visible, total)` card counts.
pub type CountCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;
/// Callback receiving `(width, height)` of the rendered container.
pub type SizeCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;
/// Callback receiving the modal's open state.
pub type ToggleCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Callbacks a container reports through.
#[derive(Clone, Default)]
pub struct ContainerCallbacks {
	/// Fired when visible or total card counts change.
	pub on_card_count_changed: Option<CountCallback>,
	/// Fired when the rendered size changes.
	pub on_size_changed: Option<SizeCallback>,
	/// Fired when a modal opens or closes; other kinds never report it.
	pub on_modal_toggled: Option<ToggleCallback>,
}
impl ContainerCallbacks {
	/// Sets the count callback.
	pub fn on_card_count_changed(
		mut self,
		f: impl Fn(u32, u32) + Send + Sync + 'static,
	) -> Self {
		self.on_card_count_changed = Some(Arc::new(f));

		self
	}

	/// Sets the size callback.
	pub fn on_size_changed(mut self, f: impl Fn(u32, u32) + Send + Sync + 'static) -> Self {
		self.on_size_changed = Some(Arc::new(f));

		self
	}

	/// Sets the modal toggle callback.
	pub fn on_modal_toggled(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
		self.on_modal_toggled = Some(Arc::new(f));

		self
	}

	/// Invokes the count callback, if any.
	pub fn card_count_changed(&self, visible: u32, total: u32) {
		if let Some(f) = &self.on_card_count_changed {
			f(visible, total);
		}
	}

	/// Invokes the size callback, if any.
	pub fn size_changed(&self, width: u32, height: u32) {
		if let Some(f) = &self.on_size_changed {
			f(width, height);
		}
	}

	/// Invokes the modal toggle callback, if any.
	pub fn modal_toggled(&self, is_open: bool) {
		if let Some(f) = &self.on_modal_toggled {
			f(is_open);
		}
	}
}
impl Debug for ContainerCallbacks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ContainerCallbacks")
			.field("on_card_count_changed", &self.on_card_count_changed.is_some())
			.field("on_size_changed", &self.on_size_changed.is_some())
			.field("on_modal_toggled", &self.on_modal_toggled.is_some())
			.finish()
	}
}

/// Options for `embed` and `single_card`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfig {
	/// Stream container to render.
	pub stream_container_id: StreamContainerId,
	/// Horizontal carousel layout; vertical when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub horizontal_container_config: Option<HorizontalContainerConfig>,
	/// Header and toast chrome.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub enabled_ui_elements: Option<EnabledUiElements>,
	/// Copy overrides.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub custom_strings: Option<CustomStrings>,
	/// Count and size callbacks.
	#[serde(skip)]
	pub callbacks: ContainerCallbacks,
}
impl EmbedConfig {
	/// Options naming only the stream container and its callbacks.
	pub fn new(stream_container_id: StreamContainerId, callbacks: ContainerCallbacks) -> Self {
		Self {
			stream_container_id,
			horizontal_container_config: None,
			enabled_ui_elements: None,
			custom_strings: None,
			callbacks,
		}
	}
}

/// Carousel layout parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalContainerConfig {
	/// Always `true`; the platform reads it as the layout switch.
	pub enabled: bool,
	/// Card width in pixels.
	pub card_width: u32,
	/// Behavior when the stream has no cards.
	pub empty_style: EmptyStyle,
	/// Scroll behavior between cards.
	pub scroll_mode: ScrollMode,
	/// Alignment of the last card.
	pub last_card_alignment: Alignment,
}
impl HorizontalContainerConfig {
	/// Card width used when none is configured.
	pub const DEFAULT_CARD_WIDTH: u32 = 370;

	/// Carousel with the host's standard styling.
	pub fn with_card_width(card_width: u32) -> Self {
		Self {
			enabled: true,
			card_width,
			empty_style: EmptyStyle::Shrink,
			scroll_mode: ScrollMode::Snap,
			last_card_alignment: Alignment::Left,
		}
	}
}
impl Default for HorizontalContainerConfig {
	fn default() -> Self {
		Self::with_card_width(Self::DEFAULT_CARD_WIDTH)
	}
}

/// Empty-stream rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyStyle {
	/// Collapse to zero height.
	#[default]
	Shrink,
	/// Keep the platform's empty-state view.
	Standard,
}

/// Carousel scroll behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollMode {
	/// Snap to card boundaries.
	#[default]
	Snap,
	/// Free scrolling.
	Free,
}

/// Horizontal placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
	/// Flush left.
	#[default]
	Left,
	/// Centred.
	Center,
	/// Flush right.
	Right,
}

/// Platform chrome toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnabledUiElements {
	/// Show the card list header.
	pub card_list_header: bool,
	/// Show card list toasts.
	pub card_list_toast: bool,
}
impl EnabledUiElements {
	/// Header and toast hidden.
	pub const HIDDEN: Self = Self { card_list_header: false, card_list_toast: false };
	/// Header and toast shown.
	pub const SHOWN: Self = Self { card_list_header: true, card_list_toast: true };
}

/// Copy overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomStrings {
	/// Title above a vertical card list.
	pub card_list_title: String,
}

/// Options for `modal_stream_container`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalConfig {
	/// Stream container shown in the modal.
	pub stream_container_id: StreamContainerId,
	/// Maximum card width in pixels.
	pub card_maximum_width: u32,
	/// Card alignment inside the modal.
	pub card_horizontal_alignment: Alignment,
	/// Modal placement on the page.
	pub modal_container_positioning: Alignment,
	/// Vertical padding around the modal in pixels.
	pub modal_container_vertical_padding: u32,
	/// Fired with the new open state whenever the modal opens or closes.
	#[serde(skip)]
	pub on_modal_stream_toggled: Option<ToggleCallback>,
}
impl ModalConfig {
	/// Card width used when none is configured.
	pub const DEFAULT_MAX_WIDTH: u32 = 400;
	/// Vertical padding applied to every modal.
	pub const VERTICAL_PADDING: u32 = 50;

	/// Centred modal with the host's standard padding.
	pub fn new(stream_container_id: StreamContainerId, card_maximum_width: u32) -> Self {
		Self {
			stream_container_id,
			card_maximum_width,
			card_horizontal_alignment: Alignment::Center,
			modal_container_positioning: Alignment::Center,
			modal_container_vertical_padding: Self::VERTICAL_PADDING,
			on_modal_stream_toggled: None,
		}
	}
}
impl Debug for ModalConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ModalConfig")
			.field("stream_container_id", &self.stream_container_id)
			.field("card_maximum_width", &self.card_maximum_width)
			.field("on_modal_stream_toggled", &self.on_modal_stream_toggled.is_some())
			.finish()
	}
}
