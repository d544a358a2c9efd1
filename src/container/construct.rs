//! One creation path per container kind, behind a single dispatch.

// self
use crate::{
	_prelude::*,
	container::{ContainerDescriptor, ContainerKind},
	error::{ConfigError, PlatformError},
	platform::{
		ContainerCallbacks, CustomStrings, EmbedConfig, EmbedPlatform, EnabledUiElements,
		HorizontalContainerConfig, ModalConfig, MountPoint, PlatformHandle,
	},
};

pub(crate) async fn create(
	platform: &dyn EmbedPlatform,
	descriptor: &ContainerDescriptor,
	callbacks: ContainerCallbacks,
) -> Result<PlatformHandle> {
	match descriptor.kind {
		ContainerKind::ListHorizontal => list_horizontal(platform, descriptor, callbacks).await,
		ContainerKind::ListVertical => list_vertical(platform, descriptor, callbacks).await,
		ContainerKind::Single | ContainerKind::Banner =>
			single_card(platform, descriptor, callbacks).await,
		ContainerKind::OverlayEmbed => overlay_embed(platform, descriptor, callbacks).await,
		ContainerKind::Modal => modal(platform, descriptor, callbacks).await,
	}
}

async fn list_horizontal(
	platform: &dyn EmbedPlatform,
	descriptor: &ContainerDescriptor,
	callbacks: ContainerCallbacks,
) -> Result<PlatformHandle> {
	let width =
		descriptor.visual.card_width.unwrap_or(HorizontalContainerConfig::DEFAULT_CARD_WIDTH);
	let mut config = EmbedConfig::new(descriptor.container_id.clone(), callbacks);

	config.horizontal_container_config = Some(HorizontalContainerConfig::with_card_width(width));
	config.enabled_ui_elements = Some(EnabledUiElements::HIDDEN);

	Ok(platform.embed(mount_of(descriptor)?, config).await?)
}

async fn list_vertical(
	platform: &dyn EmbedPlatform,
	descriptor: &ContainerDescriptor,
	callbacks: ContainerCallbacks,
) -> Result<PlatformHandle> {
	let visual = &descriptor.visual;
	let mut config = EmbedConfig::new(descriptor.container_id.clone(), callbacks);

	config.enabled_ui_elements = Some(EnabledUiElements {
		card_list_header: visual.show_header.unwrap_or(true),
		card_list_toast: visual.show_toast.unwrap_or(true),
	});
	config.custom_strings = visual
		.title
		.as_ref()
		.filter(|title| !title.is_empty())
		.map(|title| CustomStrings { card_list_title: title.clone() });

	Ok(platform.embed(mount_of(descriptor)?, config).await?)
}

async fn single_card(
	platform: &dyn EmbedPlatform,
	descriptor: &ContainerDescriptor,
	callbacks: ContainerCallbacks,
) -> Result<PlatformHandle> {
	let config = EmbedConfig::new(descriptor.container_id.clone(), callbacks);

	Ok(platform.single_card(mount_of(descriptor)?, config).await?)
}

async fn overlay_embed(
	platform: &dyn EmbedPlatform,
	descriptor: &ContainerDescriptor,
	callbacks: ContainerCallbacks,
) -> Result<PlatformHandle> {
	let mut config = EmbedConfig::new(descriptor.container_id.clone(), callbacks);

	config.enabled_ui_elements = Some(EnabledUiElements::HIDDEN);

	Ok(platform.embed(mount_of(descriptor)?, config).await?)
}

async fn modal(
	platform: &dyn EmbedPlatform,
	descriptor: &ContainerDescriptor,
	callbacks: ContainerCallbacks,
) -> Result<PlatformHandle> {
	let max_width = descriptor.visual.max_width.unwrap_or(ModalConfig::DEFAULT_MAX_WIDTH);
	let mut config = ModalConfig::new(descriptor.container_id.clone(), max_width);

	config.on_modal_stream_toggled = callbacks.on_modal_toggled;

	let handle = platform.modal_stream_container(config).await?;

	Ok(handle.ok_or_else(|| {
		PlatformError::call("modal_stream_container", "Platform returned no modal instance.")
	})?)
}

fn mount_of(descriptor: &ContainerDescriptor) -> Result<MountPoint, ConfigError> {
	descriptor
		.mount
		.clone()
		.ok_or(ConfigError::MissingMountPoint { kind: descriptor.kind.as_str() })
}
