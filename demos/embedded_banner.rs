//! Drives a host session against a console-backed platform: the issuer is mocked with
//! `httpmock`, a banner is bound to its slot, and card counts are polled for the tracked table.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use parking_lot::Mutex;
// self
use card_host::{
	config::{HostConfig, PlatformConfig},
	container::{BinderConfig, ContainerKind, StreamContainerId},
	error::PlatformError,
	platform::{
		CustomEvent, EmbedConfig, EmbedPlatform, ModalConfig, MountPoint, PlatformFuture,
		PlatformHandle, SessionDelegate, StaticUserMetrics, UserMetrics,
	},
	session::HostSession,
	store::{MemoryStore, SessionStore},
};

const CONTAINERS: [(&str, &str); 13] = [
	("banner", "xWM8Pmqa"),
	("accountsHome", "gp3EkNqm"),
	("accountsFooter", "Lqne7B5X"),
	("rainyDay", "xpVDrGq8"),
	("secureMessages", "05oRA3p7"),
	("transfers", "aqld31qP"),
	("payments", "gp3DQ65m"),
	("services", "g5eMZV50"),
	("payees", "6q7RkA5J"),
	("insurance", "xpVDwQq8"),
	("homeLoans", "Zpv0ABql"),
	("mortgage", "g5eMAy50"),
	("overlay", "95DrmdWz"),
];

/// Prints every call instead of rendering.
#[derive(Default)]
struct ConsolePlatform {
	delegate: Mutex<Option<SessionDelegate>>,
}
impl ConsolePlatform {
	fn handle(container: StreamContainerId) -> PlatformHandle {
		PlatformHandle::from_fn(move || println!("Container {container} torn down."))
	}
}
impl EmbedPlatform for ConsolePlatform {
	fn initialise(&self, config: &PlatformConfig) -> Result<(), PlatformError> {
		println!("SDK initialised for environment {}.", config.environment_id);

		Ok(())
	}

	fn set_session_delegate(&self, delegate: SessionDelegate) {
		*self.delegate.lock() = Some(delegate);
	}

	fn embed<'a>(
		&'a self,
		mount: MountPoint,
		config: EmbedConfig,
	) -> PlatformFuture<'a, PlatformHandle> {
		Box::pin(async move {
			println!("Embedding {} into {mount}.", config.stream_container_id);
			config.callbacks.card_count_changed(2, 2);

			Ok(Self::handle(config.stream_container_id))
		})
	}

	fn single_card<'a>(
		&'a self,
		mount: MountPoint,
		config: EmbedConfig,
	) -> PlatformFuture<'a, PlatformHandle> {
		Box::pin(async move {
			let delegate = self.delegate.lock().clone();

			if let Some(delegate) = delegate {
				let token =
					delegate().await.map_err(|e| PlatformError::call("auth", e.to_string()))?;

				println!("Authenticated with a {}-byte session token.", token.len());
			}

			println!("Rendering one card from {} into {mount}.", config.stream_container_id);
			config.callbacks.card_count_changed(1, 1);
			config.callbacks.size_changed(370, 120);

			Ok(Self::handle(config.stream_container_id))
		})
	}

	fn modal_stream_container<'a>(
		&'a self,
		config: ModalConfig,
	) -> PlatformFuture<'a, Option<PlatformHandle>> {
		Box::pin(async move { Ok(Some(Self::handle(config.stream_container_id))) })
	}

	fn request_user_metrics<'a>(&'a self) -> PlatformFuture<'a, Box<dyn UserMetrics>> {
		Box::pin(async {
			let metrics = StaticUserMetrics::default()
				.with_totals(3, 1)
				.with_container("xWM8Pmqa", 1, 1)
				.with_container("gp3EkNqm", 2, 0);

			Ok(Box::new(metrics) as Box<dyn UserMetrics>)
		})
	}

	fn logout<'a>(&'a self) -> PlatformFuture<'a, ()> {
		Box::pin(async {
			println!("Platform session ended.");

			Ok(())
		})
	}

	fn send_custom_event<'a>(&'a self, event: CustomEvent) -> PlatformFuture<'a, ()> {
		Box::pin(async move {
			println!("Custom event `{}` sent.", event.event_name);

			Ok(())
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/wWpqLVBD/unauthenticated-token/demo-user/test_key_2");
			then.status(200).header("content-type", "application/json").body(
				"{\"data\":{\"token\":\"eyJhbGciOiJub25lIn0.eyJleHAiOjQxMDI0NDQ4MDB9.sig\"}}",
			);
		})
		.await;
	let config = PlatformConfig::builder(server.base_url())
		.environment_id("wWpqLVBD")
		.api_key("test_key_2")
		.org_id("50-11")
		.build()?;
	let mut tracked = Vec::with_capacity(CONTAINERS.len());

	for (label, id) in CONTAINERS {
		tracked.push((label, StreamContainerId::new(id)?));
	}

	let host = HostConfig::default().with_tracked_slots(tracked);
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let session =
		HostSession::with_http_issuer(Arc::new(ConsolePlatform::default()), config, &host, store)?;

	session.switch_identity(&"demo-user".parse()?, "Demo User").await?;
	session.initialize()?;

	let banner = session.binder(BinderConfig::new(
		ContainerKind::Banner,
		StreamContainerId::new("xWM8Pmqa")?,
	));

	banner.attach(Some(MountPoint::new("#banner"))).await?;

	println!("Banner state: {:?}.", banner.state());

	let metrics = session.metrics().subscribe();

	if let Some(snapshot) = metrics.refresh().await {
		println!(
			"{} cards, {} unseen; per slot: {}.",
			snapshot.total_cards,
			snapshot.unseen_cards,
			serde_json::to_string(&snapshot.per_slot)?
		);
	}

	session.reset_banner().await?;
	banner.unmount().await;
	session.logout().await?;

	token_mock.assert_async().await;

	Ok(())
}
