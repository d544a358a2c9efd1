//! Process-wide host session: SDK initialisation, readiness, identity changes, and logout.
//!
//! [`HostSession`] wires the token provider, container registry, and metrics aggregator to one
//! [`EmbedPlatform`]. It is constructed explicitly and passed by reference; nothing in the crate
//! reaches for an ambient global.

// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	auth::{IdentityDirectory, SubjectId},
	config::{HostConfig, PlatformConfig},
	container::{
		BinderConfig, ContainerBinder, ContainerRegistry, ModalController, StreamContainerId,
	},
	error::PlatformError,
	metrics::MetricsAggregator,
	platform::{CustomEvent, EmbedPlatform},
	prefs::{self, Theme},
	store::{SessionStore, StoreError},
	token::{TokenCache, TokenIssuer, TokenProvider},
};

/// Owns the host-side services for one platform connection.
pub struct HostSession {
	platform: Arc<dyn EmbedPlatform>,
	config: PlatformConfig,
	store: Arc<dyn SessionStore>,
	provider: TokenProvider,
	registry: Arc<ContainerRegistry>,
	metrics: MetricsAggregator,
	ready: watch::Sender<bool>,
}
impl HostSession {
	/// Builds a session whose tokens come from `issuer`.
	pub fn new(
		platform: Arc<dyn EmbedPlatform>,
		config: PlatformConfig,
		host: &HostConfig,
		store: Arc<dyn SessionStore>,
		issuer: Arc<dyn TokenIssuer>,
	) -> Self {
		let cache = TokenCache::new(store.clone()).with_buffer(host.refresh_buffer());
		let provider = TokenProvider::new(cache, IdentityDirectory::new(store.clone()), issuer);
		let (ready, ready_rx) = watch::channel(false);
		let metrics = MetricsAggregator::new(platform.clone(), host, ready_rx);
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));

		Self { platform, config, store, provider, registry, metrics, ready }
	}

	/// Builds a session backed by the platform's HTTP token issuer.
	#[cfg(feature = "reqwest")]
	pub fn with_http_issuer(
		platform: Arc<dyn EmbedPlatform>,
		config: PlatformConfig,
		host: &HostConfig,
		store: Arc<dyn SessionStore>,
	) -> Result<Self, crate::error::ConfigError> {
		let issuer = Arc::new(crate::http::HttpTokenIssuer::new(config.clone())?);

		Ok(Self::new(platform, config, host, store, issuer))
	}

	/// Initialises the SDK and registers the session delegate; repeated calls are no-ops.
	pub fn initialize(&self) -> Result<(), PlatformError> {
		if self.is_ready() {
			tracing::debug!("Platform SDK already initialised.");

			return Ok(());
		}

		self.platform.initialise(&self.config).inspect_err(|e| {
			tracing::error!(error = %e, "Failed to initialise the platform SDK.");
		})?;
		self.platform.set_session_delegate(self.provider.session_delegate());
		self.ready.send_replace(true);
		tracing::info!(environment = %self.config.environment_id, "Platform SDK initialised.");

		Ok(())
	}

	/// Whether the SDK is initialised.
	pub fn is_ready(&self) -> bool {
		*self.ready.borrow()
	}

	/// Receiver that flips to `true` once the SDK is initialised.
	pub fn ready_signal(&self) -> watch::Receiver<bool> {
		self.ready.subscribe()
	}

	/// Persists a new identity for an explicit user action.
	///
	/// A changed subject first releases every container, while the outgoing identity and its
	/// credential are still in place, and only then drops the cached credential. When the SDK is
	/// ready a token for the new identity is fetched right away, so an issuer rejection reaches the
	/// caller instead of surfacing later inside the platform.
	pub async fn switch_identity(&self, subject: &SubjectId, display_name: &str) -> Result<()> {
		if self.provider.identity().stored_subject().as_ref() != Some(subject) {
			self.registry.release_all().await;
		}

		self.provider.switch_identity(subject, display_name)?;

		if self.is_ready() {
			self.provider.get_token().await?;
		}

		Ok(())
	}

	/// Tears down containers, ends the platform session, and forgets identity and credential.
	///
	/// A platform logout failure is logged; local state is cleared regardless.
	pub async fn logout(&self) -> Result<()> {
		self.registry.release_all().await;

		let platform_logout =
			if self.is_ready() { self.platform.logout().await } else { Ok(()) };

		if let Err(e) = platform_logout {
			tracing::warn!(error = %e, "Platform logout failed; clearing local state anyway.");
		}

		self.ready.send_replace(false);
		self.provider.logout()?;
		tracing::info!("Host session logged out.");

		Ok(())
	}

	/// Sends a custom event through the platform's event service.
	pub async fn send_custom_event(&self, event: CustomEvent) -> Result<()> {
		if !self.is_ready() {
			return Err(PlatformError::NotInitialised.into());
		}

		tracing::debug!(event = %event.event_name, "Sending custom event.");
		self.platform.send_custom_event(event).await?;

		Ok(())
	}

	/// Restarts the banner action flow for the current user.
	pub async fn reset_banner(&self) -> Result<()> {
		self.send_custom_event(CustomEvent::reset_banner()).await
	}

	/// Creates a binder on this session's registry.
	pub fn binder(&self, config: BinderConfig) -> ContainerBinder {
		ContainerBinder::new(self.registry.clone(), config)
	}

	/// Creates a modal controller on this session's registry.
	pub fn modal(&self, container_id: StreamContainerId) -> ModalController {
		ModalController::new(self.registry.clone(), container_id)
	}

	/// Stored theme preference.
	pub fn theme(&self) -> Theme {
		prefs::theme(self.store.as_ref())
	}

	/// Persists the theme preference.
	pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
		prefs::set_theme(self.store.as_ref(), theme)
	}

	/// Token provider registered as the session delegate.
	pub fn provider(&self) -> &TokenProvider {
		&self.provider
	}

	/// Container registry.
	pub fn registry(&self) -> &Arc<ContainerRegistry> {
		&self.registry
	}

	/// Metrics aggregator.
	pub fn metrics(&self) -> &MetricsAggregator {
		&self.metrics
	}

	/// Platform connection settings.
	pub fn config(&self) -> &PlatformConfig {
		&self.config
	}
}
impl Debug for HostSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HostSession")
			.field("config", &self.config)
			.field("ready", &self.is_ready())
			.field("registry", &self.registry)
			.finish()
	}
}
