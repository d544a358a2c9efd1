//! Boundary consumed from the embeddable-content platform's client SDK.
//!
//! The platform renders and drives card content itself; the host only creates containers at
//! mount points, answers its session-delegate callback with bearer tokens, and reads card counts.
//! [`EmbedPlatform`] is that surface. Bindings implement it over the real SDK; tests use the
//! scripted fake from the test prelude.

pub mod handle;
pub mod options;

pub use handle::*;
pub use options::*;

// self
use crate::{
	_prelude::*,
	config::PlatformConfig,
	container::StreamContainerId,
	error::{AuthError, PlatformError},
};

/// Boxed future returned by platform calls.
pub type PlatformFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, PlatformError>> + 'a + Send>>;

/// Future produced by a [`SessionDelegate`] invocation.
pub type DelegateFuture = Pin<Box<dyn Future<Output = Result<String, AuthError>> + Send>>;

/// Async callback the platform invokes whenever it needs a bearer token.
pub type SessionDelegate = Arc<dyn Fn() -> DelegateFuture + Send + Sync>;

/// Client SDK operations the host relies on.
pub trait EmbedPlatform
where
	Self: Send + Sync,
{
	/// Sets process-wide SDK state: client API host, API key, and environment.
	fn initialise(&self, config: &PlatformConfig) -> Result<(), PlatformError>;

	/// Registers the token callback used to authenticate platform requests.
	fn set_session_delegate(&self, delegate: SessionDelegate);

	/// Renders a stream container (list or overlay layout) into `mount`.
	fn embed<'a>(
		&'a self,
		mount: MountPoint,
		config: EmbedConfig,
	) -> PlatformFuture<'a, PlatformHandle>;

	/// Renders one card at a time into `mount`.
	fn single_card<'a>(
		&'a self,
		mount: MountPoint,
		config: EmbedConfig,
	) -> PlatformFuture<'a, PlatformHandle>;

	/// Launches a modal stream container; the platform may decline and return no handle.
	fn modal_stream_container<'a>(
		&'a self,
		config: ModalConfig,
	) -> PlatformFuture<'a, Option<PlatformHandle>>;

	/// Fetches card counts for the current user.
	fn request_user_metrics<'a>(&'a self) -> PlatformFuture<'a, Box<dyn UserMetrics>>;

	/// Ends the platform's server-side session.
	fn logout<'a>(&'a self) -> PlatformFuture<'a, ()>;

	/// Sends a named event that action flows can wait on.
	fn send_custom_event<'a>(&'a self, event: CustomEvent) -> PlatformFuture<'a, ()>;
}

/// Opaque reference to the host element a container renders into.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MountPoint(Arc<str>);
impl MountPoint {
	/// Wraps a host-side element reference.
	pub fn new(element: impl AsRef<str>) -> Self {
		Self(Arc::from(element.as_ref()))
	}

	/// Element reference as provided by the host.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for MountPoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Card counts answered by the platform's metrics request.
pub trait UserMetrics
where
	Self: Send + Sync,
{
	/// Cards across every stream container.
	fn total_cards(&self) -> u32;

	/// Cards the user has not seen yet.
	fn unseen_cards(&self) -> u32;

	/// Cards in one stream container.
	fn total_cards_for_stream_container(&self, container: &StreamContainerId) -> u32;

	/// Unseen cards in one stream container.
	fn unseen_cards_for_stream_container(&self, container: &StreamContainerId) -> u32;
}

/// Plain-data [`UserMetrics`], for bindings that receive counts as a table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticUserMetrics {
	/// Cards across every stream container.
	pub total: u32,
	/// Unseen cards across every stream container.
	pub unseen: u32,
	/// `(total, unseen)` keyed by stream container id.
	pub per_container: HashMap<String, (u32, u32)>,
}
impl StaticUserMetrics {
	/// Adds counts for one container; the global totals are left untouched.
	pub fn with_container(mut self, id: impl Into<String>, total: u32, unseen: u32) -> Self {
		self.per_container.insert(id.into(), (total, unseen));

		self
	}

	/// Sets the global totals.
	pub fn with_totals(mut self, total: u32, unseen: u32) -> Self {
		self.total = total;
		self.unseen = unseen;

		self
	}
}
impl UserMetrics for StaticUserMetrics {
	fn total_cards(&self) -> u32 {
		self.total
	}

	fn unseen_cards(&self) -> u32 {
		self.unseen
	}

	fn total_cards_for_stream_container(&self, container: &StreamContainerId) -> u32 {
		self.per_container.get(container.as_ref()).map_or(0, |(total, _)| *total)
	}

	fn unseen_cards_for_stream_container(&self, container: &StreamContainerId) -> u32 {
		self.per_container.get(container.as_ref()).map_or(0, |(_, unseen)| *unseen)
	}
}

/// Named event forwarded to the platform's event service.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEvent {
	/// Event name action flows match on.
	pub event_name: String,
	/// Optional event payload.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}
impl CustomEvent {
	/// Event that restarts the banner action flow for the current user.
	pub const RESET_BANNER: &'static str = "resetBannerWeb";

	/// Creates an event without properties.
	pub fn new(event_name: impl Into<String>) -> Self {
		Self { event_name: event_name.into(), properties: None }
	}

	/// Adds one property to the payload.
	pub fn with_property(
		mut self,
		key: impl Into<String>,
		value: impl Into<serde_json::Value>,
	) -> Self {
		self.properties.get_or_insert_with(Default::default).insert(key.into(), value.into());

		self
	}

	/// The banner reset event.
	pub fn reset_banner() -> Self {
		Self::new(Self::RESET_BANNER)
	}
}
