//! Convenience re-exports and helpers for unit and integration tests; enabled via `cfg(test)` or
//! the `test` crate feature.

pub use crate::_prelude::*;

// std
use std::{
	collections::HashSet,
	sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{
	config::PlatformConfig,
	container::StreamContainerId,
	error::{AuthError, PlatformError},
	platform::{
		ContainerCallbacks, CustomEvent, EmbedConfig, EmbedPlatform, InstanceControl,
		ModalConfig, MountPoint, PlatformFuture, PlatformHandle, SessionDelegate,
		StaticUserMetrics, UserMetrics,
	},
};

/// Unsigned token whose payload carries `exp`.
pub fn jwt_expiring_at(exp: i64) -> String {
	format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}")))
}

/// Unsigned token expiring `secs` seconds from now.
pub fn jwt_expiring_in(secs: i64) -> String {
	jwt_expiring_at(OffsetDateTime::now_utc().unix_timestamp() + secs)
}

/// Platform settings pointing at `base`, usually an `httpmock` server.
pub fn test_platform_config(base: &str) -> PlatformConfig {
	PlatformConfig::builder(base)
		.environment_id("env-test")
		.api_key("test_key_2")
		.build()
		.expect("Test platform config should be valid.")
}

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
#[cfg(feature = "reqwest")]
pub fn test_reqwest_http_client() -> crate::http::ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	crate::http::ReqwestHttpClient::with_client(client)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Teardown {
	Closure,
	Stop,
	Destroy,
}

struct FakeInstance {
	id: u64,
	operation: &'static str,
	container_id: StreamContainerId,
	callbacks: ContainerCallbacks,
	live: bool,
}

type TeardownHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct FakeShared {
	instances: Mutex<Vec<FakeInstance>>,
	failing: Mutex<HashSet<&'static str>>,
	calls: Mutex<Vec<&'static str>>,
	events: Mutex<Vec<CustomEvent>>,
	metrics: Mutex<StaticUserMetrics>,
	delegate: Mutex<Option<SessionDelegate>>,
	initialised: Mutex<Option<PlatformConfig>>,
	create_delay: Mutex<Option<StdDuration>>,
	teardown_hook: Mutex<Option<TeardownHook>>,
	decline_modals: AtomicBool,
	next_id: AtomicU64,
	creations: AtomicUsize,
	teardowns: AtomicUsize,
	metrics_requests: AtomicUsize,
	logouts: AtomicUsize,
}
impl FakeShared {
	fn enter(&self, operation: &'static str) -> Result<(), PlatformError> {
		self.calls.lock().push(operation);

		if self.failing.lock().contains(operation) {
			return Err(PlatformError::call(operation, "Scripted failure"));
		}

		Ok(())
	}

	fn finish_teardown(&self, id: u64) {
		let torn_down = {
			let mut instances = self.instances.lock();

			match instances.iter_mut().find(|i| i.id == id && i.live) {
				Some(instance) => {
					instance.live = false;

					true
				},
				None => false,
			}
		};

		if torn_down {
			self.teardowns.fetch_add(1, Ordering::SeqCst);

			let hook = self.teardown_hook.lock().clone();

			if let Some(hook) = hook {
				hook();
			}
		}
	}

	fn callbacks_for(
		&self,
		container_id: &StreamContainerId,
		include_stale: bool,
	) -> Vec<ContainerCallbacks> {
		let instances = self.instances.lock();
		let mut matching = instances
			.iter()
			.filter(|i| &i.container_id == container_id && (include_stale || i.live))
			.map(|i| i.callbacks.clone())
			.collect::<Vec<_>>();

		if !include_stale {
			matching = matching.pop().into_iter().collect();
		}

		matching
	}
}

struct FakeControl {
	shared: Arc<FakeShared>,
	id: u64,
	mode: Teardown,
}
impl InstanceControl for FakeControl {
	fn stop(&mut self) -> bool {
		if self.mode != Teardown::Stop {
			return false;
		}

		self.shared.finish_teardown(self.id);

		true
	}

	fn destroy(&mut self) -> bool {
		if self.mode != Teardown::Destroy {
			return false;
		}

		self.shared.finish_teardown(self.id);

		true
	}
}

/// Scripted [`EmbedPlatform`] that records every call and lets tests fire container callbacks.
///
/// `embed` hands back a teardown closure, `single_card` an instance with `stop`, and
/// `modal_stream_container` an instance with `destroy`, so every handle shape is exercised.
#[derive(Clone, Default)]
pub struct FakePlatform(Arc<FakeShared>);
impl FakePlatform {
	/// Makes every later call to `operation` fail.
	pub fn fail(&self, operation: &'static str) {
		self.0.failing.lock().insert(operation);
	}

	/// Undoes [`FakePlatform::fail`].
	pub fn recover(&self, operation: &'static str) {
		self.0.failing.lock().remove(operation);
	}

	/// Makes the platform answer modal launches without an instance.
	pub fn decline_modals(&self) {
		self.0.decline_modals.store(true, Ordering::SeqCst);
	}

	/// Counts returned by later metrics requests.
	pub fn set_metrics(&self, metrics: StaticUserMetrics) {
		*self.0.metrics.lock() = metrics;
	}

	/// Delays every creation call by `delay`.
	pub fn set_create_delay(&self, delay: StdDuration) {
		*self.0.create_delay.lock() = Some(delay);
	}

	/// Runs `hook` after every instance teardown, outside the platform's own locks.
	pub fn on_teardown(&self, hook: impl Fn() + Send + Sync + 'static) {
		*self.0.teardown_hook.lock() = Some(Arc::new(hook));
	}

	/// Successful creation calls so far.
	pub fn creations(&self) -> usize {
		self.0.creations.load(Ordering::SeqCst)
	}

	/// Instances torn down so far.
	pub fn teardowns(&self) -> usize {
		self.0.teardowns.load(Ordering::SeqCst)
	}

	/// Metrics requests answered or failed so far.
	pub fn metrics_requests(&self) -> usize {
		self.0.metrics_requests.load(Ordering::SeqCst)
	}

	/// Successful platform logouts.
	pub fn logouts(&self) -> usize {
		self.0.logouts.load(Ordering::SeqCst)
	}

	/// Instances created and not yet torn down.
	pub fn live_instances(&self) -> usize {
		self.0.instances.lock().iter().filter(|i| i.live).count()
	}

	/// Operation names of every live instance, in creation order.
	pub fn live_operations(&self) -> Vec<&'static str> {
		self.0.instances.lock().iter().filter(|i| i.live).map(|i| i.operation).collect()
	}

	/// Every call received, in order.
	pub fn calls(&self) -> Vec<&'static str> {
		self.0.calls.lock().clone()
	}

	/// Custom events sent so far.
	pub fn events(&self) -> Vec<CustomEvent> {
		self.0.events.lock().clone()
	}

	/// Configuration passed to the last successful `initialise`.
	pub fn initialised(&self) -> Option<PlatformConfig> {
		self.0.initialised.lock().clone()
	}

	/// Asks the registered session delegate for a token, as the platform does before requests.
	pub async fn request_token(&self) -> Result<String, AuthError> {
		let delegate = self.0.delegate.lock().clone();
		let delegate = delegate.expect("A session delegate should be registered.");

		delegate().await
	}

	/// Fires the count callback of the newest live instance rendering `container_id`.
	pub fn emit_counts(&self, container_id: &StreamContainerId, visible: u32, total: u32) {
		for callbacks in self.0.callbacks_for(container_id, false) {
			callbacks.card_count_changed(visible, total);
		}
	}

	/// Fires the count callback of every instance ever created for `container_id`.
	pub fn emit_counts_to_all(&self, container_id: &StreamContainerId, visible: u32, total: u32) {
		for callbacks in self.0.callbacks_for(container_id, true) {
			callbacks.card_count_changed(visible, total);
		}
	}

	/// Fires the size callback of the newest live instance rendering `container_id`.
	pub fn emit_size(&self, container_id: &StreamContainerId, width: u32, height: u32) {
		for callbacks in self.0.callbacks_for(container_id, false) {
			callbacks.size_changed(width, height);
		}
	}

	/// Fires the toggle callback of the newest live modal for `container_id`.
	pub fn toggle_modal(&self, container_id: &StreamContainerId, is_open: bool) {
		for callbacks in self.0.callbacks_for(container_id, false) {
			callbacks.modal_toggled(is_open);
		}
	}

	async fn create(
		&self,
		operation: &'static str,
		container_id: StreamContainerId,
		callbacks: ContainerCallbacks,
		mode: Teardown,
	) -> Result<PlatformHandle, PlatformError> {
		let delay = *self.0.create_delay.lock();

		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}

		self.0.enter(operation)?;

		let id = self.0.next_id.fetch_add(1, Ordering::SeqCst);

		self.0.instances.lock().push(FakeInstance {
			id,
			operation,
			container_id,
			callbacks,
			live: true,
		});
		self.0.creations.fetch_add(1, Ordering::SeqCst);

		let shared = self.0.clone();

		Ok(match mode {
			Teardown::Closure => PlatformHandle::from_fn(move || shared.finish_teardown(id)),
			Teardown::Stop | Teardown::Destroy =>
				PlatformHandle::from_instance(FakeControl { shared, id, mode }),
		})
	}
}
impl EmbedPlatform for FakePlatform {
	fn initialise(&self, config: &PlatformConfig) -> Result<(), PlatformError> {
		self.0.enter("initialise")?;
		*self.0.initialised.lock() = Some(config.clone());

		Ok(())
	}

	fn set_session_delegate(&self, delegate: SessionDelegate) {
		self.0.calls.lock().push("set_session_delegate");
		*self.0.delegate.lock() = Some(delegate);
	}

	fn embed<'a>(
		&'a self,
		_mount: MountPoint,
		config: EmbedConfig,
	) -> PlatformFuture<'a, PlatformHandle> {
		Box::pin(self.create(
			"embed",
			config.stream_container_id,
			config.callbacks,
			Teardown::Closure,
		))
	}

	fn single_card<'a>(
		&'a self,
		_mount: MountPoint,
		config: EmbedConfig,
	) -> PlatformFuture<'a, PlatformHandle> {
		Box::pin(self.create(
			"single_card",
			config.stream_container_id,
			config.callbacks,
			Teardown::Stop,
		))
	}

	fn modal_stream_container<'a>(
		&'a self,
		config: ModalConfig,
	) -> PlatformFuture<'a, Option<PlatformHandle>> {
		Box::pin(async move {
			if self.0.decline_modals.load(Ordering::SeqCst) {
				self.0.enter("modal_stream_container")?;

				return Ok(None);
			}

			let callbacks = ContainerCallbacks {
				on_modal_toggled: config.on_modal_stream_toggled,
				..Default::default()
			};
			let handle = self
				.create(
					"modal_stream_container",
					config.stream_container_id,
					callbacks,
					Teardown::Destroy,
				)
				.await?;

			Ok(Some(handle))
		})
	}

	fn request_user_metrics<'a>(&'a self) -> PlatformFuture<'a, Box<dyn UserMetrics>> {
		Box::pin(async move {
			self.0.metrics_requests.fetch_add(1, Ordering::SeqCst);
			self.0.enter("request_user_metrics")?;

			let metrics = self.0.metrics.lock().clone();

			Ok(Box::new(metrics) as Box<dyn UserMetrics>)
		})
	}

	fn logout<'a>(&'a self) -> PlatformFuture<'a, ()> {
		Box::pin(async move {
			self.0.enter("logout")?;
			self.0.logouts.fetch_add(1, Ordering::SeqCst);

			Ok(())
		})
	}

	fn send_custom_event<'a>(&'a self, event: CustomEvent) -> PlatformFuture<'a, ()> {
		Box::pin(async move {
			self.0.enter("send_custom_event")?;
			self.0.events.lock().push(event);

			Ok(())
		})
	}
}
impl Debug for FakePlatform {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FakePlatform")
			.field("creations", &self.creations())
			.field("teardowns", &self.teardowns())
			.field("live", &self.live_instances())
			.finish()
	}
}
