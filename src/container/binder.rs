//! Per-slot adapter between a UI mount point and the registry.
//!
//! A binder owns at most one registry instance. Attach, reconfigure, and unmount are sequenced by
//! an async lock around the bound handle, so a remount always releases before it acquires. Platform
//! callbacks land in a `watch` channel; callbacks from an instance the binder no longer owns are
//! ignored.

// std
use std::sync::{
	Weak,
	atomic::{AtomicU64, Ordering},
};
// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	container::{
		ContainerDescriptor, ContainerHandle, ContainerKind, ContainerRegistry, SlotKey,
		StreamContainerId, VisualParams,
	},
	platform::{ContainerCallbacks, MountPoint},
};

/// Observable container state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerState {
	/// Cards currently visible.
	pub visible_count: u32,
	/// Cards in the stream.
	pub total_count: u32,
	/// Rendered width in pixels.
	pub width: u32,
	/// Rendered height in pixels.
	pub height: u32,
	/// `true` until the platform reports at least one card.
	pub is_empty: bool,
}
impl Default for ContainerState {
	fn default() -> Self {
		Self { visible_count: 0, total_count: 0, width: 0, height: 0, is_empty: true }
	}
}

/// What a binder renders; the mount point is supplied separately through `attach`.
#[derive(Clone, Debug)]
pub struct BinderConfig {
	/// Creation path.
	pub kind: ContainerKind,
	/// Stream container rendered.
	pub container_id: StreamContainerId,
	/// Slot override; the kind's default key otherwise.
	pub slot_key: Option<SlotKey>,
	/// Visual parameters.
	pub visual: VisualParams,
	/// Caller callbacks, invoked after the binder state updates.
	pub callbacks: ContainerCallbacks,
}
impl BinderConfig {
	/// Config with default slot key, visuals, and no caller callbacks.
	pub fn new(kind: ContainerKind, container_id: StreamContainerId) -> Self {
		Self {
			kind,
			container_id,
			slot_key: None,
			visual: VisualParams::default(),
			callbacks: ContainerCallbacks::default(),
		}
	}

	/// Sets the carousel card width.
	pub fn with_card_width(mut self, width: u32) -> Self {
		self.visual.card_width = Some(width);

		self
	}

	/// Overrides the slot key.
	pub fn with_slot_key(mut self, slot_key: SlotKey) -> Self {
		self.slot_key = Some(slot_key);

		self
	}

	/// Sets caller callbacks.
	pub fn with_callbacks(mut self, callbacks: ContainerCallbacks) -> Self {
		self.callbacks = callbacks;

		self
	}

	/// Descriptor for rendering into `mount`.
	pub fn descriptor(&self, mount: MountPoint) -> ContainerDescriptor {
		let mut descriptor = ContainerDescriptor::new(self.kind, self.container_id.clone())
			.with_visual(self.visual.clone())
			.with_mount(mount);

		if let Some(slot_key) = &self.slot_key {
			descriptor.slot_key = slot_key.clone();
		}

		descriptor
	}

	fn slot(&self) -> SlotKey {
		self.slot_key
			.clone()
			.unwrap_or_else(|| ContainerDescriptor::default_slot_key(self.kind, &self.container_id))
	}

	fn identity(&self) -> (ContainerKind, SlotKey, Option<u32>) {
		(self.kind, self.slot(), self.visual.card_width)
	}
}

struct BinderInner {
	registry: Arc<ContainerRegistry>,
	config: Mutex<BinderConfig>,
	mount: Mutex<Option<MountPoint>>,
	bound: AsyncMutex<Option<ContainerHandle>>,
	epoch: AtomicU64,
	state: watch::Sender<ContainerState>,
}
impl BinderInner {
	async fn rebind(
		self: &Arc<Self>,
		bound: &mut Option<ContainerHandle>,
		mount: Option<MountPoint>,
	) -> Result<()> {
		let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;

		if let Some(previous) = bound.take() {
			self.registry.release_handle(&previous).await;
		}

		self.state.send_replace(ContainerState::default());

		let Some(mount) = mount else {
			return Ok(());
		};
		let descriptor = self.config.lock().descriptor(mount);

		match self.registry.acquire(descriptor, self.callbacks(epoch)).await {
			Ok(handle) => {
				*bound = Some(handle);

				Ok(())
			},
			Err(e) => {
				if matches!(e, Error::Platform(_)) {
					tracing::warn!(error = %e, "Container unavailable; showing empty state.");
				}

				Err(e)
			},
		}
	}

	fn callbacks(self: &Arc<Self>, epoch: u64) -> ContainerCallbacks {
		let on_count = Arc::downgrade(self);
		let on_size = Arc::downgrade(self);

		ContainerCallbacks::default()
			.on_card_count_changed(move |visible, total| {
				if let Some(inner) = live(&on_count, epoch) {
					inner.state.send_modify(|state| {
						state.visible_count = visible;
						state.total_count = total;
						state.is_empty = total == 0;
					});

					let callbacks = inner.config.lock().callbacks.clone();

					callbacks.card_count_changed(visible, total);
				}
			})
			.on_size_changed(move |width, height| {
				if let Some(inner) = live(&on_size, epoch) {
					inner.state.send_modify(|state| {
						state.width = width;
						state.height = height;
					});

					let callbacks = inner.config.lock().callbacks.clone();

					callbacks.size_changed(width, height);
				}
			})
	}
}

fn live(inner: &Weak<BinderInner>, epoch: u64) -> Option<Arc<BinderInner>> {
	inner.upgrade().filter(|inner| inner.epoch.load(Ordering::Acquire) == epoch)
}

/// Binds one UI slot to at most one registry instance.
pub struct ContainerBinder {
	inner: Arc<BinderInner>,
}
impl ContainerBinder {
	/// Creates an unmounted binder.
	pub fn new(registry: Arc<ContainerRegistry>, config: BinderConfig) -> Self {
		let (state, _) = watch::channel(ContainerState::default());

		Self {
			inner: Arc::new(BinderInner {
				registry,
				config: Mutex::new(config),
				mount: Mutex::new(None),
				bound: AsyncMutex::new(None),
				epoch: AtomicU64::new(0),
				state,
			}),
		}
	}

	/// Sets the mount point: releases any bound instance, then acquires into `mount` if present.
	pub async fn attach(&self, mount: Option<MountPoint>) -> Result<()> {
		let mut bound = self.inner.bound.lock().await;

		self.inner.mount.lock().clone_from(&mount);
		self.inner.rebind(&mut bound, mount).await
	}

	/// Replaces the config; re-acquires only when kind, slot key, or card width changed.
	///
	/// Returns `true` when a new instance was acquired.
	pub async fn reconfigure(&self, config: BinderConfig) -> Result<bool> {
		let mut bound = self.inner.bound.lock().await;
		let changed = {
			let mut current = self.inner.config.lock();
			let changed = current.identity() != config.identity();

			*current = config;

			changed
		};
		let mount = self.inner.mount.lock().clone();

		if !changed || mount.is_none() {
			return Ok(false);
		}

		self.inner.rebind(&mut bound, mount).await?;

		Ok(true)
	}

	/// Releases the bound instance and forgets the mount point.
	pub async fn unmount(&self) {
		// Without a mount point the rebind only releases, which cannot fail.
		let _ = self.attach(None).await;
	}

	/// Current state.
	pub fn state(&self) -> ContainerState {
		*self.inner.state.borrow()
	}

	/// Receiver notified on every state change.
	pub fn subscribe(&self) -> watch::Receiver<ContainerState> {
		self.inner.state.subscribe()
	}

	/// Slot this binder targets under its current config.
	pub fn slot_key(&self) -> SlotKey {
		self.inner.config.lock().slot()
	}

	/// Handle of the bound instance, if any.
	pub fn handle(&self) -> Option<ContainerHandle> {
		self.inner.bound.try_lock().and_then(|bound| bound.clone())
	}
}
impl Debug for ContainerBinder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ContainerBinder")
			.field("slot_key", &self.slot_key())
			.field("state", &self.state())
			.finish()
	}
}
impl Drop for ContainerBinder {
	fn drop(&mut self) {
		let inner = self.inner.clone();

		inner.epoch.fetch_add(1, Ordering::AcqRel);

		match tokio::runtime::Handle::try_current() {
			Ok(runtime) => {
				runtime.spawn(async move {
					let mut bound = inner.bound.lock().await;

					if let Some(handle) = bound.take() {
						inner.registry.release_handle(&handle).await;
					}
				});
			},
			Err(_) =>
				if self.inner.bound.try_lock().is_some_and(|bound| bound.is_some()) {
					tracing::warn!(
						slot = %self.slot_key(),
						"Binder dropped outside a runtime; container stays registered."
					);
				},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::FakePlatform;

	fn carousel() -> BinderConfig {
		BinderConfig::new(
			ContainerKind::ListHorizontal,
			StreamContainerId::new("gp3EkNqm").expect("Container fixture should be valid."),
		)
	}

	#[tokio::test]
	async fn callbacks_feed_the_observable_state() {
		let platform = Arc::new(FakePlatform::default());
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));
		let binder = ContainerBinder::new(registry, carousel());
		let mut rx = binder.subscribe();

		assert!(binder.state().is_empty);

		binder.attach(Some(MountPoint::new("#home"))).await.expect("Attach should succeed.");
		platform.emit_counts(&carousel().container_id, 2, 4);
		platform.emit_size(&carousel().container_id, 370, 180);

		rx.changed().await.expect("State sender should be alive.");

		assert_eq!(
			binder.state(),
			ContainerState {
				visible_count: 2,
				total_count: 4,
				width: 370,
				height: 180,
				is_empty: false
			}
		);

		platform.emit_counts(&carousel().container_id, 0, 0);

		assert!(binder.state().is_empty);
	}

	#[tokio::test]
	async fn reconfigure_reacquires_only_on_identity_changes() {
		let platform = Arc::new(FakePlatform::default());
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));
		let binder = ContainerBinder::new(registry.clone(), carousel());

		binder.attach(Some(MountPoint::new("#home"))).await.expect("Attach should succeed.");

		let mut titled = carousel();

		titled.visual.title = Some("Offers".into());

		assert!(!binder.reconfigure(titled).await.expect("Reconfigure should succeed."));
		assert_eq!(platform.creations(), 1);
		assert!(
			binder
				.reconfigure(carousel().with_card_width(340))
				.await
				.expect("Reconfigure should succeed.")
		);
		assert_eq!(platform.creations(), 2);
		assert_eq!(platform.teardowns(), 1);
		assert_eq!(registry.len(), 1);
	}

	#[tokio::test]
	async fn platform_failures_degrade_to_empty_state() {
		let platform = Arc::new(FakePlatform::default());
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));
		let binder = ContainerBinder::new(registry.clone(), carousel());

		platform.fail("embed");

		let err = binder
			.attach(Some(MountPoint::new("#home")))
			.await
			.expect_err("Platform failures should be reported.");

		assert!(matches!(err, Error::Platform(_)));
		assert_eq!(binder.state(), ContainerState::default());
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn stale_callbacks_do_not_touch_state() {
		let platform = Arc::new(FakePlatform::default());
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));
		let binder = ContainerBinder::new(registry, carousel());

		binder.attach(Some(MountPoint::new("#home"))).await.expect("Attach should succeed.");
		binder.unmount().await;
		platform.emit_counts_to_all(&carousel().container_id, 3, 3);

		assert_eq!(binder.state(), ContainerState::default());
	}

	#[tokio::test]
	async fn dropping_a_bound_binder_releases_its_container() {
		let platform = Arc::new(FakePlatform::default());
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));
		let binder = ContainerBinder::new(registry.clone(), carousel());

		binder.attach(Some(MountPoint::new("#home"))).await.expect("Attach should succeed.");
		drop(binder);

		while !registry.is_empty() {
			tokio::task::yield_now().await;
		}

		assert_eq!(platform.teardowns(), 1);
	}
}
