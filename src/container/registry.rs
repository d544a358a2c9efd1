//! Slot-keyed store of live container instances.
//!
//! The registry is the only owner of the live map. Every operation on a slot first takes that
//! slot's async guard, so an acquire and a release on the same key never interleave and a
//! release issued mid-acquire tears down the instance once it exists. Entries are inserted only
//! after the platform produced a handle; a failed acquire leaves the slot empty.

// std
use std::{
	panic::{self, AssertUnwindSafe},
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	container::{
		ContainerDescriptor, ContainerKind, SlotKey, StreamContainerId, construct, guarded,
	},
	obs::{self, OpKind, OpOutcome, OpSpan},
	platform::{
		ContainerCallbacks, CountCallback, EmbedPlatform, PlatformHandle, SizeCallback,
		ToggleCallback,
	},
};

type CountCell = Arc<Mutex<Option<(u32, u32)>>>;

struct LiveEntry {
	instance_id: u64,
	kind: ContainerKind,
	container_id: StreamContainerId,
	handle: Mutex<Option<PlatformHandle>>,
	counts: CountCell,
}
impl LiveEntry {
	/// Runs the platform teardown at most once.
	fn teardown(&self, slot: &SlotKey) {
		let Some(handle) = self.handle.lock().take() else {
			return;
		};
		let shape = handle.shape();

		if panic::catch_unwind(AssertUnwindSafe(|| handle.teardown())).is_err() {
			tracing::error!(slot = %slot, shape, "Container teardown panicked.");
		} else {
			tracing::debug!(
				slot = %slot,
				shape,
				instance = self.instance_id,
				"Container torn down."
			);
		}
	}
}

/// Names one live instance; used to release exactly that instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerHandle {
	slot_key: SlotKey,
	instance_id: u64,
	kind: ContainerKind,
	container_id: StreamContainerId,
}
impl ContainerHandle {
	/// Slot the instance occupies.
	pub fn slot_key(&self) -> &SlotKey {
		&self.slot_key
	}

	/// Registry-unique instance number.
	pub fn instance_id(&self) -> u64 {
		self.instance_id
	}

	/// Kind the instance was created as.
	pub fn kind(&self) -> ContainerKind {
		self.kind
	}

	/// Stream container rendered.
	pub fn container_id(&self) -> &StreamContainerId {
		&self.container_id
	}
}

/// Keyed store of live containers, at most one per slot.
pub struct ContainerRegistry {
	platform: Arc<dyn EmbedPlatform>,
	live: Mutex<HashMap<SlotKey, Arc<LiveEntry>>>,
	slot_guards: Mutex<HashMap<SlotKey, Arc<AsyncMutex<()>>>>,
	next_instance: AtomicU64,
}
impl ContainerRegistry {
	/// Creates an empty registry creating containers through `platform`.
	pub fn new(platform: Arc<dyn EmbedPlatform>) -> Self {
		Self {
			platform,
			live: Mutex::new(HashMap::new()),
			slot_guards: Mutex::new(HashMap::new()),
			next_instance: AtomicU64::new(0),
		}
	}

	/// Platform containers are created through.
	pub fn platform(&self) -> &Arc<dyn EmbedPlatform> {
		&self.platform
	}

	/// Creates the container `descriptor` names, replacing any instance in its slot.
	///
	/// Configuration errors are returned before the slot is touched. On a platform failure the
	/// previous instance is already gone and the slot stays empty.
	pub async fn acquire(
		&self,
		descriptor: ContainerDescriptor,
		callbacks: ContainerCallbacks,
	) -> Result<ContainerHandle> {
		const KIND: OpKind = OpKind::Acquire;

		descriptor.validate()?;

		let slot = descriptor.slot_key.clone();
		let kind = descriptor.kind;
		let span = OpSpan::for_slot(KIND, "acquire", &slot);
		let guard = self.slot_guard(&slot);

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _permit = guard.lock().await;

				self.teardown_current(&slot);

				let counts = CountCell::default();
				let wrapped = wrap_callbacks(&slot, callbacks, counts.clone());
				let handle = construct::create(self.platform.as_ref(), &descriptor, wrapped)
					.await
					.inspect_err(|e| tracing::warn!(error = %e, "Container creation failed."))?;
				let instance_id = self.next_instance.fetch_add(1, Ordering::Relaxed) + 1;
				let entry = LiveEntry {
					instance_id,
					kind: descriptor.kind,
					container_id: descriptor.container_id.clone(),
					handle: Mutex::new(Some(handle)),
					counts,
				};

				self.live.lock().insert(slot.clone(), Arc::new(entry));
				tracing::debug!(
					instance = instance_id,
					kind = %descriptor.kind,
					"Container acquired."
				);

				Ok(ContainerHandle {
					slot_key: slot,
					instance_id,
					kind: descriptor.kind,
					container_id: descriptor.container_id,
				})
			})
			.await;

		obs::record_op_outcome(KIND, OpOutcome::of(&result));
		obs::record_container_outcome(kind, OpOutcome::of(&result));
		obs::record_live_containers(self.len());

		result
	}

	/// Tears down the instance in `slot`; unknown or empty slots are a no-op.
	///
	/// Returns `true` when an instance was torn down.
	pub async fn release(&self, slot: &SlotKey) -> bool {
		let guard = self.slot_guard(slot);
		let _permit = guard.lock().await;

		OpSpan::for_slot(OpKind::Release, "release", slot).in_scope(|| self.teardown_current(slot))
	}

	/// Tears down the named instance only if it still occupies its slot.
	pub async fn release_handle(&self, handle: &ContainerHandle) -> bool {
		let slot = handle.slot_key();
		let guard = self.slot_guard(slot);
		let _permit = guard.lock().await;
		let entry = {
			let mut live = self.live.lock();

			match live.get(slot) {
				Some(entry) if entry.instance_id == handle.instance_id => live.remove(slot),
				_ => None,
			}
		};

		match entry {
			Some(entry) => {
				OpSpan::for_slot(OpKind::Release, "release_handle", slot)
					.in_scope(|| entry.teardown(slot));
				obs::record_op_outcome(OpKind::Release, OpOutcome::Success);
				obs::record_live_containers(self.len());

				true
			},
			None => {
				tracing::debug!(slot = %slot, "Stale handle release ignored.");

				false
			},
		}
	}

	/// Tears down every live instance, waiting out acquires in flight.
	///
	/// Returns how many instances were torn down.
	pub async fn release_all(&self) -> usize {
		let slots: Vec<SlotKey> = self.slot_guards.lock().keys().cloned().collect();
		let mut released = 0;

		for slot in slots {
			if self.release(&slot).await {
				released += 1;
			}
		}

		tracing::debug!(released, "All containers released.");

		released
	}

	/// Number of live instances.
	pub fn len(&self) -> usize {
		self.live.lock().len()
	}

	/// Returns `true` when no instance is live.
	pub fn is_empty(&self) -> bool {
		self.live.lock().is_empty()
	}

	/// Returns `true` when `slot` holds a live instance.
	pub fn contains(&self, slot: &SlotKey) -> bool {
		self.live.lock().contains_key(slot)
	}

	/// Returns `true` when `handle` still names the instance in its slot.
	pub fn is_current(&self, handle: &ContainerHandle) -> bool {
		self.live
			.lock()
			.get(handle.slot_key())
			.is_some_and(|entry| entry.instance_id == handle.instance_id)
	}

	/// Slot keys with a live instance, sorted.
	pub fn slot_keys(&self) -> Vec<SlotKey> {
		let mut keys: Vec<SlotKey> = self.live.lock().keys().cloned().collect();

		keys.sort();

		keys
	}

	/// Latest `(visible, total)` counts the live instance in `slot` reported.
	pub fn live_counts(&self, slot: &SlotKey) -> Option<(u32, u32)> {
		let entry = self.live.lock().get(slot).cloned()?;

		*entry.counts.lock()
	}

	fn teardown_current(&self, slot: &SlotKey) -> bool {
		let entry = self.live.lock().remove(slot);
		let Some(entry) = entry else {
			return false;
		};

		tracing::debug!(
			slot = %slot,
			kind = %entry.kind,
			container = %entry.container_id,
			"Releasing container."
		);
		entry.teardown(slot);
		obs::record_op_outcome(OpKind::Release, OpOutcome::Success);
		obs::record_live_containers(self.len());

		true
	}

	fn slot_guard(&self, slot: &SlotKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.slot_guards.lock();

		guards.entry(slot.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl Debug for ContainerRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ContainerRegistry").field("live", &self.slot_keys()).finish()
	}
}
impl Drop for ContainerRegistry {
	fn drop(&mut self) {
		for (slot, entry) in self.live.get_mut().drain() {
			entry.teardown(&slot);
		}
	}
}

fn wrap_callbacks(
	slot: &SlotKey,
	callbacks: ContainerCallbacks,
	counts: CountCell,
) -> ContainerCallbacks {
	let ContainerCallbacks { on_card_count_changed, on_size_changed, on_modal_toggled } = callbacks;
	let count_slot = slot.clone();
	let on_count: CountCallback = Arc::new(move |visible, total| {
		*counts.lock() = Some((visible, total));

		if let Some(f) = &on_card_count_changed {
			guarded(&count_slot, "card_count_changed", || f(visible, total));
		}
	});
	let on_size = on_size_changed.map(|f| {
		let slot = slot.clone();

		Arc::new(move |width, height| guarded(&slot, "size_changed", || f(width, height)))
			as SizeCallback
	});
	let on_toggle = on_modal_toggled.map(|f| {
		let slot = slot.clone();

		Arc::new(move |is_open| guarded(&slot, "modal_toggled", || f(is_open)))
			as ToggleCallback
	});

	ContainerCallbacks {
		on_card_count_changed: Some(on_count),
		on_size_changed: on_size,
		on_modal_toggled: on_toggle,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::FakePlatform, platform::MountPoint};

	fn banner(id: &str) -> ContainerDescriptor {
		ContainerDescriptor::new(
			ContainerKind::Banner,
			StreamContainerId::new(id).expect("Container fixture should be valid."),
		)
		.with_mount(MountPoint::new("#banner"))
	}

	#[tokio::test]
	async fn reacquire_replaces_the_previous_instance() {
		let platform = Arc::new(FakePlatform::default());
		let registry = ContainerRegistry::new(platform.clone());
		let first = registry
			.acquire(banner("xWM8Pmqa"), ContainerCallbacks::default())
			.await
			.expect("First acquire should succeed.");
		let second = registry
			.acquire(banner("xWM8Pmqa"), ContainerCallbacks::default())
			.await
			.expect("Second acquire should succeed.");

		assert_eq!(registry.len(), 1);
		assert_ne!(first.instance_id(), second.instance_id());
		assert_eq!(platform.teardowns(), 1);
		assert!(!registry.is_current(&first));
		assert!(registry.is_current(&second));
	}

	#[tokio::test]
	async fn counts_are_recorded_even_when_the_user_callback_panics() {
		let platform = Arc::new(FakePlatform::default());
		let registry = ContainerRegistry::new(platform.clone());
		let callbacks = ContainerCallbacks::default().on_card_count_changed(|_, _| panic!("boom"));
		let handle = registry
			.acquire(banner("xWM8Pmqa"), callbacks)
			.await
			.expect("Acquire should succeed.");

		platform.emit_counts(handle.container_id(), 2, 5);

		assert_eq!(registry.live_counts(handle.slot_key()), Some((2, 5)));
	}

	#[tokio::test]
	async fn drop_tears_down_live_instances() {
		let platform = Arc::new(FakePlatform::default());
		let registry = ContainerRegistry::new(platform.clone());

		registry
			.acquire(banner("xWM8Pmqa"), ContainerCallbacks::default())
			.await
			.expect("Acquire should succeed.");
		drop(registry);

		assert_eq!(platform.teardowns(), 1);
	}
}
