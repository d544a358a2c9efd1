//! Open/close state for a modal stream container.

// std
use std::sync::Weak;
// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	container::{
		ContainerDescriptor, ContainerHandle, ContainerKind, ContainerRegistry, StreamContainerId,
		VisualParams,
	},
	platform::ContainerCallbacks,
};

type CloseCallback = Arc<dyn Fn() + Send + Sync>;

struct ModalShared {
	registry: Weak<ContainerRegistry>,
	open: watch::Sender<bool>,
	handle: Mutex<Option<ContainerHandle>>,
	on_close: Option<CloseCallback>,
}
impl ModalShared {
	/// Platform reported the modal closed: flag it, release the instance, notify the host.
	fn closed_by_platform(&self) {
		if !self.open.send_replace(false) {
			return;
		}

		let handle = self.handle.lock().take();

		if let (Some(handle), Some(registry)) = (handle, self.registry.upgrade()) {
			match tokio::runtime::Handle::try_current() {
				Ok(runtime) => {
					runtime.spawn(async move {
						registry.release_handle(&handle).await;
					});
				},
				Err(_) => {
					tracing::warn!("Modal closed outside a runtime; instance stays registered.");
				},
			}
		}
		if let Some(on_close) = &self.on_close {
			on_close();
		}
	}
}

/// Launches and tracks one modal stream container.
pub struct ModalController {
	registry: Arc<ContainerRegistry>,
	container_id: StreamContainerId,
	max_width: Option<u32>,
	shared: Arc<ModalShared>,
}
impl ModalController {
	/// Creates a closed controller for `container_id`.
	pub fn new(registry: Arc<ContainerRegistry>, container_id: StreamContainerId) -> Self {
		Self::build(registry, container_id, None)
	}

	/// Creates a closed controller that calls `on_close` whenever the platform closes the modal.
	pub fn with_on_close(
		registry: Arc<ContainerRegistry>,
		container_id: StreamContainerId,
		on_close: impl Fn() + Send + Sync + 'static,
	) -> Self {
		Self::build(registry, container_id, Some(Arc::new(on_close)))
	}

	/// Overrides the maximum card width.
	pub fn with_max_width(mut self, width: u32) -> Self {
		self.max_width = Some(width);

		self
	}

	/// Launches the modal; a no-op while it is open.
	pub async fn open(&self) -> Result<()> {
		if self.is_open() {
			return Ok(());
		}

		let descriptor = ContainerDescriptor::new(ContainerKind::Modal, self.container_id.clone())
			.with_visual(VisualParams { max_width: self.max_width, ..Default::default() });
		let shared = Arc::downgrade(&self.shared);
		let callbacks = ContainerCallbacks::default().on_modal_toggled(move |is_open| {
			let Some(shared) = shared.upgrade() else {
				return;
			};

			if is_open {
				shared.open.send_replace(true);
			} else {
				shared.closed_by_platform();
			}
		});
		let handle = self.registry.acquire(descriptor, callbacks).await?;

		*self.shared.handle.lock() = Some(handle);
		self.shared.open.send_replace(true);

		Ok(())
	}

	/// Closes the modal from the host side. Returns `true` when an instance was torn down.
	pub async fn close(&self) -> bool {
		self.shared.open.send_replace(false);

		let handle = self.shared.handle.lock().take();

		match handle {
			Some(handle) => self.registry.release_handle(&handle).await,
			None => false,
		}
	}

	/// Whether the modal is currently open.
	pub fn is_open(&self) -> bool {
		*self.shared.open.borrow()
	}

	/// Receiver notified when the open state flips.
	pub fn subscribe(&self) -> watch::Receiver<bool> {
		self.shared.open.subscribe()
	}

	fn build(
		registry: Arc<ContainerRegistry>,
		container_id: StreamContainerId,
		on_close: Option<CloseCallback>,
	) -> Self {
		let (open, _) = watch::channel(false);
		let shared = Arc::new(ModalShared {
			registry: Arc::downgrade(&registry),
			open,
			handle: Mutex::new(None),
			on_close,
		});

		Self { registry, container_id, max_width: None, shared }
	}
}
impl Debug for ModalController {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ModalController")
			.field("container_id", &self.container_id)
			.field("open", &self.is_open())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::_preludet::FakePlatform;

	fn overlay() -> StreamContainerId {
		StreamContainerId::new("95DrmdWz").expect("Container fixture should be valid.")
	}

	#[tokio::test]
	async fn platform_close_releases_and_notifies() {
		let platform = Arc::new(FakePlatform::default());
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));
		let closes = Arc::new(AtomicUsize::new(0));
		let modal = ModalController::with_on_close(registry.clone(), overlay(), {
			let closes = closes.clone();

			move || {
				closes.fetch_add(1, Ordering::SeqCst);
			}
		});

		modal.open().await.expect("Modal should open.");

		assert!(modal.is_open());
		assert_eq!(registry.len(), 1);

		platform.toggle_modal(&overlay(), false);

		while !registry.is_empty() {
			tokio::task::yield_now().await;
		}

		assert!(!modal.is_open());
		assert_eq!(closes.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn declined_modals_stay_closed() {
		let platform = Arc::new(FakePlatform::default());
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));
		let modal = ModalController::new(registry.clone(), overlay()).with_max_width(320);

		platform.decline_modals();

		assert!(matches!(modal.open().await, Err(Error::Platform(_))));
		assert!(!modal.is_open());
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn host_close_tears_down_once() {
		let platform = Arc::new(FakePlatform::default());
		let registry = Arc::new(ContainerRegistry::new(platform.clone()));
		let modal = ModalController::new(registry, overlay());

		modal.open().await.expect("Modal should open.");

		assert!(modal.close().await);
		assert!(!modal.close().await);
		assert_eq!(platform.teardowns(), 1);
	}
}
