//! Embedded-content containers: descriptors, the slot-keyed registry, and per-slot binders.

pub mod binder;
pub mod descriptor;
pub mod kind;
pub mod modal;
pub mod registry;

mod construct;

pub use binder::*;
pub use descriptor::*;
pub use kind::ContainerKind;
pub use modal::ModalController;
pub use registry::*;

// std
use std::panic::{self, AssertUnwindSafe};
// self
use crate::{_prelude::*, auth::def_id};

def_id! { StreamContainerId, "Platform stream container identifier.", "Stream container" }
def_id! { SlotKey, "Logical placement key; at most one live container per key.", "Slot" }

/// Runs a callback body, logging instead of unwinding when it panics.
pub(crate) fn guarded(slot: &SlotKey, callback: &'static str, f: impl FnOnce()) {
	if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
		let message = payload
			.downcast_ref::<&str>()
			.map(|s| (*s).to_owned())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "non-string panic payload".into());

		tracing::error!(
			slot = %slot,
			callback,
			message,
			"Container callback panicked; update dropped."
		);
	}
}
