//! Handles returned by container-creation calls and their uniform teardown.

// self
use crate::_prelude::*;

/// Instance object that exposes stop or destroy methods.
pub trait InstanceControl
where
	Self: Send,
{
	/// Stops rendering. Returns `false` when the instance has no stop method.
	fn stop(&mut self) -> bool {
		false
	}

	/// Destroys the instance. Returns `false` when the instance has no destroy method.
	fn destroy(&mut self) -> bool {
		false
	}
}

/// Whatever a creation call hands back; shapes vary between platform versions.
pub enum PlatformHandle {
	/// A bare teardown function.
	Teardown(Box<dyn FnOnce() + Send>),
	/// An instance object with stop or destroy methods.
	Instance(Box<dyn InstanceControl>),
	/// Nothing to tear down.
	Detached,
}
impl PlatformHandle {
	/// Wraps a teardown closure.
	pub fn from_fn(f: impl FnOnce() + Send + 'static) -> Self {
		Self::Teardown(Box::new(f))
	}

	/// Wraps an instance object.
	pub fn from_instance(instance: impl InstanceControl + 'static) -> Self {
		Self::Instance(Box::new(instance))
	}

	/// Runs the teardown this handle supports: the closure, else `stop`, else `destroy`.
	pub fn teardown(self) {
		match self {
			Self::Teardown(f) => f(),
			Self::Instance(mut instance) =>
				if !instance.stop() && !instance.destroy() {
					tracing::debug!("Container instance exposes neither stop nor destroy.");
				},
			Self::Detached => {},
		}
	}

	/// Shape name for diagnostics.
	pub fn shape(&self) -> &'static str {
		match self {
			Self::Teardown(_) => "teardown",
			Self::Instance(_) => "instance",
			Self::Detached => "detached",
		}
	}
}
impl Debug for PlatformHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("PlatformHandle").field(&self.shape()).finish()
	}
}
