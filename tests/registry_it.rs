// std
use std::time::Duration as StdDuration;
// self
use card_host::{
	_preludet::*,
	container::{
		ContainerDescriptor, ContainerHandle, ContainerKind, ContainerRegistry, SlotKey,
		StreamContainerId,
	},
	platform::{ContainerCallbacks, MountPoint},
};

fn id(raw: &str) -> StreamContainerId {
	StreamContainerId::new(raw).expect("Container fixture should be valid.")
}

fn mounted(kind: ContainerKind, raw: &str) -> ContainerDescriptor {
	ContainerDescriptor::new(kind, id(raw)).with_mount(MountPoint::new(format!("#{raw}")))
}

async fn acquire(
	registry: &ContainerRegistry,
	descriptor: ContainerDescriptor,
) -> ContainerHandle {
	registry
		.acquire(descriptor, ContainerCallbacks::default())
		.await
		.expect("Acquire should succeed.")
}

fn build_registry() -> (Arc<ContainerRegistry>, FakePlatform) {
	let platform = FakePlatform::default();
	let registry = Arc::new(ContainerRegistry::new(Arc::new(platform.clone())));

	(registry, platform)
}

#[tokio::test]
async fn each_slot_holds_at_most_one_live_instance() {
	let (registry, platform) = build_registry();

	for _ in 0..4 {
		acquire(&registry, mounted(ContainerKind::ListHorizontal, "gp3EkNqm")).await;
	}

	assert_eq!(registry.len(), 1);
	assert_eq!(platform.live_instances(), 1);
	assert_eq!(platform.creations(), 4);
	assert_eq!(platform.teardowns(), 3);
}

#[tokio::test]
async fn same_container_in_different_kinds_uses_separate_slots() {
	let (registry, platform) = build_registry();

	acquire(&registry, mounted(ContainerKind::ListVertical, "gp3EkNqm")).await;
	acquire(&registry, mounted(ContainerKind::Single, "gp3EkNqm")).await;

	assert_eq!(
		registry.slot_keys().iter().map(ToString::to_string).collect::<Vec<_>>(),
		["gp3EkNqm", "single-gp3EkNqm"]
	);
	assert_eq!(platform.live_operations(), ["embed", "single_card"]);
}

#[tokio::test]
async fn release_is_idempotent() {
	let (registry, platform) = build_registry();
	let handle = acquire(&registry, mounted(ContainerKind::Banner, "xWM8Pmqa")).await;

	assert!(registry.release(handle.slot_key()).await);
	assert!(!registry.release(handle.slot_key()).await);
	assert!(!registry.release(&SlotKey::new("never-used").expect("Slot should be valid.")).await);
	assert_eq!(platform.teardowns(), 1);
}

#[tokio::test]
async fn release_all_empties_the_registry() {
	let (registry, platform) = build_registry();
	let descriptors = [
		mounted(ContainerKind::ListHorizontal, "gp3EkNqm"),
		mounted(ContainerKind::ListVertical, "2b9Y7gJd"),
		mounted(ContainerKind::Single, "6JxzG5Va"),
		mounted(ContainerKind::Banner, "xWM8Pmqa"),
		ContainerDescriptor::new(ContainerKind::Modal, id("95DrmdWz")),
	];

	for descriptor in descriptors {
		acquire(&registry, descriptor).await;
	}

	assert_eq!(registry.len(), 5);
	assert_eq!(registry.release_all().await, 5);
	assert!(registry.is_empty());
	assert_eq!(platform.live_instances(), 0);
	assert_eq!(registry.release_all().await, 0);
}

#[tokio::test(start_paused = true)]
async fn release_waits_for_an_acquire_in_flight() {
	let (registry, platform) = build_registry();

	platform.set_create_delay(StdDuration::from_millis(250));

	let acquiring = tokio::spawn({
		let registry = registry.clone();

		let descriptor = mounted(ContainerKind::Banner, "xWM8Pmqa");

		async move { registry.acquire(descriptor, ContainerCallbacks::default()).await }
	});

	for _ in 0..3 {
		tokio::task::yield_now().await;
	}

	let slot = ContainerDescriptor::default_slot_key(ContainerKind::Banner, &id("xWM8Pmqa"));

	assert!(registry.release(&slot).await, "Release should tear down the instance it waited for.");

	let handle = acquiring
		.await
		.expect("Acquire task should not panic.")
		.expect("Acquire should succeed.");

	assert!(!registry.is_current(&handle));
	assert!(registry.is_empty());
	assert_eq!(platform.live_instances(), 0);
}

#[tokio::test]
async fn stale_handles_do_not_release_their_replacement() {
	let (registry, platform) = build_registry();
	let first = acquire(&registry, mounted(ContainerKind::Banner, "xWM8Pmqa")).await;
	let second = acquire(&registry, mounted(ContainerKind::Banner, "xWM8Pmqa")).await;

	assert!(!registry.release_handle(&first).await);
	assert!(registry.is_current(&second));
	assert!(registry.release_handle(&second).await);
	assert_eq!(platform.teardowns(), 2);
}

#[tokio::test]
async fn failed_creation_leaves_the_slot_empty() {
	let (registry, platform) = build_registry();

	acquire(&registry, mounted(ContainerKind::Single, "6JxzG5Va")).await;
	platform.fail("single_card");

	let err = registry
		.acquire(mounted(ContainerKind::Single, "6JxzG5Va"), ContainerCallbacks::default())
		.await
		.expect_err("Scripted failures should surface.");

	assert!(matches!(err, Error::Platform(_)));
	assert!(registry.is_empty());
	assert_eq!(platform.teardowns(), 1);

	platform.recover("single_card");

	acquire(&registry, mounted(ContainerKind::Single, "6JxzG5Va")).await;

	assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn configuration_errors_leave_the_previous_instance_alone() {
	let (registry, platform) = build_registry();

	acquire(&registry, mounted(ContainerKind::Banner, "xWM8Pmqa")).await;

	let unmounted = ContainerDescriptor::new(ContainerKind::Banner, id("xWM8Pmqa"));

	assert!(matches!(
		registry.acquire(unmounted, ContainerCallbacks::default()).await,
		Err(Error::Config(_))
	));
	assert_eq!(registry.len(), 1);
	assert_eq!(platform.teardowns(), 0);
}
