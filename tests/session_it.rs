#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use card_host::{
	_preludet::*,
	auth::SubjectId,
	config::HostConfig,
	container::{BinderConfig, ContainerKind, StreamContainerId},
	error::{AuthError, PlatformError},
	http::HttpTokenIssuer,
	platform::{CustomEvent, MountPoint},
	prefs::Theme,
	session::HostSession,
	store::{MemoryStore, SessionStore, StorageKey},
};

struct Harness {
	session: HostSession,
	platform: FakePlatform,
	store: MemoryStore,
}

fn build_session(server: &MockServer) -> Harness {
	let platform = FakePlatform::default();
	let store = MemoryStore::default();
	let config = test_platform_config(&server.base_url());
	let issuer = HttpTokenIssuer::with_http_client(config.clone(), test_reqwest_http_client());
	let session = HostSession::new(
		Arc::new(platform.clone()),
		config,
		&HostConfig::default(),
		Arc::new(store.clone()) as Arc<dyn SessionStore>,
		Arc::new(issuer),
	);

	Harness { session, platform, store }
}

async fn mock_token(server: &MockServer, subject: &str) {
	let body = format!("{{\"data\":{{\"token\":\"{}\"}}}}", jwt_expiring_in(3_600));

	server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/env-test/unauthenticated-token/{subject}/test_key_2"));
			then.status(200).body(body);
		})
		.await;
}

fn subject(raw: &str) -> SubjectId {
	SubjectId::new(raw).expect("Subject fixture should be valid.")
}

fn carousel() -> BinderConfig {
	BinderConfig::new(
		ContainerKind::ListHorizontal,
		StreamContainerId::new("gp3EkNqm").expect("Container fixture should be valid."),
	)
}

#[tokio::test]
async fn initialize_registers_the_delegate_once() {
	let server = MockServer::start_async().await;
	let token = jwt_expiring_in(3_600);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/env-test/unauthenticated-token/user-1/test_key_2");
			then.status(200).body(format!("{{\"data\":{{\"token\":\"{token}\"}}}}"));
		})
		.await;
	let Harness { session, platform, .. } = build_session(&server);

	session.switch_identity(&subject("user-1"), "Ada").await.expect("Switch should succeed.");

	assert!(!session.is_ready());

	session.initialize().expect("First initialisation should succeed.");
	session.initialize().expect("Repeated initialisation should be a no-op.");

	assert!(session.is_ready());
	assert_eq!(
		platform.calls().iter().filter(|call| **call == "initialise").count(),
		1,
		"The SDK should be initialised exactly once."
	);
	assert_eq!(
		platform.initialised().map(|config| config.environment_id),
		Some("env-test".into())
	);

	let (a, b) = tokio::join!(platform.request_token(), platform.request_token());

	assert_eq!(a.as_deref(), Ok(token.as_str()));
	assert_eq!(b, a);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn initialise_failures_leave_the_session_unready() {
	let server = MockServer::start_async().await;
	let Harness { session, platform, .. } = build_session(&server);

	platform.fail("initialise");

	assert!(session.initialize().is_err());
	assert!(!session.is_ready());
	assert!(!platform.calls().contains(&"set_session_delegate"));
}

#[tokio::test]
async fn switch_identity_surfaces_issuer_rejections() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/env-test/unauthenticated-token/user-2/test_key_2");
			then.status(403).body("{\"errors\":[{\"title\":\"Environment disabled\"}]}");
		})
		.await;

	let Harness { session, .. } = build_session(&server);

	session.initialize().expect("Initialisation should succeed.");

	let err = session
		.switch_identity(&subject("user-2"), "Grace")
		.await
		.expect_err("Issuer rejections should reach the caller.");

	match err {
		Error::Auth(AuthError::Rejected { message, status }) => {
			assert_eq!(message, "Environment disabled");
			assert_eq!(status, Some(403));
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn changing_subjects_releases_every_container() {
	let server = MockServer::start_async().await;

	mock_token(&server, "user-1").await;
	mock_token(&server, "user-3").await;

	let Harness { session, platform, .. } = build_session(&server);

	session.switch_identity(&subject("user-1"), "Ada").await.expect("Switch should succeed.");
	session.initialize().expect("Initialisation should succeed.");

	let binder = session.binder(carousel());

	binder.attach(Some(MountPoint::new("#home"))).await.expect("Attach should succeed.");
	session.switch_identity(&subject("user-1"), "Ada L.").await.expect("Rename should succeed.");

	assert_eq!(session.registry().len(), 1, "A display-name change should keep containers.");

	session.switch_identity(&subject("user-3"), "Hedy").await.expect("Switch should succeed.");

	assert!(session.registry().is_empty());
	assert_eq!(platform.teardowns(), 1);
}

#[tokio::test]
async fn containers_are_released_before_the_outgoing_credential_is_dropped() {
	let server = MockServer::start_async().await;

	mock_token(&server, "user-1").await;
	mock_token(&server, "user-3").await;

	let Harness { session, platform, store } = build_session(&server);

	session.initialize().expect("Initialisation should succeed.");
	session.switch_identity(&subject("user-1"), "Ada").await.expect("Switch should succeed.");

	let outgoing =
		store.get(StorageKey::CachedToken).expect("Memory store reads should succeed.");

	assert!(outgoing.is_some(), "A ready session should fetch the first token eagerly.");

	let binder = session.binder(carousel());

	binder.attach(Some(MountPoint::new("#home"))).await.expect("Attach should succeed.");

	let seen = Arc::new(Mutex::new(Vec::new()));

	platform.on_teardown({
		let store = store.clone();
		let seen = seen.clone();

		move || {
			seen.lock().push((
				store.get(StorageKey::SubjectId).ok().flatten(),
				store.get(StorageKey::CachedToken).ok().flatten(),
			));
		}
	});
	session.switch_identity(&subject("user-3"), "Hedy").await.expect("Switch should succeed.");

	assert_eq!(*seen.lock(), vec![(Some("user-1".to_owned()), outgoing)]);
	assert_eq!(
		store.get(StorageKey::SubjectId).expect("Memory store reads should succeed."),
		Some("user-3".to_owned())
	);
	assert!(session.registry().is_empty());
}

#[tokio::test]
async fn logout_clears_identity_containers_and_readiness() {
	let server = MockServer::start_async().await;
	let Harness { session, platform, store } = build_session(&server);

	session.switch_identity(&subject("user-1"), "Ada").await.expect("Switch should succeed.");
	session.initialize().expect("Initialisation should succeed.");
	session
		.registry()
		.acquire(carousel().descriptor(MountPoint::new("#home")), Default::default())
		.await
		.expect("Acquire should succeed.");
	platform.fail("logout");
	session.logout().await.expect("Logout should tolerate platform failures.");

	assert!(!session.is_ready());
	assert!(session.registry().is_empty());
	assert_eq!(
		store.get(StorageKey::SubjectId).expect("Memory store reads should succeed."),
		None
	);
	assert_eq!(platform.logouts(), 0);
}

#[tokio::test]
async fn custom_events_require_an_initialised_sdk() {
	let server = MockServer::start_async().await;
	let Harness { session, platform, .. } = build_session(&server);

	assert!(matches!(
		session.reset_banner().await,
		Err(Error::Platform(PlatformError::NotInitialised))
	));

	session.initialize().expect("Initialisation should succeed.");
	session.reset_banner().await.expect("Reset should be sent.");
	session
		.send_custom_event(CustomEvent::new("offerViewed").with_property("slot", "banner"))
		.await
		.expect("Event should be sent.");

	let events = platform.events();

	assert_eq!(events.len(), 2);
	assert_eq!(events[0].event_name, CustomEvent::RESET_BANNER);
	assert_eq!(
		events[1].properties.as_ref().and_then(|props| props.get("slot")),
		Some(&serde_json::Value::from("banner"))
	);
}

#[tokio::test]
async fn theme_preference_round_trips_through_the_store() {
	let server = MockServer::start_async().await;
	let Harness { session, store, .. } = build_session(&server);

	assert_eq!(session.theme(), Theme::System);

	session.set_theme(Theme::Dark).expect("Theme should persist.");

	assert_eq!(session.theme(), Theme::Dark);
	assert_eq!(
		store.get(StorageKey::Theme).expect("Memory store reads should succeed."),
		Some("dark".into())
	);
}
