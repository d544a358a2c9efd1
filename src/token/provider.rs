//! Session-token provider with a cache fast path and coalesced issuance.
//!
//! [`TokenProvider::get_token`] is the platform's authentication callback. The platform may ask
//! for a token on every container it creates, so a valid cached credential is returned without
//! touching the network. On a miss every concurrent caller awaits the same shared fetch. Each
//! fetch is stamped with the provider's generation; an identity change or logout bumps the
//! generation, and a fetch that finishes afterwards hands its token to its waiters but never
//! writes it into the cache.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use futures_util::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{Credential, IdentityDirectory, SubjectId},
	error::AuthError,
	obs::{self, OpKind, OpOutcome, OpSpan},
	platform::SessionDelegate,
	store::StoreError,
	token::{IssueRequest, TokenCache, TokenIssuer, TokenMetrics},
};

type SharedFetch = Shared<BoxFuture<'static, Result<String, AuthError>>>;

struct InFlight {
	generation: u64,
	fetch: SharedFetch,
}

struct ProviderInner {
	cache: TokenCache,
	identity: IdentityDirectory,
	issuer: Arc<dyn TokenIssuer>,
	in_flight: Mutex<Option<InFlight>>,
	generation: AtomicU64,
	metrics: TokenMetrics,
}

/// Cheaply cloneable handle; clones share one cache and one in-flight fetch.
#[derive(Clone)]
pub struct TokenProvider(Arc<ProviderInner>);
impl TokenProvider {
	/// Creates a provider over the cache, identity directory, and issuer.
	pub fn new(
		cache: TokenCache,
		identity: IdentityDirectory,
		issuer: Arc<dyn TokenIssuer>,
	) -> Self {
		Self(Arc::new(ProviderInner {
			cache,
			identity,
			issuer,
			in_flight: Mutex::new(None),
			generation: AtomicU64::new(0),
			metrics: TokenMetrics::default(),
		}))
	}

	/// Token cache backing this provider.
	pub fn cache(&self) -> &TokenCache {
		&self.0.cache
	}

	/// Identity directory the issuance requests are built from.
	pub fn identity(&self) -> &IdentityDirectory {
		&self.0.identity
	}

	/// Lookup counters.
	pub fn metrics(&self) -> &TokenMetrics {
		&self.0.metrics
	}

	/// Returns a usable bearer token, fetching one when the cache cannot serve it.
	pub async fn get_token(&self) -> Result<String, AuthError> {
		self.get_token_at(OffsetDateTime::now_utc()).await
	}

	/// [`TokenProvider::get_token`] evaluated against an explicit clock reading.
	pub async fn get_token_at(&self, now: OffsetDateTime) -> Result<String, AuthError> {
		if let Some(credential) = self.0.cache.read_valid_at(now) {
			self.0.metrics.record_cache_hit();

			return Ok(credential.token.into_inner());
		}

		let fetch = self.join_or_start();
		let result = fetch.clone().await;
		let mut slot = self.0.in_flight.lock();

		if slot.as_ref().is_some_and(|in_flight| in_flight.fetch.ptr_eq(&fetch)) {
			*slot = None;
		}

		result
	}

	/// Wraps [`TokenProvider::get_token`] as the callback the platform SDK invokes.
	pub fn session_delegate(&self) -> SessionDelegate {
		let provider = self.clone();

		Arc::new(move || {
			let provider = provider.clone();

			Box::pin(async move { provider.get_token().await })
		})
	}

	/// Drops the cached credential and detaches any in-flight fetch from the cache.
	pub fn invalidate(&self) -> Result<(), StoreError> {
		let mut slot = self.0.in_flight.lock();

		self.0.generation.fetch_add(1, Ordering::AcqRel);
		*slot = None;

		self.0.cache.clear()
	}

	/// Persists a new identity; a changed subject invalidates the cached credential.
	///
	/// Returns `true` when the subject changed.
	pub fn switch_identity(
		&self,
		subject: &SubjectId,
		display_name: &str,
	) -> Result<bool, StoreError> {
		self.0.identity.set_display_name(display_name)?;

		let changed = self.0.identity.set_subject_id(subject)?;

		if changed {
			tracing::info!(subject = %subject, "Identity changed; cached credential invalidated.");
			self.invalidate()?;
		}

		Ok(changed)
	}

	/// Forgets the identity and the cached credential.
	pub fn logout(&self) -> Result<(), StoreError> {
		self.0.identity.clear()?;
		self.invalidate()
	}

	fn join_or_start(&self) -> SharedFetch {
		let mut slot = self.0.in_flight.lock();
		let generation = self.0.generation.load(Ordering::Acquire);

		if let Some(in_flight) = slot.as_ref().filter(|in_flight| {
			in_flight.generation == generation && in_flight.fetch.peek().is_none()
		}) {
			return in_flight.fetch.clone();
		}

		let fetch = Self::fetch(self.0.clone(), generation).boxed().shared();

		*slot = Some(InFlight { generation, fetch: fetch.clone() });

		fetch
	}

	async fn fetch(inner: Arc<ProviderInner>, generation: u64) -> Result<String, AuthError> {
		const KIND: OpKind = OpKind::TokenFetch;

		let span = OpSpan::new(KIND, "get_token");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let identity = inner.identity.identity()?;
				let request = IssueRequest {
					subject_id: identity.subject_id.clone(),
					claims: identity.claims(),
				};

				inner.metrics.record_issuance();

				let issued = inner.issuer.issue(&request).await.inspect_err(|e| {
					inner.metrics.record_failure();
					tracing::error!(error = %e, "Failed to fetch session token.");
				})?;
				let credential = Credential::from_issued(issued.token);

				if credential.expires_at.is_none() {
					tracing::debug!("Issued token has no readable expiry; it will not be reused.");
				}

				// Compared under the slot lock so an invalidation cannot interleave with the write.
				let slot = inner.in_flight.lock();

				if inner.generation.load(Ordering::Acquire) == generation {
					if let Err(e) = inner.cache.write(&credential) {
						tracing::warn!(error = %e, "Fresh credential could not be persisted.");
					}
				} else {
					tracing::debug!("Identity changed during fetch; result not cached.");
				}

				drop(slot);

				Ok(credential.token.into_inner())
			})
			.await;

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}
}
impl Debug for TokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("cache", &self.0.cache)
			.field("generation", &self.0.generation.load(Ordering::Relaxed))
			.field("fetch_in_flight", &self.0.in_flight.lock().is_some())
			.finish()
	}
}
