//! Polled card-count snapshots across the tracked stream containers.
//!
//! A [`MetricsAggregator`] keeps the latest [`MetricsSnapshot`] in a `watch` channel. Polling runs
//! only while at least one [`MetricsSubscription`] is alive, starts once the session reports
//! ready, and keeps the previous snapshot whenever a poll fails.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::{
	sync::watch,
	task::JoinHandle,
	time::{MissedTickBehavior, interval},
};
// self
use crate::{
	_prelude::*,
	config::{HostConfig, TrackedSlot},
	error::PlatformError,
	obs::{self, OpKind, OpOutcome, OpSpan},
	platform::{EmbedPlatform, UserMetrics},
};

/// Counts for one tracked container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SlotCounts {
	/// Cards in the container.
	pub total: u32,
	/// Unseen cards in the container.
	pub unseen: u32,
}

/// Consolidated counts from one poll; never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
	/// Cards across every container.
	pub total_cards: u32,
	/// Unseen cards across every container.
	pub unseen_cards: u32,
	/// Counts keyed by tracked slot label.
	pub per_slot: BTreeMap<String, SlotCounts>,
	/// When the platform answered.
	#[serde(with = "time::serde::rfc3339")]
	pub fetched_at: OffsetDateTime,
}
impl MetricsSnapshot {
	/// Reads the totals and every tracked slot out of `metrics`.
	pub fn from_platform(
		metrics: &dyn UserMetrics,
		slots: &[TrackedSlot],
		fetched_at: OffsetDateTime,
	) -> Self {
		let per_slot = slots
			.iter()
			.map(|slot| {
				let counts = SlotCounts {
					total: metrics.total_cards_for_stream_container(&slot.container_id),
					unseen: metrics.unseen_cards_for_stream_container(&slot.container_id),
				};

				(slot.label.clone(), counts)
			})
			.collect();

		Self {
			total_cards: metrics.total_cards(),
			unseen_cards: metrics.unseen_cards(),
			per_slot,
			fetched_at,
		}
	}
}

struct Poller {
	subscribers: usize,
	task: Option<JoinHandle<()>>,
}

struct AggregatorInner {
	platform: Arc<dyn EmbedPlatform>,
	slots: Vec<TrackedSlot>,
	interval: StdDuration,
	ready: watch::Receiver<bool>,
	latest: watch::Sender<Option<Arc<MetricsSnapshot>>>,
	poller: Mutex<Poller>,
}
impl AggregatorInner {
	async fn try_refresh(&self) -> Result<Arc<MetricsSnapshot>> {
		const KIND: OpKind = OpKind::MetricsPoll;

		if !*self.ready.borrow() {
			return Err(PlatformError::NotInitialised.into());
		}

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = OpSpan::new(KIND, "request_user_metrics")
			.instrument(async {
				let metrics = self.platform.request_user_metrics().await?;
				let snapshot = Arc::new(MetricsSnapshot::from_platform(
					metrics.as_ref(),
					&self.slots,
					OffsetDateTime::now_utc(),
				));

				self.latest.send_replace(Some(snapshot.clone()));

				Ok(snapshot)
			})
			.await;

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	async fn refresh(&self) -> Option<Arc<MetricsSnapshot>> {
		if !*self.ready.borrow() {
			return self.latest();
		}

		match self.try_refresh().await {
			Ok(snapshot) => Some(snapshot),
			Err(e) => {
				tracing::warn!(error = %e, "Metrics refresh failed; keeping the last snapshot.");

				self.latest()
			},
		}
	}

	fn latest(&self) -> Option<Arc<MetricsSnapshot>> {
		self.latest.borrow().clone()
	}
}

async fn poll(inner: Arc<AggregatorInner>) {
	let mut ready = inner.ready.clone();

	if ready.wait_for(|ready| *ready).await.is_err() {
		tracing::debug!("Readiness signal dropped before the platform became ready.");

		return;
	}

	let mut ticker = interval(inner.interval);

	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		ticker.tick().await;
		inner.refresh().await;
	}
}

/// Shared handle to the polled metrics; clones observe the same snapshot.
#[derive(Clone)]
pub struct MetricsAggregator {
	inner: Arc<AggregatorInner>,
}
impl MetricsAggregator {
	/// Creates an aggregator reporting `config.tracked_slots` once `ready` turns `true`.
	pub fn new(
		platform: Arc<dyn EmbedPlatform>,
		config: &HostConfig,
		ready: watch::Receiver<bool>,
	) -> Self {
		let (latest, _) = watch::channel(None);

		Self {
			inner: Arc::new(AggregatorInner {
				platform,
				slots: config.tracked_slots.clone(),
				interval: config.metrics_interval(),
				ready,
				latest,
				poller: Mutex::new(Poller { subscribers: 0, task: None }),
			}),
		}
	}

	/// Polls now; on failure or before readiness returns the last snapshot.
	pub async fn refresh(&self) -> Option<Arc<MetricsSnapshot>> {
		self.inner.refresh().await
	}

	/// Polls now and reports failures instead of absorbing them.
	pub async fn try_refresh(&self) -> Result<Arc<MetricsSnapshot>> {
		self.inner.try_refresh().await
	}

	/// Last snapshot; `None` until the first successful poll.
	pub fn latest(&self) -> Option<Arc<MetricsSnapshot>> {
		self.inner.latest()
	}

	/// Number of live subscriptions.
	pub fn subscriber_count(&self) -> usize {
		self.inner.poller.lock().subscribers
	}

	/// Whether the polling task is running.
	pub fn is_polling(&self) -> bool {
		self.inner.poller.lock().task.as_ref().is_some_and(|task| !task.is_finished())
	}

	/// Registers a consumer; the first one starts polling on the current tokio runtime.
	pub fn subscribe(&self) -> MetricsSubscription {
		let mut poller = self.inner.poller.lock();

		poller.subscribers += 1;

		if poller.task.as_ref().is_none_or(JoinHandle::is_finished) {
			match tokio::runtime::Handle::try_current() {
				Ok(runtime) => poller.task = Some(runtime.spawn(poll(self.inner.clone()))),
				Err(_) => tracing::warn!("No tokio runtime; metrics will refresh on demand only."),
			}
		}

		MetricsSubscription { inner: self.inner.clone(), rx: self.inner.latest.subscribe() }
	}
}
impl Debug for MetricsAggregator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MetricsAggregator")
			.field("tracked_slots", &self.inner.slots.len())
			.field("interval", &self.inner.interval)
			.field("subscribers", &self.subscriber_count())
			.finish()
	}
}

/// Consumer view of the metrics; polling stops when the last one drops.
pub struct MetricsSubscription {
	inner: Arc<AggregatorInner>,
	rx: watch::Receiver<Option<Arc<MetricsSnapshot>>>,
}
impl MetricsSubscription {
	/// Latest snapshot, `None` while loading.
	pub fn snapshot(&self) -> Option<Arc<MetricsSnapshot>> {
		self.rx.borrow().clone()
	}

	/// Total cards, zero while loading.
	pub fn total(&self) -> u32 {
		self.rx.borrow().as_ref().map_or(0, |snapshot| snapshot.total_cards)
	}

	/// Unseen cards, zero while loading.
	pub fn unseen(&self) -> u32 {
		self.rx.borrow().as_ref().map_or(0, |snapshot| snapshot.unseen_cards)
	}

	/// Per-slot counts, empty while loading.
	pub fn per_slot(&self) -> BTreeMap<String, SlotCounts> {
		self.rx.borrow().as_ref().map(|snapshot| snapshot.per_slot.clone()).unwrap_or_default()
	}

	/// Waits for the next snapshot; `None` once the aggregator is gone.
	pub async fn changed(&mut self) -> Option<Arc<MetricsSnapshot>> {
		self.rx.changed().await.ok()?;

		self.rx.borrow_and_update().clone()
	}

	/// Polls now, as [`MetricsAggregator::refresh`].
	pub async fn refresh(&self) -> Option<Arc<MetricsSnapshot>> {
		self.inner.refresh().await
	}
}
impl Debug for MetricsSubscription {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MetricsSubscription").field("snapshot", &self.snapshot()).finish()
	}
}
impl Drop for MetricsSubscription {
	fn drop(&mut self) {
		let mut poller = self.inner.poller.lock();

		poller.subscribers = poller.subscribers.saturating_sub(1);

		if poller.subscribers > 0 {
			return;
		}
		if let Some(task) = poller.task.take() {
			task.abort();
			tracing::debug!("Last metrics subscriber gone; polling stopped.");
		}
	}
}
