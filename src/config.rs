//! Platform connection settings and host tunables.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, container::StreamContainerId, error::ConfigError};

/// Connection settings handed to the platform SDK and the token issuer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPlatformConfig", into = "RawPlatformConfig")]
pub struct PlatformConfig {
	/// Client API host, e.g. `https://<org>.client-api.example.io`.
	pub base_url: Url,
	/// Environment identifier within the organisation.
	pub environment_id: String,
	/// Public API key for the host application.
	pub api_key: String,
	/// Organisation identifier, when known.
	pub org_id: Option<String>,
}
impl PlatformConfig {
	/// Returns a builder seeded with the base URL string.
	pub fn builder(base_url: impl Into<String>) -> PlatformConfigBuilder {
		PlatformConfigBuilder::new(base_url)
	}

	/// Decodes settings from a JSON document, reporting the failing field path.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		parse_json(raw)
	}

	/// Base URL without a trailing slash, ready for path concatenation.
	pub fn base_str(&self) -> &str {
		self.base_url.as_str().trim_end_matches('/')
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.base_url.scheme() != "https" && !is_loopback(&self.base_url) {
			return Err(ConfigError::InsecureBaseUrl { url: self.base_url.to_string() });
		}
		if self.environment_id.trim().is_empty() {
			return Err(ConfigError::EmptyField { field: "environment_id" });
		}
		if self.api_key.trim().is_empty() {
			return Err(ConfigError::EmptyField { field: "api_key" });
		}

		Ok(())
	}
}
impl Debug for PlatformConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PlatformConfig")
			.field("base_url", &self.base_url.as_str())
			.field("environment_id", &self.environment_id)
			.field("api_key_set", &!self.api_key.is_empty())
			.field("org_id", &self.org_id)
			.finish()
	}
}

fn parse_json<T>(raw: &str) -> Result<T, ConfigError>
where
	T: for<'de> Deserialize<'de>,
{
	let mut de = serde_json::Deserializer::from_str(raw);

	serde_path_to_error::deserialize(&mut de).map_err(|e| ConfigError::Parse {
		path: e.path().to_string(),
		message: e.into_inner().to_string(),
	})
}

fn is_loopback(url: &Url) -> bool {
	matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"))
}

/// Builder for [`PlatformConfig`] values.
#[derive(Debug)]
pub struct PlatformConfigBuilder {
	base_url: String,
	environment_id: Option<String>,
	api_key: Option<String>,
	org_id: Option<String>,
}
impl PlatformConfigBuilder {
	fn new(base_url: impl Into<String>) -> Self {
		Self { base_url: base_url.into(), environment_id: None, api_key: None, org_id: None }
	}

	/// Sets the environment identifier.
	pub fn environment_id(mut self, id: impl Into<String>) -> Self {
		self.environment_id = Some(id.into());

		self
	}

	/// Sets the API key.
	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(key.into());

		self
	}

	/// Sets the organisation identifier.
	pub fn org_id(mut self, id: impl Into<String>) -> Self {
		self.org_id = Some(id.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<PlatformConfig, ConfigError> {
		let base_url =
			Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidUrl { source })?;
		let config = PlatformConfig {
			base_url,
			environment_id: self.environment_id.unwrap_or_default(),
			api_key: self.api_key.unwrap_or_default(),
			org_id: self.org_id,
		};

		config.validate()?;

		Ok(config)
	}
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlatformConfig {
	base_url: String,
	environment_id: String,
	api_key: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	org_id: Option<String>,
}
impl TryFrom<RawPlatformConfig> for PlatformConfig {
	type Error = ConfigError;

	fn try_from(raw: RawPlatformConfig) -> Result<Self, Self::Error> {
		let mut builder = PlatformConfig::builder(raw.base_url)
			.environment_id(raw.environment_id)
			.api_key(raw.api_key);

		if let Some(org) = raw.org_id {
			builder = builder.org_id(org);
		}

		builder.build()
	}
}
impl From<PlatformConfig> for RawPlatformConfig {
	fn from(config: PlatformConfig) -> Self {
		Self {
			base_url: config.base_url.into(),
			environment_id: config.environment_id,
			api_key: config.api_key,
			org_id: config.org_id,
		}
	}
}

/// A labelled stream container whose counts the metrics aggregator reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSlot {
	/// Stable label used as the `per_slot` key.
	pub label: String,
	/// Stream container the counts are read for.
	pub container_id: StreamContainerId,
}

/// Tunables for the token cache and metrics polling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
	/// Seconds before expiry at which a cached token stops being used.
	pub refresh_buffer_secs: u32,
	/// Seconds between metrics polls while subscribed.
	pub metrics_interval_secs: u32,
	/// Containers reported in each metrics snapshot.
	pub tracked_slots: Vec<TrackedSlot>,
}
impl HostConfig {
	/// Default refresh buffer; covers in-flight request latency.
	pub const DEFAULT_REFRESH_BUFFER_SECS: u32 = 70;
	/// Default metrics polling period.
	pub const DEFAULT_METRICS_INTERVAL_SECS: u32 = 30;

	/// Decodes tunables from a JSON document; absent fields keep their defaults.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		parse_json(raw)
	}

	/// Refresh buffer as a [`Duration`].
	pub fn refresh_buffer(&self) -> Duration {
		Duration::seconds(i64::from(self.refresh_buffer_secs))
	}

	/// Metrics interval as a std duration for the timer; never zero.
	pub fn metrics_interval(&self) -> StdDuration {
		StdDuration::from_secs(u64::from(self.metrics_interval_secs.max(1)))
	}

	/// Replaces the tracked slot table.
	pub fn with_tracked_slots<I, L>(mut self, slots: I) -> Self
	where
		I: IntoIterator<Item = (L, StreamContainerId)>,
		L: Into<String>,
	{
		self.tracked_slots = slots
			.into_iter()
			.map(|(label, container_id)| TrackedSlot { label: label.into(), container_id })
			.collect();

		self
	}
}
impl Default for HostConfig {
	fn default() -> Self {
		Self {
			refresh_buffer_secs: Self::DEFAULT_REFRESH_BUFFER_SECS,
			metrics_interval_secs: Self::DEFAULT_METRICS_INTERVAL_SECS,
			tracked_slots: Vec::new(),
		}
	}
}
