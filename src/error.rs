//! Host-level error types shared across the token, container, and metrics layers.

// self
use crate::_prelude::*;

/// Host-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session credential could not be obtained.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// The embedding platform failed a call.
	#[error(transparent)]
	Platform(#[from] PlatformError),
	/// Local configuration problem; indicates a programming error.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}

/// Failures raised while obtaining a session token from the issuer.
///
/// The type is [`Clone`] because a single failed fetch is delivered to every coalesced caller.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// The issuer answered with an error payload or a non-success status.
	#[error("Token issuer rejected the request: {message}.")]
	Rejected {
		/// Issuer-supplied message (first error title, or the HTTP status).
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The issuer could not be reached.
	#[error("Network error occurred while calling the token issuer: {message}.")]
	Network {
		/// Transport-supplied message.
		message: String,
	},
	/// The issuer returned a body that could not be parsed.
	#[error("Token issuer returned a malformed response: {message}.")]
	MalformedResponse {
		/// Parser message including the failing JSON path.
		message: String,
	},
	/// The issuer reported success without a token.
	#[error("Token issuer response did not contain a token.")]
	MissingToken,
	/// The fetched credential could not be persisted.
	#[error("Fetched credential could not be cached: {message}.")]
	Storage {
		/// Storage-supplied message.
		message: String,
	},
}
impl From<crate::store::StoreError> for AuthError {
	fn from(e: crate::store::StoreError) -> Self {
		Self::Storage { message: e.to_string() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for AuthError {
	fn from(e: ReqwestError) -> Self {
		Self::Network { message: e.to_string() }
	}
}

/// Failures reported by the embedding platform.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PlatformError {
	/// A platform call threw.
	#[error("Platform call `{operation}` failed: {message}.")]
	Call {
		/// Platform operation label (embed, single_card, metrics, ...).
		operation: &'static str,
		/// Platform-supplied message.
		message: String,
	},
	/// The platform SDK has not been initialised yet.
	#[error("Platform SDK is not initialised.")]
	NotInitialised,
}
impl PlatformError {
	/// Builds a [`PlatformError::Call`] for the provided operation.
	pub fn call(operation: &'static str, message: impl Into<String>) -> Self {
		Self::Call { operation, message: message.into() }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Container kind label is not recognised.
	#[error("Unknown container kind `{kind}`.")]
	UnknownKind {
		/// Rejected label.
		kind: String,
	},
	/// Descriptor for a mounted kind was built without a mount point.
	#[error("Container kind `{kind}` requires a mount point.")]
	MissingMountPoint {
		/// Kind label.
		kind: &'static str,
	},
	/// Descriptor for a modal kind carries a mount point.
	#[error("Container kind `{kind}` does not accept a mount point.")]
	UnexpectedMountPoint {
		/// Kind label.
		kind: &'static str,
	},
	/// Card width falls outside `1..=4096` pixels.
	#[error("Card width must be between 1 and 4096 pixels, got {width}.")]
	InvalidCardWidth {
		/// Rejected width.
		width: u32,
	},
	/// A required configuration field is empty.
	#[error("Configuration field `{field}` cannot be empty.")]
	EmptyField {
		/// Field name.
		field: &'static str,
	},
	/// Base URL cannot be parsed.
	#[error("Platform base URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL must use HTTPS.
	#[error("Platform base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Rejected URL.
		url: String,
	},
	/// Configuration document could not be decoded.
	#[error("Configuration could not be parsed at `{path}`: {message}.")]
	Parse {
		/// JSON path of the failing field.
		path: String,
		/// Decoder message.
		message: String,
	},
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
