//! Bearer credential held by the token cache, plus the redacting secret wrapper.

// self
use crate::{_prelude::*, auth::jwt};

/// Redacted bearer token; the raw value only leaves through [`TokenSecret::expose`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a raw bearer string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw bearer string. Callers must avoid logging it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Consumes the wrapper and returns the raw bearer string.
	pub fn into_inner(self) -> String {
		self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// A revocable session credential with an optional embedded expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Bearer token presented to the platform.
	pub token: TokenSecret,
	/// Expiry as Unix epoch seconds, when the token carried a readable `exp` claim.
	pub expires_at: Option<i64>,
}
impl Credential {
	/// Wraps a freshly issued token, reading its expiry from the embedded claims.
	pub fn from_issued(token: impl Into<String>) -> Self {
		let token = token.into();
		let expires_at = jwt::extract_expiry(&token);

		Self { token: TokenSecret::new(token), expires_at }
	}

	/// Builds a credential with an explicit expiry.
	pub fn with_expiry(token: impl Into<String>, expires_at: Option<i64>) -> Self {
		Self { token: TokenSecret::new(token), expires_at }
	}

	/// Seconds left before expiry at `now`, if the expiry is known.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Option<Duration> {
		self.expires_at.map(|exp| Duration::seconds(exp.saturating_sub(now.unix_timestamp())))
	}

	/// Returns `true` when more than `buffer` remains before expiry.
	///
	/// Credentials without a known expiry are never usable.
	pub fn is_usable_at(&self, now: OffsetDateTime, buffer: Duration) -> bool {
		self.remaining_at(now).is_some_and(|remaining| remaining > buffer)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");

		let credential = Credential::with_expiry("super-secret", Some(10));

		assert!(!format!("{credential:?}").contains("super-secret"));
	}

	#[test]
	fn usability_respects_buffer_boundaries() {
		let now = OffsetDateTime::from_unix_timestamp(1_700_000_000)
			.expect("Fixture timestamp should be valid.");
		let buffer = Duration::seconds(70);
		let base = now.unix_timestamp();

		assert!(!Credential::with_expiry("t", Some(base + 69)).is_usable_at(now, buffer));
		assert!(!Credential::with_expiry("t", Some(base + 70)).is_usable_at(now, buffer));
		assert!(Credential::with_expiry("t", Some(base + 71)).is_usable_at(now, buffer));
		assert!(!Credential::with_expiry("t", None).is_usable_at(now, buffer));
	}

	#[test]
	fn malformed_tokens_have_no_expiry() {
		assert_eq!(Credential::from_issued("opaque").expires_at, None);
	}
}
