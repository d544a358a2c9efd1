//! Unverified claim extraction for issued session tokens.
//!
//! The host never verifies signatures; it only peeks at the payload segment to learn when the
//! platform will stop accepting a token. Every failure mode collapses to `None`.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{STANDARD, URL_SAFE},
};
use serde_json::Value;

/// Claims the host cares about, read leniently from the payload segment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenClaims {
	/// Expiry as Unix epoch seconds.
	pub exp: Option<i64>,
	/// Subject the token was issued for.
	pub sub: Option<String>,
	/// Display name claim.
	pub name: Option<String>,
}

/// Decodes the payload segment of a dot-delimited token without verifying it.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
	let mut segments = token.split('.');
	let _header = segments.next()?;
	let payload = segments.next()?;
	let bytes = decode_segment(payload)?;
	let value: Value = serde_json::from_slice(&bytes).ok()?;
	let object = value.as_object()?;

	Some(TokenClaims {
		exp: object.get("exp").and_then(read_epoch),
		sub: object.get("sub").and_then(Value::as_str).map(str::to_owned),
		name: object.get("name").and_then(Value::as_str).map(str::to_owned),
	})
}

/// Reads the `exp` claim of a token; `None` when absent, zero, or unreadable.
pub fn extract_expiry(token: &str) -> Option<i64> {
	decode_claims(token)?.exp
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
	let padding = (4 - segment.len() % 4) % 4;
	let mut padded = String::with_capacity(segment.len() + padding);

	padded.push_str(segment);
	padded.extend(std::iter::repeat_n('=', padding));

	URL_SAFE.decode(&padded).or_else(|_| STANDARD.decode(&padded)).ok()
}

fn read_epoch(value: &Value) -> Option<i64> {
	let exp = match value.as_i64() {
		Some(exp) => exp,
		None => {
			let float = value.as_f64().filter(|f| f.is_finite())?;

			float.trunc() as i64
		},
	};

	(exp > 0).then_some(exp)
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::engine::general_purpose::URL_SAFE_NO_PAD;
	// self
	use super::*;

	fn token_with_payload(payload: &str) -> String {
		format!("eyJhbGciOiJIUzI1NiJ9.{}.signature", URL_SAFE_NO_PAD.encode(payload))
	}

	#[test]
	fn reads_exp_sub_and_name() {
		let token = token_with_payload(r#"{"exp":1700000123,"sub":"user-1","name":"Ada"}"#);
		let claims = decode_claims(&token).expect("Claims should decode.");

		assert_eq!(claims.exp, Some(1_700_000_123));
		assert_eq!(claims.sub.as_deref(), Some("user-1"));
		assert_eq!(claims.name.as_deref(), Some("Ada"));
	}

	#[test]
	fn restores_padding_for_unpadded_segments() {
		// Encoded lengths of 2, 3, and 0 mod 4.
		for payload in [r#"{"exp":17}"#, r#"{"exp":170}"#, r#"{"exp":1700}"#] {
			assert!(extract_expiry(&token_with_payload(payload)).is_some(), "{payload}");
		}
	}

	#[test]
	fn fractional_exp_is_truncated() {
		let token = token_with_payload(r#"{"exp":1700000000.9}"#);

		assert_eq!(extract_expiry(&token), Some(1_700_000_000));
	}

	#[test]
	fn malformed_tokens_yield_none() {
		assert_eq!(extract_expiry("no-dots-here"), None);
		assert_eq!(extract_expiry(""), None);
		assert_eq!(extract_expiry("header.%%%.sig"), None);
		assert_eq!(extract_expiry(&format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"))), None);
		assert_eq!(extract_expiry(&token_with_payload(r#"{"sub":"x"}"#)), None);
		assert_eq!(extract_expiry(&token_with_payload(r#"{"exp":"soon"}"#)), None);
		assert_eq!(extract_expiry(&token_with_payload(r#"{"exp":0}"#)), None);
		assert_eq!(extract_expiry(&token_with_payload("[1,2]")), None);
	}

	#[test]
	fn two_segment_tokens_are_accepted() {
		let token = format!("h.{}", URL_SAFE_NO_PAD.encode(r#"{"exp":42}"#));

		assert_eq!(extract_expiry(&token), Some(42));
	}
}
