//! Reqwest transport for the platform's unauthenticated-token issuer.
//!
//! The issuer mints a session token for any subject once it is given the environment's public
//! API key. [`HttpTokenIssuer`] builds the issuance URL, decodes the `{ data, errors }` envelope,
//! and classifies failures as [`AuthError`] values so the provider never has to look at HTTP.

// std
use std::ops::Deref;
// crates.io
use reqwest::StatusCode;
// self
use crate::{
	_prelude::*,
	config::PlatformConfig,
	error::{AuthError, ConfigError},
	token::{IssueRequest, IssuedToken, IssuerFuture, TokenIssuer},
};

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that refuses redirects; the issuer answers directly.
	pub fn no_redirects() -> Result<Self, ConfigError> {
		let client =
			ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// [`TokenIssuer`] that calls `{base}/{environment}/unauthenticated-token/{subject}/{api_key}`.
#[derive(Clone)]
pub struct HttpTokenIssuer {
	http: ReqwestHttpClient,
	config: PlatformConfig,
}
impl HttpTokenIssuer {
	/// Creates an issuer with its own redirect-free client.
	pub fn new(config: PlatformConfig) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(config, ReqwestHttpClient::no_redirects()?))
	}

	/// Creates an issuer reusing the provided client.
	pub fn with_http_client(config: PlatformConfig, http: ReqwestHttpClient) -> Self {
		Self { http, config }
	}

	/// Builds the issuance URL for `request`.
	pub fn issuance_url(&self, request: &IssueRequest) -> Url {
		let mut url = self.config.base_url.clone();

		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().extend([
				self.config.environment_id.as_str(),
				"unauthenticated-token",
				request.subject_id.as_ref(),
				self.config.api_key.as_str(),
			]);
		}

		url.query_pairs_mut().append_pair("claims", &request.claims.to_string());

		url
	}

	async fn call(&self, request: &IssueRequest) -> Result<IssuedToken, AuthError> {
		let url = self.issuance_url(request);
		let response = self.http.get(url).send().await?;
		let status = response.status();
		let body = response.bytes().await?;

		decode_envelope(status, &body)
	}
}
impl TokenIssuer for HttpTokenIssuer {
	fn issue<'a>(&'a self, request: &'a IssueRequest) -> IssuerFuture<'a, IssuedToken> {
		Box::pin(self.call(request))
	}
}
impl Debug for HttpTokenIssuer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenIssuer").field("config", &self.config).finish()
	}
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
	#[serde(default)]
	data: Option<TokenData>,
	#[serde(default)]
	errors: Vec<IssuerErrorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenData {
	#[serde(default)]
	token: Option<String>,
	#[serde(default)]
	api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssuerErrorEntry {
	#[serde(default)]
	title: Option<String>,
}

fn decode_envelope(status: StatusCode, body: &[u8]) -> Result<IssuedToken, AuthError> {
	let code = Some(status.as_u16());
	let mut de = serde_json::Deserializer::from_slice(body);
	let envelope: TokenEnvelope = match serde_path_to_error::deserialize(&mut de) {
		Ok(envelope) => envelope,
		Err(_) if !status.is_success() =>
			return Err(AuthError::Rejected { message: format!("HTTP {status}"), status: code }),
		Err(e) => return Err(AuthError::MalformedResponse { message: e.to_string() }),
	};

	if let Some(first) = envelope.errors.first() {
		let message = first.title.clone().unwrap_or_else(|| format!("HTTP {status}"));

		return Err(AuthError::Rejected { message, status: code });
	}
	if !status.is_success() {
		return Err(AuthError::Rejected { message: format!("HTTP {status}"), status: code });
	}

	let data = envelope.data.ok_or(AuthError::MissingToken)?;
	let token = data.token.filter(|token| !token.is_empty()).ok_or(AuthError::MissingToken)?;

	Ok(IssuedToken { token, api_key: data.api_key })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::SubjectId;

	fn issuer() -> HttpTokenIssuer {
		let config = PlatformConfig::builder("https://50-11.client-api.example.io")
			.environment_id("env-1")
			.api_key("test_key_2")
			.build()
			.expect("Issuer config fixture should be valid.");

		HttpTokenIssuer::with_http_client(config, ReqwestHttpClient::default())
	}

	#[test]
	fn issuance_url_encodes_subject_and_claims() {
		let request = IssueRequest {
			subject_id: SubjectId::new("user-1").expect("Subject fixture should be valid."),
			claims: serde_json::json!({ "name": "Ada Lovelace" }),
		};
		let url = issuer().issuance_url(&request);

		assert_eq!(url.path(), "/env-1/unauthenticated-token/user-1/test_key_2");

		let claims: Vec<(String, String)> = url.query_pairs().into_owned().collect();

		assert_eq!(claims, vec![("claims".into(), "{\"name\":\"Ada Lovelace\"}".into())]);
	}

	#[test]
	fn envelope_errors_become_rejections() {
		let err = decode_envelope(StatusCode::OK, br#"{"errors":[{"title":"Unknown API key"}]}"#)
			.expect_err("Error payloads should be rejected.");

		assert_eq!(
			err,
			AuthError::Rejected { message: "Unknown API key".into(), status: Some(200) }
		);

		let err = decode_envelope(StatusCode::BAD_GATEWAY, b"<html>")
			.expect_err("Non-JSON failures should be rejected.");

		assert!(matches!(err, AuthError::Rejected { status: Some(502), .. }));
	}

	#[test]
	fn malformed_and_empty_envelopes_are_classified() {
		let err = decode_envelope(StatusCode::OK, br#"{"data":{"token":7}}"#)
			.expect_err("Wrongly typed tokens should be rejected.");

		match err {
			AuthError::MalformedResponse { message } => assert!(message.contains("data.token")),
			other => panic!("Unexpected error: {other:?}"),
		}

		assert_eq!(
			decode_envelope(StatusCode::OK, br#"{"data":{}}"#),
			Err(AuthError::MissingToken)
		);
		assert_eq!(decode_envelope(StatusCode::OK, b"{}"), Err(AuthError::MissingToken));
	}

	#[test]
	fn successful_envelopes_yield_tokens() {
		let issued =
			decode_envelope(StatusCode::OK, br#"{"data":{"token":"a.b.c","apiKey":"test_key_2"}}"#)
				.expect("Valid envelopes should decode.");

		assert_eq!(issued.token, "a.b.c");
		assert_eq!(issued.api_key.as_deref(), Some("test_key_2"));
	}
}
