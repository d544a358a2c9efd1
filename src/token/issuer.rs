//! Remote token issuer contract.

// self
use crate::{_prelude::*, auth::SubjectId, error::AuthError};

/// Boxed future returned by [`TokenIssuer::issue`].
pub type IssuerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AuthError>> + 'a + Send>>;

/// Everything an issuer needs to mint a token for one end user.
#[derive(Clone, Debug, PartialEq)]
pub struct IssueRequest {
	/// End-user key the token is minted for.
	pub subject_id: SubjectId,
	/// Claims payload, at minimum `{"name": ...}`.
	pub claims: serde_json::Value,
}

/// Successful issuer answer.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
	/// Bearer token.
	pub token: String,
	/// API key echoed back by the issuer, when present.
	pub api_key: Option<String>,
}
impl Debug for IssuedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedToken")
			.field("token", &"<redacted>")
			.field("api_key", &self.api_key)
			.finish()
	}
}

/// Mints session tokens. Implementations surface every failure as [`AuthError`] and never retry.
pub trait TokenIssuer
where
	Self: Send + Sync,
{
	/// Requests a fresh token for `request`.
	fn issue<'a>(&'a self, request: &'a IssueRequest) -> IssuerFuture<'a, IssuedToken>;
}
