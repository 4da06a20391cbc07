//! Access token claim decoding.
//!
//! Tokens are `header.payload.signature` with a base64url JSON payload.
//! Decoding here never verifies the signature: the claims are informational
//! and only decide what the client shows. The backend remains the sole
//! authority on what a token may do.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use filedash_protocol::AccessClaims;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Who the current access token says the user is.
///
/// Always derived from the held access token, never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
	pub username: String,
	pub is_admin: bool,
}

impl From<&AccessClaims> for Identity {
	fn from(claims: &AccessClaims) -> Self {
		Self {
			username: claims.display_name(),
			is_admin: claims.is_admin(),
		}
	}
}

/// Decodes the claims payload of `token` without verifying it.
pub fn decode_claims(token: &str) -> Result<AccessClaims, AuthError> {
	let mut parts = token.split('.');
	let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
		(Some(_), Some(payload), Some(_), None) => payload,
		_ => return Err(AuthError::MalformedToken("expected three dot-separated segments".into())),
	};

	let bytes = URL_SAFE_NO_PAD
		.decode(payload.trim_end_matches('='))
		.map_err(|e| AuthError::MalformedToken(format!("payload is not base64url: {e}")))?;

	serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(format!("payload is not valid claims JSON: {e}")))
}

/// Decodes the [`Identity`] carried by `token`.
pub fn decode_identity(token: &str) -> Result<Identity, AuthError> {
	decode_claims(token).map(|claims| Identity::from(&claims))
}

#[cfg(test)]
pub(crate) fn mint_token(claims: &serde_json::Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
	format!("{header}.{payload}.c2lnbmF0dXJl")
}
