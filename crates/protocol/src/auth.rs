//! Token endpoint bodies and access token claims.
//!
//! The backend issues a short-lived access token and a long-lived refresh
//! token:
//!
//! 1. Client sends [`TokenRequest`] to the token endpoint
//! 2. Backend answers with a [`TokenPair`]
//! 3. When the access token expires the client sends [`RefreshRequest`]
//! 4. Backend answers with a [`RefreshResponse`] (rotation optional)
//!
//! The access token is a JWT whose payload deserializes into [`AccessClaims`].

use serde::{Deserialize, Serialize};

/// Username/password body for the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
	pub username: String,
	pub password: String,
}

/// Access and refresh tokens returned after a successful login.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
	pub access: String,
	pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TokenPair").field("access", &"<redacted>").field("refresh", &"<redacted>").finish()
	}
}

/// Body for the refresh endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
	pub refresh: String,
}

/// Refresh endpoint response.
///
/// `refresh` is only present when the backend rotates refresh tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
	pub access: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh: Option<String>,
}

/// Body for the registration endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
	pub username: String,
	pub email: String,
	pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RegisterRequest")
			.field("username", &self.username)
			.field("email", &self.email)
			.finish_non_exhaustive()
	}
}

/// Claims embedded in the access token payload.
///
/// Only the fields the client reads are modelled; unknown claims
/// (`jti`, `token_type`, ...) are ignored. Every field is optional: a stock
/// token carries `user_id` and `exp` but no `username` or admin flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub username: String,
	/// Expiry as Unix timestamp in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<serde_json::Value>,
	#[serde(default)]
	pub is_staff: bool,
	#[serde(default)]
	pub is_superuser: bool,
}

impl AccessClaims {
	/// Staff and superusers both get the administrator view.
	pub fn is_admin(&self) -> bool {
		self.is_staff || self.is_superuser
	}

	/// Returns true when `exp` lies strictly before `now`. A token without
	/// `exp` never expires client-side.
	pub fn is_expired_at(&self, now: i64) -> bool {
		self.exp.is_some_and(|exp| exp < now)
	}

	/// `username`, falling back to `user_id` when the claim is absent.
	pub fn display_name(&self) -> String {
		if !self.username.is_empty() {
			return self.username.clone();
		}
		match &self.user_id {
			Some(serde_json::Value::String(id)) => id.clone(),
			Some(serde_json::Value::Null) | None => String::new(),
			Some(other) => other.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn claims_ignore_unknown_fields() {
		let json = r#"{
			"token_type": "access",
			"exp": 1700000000,
			"jti": "abc",
			"user_id": 7,
			"username": "alice",
			"is_staff": true
		}"#;
		let claims: AccessClaims = serde_json::from_str(json).unwrap();
		assert_eq!(claims.username, "alice");
		assert_eq!(claims.exp, Some(1_700_000_000));
		assert!(claims.is_staff);
		assert!(!claims.is_superuser);
		assert!(claims.is_admin());
	}

	#[test]
	fn admin_flags_default_to_false() {
		let claims: AccessClaims = serde_json::from_str(r#"{"username": "bob", "exp": 10}"#).unwrap();
		assert!(!claims.is_admin());
		assert!(claims.is_expired_at(11));
		assert!(!claims.is_expired_at(10));
	}

	#[test]
	fn stock_claims_fall_back_to_user_id() {
		let json = r#"{"token_type": "access", "exp": 4000000000, "iat": 1, "jti": "x", "user_id": 7}"#;
		let claims: AccessClaims = serde_json::from_str(json).unwrap();
		assert_eq!(claims.username, "");
		assert_eq!(claims.display_name(), "7");
		assert!(!claims.is_admin());

		let bare: AccessClaims = serde_json::from_str("{}").unwrap();
		assert_eq!(bare.display_name(), "");
		assert!(!bare.is_expired_at(i64::MAX), "missing exp never expires");
	}

	#[test]
	fn refresh_response_without_rotation() {
		let resp: RefreshResponse = serde_json::from_str(r#"{"access": "a.b.c"}"#).unwrap();
		assert_eq!(resp.access, "a.b.c");
		assert!(resp.refresh.is_none());
	}

	#[test]
	fn token_pair_debug_redacts_values() {
		let pair = TokenPair {
			access: "secret-access".into(),
			refresh: "secret-refresh".into(),
		};
		let dbg = format!("{pair:?}");
		assert!(!dbg.contains("secret"));
	}
}
