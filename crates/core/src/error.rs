// Error types for filedash

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or persisting credentials.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("credential store I/O error at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("credential store is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The base URL cannot carry path segments (e.g. `mailto:`).
	#[error("base URL cannot be used for API calls: {0}")]
	InvalidBaseUrl(String),

	/// An endpoint path could not be joined onto the base URL.
	#[error("invalid endpoint path '{path}': {reason}")]
	InvalidEndpoint { path: String, reason: String },

	/// The HTTP client could not be constructed.
	#[error("failed to build HTTP client: {0}")]
	Http(String),
}

/// Authentication failures reported by [`SessionManager`](crate::SessionManager).
///
/// Only [`MalformedToken`](Self::MalformedToken) from `login` clears the held
/// session. Other login failures leave any earlier session in place, and a
/// failed refresh leaves logging out to the caller.
#[derive(Debug, Error)]
pub enum AuthError {
	/// The token endpoint rejected the username/password pair.
	#[error("invalid username or password")]
	InvalidCredentials,

	/// No response was received from the backend.
	#[error("network error: {0}")]
	Network(String),

	/// A refresh was requested but no refresh token is held.
	#[error("no refresh token available")]
	NoRefreshToken,

	/// The refresh endpoint rejected the refresh token or was unreachable.
	///
	/// The held session is left untouched; callers are expected to log out.
	#[error("token refresh failed")]
	RefreshFailed,

	/// The access token payload could not be decoded into claims.
	#[error("malformed access token: {0}")]
	MalformedToken(String),

	/// Registration was refused; `body` carries the backend's error payload.
	#[error("registration failed (HTTP {status}): {body}")]
	Registration { status: u16, body: serde_json::Value },

	#[error(transparent)]
	Store(#[from] StoreError),

	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Failures of authenticated file and admin actions.
#[derive(Debug, Error)]
pub enum DispatchError {
	/// No session is held; nothing was sent.
	#[error("not logged in")]
	NotLoggedIn,

	/// The backend kept answering `401` and the session was cleared.
	#[error("session expired, log in again")]
	SessionExpired,

	/// `403`: the session stays valid but the action is not allowed.
	#[error("permission denied")]
	PermissionDenied,

	/// `404` for the addressed file or user.
	#[error("not found")]
	NotFound,

	/// Any other non-success status.
	#[error("server error (HTTP {status}): {body}")]
	Server { status: u16, body: String },

	/// No response was received.
	#[error("network error: {0}")]
	Network(String),

	/// A success response whose body did not have the expected shape.
	#[error("unexpected response body: {0}")]
	Decode(String),

	/// Reading a local file for upload failed.
	#[error("cannot read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The resource locator could not be handed to the opener.
	#[error("failed to open {url}: {source}")]
	Open {
		url: String,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Config(#[from] ConfigError),
}

impl DispatchError {
	/// True for failures that ended the session.
	pub fn is_session_lost(&self) -> bool {
		matches!(self, DispatchError::SessionExpired | DispatchError::NotLoggedIn)
	}
}

impl From<reqwest::Error> for AuthError {
	fn from(err: reqwest::Error) -> Self {
		AuthError::Network(err.to_string())
	}
}

impl From<reqwest::Error> for DispatchError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			DispatchError::Decode(err.to_string())
		} else {
			DispatchError::Network(err.to_string())
		}
	}
}
