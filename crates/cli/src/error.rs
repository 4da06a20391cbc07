use filedash::{AuthError, ConfigError, DispatchError, StoreError};
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Auth(#[from] AuthError),

	#[error(transparent)]
	Dispatch(#[from] DispatchError),

	#[error(transparent)]
	Store(#[from] StoreError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, message, details) = match self {
			CliError::Auth(err) => auth_error(err),
			CliError::Dispatch(err) => dispatch_error(err),
			CliError::Store(err) => (ErrorCode::IoError, err.to_string(), None),
			CliError::Config(err) => (ErrorCode::InvalidInput, err.to_string(), None),
			CliError::InvalidInput(msg) => (ErrorCode::InvalidInput, msg.clone(), None),
			CliError::Io(err) => (ErrorCode::IoError, err.to_string(), None),
			CliError::Json(err) => (ErrorCode::InternalError, format!("JSON error: {err}"), None),
			CliError::Anyhow(err) => (ErrorCode::InternalError, format!("{err:#}"), None),
		};

		CommandError {
			code,
			message,
			details,
		}
	}
}

fn auth_error(err: &AuthError) -> (ErrorCode, String, Option<serde_json::Value>) {
	let message = err.to_string();
	match err {
		AuthError::InvalidCredentials => (ErrorCode::InvalidCredentials, message, None),
		AuthError::Network(_) => (ErrorCode::NetworkError, message, None),
		AuthError::NoRefreshToken | AuthError::RefreshFailed | AuthError::MalformedToken(_) => {
			(ErrorCode::SessionExpired, message, None)
		}
		AuthError::Registration { status, body } => (
			ErrorCode::InvalidInput,
			format!("registration refused (HTTP {status})"),
			Some(body.clone()),
		),
		AuthError::Store(_) => (ErrorCode::IoError, message, None),
		AuthError::Config(_) => (ErrorCode::InvalidInput, message, None),
	}
}

fn dispatch_error(err: &DispatchError) -> (ErrorCode, String, Option<serde_json::Value>) {
	let message = err.to_string();
	match err {
		DispatchError::NotLoggedIn => (
			ErrorCode::NotLoggedIn,
			"not logged in; run `filedash login <username>` first".into(),
			None,
		),
		DispatchError::SessionExpired => (ErrorCode::SessionExpired, message, None),
		DispatchError::PermissionDenied => (ErrorCode::PermissionDenied, message, None),
		DispatchError::NotFound => (ErrorCode::NotFound, message, None),
		DispatchError::Server { status, body } => (
			ErrorCode::ServerError,
			format!("server responded with HTTP {status}"),
			Some(serde_json::json!({ "status": status, "body": body })),
		),
		DispatchError::Network(_) => (ErrorCode::NetworkError, message, None),
		DispatchError::Decode(_) => (ErrorCode::ServerError, message, None),
		DispatchError::Io { path, .. } => (ErrorCode::IoError, message, Some(serde_json::json!({ "path": path }))),
		DispatchError::Open { url, .. } => (ErrorCode::IoError, message, Some(serde_json::json!({ "url": url }))),
		DispatchError::Config(_) => (ErrorCode::InvalidInput, message, None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dispatch_errors_map_to_stable_codes() {
		let cases = [
			(DispatchError::NotLoggedIn, ErrorCode::NotLoggedIn),
			(DispatchError::SessionExpired, ErrorCode::SessionExpired),
			(DispatchError::PermissionDenied, ErrorCode::PermissionDenied),
			(DispatchError::NotFound, ErrorCode::NotFound),
			(DispatchError::Network("refused".into()), ErrorCode::NetworkError),
		];
		for (err, code) in cases {
			assert_eq!(CliError::from(err).to_command_error().code, code);
		}
	}

	#[test]
	fn server_error_carries_status() {
		let err = CliError::from(DispatchError::Server {
			status: 502,
			body: "bad gateway".into(),
		});
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::ServerError);
		assert_eq!(cmd.details.unwrap()["status"], 502);
	}

	#[test]
	fn registration_error_exposes_backend_body() {
		let err = CliError::from(AuthError::Registration {
			status: 400,
			body: serde_json::json!({ "username": ["taken"] }),
		});
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidInput);
		assert_eq!(cmd.details.unwrap()["username"][0], "taken");
	}

	#[test]
	fn auth_failures() {
		assert_eq!(
			CliError::from(AuthError::InvalidCredentials).to_command_error().code,
			ErrorCode::InvalidCredentials
		);
		assert_eq!(
			CliError::from(AuthError::RefreshFailed).to_command_error().code,
			ErrorCode::SessionExpired
		);
	}
}
