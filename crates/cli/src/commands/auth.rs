//! `login`, `logout`, `register` and `whoami`.

use filedash::{Identity, SessionManager, SessionState};
use serde::Serialize;
use tracing::info;

use crate::cli::{LoginArgs, RegisterArgs};
use crate::context_store::ProfileState;
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, emit};
use crate::terminal::read_password;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData<'a> {
	identity: Identity,
	profile: &'a str,
	base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoamiData<'a> {
	session: SessionState,
	profile: &'a str,
	base_url: String,
}

pub async fn login(session: &SessionManager, profile: &ProfileState, args: LoginArgs, format: OutputFormat) -> Result<()> {
	let username = args.username.trim();
	if username.is_empty() {
		return Err(CliError::InvalidInput("username must not be empty".into()));
	}

	let password = read_password(&format!("Password for {username}"), args.password_stdin).await?;
	let identity = session.login(username, &password).await?;

	emit(
		"login",
		LoginData {
			identity,
			profile: &profile.paths.profile,
			base_url: profile.base_url().0.to_string(),
		},
		None,
		format,
	);
	Ok(())
}

pub fn logout(session: &SessionManager, format: OutputFormat) -> Result<()> {
	session.logout()?;
	info!(target = "filedash", "stored session removed");
	emit("logout", serde_json::json!({ "loggedOut": true }), None, format);
	Ok(())
}

pub async fn register(session: &SessionManager, args: RegisterArgs, format: OutputFormat) -> Result<()> {
	if !args.email.contains('@') {
		return Err(CliError::InvalidInput(format!("'{}' is not an email address", args.email)));
	}

	let password = read_password(&format!("New password for {}", args.username), args.password_stdin).await?;
	session.register(&args.username, &args.email, &password).await?;

	emit(
		"register",
		serde_json::json!({ "registered": args.username, "email": args.email }),
		None,
		format,
	);
	Ok(())
}

pub async fn whoami(session: &SessionManager, profile: &ProfileState, format: OutputFormat) -> Result<()> {
	let state = session.initialize().await;
	emit(
		"whoami",
		WhoamiData {
			session: state,
			profile: &profile.paths.profile,
			base_url: profile.base_url().0.to_string(),
		},
		None,
		format,
	);
	Ok(())
}
