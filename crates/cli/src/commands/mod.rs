//! Command dispatch.
//!
//! Every command loads the selected profile, builds a [`SessionManager`] on
//! its credential file and prints exactly one result envelope on success.
//! Errors bubble up to `main`, which prints the failure envelope.

mod admin;
mod auth;
mod config;
mod files;

use std::sync::Arc;

use filedash::{CredentialStore, DispatchError, FileDispatcher, SessionManager, SessionState};
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::context_store::ProfileState;
use crate::error::Result;
use crate::output::OutputFormat;

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	let mut profile = ProfileState::load(&cli.profile, cli.base_url.as_deref())?;
	debug!(target = "filedash", profile = %profile.paths.profile, base_url = %profile.base_url().0, "loaded profile");

	match cli.command {
		Commands::Config(action) => config::execute(action, &mut profile, format),
		Commands::Login(args) => auth::login(&*session_for(&profile)?, &profile, args, format).await,
		Commands::Logout => auth::logout(&*session_for(&profile)?, format),
		Commands::Register(args) => auth::register(&*session_for(&profile)?, args, format).await,
		Commands::Whoami => auth::whoami(&*session_for(&profile)?, &profile, format).await,
		Commands::Files(action) => {
			let dashboard = dashboard(&profile).await?;
			files::execute(action, dashboard, &profile, format).await
		}
		Commands::Users(action) => {
			let dashboard = dashboard(&profile).await?;
			admin::users(action, &dashboard, format).await
		}
		Commands::Logs(args) => {
			let dashboard = dashboard(&profile).await?;
			admin::logs(args, &dashboard, format).await
		}
	}
}

fn session_for(profile: &ProfileState) -> Result<Arc<SessionManager>> {
	let store = profile.credential_store();
	Ok(Arc::new(SessionManager::new(&profile.client_config(), Box::new(store))?))
}

/// Restores the stored session and wraps it in a dispatcher.
///
/// Distinguishes "never logged in" from "had a session that could not be
/// refreshed" so the error tells the user which one happened.
async fn dashboard(profile: &ProfileState) -> Result<FileDispatcher> {
	let session = session_for(profile)?;
	let had_session = profile
		.credential_store()
		.load()
		.map(|stored| stored.access_token.is_some())
		.unwrap_or(false);

	match session.initialize().await {
		SessionState::LoggedIn(identity) => {
			debug!(target = "filedash", username = %identity.username, admin = identity.is_admin, "session ready");
			Ok(FileDispatcher::new(session))
		}
		SessionState::LoggedOut if had_session => Err(DispatchError::SessionExpired.into()),
		SessionState::LoggedOut => Err(DispatchError::NotLoggedIn.into()),
	}
}
