//! `config show|set-base-url`.

use std::path::Path;

use filedash::Endpoints;
use filedash::protocol::FileOrdering;
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::cli::ConfigAction;
use crate::context_store::{BaseUrlSource, ProfileState};
use crate::error::Result;
use crate::output::{OutputFormat, emit};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigData<'a> {
	profile: &'a str,
	config_file: &'a Path,
	credentials_file: &'a Path,
	base_url: Url,
	base_url_source: BaseUrlSource,
	endpoints: &'a Endpoints,
	default_ordering: FileOrdering,
	#[serde(skip_serializing_if = "Option::is_none")]
	timeout_secs: Option<u64>,
}

impl<'a> From<&'a ProfileState> for ConfigData<'a> {
	fn from(profile: &'a ProfileState) -> Self {
		let (base_url, base_url_source) = profile.base_url();
		Self {
			profile: &profile.paths.profile,
			config_file: &profile.paths.config,
			credentials_file: &profile.paths.secrets,
			base_url,
			base_url_source,
			endpoints: &profile.config.endpoints,
			default_ordering: profile.default_ordering(),
			timeout_secs: profile.config.timeout_secs,
		}
	}
}

pub fn execute(action: ConfigAction, profile: &mut ProfileState, format: OutputFormat) -> Result<()> {
	match action {
		ConfigAction::Show => emit("config.show", ConfigData::from(&*profile), None, format),
		ConfigAction::SetBaseUrl { url } => {
			let url = profile.set_base_url(&url)?;
			profile.save()?;
			info!(target = "filedash", profile = %profile.paths.profile, %url, "base URL stored");
			emit("config.set-base-url", ConfigData::from(&*profile), None, format);
		}
	}
	Ok(())
}
