//! Profile-scoped CLI state: configuration and the credential file.
//!
//! A profile bundles one backend (base URL, endpoint layout) with one
//! session. `--profile` selects it; the default profile is `default`.

mod storage;
mod types;

use filedash::protocol::FileOrdering;
use filedash::{ClientConfig, FileCredentialStore};
use serde::Serialize;
pub use storage::StatePaths;
pub use types::{DEFAULT_BASE_URL, ProfileConfig, SCHEMA_VERSION};
use url::Url;

use crate::error::{CliError, Result};

/// Where the effective base URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseUrlSource {
	/// `--base-url` or `FILEDASH_BASE_URL`.
	Override,
	Profile,
	Default,
}

/// Loaded profile plus the per-invocation overrides.
#[derive(Debug)]
pub struct ProfileState {
	pub paths: StatePaths,
	pub config: ProfileConfig,
	base_url_override: Option<Url>,
	fallback_base_url: Url,
}

impl ProfileState {
	pub fn load(profile: &str, base_url_override: Option<&str>) -> Result<Self> {
		Self::from_paths(StatePaths::new(profile)?, base_url_override)
	}

	pub fn from_paths(paths: StatePaths, base_url_override: Option<&str>) -> Result<Self> {
		let config = storage::load_json::<ProfileConfig>(&paths.config)?.unwrap_or_else(ProfileConfig::new);
		let base_url_override = base_url_override.map(parse_base_url).transpose()?;
		Ok(Self {
			paths,
			config,
			base_url_override,
			fallback_base_url: parse_base_url(DEFAULT_BASE_URL)?,
		})
	}

	pub fn base_url(&self) -> (Url, BaseUrlSource) {
		if let Some(url) = &self.base_url_override {
			return (url.clone(), BaseUrlSource::Override);
		}
		if let Some(url) = &self.config.base_url {
			return (url.clone(), BaseUrlSource::Profile);
		}
		(self.fallback_base_url.clone(), BaseUrlSource::Default)
	}

	pub fn client_config(&self) -> ClientConfig {
		let mut config = ClientConfig::new(self.base_url().0).with_endpoints(self.config.endpoints.clone());
		if let Some(secs) = self.config.timeout_secs {
			config = config.with_timeout_secs(secs);
		}
		config
	}

	pub fn credential_store(&self) -> FileCredentialStore {
		FileCredentialStore::new(&self.paths.secrets)
	}

	pub fn default_ordering(&self) -> FileOrdering {
		self.config.default_ordering.unwrap_or_default()
	}

	pub fn set_base_url(&mut self, raw: &str) -> Result<Url> {
		let url = parse_base_url(raw)?;
		self.config.base_url = Some(url.clone());
		Ok(url)
	}

	pub fn save(&mut self) -> Result<()> {
		self.config.schema = SCHEMA_VERSION;
		storage::save_json(&self.paths.config, &self.config)
	}
}

/// Accepts `http`/`https` URLs only.
pub fn parse_base_url(raw: &str) -> Result<Url> {
	let url = Url::parse(raw.trim()).map_err(|e| CliError::InvalidInput(format!("invalid base URL '{raw}': {e}")))?;
	match url.scheme() {
		"http" | "https" => Ok(url),
		other => Err(CliError::InvalidInput(format!(
			"base URL must use http or https, got '{other}'"
		))),
	}
}
