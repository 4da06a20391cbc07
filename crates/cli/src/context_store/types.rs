//! Profile configuration persisted as `config.json`.

use filedash::Endpoints;
use filedash::protocol::FileOrdering;
use serde::{Deserialize, Serialize};
use url::Url;

/// Schema version for config files.
pub const SCHEMA_VERSION: u32 = 1;

/// Base URL used when neither the flag, the environment nor the profile
/// names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

/// Durable configuration of one profile.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
	#[serde(default)]
	pub schema: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_url: Option<Url>,
	#[serde(default)]
	pub endpoints: Endpoints,
	/// Sort order for `files list` when `--sort` is not given.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_ordering: Option<FileOrdering>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_secs: Option<u64>,
}

impl ProfileConfig {
	/// Creates a config with current [`SCHEMA_VERSION`].
	pub fn new() -> Self {
		Self {
			schema: SCHEMA_VERSION,
			..Default::default()
		}
	}
}
