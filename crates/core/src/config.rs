//! Backend location and endpoint layout.

use serde::{Deserialize, Serialize};
use url::Url;

/// Endpoint paths relative to [`ClientConfig::base_url`].
///
/// Defaults match the stock backend routes. Leading slashes are ignored so
/// that a base URL with a path prefix (`https://host/storage/`) is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoints {
	pub token: String,
	pub token_refresh: String,
	pub register: String,
	/// Collection path; items live at `<files>/<id>/`.
	pub files: String,
	pub users: String,
	/// Prefix for `<toggle_staff>/<username>/`.
	pub toggle_staff: String,
	pub logs: String,
}

impl Default for Endpoints {
	fn default() -> Self {
		Self {
			token: "api/users/token/".into(),
			token_refresh: "api/users/token/refresh/".into(),
			register: "api/users/register/".into(),
			files: "api/files/".into(),
			users: "api/users/list/".into(),
			toggle_staff: "api/users/toggle-staff/".into(),
			logs: "api/logs/".into(),
		}
	}
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
	pub base_url: Url,
	#[serde(default)]
	pub endpoints: Endpoints,
	/// Per-request timeout. `None` leaves requests pending until the
	/// backend answers or the connection drops.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_secs: Option<u64>,
}

impl ClientConfig {
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			endpoints: Endpoints::default(),
			timeout_secs: None,
		}
	}

	pub fn with_timeout_secs(mut self, secs: u64) -> Self {
		self.timeout_secs = Some(secs);
		self
	}

	pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = endpoints;
		self
	}
}
