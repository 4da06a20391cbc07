//! HTTP plumbing shared by the session manager and the dispatcher.

use std::time::Duration;

use url::Url;

use crate::config::{ClientConfig, Endpoints};
use crate::error::ConfigError;

/// Thin wrapper over [`reqwest::Client`] that knows the endpoint layout.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
	http: reqwest::Client,
	base: Url,
	endpoints: Endpoints,
}

impl ApiClient {
	pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
		if config.base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidBaseUrl(config.base_url.to_string()));
		}

		let mut base = config.base_url.clone();
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}

		let mut builder = reqwest::Client::builder().user_agent(concat!("filedash/", env!("CARGO_PKG_VERSION")));
		if let Some(secs) = config.timeout_secs {
			builder = builder.timeout(Duration::from_secs(secs));
		}
		let http = builder.build().map_err(|e| ConfigError::Http(e.to_string()))?;

		Ok(Self {
			http,
			base,
			endpoints: config.endpoints.clone(),
		})
	}

	pub fn http(&self) -> &reqwest::Client {
		&self.http
	}

	pub fn base_url(&self) -> &Url {
		&self.base
	}

	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Resolves an endpoint path against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base.join(path.trim_start_matches('/')).map_err(|e| ConfigError::InvalidEndpoint {
			path: path.to_string(),
			reason: e.to_string(),
		})
	}

	/// Resolves `path` and appends percent-encoded `segments` plus a trailing
	/// slash, e.g. `files/` + `["5", "view"]` → `files/5/view/`.
	pub fn resource(&self, path: &str, segments: &[&str]) -> Result<Url, ConfigError> {
		let mut url = self.endpoint(path)?;
		{
			let mut parts = url.path_segments_mut().map_err(|()| ConfigError::InvalidBaseUrl(self.base.to_string()))?;
			parts.pop_if_empty();
			parts.extend(segments);
			parts.push("");
		}
		Ok(url)
	}
}
