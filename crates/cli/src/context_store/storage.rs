//! File locations and JSON persistence for profile state.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// File paths of one profile.
///
/// Profiles live under `<config dir>/filedash/<profile>/`, where the config
/// dir is `$XDG_CONFIG_HOME` when set and the platform default otherwise.
/// Tokens go to `secrets.json` next to `config.json`.
#[derive(Debug, Clone)]
pub struct StatePaths {
	pub profile: String,
	pub dir: PathBuf,
	pub config: PathBuf,
	pub secrets: PathBuf,
}

impl StatePaths {
	pub fn new(profile: &str) -> Result<Self> {
		let config_home = config_home(std::env::var_os("XDG_CONFIG_HOME"), dirs::config_dir())?;
		Self::under(&config_home.join("filedash"), profile)
	}

	/// Paths of `profile` below an explicit root.
	pub fn under(root: &Path, profile: &str) -> Result<Self> {
		validate_profile(profile)?;
		let dir = root.join(profile);
		Ok(Self {
			profile: profile.to_string(),
			config: dir.join("config.json"),
			secrets: dir.join("secrets.json"),
			dir,
		})
	}
}

/// An explicit, absolute `XDG_CONFIG_HOME` wins over the platform default.
fn config_home(xdg: Option<std::ffi::OsString>, platform: Option<PathBuf>) -> Result<PathBuf> {
	xdg.map(PathBuf::from)
		.filter(|dir| dir.is_absolute())
		.or(platform)
		.ok_or_else(|| CliError::InvalidInput("no config directory found; set XDG_CONFIG_HOME".into()))
}

fn validate_profile(profile: &str) -> Result<()> {
	let valid = !profile.is_empty()
		&& profile != "."
		&& profile != ".."
		&& profile.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
	if valid {
		Ok(())
	} else {
		Err(CliError::InvalidInput(format!(
			"profile name '{profile}' may only contain letters, digits, '-', '_' and '.'"
		)))
	}
}

/// Missing file loads as `None`; a file that exists but does not parse is
/// an error so a typo never silently resets the profile.
pub(crate) fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
	match fs::read_to_string(path) {
		Ok(content) if content.trim().is_empty() => Ok(None),
		Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
		Err(err) => Err(err.into()),
	}
}

pub(crate) fn save_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	fs::write(path, serde_json::to_string_pretty(data)?)?;
	Ok(())
}
