//! Durable credential storage.
//!
//! The session survives restarts through a [`CredentialStore`]. Two fixed
//! keys are persisted, `access_token` and `refresh_token`; the store never
//! holds anything derived from them.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Persisted token pair. Both halves are optional so a partially written
/// or hand-edited file still loads.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
}

impl StoredCredentials {
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none()
	}
}

impl std::fmt::Debug for StoredCredentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StoredCredentials")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Backing storage for the session.
///
/// Only [`SessionManager`](crate::SessionManager) writes to a store.
pub trait CredentialStore: Send + Sync {
	fn load(&self) -> Result<StoredCredentials, StoreError>;

	/// Replaces the stored pair wholesale.
	fn save(&self, credentials: &StoredCredentials) -> Result<(), StoreError>;

	/// Removes both credentials. Clearing an empty store succeeds.
	fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file store, readable only by the owner on unix.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
	path: PathBuf,
}

impl FileCredentialStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn io_err(&self, source: std::io::Error) -> StoreError {
		StoreError::Io {
			path: self.path.clone(),
			source,
		}
	}
}

impl CredentialStore for FileCredentialStore {
	fn load(&self) -> Result<StoredCredentials, StoreError> {
		match fs::read_to_string(&self.path) {
			Ok(content) if content.trim().is_empty() => Ok(StoredCredentials::default()),
			Ok(content) => Ok(serde_json::from_str(&content)?),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoredCredentials::default()),
			Err(err) => Err(self.io_err(err)),
		}
	}

	fn save(&self, credentials: &StoredCredentials) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
			}
		}
		fs::write(&self.path, serde_json::to_string_pretty(credentials)?).map_err(|e| self.io_err(e))?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|e| self.io_err(e))?;
		}
		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(self.io_err(err)),
		}
	}
}

/// In-process store for tests and embedders that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
	inner: Mutex<StoredCredentials>,
}

impl MemoryCredentialStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_credentials(credentials: StoredCredentials) -> Self {
		Self {
			inner: Mutex::new(credentials),
		}
	}

	/// Snapshot of the stored pair.
	pub fn snapshot(&self) -> StoredCredentials {
		self.inner.lock().clone()
	}
}

impl CredentialStore for MemoryCredentialStore {
	fn load(&self) -> Result<StoredCredentials, StoreError> {
		Ok(self.inner.lock().clone())
	}

	fn save(&self, credentials: &StoredCredentials) -> Result<(), StoreError> {
		*self.inner.lock() = credentials.clone();
		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		*self.inner.lock() = StoredCredentials::default();
		Ok(())
	}
}

impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
	fn load(&self) -> Result<StoredCredentials, StoreError> {
		(**self).load()
	}

	fn save(&self, credentials: &StoredCredentials) -> Result<(), StoreError> {
		(**self).save(credentials)
	}

	fn clear(&self) -> Result<(), StoreError> {
		(**self).clear()
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	fn pair() -> StoredCredentials {
		StoredCredentials {
			access_token: Some("a.b.c".into()),
			refresh_token: Some("r.e.f".into()),
		}
	}

	#[test]
	fn file_store_missing_file_is_empty() {
		let tmp = TempDir::new().unwrap();
		let store = FileCredentialStore::new(tmp.path().join("secrets.json"));
		assert!(store.load().unwrap().is_empty());
	}

	#[test]
	fn file_store_save_load_clear() {
		let tmp = TempDir::new().unwrap();
		let store = FileCredentialStore::new(tmp.path().join("nested/secrets.json"));

		store.save(&pair()).unwrap();
		assert_eq!(store.load().unwrap(), pair());

		let raw = fs::read_to_string(store.path()).unwrap();
		assert!(raw.contains("\"access_token\""));
		assert!(raw.contains("\"refresh_token\""));

		store.clear().unwrap();
		assert!(!store.path().exists());
		assert!(store.load().unwrap().is_empty());

		// idempotent
		store.clear().unwrap();
	}

	#[cfg(unix)]
	#[test]
	fn file_store_is_owner_only() {
		use std::os::unix::fs::PermissionsExt;

		let tmp = TempDir::new().unwrap();
		let store = FileCredentialStore::new(tmp.path().join("secrets.json"));
		store.save(&pair()).unwrap();
		let mode = fs::metadata(store.path()).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}

	#[test]
	fn file_store_rejects_garbage() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("secrets.json");
		fs::write(&path, "not json").unwrap();
		assert!(matches!(FileCredentialStore::new(path).load(), Err(StoreError::Json(_))));
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let dbg = format!("{:?}", pair());
		assert!(!dbg.contains("a.b.c"));
		assert!(dbg.contains("redacted"));
	}
}
