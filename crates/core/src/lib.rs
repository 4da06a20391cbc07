//! Client-side session management and file actions for the filedash storage backend.
//!
//! The crate is built around two components:
//!
//! * [`SessionManager`] acquires, persists, validates and refreshes the
//!   access/refresh token pair and publishes [`SessionState`] transitions.
//! * [`FileDispatcher`] issues authenticated file calls, replays a request
//!   once after a transparent refresh on `401`, and publishes the observed
//!   [`DashboardView`].
//!
//! Token claims are decoded without signature verification. They only drive
//! presentation (username, admin controls); every authorization decision is
//! made by the backend.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use filedash::{ClientConfig, FileCredentialStore, FileDispatcher, FileQuery, SessionManager};
//!
//! let config = ClientConfig::new("http://localhost:8000".parse()?);
//! let store = FileCredentialStore::new("/tmp/filedash/secrets.json");
//! let session = Arc::new(SessionManager::new(&config, Box::new(store))?);
//! session.login("alice", "hunter22").await?;
//!
//! let files = FileDispatcher::new(session.clone());
//! for file in files.list(FileQuery::default()).await? {
//!     println!("{} ({} KiB)", file.original_filename, file.size_kib());
//! }
//! ```

pub mod claims;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod store;

pub use claims::{Identity, decode_claims, decode_identity};
pub use client::ApiClient;
pub use config::{ClientConfig, Endpoints};
pub use dispatch::{
	BoxFut, Confirm, DashboardView, DeleteOutcome, FileDispatcher, FileQuery, ListScope, Locator, LocatorKind, LocatorOpener, LogQuery,
	NoOpen, Notice,
};
pub use error::{AuthError, ConfigError, DispatchError, StoreError};
pub use session::{AccessToken, RefreshToken, Session, SessionManager, SessionState};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredentials};

pub use filedash_protocol as protocol;
