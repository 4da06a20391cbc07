//! Session lifecycle: login, refresh, logout and startup validation.
//!
//! [`SessionManager`] is the only writer of the persisted credentials. It
//! exposes two observable states through [`SessionManager::subscribe`]:
//!
//! ```text
//! LoggedOut ──login / initialize(valid or refreshable)──▶ LoggedIn(Identity)
//! LoggedIn  ──logout / refresh failure / malformed token──▶ LoggedOut
//! ```
//!
//! Transitions are atomic from the caller's point of view: memory, store and
//! the published state are updated before the call returns.

use std::time::{SystemTime, UNIX_EPOCH};

use filedash_protocol::{RefreshRequest, RefreshResponse, RegisterRequest, TokenPair, TokenRequest};
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::claims::{Identity, decode_claims};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{AuthError, ConfigError, StoreError};
use crate::store::{CredentialStore, StoredCredentials};

/// Short-lived bearer token carrying identity claims.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

/// Long-lived token exchanged for new access tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

macro_rules! opaque_token {
	($name:ident) => {
		impl $name {
			pub fn new(value: impl Into<String>) -> Self {
				Self(value.into())
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl std::fmt::Debug for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				f.write_str(concat!(stringify!($name), "(<redacted>)"))
			}
		}
	};
}

opaque_token!(AccessToken);
opaque_token!(RefreshToken);

/// The held credential pair.
///
/// A store written by an older client may hold an access token without a
/// refresh token; such a session works until the access token expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
	pub access: AccessToken,
	pub refresh: Option<RefreshToken>,
}

impl Session {
	fn to_stored(&self) -> StoredCredentials {
		StoredCredentials {
			access_token: Some(self.access.as_str().to_string()),
			refresh_token: self.refresh.as_ref().map(|r| r.as_str().to_string()),
		}
	}
}

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "identity", rename_all = "camelCase")]
pub enum SessionState {
	#[default]
	LoggedOut,
	LoggedIn(Identity),
}

impl SessionState {
	pub fn identity(&self) -> Option<&Identity> {
		match self {
			SessionState::LoggedIn(identity) => Some(identity),
			SessionState::LoggedOut => None,
		}
	}

	pub fn is_logged_in(&self) -> bool {
		matches!(self, SessionState::LoggedIn(_))
	}
}

/// Session plus the identity decoded from its access token.
#[derive(Debug, Clone)]
struct Held {
	session: Session,
	identity: Identity,
}

/// Owns the session and every transition of it.
///
/// Share it as `Arc<SessionManager>`; all methods take `&self`.
pub struct SessionManager {
	client: ApiClient,
	store: Box<dyn CredentialStore>,
	held: RwLock<Option<Held>>,
	state: watch::Sender<SessionState>,
	/// Serializes refreshes so concurrent `401`s share one token exchange.
	refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for SessionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionManager")
			.field("base_url", &self.client.base_url().as_str())
			.field("state", &*self.state.borrow())
			.finish_non_exhaustive()
	}
}

impl SessionManager {
	/// Creates a logged-out manager. Call [`initialize`](Self::initialize) to
	/// pick up persisted credentials.
	pub fn new(config: &ClientConfig, store: Box<dyn CredentialStore>) -> Result<Self, ConfigError> {
		Ok(Self::with_client(ApiClient::new(config)?, store))
	}

	pub fn with_client(client: ApiClient, store: Box<dyn CredentialStore>) -> Self {
		let (state, _) = watch::channel(SessionState::LoggedOut);
		Self {
			client,
			store,
			held: RwLock::new(None),
			state,
			refresh_gate: Mutex::new(()),
		}
	}

	pub fn client(&self) -> &ApiClient {
		&self.client
	}

	/// Receiver for login/logout transitions.
	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state.subscribe()
	}

	pub fn state(&self) -> SessionState {
		self.state.borrow().clone()
	}

	pub fn identity(&self) -> Option<Identity> {
		self.held.read().as_ref().map(|h| h.identity.clone())
	}

	/// Access token to attach as bearer credential, if logged in.
	pub fn bearer(&self) -> Option<AccessToken> {
		self.held.read().as_ref().map(|h| h.session.access.clone())
	}

	pub fn session(&self) -> Option<Session> {
		self.held.read().as_ref().map(|h| h.session.clone())
	}

	/// Restores the persisted session on startup.
	///
	/// An expired access token triggers one refresh; a token that cannot be
	/// decoded, or a refresh that fails, clears the store.
	pub async fn initialize(&self) -> SessionState {
		let stored = match self.store.load() {
			Ok(stored) => stored,
			Err(err) => {
				warn!(target = "filedash", error = %err, "credential store unreadable, starting logged out");
				self.logout_quietly();
				return SessionState::LoggedOut;
			}
		};

		let Some(access) = stored.access_token else {
			debug!(target = "filedash", "no persisted access token");
			self.publish(SessionState::LoggedOut);
			return SessionState::LoggedOut;
		};

		let claims = match decode_claims(&access) {
			Ok(claims) => claims,
			Err(err) => {
				warn!(target = "filedash", error = %err, "persisted access token is malformed");
				self.logout_quietly();
				return SessionState::LoggedOut;
			}
		};

		let session = Session {
			access: AccessToken::new(access),
			refresh: stored.refresh_token.map(RefreshToken::new),
		};
		*self.held.write() = Some(Held {
			session,
			identity: Identity::from(&claims),
		});

		if claims.is_expired_at(now_ts()) {
			info!(target = "filedash", username = %claims.display_name(), "access token expired, refreshing");
			match self.refresh().await {
				Ok(identity) => SessionState::LoggedIn(identity),
				Err(err) => {
					info!(target = "filedash", error = %err, "refresh at startup failed");
					self.logout_quietly();
					SessionState::LoggedOut
				}
			}
		} else {
			let identity = Identity::from(&claims);
			debug!(target = "filedash", username = %identity.username, admin = identity.is_admin, "restored session");
			let state = SessionState::LoggedIn(identity);
			self.publish(state.clone());
			state
		}
	}

	/// Exchanges username and password for a token pair. Never retried.
	pub async fn login(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
		let url = self.client.endpoint(&self.client.endpoints().token)?;
		let body = TokenRequest {
			username: username.to_string(),
			password: password.to_string(),
		};

		let response = self.client.http().post(url).json(&body).send().await?;
		let status = response.status();
		if !status.is_success() {
			info!(target = "filedash", username, status = status.as_u16(), "login rejected");
			return Err(AuthError::InvalidCredentials);
		}

		let pair: TokenPair = match response.json().await {
			Ok(pair) => pair,
			Err(err) if err.is_decode() => {
				self.logout_quietly();
				return Err(AuthError::MalformedToken(format!("token response is not a token pair: {err}")));
			}
			Err(err) => return Err(AuthError::Network(err.to_string())),
		};
		let access = AccessToken::new(pair.access);
		let identity = match decode_claims(access.as_str()) {
			Ok(claims) => Identity::from(&claims),
			Err(err) => {
				self.logout_quietly();
				return Err(err);
			}
		};

		let session = Session {
			access,
			refresh: Some(RefreshToken::new(pair.refresh)),
		};
		self.store.save(&session.to_stored())?;
		*self.held.write() = Some(Held {
			session,
			identity: identity.clone(),
		});

		info!(target = "filedash", username = %identity.username, admin = identity.is_admin, "logged in");
		self.publish(SessionState::LoggedIn(identity.clone()));
		Ok(identity)
	}

	/// Exchanges the refresh token for a new access token.
	///
	/// On failure the held session is left as it was and
	/// [`AuthError::RefreshFailed`] is returned; logging out is up to the caller.
	pub async fn refresh(&self) -> Result<Identity, AuthError> {
		let _gate = self.refresh_gate.lock().await;
		self.refresh_locked().await
	}

	/// Refresh on behalf of a request that was rejected while carrying `stale`.
	///
	/// When another task already replaced `stale` while this one waited for
	/// the gate, the newer token is reused and no exchange happens.
	pub async fn refresh_after_rejection(&self, stale: &AccessToken) -> Result<Identity, AuthError> {
		let _gate = self.refresh_gate.lock().await;
		let current = self.held.read().as_ref().map(|h| (h.session.access.clone(), h.identity.clone()));
		if let Some((access, identity)) = current {
			if access != *stale {
				debug!(target = "filedash", "access token already refreshed by a concurrent request");
				return Ok(identity);
			}
		}
		self.refresh_locked().await
	}

	async fn refresh_locked(&self) -> Result<Identity, AuthError> {
		let refresh = self
			.held
			.read()
			.as_ref()
			.and_then(|h| h.session.refresh.clone())
			.ok_or(AuthError::NoRefreshToken)?;

		let url = self.client.endpoint(&self.client.endpoints().token_refresh)?;
		let body = RefreshRequest {
			refresh: refresh.as_str().to_string(),
		};

		let response = match self.client.http().post(url).json(&body).send().await {
			Ok(response) => response,
			Err(err) => {
				warn!(target = "filedash", error = %err, "refresh request failed");
				return Err(AuthError::RefreshFailed);
			}
		};
		if !response.status().is_success() {
			info!(target = "filedash", status = response.status().as_u16(), "refresh token rejected");
			return Err(AuthError::RefreshFailed);
		}
		let body: RefreshResponse = match response.json().await {
			Ok(body) => body,
			Err(err) => {
				warn!(target = "filedash", error = %err, "refresh response unreadable");
				return Err(AuthError::RefreshFailed);
			}
		};

		let access = AccessToken::new(body.access);
		let identity = decode_claims(access.as_str()).map(|claims| Identity::from(&claims))?;
		let session = Session {
			access,
			refresh: Some(body.refresh.map(RefreshToken::new).unwrap_or(refresh)),
		};

		self.store.save(&session.to_stored())?;
		*self.held.write() = Some(Held {
			session,
			identity: identity.clone(),
		});

		debug!(target = "filedash", username = %identity.username, "access token refreshed");
		self.publish(SessionState::LoggedIn(identity.clone()));
		Ok(identity)
	}

	/// Drops both credentials from memory and from the store.
	///
	/// Memory is always cleared and `LoggedOut` published, even when the
	/// store reports an error.
	pub fn logout(&self) -> Result<(), StoreError> {
		let was_logged_in = self.held.write().take().is_some();
		self.publish(SessionState::LoggedOut);
		if was_logged_in {
			info!(target = "filedash", "logged out");
		}
		self.store.clear()
	}

	pub(crate) fn logout_quietly(&self) {
		if let Err(err) = self.logout() {
			warn!(target = "filedash", error = %err, "failed to clear credential store");
		}
	}

	/// Creates an account. Does not log in.
	pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<(), AuthError> {
		let url = self.client.endpoint(&self.client.endpoints().register)?;
		let body = RegisterRequest {
			username: username.to_string(),
			email: email.to_string(),
			password: password.to_string(),
		};

		let response = self.client.http().post(url).json(&body).send().await?;
		let status = response.status();
		if status == StatusCode::CREATED {
			info!(target = "filedash", username, "account registered");
			return Ok(());
		}

		let text = response.text().await.unwrap_or_default();
		let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
		info!(target = "filedash", username, status = status.as_u16(), "registration refused");
		Err(AuthError::Registration {
			status: status.as_u16(),
			body,
		})
	}

	fn publish(&self, state: SessionState) {
		self.state.send_if_modified(|current| {
			if *current == state {
				false
			} else {
				*current = state;
				true
			}
		});
	}
}

fn now_ts() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}
