//! In-process stand-in for the storage backend.
//!
//! Implements the token, file and admin routes with just enough behaviour to
//! drive the client: tokens are unsigned JWT-shaped strings, files live in
//! memory, and counters record how often the interesting routes were hit.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use filedash::protocol::{FileRecord, Owner};
use filedash::{ClientConfig, CredentialStore, FileDispatcher, MemoryCredentialStore, SessionManager, StoredCredentials};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub const ALICE: (&str, &str) = ("alice", "alice-pw");
pub const ROOT: (&str, &str) = ("root", "root-pw");

#[derive(Debug, Clone)]
struct Account {
	password: String,
	email: String,
	is_staff: bool,
	is_superuser: bool,
}

#[derive(Default)]
pub struct BackendState {
	accounts: Mutex<HashMap<String, Account>>,
	/// access token -> username
	access: Mutex<HashMap<String, String>>,
	/// refresh token -> username
	refresh: Mutex<HashMap<String, String>>,
	files: Mutex<Vec<FileRecord>>,
	next_id: AtomicU64,
	nonce: AtomicU64,

	pub login_calls: AtomicUsize,
	pub refresh_calls: AtomicUsize,
	pub list_calls: AtomicUsize,
	pub upload_calls: AtomicUsize,
	pub delete_calls: AtomicUsize,
	pub admin_calls: AtomicUsize,
	pub list_queries: Mutex<Vec<HashMap<String, String>>>,
	pub log_queries: Mutex<Vec<HashMap<String, String>>>,

	/// Refresh endpoint rejects every token.
	pub reject_refresh: AtomicBool,
	/// Authenticated routes answer 401 regardless of the token.
	pub always_unauthorized: AtomicBool,
	/// Delete answers 403.
	pub forbid_delete: AtomicBool,
	/// Delay before the refresh endpoint answers.
	pub refresh_delay_ms: AtomicU64,
	/// Access tokens carry only the stock claims (`user_id`, no username or
	/// admin flags).
	pub stock_claims: AtomicBool,
	/// Token endpoint answers 200 with a body that is not JSON.
	pub garbled_token_body: AtomicBool,
}

impl BackendState {
	fn mint(&self, username: &str, exp: i64) -> String {
		let account = self.accounts.lock().get(username).cloned();
		let (is_staff, is_superuser) = account.map(|a| (a.is_staff, a.is_superuser)).unwrap_or_default();
		let jti = self.nonce.fetch_add(1, Ordering::SeqCst);
		if self.stock_claims.load(Ordering::SeqCst) {
			return mint_jwt(&json!({
				"token_type": "access",
				"exp": exp,
				"iat": exp - 900,
				"jti": jti,
				"user_id": 1,
			}));
		}
		let claims = json!({
			"token_type": "access",
			"exp": exp,
			"jti": jti,
			"user_id": 1,
			"username": username,
			"is_staff": is_staff,
			"is_superuser": is_superuser,
		});
		mint_jwt(&claims)
	}

	fn issue_access(&self, username: &str) -> String {
		let token = self.mint(username, now() + 900);
		self.access.lock().insert(token.clone(), username.to_string());
		token
	}

	fn issue_refresh(&self, username: &str) -> String {
		let token = format!("refresh-{}-{}", username, self.nonce.fetch_add(1, Ordering::SeqCst));
		self.refresh.lock().insert(token.clone(), username.to_string());
		token
	}

	/// Forgets every issued access token, as if they all expired.
	pub fn expire_access_tokens(&self) {
		self.access.lock().clear();
	}

	/// Issues an access token that the backend already considers expired.
	pub fn expired_access_token(&self, username: &str) -> String {
		self.mint(username, now() - 60)
	}

	pub fn refresh_token_for(&self, username: &str) -> String {
		self.issue_refresh(username)
	}

	pub fn add_file(&self, owner: &str, name: &str, size: u64) -> u64 {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
		self.files.lock().push(FileRecord {
			id,
			original_filename: name.to_string(),
			file_size: size,
			owner: Owner::Name(owner.to_string()),
			owner_username: Some(owner.to_string()),
			uploaded_at: Some(format!("2024-05-0{}T10:00:00Z", id % 9 + 1)),
			is_zip: name.ends_with(".zip"),
			file_url: Some(format!("/media/uploads/{name}")),
		});
		id
	}

	pub fn file_names(&self) -> Vec<String> {
		self.files.lock().iter().map(|f| f.original_filename.clone()).collect()
	}

	pub fn is_staff(&self, username: &str) -> bool {
		self.accounts.lock().get(username).is_some_and(|a| a.is_staff)
	}

	fn authorize(&self, headers: &HeaderMap) -> Result<(String, bool), StatusCode> {
		if self.always_unauthorized.load(Ordering::SeqCst) {
			return Err(StatusCode::UNAUTHORIZED);
		}
		let token = headers
			.get("authorization")
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.strip_prefix("Bearer "))
			.ok_or(StatusCode::UNAUTHORIZED)?;
		let username = self.access.lock().get(token).cloned().ok_or(StatusCode::UNAUTHORIZED)?;
		let admin = self.accounts.lock().get(&username).is_some_and(|a| a.is_staff || a.is_superuser);
		Ok((username, admin))
	}
}

pub fn mint_jwt(claims: &Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
	format!("{header}.{payload}.dGVzdA")
}

pub fn now() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
}

pub struct Backend {
	pub addr: SocketAddr,
	pub state: Arc<BackendState>,
}

impl Backend {
	pub async fn spawn() -> Self {
		let state = Arc::new(BackendState::default());
		{
			let mut accounts = state.accounts.lock();
			accounts.insert(
				ALICE.0.into(),
				Account {
					password: ALICE.1.into(),
					email: "alice@example.com".into(),
					is_staff: false,
					is_superuser: false,
				},
			);
			accounts.insert(
				ROOT.0.into(),
				Account {
					password: ROOT.1.into(),
					email: "root@example.com".into(),
					is_staff: false,
					is_superuser: true,
				},
			);
		}

		let app = Router::new()
			.route("/api/users/token/", post(issue_tokens))
			.route("/api/users/token/refresh/", post(refresh_token))
			.route("/api/users/register/", post(register))
			.route("/api/users/list/", get(list_users))
			.route("/api/users/toggle-staff/{username}/", post(toggle_staff))
			.route("/api/logs/", get(list_logs))
			.route("/api/files/", get(list_files).post(upload_file))
			.route("/api/files/{id}/", delete(delete_file))
			.route("/api/files/{id}/{kind}/", get(locate_file))
			.with_state(state.clone());

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});

		Self { addr, state }
	}

	pub fn base_url(&self) -> String {
		format!("http://{}/", self.addr)
	}

	pub fn config(&self) -> ClientConfig {
		ClientConfig::new(self.base_url().parse().unwrap())
	}

	pub fn session_with(&self, store: Arc<MemoryCredentialStore>) -> Arc<SessionManager> {
		Arc::new(SessionManager::new(&self.config(), Box::new(store)).unwrap())
	}

	/// Logged-in session and dispatcher for `who`.
	pub async fn login(&self, who: (&str, &str)) -> (Arc<MemoryCredentialStore>, FileDispatcher) {
		let store = Arc::new(MemoryCredentialStore::new());
		let session = self.session_with(store.clone());
		session.login(who.0, who.1).await.unwrap();
		(store, FileDispatcher::new(session))
	}

	/// Store pre-seeded with an expired access token and a live refresh token.
	pub fn expired_store(&self, username: &str) -> Arc<MemoryCredentialStore> {
		let store = MemoryCredentialStore::with_credentials(StoredCredentials {
			access_token: Some(self.state.expired_access_token(username)),
			refresh_token: Some(self.state.refresh_token_for(username)),
		});
		assert!(!store.load().unwrap().is_empty());
		Arc::new(store)
	}

	pub fn count(counter: &AtomicUsize) -> usize {
		counter.load(Ordering::SeqCst)
	}
}

type Shared = State<Arc<BackendState>>;

async fn issue_tokens(State(state): Shared, Json(body): Json<Value>) -> Response {
	state.login_calls.fetch_add(1, Ordering::SeqCst);
	let username = body["username"].as_str().unwrap_or_default();
	let password = body["password"].as_str().unwrap_or_default();
	let valid = state.accounts.lock().get(username).is_some_and(|a| a.password == password);
	if !valid {
		return (
			StatusCode::UNAUTHORIZED,
			Json(json!({"detail": "No active account found with the given credentials"})),
		)
			.into_response();
	}
	if state.garbled_token_body.load(Ordering::SeqCst) {
		return (StatusCode::OK, "<html>maintenance</html>").into_response();
	}
	let access = state.issue_access(username);
	let refresh = state.issue_refresh(username);
	Json(json!({"access": access, "refresh": refresh})).into_response()
}

async fn refresh_token(State(state): Shared, Json(body): Json<Value>) -> Response {
	state.refresh_calls.fetch_add(1, Ordering::SeqCst);
	let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
	if delay > 0 {
		tokio::time::sleep(Duration::from_millis(delay)).await;
	}
	if state.reject_refresh.load(Ordering::SeqCst) {
		return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token is invalid or expired"}))).into_response();
	}
	let token = body["refresh"].as_str().unwrap_or_default();
	let Some(username) = state.refresh.lock().get(token).cloned() else {
		return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token is invalid or expired"}))).into_response();
	};
	let access = state.issue_access(&username);
	Json(json!({"access": access})).into_response()
}

async fn register(State(state): Shared, Json(body): Json<Value>) -> Response {
	let username = body["username"].as_str().unwrap_or_default().to_string();
	let mut accounts = state.accounts.lock();
	if username.is_empty() || accounts.contains_key(&username) {
		return (
			StatusCode::BAD_REQUEST,
			Json(json!({"username": ["A user with that username already exists."]})),
		)
			.into_response();
	}
	accounts.insert(
		username.clone(),
		Account {
			password: body["password"].as_str().unwrap_or_default().into(),
			email: body["email"].as_str().unwrap_or_default().into(),
			is_staff: false,
			is_superuser: false,
		},
	);
	(StatusCode::CREATED, Json(json!({"username": username}))).into_response()
}

async fn list_files(State(state): Shared, headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
	let (username, admin) = match state.authorize(&headers) {
		Ok(who) => who,
		Err(status) => return status.into_response(),
	};
	state.list_calls.fetch_add(1, Ordering::SeqCst);
	state.list_queries.lock().push(query.clone());

	let all = admin && query.get("all_files").is_some_and(|v| v == "true");
	let owner = query.get("owner_username").filter(|_| all);
	let files: Vec<FileRecord> = state
		.files
		.lock()
		.iter()
		.filter(|f| {
			let name = f.owner_username.as_deref().unwrap_or_default();
			match owner {
				Some(owner) => name == owner,
				None => all || name == username,
			}
		})
		.cloned()
		.collect();
	Json(files).into_response()
}

async fn upload_file(State(state): Shared, headers: HeaderMap, mut multipart: Multipart) -> Response {
	let (username, _) = match state.authorize(&headers) {
		Ok(who) => who,
		Err(status) => return status.into_response(),
	};
	state.upload_calls.fetch_add(1, Ordering::SeqCst);
	while let Ok(Some(field)) = multipart.next_field().await {
		if field.name() != Some("file") {
			continue;
		}
		let name = field.file_name().unwrap_or("unnamed").to_string();
		let Ok(bytes) = field.bytes().await else {
			return StatusCode::BAD_REQUEST.into_response();
		};
		let id = state.add_file(&username, &name, bytes.len() as u64);
		return (StatusCode::CREATED, Json(json!({"id": id, "original_filename": name}))).into_response();
	}
	(StatusCode::BAD_REQUEST, Json(json!({"file": ["No file was submitted."]}))).into_response()
}

async fn locate_file(State(state): Shared, headers: HeaderMap, Path((id, kind)): Path<(u64, String)>) -> Response {
	let (username, admin) = match state.authorize(&headers) {
		Ok(who) => who,
		Err(status) => return status.into_response(),
	};
	let files = state.files.lock();
	let Some(file) = files.iter().find(|f| f.id == id) else {
		return StatusCode::NOT_FOUND.into_response();
	};
	if !admin && file.owner_username.as_deref() != Some(username.as_str()) {
		return StatusCode::FORBIDDEN.into_response();
	}
	match kind.as_str() {
		"view" | "download" => Json(json!({"url": format!("https://cdn.example.com/{kind}/{id}?sig=abc")})).into_response(),
		_ => StatusCode::NOT_FOUND.into_response(),
	}
}

async fn delete_file(State(state): Shared, headers: HeaderMap, Path(id): Path<u64>) -> Response {
	if let Err(status) = state.authorize(&headers) {
		return status.into_response();
	}
	state.delete_calls.fetch_add(1, Ordering::SeqCst);
	if state.forbid_delete.load(Ordering::SeqCst) {
		return (
			StatusCode::FORBIDDEN,
			Json(json!({"detail": "You do not have permission to perform this action."})),
		)
			.into_response();
	}
	let mut files = state.files.lock();
	let before = files.len();
	files.retain(|f| f.id != id);
	if files.len() == before {
		return StatusCode::NOT_FOUND.into_response();
	}
	StatusCode::NO_CONTENT.into_response()
}

async fn list_users(State(state): Shared, headers: HeaderMap) -> Response {
	match state.authorize(&headers) {
		Ok((_, true)) => {}
		Ok(_) => return StatusCode::FORBIDDEN.into_response(),
		Err(status) => return status.into_response(),
	}
	state.admin_calls.fetch_add(1, Ordering::SeqCst);
	let accounts = state.accounts.lock();
	let mut names: Vec<&String> = accounts.keys().collect();
	names.sort();
	let users: Vec<Value> = names
		.into_iter()
		.enumerate()
		.map(|(i, name)| {
			let a = &accounts[name];
			json!({"id": i + 1, "username": name, "email": a.email, "is_staff": a.is_staff, "is_superuser": a.is_superuser})
		})
		.collect();
	Json(users).into_response()
}

async fn toggle_staff(State(state): Shared, headers: HeaderMap, Path(username): Path<String>) -> Response {
	match state.authorize(&headers) {
		Ok((_, true)) => {}
		Ok(_) => return StatusCode::FORBIDDEN.into_response(),
		Err(status) => return status.into_response(),
	}
	state.admin_calls.fetch_add(1, Ordering::SeqCst);
	let mut accounts = state.accounts.lock();
	let Some(account) = accounts.get_mut(&username) else {
		return (StatusCode::NOT_FOUND, Json(json!({"error": "User not found"}))).into_response();
	};
	account.is_staff = !account.is_staff;
	Json(json!({"status": format!("{username} is_staff={}", account.is_staff)})).into_response()
}

async fn list_logs(State(state): Shared, headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
	match state.authorize(&headers) {
		Ok((_, true)) => {}
		Ok(_) => return StatusCode::FORBIDDEN.into_response(),
		Err(status) => return status.into_response(),
	}
	state.admin_calls.fetch_add(1, Ordering::SeqCst);
	state.log_queries.lock().push(query.clone());
	let mut entries = vec![
		json!({"id": 1, "username": "alice", "timestamp": "2024-05-01T10:00:00Z", "action": "LOGIN", "details": ""}),
		json!({"id": 2, "username": "root", "timestamp": "2024-05-01T11:00:00Z", "action": "STATUS_CHANGE", "details": "alice"}),
	];
	if let Some(user) = query.get("user") {
		entries.retain(|e| e["username"] == user.as_str());
	}
	Json(entries).into_response()
}
