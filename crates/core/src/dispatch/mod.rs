//! Authenticated file actions.
//!
//! Every action is one bearer-authenticated request. A `401` triggers a
//! single refresh through the [`SessionManager`] followed by a single replay;
//! a second `401`, or a failed refresh, ends the session. Other failures are
//! reported through [`Notice`]s on the published [`DashboardView`] and leave
//! the session alone. Transport failures are never retried.

mod admin;
mod view;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use filedash_protocol::{FileRecord, ResourceLocator};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use admin::LogQuery;
pub use view::{DashboardView, FileQuery, ListScope, Notice};

use crate::error::DispatchError;
use crate::session::{AccessToken, SessionManager};

/// Boxed future returned by the object-safe callback traits.
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Asks the user to approve a destructive action.
pub trait Confirm: Send + Sync {
	fn confirm<'a>(&'a self, prompt: &'a str) -> BoxFut<'a, bool>;
}

/// Fixed answer, for non-interactive callers (`--yes`) and tests.
impl Confirm for bool {
	fn confirm<'a>(&'a self, _prompt: &'a str) -> BoxFut<'a, bool> {
		let answer = *self;
		Box::pin(async move { answer })
	}
}

/// Which locator endpoint produced a [`Locator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
	View,
	Download,
}

impl LocatorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			LocatorKind::View => "view",
			LocatorKind::Download => "download",
		}
	}
}

/// Time-limited URL for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Locator {
	pub file_id: u64,
	pub kind: LocatorKind,
	pub url: String,
}

/// Opens a resource locator in a new browsing context.
///
/// File bytes never pass through the dispatcher; the opener hands the URL
/// to whatever fetches it.
pub trait LocatorOpener: Send + Sync {
	fn open(&self, locator: &Locator) -> std::io::Result<()>;
}

/// Opener that does nothing; the locator is only returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpen;

impl LocatorOpener for NoOpen {
	fn open(&self, _locator: &Locator) -> std::io::Result<()> {
		Ok(())
	}
}

/// Result of [`FileDispatcher::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteOutcome {
	Deleted,
	/// The confirmation was declined; nothing was sent.
	Cancelled,
}

/// Issues file actions on behalf of the current session.
pub struct FileDispatcher {
	session: Arc<SessionManager>,
	view: watch::Sender<DashboardView>,
	opener: Box<dyn LocatorOpener>,
}

impl std::fmt::Debug for FileDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FileDispatcher").field("view", &*self.view.borrow()).finish_non_exhaustive()
	}
}

impl FileDispatcher {
	pub fn new(session: Arc<SessionManager>) -> Self {
		let (view, _) = watch::channel(DashboardView {
			identity: session.identity(),
			..DashboardView::default()
		});
		Self {
			session,
			view,
			opener: Box::new(NoOpen),
		}
	}

	pub fn with_opener(mut self, opener: impl LocatorOpener + 'static) -> Self {
		self.opener = Box::new(opener);
		self
	}

	pub fn session(&self) -> &Arc<SessionManager> {
		&self.session
	}

	pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
		self.view.subscribe()
	}

	/// Current snapshot of the dashboard.
	pub fn view(&self) -> DashboardView {
		self.view.borrow().clone()
	}

	/// Lists files and remembers `query` for later reloads.
	///
	/// Administrator filters in `query` are ignored for other users.
	pub async fn list(&self, query: FileQuery) -> Result<Vec<FileRecord>, DispatchError> {
		let identity = self.session.identity().ok_or(DispatchError::NotLoggedIn)?;
		let scope = ListScope::resolve(&query, identity.is_admin);
		if query.all_files && !identity.is_admin {
			debug!(target = "filedash", username = %identity.username, "dropping admin list filters for non-admin");
		}
		self.view.send_modify(|view| {
			view.identity = Some(identity.clone());
			view.query = query.clone();
			view.scope = scope.clone();
			view.notice = None;
		});
		self.fetch(query, scope).await
	}

	/// Re-issues the last listing query.
	pub async fn reload(&self) -> Result<Vec<FileRecord>, DispatchError> {
		let (query, scope) = {
			let view = self.view.borrow();
			(view.query.clone(), view.scope.clone())
		};
		self.fetch(query, scope).await
	}

	async fn fetch(&self, query: FileQuery, scope: ListScope) -> Result<Vec<FileRecord>, DispatchError> {
		let url = self.session.client().endpoint(&self.session.client().endpoints().files)?;
		let params = scope.query_pairs(query.ordering);

		let result = async {
			let response = self.send(|http| http.get(url.clone()).query(&params)).await?;
			Ok::<_, DispatchError>(response.json::<Vec<FileRecord>>().await?)
		}
		.await;

		let files = self.notify(result)?;
		debug!(target = "filedash", count = files.len(), ordering = %query.ordering, "listed files");
		self.view.send_modify(|view| {
			view.identity = self.session.identity();
			view.files = files.clone();
		});
		Ok(files)
	}

	/// Uploads `path` as a multipart `file` field, then reloads the listing.
	pub async fn upload(&self, path: &Path) -> Result<(), DispatchError> {
		let bytes = tokio::fs::read(path)
			.await
			.map(Bytes::from)
			.map_err(|source| DispatchError::Io {
				path: path.to_path_buf(),
				source,
			})?;
		let filename = path
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| "upload".to_string());

		let url = self.session.client().endpoint(&self.session.client().endpoints().files)?;
		let size = bytes.len();
		let result = self
			.send(|http| {
				let part = Part::stream_with_length(Body::from(bytes.clone()), size as u64).file_name(filename.clone());
				http.post(url.clone()).multipart(Form::new().part("file", part))
			})
			.await
			.and_then(|response| expect_status(response, StatusCode::CREATED));
		self.notify(result)?;

		info!(target = "filedash", filename = %filename, size, "uploaded file");
		self.after_mutation(Notice::Uploaded { filename }).await;
		Ok(())
	}

	/// Fetches the view locator for `id` and hands it to the opener.
	pub async fn view_file(&self, id: u64) -> Result<Locator, DispatchError> {
		self.open_locator(id, LocatorKind::View).await
	}

	/// Fetches the download locator for `id` and hands it to the opener.
	pub async fn download(&self, id: u64) -> Result<Locator, DispatchError> {
		self.open_locator(id, LocatorKind::Download).await
	}

	async fn open_locator(&self, id: u64, kind: LocatorKind) -> Result<Locator, DispatchError> {
		let id_segment = id.to_string();
		let url = self
			.session
			.client()
			.resource(&self.session.client().endpoints().files, &[&id_segment, kind.as_str()])?;

		let result = async {
			let response = self.send(|http| http.get(url.clone())).await?;
			let status = response.status().as_u16();
			let body: ResourceLocator = response.json().await?;
			body.url.ok_or_else(|| DispatchError::Server {
				status,
				body: "response carried no url".into(),
			})
		}
		.await;
		let url = self.notify(result)?;

		let locator = Locator { file_id: id, kind, url };
		debug!(target = "filedash", file_id = id, kind = kind.as_str(), "opening resource locator");
		self.opener.open(&locator).map_err(|source| DispatchError::Open {
			url: locator.url.clone(),
			source,
		})?;
		Ok(locator)
	}

	/// Deletes `id` after `confirm` approves, then reloads the listing.
	pub async fn delete(&self, id: u64, confirm: &dyn Confirm) -> Result<DeleteOutcome, DispatchError> {
		let prompt = format!("Delete file {id}?");
		if !confirm.confirm(&prompt).await {
			debug!(target = "filedash", file_id = id, "delete cancelled");
			return Ok(DeleteOutcome::Cancelled);
		}

		let url = self
			.session
			.client()
			.resource(&self.session.client().endpoints().files, &[&id.to_string()])?;
		let result = self
			.send(|http| http.delete(url.clone()))
			.await
			.and_then(|response| expect_status(response, StatusCode::NO_CONTENT));
		self.notify(result)?;

		info!(target = "filedash", file_id = id, "deleted file");
		self.after_mutation(Notice::Deleted { file_id: id }).await;
		Ok(DeleteOutcome::Deleted)
	}

	/// Exactly one reload with the remembered query. A failed reload only
	/// replaces the notice; the mutation itself already succeeded.
	async fn after_mutation(&self, notice: Notice) {
		match self.reload().await {
			Ok(_) => self.view.send_modify(|view| view.notice = Some(notice)),
			Err(err) => warn!(target = "filedash", error = %err, "reload after mutation failed"),
		}
	}

	/// Sends the request built by `build` with the bearer token, handling a
	/// `401` with one refresh and one replay.
	async fn send<F>(&self, build: F) -> Result<Response, DispatchError>
	where
		F: Fn(&reqwest::Client) -> RequestBuilder,
	{
		let token = self.session.bearer().ok_or(DispatchError::NotLoggedIn)?;
		let response = self.attempt(&build, &token).await?;
		if response.status() != StatusCode::UNAUTHORIZED {
			return check_status(response).await;
		}

		debug!(target = "filedash", "request unauthorized, refreshing access token");
		if let Err(err) = self.session.refresh_after_rejection(&token).await {
			info!(target = "filedash", error = %err, "refresh after 401 failed");
			return Err(self.expire());
		}

		let token = self.session.bearer().ok_or(DispatchError::NotLoggedIn)?;
		let response = self.attempt(&build, &token).await?;
		if response.status() == StatusCode::UNAUTHORIZED {
			info!(target = "filedash", "replayed request unauthorized");
			return Err(self.expire());
		}
		check_status(response).await
	}

	async fn attempt<F>(&self, build: &F, token: &AccessToken) -> Result<Response, DispatchError>
	where
		F: Fn(&reqwest::Client) -> RequestBuilder,
	{
		let response = build(self.session.client().http()).bearer_auth(token.as_str()).send().await?;
		debug!(target = "filedash", url = %response.url(), status = response.status().as_u16(), "response");
		Ok(response)
	}

	/// Ends the session and resets the dashboard.
	fn expire(&self) -> DispatchError {
		self.session.logout_quietly();
		self.view.send_modify(|view| {
			*view = DashboardView {
				notice: Some(Notice::SessionExpired),
				..DashboardView::default()
			};
		});
		DispatchError::SessionExpired
	}

	/// Publishes the notice for a failed action and passes the result on.
	fn notify<T>(&self, result: Result<T, DispatchError>) -> Result<T, DispatchError> {
		result.inspect_err(|err| {
			if let Some(notice) = Notice::for_error(err) {
				if notice != Notice::SessionExpired {
					warn!(target = "filedash", error = %err, "action failed");
				}
				self.view.send_modify(|view| view.notice = Some(notice));
			}
		})
	}

	fn require_admin(&self) -> Result<(), DispatchError> {
		let identity = self.session.identity().ok_or(DispatchError::NotLoggedIn)?;
		if identity.is_admin {
			Ok(())
		} else {
			debug!(target = "filedash", username = %identity.username, "admin action refused locally");
			self.notify(Err(DispatchError::PermissionDenied))
		}
	}
}

async fn check_status(response: Response) -> Result<Response, DispatchError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	match status {
		StatusCode::FORBIDDEN => Err(DispatchError::PermissionDenied),
		StatusCode::NOT_FOUND => Err(DispatchError::NotFound),
		_ => Err(DispatchError::Server {
			status: status.as_u16(),
			body: response.text().await.unwrap_or_default(),
		}),
	}
}

fn expect_status(response: Response, expected: StatusCode) -> Result<Response, DispatchError> {
	if response.status() == expected {
		Ok(response)
	} else {
		Err(DispatchError::Server {
			status: response.status().as_u16(),
			body: format!("expected HTTP {}", expected.as_u16()),
		})
	}
}
