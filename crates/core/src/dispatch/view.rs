//! Observable dashboard state.

use filedash_protocol::{FileOrdering, FileRecord};
use serde::Serialize;

use crate::claims::Identity;
use crate::error::DispatchError;

/// Parameters of a file listing.
///
/// `all_files` and `owner` are administrator filters; they are dropped for
/// everyone else before the request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileQuery {
	pub ordering: FileOrdering,
	pub all_files: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub owner: Option<String>,
}

impl FileQuery {
	pub fn ordered(ordering: FileOrdering) -> Self {
		Self {
			ordering,
			..Self::default()
		}
	}

	/// Lists every user's files (administrators only).
	pub fn all_files(mut self) -> Self {
		self.all_files = true;
		self
	}

	/// Restricts an all-files listing to one owner.
	pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
		self.all_files = true;
		self.owner = Some(owner.into());
		self
	}
}

/// Effective listing scope after applying the caller's privileges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "owner", rename_all = "camelCase")]
pub enum ListScope {
	#[default]
	Own,
	AllUsers,
	Owner(String),
}

impl ListScope {
	pub fn resolve(query: &FileQuery, is_admin: bool) -> Self {
		if !is_admin || !query.all_files {
			return ListScope::Own;
		}
		match query.owner.as_deref().map(str::trim) {
			Some(owner) if !owner.is_empty() => ListScope::Owner(owner.to_string()),
			_ => ListScope::AllUsers,
		}
	}

	/// Query string pairs for the listing request.
	pub(crate) fn query_pairs(&self, ordering: FileOrdering) -> Vec<(&'static str, String)> {
		let mut pairs = vec![("ordering", ordering.as_query_value().to_string())];
		match self {
			ListScope::Own => {}
			ListScope::AllUsers => pairs.push(("all_files", "true".into())),
			ListScope::Owner(owner) => {
				pairs.push(("all_files", "true".into()));
				pairs.push(("owner_username", owner.clone()));
			}
		}
		pairs
	}
}

/// One-shot message for the user about the last action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
	PermissionDenied,
	Network { message: String },
	SessionExpired,
	Server { status: u16 },
	Uploaded { filename: String },
	Deleted { file_id: u64 },
}

impl Notice {
	/// Notice shown for a failed action, if the failure is user-facing.
	pub fn for_error(err: &DispatchError) -> Option<Self> {
		match err {
			DispatchError::PermissionDenied => Some(Notice::PermissionDenied),
			DispatchError::Network(message) => Some(Notice::Network {
				message: message.clone(),
			}),
			DispatchError::SessionExpired => Some(Notice::SessionExpired),
			DispatchError::NotFound => Some(Notice::Server { status: 404 }),
			DispatchError::Server { status, .. } => Some(Notice::Server { status: *status }),
			_ => None,
		}
	}

	pub fn is_error(&self) -> bool {
		!matches!(self, Notice::Uploaded { .. } | Notice::Deleted { .. })
	}
}

impl std::fmt::Display for Notice {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Notice::PermissionDenied => f.write_str("you do not have permission to perform this action"),
			Notice::Network { message } => write!(f, "network error: {message}"),
			Notice::SessionExpired => f.write_str("session expired, log in again"),
			Notice::Server { status } => write!(f, "server responded with HTTP {status}"),
			Notice::Uploaded { filename } => write!(f, "uploaded {filename}"),
			Notice::Deleted { file_id } => write!(f, "deleted file {file_id}"),
		}
	}
}

/// Snapshot of what a dashboard would render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub identity: Option<Identity>,
	pub files: Vec<FileRecord>,
	/// Last requested query; re-issued after uploads and deletes.
	pub query: FileQuery,
	pub scope: ListScope,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notice: Option<Notice>,
}

impl DashboardView {
	/// Whether the all-files / owner filter should be offered.
	pub fn admin_controls_available(&self) -> bool {
		self.identity.as_ref().is_some_and(|i| i.is_admin)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn non_admin_scope_is_always_own() {
		let query = FileQuery::default().owned_by("bob");
		assert_eq!(ListScope::resolve(&query, false), ListScope::Own);
		let pairs = ListScope::resolve(&query, false).query_pairs(query.ordering);
		assert_eq!(pairs, vec![("ordering", "-uploaded_at".to_string())]);
	}

	#[test]
	fn admin_scope_follows_query() {
		assert_eq!(ListScope::resolve(&FileQuery::default(), true), ListScope::Own);
		assert_eq!(ListScope::resolve(&FileQuery::default().all_files(), true), ListScope::AllUsers);
		assert_eq!(
			ListScope::resolve(&FileQuery::default().owned_by("  "), true),
			ListScope::AllUsers,
			"blank owner means everyone"
		);

		let scope = ListScope::resolve(&FileQuery::ordered(FileOrdering::SizeAsc).owned_by("bob"), true);
		assert_eq!(
			scope.query_pairs(FileOrdering::SizeAsc),
			vec![
				("ordering", "file_size".to_string()),
				("all_files", "true".to_string()),
				("owner_username", "bob".to_string()),
			]
		);
	}

	#[test]
	fn admin_controls_follow_identity() {
		let mut view = DashboardView::default();
		assert!(!view.admin_controls_available());

		view.identity = Some(Identity {
			username: "alice".into(),
			is_admin: false,
		});
		assert!(!view.admin_controls_available());

		view.identity = Some(Identity {
			username: "root".into(),
			is_admin: true,
		});
		assert!(view.admin_controls_available());
	}

	#[test]
	fn notices_for_errors() {
		assert_eq!(Notice::for_error(&DispatchError::PermissionDenied), Some(Notice::PermissionDenied));
		assert_eq!(
			Notice::for_error(&DispatchError::Server {
				status: 500,
				body: String::new()
			}),
			Some(Notice::Server { status: 500 })
		);
		assert_eq!(Notice::for_error(&DispatchError::NotLoggedIn), None);
		assert!(Notice::SessionExpired.is_error());
		assert!(!Notice::Deleted { file_id: 1 }.is_error());
	}
}
