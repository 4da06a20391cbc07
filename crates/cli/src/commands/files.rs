//! `files list|upload|view|download|delete`.

use filedash::protocol::{FileOrdering, FileRecord};
use filedash::{Confirm, DeleteOutcome, FileDispatcher, FileQuery, ListScope, Locator, LocatorKind};
use serde::Serialize;

use crate::cli::{FilesAction, ListArgs, LocatorArgs};
use crate::context_store::ProfileState;
use crate::error::Result;
use crate::output::{OutputFormat, emit};
use crate::terminal::{StdinConfirm, SystemOpener};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListData<'a> {
	scope: &'a ListScope,
	ordering: FileOrdering,
	admin_controls: bool,
	count: usize,
	files: Vec<FileRow<'a>>,
}

/// Listing row with the derived columns a dashboard shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileRow<'a> {
	id: u64,
	name: &'a str,
	size_kib: String,
	owner: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	uploaded_at: Option<&'a str>,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	is_zip: bool,
}

impl<'a> From<&'a FileRecord> for FileRow<'a> {
	fn from(file: &'a FileRecord) -> Self {
		Self {
			id: file.id,
			name: &file.original_filename,
			size_kib: file.size_kib(),
			owner: file.owner_label(),
			uploaded_at: file.uploaded_at.as_deref(),
			is_zip: file.is_zip,
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocatorData {
	#[serde(flatten)]
	locator: Locator,
	opened: bool,
}

pub async fn execute(action: FilesAction, files: FileDispatcher, profile: &ProfileState, format: OutputFormat) -> Result<()> {
	match action {
		FilesAction::List(args) => list(args, &files, profile, format).await,
		FilesAction::Upload { path } => {
			files.upload(&path).await?;
			let view = files.view();
			emit(
				"files.upload",
				serde_json::json!({ "path": path, "fileCount": view.files.len() }),
				view.notice.as_ref(),
				format,
			);
			Ok(())
		}
		FilesAction::View(args) => open(args, LocatorKind::View, files, format).await,
		FilesAction::Download(args) => open(args, LocatorKind::Download, files, format).await,
		FilesAction::Delete { id, yes } => {
			let confirm: &dyn Confirm = if yes { &true } else { &StdinConfirm };
			let outcome = files.delete(id, confirm).await?;
			let notice = match outcome {
				DeleteOutcome::Deleted => files.view().notice,
				DeleteOutcome::Cancelled => None,
			};
			emit(
				"files.delete",
				serde_json::json!({ "fileId": id, "outcome": outcome }),
				notice.as_ref(),
				format,
			);
			Ok(())
		}
	}
}

fn query_from(args: ListArgs, default_ordering: FileOrdering) -> FileQuery {
	let query = FileQuery::ordered(args.sort.unwrap_or(default_ordering));
	match args.owner {
		Some(owner) => query.owned_by(owner),
		None if args.all => query.all_files(),
		None => query,
	}
}

async fn list(args: ListArgs, files: &FileDispatcher, profile: &ProfileState, format: OutputFormat) -> Result<()> {
	let query = query_from(args, profile.default_ordering());
	files.list(query).await?;

	let view = files.view();
	emit(
		"files.list",
		ListData {
			scope: &view.scope,
			ordering: view.query.ordering,
			admin_controls: view.admin_controls_available(),
			count: view.files.len(),
			files: view.files.iter().map(FileRow::from).collect(),
		},
		view.notice.as_ref(),
		format,
	);
	Ok(())
}

async fn open(args: LocatorArgs, kind: LocatorKind, files: FileDispatcher, format: OutputFormat) -> Result<()> {
	let files = if args.no_open { files } else { files.with_opener(SystemOpener) };
	let locator = match kind {
		LocatorKind::View => files.view_file(args.id).await?,
		LocatorKind::Download => files.download(args.id).await?,
	};
	emit(
		&format!("files.{}", kind.as_str()),
		LocatorData {
			locator,
			opened: !args.no_open,
		},
		None,
		format,
	);
	Ok(())
}
