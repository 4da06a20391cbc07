//! `users list|toggle-staff` and `logs`.

use filedash::protocol::ActivityLogEntry;
use filedash::{FileDispatcher, LogQuery};
use serde::Serialize;

use crate::cli::{LogsArgs, UsersAction};
use crate::error::Result;
use crate::output::{OutputFormat, emit};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogsData {
	#[serde(flatten)]
	query: LogQuery,
	count: usize,
	entries: Vec<ActivityLogEntry>,
}

pub async fn users(action: UsersAction, files: &FileDispatcher, format: OutputFormat) -> Result<()> {
	match action {
		UsersAction::List => {
			let users = files.list_users().await?;
			emit(
				"users.list",
				serde_json::json!({ "count": users.len(), "users": users }),
				None,
				format,
			);
		}
		UsersAction::ToggleStaff { username } => {
			let response = files.toggle_staff(&username).await?;
			emit(
				"users.toggle-staff",
				serde_json::json!({ "username": username, "response": response }),
				None,
				format,
			);
		}
	}
	Ok(())
}

pub async fn logs(args: LogsArgs, files: &FileDispatcher, format: OutputFormat) -> Result<()> {
	let query = log_query(args);
	let entries = files.activity_logs(&query).await?;
	emit(
		"logs",
		LogsData {
			query,
			count: entries.len(),
			entries,
		},
		None,
		format,
	);
	Ok(())
}

fn log_query(args: LogsArgs) -> LogQuery {
	let clean = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
	LogQuery {
		user: clean(args.user),
		sort: clean(args.sort),
	}
}
