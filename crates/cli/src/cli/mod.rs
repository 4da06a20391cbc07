
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use filedash::protocol::FileOrdering;

use crate::output::OutputFormat;
use crate::styles::cli_styles;

/// Command-line dashboard for a filedash storage backend.
#[derive(Parser, Debug)]
#[command(name = "filedash")]
#[command(about = "List, upload, open and delete files on a filedash storage backend")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: toon (default), json, ndjson, or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "toon")]
	pub format: OutputFormat,

	/// Profile holding the backend URL and session
	#[arg(long, global = true, value_name = "NAME", default_value = "default")]
	pub profile: String,

	/// Backend base URL for this invocation (overrides the profile)
	#[arg(long, global = true, value_name = "URL", env = "FILEDASH_BASE_URL")]
	pub base_url: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Log in and store the session in the profile.
	Login(LoginArgs),
	/// Forget the stored session.
	Logout,
	/// Create an account (does not log in).
	Register(RegisterArgs),
	/// Show who the stored session belongs to, refreshing it if needed.
	Whoami,
	/// List and manage files.
	#[command(subcommand)]
	Files(FilesAction),
	/// Administer users (administrators only).
	#[command(subcommand)]
	Users(UsersAction),
	/// Show the activity log (administrators only).
	Logs(LogsArgs),
	/// Show or change profile configuration.
	#[command(subcommand)]
	Config(ConfigAction),
}

impl Commands {
	/// Dotted name used in the result envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Login(_) => "login",
			Commands::Logout => "logout",
			Commands::Register(_) => "register",
			Commands::Whoami => "whoami",
			Commands::Files(action) => match action {
				FilesAction::List(_) => "files.list",
				FilesAction::Upload { .. } => "files.upload",
				FilesAction::View(_) => "files.view",
				FilesAction::Download(_) => "files.download",
				FilesAction::Delete { .. } => "files.delete",
			},
			Commands::Users(action) => match action {
				UsersAction::List => "users.list",
				UsersAction::ToggleStaff { .. } => "users.toggle-staff",
			},
			Commands::Logs(_) => "logs",
			Commands::Config(action) => match action {
				ConfigAction::Show => "config.show",
				ConfigAction::SetBaseUrl { .. } => "config.set-base-url",
			},
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
	#[arg(value_name = "USERNAME")]
	pub username: String,

	/// Read the password from stdin instead of prompting.
	#[arg(long)]
	pub password_stdin: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
	#[arg(value_name = "USERNAME")]
	pub username: String,

	#[arg(value_name = "EMAIL")]
	pub email: String,

	/// Read the password from stdin instead of prompting.
	#[arg(long)]
	pub password_stdin: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FilesAction {
	/// List files, newest first unless --sort says otherwise.
	List(ListArgs),
	/// Upload a local file.
	Upload {
		#[arg(value_name = "PATH")]
		path: PathBuf,
	},
	/// Open a file's view link.
	View(LocatorArgs),
	/// Open a file's download link.
	Download(LocatorArgs),
	/// Delete a file after confirmation.
	Delete {
		#[arg(value_name = "ID")]
		id: u64,

		/// Skip the confirmation prompt.
		#[arg(short, long)]
		yes: bool,
	},
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
	/// Every user's files (administrators only; ignored otherwise).
	#[arg(long)]
	pub all: bool,

	/// Only files of this owner (administrators only; implies --all).
	#[arg(long, value_name = "USERNAME")]
	pub owner: Option<String>,

	/// Sort order, e.g. -uploaded_at, original_filename, -file_size.
	#[arg(long, value_name = "ORDER", allow_hyphen_values = true)]
	pub sort: Option<FileOrdering>,
}

#[derive(Args, Debug, Clone)]
pub struct LocatorArgs {
	#[arg(value_name = "ID")]
	pub id: u64,

	/// Print the link without opening it.
	#[arg(long)]
	pub no_open: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersAction {
	/// List registered users.
	List,
	/// Grant or revoke staff status.
	ToggleStaff {
		#[arg(value_name = "USERNAME")]
		username: String,
	},
}

#[derive(Args, Debug, Clone, Default)]
pub struct LogsArgs {
	/// Only entries of this user.
	#[arg(long, value_name = "USERNAME")]
	pub user: Option<String>,

	/// Sort field, e.g. -timestamp (default), timestamp, username.
	#[arg(long, value_name = "FIELD", allow_hyphen_values = true)]
	pub sort: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
	/// Print the effective profile configuration.
	Show,
	/// Store the backend base URL in the profile.
	SetBaseUrl {
		#[arg(value_name = "URL")]
		url: String,
	},
}
