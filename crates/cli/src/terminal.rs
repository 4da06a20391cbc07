//! Interactive pieces: hidden password prompt, delete confirmation, link opener.

use std::io::{self, BufRead, IsTerminal, Write};
use std::process::{Command, Stdio};

use anyhow::Context;
use filedash::{BoxFut, Confirm, Locator, LocatorOpener};
use tracing::debug;

use crate::error::{CliError, Result};

/// Reads one line from stdin off the async runtime.
async fn read_line() -> anyhow::Result<String> {
	tokio::task::spawn_blocking(|| {
		let mut input = String::new();
		io::stdin().lock().read_line(&mut input).map(|_| input)
	})
	.await
	.context("stdin reader task failed")?
	.context("failed to read stdin")
}

/// Reads a password.
///
/// Interactive terminals get a hidden prompt. With `from_stdin`, or when
/// stdin is piped, one line is read from stdin as is.
pub async fn read_password(prompt: &str, from_stdin: bool) -> Result<String> {
	let password = if use_hidden_prompt(from_stdin, io::stdin().is_terminal()) {
		let prompt = prompt.to_string();
		tokio::task::spawn_blocking(move || dialoguer::Password::new().with_prompt(prompt).interact())
			.await
			.context("password prompt task failed")?
			.context("failed to read password")?
	} else {
		let line = read_line().await?;
		line.trim_end_matches(['\r', '\n']).to_string()
	};
	if password.is_empty() {
		return Err(CliError::InvalidInput("password must not be empty".into()));
	}
	Ok(password)
}

fn use_hidden_prompt(from_stdin: bool, stdin_is_terminal: bool) -> bool {
	!from_stdin && stdin_is_terminal
}

/// Asks `[y/N]` on stderr and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
	fn confirm<'a>(&'a self, prompt: &'a str) -> BoxFut<'a, bool> {
		Box::pin(async move {
			eprint!("{prompt} [y/N] ");
			let _ = io::stderr().flush();
			match read_line().await {
				Ok(answer) => is_yes(&answer),
				Err(err) => {
					debug!(target = "filedash", error = %err, "confirmation unreadable, treating as no");
					false
				}
			}
		})
	}
}

fn is_yes(answer: &str) -> bool {
	matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Opens locators with the desktop's URL handler.
///
/// `$BROWSER` wins when set; otherwise `open` on macOS, `cmd /C start` on
/// Windows and `xdg-open` elsewhere.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener;

impl SystemOpener {
	fn command(url: &str) -> io::Result<Command> {
		if let Some(browser) = std::env::var_os("BROWSER").filter(|b| !b.is_empty()) {
			let mut cmd = Command::new(browser);
			cmd.arg(url);
			return Ok(cmd);
		}

		if cfg!(target_os = "windows") {
			let mut cmd = Command::new("cmd");
			cmd.args(["/C", "start", ""]).arg(url);
			return Ok(cmd);
		}

		let candidates: &[&str] = if cfg!(target_os = "macos") {
			&["open"]
		} else {
			&["xdg-open", "gio", "wslview"]
		};
		for candidate in candidates {
			if let Ok(path) = which::which(candidate) {
				let mut cmd = Command::new(path);
				if *candidate == "gio" {
					cmd.arg("open");
				}
				cmd.arg(url);
				return Ok(cmd);
			}
		}

		Err(io::Error::new(
			io::ErrorKind::NotFound,
			"no URL opener found (set $BROWSER or install xdg-open); use --no-open to print the link",
		))
	}
}

impl LocatorOpener for SystemOpener {
	fn open(&self, locator: &Locator) -> io::Result<()> {
		let mut cmd = Self::command(&locator.url)?;
		debug!(target = "filedash", program = ?cmd.get_program(), file_id = locator.file_id, "launching opener");
		cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null()).spawn()?;
		Ok(())
	}
}
