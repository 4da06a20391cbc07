use std::time::Instant;

use clap::Parser;
use filedash_cli::cli::Cli;
use filedash_cli::error::CliError;
use filedash_cli::output::{self, OutputFormat, ResultBuilder};
use filedash_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let start = Instant::now();
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli, format).await {
		handle_error(command, err, format, start);
		std::process::exit(1);
	}
}

fn handle_error(command: &str, err: CliError, format: OutputFormat, start: Instant) {
	let cmd_error = err.to_command_error();

	// Always print to stderr for humans
	output::print_error_stderr(&cmd_error);

	// Envelope with ok=false on stdout for scripts
	if format != OutputFormat::Text {
		let result: output::CommandResult<()> = ResultBuilder::new(command).started_at(start).error(cmd_error).build();
		output::print_result(&result, format);
	}
}
