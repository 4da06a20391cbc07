use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Default directives per `-v` count. `RUST_LOG` takes precedence.
fn default_directives(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error",
		1 => "info",
		// request/response status lines live at debug; keep the HTTP stack quiet
		_ => "debug,hyper_util=info,rustls=info,reqwest=info",
	}
}

/// Logs go to stderr so stdout stays a clean result envelope.
pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_ansi(std::io::stderr().is_terminal())
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn directives_parse() {
		for verbosity in 0..4 {
			let directives = default_directives(verbosity);
			assert!(EnvFilter::try_new(directives).is_ok(), "{directives}");
		}
	}
}
