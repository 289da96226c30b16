//! Logging bootstrap for the CLI.
//!
//! Logs go to stderr so that `--json` output on stdout stays clean.

use anyhow::{Result, anyhow};
use flexi_logger::{Logger, LoggerHandle};

const DEFAULT_LEVEL: &str = "warn";

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_LEVEL,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Start the logger. Keep the returned handle alive for the process lifetime.
///
/// Without `-v`, `RUST_LOG` is honored and falls back to `warn`.
pub fn init(verbosity: u8) -> Result<LoggerHandle> {
    let level = level_for(verbosity);

    let logger = if verbosity == 0 {
        Logger::try_with_env_or_str(level)
    } else {
        Logger::try_with_str(level)
    }
    .map_err(|err| anyhow!("invalid log level `{level}`: {err}"))?;

    logger
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| anyhow!("failed to start logger: {err}"))
}
