//! CLI entry point for the driftgen stream generators.
//!
//! Parses command-line arguments with clap, runs the selected generator, and
//! streams CSV to stdout. Logging is initialized eagerly so all subsequent
//! operations emit structured diagnostics via `tracing` on stderr.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use driftgen_cli::{
    cli::{Cli, CliError, run_cli},
    logging::{self, LoggingError},
};
use tracing::{error, field, info};

/// Parse CLI arguments, execute the command, and flush the output stream.
fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    let summary = run_cli(cli, &mut writer).context("failed to execute command")?;
    writer.flush().context("failed to flush output")?;
    info!(
        generator = summary.generator,
        examples = summary.examples,
        "generation finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        let code = err
            .downcast_ref::<CliError>()
            .and_then(CliError::stream_code)
            .map(field::display);
        error!(error = %err, code, "command execution failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
