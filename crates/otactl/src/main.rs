//! otactl - release publishing CLI
//!
//! Parses arguments, runs one command against the configured store, records
//! the invocation and exits with a code from `otactl::errors`.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;

use otactl::cli::Cli;
use otactl::commands;
use otactl::errors::{self, EXIT_SUCCESS};
use otactl::logging::{self, ErrorDetails, LogEntry};
use otactl::terminal_format::Styler;

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let start = Instant::now();
    let styler = Styler::detect();
    let mut backend = None;

    let result = run(&cli, &styler, &mut backend);

    let (exit_code, error) = match &result {
        Ok(()) => (EXIT_SUCCESS, None),
        Err(err) => {
            eprintln!("{}", styler.error(&format!("{:#}", err)));
            let (code, log_code) = errors::classify(err);
            (
                code,
                Some(ErrorDetails {
                    code: log_code,
                    message: format!("{:#}", err),
                }),
            )
        }
    };

    LogEntry {
        ts: LogEntry::now(),
        req_id: LogEntry::generate_req_id(),
        command: cli.command.name().to_string(),
        args: std::env::args().skip(1).collect(),
        backend,
        exit_code,
        duration_ms: start.elapsed().as_millis() as u64,
        ok: result.is_ok(),
        error,
    }
    .write();

    std::process::exit(exit_code);
}

fn run(cli: &Cli, styler: &Styler, backend: &mut Option<String>) -> Result<()> {
    let settings = commands::load_settings(cli.config.as_deref(), cli.prefix.as_deref())?;
    let orch = commands::connect(&settings)?;
    *backend = Some(orch.store().describe());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(&cli.command, &orch, &mut out, styler)
}
