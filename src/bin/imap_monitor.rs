use clap::Parser;
use log::{error, warn};
use std::process::ExitCode;

use imap_monitor::config::{MonitorConfig, log_file_from};
use imap_monitor::error::MonitorResult;
use imap_monitor::logging::{init_logging, init_stderr_logging};
use imap_monitor::monitor::{self, RunOutcome};
use imap_monitor::report::{OutputFormat, Report};
use imap_monitor::store::state_file::JsonStateFile;

#[derive(Parser)]
#[command(name = "imap_monitor")]
#[command(about = "Report unread IMAP mail not seen by earlier runs", long_about = None)]
struct Cli {
    /// Don't update the seen-state file
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_logging(&log_file_from(|key| std::env::var(key).ok())) {
        match init_stderr_logging() {
            Ok(()) => warn!("{e:#}; logging to stderr"),
            Err(_) => eprintln!("{e:#}"),
        }
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let report = match execute(cli.dry_run) {
        Ok(outcome) => Report::from_outcome(outcome),
        Err(e) => {
            error!("{e}");
            Report::from_error(&e)
        }
    };

    println!("{}", report.render(format));
    if report.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn execute(dry_run: bool) -> MonitorResult<RunOutcome> {
    let cfg = MonitorConfig::from_env()?;
    let store = JsonStateFile::new(&cfg.state_file);
    monitor::run(&cfg, &store, dry_run)
}
