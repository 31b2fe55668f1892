//! Harmock suite runner CLI.
//!
//! Replays a suite document against a live target and writes a JUnit
//! report:
//!
//!   harmock-suite --target http://localhost:3000 --suite ./suite.json

use anyhow::{Context, Result};
use clap::Parser;
use harmock_core::suite::Suite;
use harmock_suite::{run_suite, Report};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Replay a regression suite against a live target
#[derive(Parser, Debug)]
#[command(name = "harmock-suite")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target base URL the suite is replayed against
    #[arg(short, long)]
    target: String,

    /// Path to the suite document (JSON)
    #[arg(short, long)]
    suite: PathBuf,

    /// Where the JUnit report is written
    #[arg(short, long, default_value = "suite-report.xml")]
    report: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    match run(args).await {
        Ok(report) if report.passed() => {
            println!("All tests passed");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            eprintln!("{RED}Failures: {}{RESET}", report.failures);
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("{RED}error:{RESET} {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<Report> {
    let raw = fs::read(&args.suite)
        .with_context(|| format!("failed to read suite {}", args.suite.display()))?;
    let suite: Suite = serde_json::from_slice(&raw).context("invalid suite document")?;

    let report = run_suite(&suite, &args.target).await?;
    for result in &report.results {
        if result.ok {
            println!("[{GREEN}OK{RESET}] {}", result.name);
        } else {
            println!("[{RED}FAIL{RESET}] {}", result.name);
            if let Some(message) = &result.message {
                for line in message.lines() {
                    println!("    {line}");
                }
            }
        }
    }
    println!(
        "{BOLD}{} tests, {} failures{RESET}",
        report.total, report.failures
    );

    fs::write(&args.report, report.to_junit())
        .with_context(|| format!("failed to write report {}", args.report.display()))?;
    Ok(report)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}
