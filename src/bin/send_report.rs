use std::process::ExitCode;

use clap::Parser;
use fw_e2e::report::{self, ReportSummary};
use fw_e2e::{ClickUpNotifier, ReportSettings};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "send-report")]
#[command(about = "Parse a JUnit report and post the summary to ClickUp")]
#[command(version)]
struct Cli {
    /// Print the message instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    match run(cli.dry_run).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(dry_run: bool) -> fw_e2e::Result<()> {
    let settings = ReportSettings::from_env()?;

    let xml = std::fs::read_to_string(&settings.junit_path).map_err(|e| {
        fw_e2e::Error::Config(format!(
            "JUnit report not found at {}: {}",
            settings.junit_path.display(),
            e
        ))
    })?;

    let summary = ReportSummary::from_xml(&xml);
    let message = report::render(&summary, &settings.run_context());

    if dry_run {
        println!("{}", message);
        return Ok(());
    }

    ClickUpNotifier::new(settings).send(&message).await
}
