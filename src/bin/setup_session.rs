use std::process::ExitCode;

use clap::Parser;
use fw_e2e::session::SessionStore;
use fw_e2e::{Harness, LoginFlow, Settings};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Interactive one-time login that captures session cookies for later
/// headless runs with FW_LOGIN_METHOD=session.
#[derive(Parser)]
#[command(name = "setup-session")]
#[command(about = "Log in manually once and save session cookies")]
#[command(version)]
struct Cli {
    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> fw_e2e::Result<()> {
    let mut settings = Settings::from_env();
    // A human has to see the window to complete the login.
    settings.headless = false;
    settings.ci = false;

    let harness = Harness::launch(&settings).await?;
    let page = harness.page();

    let flow = LoginFlow::new(page, &settings);
    if let Err(e) = flow.login_with_google().await {
        warn!("Automated login did not complete: {}", e);
        harness.save_failure_screenshot("setup-session").await;
        eprintln!();
        eprintln!("Finish the login manually in the browser window,");
        eprintln!("then press ENTER to capture the session.");
        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
        })
        .await
        .map_err(|e| fw_e2e::Error::Config(format!("stdin wait failed: {}", e)))?;
    }

    let url = page.url().await?;
    if url.contains("/login") || url.contains("accounts.google.com") {
        harness.close().await?;
        return Err(fw_e2e::Error::SessionExpired(format!(
            "still on a login page ({}), nothing to capture",
            url
        )));
    }

    let host = url::Url::parse(&url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .ok_or_else(|| fw_e2e::Error::Config(format!("cannot parse page URL '{}'", url)))?;

    let store = SessionStore::new(&settings.cookies_file);
    let count = store.capture(page, &host).await?;
    println!("Captured {} cookies to {}", count, settings.cookies_file.display());
    println!("Set FW_LOGIN_METHOD=session to reuse them.");

    harness.close().await
}
