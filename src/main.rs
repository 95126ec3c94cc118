use clap::Parser;
use reddit_client::RedditApiClient;
use scrape_service::{ForumStatus, ScrapeService};
use std::process::ExitCode;
use topposts_core::{CoreError, ErrorExt, ErrorReporter, RawSettings, Settings};
use tracing_subscriber::EnvFilter;

mod args;

use args::Cli;

const DEFAULT_LOG_FILTER: &str =
    "topposts=info,scrape_service=info,reddit_client=info,exporter=info";
const VERBOSE_LOG_FILTER: &str =
    "topposts=debug,topposts_core=debug,scrape_service=debug,reddit_client=debug,exporter=debug";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let reporter = ErrorReporter::new();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            reporter.report_error(&e);
            eprintln!("{}", e.user_friendly_message());
            return exit_code(&e);
        }
    };

    tracing::info!(
        "Scraping {} subreddit(s), top {} per {} into {}",
        settings.subreddits().len(),
        settings.limit(),
        settings.time_filter(),
        settings.output().display()
    );

    let client = match RedditApiClient::new(settings.credentials()) {
        Ok(client) => client,
        Err(e) => {
            reporter.report_error(&e);
            return exit_code(&e);
        }
    };

    let service = ScrapeService::new(client, settings.delay());
    match service.run(&settings).await {
        Ok(report) => {
            for outcome in &report.outcomes {
                match &outcome.status {
                    ForumStatus::Fetched { rows, skipped } => {
                        println!("r/{}: {} posts ({} skipped)", outcome.subreddit, rows, skipped)
                    }
                    ForumStatus::Failed { reason } => {
                        println!("r/{}: failed ({})", outcome.subreddit, reason)
                    }
                }
            }
            println!(
                "Saved {} posts to {}",
                report.total_rows,
                report.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            reporter.report_error(&e);
            eprintln!("{}", e.user_friendly_message());
            exit_code(&e)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings, CoreError> {
    let file = match &cli.config {
        Some(path) => RawSettings::load(path)?,
        None => RawSettings::default(),
    };
    Ok(Settings::from_raw(file.overlay(cli.raw_settings()))?)
}

const CONFIG_ERROR_STATUS: u8 = 2;
const FATAL_ERROR_STATUS: u8 = 1;

fn exit_status(error: &CoreError) -> u8 {
    match error {
        CoreError::Config(_) => CONFIG_ERROR_STATUS,
        _ => FATAL_ERROR_STATUS,
    }
}

fn exit_code(error: &CoreError) -> ExitCode {
    ExitCode::from(exit_status(error))
}
