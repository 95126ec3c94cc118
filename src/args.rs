use clap::Parser;
use std::path::PathBuf;
use topposts_core::{RawSettings, CLIENT_ID_ENV, CLIENT_SECRET_ENV, USER_AGENT_ENV};

/// Export the top posts of one or more subreddits to CSV or Excel
#[derive(Parser, Debug)]
#[command(name = "topposts")]
#[command(version)]
#[command(about = "Scrape top posts from Reddit subreddits", long_about = None)]
pub struct Cli {
    /// Subreddits to scrape (without r/)
    #[arg(long = "subreddits", value_name = "NAME", num_args = 1..)]
    pub subreddits: Vec<String>,

    /// Maximum number of posts per subreddit (default: 25)
    #[arg(long = "limit")]
    pub limit: Option<u32>,

    /// Time filter for top posts: day, week, month, year or all (default: week)
    #[arg(long = "time-filter", value_name = "FILTER")]
    pub time_filter: Option<String>,

    /// Output file path; .csv or .xlsx selects the format
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Reddit API client ID
    #[arg(long = "client-id", env = CLIENT_ID_ENV, hide_env_values = true)]
    pub client_id: Option<String>,

    /// Reddit API client secret
    #[arg(long = "client-secret", env = CLIENT_SECRET_ENV, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// User agent for Reddit API requests (default: RedditScraper/1.0)
    #[arg(long = "user-agent", env = USER_AGENT_ENV)]
    pub user_agent: Option<String>,

    /// TOML file with default settings
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Pause between subreddits in seconds (default: 2)
    #[arg(long = "delay-secs", value_name = "SECONDS")]
    pub delay_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Settings given on the command line or through the environment.
    pub fn raw_settings(&self) -> RawSettings {
        RawSettings {
            subreddits: (!self.subreddits.is_empty()).then(|| self.subreddits.clone()),
            limit: self.limit,
            time_filter: self.time_filter.clone(),
            output: self.output.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            user_agent: self.user_agent.clone(),
            delay_secs: self.delay_secs,
        }
    }
}
