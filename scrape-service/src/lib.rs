use futures::StreamExt;
use reddit_client::ListingSource;
use std::path::PathBuf;
use std::time::Duration;
use topposts_core::{
    extract, CoreError, ErrorExt, ErrorRecovery, RecoveryStrategy, Row, Settings, TimeFilter,
};
use tracing::{info, warn};


/// What happened to one subreddit during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ForumStatus {
    Fetched { rows: usize, skipped: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForumOutcome {
    pub subreddit: String,
    pub status: ForumStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeReport {
    pub outcomes: Vec<ForumOutcome>,
    pub total_rows: usize,
    pub output: PathBuf,
}

impl ScrapeReport {
    pub fn failed_forums(&self) -> impl Iterator<Item = &ForumOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, ForumStatus::Failed { .. }))
    }
}

struct ForumBatch {
    rows: Vec<Row>,
    skipped: usize,
}

/// Runs the export pipeline: one subreddit at a time, a fixed pause between
/// subreddits, and a single write at the end.
pub struct ScrapeService<S> {
    source: S,
    delay: Duration,
}

impl<S: ListingSource> ScrapeService<S> {
    pub fn new(source: S, delay: Duration) -> Self {
        Self { source, delay }
    }

    pub async fn run(&self, settings: &Settings) -> Result<ScrapeReport, CoreError> {
        let (rows, outcomes) = self
            .collect_rows(settings.subreddits(), settings.time_filter(), settings.limit())
            .await?;

        if rows.is_empty() {
            warn!("No posts were collected.");
        }

        exporter::export(&rows, settings.output())?;

        Ok(ScrapeReport {
            total_rows: rows.len(),
            outcomes,
            output: settings.output().to_path_buf(),
        })
    }

    /// Fetches every subreddit in order and returns the accumulated rows.
    /// A subreddit that fails contributes no rows; the others are unaffected.
    pub async fn collect_rows(
        &self,
        subreddits: &[String],
        time_filter: TimeFilter,
        limit: u32,
    ) -> Result<(Vec<Row>, Vec<ForumOutcome>), CoreError> {
        let mut rows = Vec::new();
        let mut outcomes = Vec::with_capacity(subreddits.len());

        for (index, subreddit) in subreddits.iter().enumerate() {
            info!("Scraping r/{}...", subreddit);

            let status = match self.fetch_forum(subreddit, time_filter, limit).await {
                Ok(batch) => {
                    info!(
                        "Successfully scraped {} posts from r/{}",
                        batch.rows.len(),
                        subreddit
                    );
                    let status = ForumStatus::Fetched {
                        rows: batch.rows.len(),
                        skipped: batch.skipped,
                    };
                    rows.extend(batch.rows);
                    status
                }
                Err(error) => match ErrorRecovery::determine_strategy(&error) {
                    RecoveryStrategy::Abort => return Err(error),
                    _ => {
                        error.log_error();
                        warn!("Skipping r/{}: {}", subreddit, error.user_friendly_message());
                        ForumStatus::Failed {
                            reason: error.to_string(),
                        }
                    }
                },
            };

            outcomes.push(ForumOutcome {
                subreddit: subreddit.clone(),
                status,
            });

            if index + 1 < subreddits.len() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok((rows, outcomes))
    }

    async fn fetch_forum(
        &self,
        subreddit: &str,
        time_filter: TimeFilter,
        limit: u32,
    ) -> Result<ForumBatch, CoreError> {
        let mut posts = self.source.top_posts(subreddit, time_filter, limit);
        let mut batch = ForumBatch {
            rows: Vec::new(),
            skipped: 0,
        };

        while let Some(post) = posts.next().await {
            let post = post?;
            match extract(subreddit, &post) {
                Ok(row) => batch.rows.push(row),
                Err(e) => {
                    let error = CoreError::from(e);
                    match ErrorRecovery::determine_strategy(&error) {
                        RecoveryStrategy::SkipRow => {
                            error.log_warn();
                            batch.skipped += 1;
                        }
                        _ => return Err(error),
                    }
                }
            }
        }

        Ok(batch)
    }
}
