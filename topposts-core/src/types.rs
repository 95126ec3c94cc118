use crate::error::{ConfigError, ExportError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Author value written for posts whose account was deleted.
pub const DELETED_AUTHOR: &str = "[deleted]";

pub const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

pub const COLUMN_COUNT: usize = 11;

/// Output header, in the order every row is written.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "title",
    "score",
    "id",
    "author",
    "num_comments",
    "created_utc",
    "url",
    "permalink",
    "selftext",
    "subreddit",
    "is_self_post",
];

/// Time window for the `top` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    Day,
    #[default]
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub const VARIANTS: [TimeFilter; 5] = [
        TimeFilter::Day,
        TimeFilter::Week,
        TimeFilter::Month,
        TimeFilter::Year,
        TimeFilter::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFilter::VARIANTS
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidArgument {
                field: "time_filter".to_string(),
                value: s.to_string(),
            })
    }
}

/// Output table format, chosen by the output path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Picks the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("xlsx") => Ok(ExportFormat::Xlsx),
            _ => Err(ExportError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Reddit application credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Validated run settings. Only built through [`Settings::from_raw`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub(crate) subreddits: Vec<String>,
    pub(crate) limit: u32,
    pub(crate) time_filter: TimeFilter,
    pub(crate) output: PathBuf,
    pub(crate) credentials: Credentials,
    pub(crate) delay: Duration,
}

impl Settings {
    pub fn subreddits(&self) -> &[String] {
        &self.subreddits
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn time_filter(&self) -> TimeFilter {
        self.time_filter
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// One post as returned in a listing child's `data` object.
///
/// Every field is optional so that malformed records reach the extractor
/// instead of failing the whole page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub score: Option<i64>,
    pub author: Option<String>,
    pub num_comments: Option<i64>,
    pub created_utc: Option<f64>,
    pub url: Option<String>,
    pub permalink: Option<String>,
    pub selftext: Option<String>,
    pub is_self: Option<bool>,
    pub subreddit: Option<String>,
}

/// A scalar table value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(value) => f.write_str(value),
            Cell::Integer(value) => write!(f, "{}", value),
            Cell::Boolean(value) => write!(f, "{}", value),
            Cell::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A flattened post, one per output line.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub title: String,
    pub score: i64,
    pub id: String,
    pub author: String,
    pub num_comments: i64,
    pub created_utc: DateTime<Utc>,
    pub url: String,
    pub permalink: String,
    pub selftext: String,
    pub subreddit: String,
    pub is_self_post: bool,
}

impl Row {
    /// Cells in [`COLUMNS`] order.
    pub fn cells(&self) -> [Cell; COLUMN_COUNT] {
        [
            Cell::Text(self.title.clone()),
            Cell::Integer(self.score),
            Cell::Text(self.id.clone()),
            Cell::Text(self.author.clone()),
            Cell::Integer(self.num_comments),
            Cell::Timestamp(self.created_utc),
            Cell::Text(self.url.clone()),
            Cell::Text(self.permalink.clone()),
            Cell::Text(self.selftext.clone()),
            Cell::Text(self.subreddit.clone()),
            Cell::Boolean(self.is_self_post),
        ]
    }
}
