//! Turns invocation parameters into a validated [`Settings`].
//!
//! Parameters arrive as a [`RawSettings`] from up to two sources: an optional
//! TOML file and the command line (which already folds in environment
//! variables). Command line values win. Validation happens once, in
//! [`Settings::from_raw`], before any network call is made, so a bad output
//! extension is reported before fetching starts.

use crate::error::ConfigError;
use crate::types::{Credentials, ExportFormat, Settings, TimeFilter};
use chrono::Local;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_LIMIT: u32 = 25;
pub const DEFAULT_USER_AGENT: &str = "RedditScraper/1.0";
pub const DEFAULT_DELAY_SECS: u64 = 2;

pub const CLIENT_ID_ENV: &str = "REDDIT_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "REDDIT_CLIENT_SECRET";
pub const USER_AGENT_ENV: &str = "REDDIT_USER_AGENT";

/// Unvalidated parameters, as read from a config file or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub subreddits: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub time_filter: Option<String>,
    pub output: Option<PathBuf>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
    pub delay_secs: Option<u64>,
}

impl RawSettings {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => ConfigError::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
        })?;

        debug!("Loaded configuration file {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Layers `overrides` on top of `self`; any value set in `overrides` wins.
    pub fn overlay(self, overrides: RawSettings) -> RawSettings {
        RawSettings {
            subreddits: overrides.subreddits.or(self.subreddits),
            limit: overrides.limit.or(self.limit),
            time_filter: overrides.time_filter.or(self.time_filter),
            output: overrides.output.or(self.output),
            client_id: overrides.client_id.or(self.client_id),
            client_secret: overrides.client_secret.or(self.client_secret),
            user_agent: overrides.user_agent.or(self.user_agent),
            delay_secs: overrides.delay_secs.or(self.delay_secs),
        }
    }
}

impl Settings {
    pub fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let subreddits = normalize_subreddits(raw.subreddits.unwrap_or_default())?;

        let limit = raw.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(ConfigError::InvalidArgument {
                field: "limit".to_string(),
                value: limit.to_string(),
            });
        }

        let time_filter = match raw.time_filter {
            Some(value) => value.parse::<TimeFilter>()?,
            None => TimeFilter::default(),
        };

        let output = match raw.output {
            Some(path) if path.as_os_str().is_empty() => {
                return Err(ConfigError::InvalidArgument {
                    field: "output".to_string(),
                    value: String::new(),
                })
            }
            Some(path) => path,
            None => default_output_path(),
        };
        if ExportFormat::from_path(&output).is_err() {
            return Err(ConfigError::InvalidArgument {
                field: "output".to_string(),
                value: output.display().to_string(),
            });
        }

        let credentials = Credentials {
            client_id: require_credential(raw.client_id, "client id", "client-id", CLIENT_ID_ENV)?,
            client_secret: require_credential(
                raw.client_secret,
                "client secret",
                "client-secret",
                CLIENT_SECRET_ENV,
            )?,
            user_agent: require_credential(
                Some(raw.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())),
                "user agent",
                "user-agent",
                USER_AGENT_ENV,
            )?,
        };

        let delay = Duration::from_secs(raw.delay_secs.unwrap_or(DEFAULT_DELAY_SECS));

        Ok(Self {
            subreddits,
            limit,
            time_filter,
            output,
            credentials,
            delay,
        })
    }
}

/// Strips `r/` prefixes and surrounding whitespace, rejecting blanks.
fn normalize_subreddits(names: Vec<String>) -> Result<Vec<String>, ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::MissingField {
            field: "subreddits".to_string(),
        });
    }

    names
        .into_iter()
        .map(|name| {
            let trimmed = name.trim();
            let bare = trimmed
                .strip_prefix("/r/")
                .or_else(|| trimmed.strip_prefix("r/"))
                .unwrap_or(trimmed)
                .trim_matches('/');
            if bare.is_empty() {
                Err(ConfigError::InvalidArgument {
                    field: "subreddits".to_string(),
                    value: name.clone(),
                })
            } else {
                Ok(bare.to_string())
            }
        })
        .collect()
}

fn require_credential(
    value: Option<String>,
    name: &str,
    flag: &str,
    env_var: &str,
) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingCredential {
            name: name.to_string(),
            flag: flag.to_string(),
            env_var: env_var.to_string(),
        }),
    }
}

fn default_output_path() -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("reddit_top_posts_{}.xlsx", timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> RawSettings {
        RawSettings {
            subreddits: Some(vec!["python".to_string(), "rust".to_string()]),
            limit: Some(50),
            time_filter: Some("month".to_string()),
            output: Some(PathBuf::from("out/posts.csv")),
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            user_agent: Some("topposts-test/1.0".to_string()),
            delay_secs: Some(1),
        }
    }

    #[test]
    fn test_valid_settings() {
        let settings = Settings::from_raw(valid_raw()).unwrap();
        assert_eq!(settings.subreddits(), ["python", "rust"]);
        assert_eq!(settings.limit(), 50);
        assert_eq!(settings.time_filter(), TimeFilter::Month);
        assert_eq!(settings.output(), Path::new("out/posts.csv"));
        assert_eq!(settings.credentials().client_id, "id");
        assert_eq!(settings.delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_defaults_applied() {
        let raw = RawSettings {
            subreddits: Some(vec!["python".to_string()]),
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        let settings = Settings::from_raw(raw).unwrap();
        assert_eq!(settings.limit(), DEFAULT_LIMIT);
        assert_eq!(settings.time_filter(), TimeFilter::Week);
        assert_eq!(settings.credentials().user_agent, DEFAULT_USER_AGENT);
        assert_eq!(settings.delay(), Duration::from_secs(DEFAULT_DELAY_SECS));

        let output = settings.output().to_string_lossy().into_owned();
        assert!(output.starts_with("reddit_top_posts_"));
        assert!(output.ends_with(".xlsx"));
    }

    #[test]
    fn test_invalid_time_filter() {
        let raw = RawSettings {
            time_filter: Some("fortnight".to_string()),
            ..valid_raw()
        };
        let result = Settings::from_raw(raw);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidArgument { ref field, .. }) if field == "time_filter"
        ));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let raw = RawSettings {
            limit: Some(0),
            ..valid_raw()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(ConfigError::InvalidArgument { ref field, .. }) if field == "limit"
        ));
    }

    #[test]
    fn test_missing_subreddits() {
        let raw = RawSettings {
            subreddits: Some(Vec::new()),
            ..valid_raw()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(ConfigError::MissingField { ref field }) if field == "subreddits"
        ));

        let raw = RawSettings {
            subreddits: Some(vec!["python".to_string(), "  ".to_string()]),
            ..valid_raw()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(ConfigError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_subreddit_prefixes_stripped() {
        let raw = RawSettings {
            subreddits: Some(vec![
                "r/python".to_string(),
                "/r/rust/".to_string(),
                " golang ".to_string(),
            ]),
            ..valid_raw()
        };
        let settings = Settings::from_raw(raw).unwrap();
        assert_eq!(settings.subreddits(), ["python", "rust", "golang"]);
    }

    #[test]
    fn test_missing_credentials() {
        let raw = RawSettings {
            client_id: None,
            ..valid_raw()
        };
        match Settings::from_raw(raw) {
            Err(ConfigError::MissingCredential { env_var, .. }) => {
                assert_eq!(env_var, CLIENT_ID_ENV)
            }
            other => panic!("Expected MissingCredential, got {:?}", other),
        }

        let raw = RawSettings {
            client_secret: Some(String::new()),
            ..valid_raw()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(ConfigError::MissingCredential { .. })
        ));

        let raw = RawSettings {
            user_agent: Some(" ".to_string()),
            ..valid_raw()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_empty_output_rejected() {
        let raw = RawSettings {
            output: Some(PathBuf::new()),
            ..valid_raw()
        };
        assert!(matches!(
            Settings::from_raw(raw),
            Err(ConfigError::InvalidArgument { ref field, .. }) if field == "output"
        ));
    }

    #[test]
    fn test_unsupported_output_extension_rejected() {
        for output in ["posts.json", "posts", "out/posts.xls"] {
            let raw = RawSettings {
                output: Some(PathBuf::from(output)),
                ..valid_raw()
            };
            assert!(matches!(
                Settings::from_raw(raw),
                Err(ConfigError::InvalidArgument { ref field, ref value })
                    if field == "output" && value == output
            ));
        }

        let raw = RawSettings {
            output: Some(PathBuf::from("Posts.XLSX")),
            ..valid_raw()
        };
        assert!(Settings::from_raw(raw).is_ok());
    }

    #[test]
    fn test_toml_and_overlay() {
        let file = RawSettings::from_toml_str(
            r#"
            subreddits = ["python"]
            limit = 10
            time_filter = "day"
            client_id = "file-id"
            client_secret = "file-secret"
            "#,
        )
        .unwrap();

        let cli = RawSettings {
            limit: Some(5),
            client_id: Some("cli-id".to_string()),
            ..Default::default()
        };

        let merged = file.overlay(cli);
        assert_eq!(merged.subreddits, Some(vec!["python".to_string()]));
        assert_eq!(merged.limit, Some(5));
        assert_eq!(merged.time_filter.as_deref(), Some("day"));
        assert_eq!(merged.client_id.as_deref(), Some("cli-id"));
        assert_eq!(merged.client_secret.as_deref(), Some("file-secret"));
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        let result = RawSettings::from_toml_str("subreddit = [\"python\"]");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let path = std::env::temp_dir().join(format!("topposts_{}.toml", uuid::Uuid::new_v4()));
        assert!(matches!(
            RawSettings::load(&path),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_config_file() {
        let path = std::env::temp_dir().join(format!("topposts_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "subreddits = [\"rust\"]\ndelay_secs = 0\n").unwrap();

        let raw = RawSettings::load(&path).unwrap();
        assert_eq!(raw.subreddits, Some(vec!["rust".to_string()]));
        assert_eq!(raw.delay_secs, Some(0));

        std::fs::remove_file(&path).unwrap();
    }
}
