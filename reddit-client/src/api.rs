use crate::auth::{fetch_app_token, AppOnlyToken, RedditAuthConfig, REDDIT_AUTH_BASE};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use topposts_core::{CoreError, Credentials, PostRecord, RedditApiError, TimeFilter};
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Reddit never returns more than this many children per listing page.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// Where the client sends its requests.
#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub api_base: String,
    pub auth_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            api_base: REDDIT_API_BASE.to_string(),
            auth_base: REDDIT_AUTH_BASE.to_string(),
        }
    }
}

impl RedditEndpoints {
    /// Serves both the API and the token endpoint from one base URL.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            api_base: base.clone(),
            auth_base: base,
        }
    }
}

#[derive(Debug)]
pub struct RedditApiClient {
    pub(crate) http_client: Client,
    pub(crate) auth: RedditAuthConfig,
    pub(crate) token: OnceCell<AppOnlyToken>,
    pub(crate) api_base: String,
    pub(crate) page_size: u32,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(credentials: &Credentials) -> Result<Self, CoreError> {
        Self::with_endpoints(credentials, RedditEndpoints::default())
    }

    pub fn with_endpoints(
        credentials: &Credentials,
        endpoints: RedditEndpoints,
    ) -> Result<Self, CoreError> {
        // Reddit answers unknown subreddits with a redirect to its search page
        let http_client = Client::builder()
            .user_agent(&credentials.user_agent)
            .timeout(Duration::from_secs(30))
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            http_client,
            auth: RedditAuthConfig::with_base(credentials, &endpoints.auth_base),
            token: OnceCell::new(),
            api_base: endpoints.api_base.trim_end_matches('/').to_string(),
            page_size: MAX_PAGE_SIZE,
            user_agent: credentials.user_agent.clone(),
        })
    }

    /// Caps the number of posts requested per listing page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the cached bearer token, fetching it on first use. A failed
    /// exchange is not cached, so the next call tries again.
    pub async fn access_token(&self) -> Result<&AppOnlyToken, CoreError> {
        self.token
            .get_or_try_init(|| fetch_app_token(&self.http_client, &self.auth))
            .await
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let api_error = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            404 => RedditApiError::EndpointNotFound {
                endpoint: endpoint.to_string(),
            },
            code if status.is_redirection() => {
                debug!("Redirect {} treated as missing resource", code);
                RedditApiError::EndpointNotFound {
                    endpoint: endpoint.to_string(),
                }
            }
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            code => RedditApiError::UnexpectedStatus { status_code: code },
        };

        Err(CoreError::RedditApi(api_error))
    }

    /// Fetches one page of `/r/{subreddit}/top`.
    pub async fn get_top_page(
        &self,
        access_token: &str,
        subreddit: &str,
        time_filter: TimeFilter,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<PostRecord>, CoreError> {
        let endpoint = format!("/r/{}/top", subreddit);
        let limit_str = limit.to_string();
        let mut params = vec![
            ("t", time_filter.as_str()),
            ("limit", limit_str.as_str()),
            ("raw_json", "1"),
        ];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(params.as_slice()))
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::EndpointNotFound { .. }) => {
                    CoreError::RedditApi(RedditApiError::SubredditNotFound {
                        subreddit: subreddit.to_string(),
                    })
                }
                other => other,
            })?;

        let listing: RedditListing<PostRecord> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }
}
