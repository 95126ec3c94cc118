//! Application-only OAuth2 for the Reddit API.
//!
//! Read-only listing access needs no user: the client id and secret are
//! exchanged for a bearer token through the client-credentials grant.

use oauth2::basic::BasicClient;
use oauth2::{
    AccessToken, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    TokenResponse, TokenUrl,
};
use reqwest::Client;
use topposts_core::{CoreError, Credentials, RedditApiError};
use tracing::{debug, error, info};

pub const REDDIT_AUTH_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone)]
pub struct RedditAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
}

impl RedditAuthConfig {
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_base(credentials, REDDIT_AUTH_BASE)
    }

    /// Points both OAuth endpoints at `base`, e.g. a mock server.
    pub fn with_base(credentials: &Credentials, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            auth_url: format!("{}/api/v1/authorize", base),
            token_url: format!("{}/api/v1/access_token", base),
        }
    }

    fn oauth_client(&self) -> Result<BasicClient, CoreError> {
        let auth_url = AuthUrl::new(self.auth_url.clone()).map_err(|e| CoreError::Internal {
            message: format!("Invalid auth URL {}: {}", self.auth_url, e),
        })?;
        let token_url = TokenUrl::new(self.token_url.clone()).map_err(|e| CoreError::Internal {
            message: format!("Invalid token URL {}: {}", self.token_url, e),
        })?;

        Ok(BasicClient::new(
            ClientId::new(self.client_id.clone()),
            Some(ClientSecret::new(self.client_secret.clone())),
            auth_url,
            Some(token_url),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct AppOnlyToken {
    pub access_token: AccessToken,
}

/// Runs the client-credentials grant. The token is never refreshed.
pub async fn fetch_app_token(
    http_client: &Client,
    config: &RedditAuthConfig,
) -> Result<AppOnlyToken, CoreError> {
    debug!("Requesting application-only token from {}", config.token_url);

    let token = config
        .oauth_client()?
        .exchange_client_credentials()
        .request_async(|request| send_oauth_request(http_client, request))
        .await
        .map_err(|e| match e {
            RequestTokenError::Request(e) => {
                error!("Token request failed: {}", e);
                CoreError::Network(e)
            }
            RequestTokenError::ServerResponse(response) => {
                error!("Token request rejected: {}", response);
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: response.error().to_string(),
                })
            }
            RequestTokenError::Parse(e, _) => {
                error!("Token response could not be parsed: {}", e);
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: format!("unexpected token response: {}", e),
                })
            }
            RequestTokenError::Other(reason) => {
                error!("Token request failed: {}", reason);
                CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })
            }
        })?;

    info!("Obtained Reddit application-only token");
    Ok(AppOnlyToken {
        access_token: token.access_token().clone(),
    })
}

/// Sends an oauth2 request through our own HTTP client so the configured
/// user agent is applied; Reddit rejects token requests without one.
async fn send_oauth_request(
    http_client: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
