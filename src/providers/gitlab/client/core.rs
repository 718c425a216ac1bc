use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{GlActivityError, Result};

const MAX_RETRIES: u32 = 30;
const RETRY_DELAY_SECONDS: u64 = 10;
const MAX_CONCURRENT_REQUESTS: usize = 50;
pub(super) const PAGE_SIZE: usize = 100;

/// How often and how patiently failed requests are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            delay: Duration::from_secs(RETRY_DELAY_SECONDS),
        }
    }
}

pub struct GitLabClient {
    pub client: Client,
    pub base_url: Url,
    pub api_url: Url,
    pub token: Option<Token>,
    retry: RetryPolicy,
    semaphore: Arc<Semaphore>,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("glactivity/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GlActivityError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| GlActivityError::Config(format!("Invalid base URL: {e}")))?;

        let api_url = base_url
            .join("api/v4/")
            .map_err(|e| GlActivityError::Config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_url,
            token,
            retry: RetryPolicy::default(),
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Instance origin without trailing slash, e.g. `https://gitlab.com`.
    pub fn web_base(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }

    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Construct project base URL
    pub fn project_url(&self, project_path: &str) -> Result<Url> {
        self.api_url
            .join(&format!("projects/{}/", urlencoding::encode(project_path)))
            .map_err(|e| GlActivityError::Config(format!("Invalid project URL: {e}")))
    }

    pub(super) fn join(base: &Url, path: &str) -> Result<Url> {
        base.join(path)
            .map_err(|e| GlActivityError::Config(format!("Invalid API URL '{path}': {e}")))
    }

    /// Execute a GET request with automatic retry on network errors, rate
    /// limits and server errors. Returns the successful response.
    async fn execute_request(&self, url: &Url, query: &[(&str, String)]) -> Result<Response> {
        // One permit per logical request, held across retries
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| GlActivityError::LimiterClosed)?;

        let mut retry_count = 0;
        loop {
            let request = self.auth_request(self.client.get(url.clone()).query(query));

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    if retry_count >= self.retry.max_retries {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({}), retrying in {}s ({}/{})...",
                        e,
                        self.retry.delay.as_secs(),
                        retry_count + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= self.retry.max_retries {
                    return Err(GlActivityError::ApiErrorAfterRetries {
                        status: status.as_u16(),
                        retries: self.retry.max_retries,
                    });
                }

                warn!(
                    "GitLab API error (status {status}). Waiting {}s before retry {}/{}...",
                    self.retry.delay.as_secs(),
                    retry_count + 1,
                    self.retry.max_retries
                );

                tokio::time::sleep(self.retry.delay).await;
                retry_count += 1;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(GlActivityError::NotFound(url.path().to_string()));
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(GlActivityError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                });
            }

            return Ok(response);
        }
    }

    pub(super) async fn get_json<T>(&self, url: &Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.execute_request(url, &[]).await?;
        Ok(response.json().await?)
    }

    /// Fetch pages of a list endpoint following `x-next-page`, stopping once
    /// `limit` items were collected.
    pub(super) async fn get_all_pages<T>(
        &self,
        url: &Url,
        query: &[(&str, String)],
        limit: usize,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let remaining = limit.saturating_sub(items.len());
            if remaining == 0 {
                break;
            }

            let mut page_query = query.to_vec();
            page_query.push(("page", page.to_string()));
            page_query.push(("per_page", PAGE_SIZE.min(remaining).to_string()));

            let response = self.execute_request(url, &page_query).await?;
            let next_page = next_page(&response);
            let batch: Vec<T> = response.json().await?;

            debug!("Fetched {} items from {} (page {page})", batch.len(), url.path());
            items.extend(batch);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        items.truncate(limit);

        Ok(items)
    }
}

fn next_page(response: &Response) -> Option<u32> {
    response
        .headers()
        .get("x-next-page")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
