//! Shared HTTP plumbing: per-call timeout and at most one retry after a fixed delay.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::FetchError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Applied to each request individually.
    pub timeout: Duration,
    /// Fixed delay before the retry.
    pub backoff: Duration,
    /// Extra attempts after the first; 0 or 1.
    pub retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            backoff: Duration::from_secs(2),
            retries: 1,
        }
    }
}

impl RetryPolicy {
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// A `reqwest` client plus the retry policy every adapter call goes through.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(policy: RetryPolicy) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("thesisboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, policy))
    }

    pub fn with_client(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Same client, different policy (e.g. a longer timeout for a slow provider).
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            client: self.client.clone(),
            policy,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.execute(url, || self.client.get(url)).await
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(url, || self.client.post(url).json(body)).await
    }

    async fn execute<T, F>(&self, url: &str, build: F) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match self.execute_once(build()).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.policy.retries && e.is_retryable() => {
                    attempt += 1;
                    warn!(
                        url = %redact(url),
                        error = %e,
                        backoff_ms = self.policy.backoff.as_millis() as u64,
                        "request failed, retrying once"
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute_once<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FetchError> {
        let resp = request.timeout(self.policy.timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::status(status.as_u16(), &body));
        }
        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "response received");
        serde_json::from_slice(&bytes).map_err(|e| FetchError::shape(e.to_string()))
    }
}

/// Strip the query string so API keys never reach the logs.
pub(crate) fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn redact_drops_query() {
        assert_eq!(
            redact("https://api.example.com/obs?series_id=DGS10&api_key=secret"),
            "https://api.example.com/obs"
        );
        assert_eq!(redact("https://api.example.com/x"), "https://api.example.com/x");
    }

    #[tokio::test]
    async fn unreachable_host_fails_after_retry() {
        let policy = RetryPolicy {
            timeout: Duration::from_secs(2),
            backoff: Duration::from_millis(1),
            retries: 1,
        };
        let http = HttpFetcher::new(policy).unwrap();
        let err = http
            .get_json::<Value>("http://127.0.0.1:9/unreachable")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
        assert!(!err.to_string().contains("unreachable"), "{err}");
    }
}
