// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Source of product page documents.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the document at `url`, retrying as configured.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Create an HTTP client that identifies itself as a desktop browser.
pub fn create_client(config: &FetchConfig) -> Result<Client> {
    let accept_language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
        AppError::config(format!(
            "fetch.accept_language is not a valid header value: {e}"
        ))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, accept_language);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    let client = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Page fetcher with bounded retries and linear backoff.
pub struct HttpFetcher {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    /// Create a fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// One GET; any non-success status counts as a failure.
    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(error) => {
                    log::warn!(
                        "Fetch attempt {}/{} failed for {}: {}",
                        attempt,
                        self.max_attempts,
                        url,
                        error
                    );
                    last_error = Some(error);

                    if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay.saturating_mul(attempt)).await;
                    }
                }
            }
        }

        let message = last_error.map_or_else(|| "no attempts made".to_string(), |e| e.to_string());
        Err(AppError::fetch(url, self.max_attempts, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> FetchConfig {
        FetchConfig {
            retry_delay_ms: 0,
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bike"))
            .and(header("pragma", "no-cache"))
            .and(header("cache-control", "no-cache"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&test_config()).unwrap();
        let body = fetcher.fetch(&format!("{}/bike", server.uri())).await.unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bike"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bike"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&test_config()).unwrap();
        let body = fetcher.fetch(&format!("{}/bike", server.uri())).await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bike"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&test_config()).unwrap();
        let result = fetcher.fetch(&format!("{}/bike", server.uri())).await;

        match result {
            Err(AppError::Fetch { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_transport_error_is_fetch_error() {
        let fetcher = HttpFetcher::new(&FetchConfig {
            max_attempts: 2,
            ..test_config()
        })
        .unwrap();

        let result = fetcher.fetch("http://127.0.0.1:1/unreachable").await;
        assert!(matches!(result, Err(AppError::Fetch { attempts: 2, .. })));
    }
}
