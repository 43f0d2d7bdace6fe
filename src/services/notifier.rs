// src/services/notifier.rs

//! Push notification delivery through ntfy.
//!
//! Delivery is best-effort: failures are logged and never returned.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::NotifyConfig;
use crate::utils::sanitize_header;

/// Sink for push notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification. Must not fail the caller.
    async fn notify(&self, title: &str, message: &str);
}

/// Publishes notifications to an ntfy topic.
pub struct NtfyNotifier {
    client: Client,
    endpoint: String,
    priority: String,
}

impl NtfyNotifier {
    /// Create a notifier for the configured server and topic.
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}",
                config.server.trim_end_matches('/'),
                config.topic.trim()
            ),
            priority: config.priority.clone(),
        })
    }

    /// Topic URL notifications are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn notify(&self, title: &str, message: &str) {
        let title = sanitize_header(title);

        let result = self
            .client
            .post(&self.endpoint)
            .header("Title", title.as_str())
            .header("Priority", self.priority.as_str())
            .body(message.to_string())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                log::info!("[ntfy] HTTP {} Title='{}'", response.status().as_u16(), title);
            }
            Ok(response) => {
                log::warn!(
                    "[ntfy] HTTP {} Title='{}' (not delivered)",
                    response.status().as_u16(),
                    title
                );
            }
            Err(error) => {
                log::warn!("[ntfy] Delivery failed for '{}': {}", title, error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &str) -> NotifyConfig {
        NotifyConfig {
            server: format!("{server}/"),
            topic: "bike-alerts".to_string(),
            ..NotifyConfig::default()
        }
    }

    #[test]
    fn test_endpoint_joins_server_and_topic() {
        let notifier = NtfyNotifier::new(&config_for("https://ntfy.example")).unwrap();
        assert_eq!(notifier.endpoint(), "https://ntfy.example/bike-alerts");
    }

    #[tokio::test]
    async fn test_posts_sanitized_title_and_utf8_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bike-alerts"))
            .and(header("Title", "2XS availability change"))
            .and(header("Priority", "high"))
            .and(body_string("Rozmiar 2XS: unavailable → available"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = NtfyNotifier::new(&config_for(&server.uri())).unwrap();
        notifier
            .notify(
                "🔔 2XS\r\navailability   change",
                "Rozmiar 2XS: unavailable → available",
            )
            .await;
    }

    #[tokio::test]
    async fn test_server_error_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = NtfyNotifier::new(&config_for(&server.uri())).unwrap();
        notifier.notify("title", "body").await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_swallowed() {
        let notifier = NtfyNotifier::new(&config_for("http://127.0.0.1:1")).unwrap();
        notifier.notify("title", "body").await;
    }
}
