use crate::error::{Result, WatchError};
use crate::results::Payload;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Destination for the run's single notification
pub trait NotificationSink {
    /// Deliver the payload once. A rejected payload is `DeliveryFailure`.
    fn deliver(&self, payload: &Payload) -> impl Future<Output = Result<()>> + Send;
}

/// Incoming-webhook sink: POSTs `{"text": ...}` as JSON
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, endpoint: Url, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }
}

impl NotificationSink for WebhookSink {
    async fn deliver(&self, payload: &Payload) -> Result<()> {
        // Webhook URLs embed their secret, keep them out of error messages
        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| WatchError::DeliveryFailure(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::DeliveryFailure(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        ::log::info!("Delivered notification ({} bytes)", payload.text.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{client, serve_once};

    fn payload() -> Payload {
        Payload {
            text: "*NFL Wikipedia Watch — last hour*\nNo updates".to_string(),
        }
    }

    #[tokio::test]
    async fn test_deliver_posts_json_text() {
        let (url, request) = serve_once("200 OK", "ok").await;
        let sink = WebhookSink::new(client(), url, Duration::from_secs(5));

        sink.deliver(&payload()).await.unwrap();

        let request = request.await.unwrap();
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(request.contains(r#"{"text":"*NFL Wikipedia Watch — last hour*\nNo updates"}"#));
    }

    #[tokio::test]
    async fn test_rejected_payload_is_delivery_failure() {
        let (url, _request) = serve_once("403 Forbidden", "invalid_token").await;
        let sink = WebhookSink::new(client(), url, Duration::from_secs(5));

        match sink.deliver(&payload()).await {
            Err(WatchError::DeliveryFailure(msg)) => {
                assert!(msg.contains("403"));
                assert!(msg.contains("invalid_token"));
            }
            other => panic!("expected delivery failure, got {other:?}"),
        }
    }
}
