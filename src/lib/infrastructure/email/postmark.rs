//! Postmark HTTP API client

use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::domain::communication::{DeliveryReceipt, EmailProvider, OutboundEmail, ProviderError};

/// Header carrying the server token
pub const SERVER_TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// Postmark configuration
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
pub struct PostmarkConfig {
    /// The API base URL
    #[arg(long, env = "POSTMARK_API_URL", default_value = "https://api.postmarkapp.com")]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "POSTMARK_TIMEOUT_SECONDS", default_value = "30")]
    pub timeout_seconds: u64,
}

impl Default for PostmarkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.postmarkapp.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    error_code: i64,
    message: String,
}

/// Postmark client
#[derive(Clone)]
pub struct PostmarkClient {
    client: Client,
    server_token: String,
    base_url: String,
}

impl std::fmt::Debug for PostmarkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostmarkClient")
            .field("base_url", &self.base_url)
            .field("server_token", &"********")
            .finish()
    }
}

impl PostmarkClient {
    /// Create a new Postmark client
    pub fn new(server_token: &str, config: &PostmarkConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::UnknownError(e.into()))?;

        Ok(Self {
            client,
            server_token: server_token.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EmailProvider for PostmarkClient {
    async fn send_email(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, ProviderError> {
        debug!(to = %email.to, subject = %email.subject, "posting email to Postmark");

        let res = self
            .client
            .post(format!("{}/email", self.base_url))
            .header("Accept", "application/json")
            .header(SERVER_TOKEN_HEADER, &self.server_token)
            .json(email)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = res.status();

        if status.is_success() {
            return res
                .json::<DeliveryReceipt>()
                .await
                .map_err(|e| ProviderError::UnknownError(e.into()));
        }

        let body = res.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => Err(ProviderError::Unauthorized),
            StatusCode::UNPROCESSABLE_ENTITY => match serde_json::from_str::<ApiError>(&body) {
                Ok(error) => Err(ProviderError::Rejected {
                    error_code: error.error_code,
                    message: error.message,
                }),
                Err(_) => Err(ProviderError::Status {
                    status: status.as_u16(),
                    body,
                }),
            },
            _ => Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};
    use testresult::TestResult;
    use tokio::net::TcpListener;

    use crate::domain::communication::Attachment;

    use super::*;

    async fn handle_email(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let token = headers
            .get(SERVER_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        match token {
            "server-token" if body["To"] == "rejected@example.com" => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "ErrorCode": 406, "Message": "Inactive recipient" })),
            ),
            "server-token" if body["Attachments"][0]["Content"] == "JVBERg==" => (
                StatusCode::OK,
                Json(json!({
                    "To": body["To"],
                    "SubmittedAt": "2024-05-01T10:15:30-04:00",
                    "MessageID": "b7bc2f4a-e38e-4336-af7d-e6c392c2f817",
                    "ErrorCode": 0,
                    "Message": "OK"
                })),
            ),
            "server-token" => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ErrorCode": 1, "Message": "unexpected request" })),
            ),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "ErrorCode": 10, "Message": "Bad or missing API token" })),
            ),
        }
    }

    async fn fake_postmark() -> TestResult<SocketAddr> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        let router = Router::new().route("/email", post(handle_email));

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Ok(address)
    }

    fn client(token: &str, address: SocketAddr) -> TestResult<PostmarkClient> {
        let config = PostmarkConfig {
            base_url: format!("http://{address}/"),
            timeout_seconds: 5,
        };

        Ok(PostmarkClient::new(token, &config)?)
    }

    fn email(to: &str) -> OutboundEmail {
        OutboundEmail {
            from: Some("sender@example.com".to_string()),
            to: to.to_string(),
            subject: "Invoice".to_string(),
            text_body: Some("Attached".to_string()),
            track_opens: true,
            attachments: vec![Attachment {
                name: "invoice.pdf".to_string(),
                content: b"%PDF".to_vec(),
                content_type: "application/pdf".to_string(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_send_email_returns_receipt() -> TestResult {
        let address = fake_postmark().await?;

        let receipt = client("server-token", address)?
            .send_email(&email("jane@example.com"))
            .await?;

        assert!(receipt.is_success());
        assert_eq!(receipt.to.as_deref(), Some("jane@example.com"));
        assert_eq!(
            receipt.message_id.as_deref(),
            Some("b7bc2f4a-e38e-4336-af7d-e6c392c2f817")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_message() -> TestResult {
        let address = fake_postmark().await?;

        let result = client("server-token", address)?
            .send_email(&email("rejected@example.com"))
            .await;

        assert!(matches!(
            result,
            Err(ProviderError::Rejected { error_code: 406, .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_token() -> TestResult {
        let address = fake_postmark().await?;

        let result = client("wrong-token", address)?
            .send_email(&email("jane@example.com"))
            .await;

        assert!(matches!(result, Err(ProviderError::Unauthorized)));

        Ok(())
    }

    #[tokio::test]
    async fn test_unexpected_status() -> TestResult {
        let address = fake_postmark().await?;
        let mut message = email("jane@example.com");
        message.attachments.clear();

        let result = client("server-token", address)?.send_email(&message).await;

        assert!(matches!(result, Err(ProviderError::Status { status: 500, .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_provider() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        drop(listener);

        let result = client("server-token", address)?
            .send_email(&email("jane@example.com"))
            .await;

        assert!(matches!(result, Err(ProviderError::Transport(_))));

        Ok(())
    }
}
