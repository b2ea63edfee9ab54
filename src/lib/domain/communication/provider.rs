//! Email provider port

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use thiserror::Error;

#[cfg(test)]
use mockall::mock;

use super::message::OutboundEmail;

/// What the provider reports back after accepting a message
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryReceipt {
    /// Zero when the message was accepted
    pub error_code: i64,

    /// Human readable status
    #[serde(default)]
    pub message: String,

    /// The provider's message id
    #[serde(default, rename = "MessageID")]
    pub message_id: Option<String>,

    /// When the provider accepted the message
    #[serde(default)]
    pub submitted_at: Option<DateTime<FixedOffset>>,

    /// The recipients as seen by the provider
    #[serde(default)]
    pub to: Option<String>,
}

impl DeliveryReceipt {
    /// A receipt for a message accepted without a provider response
    pub fn accepted(to: &str) -> Self {
        Self {
            error_code: 0,
            message: "OK".to_string(),
            to: Some(to.to_string()),
            ..Default::default()
        }
    }

    /// Returns true if the provider accepted the message
    pub fn is_success(&self) -> bool {
        self.error_code == 0
    }
}

/// Errors raised by a provider while sending
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The credential was refused
    #[error("the provider refused the credential")]
    Unauthorized,

    /// The provider rejected the message
    #[error("the provider rejected the message ({error_code}): {message}")]
    Rejected {
        /// Provider error code
        error_code: i64,

        /// Provider error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("the provider responded with status {status}: {body}")]
    Status {
        /// The status code
        status: u16,

        /// The response body
        body: String,
    },

    /// The request never completed
    #[error("could not reach the provider: {0}")]
    Transport(String),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Sends assembled messages
#[async_trait]
pub trait EmailProvider: Send + Sync + 'static {
    /// Send an email
    ///
    /// # Arguments
    /// * `email` - The [`OutboundEmail`] to send.
    ///
    /// # Returns
    /// - [`Ok`] with the provider's [`DeliveryReceipt`].
    /// - [`Err`] containing a [`ProviderError`] if the provider could not be reached or refused the message.
    async fn send_email(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, ProviderError>;
}

#[cfg(test)]
mock! {
    pub EmailProvider {}

    #[async_trait]
    impl EmailProvider for EmailProvider {
        async fn send_email(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, ProviderError>;
    }
}
