//! Error types for composing and sending messages

use std::{fmt, path::PathBuf};

use thiserror::Error;
use tracing::debug;

use super::{files::FileStoreError, provider::ProviderError};

/// Errors raised while constructing a composer
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required setting is absent or blank
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A capability is enabled but its collaborator was not supplied
    #[error("{0} is enabled but no collaborator was supplied")]
    MissingCollaborator(&'static str),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// The message fields checked before sending
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageField {
    /// The recipient list
    To,

    /// The subject line
    Subject,

    /// The HTML and plain text bodies
    Body,
}

impl fmt::Display for MessageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To => write!(f, "to"),
            Self::Subject => write!(f, "subject"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// Errors raised while attaching a file
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The file could not be read
    #[error("could not read attachment {path:?}")]
    Unreadable {
        /// The file path
        path: PathBuf,

        /// The underlying error
        #[source]
        source: FileStoreError,
    },
}

/// Errors raised while sending a message
#[derive(Debug, Error)]
pub enum MessageError {
    /// A required field is blank
    #[error("{0} cannot be blank")]
    Validation(MessageField),

    /// The message shape cannot be expressed by this mailer
    #[error("unsupported message format: {0}")]
    UnsupportedFormat(String),

    /// An attachment could not be added
    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    /// The provider reported a non-zero error code
    #[error("the provider did not accept the message ({error_code}): {message}")]
    NotAccepted {
        /// Provider error code
        error_code: i64,

        /// Provider status message
        message: String,
    },

    /// The provider failed
    #[error("the email failed to send")]
    Provider(#[source] ProviderError),
}

impl From<ProviderError> for MessageError {
    fn from(err: ProviderError) -> Self {
        debug!("ProviderError -> MessageError: {:?}", err);

        MessageError::Provider(err)
    }
}
