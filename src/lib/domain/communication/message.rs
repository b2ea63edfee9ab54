//! Email message

use std::{collections::HashMap, path::PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::{mailboxes::Mailbox, views::ViewSelector};

/// A file attached to a message
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attachment {
    /// The file name shown to the recipient
    pub name: String,

    /// The raw file contents, base64 encoded on the wire
    #[serde(serialize_with = "serialize_base64")]
    pub content: Vec<u8>,

    /// The MIME type of the file
    pub content_type: String,
}

fn serialize_base64<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(content))
}

/// The fully assembled message handed to an [`EmailProvider`](super::provider::EmailProvider)
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutboundEmail {
    /// Formatted sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Formatted, comma separated recipient list
    pub to: String,

    /// The subject line
    pub subject: String,

    /// The HTML body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,

    /// The plain text body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_body: Option<String>,

    /// Provider tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Whether the provider tracks opens
    pub track_opens: bool,

    /// Reply-To address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    /// Cc recipients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,

    /// Bcc recipients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,

    /// Custom metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,

    /// Attached files
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// A file on disk to be attached
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AttachmentSource {
    /// The file name shown to the recipient
    pub name: String,

    /// Where the file currently lives; it is removed once read
    pub path: PathBuf,

    /// The MIME type of the file
    pub mime_type: String,
}

/// A message described outside the composer, used by auto mode and batches
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageDescription {
    /// Recipients
    pub to: Vec<Mailbox>,

    /// Senders; only a single sender is supported
    pub from: Vec<Mailbox>,

    /// The subject line
    pub subject: Option<String>,

    /// The HTML body
    pub html_body: Option<String>,

    /// The plain text body
    pub text_body: Option<String>,

    /// Views to render the bodies from
    pub views: Option<ViewSelector>,

    /// Parameters passed to the views
    pub params: Value,

    /// Files to attach
    pub attachments: Vec<AttachmentSource>,
}
