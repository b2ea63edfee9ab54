//! Transactional email composition.

mod composer;
pub mod emails;
mod errors;
mod files;
mod mailboxes;
mod message;
mod policy;
mod provider;
mod settings;
mod views;

pub use composer::{Collaborators, MessageComposer};
pub use errors::{AttachmentError, ConfigurationError, MessageError, MessageField};
pub use files::{FileStore, FileStoreError};
pub use mailboxes::{format_address, Mailbox, RecipientList, ADDRESS_SEPARATOR};
pub use message::{Attachment, AttachmentSource, MessageDescription, OutboundEmail};
pub use policy::EnvironmentPolicy;
pub use provider::{DeliveryReceipt, EmailProvider, ProviderError};
pub use settings::{Capabilities, MailerSettings, ResolvedSettings, DEFAULT_SAFE_NAME};
pub use views::{strip_tags, ViewError, ViewRenderer, ViewSelector};
