//! Message composer

use std::{fmt, path::Path, sync::Arc};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    errors::{AttachmentError, ConfigurationError, MessageError, MessageField},
    files::FileStore,
    mailboxes::{format_address, RecipientList},
    message::{Attachment, MessageDescription, OutboundEmail},
    provider::{DeliveryReceipt, EmailProvider},
    settings::{MailerSettings, ResolvedSettings},
    views::{strip_tags, ViewRenderer, ViewSelector},
};

/// The collaborators a [`MessageComposer`] delegates to
#[derive(Debug)]
pub struct Collaborators<P, D, V, F> {
    /// Sends every message that is not routed elsewhere
    pub provider: Arc<P>,

    /// Sends error reports when direct send is enabled
    pub direct_sender: Option<Arc<D>>,

    /// Renders bodies when view rendering is enabled
    pub views: Option<Arc<V>>,

    /// Reads and removes attachment files
    pub files: Arc<F>,
}

/// Builds one message at a time and hands it to the provider.
///
/// Builder calls return the composer so they can be chained:
///
/// ```ignore
/// let sent = composer
///     .set_to("jane@example.com", Some("Jane"))
///     .set_subject("Welcome")
///     .compose_from_views(&ViewSelector::html("welcome.html"), &params)
///     .send()
///     .await;
/// ```
pub struct MessageComposer<P, D, V, F>
where
    P: EmailProvider,
    D: EmailProvider,
    V: ViewRenderer,
    F: FileStore,
{
    settings: Arc<ResolvedSettings>,
    provider: Arc<P>,
    direct_sender: Option<Arc<D>>,
    views: Option<Arc<V>>,
    files: Arc<F>,

    to: RecipientList,
    from: Option<String>,
    subject: Option<String>,
    html_body: Option<String>,
    plain_text_body: Option<String>,
    attachments: Vec<Attachment>,
}

impl<P, D, V, F> MessageComposer<P, D, V, F>
where
    P: EmailProvider,
    D: EmailProvider,
    V: ViewRenderer,
    F: FileStore,
{
    /// Creates a new composer.
    ///
    /// # Returns
    /// - [`Ok`] with an empty composer.
    /// - [`Err`] with a [`ConfigurationError`] if a required setting is absent or an
    ///   enabled capability has no collaborator.
    pub fn new(
        settings: &MailerSettings,
        collaborators: Collaborators<P, D, V, F>,
    ) -> Result<Self, ConfigurationError> {
        let settings = settings.resolve()?;

        if settings.capabilities.view_rendering && collaborators.views.is_none() {
            return Err(ConfigurationError::MissingCollaborator("view_rendering"));
        }

        if settings.capabilities.direct_send_for_errors && collaborators.direct_sender.is_none() {
            return Err(ConfigurationError::MissingCollaborator(
                "direct_send_for_errors",
            ));
        }

        Ok(Self {
            settings: Arc::new(settings),
            provider: collaborators.provider,
            direct_sender: collaborators.direct_sender,
            views: collaborators.views,
            files: collaborators.files,
            to: RecipientList::default(),
            from: None,
            subject: None,
            html_body: None,
            plain_text_body: None,
            attachments: Vec::new(),
        })
    }

    /// An empty composer sharing this one's settings and collaborators
    pub fn fresh(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            provider: Arc::clone(&self.provider),
            direct_sender: self.direct_sender.clone(),
            views: self.views.clone(),
            files: Arc::clone(&self.files),
            to: RecipientList::default(),
            from: None,
            subject: None,
            html_body: None,
            plain_text_body: None,
            attachments: Vec::new(),
        }
    }

    /// The recipients added so far
    pub fn recipients(&self) -> &RecipientList {
        &self.to
    }

    /// The subject, if set
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The HTML body, if set
    pub fn html_body(&self) -> Option<&str> {
        self.html_body.as_deref()
    }

    /// The plain text body, if set
    pub fn plain_text_body(&self) -> Option<&str> {
        self.plain_text_body.as_deref()
    }

    /// The attachments added so far
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Sets the subject
    pub fn set_subject(&mut self, subject: &str) -> &mut Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Sets the HTML body
    pub fn set_html_body(&mut self, body: &str) -> &mut Self {
        self.html_body = Some(body.to_string());
        self
    }

    /// Sets the plain text body
    pub fn set_plain_text_body(&mut self, body: &str) -> &mut Self {
        self.plain_text_body = Some(body.to_string());
        self
    }

    /// Replaces every recipient with a single one
    pub fn set_to(&mut self, email: &str, name: Option<&str>) -> &mut Self {
        self.to.set(email, name);
        self
    }

    /// Adds a recipient
    pub fn add_to(&mut self, email: &str, name: Option<&str>) -> &mut Self {
        self.to.add(email, name);
        self
    }

    /// Sets the sender
    pub fn set_from(&mut self, email: &str, name: Option<&str>) -> &mut Self {
        self.from = Some(format_address(email, name));
        self
    }

    /// Renders both bodies from views under the configured view root.
    ///
    /// A failed HTML render leaves the HTML body empty. Without a plain text
    /// view, or when it fails to render, the plain text body is the HTML body
    /// with its tags stripped.
    pub fn compose_from_views(&mut self, views: &ViewSelector, params: &Value) -> &mut Self {
        let html = self.render_view(&views.html, params).unwrap_or_default();

        let plain = views
            .text
            .as_deref()
            .and_then(|text| self.render_view(text, params))
            .unwrap_or_else(|| strip_tags(&html));

        self.html_body = Some(html);
        self.plain_text_body = Some(plain);
        self
    }

    fn render_view(&self, view: &str, params: &Value) -> Option<String> {
        let (Some(renderer), Some(root)) = (&self.views, &self.settings.view_root) else {
            warn!(view, "view rendering is disabled");
            return None;
        };

        let path = format!("{root}/{view}");

        match renderer.render(&path, params) {
            Ok(rendered) => Some(rendered),
            Err(e) => {
                warn!(path, error = %e, "could not render view");
                None
            }
        }
    }

    /// Attaches a file and removes it from disk.
    ///
    /// The source file is deleted as soon as its contents are read, whether or
    /// not the message is sent later.
    ///
    /// # Returns
    /// - [`Ok`] with the composer.
    /// - [`Err`] with an [`AttachmentError`] if the file could not be read; it is left in place.
    pub async fn add_attachment(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        mime_type: &str,
    ) -> Result<&mut Self, AttachmentError> {
        let path = path.as_ref();

        let content = self
            .files
            .read_bytes(path)
            .await
            .map_err(|source| AttachmentError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(name, size = content.len(), "attachment added");

        self.attachments.push(Attachment {
            name: name.to_string(),
            content,
            content_type: mime_type.to_string(),
        });

        if let Err(e) = self.files.delete(path).await {
            warn!(?path, error = %e, "could not delete attachment source");
        }

        Ok(self)
    }

    /// Sends the message.
    ///
    /// Never fails: every error is logged and reported as `false`.
    pub async fn send(&self) -> bool {
        match self.try_send().await {
            Ok(receipt) => {
                info!(message_id = ?receipt.message_id, "email sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "email failed to send");
                false
            }
        }
    }

    /// Sends the message, keeping the reason it failed.
    ///
    /// # Returns
    /// - [`Ok`] with the [`DeliveryReceipt`] if the provider accepted the message.
    /// - [`Err`] with a [`MessageError`] otherwise.
    pub async fn try_send(&self) -> Result<DeliveryReceipt, MessageError> {
        self.validate()?;

        let mut email = self.outbound_email();
        let policy = &self.settings.policy;

        if policy.is_error_report(&self.to) {
            if let (true, Some(direct)) = (
                self.settings.capabilities.direct_send_for_errors,
                &self.direct_sender,
            ) {
                debug!(to = %email.to, "sending error report directly");
                return accepted(direct.send_email(&email).await?);
            }

            debug!(to = %email.to, "sending error report");
            return accepted(self.provider.send_email(&email).await?);
        }

        if !policy.receives_real_mail() {
            debug!(original = %email.to, "redirecting to the safe address");

            email.to = policy.safe_address.formatted();
            email.subject = format!("{}{}", policy.subject_prefix(), email.subject);
        }

        accepted(self.provider.send_email(&email).await?)
    }

    /// Copies recipients, sender and subject from `description`, then sends.
    pub async fn send_auto(&mut self, description: &MessageDescription) -> bool {
        if let Err(e) = self.apply_envelope(description) {
            warn!(error = %e, "email failed to send");
            return false;
        }

        self.send().await
    }

    /// Sends each message on a fresh composer and counts the successes.
    ///
    /// A failing message does not stop the batch.
    pub async fn send_multiple(&self, descriptions: &[MessageDescription]) -> usize {
        let mut sent = 0;

        for description in descriptions {
            let mut composer = self.fresh();

            if let Err(e) = composer.populate(description).await {
                warn!(error = %e, "could not compose message");
                continue;
            }

            if composer.send().await {
                sent += 1;
            }
        }

        debug!(sent, total = descriptions.len(), "batch finished");

        sent
    }

    /// Fills every field `description` carries
    pub async fn populate(&mut self, description: &MessageDescription) -> Result<(), MessageError> {
        self.apply_envelope(description)?;

        if let Some(views) = &description.views {
            self.compose_from_views(views, &description.params);
        }

        if let Some(html) = &description.html_body {
            self.set_html_body(html);
        }

        if let Some(plain) = &description.text_body {
            self.set_plain_text_body(plain);
        }

        for attachment in &description.attachments {
            self.add_attachment(&attachment.name, &attachment.path, &attachment.mime_type)
                .await?;
        }

        Ok(())
    }

    fn apply_envelope(&mut self, description: &MessageDescription) -> Result<(), MessageError> {
        if description.from.len() > 1 {
            return Err(MessageError::UnsupportedFormat(
                "only a single sender is supported".to_string(),
            ));
        }

        if let Some((first, rest)) = description.to.split_first() {
            self.set_to(&first.email, first.name.as_deref());

            for mailbox in rest {
                self.add_to(&mailbox.email, mailbox.name.as_deref());
            }
        }

        if let Some(sender) = description.from.first() {
            self.set_from(&sender.email, sender.name.as_deref());
        }

        if let Some(subject) = &description.subject {
            self.set_subject(subject);
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), MessageError> {
        if self.to.is_empty() {
            return Err(MessageError::Validation(MessageField::To));
        }

        if is_blank(&self.subject) {
            return Err(MessageError::Validation(MessageField::Subject));
        }

        if is_blank(&self.html_body) && is_blank(&self.plain_text_body) {
            return Err(MessageError::Validation(MessageField::Body));
        }

        Ok(())
    }

    fn outbound_email(&self) -> OutboundEmail {
        OutboundEmail {
            from: self.from.clone(),
            to: self.to.serialize(),
            subject: self.subject.clone().unwrap_or_default(),
            html_body: self.html_body.clone().filter(|body| !body.is_empty()),
            text_body: self.plain_text_body.clone().filter(|body| !body.is_empty()),
            track_opens: true,
            attachments: self.attachments.clone(),
            ..Default::default()
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn accepted(receipt: DeliveryReceipt) -> Result<DeliveryReceipt, MessageError> {
    if receipt.is_success() {
        Ok(receipt)
    } else {
        Err(MessageError::NotAccepted {
            error_code: receipt.error_code,
            message: receipt.message,
        })
    }
}

impl<P, D, V, F> fmt::Debug for MessageComposer<P, D, V, F>
where
    P: EmailProvider,
    D: EmailProvider,
    V: ViewRenderer,
    F: FileStore,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageComposer")
            .field("capabilities", &self.settings.capabilities)
            .field("to", &self.to)
            .field("from", &self.from)
            .field("subject", &self.subject)
            .field("attachments", &self.attachments.len())
            .finish()
    }
}
