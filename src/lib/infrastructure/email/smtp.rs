//! SMTP direct sender

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clap::Parser;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, Mailboxes, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::domain::communication::{
    DeliveryReceipt, EmailProvider, OutboundEmail, ProviderError, ADDRESS_SEPARATOR,
};

/// SMTP configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SMTPConfig {
    /// The SMTP host
    #[clap(long, env = "SMTP_HOST")]
    pub host: String,

    /// The SMTP port
    #[clap(long, env = "SMTP_PORT", default_value = "587")]
    pub port: u16,

    /// The SMTP username
    #[clap(long, env = "SMTP_USER")]
    pub username: String,

    /// The SMTP password
    #[clap(long, env = "SMTP_PASSWORD")]
    pub password: String,

    /// The sender used when a message has none
    #[clap(long, env = "SMTP_SENDER")]
    pub sender: String,

    /// Verify the TLS certificate
    #[clap(long, env = "SMTP_VERIFY_TLS", default_value = "true")]
    pub verify_tls: bool,

    /// Enable STARTTLS (TLS upgrade on connection)
    #[clap(long, env = "SMTP_STARTTLS", default_value = "true")]
    pub starttls: bool,
}

/// SMTP mailer
#[derive(Debug, Default, Clone)]
pub struct SMTPMailer {
    config: SMTPConfig,
}

impl SMTPMailer {
    /// Create a new SMTP mailer
    pub fn new(config: SMTPConfig) -> Self {
        Self { config }
    }

    /// Builds the SMTP transport from the configuration
    pub fn mailer(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let relay = if self.config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)?
        };

        Ok(relay
            .credentials(creds)
            .port(self.config.port)
            .tls(self.tls()?)
            .build())
    }

    /// STARTTLS upgrades opportunistically, otherwise the connection is wrapped in TLS
    fn tls(&self) -> Result<Tls> {
        let parameters = TlsParameters::builder(self.config.host.to_string())
            .dangerous_accept_invalid_certs(!self.config.verify_tls)
            .build()?;

        if self.config.starttls {
            Ok(Tls::Opportunistic(parameters))
        } else {
            Ok(Tls::Wrapper(parameters))
        }
    }

    /// Builds the MIME message for `email`
    pub fn message(&self, email: &OutboundEmail) -> Result<Message> {
        let from: Mailbox = match email.from.as_deref().map(trim_separators) {
            Some(from) if !from.is_empty() => parse_mailbox(from)?,
            _ => parse_mailbox(&self.config.sender)?,
        };

        let to = parse_mailboxes(&email.to)?;

        let mut builder = Message::builder().from(from).subject(email.subject.clone());

        for mailbox in to {
            builder = builder.to(mailbox);
        }

        let body = MultiPart::alternative_plain_html(
            email.text_body.clone().unwrap_or_default(),
            email.html_body.clone().unwrap_or_default(),
        );

        if email.attachments.is_empty() {
            return Ok(builder.multipart(body)?);
        }

        let mut mixed = MultiPart::mixed().multipart(body);

        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| anyhow!("invalid content type {}: {e}", attachment.content_type))?;

            mixed = mixed.singlepart(
                Attachment::new(attachment.name.clone()).body(attachment.content.clone(), content_type),
            );
        }

        Ok(builder.multipart(mixed)?)
    }
}

fn trim_separators(value: &str) -> &str {
    value.trim().trim_matches(ADDRESS_SEPARATOR).trim()
}

/// Parses a formatted address list, tolerating the trailing separator of named entries
fn parse_mailboxes(list: &str) -> Result<Mailboxes> {
    let mut mailboxes = Mailboxes::new();

    for entry in list
        .split(ADDRESS_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
    {
        mailboxes.push(parse_mailbox(entry)?);
    }

    Ok(mailboxes)
}

/// Parses `Name <address>` or a bare address.
///
/// Only the address is handed to lettre's parser, so names holding
/// characters such as `(` or `;` are kept and quoted on output.
fn parse_mailbox(entry: &str) -> Result<Mailbox> {
    let entry = entry.trim();

    let (name, address) = match entry.strip_suffix('>').and_then(|rest| rest.rsplit_once('<')) {
        Some((name, address)) => (name.trim(), address.trim()),
        None => ("", entry),
    };

    let address = address
        .parse::<Address>()
        .map_err(|e| anyhow!("invalid address {address}: {e}"))?;

    let name = Some(name.to_string()).filter(|name| !name.is_empty());

    Ok(Mailbox::new(name, address))
}

#[async_trait]
impl EmailProvider for SMTPMailer {
    #[mutants::skip]
    async fn send_email(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, ProviderError> {
        let message = self.message(email)?;

        debug!(to = %email.to, host = %self.config.host, "sending email over SMTP");

        match self.mailer()?.send(message).await {
            Ok(_) => Ok(DeliveryReceipt::accepted(&email.to)),
            Err(e) => Err(ProviderError::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::communication::{format_address, Attachment as MessageAttachment};

    use super::*;

    fn mailer() -> SMTPMailer {
        SMTPMailer::new(SMTPConfig {
            host: "smtp.example.com".to_string(),
            sender: "Mailer <mailer@example.com>".to_string(),
            starttls: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_mailboxes_with_trailing_separators() -> TestResult {
        let mailboxes = parse_mailboxes("Jane Doe <jane@example.com>,john@example.com")?;

        let addresses: Vec<String> = mailboxes
            .iter()
            .map(|mailbox| mailbox.email.to_string())
            .collect();

        assert_eq!(addresses, vec!["jane@example.com", "john@example.com"]);

        Ok(())
    }

    #[test]
    fn test_message_falls_back_to_configured_sender() -> TestResult {
        let email = OutboundEmail {
            to: "Errors <errors@example.com>,".to_string(),
            subject: "Crash report".to_string(),
            text_body: Some("stack trace".to_string()),
            ..Default::default()
        };

        let formatted = String::from_utf8(mailer().message(&email)?.formatted())?;

        assert!(formatted.contains("From: Mailer <mailer@example.com>"));
        assert!(formatted.contains("To: Errors <errors@example.com>"));
        assert!(formatted.contains("Subject: Crash report"));

        Ok(())
    }

    #[test]
    fn test_message_with_attachment() -> TestResult {
        let email = OutboundEmail {
            from: Some("Ops <ops@example.com>,".to_string()),
            to: "errors@example.com".to_string(),
            subject: "Crash report".to_string(),
            html_body: Some("<pre>stack trace</pre>".to_string()),
            attachments: vec![MessageAttachment {
                name: "trace.log".to_string(),
                content: b"trace".to_vec(),
                content_type: "text/plain".to_string(),
            }],
            ..Default::default()
        };

        let formatted = String::from_utf8(mailer().message(&email)?.formatted())?;

        assert!(formatted.contains("From: Ops <ops@example.com>"));
        assert!(formatted.contains("multipart/mixed"));
        assert!(formatted.contains("filename=\"trace.log\""));

        Ok(())
    }

    #[test]
    fn test_parse_mailboxes_keeps_names_with_specials() -> TestResult {
        let list = format!(
            "{}{}",
            format_address("ops@example.com", Some("Ops (EU)")),
            format_address("jane@example.com", Some("Doe; Jane"))
        );

        let mailboxes: Vec<Mailbox> = parse_mailboxes(&list)?.into_iter().collect();

        assert_eq!(mailboxes.len(), 2);
        assert_eq!(mailboxes[0].name.as_deref(), Some("Ops (EU)"));
        assert_eq!(mailboxes[0].email.to_string(), "ops@example.com");
        assert_eq!(mailboxes[1].name.as_deref(), Some("Doe; Jane"));
        assert_eq!(mailboxes[1].email.to_string(), "jane@example.com");

        Ok(())
    }

    #[test]
    fn test_message_quotes_names_with_specials() -> TestResult {
        let email = OutboundEmail {
            from: Some(format_address("ops@example.com", Some("Ops (EU)"))),
            to: format_address("errors@example.com", Some("Errors: EU")),
            subject: "Crash report".to_string(),
            text_body: Some("stack trace".to_string()),
            ..Default::default()
        };

        let formatted = String::from_utf8(mailer().message(&email)?.formatted())?;

        assert!(formatted.contains("Ops (EU)"));
        assert!(formatted.contains("<ops@example.com>"));
        assert!(formatted.contains("Errors: EU"));
        assert!(formatted.contains("<errors@example.com>"));

        Ok(())
    }

    #[test]
    fn test_tls_mode_follows_starttls() -> TestResult {
        let starttls = mailer();
        let wrapped = SMTPMailer::new(SMTPConfig {
            starttls: false,
            ..starttls.config.clone()
        });

        assert!(matches!(starttls.tls()?, Tls::Opportunistic(_)));
        assert!(matches!(wrapped.tls()?, Tls::Wrapper(_)));

        Ok(())
    }

    #[test]
    fn test_invalid_recipient_is_an_error() {
        let email = OutboundEmail {
            to: "not an address".to_string(),
            subject: "Crash report".to_string(),
            ..Default::default()
        };

        assert!(mailer().message(&email).is_err());
    }
}
