//! Postmark backed composer wiring

use std::sync::Arc;

use crate::domain::communication::{
    Collaborators, ConfigurationError, MailerSettings, MessageComposer,
};

use super::{
    email::{
        postmark::{PostmarkClient, PostmarkConfig},
        smtp::{SMTPConfig, SMTPMailer},
    },
    files::LocalFileStore,
    views::TemplateRegistry,
};

/// Composer sending through Postmark, with SMTP for error reports
pub type PostmarkMailer = MessageComposer<PostmarkClient, SMTPMailer, TemplateRegistry, LocalFileStore>;

/// Builds a [`PostmarkMailer`] from configuration.
///
/// # Arguments
/// * `settings` - The mailer settings.
/// * `postmark` - The Postmark client configuration.
/// * `views` - The views to render bodies from; the bundled templates are used when absent.
/// * `smtp` - The SMTP configuration for sending error reports directly.
///
/// # Returns
/// A [`Result`] which is [`Ok`] containing the mailer, or an [`Err`] containing a
/// [`ConfigurationError`] if a setting or collaborator is missing.
pub fn build_postmark_mailer(
    settings: &MailerSettings,
    postmark: &PostmarkConfig,
    views: Option<TemplateRegistry>,
    smtp: Option<SMTPConfig>,
) -> Result<PostmarkMailer, ConfigurationError> {
    let resolved = settings.resolve()?;

    let provider = PostmarkClient::new(&resolved.provider_credential, postmark)
        .map_err(|e| ConfigurationError::UnknownError(e.into()))?;

    let views = match (views, resolved.view_root.as_deref()) {
        (Some(views), _) => Some(views),
        (None, Some(root)) => Some(TemplateRegistry::with_bundled_templates(root)),
        (None, None) => None,
    };

    MessageComposer::new(
        settings,
        Collaborators {
            provider: Arc::new(provider),
            direct_sender: smtp.map(|config| Arc::new(SMTPMailer::new(config))),
            views: views.map(Arc::new),
            files: Arc::new(LocalFileStore),
        },
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::domain::communication::{tests::staging_settings, ViewSelector};

    use super::*;

    #[test]
    fn test_build_with_bundled_templates() -> TestResult {
        let mut mailer =
            build_postmark_mailer(&staging_settings(), &PostmarkConfig::default(), None, None)?;

        mailer.compose_from_views(
            &ViewSelector::html("error_report.html").with_text("error_report.txt"),
            &json!({
                "summary": "Worker crashed",
                "environment": "staging",
                "details": "at main.rs:10"
            }),
        );

        assert!(mailer.html_body().is_some_and(|html| html.contains("Worker crashed")));
        assert!(mailer
            .plain_text_body()
            .is_some_and(|text| text.contains("Environment: staging")));

        Ok(())
    }

    #[tokio::test]
    async fn test_attachment_source_is_removed() -> TestResult {
        let path = std::env::temp_dir().join(format!("postmark-mailer-{}-a.pdf", std::process::id()));
        tokio::fs::write(&path, b"%PDF-1.7").await?;

        let mut mailer =
            build_postmark_mailer(&staging_settings(), &PostmarkConfig::default(), None, None)?;

        mailer
            .add_attachment("file.pdf", &path, "application/pdf")
            .await?;

        assert!(!path.exists());
        assert_eq!(mailer.attachments()[0].content, b"%PDF-1.7".to_vec());

        Ok(())
    }

    #[test]
    fn test_direct_send_needs_smtp() {
        let settings = MailerSettings {
            direct_send_for_errors: true,
            ..staging_settings()
        };

        let result = build_postmark_mailer(&settings, &PostmarkConfig::default(), None, None);

        assert!(matches!(
            result,
            Err(ConfigurationError::MissingCollaborator("direct_send_for_errors"))
        ));
    }

    #[test]
    fn test_missing_credential() {
        let settings = MailerSettings {
            provider_credential: None,
            ..staging_settings()
        };

        let result = build_postmark_mailer(&settings, &PostmarkConfig::default(), None, None);

        assert!(matches!(
            result,
            Err(ConfigurationError::Missing("provider_credential"))
        ));
    }
}
