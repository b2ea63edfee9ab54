//! Mailer settings

use std::collections::HashSet;

use clap::{ArgAction, Parser};

use super::{errors::ConfigurationError, mailboxes::Mailbox, policy::EnvironmentPolicy};

/// Display name given to the safe mailbox unless configured otherwise
pub const DEFAULT_SAFE_NAME: &str = "Safe Email Address";

/// Mailer configuration
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
pub struct MailerSettings {
    /// The provider server token
    #[arg(long, env = "POSTMARK_SERVER_TOKEN")]
    pub provider_credential: Option<String>,

    /// The address error reports are sent to
    #[arg(long, env = "MAIL_ERROR_ADDRESS")]
    pub error_email_address: Option<String>,

    /// The address receiving all mail outside production
    #[arg(long, env = "MAIL_SAFE_ADDRESS")]
    pub safe_email_address: Option<String>,

    /// Display name of the safe address
    #[arg(long, env = "MAIL_SAFE_NAME", default_value = DEFAULT_SAFE_NAME)]
    pub safe_email_name: Option<String>,

    /// Root of the views used to build message bodies
    #[arg(long, env = "MAIL_VIEW_PATH")]
    pub view_path: Option<String>,

    /// The running environment
    #[arg(long, env = "APP_ENV")]
    pub current_environment: Option<String>,

    /// Environments that deliver to real recipients
    #[arg(long, env = "MAIL_PRODUCTION_ENVIRONMENTS", value_delimiter = ',')]
    pub production_environments: Vec<String>,

    /// Render message bodies from views
    #[arg(long, env = "MAIL_VIEW_RENDERING", action = ArgAction::Set, default_value_t = true)]
    pub view_rendering: bool,

    /// Redirect mail to the safe address outside production
    #[arg(long, env = "MAIL_ENVIRONMENT_REDIRECTION", action = ArgAction::Set, default_value_t = true)]
    pub environment_redirection: bool,

    /// Send error reports through the direct sender instead of the provider
    #[arg(long, env = "MAIL_DIRECT_SEND_ERRORS", action = ArgAction::Set, default_value_t = false)]
    pub direct_send_for_errors: bool,
}

impl Default for MailerSettings {
    fn default() -> Self {
        Self {
            provider_credential: None,
            error_email_address: None,
            safe_email_address: None,
            safe_email_name: Some(DEFAULT_SAFE_NAME.to_string()),
            view_path: None,
            current_environment: None,
            production_environments: Vec::new(),
            view_rendering: true,
            environment_redirection: true,
            direct_send_for_errors: false,
        }
    }
}

/// Optional behaviours of the composer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Bodies can be rendered from views
    pub view_rendering: bool,

    /// Non-production mail goes to the safe address
    pub environment_redirection: bool,

    /// Error reports bypass the provider
    pub direct_send_for_errors: bool,
}

/// Settings checked for completeness
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// The provider server token
    pub provider_credential: String,

    /// Who receives what
    pub policy: EnvironmentPolicy,

    /// Root of the views, when view rendering is enabled
    pub view_root: Option<String>,

    /// Enabled behaviours
    pub capabilities: Capabilities,
}

impl MailerSettings {
    /// Enabled behaviours
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            view_rendering: self.view_rendering,
            environment_redirection: self.environment_redirection,
            direct_send_for_errors: self.direct_send_for_errors,
        }
    }

    /// Checks that every setting the enabled behaviours need is present.
    ///
    /// # Returns
    /// - [`Ok`] with the [`ResolvedSettings`].
    /// - [`Err`] with [`ConfigurationError::Missing`] naming the first absent setting.
    pub fn resolve(&self) -> Result<ResolvedSettings, ConfigurationError> {
        let capabilities = self.capabilities();

        let provider_credential = required(&self.provider_credential, "provider_credential")?;
        let error_address = required(&self.error_email_address, "error_email_address")?;
        let safe_address = required(&self.safe_email_address, "safe_email_address")?;

        let view_root = if capabilities.view_rendering {
            Some(required(&self.view_path, "view_path")?)
        } else {
            None
        };

        let (current_environment, production_environments) = if capabilities.environment_redirection {
            let environment = required(&self.current_environment, "current_environment")?;
            let production: HashSet<String> = self
                .production_environments
                .iter()
                .map(|environment| environment.trim())
                .filter(|environment| !environment.is_empty())
                .map(str::to_string)
                .collect();

            if production.is_empty() {
                return Err(ConfigurationError::Missing("production_environments"));
            }

            (Some(environment), production)
        } else {
            (None, HashSet::new())
        };

        let safe_name = self
            .safe_email_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        Ok(ResolvedSettings {
            provider_credential,
            policy: EnvironmentPolicy {
                error_address,
                safe_address: Mailbox::new(&safe_address, safe_name),
                current_environment,
                production_environments,
            },
            view_root,
            capabilities,
        })
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigurationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ConfigurationError::Missing(name))
}
