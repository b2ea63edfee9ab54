//! Environment policy: who actually receives mail

use std::collections::HashSet;

use super::mailboxes::{Mailbox, RecipientList};

/// Decides whether live recipients are kept or replaced by the safe mailbox
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentPolicy {
    /// Address error reports are sent to
    pub error_address: String,

    /// Mailbox receiving all mail outside production
    pub safe_address: Mailbox,

    /// The running environment; `None` disables redirection
    pub current_environment: Option<String>,

    /// Environments that deliver to real recipients
    pub production_environments: HashSet<String>,
}

impl EnvironmentPolicy {
    /// Returns true if mail goes to its real recipients in this environment
    pub fn receives_real_mail(&self) -> bool {
        match &self.current_environment {
            Some(environment) => self.production_environments.contains(environment),
            None => true,
        }
    }

    /// Returns true if the recipients are exactly the error report address
    pub fn is_error_report(&self, recipients: &RecipientList) -> bool {
        recipients.is_sole(&self.error_address)
    }

    /// Subject prefix marking redirected mail, e.g. `[staging] `
    pub fn subject_prefix(&self) -> String {
        match &self.current_environment {
            Some(environment) => format!("[{environment}] "),
            None => String::new(),
        }
    }
}
