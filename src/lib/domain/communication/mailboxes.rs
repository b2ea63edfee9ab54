//! Mailboxes and recipient lists

use serde::Deserialize;

/// Separator between entries of a formatted address list
pub const ADDRESS_SEPARATOR: char = ',';

/// A single email address with an optional display name
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Mailbox {
    /// The email address
    pub email: String,

    /// The display name
    #[serde(default)]
    pub name: Option<String>,
}

impl Mailbox {
    /// Create a new mailbox
    pub fn new(email: &str, name: Option<&str>) -> Self {
        Self {
            email: email.to_string(),
            name: name.map(str::to_string),
        }
    }

    /// Formats the mailbox for the provider's address list.
    ///
    /// Commas are stripped from the name and a named mailbox always carries a
    /// trailing separator, e.g. `Jane Doe <jane@example.com>,`. A mailbox
    /// without a name is the bare address.
    pub fn formatted(&self) -> String {
        format_address(&self.email, self.name.as_deref())
    }
}

/// Formats an address the way the provider expects it in `To` / `From`.
pub fn format_address(email: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => {
            let name = name.replace(ADDRESS_SEPARATOR, "");
            format!("{name} <{email}>{ADDRESS_SEPARATOR}")
        }
        None => email.to_string(),
    }
}

/// Ordered list of formatted recipients
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipientList(Vec<String>);

impl RecipientList {
    /// Replaces every recipient with a single one
    pub fn set(&mut self, email: &str, name: Option<&str>) {
        self.0 = vec![format_address(email, name)];
    }

    /// Appends a recipient, keeping the ones already present
    pub fn add(&mut self, email: &str, name: Option<&str>) {
        self.0.push(format_address(email, name));
    }

    /// Returns true if there are no recipients
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recipients
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The formatted entries in insertion order
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    /// Returns true if the serialized list holds exactly one address and it contains `address`.
    ///
    /// Addresses are counted after serializing, so a single entry such as
    /// `a@example.com,b@example.com` counts as two.
    pub fn is_sole(&self, address: &str) -> bool {
        let serialized = self.serialize();
        let trimmed = serialized.trim_matches(ADDRESS_SEPARATOR);

        !trimmed.is_empty()
            && trimmed.split(ADDRESS_SEPARATOR).count() == 1
            && trimmed.contains(address)
    }

    /// Serializes the list into the provider's address list string.
    ///
    /// Named entries already end with the separator, so one is only inserted
    /// after bare addresses.
    pub fn serialize(&self) -> String {
        let mut out = String::new();

        for entry in &self.0 {
            if !out.is_empty() && !out.ends_with(ADDRESS_SEPARATOR) {
                out.push(ADDRESS_SEPARATOR);
            }
            out.push_str(entry);
        }

        out
    }
}
