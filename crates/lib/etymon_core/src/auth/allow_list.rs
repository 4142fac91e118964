//! Admin allow-list.
//!
//! Built once from configuration and never mutated. An empty list admits no one.

use std::collections::HashSet;

/// Set of normalized admin email addresses.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: HashSet<String>,
}

impl AdminAllowList {
    /// Parse a comma-separated list of emails. Blank entries are skipped.
    pub fn from_csv(value: &str) -> Self {
        Self::from_emails(value.split(','))
    }

    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    /// Whether `email` belongs to an administrator.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = normalize_email(email);
        !email.is_empty() && self.emails.contains(&email)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Trim and lower-case an email for comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
