//! Recipient resolution.
//!
//! A send can be addressed either to a bare email address or to any value
//! that knows its own address (a user account, a contact record, ...). Both
//! are normalized into a [`ResolvedRecipient`] before anything else happens.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MailerError, Result};

/// Something that can receive email.
///
/// Only `email` is required; `name` falls back to the address and `id` is
/// carried through to the send result for persistence.
pub trait Addressee: Send + Sync {
    /// The address to deliver to. `None` makes the recipient invalid.
    fn email(&self) -> Option<String>;

    /// Display name for the `To:` header
    fn name(&self) -> Option<String> {
        None
    }

    /// Identifier recorded alongside the sent email
    fn id(&self) -> Option<String> {
        None
    }
}

/// The "to" side of a send.
#[derive(Clone)]
pub enum Recipient {
    /// A raw email address, also used as the display name
    Address(String),
    /// A value exposing its own address, name and identifier
    Principal(Arc<dyn Addressee>),
}

impl Recipient {
    pub fn principal(addressee: impl Addressee + 'static) -> Self {
        Recipient::Principal(Arc::new(addressee))
    }
}

impl fmt::Debug for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Address(address) => f.debug_tuple("Address").field(address).finish(),
            Recipient::Principal(principal) => f
                .debug_struct("Principal")
                .field("email", &principal.email())
                .field("id", &principal.id())
                .finish(),
        }
    }
}

impl From<&str> for Recipient {
    fn from(address: &str) -> Self {
        Recipient::Address(address.to_string())
    }
}

impl From<String> for Recipient {
    fn from(address: String) -> Self {
        Recipient::Address(address)
    }
}

/// A concrete recipient: where to send, what to call them, and who they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRecipient {
    pub email: String,
    pub name: String,
    pub id: Option<String>,
}

/// A plain contact record, handy when the caller has no user type of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl Contact {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Addressee for Contact {
    fn email(&self) -> Option<String> {
        Some(self.email.clone())
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn id(&self) -> Option<String> {
        self.id.clone()
    }
}

/// Normalize a [`Recipient`] into address, display name and identifier.
///
/// Blank addresses are rejected with `InvalidRecipient`; a blank or missing
/// name falls back to the address.
pub fn resolve(recipient: &Recipient) -> Result<ResolvedRecipient> {
    match recipient {
        Recipient::Address(address) => {
            let email = non_blank(Some(address.clone())).ok_or_else(|| {
                MailerError::InvalidRecipient("empty email address".to_string())
            })?;
            Ok(ResolvedRecipient {
                name: email.clone(),
                email,
                id: None,
            })
        }
        Recipient::Principal(principal) => {
            let email = non_blank(principal.email()).ok_or_else(|| {
                MailerError::InvalidRecipient(
                    "recipient does not expose an email address".to_string(),
                )
            })?;
            let name = non_blank(principal.name()).unwrap_or_else(|| email.clone());
            Ok(ResolvedRecipient {
                email,
                name,
                id: principal.id(),
            })
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        email: Option<String>,
    }

    impl Addressee for Account {
        fn email(&self) -> Option<String> {
            self.email.clone()
        }
    }

    #[test]
    fn test_resolve_plain_address() {
        let resolved = resolve(&Recipient::from("a@b.com")).unwrap();
        assert_eq!(resolved.email, "a@b.com");
        assert_eq!(resolved.name, "a@b.com");
        assert_eq!(resolved.id, None);
    }

    #[test]
    fn test_resolve_principal_with_name() {
        let recipient = Recipient::principal(Contact::new("a@b.com").with_name("Al"));
        let resolved = resolve(&recipient).unwrap();
        assert_eq!(resolved.email, "a@b.com");
        assert_eq!(resolved.name, "Al");
        assert_eq!(resolved.id, None);
    }

    #[test]
    fn test_resolve_principal_with_id() {
        let recipient = Recipient::principal(Contact::new("a@b.com").with_id("42"));
        let resolved = resolve(&recipient).unwrap();
        assert_eq!(resolved.name, "a@b.com");
        assert_eq!(resolved.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_principal_without_optional_accessors() {
        let recipient = Recipient::principal(Account {
            email: Some("user@example.com".to_string()),
        });
        let resolved = resolve(&recipient).unwrap();
        assert_eq!(resolved.name, "user@example.com");
        assert_eq!(resolved.id, None);
    }

    #[test]
    fn test_blank_name_falls_back_to_address() {
        let recipient = Recipient::principal(Contact::new("a@b.com").with_name("  "));
        assert_eq!(resolve(&recipient).unwrap().name, "a@b.com");
    }

    #[test]
    fn test_principal_without_email_is_invalid() {
        let recipient = Recipient::principal(Account { email: None });
        assert!(matches!(
            resolve(&recipient),
            Err(MailerError::InvalidRecipient(_))
        ));
    }

    #[test]
    fn test_blank_address_is_invalid() {
        assert!(matches!(
            resolve(&Recipient::from("")),
            Err(MailerError::InvalidRecipient(_))
        ));
    }
}
