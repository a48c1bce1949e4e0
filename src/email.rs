//! Email messages and the sender seam.
//!
//! The reporter does not speak SMTP. It hands an [`Email`] to whatever
//! [`EmailSender`] the application provides: an SMTP client, an HTTP mail
//! API, or a closure in tests.
//!
//! ```rust
//! use reportkit::email::{Address, Email, EmailSender, SendError};
//!
//! struct Outbox;
//!
//! impl EmailSender for Outbox {
//!     fn send(&self, email: &Email) -> Result<(), SendError> {
//!         println!("to {} recipient(s): {}", email.to.len(), email.subject);
//!         Ok(())
//!     }
//! }
//!
//! let from: Address = "Shop <shop@example.com>".parse().unwrap();
//! assert_eq!(from.name.as_deref(), Some("Shop"));
//! assert_eq!(from.to_string(), "Shop <shop@example.com>");
//! ```

use core::{fmt, str::FromStr};

use crate::error::AddressParseError;

/// Error returned by an [`EmailSender`].
pub type SendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A mailbox with an optional display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Display name, e.g. `Operations`.
    pub name: Option<String>,
    /// The mailbox, e.g. `ops@example.com`.
    pub email: String,
}

impl Address {
    /// Creates an address without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Creates an address with a display name.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }
}

/// Formats as `Name <box@host>`, or `box@host` without a name.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if needs_quoting(name) => {
                write!(f, "\"{}\" <{}>", name.replace('"', "\\\""), self.email)
            }
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

fn needs_quoting(name: &str) -> bool {
    name.chars()
        .any(|c| matches!(c, '"' | ',' | ';' | ':' | '<' | '>' | '@' | '(' | ')'))
}

/// Parses `Name <box@host>`, `"Quoted, Name" <box@host>`, `<box@host>` or a
/// bare `box@host`.
impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressParseError::Empty);
        }

        let (name, email) = match s.rfind('<') {
            Some(open) => {
                let rest = &s[open + 1..];
                let Some(inner) = rest.strip_suffix('>') else {
                    return Err(AddressParseError::Unterminated(s.to_string()));
                };
                let name = s[..open].trim();
                let name = name
                    .strip_prefix('"')
                    .and_then(|n| n.strip_suffix('"'))
                    .map_or_else(|| name.to_string(), |n| n.replace("\\\"", "\""));
                ((!name.is_empty()).then_some(name), inner.trim())
            }
            None => (None, s),
        };

        let Some((local, domain)) = email.split_once('@') else {
            return Err(AddressParseError::MissingAt(email.to_string()));
        };
        if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
            return Err(AddressParseError::InvalidMailbox(email.to_string()));
        }

        Ok(Self {
            name,
            email: email.to_string(),
        })
    }
}

impl TryFrom<&str> for Address {
    type Error = AddressParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A message ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    /// Sender address.
    pub from: Address,
    /// Recipients, in configuration order.
    pub to: Vec<Address>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Asks the transport to suppress duplicate or excessive sends.
    ///
    /// The policy lives in the transport; the reporter sets this for error
    /// reports and leaves it unset for plain messages.
    pub with_limiter: bool,
}

/// Delivers [`Email`]s.
///
/// Implementations are called from background threads and may block.
pub trait EmailSender: Send + Sync + 'static {
    /// Delivers `email`.
    fn send(&self, email: &Email) -> Result<(), SendError>;
}

impl<F> EmailSender for F
where
    F: Fn(&Email) -> Result<(), SendError> + Send + Sync + 'static,
{
    fn send(&self, email: &Email) -> Result<(), SendError> {
        self(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            "ops@example.com".parse::<Address>().unwrap(),
            Address::new("ops@example.com")
        );
        assert_eq!(
            "Ops Team <ops@example.com>".parse::<Address>().unwrap(),
            Address::with_name("Ops Team", "ops@example.com")
        );
        assert_eq!(
            "<ops@example.com>".parse::<Address>().unwrap(),
            Address::new("ops@example.com")
        );
        assert_eq!(
            "\"Doe, Jane\" <jane@example.com>".parse::<Address>().unwrap(),
            Address::with_name("Doe, Jane", "jane@example.com")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "".parse::<Address>(),
            Err(AddressParseError::Empty)
        ));
        assert!(matches!(
            "ops.example.com".parse::<Address>(),
            Err(AddressParseError::MissingAt(_))
        ));
        assert!(matches!(
            "Ops <ops@example.com".parse::<Address>(),
            Err(AddressParseError::Unterminated(_))
        ));
        assert!(matches!(
            "@example.com".parse::<Address>(),
            Err(AddressParseError::InvalidMailbox(_))
        ));
    }

    #[test]
    fn test_display_round_trips_names() {
        let plain = Address::with_name("Ops", "ops@example.com");
        assert_eq!(plain.to_string(), "Ops <ops@example.com>");

        let quoted = Address::with_name("Doe, Jane", "jane@example.com");
        assert_eq!(quoted.to_string(), "\"Doe, Jane\" <jane@example.com>");
        assert_eq!(quoted.to_string().parse::<Address>().unwrap(), quoted);
    }

    #[test]
    fn test_closure_sender() {
        let sender = |email: &Email| -> Result<(), SendError> {
            if email.with_limiter {
                Err("limited".into())
            } else {
                Ok(())
            }
        };
        let mut email = Email {
            from: Address::new("a@example.com"),
            to: vec![Address::new("b@example.com")],
            subject: "s".to_string(),
            body: "b".to_string(),
            with_limiter: false,
        };
        assert!(sender.send(&email).is_ok());
        email.with_limiter = true;
        assert_eq!(sender.send(&email).unwrap_err().to_string(), "limited");
    }
}
