//! Error types.
//!
//! [`ReportError`] is a small shared vocabulary for the code around the
//! reporter: lookups that find nothing, work cut short by a cancelled or
//! expired operation, and the generic internal failure shown to end users.
//! The reporter itself never returns these; reporting calls do not fail.

use thiserror::Error;

use crate::Reporter;

/// Common failure classes for request handling code.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq, Hash)]
pub enum ReportError {
    /// A lookup found nothing.
    #[error("not found")]
    NotFound,
    /// The surrounding operation was cancelled.
    #[error("context canceled")]
    Canceled,
    /// The surrounding operation ran past its deadline.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    /// Catch-all shown to end users instead of the real cause.
    #[error("internal server error")]
    Internal,
    /// The real cause has already been reported; callers should not report it
    /// again.
    #[error("error has been reported")]
    Reported,
}

/// Error returned when parsing an [`Address`](crate::email::Address).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// The input was empty.
    #[error("empty email address")]
    Empty,
    /// An opening `<` without a closing `>`.
    #[error("unterminated angle address in {0:?}")]
    Unterminated(String),
    /// The mailbox has no `@`.
    #[error("missing '@' in mailbox {0:?}")]
    MissingAt(String),
    /// The mailbox has an empty part or contains whitespace.
    #[error("invalid mailbox {0:?}")]
    InvalidMailbox(String),
}

/// Error returned when attempting to install a global reporter when one is
/// already installed. Contains the reporter that was not installed.
#[derive(Error)]
#[error("a global reporter is already installed")]
pub struct ReporterAlreadyInstalledError(pub Reporter);

impl core::fmt::Debug for ReporterAlreadyInstalledError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReporterAlreadyInstalledError").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ReportError::NotFound.to_string(), "not found");
        assert_eq!(ReportError::Canceled.to_string(), "context canceled");
        assert_eq!(
            ReportError::DeadlineExceeded.to_string(),
            "context deadline exceeded"
        );
        assert_eq!(ReportError::Internal.to_string(), "internal server error");
        assert_eq!(ReportError::Reported.to_string(), "error has been reported");
    }

    #[test]
    fn test_address_errors_name_the_input() {
        let err = AddressParseError::MissingAt("ops".to_string());
        assert_eq!(err.to_string(), "missing '@' in mailbox \"ops\"");
    }
}
