//! The process-wide reporter.
//!
//! Libraries and handlers deep in a call graph rarely have a [`Reporter`] at
//! hand. Install one at startup and reach it through [`current`] or the
//! `report_*!` macros:
//!
//! ```rust
//! use reportkit::{Reporter, report_error};
//!
//! Reporter::builder("shop")
//!     .build()
//!     .install()
//!     .expect("failed to install reporter");
//!
//! let err = std::io::Error::other("inventory service unavailable");
//! report_error!((), err).wait();
//! ```
//!
//! Until a reporter is installed, [`current`] returns one that writes to the
//! console only.

use std::sync::OnceLock;

use crate::{Reporter, error::ReporterAlreadyInstalledError};

static REPORTER: spin::RwLock<Option<Reporter>> = spin::RwLock::new(None);

fn fallback() -> &'static Reporter {
    static FALLBACK: OnceLock<Reporter> = OnceLock::new();
    FALLBACK.get_or_init(|| Reporter::builder("").build())
}

/// Returns the installed reporter, or a console-only reporter when none is
/// installed.
pub fn current() -> Reporter {
    REPORTER
        .read()
        .as_ref()
        .unwrap_or_else(|| fallback())
        .clone()
}

/// Whether a reporter has been installed.
pub fn is_installed() -> bool {
    REPORTER.read().is_some()
}

impl Reporter {
    /// Installs this reporter globally.
    ///
    /// If a reporter is already installed, returns an error containing this
    /// one. See [`replace`](Self::replace) to swap unconditionally.
    pub fn install(self) -> Result<(), ReporterAlreadyInstalledError> {
        let mut slot = REPORTER.write();
        if slot.is_some() {
            return Err(ReporterAlreadyInstalledError(self));
        }
        tracing::debug!(target: "reportkit", app_name = self.app_name(), "reporter installed");
        *slot = Some(self);
        Ok(())
    }

    /// Installs this reporter globally, returning the one it replaced.
    pub fn replace(self) -> Option<Reporter> {
        tracing::debug!(target: "reportkit", app_name = self.app_name(), "reporter replaced");
        REPORTER.write().replace(self)
    }

    /// Removes the global reporter, returning it.
    pub fn uninstall() -> Option<Reporter> {
        REPORTER.write().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test owns the global slot; the harness runs tests in parallel.
    #[test]
    fn test_install_replace_uninstall() {
        assert!(!is_installed());
        assert_eq!(current().app_name(), "");

        Reporter::builder("first").build().install().unwrap();
        assert!(is_installed());
        assert_eq!(current().app_name(), "first");

        let rejected = Reporter::builder("second").build().install().unwrap_err();
        assert_eq!(rejected.0.app_name(), "second");
        assert_eq!(current().app_name(), "first");

        let previous = rejected.0.replace().unwrap();
        assert_eq!(previous.app_name(), "first");
        assert_eq!(current().app_name(), "second");

        assert_eq!(Reporter::uninstall().unwrap().app_name(), "second");
        assert!(!is_installed());
    }
}
