//! The global reporter and the `report_*!` macros.
//!
//! Everything runs in one test: the global slot is process wide and the
//! harness runs tests in parallel.

mod common;

use common::{Harness, strip_timestamp};
use reportkit::{
    ERROR_SUBJECT, Reporter, SQL_SUBJECT, global, report_error, report_message, report_sql,
    report_sql_error,
};

#[test]
fn test_macros_use_installed_reporter() {
    let harness = Harness::new();
    harness.reporter.clone().install().unwrap();
    assert!(global::is_installed());
    assert!(Reporter::builder("other").build().install().is_err());

    let err = std::io::Error::other("queue is full");
    let line = line!() + 1;
    report_error!(err).wait();
    let console = harness.console.contents();
    assert_eq!(
        strip_timestamp(console.strip_prefix('\n').unwrap()),
        format!("{}:{line}\nqueue is full\n\n", file!())
    );

    let line = line!() + 1;
    report_sql!("SELECT * FROM jobs WHERE queue = ? LIMIT ?", "mail", 10);
    assert!(
        harness.console.contents().ends_with(&format!(
            "\n{}:{line}\nSELECT * FROM jobs WHERE queue = 'mail' LIMIT 10\n",
            file!()
        ))
    );

    report_sql_error!((), Some(&err), "DELETE FROM jobs WHERE id = $1", 3).wait();
    report_sql_error!((), None, "SELECT 1").wait();
    report_message!("queue drained");

    let subjects: Vec<String> = harness
        .outbox
        .sent()
        .into_iter()
        .map(|email| email.subject)
        .collect();
    assert_eq!(subjects, [ERROR_SUBJECT, SQL_SUBJECT, "queue drained"]);
    assert!(
        harness
            .console
            .contents()
            .contains("\nDELETE FROM jobs WHERE id = 3\n\n")
    );

    let previous = Reporter::builder("replacement").build().replace().unwrap();
    assert_eq!(previous.app_name(), "reportkit");
    assert_eq!(global::current().app_name(), "replacement");

    Reporter::uninstall();
    assert!(!global::is_installed());
}
