/// Reports an error through the global reporter.
///
/// `report_error!(context, err)` is shorthand for
/// `reportkit::global::current().error(&context, &err)`. The call site in the
/// report is the line of the macro invocation. Returns the [`Dispatch`].
///
/// [`Dispatch`]: crate::Dispatch
///
/// # Examples
///
/// ```
/// use reportkit::report_error;
///
/// let err = std::io::Error::other("upstream closed the connection");
/// report_error!((), err).wait();
///
/// // Without a context object:
/// report_error!(err).detach();
/// ```
#[macro_export]
macro_rules! report_error {
    ($err:expr $(,)?) => {
        $crate::__private::current().error(&(), &$err)
    };
    ($context:expr, $err:expr $(,)?) => {
        $crate::__private::current().error(&$context, &$err)
    };
}

/// Prints a statement with its parameters written in, through the global
/// reporter.
///
/// # Examples
///
/// ```
/// use reportkit::report_sql;
///
/// let id = 42;
/// report_sql!("SELECT * FROM orders WHERE id = ? AND state = ?", id, "open");
/// ```
#[macro_export]
macro_rules! report_sql {
    ($query:expr $(, $param:expr)* $(,)?) => {
        $crate::__private::current().sql(
            $query,
            &[$(&$param as &dyn $crate::sql::SqlParam),*],
        )
    };
}

/// Reports a failed statement through the global reporter.
///
/// The error argument is an `Option`; with `None` this behaves like
/// [`report_sql!`]. Returns the [`Dispatch`].
///
/// [`Dispatch`]: crate::Dispatch
///
/// # Examples
///
/// ```
/// use reportkit::report_sql_error;
///
/// let err = std::io::Error::other("deadlock detected");
/// report_sql_error!((), Some(&err), "UPDATE stock SET qty = ? WHERE sku = ?", 3, "A-17").wait();
/// ```
#[macro_export]
macro_rules! report_sql_error {
    ($context:expr, $err:expr, $query:expr $(, $param:expr)* $(,)?) => {
        $crate::__private::current().sql_error(
            &$context,
            $err,
            $query,
            &[$(&$param as &dyn $crate::sql::SqlParam),*],
        )
    };
}

/// Prints and mails a message through the global reporter, waiting for
/// delivery.
///
/// # Examples
///
/// ```
/// use reportkit::report_message;
///
/// report_message!("nightly export finished");
/// report_message!("nightly export finished", "12 files, 3.4 GB");
/// ```
#[macro_export]
macro_rules! report_message {
    ($subject:expr $(,)?) => {
        $crate::__private::current().message($subject, "")
    };
    ($subject:expr, $body:expr $(,)?) => {
        $crate::__private::current().message($subject, $body)
    };
}
