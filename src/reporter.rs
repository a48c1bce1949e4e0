use core::fmt;
use std::{
    io::{self, Write},
    sync::{Arc as StdArc, Mutex, PoisonError},
};

use indexmap::IndexSet;
use triomphe::Arc;

use crate::{
    callsite::{self, CallSite},
    dispatch::Dispatch,
    dump::{self, Dump},
    email::{Address, Email, EmailSender},
    sink::{self, LogSink},
    sql::{self, SqlParam},
};

/// Subject of error reports.
pub const ERROR_SUBJECT: &str = "!!! Error !!!";

/// Subject of failed-statement reports.
pub const SQL_SUBJECT: &str = "!!! SQL problem !!!";

const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

fn timestamp() -> impl fmt::Display {
    chrono::Local::now().format(TIMESTAMP_FORMAT)
}

/// Reports errors and failed statements to the console, a mailing list and
/// an optional log sink.
///
/// Cloning is cheap; clones share one configuration. Every reporting method
/// is `#[track_caller]` and records the line that called it.
///
/// # Examples
///
/// ```rust
/// use reportkit::{Reporter, email::Address, sink::WriterSink};
///
/// # fn mailer(_: &reportkit::email::Email) -> Result<(), reportkit::email::SendError> { Ok(()) }
/// let reporter = Reporter::builder("billing")
///     .email(
///         mailer,
///         Address::with_name("Billing", "billing@example.com"),
///         [Address::new("oncall@example.com")],
///     )
///     .log_sink(WriterSink::new(std::io::sink()))
///     .build();
///
/// reporter.sql("SELECT * FROM invoices WHERE id = ?", &[&42]);
/// ```
#[derive(Clone)]
pub struct Reporter {
    inner: Arc<Inner>,
}

struct Inner {
    app_name: String,
    email: Option<EmailConfig>,
    log_sink: Option<Box<dyn LogSink>>,
    console: Console,
}

struct EmailConfig {
    sender: Box<dyn EmailSender>,
    from: Address,
    to: IndexSet<Address>,
}

enum Console {
    Stdout,
    Writer(Mutex<Box<dyn Write + Send>>),
}

impl Console {
    /// Writes `block` with a single `write_all`, so blocks from concurrent
    /// reports never interleave.
    fn write_block(&self, block: &str) {
        let result = match self {
            Console::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(block.as_bytes())
                    .and_then(|()| stdout.flush())
            }
            Console::Writer(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                writer
                    .write_all(block.as_bytes())
                    .and_then(|()| writer.flush())
            }
        };
        if let Err(error) = result {
            tracing::debug!(target: "reportkit", %error, "failed to write report to console");
        }
    }
}

/// Builder for [`Reporter`].
///
/// Without [`email`](Self::email) reports are not mailed; without
/// [`log_sink`](Self::log_sink) they are not logged. They are always written
/// to the console.
pub struct ReporterBuilder {
    app_name: String,
    email: Option<EmailConfig>,
    log_sink: Option<Box<dyn LogSink>>,
    console: Console,
}

impl ReporterBuilder {
    /// Mails reports through `sender`, from `from` to every address in `to`.
    ///
    /// Duplicate recipients are dropped; the order of first appearance is
    /// kept.
    pub fn email<S: EmailSender>(
        mut self,
        sender: S,
        from: Address,
        to: impl IntoIterator<Item = Address>,
    ) -> Self {
        self.email = Some(EmailConfig {
            sender: Box::new(sender),
            from,
            to: to.into_iter().collect(),
        });
        self
    }

    /// Appends every dispatched report to `sink`.
    pub fn log_sink<L: LogSink>(mut self, sink: L) -> Self {
        self.log_sink = Some(Box::new(sink));
        self
    }

    /// Writes console output to `writer` instead of standard output.
    pub fn console<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.console = Console::Writer(Mutex::new(Box::new(writer)));
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> Reporter {
        Reporter {
            inner: Arc::new(Inner {
                app_name: self.app_name,
                email: self.email,
                log_sink: self.log_sink,
                console: self.console,
            }),
        }
    }
}

impl Reporter {
    /// Starts configuring a reporter.
    ///
    /// `app_name` selects the frames returned by
    /// [`call_sites`](Self::call_sites): those whose path contains
    /// `/<app_name>/`.
    pub fn builder(app_name: impl Into<String>) -> ReporterBuilder {
        ReporterBuilder {
            app_name: app_name.into(),
            email: None,
            log_sink: None,
            console: Console::Stdout,
        }
    }

    /// Creates a reporter that mails `to` through `sender` and logs nowhere.
    pub fn new<S: EmailSender>(
        app_name: impl Into<String>,
        sender: S,
        from: Address,
        to: impl IntoIterator<Item = Address>,
    ) -> Self {
        Self::builder(app_name).email(sender, from, to).build()
    }

    /// The configured application name.
    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    /// The configured recipients, in order.
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.inner.email.iter().flat_map(|email| email.to.iter())
    }

    /// Prints a timestamped message and mails it with `subject`.
    ///
    /// An empty `body` is replaced by the subject. The message also goes to
    /// the log sink. Unlike [`error`](Self::error), this waits until
    /// delivery has finished.
    pub fn message(&self, subject: &str, body: &str) {
        let body = if body.is_empty() { subject } else { body };
        let text = format!("{}\n{body}\n\n", timestamp());
        self.inner.console.write_block(&text);
        self.dispatch(subject, text, false).wait();
    }

    /// Prints a statement with its parameters written in, for debugging.
    ///
    /// Nothing is mailed or logged.
    #[track_caller]
    pub fn sql(&self, query: &str, params: &[&dyn SqlParam]) {
        let site = CallSite::caller();
        self.print_sql(&site, query, params);
    }

    /// Reports a failed statement.
    ///
    /// Without an error this is [`sql`](Self::sql). Otherwise the report
    /// (timestamp, call site, error, statement, dump of `context`) is printed
    /// and dispatched with the subject [`SQL_SUBJECT`] and the limiter flag
    /// set.
    #[track_caller]
    pub fn sql_error<C: Dump + ?Sized>(
        &self,
        context: &C,
        err: Option<&dyn fmt::Display>,
        query: &str,
        params: &[&dyn SqlParam],
    ) -> Dispatch {
        let site = CallSite::caller();
        let Some(err) = err else {
            self.print_sql(&site, query, params);
            return Dispatch::none();
        };

        let statement = sql::inline(query, params);
        let text = compose(&site, err, Some(&statement), &dump::dump(context, ""));
        self.inner.console.write_block(&format!("\n{text}"));
        self.dispatch(SQL_SUBJECT, text, true)
    }

    /// Reports an error.
    ///
    /// The report (timestamp, call site, error, dump of `context`) is printed
    /// and dispatched with the subject [`ERROR_SUBJECT`] and the limiter flag
    /// set. Pass `&()` when there is no context.
    #[track_caller]
    pub fn error<C: Dump + ?Sized, E: fmt::Display + ?Sized>(
        &self,
        context: &C,
        err: &E,
    ) -> Dispatch {
        let site = CallSite::caller();
        let text = compose(&site, &err, None, &dump::dump(context, ""));
        self.inner.console.write_block(&format!("\n{text}"));
        self.dispatch(ERROR_SUBJECT, text, true)
    }

    /// The location of the caller.
    #[track_caller]
    #[must_use]
    pub fn call_site(&self) -> CallSite {
        CallSite::caller()
    }

    /// Every frame on the current stack that belongs to the application,
    /// innermost first, as `file:line`.
    #[must_use]
    pub fn call_sites(&self) -> Vec<String> {
        callsite::locate_all(&self.inner.app_name)
    }

    fn print_sql(&self, site: &CallSite, query: &str, params: &[&dyn SqlParam]) {
        let statement = sql::inline(query, params);
        self.inner
            .console
            .write_block(&format!("\n{site}\n{statement}\n"));
    }

    fn dispatch(&self, subject: &str, text: String, with_limiter: bool) -> Dispatch {
        let mut dispatch = Dispatch::none();
        let text: StdArc<str> = text.into();

        if self.inner.email.is_some() {
            let inner = Arc::clone(&self.inner);
            let subject = subject.to_string();
            let text = StdArc::clone(&text);
            dispatch.spawn("email", move || inner.send_email(subject, &text, with_limiter));
        }
        if self.inner.log_sink.is_some() {
            let inner = Arc::clone(&self.inner);
            let text = StdArc::clone(&text);
            dispatch.spawn("log", move || inner.write_log(&text));
        }

        tracing::debug!(
            target: "reportkit",
            subject,
            jobs = dispatch.job_count(),
            "report dispatched"
        );
        dispatch
    }
}

impl Inner {
    fn send_email(&self, subject: String, body: &str, with_limiter: bool) {
        let Some(config) = &self.email else {
            return;
        };
        let email = Email {
            from: config.from.clone(),
            to: config.to.iter().cloned().collect(),
            subject,
            body: body.to_string(),
            with_limiter,
        };

        if let Err(error) = config.sender.send(&email) {
            tracing::warn!(
                target: "reportkit",
                subject = %email.subject,
                %error,
                "email delivery failed"
            );
            self.write_log(&format!(
                "{}\nemail delivery failed ({}): {error}\n",
                timestamp(),
                email.subject
            ));
        }
    }

    fn write_log(&self, text: &str) {
        if let Some(sink) = &self.log_sink {
            sink.write_entry(&sink::frame_entry(text));
        }
    }
}

fn compose(
    site: &CallSite,
    err: &dyn fmt::Display,
    statement: Option<&str>,
    context: &str,
) -> String {
    match statement {
        Some(statement) => format!(
            "{}\n{site}\n{err}\n\n{statement}\n\n{context}",
            timestamp()
        ),
        None => format!("{}\n{site}\n{err}\n\n{context}", timestamp()),
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Reporter");
        debug.field("app_name", &self.inner.app_name);
        if let Some(email) = &self.inner.email {
            debug.field("from", &email.from).field("to", &email.to);
        }
        debug
            .field("log_sink", &self.inner.log_sink.is_some())
            .finish()
    }
}

impl fmt::Debug for ReporterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterBuilder")
            .field("app_name", &self.app_name)
            .field("email", &self.email.is_some())
            .field("log_sink", &self.log_sink.is_some())
            .finish()
    }
}

/// The reporting surface of [`Reporter`] as a trait, for code that wants to
/// swap in a test double.
pub trait ReportProvider: Send + Sync {
    /// See [`Reporter::message`].
    fn message(&self, subject: &str, body: &str);

    /// See [`Reporter::sql`].
    fn sql(&self, query: &str, params: &[&dyn SqlParam]);

    /// See [`Reporter::sql_error`].
    fn sql_error(
        &self,
        context: &dyn Dump,
        err: Option<&dyn fmt::Display>,
        query: &str,
        params: &[&dyn SqlParam],
    ) -> Dispatch;

    /// See [`Reporter::error`].
    fn error(&self, context: &dyn Dump, err: &dyn fmt::Display) -> Dispatch;

    /// See [`Reporter::call_site`].
    fn call_site(&self) -> CallSite;

    /// See [`Reporter::call_sites`].
    fn call_sites(&self) -> Vec<String>;
}

impl ReportProvider for Reporter {
    fn message(&self, subject: &str, body: &str) {
        Reporter::message(self, subject, body);
    }

    #[track_caller]
    fn sql(&self, query: &str, params: &[&dyn SqlParam]) {
        Reporter::sql(self, query, params);
    }

    #[track_caller]
    fn sql_error(
        &self,
        context: &dyn Dump,
        err: Option<&dyn fmt::Display>,
        query: &str,
        params: &[&dyn SqlParam],
    ) -> Dispatch {
        Reporter::sql_error(self, context, err, query, params)
    }

    #[track_caller]
    fn error(&self, context: &dyn Dump, err: &dyn fmt::Display) -> Dispatch {
        Reporter::error(self, context, err)
    }

    #[track_caller]
    fn call_site(&self) -> CallSite {
        Reporter::call_site(self)
    }

    fn call_sites(&self) -> Vec<String> {
        Reporter::call_sites(self)
    }
}
