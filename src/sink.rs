//! Log sinks.
//!
//! A [`LogSink`] receives every report the reporter dispatches, plus a short
//! note when email delivery fails. Each entry arrives framed: the report text,
//! a line of [`SEPARATOR_WIDTH`] `—` characters, and a blank line, so a log
//! holding many reports stays easy to scan.
//!
//! [`WriterSink`] adapts any [`Write`] implementation, which covers plain
//! files and rotating appenders alike:
//!
//! ```rust
//! use reportkit::sink::{LogSink, WriterSink};
//!
//! let sink = WriterSink::new(Vec::new());
//! sink.write_entry("disk almost full\n");
//! let written = String::from_utf8(sink.into_inner()).unwrap();
//! assert_eq!(written, "disk almost full\n");
//! ```

use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

/// Width of the separator line written after every log entry.
pub const SEPARATOR_WIDTH: usize = 70;

/// Receives formatted report entries.
///
/// Writing is best effort: sinks swallow their own I/O failures.
pub trait LogSink: Send + Sync + 'static {
    /// Appends one entry.
    fn write_entry(&self, entry: &str);
}

/// Frames `text` as a log entry: newline terminated, then a separator line and
/// a blank line.
pub(crate) fn frame_entry(text: &str) -> String {
    let mut entry = String::with_capacity(text.len() + SEPARATOR_WIDTH * 3 + 3);
    entry.push_str(text);
    if !text.ends_with('\n') {
        entry.push('\n');
    }
    entry.extend(std::iter::repeat_n('—', SEPARATOR_WIDTH));
    entry.push_str("\n\n");
    entry
}

/// A [`LogSink`] writing to any [`Write`] implementation.
///
/// Each entry is written with a single `write_all` under a lock, followed by
/// a flush.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send + 'static> WriterSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn try_write(&self, entry: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(entry.as_bytes())?;
        writer.flush()
    }
}

impl<W: Write + Send + 'static> LogSink for WriterSink<W> {
    fn write_entry(&self, entry: &str) {
        if let Err(error) = self.try_write(entry) {
            tracing::warn!(target: "reportkit", %error, "failed to write report to log sink");
        }
    }
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn write_entry(&self, entry: &str) {
        (**self).write_entry(entry);
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn write_entry(&self, entry: &str) {
        (**self).write_entry(entry);
    }
}
