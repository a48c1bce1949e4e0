#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Tracing integration for reportkit.
//!
//! Two independent pieces:
//!
//! - [`ReportkitLayer`] records span field values so that [`SpanContext`] can
//!   put the active spans into a report's context dump.
//! - [`TracingSink`] is a [`LogSink`] that turns dispatched reports into
//!   tracing events, for services whose logs already flow through `tracing`.
//!
//! # Quick Start
//!
//! ```
//! use reportkit::Reporter;
//! use reportkit_tracing::{ReportkitLayer, TracingSink, with_spans};
//! use tracing_subscriber::{Registry, layer::SubscriberExt};
//!
//! let subscriber = Registry::default()
//!     .with(ReportkitLayer) // Captures span field values for reports
//!     .with(tracing_subscriber::fmt::layer()); // Your normal console output
//! tracing::subscriber::set_global_default(subscriber).expect("failed to set subscriber");
//!
//! let reporter = Reporter::builder("shop").log_sink(TracingSink::default()).build();
//!
//! #[tracing::instrument(skip(reporter), fields(order_id = 42))]
//! fn ship(reporter: &Reporter) {
//!     let err = std::io::Error::other("carrier rejected the parcel");
//!     reporter.error(&with_spans(&()), &err).wait();
//! }
//! ship(&reporter);
//! ```
//!
//! The context dump then lists the spans, outermost first:
//!
//! ```text
//! Spans:
//! 	ship:
//! 		order_id = 42
//!
//!
//!
//! ```
//!
//! **Note:** [`ReportkitLayer`] must be in your subscriber setup for
//! [`SpanContext`] to see field values.

use std::fmt;

use reportkit::{
    dump::{Describe, Dump, Fields, Value},
    sink::LogSink,
};
use tracing::{
    Level, Span,
    field::{Field, Visit},
    span::{Attributes, Id, Record},
};
use tracing_subscriber::{Registry, layer::Context, registry::LookupSpan};

/// Captured field values for a span.
#[derive(Clone, Default)]
struct CapturedFields(Vec<(&'static str, String)>);

struct FieldVisitor<'a> {
    fields: &'a mut Vec<(&'static str, String)>,
}

impl FieldVisitor<'_> {
    fn set(&mut self, field: &Field, value: String) {
        match self.fields.iter_mut().find(|(name, _)| *name == field.name()) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.name(), value)),
        }
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.set(field, format!("{value:?}"));
    }
}

/// A tracing layer that captures span field values for reports.
///
/// Add it to your subscriber alongside your other layers. Values recorded
/// after the span was created (through [`Span::record`]) are captured too.
///
/// # Examples
///
/// ```
/// use reportkit_tracing::ReportkitLayer;
/// use tracing_subscriber::{Registry, layer::SubscriberExt};
///
/// let subscriber = Registry::default()
///     .with(ReportkitLayer) // Captures span data for reports
///     .with(tracing_subscriber::fmt::layer()); // Example: console output
///
/// tracing::subscriber::set_global_default(subscriber).expect("failed to set subscriber");
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct ReportkitLayer;

impl<S> tracing_subscriber::Layer<S> for ReportkitLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut captured = CapturedFields::default();
        attrs.record(&mut FieldVisitor {
            fields: &mut captured.0,
        });
        span.extensions_mut().insert(captured);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        if let Some(captured) = extensions.get_mut::<CapturedFields>() {
            values.record(&mut FieldVisitor {
                fields: &mut captured.0,
            });
        }
    }
}

/// One span from a [`SpanContext`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedSpan {
    /// The span name.
    pub name: &'static str,
    /// Recorded field values, in recording order.
    pub fields: Vec<(&'static str, String)>,
}

/// The spans active at the point of capture, outermost first.
///
/// Renders in a dump as one nested struct per span, holding its fields. An
/// empty context renders as nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpanContext {
    spans: Vec<CapturedSpan>,
}

impl SpanContext {
    /// Captures the current span and its ancestors.
    ///
    /// Returns an empty context outside of any span, or when the current
    /// subscriber is not built on a [`Registry`].
    pub fn current() -> Self {
        let spans = Span::current()
            .with_subscriber(|(id, dispatch)| {
                let registry = dispatch.downcast_ref::<Registry>()?;
                let span = registry.span(id)?;
                let spans = span
                    .scope()
                    .from_root()
                    .map(|span| {
                        let fields = span
                            .extensions()
                            .get::<CapturedFields>()
                            .map(|captured| captured.0.clone())
                            .unwrap_or_default();
                        CapturedSpan {
                            name: span.name(),
                            fields,
                        }
                    })
                    .collect();
                Some(spans)
            })
            .flatten()
            .unwrap_or_default();

        Self { spans }
    }

    /// The captured spans, outermost first.
    pub fn spans(&self) -> &[CapturedSpan] {
        &self.spans
    }

    /// Whether no span was active.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl Describe for SpanContext {
    fn describe(&self, fields: &mut Fields) {
        for span in &self.spans {
            let mut nested = Fields::new();
            for (name, value) in &span.fields {
                nested.push(*name, Value::Text(value.clone()));
            }
            fields.push(span.name, Value::Struct(nested));
        }
    }
}

impl Dump for SpanContext {
    fn dump_value(&self) -> Value {
        if self.is_empty() {
            Value::Nil
        } else {
            Value::nested(self)
        }
    }
}

/// A context object extended with the active spans.
///
/// Created by [`with_spans`].
pub struct WithSpans<'a, C: ?Sized> {
    context: &'a C,
    spans: SpanContext,
}

/// Wraps `context` so its dump ends with a `Spans` entry listing the active
/// spans.
///
/// A context that is not a struct is replaced by the spans.
pub fn with_spans<C: Dump + ?Sized>(context: &C) -> WithSpans<'_, C> {
    WithSpans {
        context,
        spans: SpanContext::current(),
    }
}

impl<C: Dump + ?Sized> Dump for WithSpans<'_, C> {
    fn dump_value(&self) -> Value {
        let spans = self.spans.dump_value();
        match self.context.dump_value() {
            Value::Struct(mut fields) => {
                if spans != Value::Nil {
                    fields.push("Spans", spans);
                }
                Value::Struct(fields)
            }
            _ => {
                if spans == Value::Nil {
                    return Value::Nil;
                }
                let mut fields = Fields::new();
                fields.push("Spans", spans);
                Value::Struct(fields)
            }
        }
    }
}

/// A [`LogSink`] emitting each report as a tracing event with target
/// `reportkit`.
///
/// The separator line that frames log entries is stripped.
#[derive(Copy, Clone, Debug)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    /// Emits events at `level`.
    pub const fn new(level: Level) -> Self {
        Self { level }
    }
}

/// Emits at [`Level::ERROR`].
impl Default for TracingSink {
    fn default() -> Self {
        Self::new(Level::ERROR)
    }
}

impl LogSink for TracingSink {
    fn write_entry(&self, entry: &str) {
        let report = entry.trim_end_matches(['\n', '—']);
        if self.level == Level::ERROR {
            tracing::error!(target: "reportkit", report);
        } else if self.level == Level::WARN {
            tracing::warn!(target: "reportkit", report);
        } else if self.level == Level::INFO {
            tracing::info!(target: "reportkit", report);
        } else if self.level == Level::DEBUG {
            tracing::debug!(target: "reportkit", report);
        } else {
            tracing::trace!(target: "reportkit", report);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reportkit::dump::dump;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    fn with_layer<T>(f: impl FnOnce() -> T) -> T {
        let subscriber = Registry::default().with(ReportkitLayer);
        tracing::subscriber::with_default(subscriber, f)
    }

    #[test]
    fn test_captures_nested_spans_outermost_first() {
        let context = with_layer(|| {
            let outer = tracing::info_span!("request", method = "POST", user_id = 7);
            let _outer = outer.enter();
            let inner = tracing::info_span!("checkout", cart_id = 9);
            let _inner = inner.enter();
            SpanContext::current()
        });

        assert_eq!(
            context.spans(),
            [
                CapturedSpan {
                    name: "request",
                    fields: vec![("method", "POST".to_string()), ("user_id", "7".to_string())],
                },
                CapturedSpan {
                    name: "checkout",
                    fields: vec![("cart_id", "9".to_string())],
                },
            ]
        );
        assert_eq!(
            dump(&context, ""),
            "request:\n\tmethod = POST\n\tuser_id = 7\n\ncheckout:\n\tcart_id = 9\n\n\n"
        );
    }

    #[test]
    fn test_late_recorded_fields() {
        let context = with_layer(|| {
            let span = tracing::info_span!("job", status = tracing::field::Empty);
            let _span = span.enter();
            span.record("status", "retrying");
            span.record("status", "failed");
            SpanContext::current()
        });

        assert_eq!(
            context.spans()[0].fields,
            vec![("status", "failed".to_string())]
        );
    }

    #[test]
    fn test_empty_outside_spans() {
        let context = with_layer(SpanContext::current);
        assert!(context.is_empty());
        assert_eq!(dump(&context, ""), "");
        assert_eq!(dump(&with_spans(&()), ""), "");
    }

    #[test]
    fn test_with_spans_appends_to_struct_context() {
        struct Request {
            path: &'static str,
        }

        impl Describe for Request {
            fn describe(&self, fields: &mut Fields) {
                fields.field("Path", &self.path);
            }
        }

        impl Dump for Request {
            fn dump_value(&self) -> Value {
                Value::nested(self)
            }
        }

        let request = Request { path: "/cart" };
        let rendered = with_layer(|| {
            let span = tracing::info_span!("handler");
            let _span = span.enter();
            dump(&with_spans(&request), "")
        });
        assert_eq!(rendered, "Path = /cart\nSpans:\n\thandler:\n\n\n\n");
    }

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_strips_separator() {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let entry = format!("disk almost full\n{}\n\n", "—".repeat(70));
            TracingSink::default().write_entry(&entry);
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("ERROR"), "{output}");
        assert!(output.contains("report=\"disk almost full\""), "{output}");
        assert!(!output.contains('—'), "{output}");
    }
}
