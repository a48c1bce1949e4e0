#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Error and slow-query reporting for services that want a human in the loop.
//!
//! ## Overview
//!
//! `reportkit` turns an application error, or a failed SQL statement, into a
//! small diagnostic block:
//!
//! ```text
//! 18.10.2026 14:03:11
//! src/handlers/orders.rs:88
//! connection reset by peer
//!
//! SELECT * FROM orders WHERE id = 42
//!
//! method = POST
//! path = /orders/42
//! user:
//! 	id = 7
//! 	email = nil
//!
//! ```
//!
//! The block is written to the console in a single write, then handed to an
//! [`EmailSender`] for the configured distribution list and, optionally, to a
//! [`LogSink`]. Delivery happens on background threads; the reporter never
//! fails the caller.
//!
//! ## Quick Example
//!
//! ```
//! use reportkit::{
//!     Describe, Reporter,
//!     email::{Address, Email, SendError},
//!     sink::WriterSink,
//! };
//!
//! #[derive(Describe)]
//! struct Request {
//!     pub method: &'static str,
//!     pub path: String,
//!     session_token: String,
//! }
//!
//! let reporter = Reporter::builder("shop")
//!     .email(
//!         |email: &Email| -> Result<(), SendError> {
//!             println!("would mail {:?} to {} recipient(s)", email.subject, email.to.len());
//!             Ok(())
//!         },
//!         Address::with_name("Shop", "shop@example.com"),
//!         [Address::new("ops@example.com")],
//!     )
//!     .log_sink(WriterSink::new(std::io::sink()))
//!     .build();
//!
//! let request = Request {
//!     method: "GET",
//!     path: "/cart".to_string(),
//!     session_token: "secret".to_string(),
//! };
//! let err = std::io::Error::other("cart service unavailable");
//!
//! // Returns immediately; wait() blocks until the mail and log write are done.
//! reporter.error(&request, &err).wait();
//! ```
//!
//! ## Core Concepts
//!
//! - **Call sites** ([`callsite`]): every reporting method is
//!   `#[track_caller]`, so the location printed is the line that called the
//!   reporter. A bounded stack walker is available for richer traces.
//! - **Dumps** ([`dump`]): the contextual object attached to a report is any
//!   value implementing [`Dump`]. Structs get it through
//!   `#[derive(Describe)]`, which renders public fields in declaration order.
//! - **Dispatch** ([`Dispatch`]): background delivery is an explicit handle.
//!   Wait on it, poll it, or detach it.
//!
//! [`EmailSender`]: crate::email::EmailSender
//! [`LogSink`]: crate::sink::LogSink
//! [`Dump`]: crate::dump::Dump

// Lets `#[derive(Describe)]` refer to `::reportkit` from inside this crate.
extern crate self as reportkit;

#[macro_use]
mod macros;

pub mod callsite;
pub mod dump;
pub mod email;
pub mod error;
pub mod global;
pub mod prelude;
pub mod sink;
pub mod sql;

mod dispatch;
mod reporter;

pub use self::{
    dispatch::Dispatch,
    dump::{Describe, Dump},
    error::{ReportError, ReporterAlreadyInstalledError},
    reporter::{ERROR_SUBJECT, ReportProvider, Reporter, ReporterBuilder, SQL_SUBJECT},
};

/// Derives [`Describe`](crate::dump::Describe) and [`Dump`](crate::dump::Dump)
/// for a struct.
///
/// Only `pub` fields are rendered, in declaration order. Supported field
/// attributes:
///
/// - `#[describe(skip)]` leaves a public field out of the dump.
/// - `#[describe(rename = "Name")]` changes the rendered field name.
/// - `#[describe(display)]` renders the field through its `Display` impl.
/// - `#[describe(debug)]` renders the field through its `Debug` impl.
#[cfg(feature = "derive")]
pub use reportkit_derive::Describe;

// Not public API. Referenced by macro-generated code.
#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    pub use crate::global::current;
}
