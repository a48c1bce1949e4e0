//! Commonly used items for convenient importing.
//!
//! ```rust
//! use reportkit::prelude::*;
//!
//! #[derive(Describe)]
//! struct Checkout {
//!     pub cart_id: u64,
//!     pub coupon: Option<String>,
//! }
//!
//! let reporter = Reporter::builder("shop").build();
//! let checkout = Checkout { cart_id: 9, coupon: None };
//! let err = std::io::Error::other("payment declined");
//!
//! reporter.error(&checkout, &err).wait();
//! ```

pub use crate::{
    Describe, Dispatch, Dump, ReportProvider, Reporter,
    dump::{Fields, Value},
    email::{Address, Email, EmailSender, SendError},
    report_error, report_message, report_sql, report_sql_error,
    sink::{LogSink, WriterSink},
    sql::SqlParam,
};
