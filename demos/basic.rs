//! A reporter wired to a fake mailer and a log file.
//!
//! Run with `cargo run --example basic`, then look at `reportkit-demo.log` in
//! the system temp directory.

use std::{fs::OpenOptions, io};

use reportkit::{
    Describe, Reporter,
    email::{Address, Email, SendError},
    report_sql, report_sql_error,
    sink::WriterSink,
};

#[derive(Describe)]
struct Customer {
    pub id: u64,
    pub email: Option<String>,
}

#[derive(Describe)]
struct Request {
    pub method: &'static str,
    pub path: String,
    pub received: chrono::DateTime<chrono::Local>,
    pub customer: Customer,
    password: String,
}

fn fake_mailer(email: &Email) -> Result<(), SendError> {
    println!(
        ">>> mail from {} to {} recipient(s), subject {:?}",
        email.from,
        email.to.len(),
        email.subject
    );
    Ok(())
}

fn main() -> io::Result<()> {
    let log_path = std::env::temp_dir().join("reportkit-demo.log");
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    Reporter::builder("demos")
        .email(
            fake_mailer,
            Address::with_name("Shop", "shop@example.com"),
            [
                Address::new("oncall@example.com"),
                Address::new("dev@example.com"),
            ],
        )
        .log_sink(WriterSink::new(log))
        .build()
        .install()
        .expect("no reporter installed yet");

    let request = Request {
        method: "POST",
        path: "/orders".to_string(),
        received: chrono::Local::now(),
        customer: Customer {
            id: 7,
            email: None,
        },
        password: "hunter2".to_string(),
    };
    debug_assert!(!request.password.is_empty());

    report_sql!("SELECT * FROM orders WHERE customer_id = ?", request.customer.id);

    let err = io::Error::other("deadlock detected");
    report_sql_error!(
        request,
        Some(&err),
        "INSERT INTO orders (customer_id, total) VALUES ($1, $2)",
        request.customer.id,
        19.99,
    )
    .wait();

    let reporter = reportkit::global::current();
    reporter
        .error(&request, &io::Error::other("payment gateway timeout"))
        .wait();

    for site in reporter.call_sites() {
        println!("frame in demos: {site}");
    }

    reporter.message("demo finished", &format!("log written to {}", log_path.display()));
    Ok(())
}
