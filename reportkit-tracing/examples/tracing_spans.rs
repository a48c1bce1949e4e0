//! Span context in error reports.
//!
//! The report for a failed permission check carries the spans that were
//! active when it happened, with their field values. The report itself is
//! also emitted as a tracing event through `TracingSink`.

use reportkit::{Describe, Reporter};
use reportkit_tracing::{ReportkitLayer, TracingSink, with_spans};
use tracing::instrument;
use tracing_subscriber::{Registry, layer::SubscriberExt};

#[derive(Debug, thiserror::Error)]
#[error("permission denied")]
struct PermissionError;

#[derive(Describe)]
struct User {
    pub id: u64,
    pub role: &'static str,
}

#[instrument(skip(reporter, user), fields(user_id = user.id))]
fn check_user_permission(reporter: &Reporter, user: &User) {
    reporter.error(&with_spans(user), &PermissionError).wait();
}

#[instrument(skip(reporter), fields(endpoint))]
fn handle_api_request(reporter: &Reporter, request_id: &str, endpoint: &str) {
    tracing::Span::current().record("endpoint", endpoint);
    check_user_permission(
        reporter,
        &User {
            id: 12345,
            role: "viewer",
        },
    );
}

fn main() {
    let subscriber = Registry::default()
        .with(ReportkitLayer)
        .with(tracing_subscriber::fmt::layer());

    tracing::subscriber::set_global_default(subscriber).expect("failed to set default subscriber");

    let reporter = Reporter::builder("tracing_spans")
        .log_sink(TracingSink::default())
        .build();

    handle_api_request(&reporter, "req-abc-123", "/api/admin/users");
}
