//! Global tracing setup for the `papergrade` binary.
//!
//! Logs always go to stderr so stdout carries nothing but response JSON.
//! Without `RUST_LOG`, papergrade's own targets log at the requested level
//! while the HTTP stack underneath the LLM client is held at `warn`.

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates that are chatty at `debug` and rarely useful when scoring papers.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Directive string used when `RUST_LOG` is unset.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec![level.clone()];
    directives.push(format!("papergrade_core={level}"));
    directives.push(format!("papergrade={level}"));
    directives.extend(QUIET_TARGETS.iter().map(|t| format!("{t}=warn")));
    directives.join(",")
}

/// Install the global subscriber. Later calls are no-ops.
///
/// At `DEBUG` and below, closing an evaluation span also logs its busy and
/// idle time, which gives per-run latency without extra instrumentation.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let span_events = if level >= Level::DEBUG {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_target(false)
        .with_span_events(span_events)
        .with_writer(std::io::stderr);

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry().with(filter).with(layer).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
