//! Logging integration for formwork.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-cycle spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug",
/// "`formwork_forms=trace`"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format is used. If a subscriber is
/// already installed this is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one parse/validate/act cycle of a form.
///
/// # Examples
///
/// ```
/// use formwork_core::logging::cycle_span;
///
/// let span = cycle_span("person");
/// let _guard = span.enter();
/// tracing::info!("parsing submission");
/// ```
pub fn cycle_span(form_name: &str) -> tracing::Span {
    tracing::info_span!("form_cycle", form = form_name)
}
