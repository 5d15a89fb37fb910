//! Telemetry initialization (tracing/tracing-subscriber)
//!
//! - `LOG_LEVEL` sets the filter, e.g. "debug" or
//!   "info,generator=debug,solver=warn".
//! - `LOG_FORMAT=json` switches to structured JSON lines; anything else is
//!   the human-readable format.
//!
//! Library code only emits events under the targets `generator`, `solver`,
//! `locks`, `progress`, `service` and `config`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,generator=debug,progress=debug";

/// Install the global subscriber; a second call is a no-op
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    // try_init so tests and embedders that already set a subscriber keep it
    let _ = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
}
