//! Tracing initialization for binaries and demos.

use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global tracing subscriber: env-filtered fmt output plus an
/// [`ErrorLayer`] for span traces on errors.
///
/// Respects `RUST_LOG`; defaults to `info`. Calling it twice is a no-op, so
/// tests and demos can both call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(ErrorLayer::default())
        .try_init();
}
