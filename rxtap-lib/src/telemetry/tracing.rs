use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::error::{Result, RxTapError};

/// Install the global subscriber.
///
/// RUST_LOG, when set, replaces `log_level` entirely. Records from the
/// default report sink are on target `rxtap::report`, so
/// `RUST_LOG=info,rxtap::report=off` keeps lifecycle logs and drops per-packet ones.
pub fn init_tracing(log_level: &str, show_target: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| RxTapError::Telemetry(format!("Invalid log level {log_level:?}: {e}")))?;
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(show_target);

    let subscriber = Registry::default().with(env_filter).with(fmt_layer);

    ::tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| RxTapError::Telemetry(format!("Failed to set global tracing subscriber: {e}")))?;

    Ok(())
}
