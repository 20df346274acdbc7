//! Long-running tap: attach, re-attach on an interval, detach on shutdown.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::classifier::{PacketClassifier, StatsSnapshot};
use crate::config::Config;
use crate::error::{Result, RxTapError};
use crate::host::NetHost;
use crate::registry::{AttachSummary, DeviceRegistry};
use crate::report::ReportSink;

/// What a finished [`run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapReport {
    /// Outcome of the first attach pass.
    pub initial: AttachSummary,
    /// Registrations released at shutdown.
    pub released: usize,
    pub stats: StatsSnapshot,
}

/// Run until SIGTERM or SIGINT.
pub async fn run(
    config: &Config,
    host: Arc<dyn NetHost>,
    sink: Arc<dyn ReportSink>,
) -> Result<TapReport> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .map_err(|e| io::Error::other(format!("Failed to setup SIGINT handler: {e}")))?;

    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, detaching"),
            _ = sigint.recv() => info!("Received SIGINT, detaching"),
        }
    };
    run_until(config, host, sink, shutdown).await
}

/// Attach, keep rescanning if configured, and detach once `shutdown` completes.
///
/// Registry passes run on the blocking pool: opening capture channels and
/// joining receive threads both block.
pub async fn run_until<F>(
    config: &Config,
    host: Arc<dyn NetHost>,
    sink: Arc<dyn ReportSink>,
    shutdown: F,
) -> Result<TapReport>
where
    F: Future<Output = ()>,
{
    let classifier = Arc::new(PacketClassifier::new(sink));
    let registry =
        Arc::new(DeviceRegistry::new(host, config.interface_filter(), classifier.clone()));

    let initial = blocking(&registry, DeviceRegistry::attach_all).await?;
    if initial.registered + initial.already_attached == 0 {
        warn!(interface = registry.filter().target(), "no matching interface attached");
    }

    let mut rescan = rescan_interval(config.capture.rescan_interval_secs);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tick(&mut rescan) => {
                blocking(&registry, DeviceRegistry::attach_all).await?;
            }
        }
    }

    let released = blocking(&registry, DeviceRegistry::detach_all).await?;
    let stats = classifier.stats();
    info!(
        released,
        parsed = stats.parsed,
        not_tcp = stats.not_tcp,
        fragmented = stats.fragmented,
        not_ipv4 = stats.not_ipv4,
        "tap stopped"
    );
    Ok(TapReport { initial, released, stats })
}

fn rescan_interval(secs: u64) -> Option<Interval> {
    if secs == 0 {
        return None;
    }
    let period = Duration::from_secs(secs);
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn blocking<T>(registry: &Arc<DeviceRegistry>, pass: fn(&DeviceRegistry) -> T) -> Result<T>
where
    T: Send + 'static,
{
    let registry = Arc::clone(registry);
    tokio::task::spawn_blocking(move || pass(&registry))
        .await
        .map_err(|e| RxTapError::Io(io::Error::other(e)))
}
