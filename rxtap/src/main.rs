#![forbid(unsafe_code)]

use clap::Parser;
use rxtap_lib::config::{load_from_path, validate};
use rxtap_lib::{forward, init_tracing, run, Config, NetHost, QueueSink, RxTapError, TracingSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Passive IPv4/TCP header tap")]
struct Cli {
    /// Path to configuration TOML file; built-in defaults when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Interface to intercept, overrides `capture.interface`
    #[arg(short, long, value_name = "NAME", env = "RXTAP_INTERFACE")]
    interface: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // No subscriber exists until the logging section is known.
    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("rxtap: failed to load configuration: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = init_tracing(&cfg.logging.level, cfg.logging.show_target) {
        eprintln!("rxtap: {err}");
        std::process::exit(1);
    }

    info!(
        interface = %cfg.capture.interface,
        link_layer = ?cfg.capture.link_layer,
        rescan_interval_secs = cfg.capture.rescan_interval_secs,
        "configuration loaded"
    );

    // Receive threads hand records to the queue; one thread writes them out.
    let (queue, records) = QueueSink::with_capacity(cfg.capture.report_queue);
    let queue = Arc::new(queue);
    let writer = match forward(records, Arc::new(TracingSink)) {
        Ok(writer) => writer,
        Err(err) => {
            error!(%err, "failed to start report writer");
            std::process::exit(1);
        }
    };

    let result = run(&cfg, build_host(&cfg), queue.clone()).await;
    let dropped = queue.dropped();
    drop(queue);
    let forwarded = writer.join().unwrap_or(0);

    match result {
        Ok(report) => info!(
            released = report.released,
            packets = report.stats.total(),
            forwarded,
            dropped,
            "exiting"
        ),
        Err(err) => {
            error!(%err, "tap exited with error");
            std::process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, RxTapError> {
    let mut cfg = match &cli.config {
        Some(path) => load_from_path(path)?,
        None => Config::default(),
    };
    if let Some(interface) = &cli.interface {
        cfg.capture.interface = interface.clone();
        validate(&cfg).map_err(RxTapError::Config)?;
    }
    Ok(cfg)
}

#[cfg(all(feature = "live-capture", target_os = "linux"))]
fn build_host(cfg: &Config) -> Arc<dyn NetHost> {
    Arc::new(rxtap_capture::PnetHost::from_config(&cfg.capture))
}

#[cfg(not(all(feature = "live-capture", target_os = "linux")))]
fn build_host(_cfg: &Config) -> Arc<dyn NetHost> {
    tracing::warn!("built without live capture; no interfaces will be attached");
    Arc::new(rxtap_lib::host::memory::MemoryHost::new())
}
