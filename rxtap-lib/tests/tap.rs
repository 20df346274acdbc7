#![cfg(unix)]

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{tcp_packet, RecordingSink};
use rxtap_lib::config::from_toml_str;
use rxtap_lib::host::memory::MemoryHost;
use rxtap_lib::{run_until, Config, Disposition, NetHost};

#[tokio::test]
async fn test_frames_delivered_while_running() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let memory = Arc::new(MemoryHost::with_interfaces(["lo"]));
    let sink = Arc::new(RecordingSink::default());
    let host: Arc<dyn NetHost> = memory.clone();

    let traffic = {
        let memory = memory.clone();
        async move {
            assert_eq!(memory.deliver("lo", &tcp_packet(5000, 443, 0x02)), Some(Disposition::Continue));
            assert_eq!(memory.deliver("lo", &[0x60; 40]), Some(Disposition::Continue));
        }
    };
    let report = run_until(&Config::default(), host, sink.clone(), traffic).await?;

    assert_eq!(report.stats.parsed, 1);
    assert_eq!(report.stats.not_ipv4, 1);
    assert_eq!(report.released, 1);
    assert_eq!(sink.tcp_records().len(), 1);
    assert!(!memory.has_handler("lo"));
    Ok(())
}

#[tokio::test]
async fn test_rescan_attaches_late_interface() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = from_toml_str("[capture]\ninterface = \"tap0\"\nrescan_interval_secs = 1\n")?;
    let memory = Arc::new(MemoryHost::with_interfaces(["lo"]));
    let host: Arc<dyn NetHost> = memory.clone();

    let scenario = {
        let memory = memory.clone();
        async move {
            memory.add_interface("tap0");
            tokio::time::sleep(Duration::from_millis(1500)).await;
            assert!(memory.has_handler("tap0"));
        }
    };
    let report = run_until(&config, host, Arc::new(RecordingSink::default()), scenario).await?;

    assert_eq!(report.initial.registered, 0);
    assert_eq!(report.released, 1);
    assert_eq!(memory.handler_count(), 0);
    Ok(())
}
