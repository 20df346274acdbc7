mod helpers;

use std::sync::Arc;

use helpers::{tcp_packet, RecordingSink};
use rxtap_lib::report::{forward, IpRecord, QueueSink, ReportSink};
use rxtap_lib::PacketClassifier;

fn ip(n: u32) -> IpRecord {
    IpRecord { cpu_id: 0, src_ip: n, dst_ip: n, protocol: 6 }
}

#[test]
fn test_full_queue_drops_instead_of_waiting() {
    let (queue, _records) = QueueSink::with_capacity(2);
    for n in 0..5 {
        queue.ip(&ip(n));
    }
    assert_eq!(queue.dropped(), 3);
}

#[test]
fn test_closed_queue_counts_drops() {
    let (queue, records) = QueueSink::with_capacity(8);
    drop(records);
    queue.ip(&ip(1));
    assert_eq!(queue.dropped(), 1);
}

#[test]
fn test_forward_drains_in_order() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (queue, records) = QueueSink::with_capacity(16);
    let queue = Arc::new(queue);
    let classifier = PacketClassifier::with_cpu_source(queue.clone(), || 0);
    classifier.classify(&tcp_packet(1000, 80, 0x02));
    classifier.classify(&tcp_packet(1001, 80, 0x10));

    let sink = Arc::new(RecordingSink::default());
    let worker = forward(records, sink.clone())?;
    drop(classifier);
    drop(queue);
    let forwarded = worker.join().map_err(|_| "report thread panicked")?;

    assert_eq!(forwarded, 4);
    assert_eq!(sink.ip_records().len(), 2);
    let ports: Vec<u16> = sink.tcp_records().iter().map(|r| r.src_port).collect();
    assert_eq!(ports, [1000, 1001]);
    Ok(())
}
