mod helpers;

use std::sync::Arc;

use helpers::{ipv4_header, tcp_header, tcp_packet, RecordingSink};
use rxtap_lib::classifier::{Classification, PacketClassifier};

fn classifier() -> (PacketClassifier, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (PacketClassifier::with_cpu_source(sink.clone(), || 7), sink)
}

#[test]
fn test_short_buffers_are_not_ipv4() {
    let (c, sink) = classifier();
    let packet = tcp_packet(1, 2, 0x02);
    for len in 0..20 {
        assert_eq!(c.classify(&packet[..len]), Classification::NotIpv4, "len {len}");
    }
    assert!(sink.ip_records().is_empty());
    assert!(sink.tcp_records().is_empty());
}

#[test]
fn test_non_tcp_reports_ip_only() {
    let (c, sink) = classifier();
    for protocol in [1u8, 17, 47, 255] {
        let mut packet = ipv4_header(protocol, 0);
        // Trailing bytes that would look like a SYN if read as TCP.
        packet.extend(tcp_header(80, 80, 0x02));
        assert_eq!(c.classify(&packet), Classification::NotTcp);
    }
    let ip = sink.ip_records();
    assert_eq!(ip.len(), 4);
    assert_eq!(ip.iter().map(|r| r.protocol).collect::<Vec<_>>(), [1, 17, 47, 255]);
    assert!(sink.tcp_records().is_empty());
}

#[test]
fn test_ip_record_fields() {
    let (c, sink) = classifier();
    c.classify(&tcp_packet(1, 2, 0));
    let ip = sink.ip_records();
    assert_eq!(ip.len(), 1);
    assert_eq!(ip[0].cpu_id, 7);
    assert_eq!(ip[0].src_ip, 0x7f00_0001);
    assert_eq!(ip[0].dst_ip, 0x7f00_0002);
    assert_eq!(ip[0].protocol, 6);
}

#[test]
fn test_syn_only_segment() {
    let (c, sink) = classifier();
    let packet = tcp_packet(54321, 80, 0x02);
    assert_eq!(packet.len(), 40);

    let Classification::Parsed(record) = c.classify(&packet) else {
        panic!("expected Parsed");
    };
    assert_eq!(record.src_port, 54321);
    assert_eq!(record.dst_port, 80);
    assert_eq!(record.flags_raw, 0x02);
    assert!(record.syn);
    assert!(!(record.cwr || record.ece || record.urg || record.ack));
    assert!(!(record.psh || record.rst || record.fin));
    assert_eq!(sink.tcp_records(), [record]);
}

#[test]
fn test_flags_match_raw_byte_for_every_value() {
    let (c, _) = classifier();
    for flags in 0..=u8::MAX {
        let Classification::Parsed(r) = c.classify(&tcp_packet(1000, 2000, flags)) else {
            panic!("expected Parsed for flags {flags:#04x}");
        };
        assert_eq!(r.flags_raw, flags);
        let bits = [r.fin, r.syn, r.rst, r.psh, r.ack, r.urg, r.ece, r.cwr];
        for (i, set) in bits.iter().enumerate() {
            assert_eq!(*set, flags & (1 << i) != 0, "flags {flags:#04x} bit {i}");
        }
    }
}

#[test]
fn test_mixed_flag_byte() {
    let (c, _) = classifier();
    let Classification::Parsed(r) = c.classify(&tcp_packet(1, 2, 0b0010_1011)) else {
        panic!("expected Parsed");
    };
    assert!(r.fin && r.syn && r.psh && r.urg);
    assert!(!(r.rst || r.ack || r.ece || r.cwr));
}

#[test]
fn test_fragment_field_boundaries() {
    let cases = [
        (0x0000u16, false),
        (0x2000, true),  // MF
        (0x0001, true),  // offset 1
        (0x4000, false), // DF only
        (0x6000, true),  // DF + MF
        (0x8000, false), // reserved bit only
    ];
    for (frag, fragmented) in cases {
        let (c, sink) = classifier();
        let mut packet = ipv4_header(6, frag);
        packet.extend(tcp_header(1, 2, 0x10));
        let outcome = c.classify(&packet);
        if fragmented {
            assert_eq!(outcome, Classification::Fragmented, "frag {frag:#06x}");
            assert!(sink.tcp_records().is_empty());
        } else {
            assert!(matches!(outcome, Classification::Parsed(_)), "frag {frag:#06x}");
        }
        assert_eq!(sink.ip_records().len(), 1);
    }
}

#[test]
fn test_truncated_tcp_header_is_not_tcp() {
    let (c, sink) = classifier();
    let packet = tcp_packet(1, 2, 0x02);
    for len in 20..40 {
        assert_eq!(c.classify(&packet[..len]), Classification::NotTcp, "len {len}");
    }
    assert_eq!(sink.ip_records().len(), 20);
    assert!(sink.tcp_records().is_empty());
}

#[test]
fn test_ip_options_shift_transport_offset() {
    let (c, _) = classifier();
    let mut packet = ipv4_header(6, 0);
    packet[0] = 0x46; // ihl 6: one word of options
    packet.extend([1, 1, 1, 0]);
    packet.extend(tcp_header(443, 50000, 0x18));
    let Classification::Parsed(r) = c.classify(&packet) else {
        panic!("expected Parsed");
    };
    assert_eq!((r.src_port, r.dst_port), (443, 50000));
    assert!(r.psh && r.ack);
}

#[test]
fn test_invalid_ihl_is_not_tcp() {
    let (c, _) = classifier();
    let mut packet = tcp_packet(1, 2, 0x02);
    packet[0] = 0x42;
    assert_eq!(c.classify(&packet), Classification::NotTcp);
}

#[test]
fn test_concurrent_classification() {
    let (c, sink) = classifier();
    let c = Arc::new(c);
    let packet = tcp_packet(9, 10, 0x11);
    let threads: Vec<_> = (0..4)
        .map(|_| {
            let c = Arc::clone(&c);
            let packet = packet.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    c.classify(&packet);
                }
            })
        })
        .collect();
    for t in threads {
        assert!(t.join().is_ok());
    }
    assert_eq!(c.stats().parsed, 1000);
    assert_eq!(sink.tcp_records().len(), 1000);
}
