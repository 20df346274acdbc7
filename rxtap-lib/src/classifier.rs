//! Per-frame classification.
//!
//! Runs synchronously on whatever thread the host delivers a frame on. The
//! path takes no locks and performs no allocation: header views borrow the
//! frame, records are `Copy`, and counters are relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rxtap_common::ipv4::IPPROTO_TCP;
use rxtap_common::{Ipv4Header, TcpHeader};
use tracing::{debug, trace};

use crate::cpu;
use crate::report::{IpRecord, ReportSink, TcpRecord};

/// Outcome of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Too short for an IPv4 header, or version is not 4.
    NotIpv4,
    /// TCP inside a fragmented IPv4 packet; the TCP header is not read.
    Fragmented,
    /// IPv4 carrying another protocol, or a TCP header cut short.
    NotTcp,
    Parsed(TcpRecord),
}

/// Verdict returned to the host for a delivered frame.
///
/// The tap never consumes frames, so normal delivery always continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
}

/// Callback a host invokes for every frame received on a registered interface.
///
/// Must not block: it runs in the host's delivery path.
pub trait FrameHandler: Send + Sync {
    fn on_frame(&self, frame: &[u8]) -> Disposition;
}

#[derive(Debug, Default)]
struct ClassifierStats {
    not_ipv4: AtomicU64,
    fragmented: AtomicU64,
    not_tcp: AtomicU64,
    parsed: AtomicU64,
}

impl ClassifierStats {
    fn record(&self, outcome: &Classification) {
        let counter = match outcome {
            Classification::NotIpv4 => &self.not_ipv4,
            Classification::Fragmented => &self.fragmented,
            Classification::NotTcp => &self.not_tcp,
            Classification::Parsed(_) => &self.parsed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the classifier counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub not_ipv4: u64,
    pub fragmented: u64,
    pub not_tcp: u64,
    pub parsed: u64,
}

impl StatsSnapshot {
    pub fn total(&self) -> u64 {
        self.not_ipv4
            .saturating_add(self.fragmented)
            .saturating_add(self.not_tcp)
            .saturating_add(self.parsed)
    }
}

/// Decodes IPv4/TCP headers and reports them to a [`ReportSink`].
pub struct PacketClassifier {
    sink: Arc<dyn ReportSink>,
    cpu_id: fn() -> u32,
    stats: ClassifierStats,
}

impl PacketClassifier {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self::with_cpu_source(sink, cpu::current_cpu)
    }

    /// Use `cpu_id` instead of the scheduler to attribute IP records.
    pub fn with_cpu_source(sink: Arc<dyn ReportSink>, cpu_id: fn() -> u32) -> Self {
        Self { sink, cpu_id, stats: ClassifierStats::default() }
    }

    /// Classify one frame whose IPv4 header starts at offset 0.
    ///
    /// Emits an [`IpRecord`] for every IPv4 packet and a [`TcpRecord`] for
    /// every parsed TCP segment. Malformed input degrades to a non-`Parsed`
    /// outcome; nothing here panics.
    pub fn classify(&self, frame: &[u8]) -> Classification {
        let outcome = self.decode(frame);
        self.stats.record(&outcome);
        outcome
    }

    fn decode(&self, frame: &[u8]) -> Classification {
        let ip = match Ipv4Header::new(frame, 0) {
            Ok(ip) if ip.version() == 4 => ip,
            _ => return Classification::NotIpv4,
        };

        self.sink.ip(&IpRecord {
            cpu_id: (self.cpu_id)(),
            src_ip: ip.src_addr(),
            dst_ip: ip.dst_addr(),
            protocol: ip.protocol(),
        });

        if ip.protocol() != IPPROTO_TCP {
            return Classification::NotTcp;
        }

        if ip.is_fragmented() {
            debug!(src = %ip.src(), dst = %ip.dst(), frag = ip.frag_field(), "fragmented packet seen");
            return Classification::Fragmented;
        }

        let Some(tcp) = ip.transport_offset().and_then(|off| TcpHeader::new(frame, off).ok())
        else {
            trace!(len = frame.len(), ihl = ip.ihl(), "TCP header unavailable, passing through");
            return Classification::NotTcp;
        };

        let record = TcpRecord::new(tcp.src_port(), tcp.dst_port(), tcp.flags());
        self.sink.tcp(&record);
        Classification::Parsed(record)
    }

    pub fn stats(&self) -> StatsSnapshot {
        let s = &self.stats;
        StatsSnapshot {
            not_ipv4: s.not_ipv4.load(Ordering::Relaxed),
            fragmented: s.fragmented.load(Ordering::Relaxed),
            not_tcp: s.not_tcp.load(Ordering::Relaxed),
            parsed: s.parsed.load(Ordering::Relaxed),
        }
    }
}

impl FrameHandler for PacketClassifier {
    fn on_frame(&self, frame: &[u8]) -> Disposition {
        self.classify(frame);
        Disposition::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullSink;

    fn classifier() -> PacketClassifier {
        PacketClassifier::with_cpu_source(Arc::new(NullSink), || 3)
    }

    #[test]
    fn test_empty_frame() {
        assert_eq!(classifier().classify(&[]), Classification::NotIpv4);
    }

    #[test]
    fn test_ipv6_version_nibble() {
        let mut frame = [0u8; 40];
        frame[0] = 0x60;
        assert_eq!(classifier().classify(&frame), Classification::NotIpv4);
    }

    #[test]
    fn test_stats_count_every_outcome() {
        let c = classifier();
        c.classify(&[]);
        c.classify(&[0x45; 4]);
        let mut udp = [0u8; 28];
        udp[0] = 0x45;
        udp[9] = 17;
        c.classify(&udp);
        let s = c.stats();
        assert_eq!(s, StatsSnapshot { not_ipv4: 2, fragmented: 0, not_tcp: 1, parsed: 0 });
        assert_eq!(s.total(), 3);
    }

    #[test]
    fn test_total_saturates() {
        let s = StatsSnapshot { not_ipv4: u64::MAX, fragmented: 1, not_tcp: 1, parsed: 1 };
        assert_eq!(s.total(), u64::MAX);
    }

    #[test]
    fn test_on_frame_always_continues() {
        let c = classifier();
        for frame in [&[][..], &[0xff; 64][..], &[0x45; 40][..]] {
            assert_eq!(c.on_frame(frame), Disposition::Continue);
        }
    }
}
