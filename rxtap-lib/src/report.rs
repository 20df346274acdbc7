//! Structured records emitted by the classifier and the sinks receiving them.

use std::io;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rxtap_common::TcpFlags;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Emitted once for every IPv4 packet, TCP or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRecord {
    /// CPU the classifier ran on.
    pub cpu_id: u32,
    /// Source address, host order.
    pub src_ip: u32,
    /// Destination address, host order.
    pub dst_ip: u32,
    pub protocol: u8,
}

impl IpRecord {
    pub fn src(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.src_ip)
    }

    pub fn dst(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dst_ip)
    }
}

/// Emitted for unfragmented TCP segments whose fixed header is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpRecord {
    pub src_port: u16,
    pub dst_port: u16,
    /// The flag byte exactly as carried on the wire.
    pub flags_raw: u8,
    pub cwr: bool,
    pub ece: bool,
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TcpRecord {
    pub fn new(src_port: u16, dst_port: u16, flags: TcpFlags) -> Self {
        Self {
            src_port,
            dst_port,
            flags_raw: flags.bits(),
            cwr: flags.cwr(),
            ece: flags.ece(),
            urg: flags.urg(),
            ack: flags.ack(),
            psh: flags.psh(),
            rst: flags.rst(),
            syn: flags.syn(),
            fin: flags.fin(),
        }
    }
}

/// Destination for classifier records.
///
/// Called synchronously from the frame-delivery path, possibly from several
/// threads at once. Implementations must not block.
pub trait ReportSink: Send + Sync {
    fn ip(&self, record: &IpRecord);
    fn tcp(&self, record: &TcpRecord);
}

/// Writes each record as a structured `tracing` event on target `rxtap::report`.
///
/// Emitting goes through the installed subscriber's writer synchronously. On
/// the frame path, put it behind a [`QueueSink`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn ip(&self, r: &IpRecord) {
        info!(
            target: "rxtap::report",
            cpu = r.cpu_id,
            src = %r.src(),
            dst = %r.dst(),
            protocol = r.protocol,
            "ipv4 packet"
        );
    }

    fn tcp(&self, r: &TcpRecord) {
        info!(
            target: "rxtap::report",
            src_port = r.src_port,
            dst_port = r.dst_port,
            flags = r.flags_raw,
            cwr = u8::from(r.cwr),
            ece = u8::from(r.ece),
            urg = u8::from(r.urg),
            ack = u8::from(r.ack),
            psh = u8::from(r.psh),
            rst = u8::from(r.rst),
            syn = u8::from(r.syn),
            fin = u8::from(r.fin),
            "tcp segment"
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn ip(&self, _: &IpRecord) {}
    fn tcp(&self, _: &TcpRecord) {}
}

/// A record waiting in a [`QueueSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Ip(IpRecord),
    Tcp(TcpRecord),
}

/// Bounded hand-off between frame delivery and a slower sink.
///
/// `ip`/`tcp` never wait: when the queue is full the record is dropped and
/// counted. [`forward`] drains the other end on its own thread.
#[derive(Debug)]
pub struct QueueSink {
    tx: mpsc::Sender<Record>,
    dropped: AtomicU64,
}

impl QueueSink {
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Record>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, dropped: AtomicU64::new(0) }, rx)
    }

    /// Records discarded because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, record: Record) {
        if self.tx.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl ReportSink for QueueSink {
    fn ip(&self, record: &IpRecord) {
        self.push(Record::Ip(*record));
    }

    fn tcp(&self, record: &TcpRecord) {
        self.push(Record::Tcp(*record));
    }
}

/// Drain `records` into `sink` on a dedicated thread until every sender is
/// gone. The thread returns how many records it forwarded.
pub fn forward(
    mut records: mpsc::Receiver<Record>,
    sink: Arc<dyn ReportSink>,
) -> io::Result<JoinHandle<u64>> {
    thread::Builder::new().name("rxtap-report".into()).spawn(move || {
        let mut forwarded = 0u64;
        while let Some(record) = records.blocking_recv() {
            match &record {
                Record::Ip(r) => sink.ip(r),
                Record::Tcp(r) => sink.tcp(r),
            }
            forwarded += 1;
        }
        debug!(forwarded, "report queue closed");
        forwarded
    })
}
