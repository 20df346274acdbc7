//! Shared test helpers: frame builders and a sink that keeps what it receives.
#![allow(dead_code)]

use std::sync::{Mutex, PoisonError};

use rxtap_lib::report::{IpRecord, ReportSink, TcpRecord};

/// Sink that records every call, in order.
#[derive(Default)]
pub struct RecordingSink {
    pub ip: Mutex<Vec<IpRecord>>,
    pub tcp: Mutex<Vec<TcpRecord>>,
}

impl RecordingSink {
    pub fn ip_records(&self) -> Vec<IpRecord> {
        self.ip.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn tcp_records(&self) -> Vec<TcpRecord> {
        self.tcp.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ReportSink for RecordingSink {
    fn ip(&self, record: &IpRecord) {
        self.ip.lock().unwrap_or_else(PoisonError::into_inner).push(*record);
    }

    fn tcp(&self, record: &TcpRecord) {
        self.tcp.lock().unwrap_or_else(PoisonError::into_inner).push(*record);
    }
}

/// 20-byte IPv4 header, no options, 127.0.0.1 -> 127.0.0.2.
pub fn ipv4_header(protocol: u8, frag_field: u16) -> Vec<u8> {
    let mut h = vec![0u8; 20];
    h[0] = 0x45;
    h[2..4].copy_from_slice(&40u16.to_be_bytes());
    h[6..8].copy_from_slice(&frag_field.to_be_bytes());
    h[8] = 64;
    h[9] = protocol;
    h[12..16].copy_from_slice(&[127, 0, 0, 1]);
    h[16..20].copy_from_slice(&[127, 0, 0, 2]);
    h
}

/// 20-byte TCP header with the given ports and flag byte.
pub fn tcp_header(src_port: u16, dst_port: u16, flags: u8) -> Vec<u8> {
    let mut h = vec![0u8; 20];
    h[0..2].copy_from_slice(&src_port.to_be_bytes());
    h[2..4].copy_from_slice(&dst_port.to_be_bytes());
    h[4..8].copy_from_slice(&0x0102_0304u32.to_be_bytes());
    h[8..12].copy_from_slice(&0x0a0b_0c0du32.to_be_bytes());
    h[12] = 0x50;
    h[13] = flags;
    h[14..16].copy_from_slice(&65535u16.to_be_bytes());
    h
}

/// IPv4 + TCP, unfragmented.
pub fn tcp_packet(src_port: u16, dst_port: u16, flags: u8) -> Vec<u8> {
    let mut p = ipv4_header(6, 0);
    p.extend(tcp_header(src_port, dst_port, flags));
    p
}
