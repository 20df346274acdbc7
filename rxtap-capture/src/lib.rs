// AF_PACKET capture is Linux-only. This crate does not compile for other targets.
// Opening a channel requires CAP_NET_RAW (or root).
#![cfg(target_os = "linux")]
#![forbid(unsafe_code)]

mod frame;
pub mod host;

pub use host::PnetHost;
