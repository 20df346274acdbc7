//! Header views shared by the packet classifier and the capture backend.
//!
//! This crate is `no_std` and allocation-free. Every view is built through a
//! bounds-checked constructor that borrows a fixed-size window of the frame,
//! so a short or malformed buffer yields [`ViewError::TruncatedBuffer`]
//! instead of an out-of-bounds read. All multi-byte fields are stored in
//! network byte order and returned in host order.
#![no_std]
#![forbid(unsafe_code)]

pub mod ipv4;
pub mod link;
pub mod tcp;
mod view;

pub use ipv4::{is_fragmented, Ipv4Header};
pub use link::{network_offset, EthernetHeader, NetworkLayer};
pub use tcp::{TcpFlags, TcpHeader};
pub use view::ViewError;
