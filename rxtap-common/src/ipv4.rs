//! IPv4 header view.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |Version|  IHL  |    DSCP/ECN   |          Total Length         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Identification        |Flags|     Fragment Offset     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      TTL      |    Protocol   |        Header Checksum        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Source Address                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      Destination Address                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use core::net::Ipv4Addr;

use crate::view::{view, ViewError};

/// Length of the IPv4 header without options.
pub const IPV4_LEN: usize = 20;

/// IP protocol number for TCP.
pub const IPPROTO_TCP: u8 = 6;

// Masks over the host-order fragmentation field.
pub const IP_RF: u16 = 0x8000; // reserved / must-be-zero
pub const IP_DF: u16 = 0x4000; // don't fragment
pub const IP_MF: u16 = 0x2000; // more fragments
pub const IP_OFFSET: u16 = 0x1FFF; // fragment offset

/// Fragmentation test applied by the classifier.
///
/// Shifts the 16-bit field left by two, which discards the reserved and DF
/// bits, and reports any remaining bit. That leaves MF plus the 13-bit offset,
/// but the two flag bits are dropped by the shift rather than by a mask.
#[inline]
pub const fn is_fragmented(frag_field: u16) -> bool {
    (frag_field << 2) != 0
}

/// Read-only view over the fixed 20-byte part of an IPv4 header.
#[derive(Clone, Copy, Debug)]
pub struct Ipv4Header<'a> {
    bytes: &'a [u8; IPV4_LEN],
    offset: usize,
}

impl<'a> Ipv4Header<'a> {
    /// View the IPv4 header starting at `offset` in `buf`.
    ///
    /// Only the length is checked here; callers decide what a version other
    /// than 4 means.
    pub fn new(buf: &'a [u8], offset: usize) -> Result<Self, ViewError> {
        Ok(Self { bytes: view::<IPV4_LEN>(buf, offset)?, offset })
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.bytes[0] >> 4
    }

    /// Header length in 32-bit words.
    #[inline]
    pub fn ihl(&self) -> u8 {
        self.bytes[0] & 0x0F
    }

    /// Header length in bytes, options included.
    #[inline]
    pub fn header_len(&self) -> usize {
        usize::from(self.ihl()) * 4
    }

    #[inline]
    pub fn total_len(&self) -> u16 {
        u16::from_be_bytes([self.bytes[2], self.bytes[3]])
    }

    #[inline]
    pub fn identification(&self) -> u16 {
        u16::from_be_bytes([self.bytes[4], self.bytes[5]])
    }

    /// Raw flags + fragment offset field, host order.
    #[inline]
    pub fn frag_field(&self) -> u16 {
        u16::from_be_bytes([self.bytes[6], self.bytes[7]])
    }

    #[inline]
    pub fn is_fragmented(&self) -> bool {
        is_fragmented(self.frag_field())
    }

    #[inline]
    pub fn ttl(&self) -> u8 {
        self.bytes[8]
    }

    #[inline]
    pub fn protocol(&self) -> u8 {
        self.bytes[9]
    }

    #[inline]
    pub fn src_addr(&self) -> u32 {
        u32::from_be_bytes([self.bytes[12], self.bytes[13], self.bytes[14], self.bytes[15]])
    }

    #[inline]
    pub fn dst_addr(&self) -> u32 {
        u32::from_be_bytes([self.bytes[16], self.bytes[17], self.bytes[18], self.bytes[19]])
    }

    pub fn src(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.src_addr())
    }

    pub fn dst(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dst_addr())
    }

    /// Offset of the transport header within the buffer this view was built
    /// from, or `None` when the IHL is below the 5-word minimum.
    pub fn transport_offset(&self) -> Option<usize> {
        let len = self.header_len();
        if len < IPV4_LEN {
            return None;
        }
        self.offset.checked_add(len)
    }
}
