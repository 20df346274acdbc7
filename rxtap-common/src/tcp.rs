//! TCP header view.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Source Port          |       Destination Port        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Acknowledgment Number                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Data |       |C|E|U|A|P|R|S|F|                               |
//! | Offset| Rsrvd |W|C|R|C|S|S|Y|I|            Window             |
//! |       |       |R|E|G|K|H|T|N|N|                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Checksum            |         Urgent Pointer        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Only the fixed 20-byte header is viewed. Options are never parsed, and the
//! flag byte is read at a fixed position rather than derived from the data
//! offset.

use crate::view::{view, ViewError};

/// Length of the TCP header without options.
pub const TCP_LEN: usize = 20;

/// Position of the acknowledgment number within the header.
pub const ACK_SEQ_OFFSET: usize = 8;

/// Position of the control-flag byte: five bytes past the start of the
/// acknowledgment number, right after the data-offset/reserved byte.
pub const FLAGS_OFFSET: usize = ACK_SEQ_OFFSET + 5;

/// The eight TCP control bits, as carried in the flag byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TcpFlags(u8);

impl TcpFlags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
    pub const ECE: u8 = 0x40;
    pub const CWR: u8 = 0x80;

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    const fn has(self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    pub const fn cwr(self) -> bool {
        self.has(Self::CWR)
    }

    pub const fn ece(self) -> bool {
        self.has(Self::ECE)
    }

    pub const fn urg(self) -> bool {
        self.has(Self::URG)
    }

    pub const fn ack(self) -> bool {
        self.has(Self::ACK)
    }

    pub const fn psh(self) -> bool {
        self.has(Self::PSH)
    }

    pub const fn rst(self) -> bool {
        self.has(Self::RST)
    }

    pub const fn syn(self) -> bool {
        self.has(Self::SYN)
    }

    pub const fn fin(self) -> bool {
        self.has(Self::FIN)
    }
}

/// Read-only view over the fixed 20-byte part of a TCP header.
#[derive(Clone, Copy, Debug)]
pub struct TcpHeader<'a> {
    bytes: &'a [u8; TCP_LEN],
}

impl<'a> TcpHeader<'a> {
    /// View the TCP header starting at `offset` in `buf`.
    pub fn new(buf: &'a [u8], offset: usize) -> Result<Self, ViewError> {
        Ok(Self { bytes: view::<TCP_LEN>(buf, offset)? })
    }

    #[inline]
    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes([self.bytes[0], self.bytes[1]])
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes([self.bytes[2], self.bytes[3]])
    }

    #[inline]
    pub fn seq(&self) -> u32 {
        u32::from_be_bytes([self.bytes[4], self.bytes[5], self.bytes[6], self.bytes[7]])
    }

    #[inline]
    pub fn ack_seq(&self) -> u32 {
        u32::from_be_bytes([self.bytes[8], self.bytes[9], self.bytes[10], self.bytes[11]])
    }

    /// Data offset in 32-bit words.
    #[inline]
    pub fn data_offset(&self) -> u8 {
        self.bytes[12] >> 4
    }

    #[inline]
    pub fn flags(&self) -> TcpFlags {
        TcpFlags(self.bytes[FLAGS_OFFSET])
    }

    #[inline]
    pub fn window(&self) -> u16 {
        u16::from_be_bytes([self.bytes[14], self.bytes[15]])
    }

    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.bytes[16], self.bytes[17]])
    }

    #[inline]
    pub fn urg_ptr(&self) -> u16 {
        u16::from_be_bytes([self.bytes[18], self.bytes[19]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_offset_follows_ack_seq() {
        assert_eq!(FLAGS_OFFSET, 13);
    }

    #[test]
    fn test_flag_decomposition() {
        let flags = TcpFlags::from_bits(0b0010_1011);
        assert!(flags.fin());
        assert!(flags.syn());
        assert!(!flags.rst());
        assert!(flags.psh());
        assert!(!flags.ack());
        assert!(flags.urg());
        assert!(!flags.ece());
        assert!(!flags.cwr());
    }

    #[test]
    fn test_single_bit_positions() {
        let expected = [
            (TcpFlags::FIN, "fin"),
            (TcpFlags::SYN, "syn"),
            (TcpFlags::RST, "rst"),
            (TcpFlags::PSH, "psh"),
            (TcpFlags::ACK, "ack"),
            (TcpFlags::URG, "urg"),
            (TcpFlags::ECE, "ece"),
            (TcpFlags::CWR, "cwr"),
        ];
        for (bit, name) in expected {
            let f = TcpFlags::from_bits(bit);
            let set = [f.fin(), f.syn(), f.rst(), f.psh(), f.ack(), f.urg(), f.ece(), f.cwr()];
            assert_eq!(set.iter().filter(|b| **b).count(), 1, "{name} must set exactly one bit");
        }
    }
}
