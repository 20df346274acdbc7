//! Link-layer framing in front of the network header.
//!
//! Some hosts (AF_PACKET sockets, for one) hand over complete Ethernet frames
//! while the classifier expects the IPv4 header at offset 0. These helpers
//! locate the network header behind an Ethernet II header and up to two VLAN
//! tags (802.1Q / QinQ).

use crate::view::{view, ViewError};

pub const ETH_LEN: usize = 14;
pub const VLAN_LEN: usize = 4;

pub const ETH_P_IP: u16 = 0x0800;
pub const ETH_P_8021Q: u16 = 0x8100;
pub const ETH_P_8021AD: u16 = 0x88A8;

const MAX_VLAN_TAGS: usize = 2;

#[derive(Clone, Copy, Debug)]
pub struct EthernetHeader<'a> {
    bytes: &'a [u8; ETH_LEN],
}

impl<'a> EthernetHeader<'a> {
    pub fn new(buf: &'a [u8], offset: usize) -> Result<Self, ViewError> {
        Ok(Self { bytes: view::<ETH_LEN>(buf, offset)? })
    }

    pub fn destination(&self) -> [u8; 6] {
        [self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3], self.bytes[4], self.bytes[5]]
    }

    pub fn source(&self) -> [u8; 6] {
        [self.bytes[6], self.bytes[7], self.bytes[8], self.bytes[9], self.bytes[10], self.bytes[11]]
    }

    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes([self.bytes[12], self.bytes[13]])
    }
}

/// Where the network layer starts inside a link-layer frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkLayer {
    /// Byte offset of the network header.
    pub offset: usize,
    /// EtherType of the innermost encapsulation.
    pub ether_type: u16,
}

impl NetworkLayer {
    pub fn is_ipv4(&self) -> bool {
        self.ether_type == ETH_P_IP
    }
}

/// Skip the Ethernet header and any VLAN tags at the start of `frame`.
pub fn network_offset(frame: &[u8]) -> Result<NetworkLayer, ViewError> {
    let eth = EthernetHeader::new(frame, 0)?;
    let mut offset = ETH_LEN;
    let mut ether_type = eth.ether_type();

    for _ in 0..MAX_VLAN_TAGS {
        if ether_type != ETH_P_8021Q && ether_type != ETH_P_8021AD {
            break;
        }
        // TCI (2 bytes) then the encapsulated EtherType.
        let tag = view::<VLAN_LEN>(frame, offset)?;
        ether_type = u16::from_be_bytes([tag[2], tag[3]]);
        offset += VLAN_LEN;
    }

    Ok(NetworkLayer { offset, ether_type })
}
