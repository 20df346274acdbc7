use rxtap_common::{network_offset, EthernetHeader};
use rxtap_lib::LinkLayer;

/// Whether an Ethernet frame was sent by the interface itself.
///
/// AF_PACKET reports both directions; frames carrying the interface's own
/// source address are its transmissions. Interfaces without a hardware
/// address (loopback reports all zeros) cannot be told apart this way.
pub(crate) fn is_outgoing(frame: &[u8], own_mac: Option<[u8; 6]>) -> bool {
    match own_mac {
        Some(mac) if mac != [0; 6] => {
            EthernetHeader::new(frame, 0).is_ok_and(|eth| eth.source() == mac)
        }
        _ => false,
    }
}

/// The part of a received frame the classifier should see.
///
/// With Ethernet framing the link header and VLAN tags are skipped; frames
/// whose innermost EtherType is not IPv4, or that are too short to locate it,
/// yield `None` and are not delivered.
pub(crate) fn network_payload(frame: &[u8], link_layer: LinkLayer) -> Option<&[u8]> {
    match link_layer {
        LinkLayer::Raw => Some(frame),
        LinkLayer::Ethernet => match network_offset(frame) {
            Ok(layer) if layer.is_ipv4() => frame.get(layer.offset..),
            _ => None,
        },
    }
}
