//! The view of a packet buffer the stamper needs.
//!
//! IP Header
//!
//!    0                   1                   2                   3
//!    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |Version|  IHL  |Type of Service|          Total Length         |
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |         Identification        |Flags|      Fragment Offset    |
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |  Time to Live |    Protocol   |         Header Checksum       |
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |                       Source Address                          |
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |                    Destination Address                        |
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |                    Options                    |    Padding    |
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use bytes::{BigEndian, ByteOrder};

use crate::checksum::IPV4_CHECKSUM_OFFSET;
use crate::{IPV6_HEADER_LENGTH, IP_HEADER_LENGTH, MAC_HEADER_LENGTH};

pub const ETH_P_IP: u16 = 0x0800;
pub const ETH_P_IPV6: u16 = 0x86dd;
pub const ETH_P_8021Q: u16 = 0x8100;
pub const ETH_P_8021AD: u16 = 0x88a8;

const VLAN_HEADER_LENGTH: usize = 4;
const ETHERTYPE_IN_MAC_HEADER: usize = 12;

pub const TOS_IN_IP_HEADER: usize = 1;
pub const ID_IN_IP_HEADER: usize = 4;

/// Low two bits of the TOS byte.
pub const INET_ECN_MASK: u8 = 0b11;

/// A packet buffer as seen by the stamper.
pub trait PacketBuffer {
    /// Ethertype of the network header, with VLAN tags already skipped.
    /// Zero if it cannot be determined.
    fn protocol(&self) -> u16;

    /// Offset of the network header from the start of the buffer.
    fn network_offset(&self) -> usize;

    /// Make the first `len` bytes of the buffer present and writable.
    /// `None` means they cannot be, and the packet must go out as is.
    fn make_writable(&mut self, len: usize) -> Option<&mut [u8]>;
}

/// An Ethernet frame, starting at the destination MAC.
#[derive(Debug)]
pub struct EthernetFrame<'a> {
    data: &'a mut [u8],
}

impl<'a> EthernetFrame<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        EthernetFrame { data }
    }

    pub fn into_inner(self) -> &'a mut [u8] {
        self.data
    }

    fn ethertype_at(&self, off: usize) -> Option<u16> {
        self.data
            .get(off..off + 2)
            .map(|b| BigEndian::read_u16(b))
    }

    fn is_vlan_tagged(&self) -> bool {
        match self.ethertype_at(ETHERTYPE_IN_MAC_HEADER) {
            Some(ETH_P_8021Q) | Some(ETH_P_8021AD) => true,
            _ => false,
        }
    }
}

impl<'a> PacketBuffer for EthernetFrame<'a> {
    fn protocol(&self) -> u16 {
        let off = if self.is_vlan_tagged() {
            ETHERTYPE_IN_MAC_HEADER + VLAN_HEADER_LENGTH
        } else {
            ETHERTYPE_IN_MAC_HEADER
        };

        self.ethertype_at(off).unwrap_or(0)
    }

    fn network_offset(&self) -> usize {
        if self.is_vlan_tagged() {
            MAC_HEADER_LENGTH + VLAN_HEADER_LENGTH
        } else {
            MAC_HEADER_LENGTH
        }
    }

    fn make_writable(&mut self, len: usize) -> Option<&mut [u8]> {
        self.data.get_mut(..len)
    }
}

/// A bare network-layer packet with no link header in front of it.
/// The protocol is inferred from the IP version nibble.
#[derive(Debug)]
pub struct IpPacket<'a> {
    data: &'a mut [u8],
}

impl<'a> IpPacket<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        IpPacket { data }
    }

    pub fn into_inner(self) -> &'a mut [u8] {
        self.data
    }
}

impl<'a> PacketBuffer for IpPacket<'a> {
    fn protocol(&self) -> u16 {
        match self.data.first().map(|b| b >> 4) {
            Some(4) => ETH_P_IP,
            Some(6) => ETH_P_IPV6,
            _ => 0,
        }
    }

    fn network_offset(&self) -> usize {
        0
    }

    fn make_writable(&mut self, len: usize) -> Option<&mut [u8]> {
        self.data.get_mut(..len)
    }
}

/// Bytes that must be writable to touch the network header of `proto`.
pub fn network_header_length(proto: u16) -> Option<usize> {
    match proto {
        ETH_P_IP => Some(IP_HEADER_LENGTH),
        ETH_P_IPV6 => Some(IPV6_HEADER_LENGTH),
        _ => None,
    }
}

pub fn ipv4_tos(ip_header: &[u8]) -> u8 {
    ip_header[TOS_IN_IP_HEADER]
}

pub fn ipv4_id(ip_header: &[u8]) -> u16 {
    BigEndian::read_u16(array_ref!(ip_header, ID_IN_IP_HEADER, 2))
}

pub fn ipv4_checksum(ip_header: &[u8]) -> u16 {
    BigEndian::read_u16(array_ref!(ip_header, IPV4_CHECKSUM_OFFSET, 2))
}

/// Overwrite the identification field together with its checksum.
pub fn set_ipv4_id(ip_header: &mut [u8], id: u16, check: u16) {
    BigEndian::write_u16(array_mut_ref!(ip_header, ID_IN_IP_HEADER, 2), id);
    BigEndian::write_u16(array_mut_ref!(ip_header, IPV4_CHECKSUM_OFFSET, 2), check);
}

pub fn unpack_ips(ip_header: &[u8]) -> (std::net::Ipv4Addr, std::net::Ipv4Addr) {
    (
        std::net::Ipv4Addr::from(*array_ref!(ip_header, 12, 4)),
        std::net::Ipv4Addr::from(*array_ref!(ip_header, 16, 4)),
    )
}
