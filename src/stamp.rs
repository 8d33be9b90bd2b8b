//! Stamp queue telemetry into outgoing packets.
//!
//! For IPv4 the identification field is replaced by a `TelemetryField`
//! and the header checksum is patched incrementally. Nothing else in the
//! packet changes. Stamping is best effort: if the header can't be
//! written the packet leaves untouched and the drop counters keep their
//! value for the next packet.

use std::time::Duration;

use failure::Fail;

use crate::checksum;
use crate::float::FloatFormat;
use crate::metrics::{Ecn, TestbedMetrics};
use crate::packet::{self, PacketBuffer, ETH_P_IP, ETH_P_IPV6};
use crate::serialize::TelemetryField;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum StampError {
    #[fail(display = "need {} writable header bytes", needed)]
    HeaderUnavailable { needed: usize },
    // TODO carry the telemetry in the IPv6 flow label
    #[fail(display = "IPv6 packets are not stamped")]
    Ipv6Unsupported,
    #[fail(display = "unsupported network protocol {:#06x}", _0)]
    UnsupportedProtocol(u16),
}

/// Convert a sojourn time into 1024 us ticks.
pub fn qdelay_ticks(sojourn: Duration) -> u32 {
    let ticks = sojourn.as_micros() >> 10;
    if ticks > u128::from(u32::MAX) {
        u32::MAX
    } else {
        ticks as u32
    }
}

/// Stamp `pkt`, reporting why it was left alone if it was.
///
/// On success returns the field now stored in the identification field.
pub fn try_stamp<P: PacketBuffer + ?Sized>(
    pkt: &mut P,
    metrics: &mut TestbedMetrics,
    qdelay: u32,
) -> Result<TelemetryField, StampError> {
    // the quantization error of the delay is not carried anywhere
    let (qdelay, _) = FloatFormat::QDELAY.encode(qdelay);

    let proto = pkt.protocol();
    let wlen = pkt.network_offset()
        + packet::network_header_length(proto).ok_or(StampError::UnsupportedProtocol(proto))?;
    let off = pkt.network_offset();
    let buf = pkt
        .make_writable(wlen)
        .ok_or(StampError::HeaderUnavailable { needed: wlen })?;

    match proto {
        ETH_P_IP => Ok(stamp_ipv4(&mut buf[off..], metrics, qdelay)),
        ETH_P_IPV6 => Err(StampError::Ipv6Unsupported),
        _ => Err(StampError::UnsupportedProtocol(proto)),
    }
}

/// Best-effort `try_stamp`: a packet that can't be stamped is simply
/// forwarded as it is.
pub fn stamp<P: PacketBuffer + ?Sized>(
    pkt: &mut P,
    metrics: &mut TestbedMetrics,
    qdelay: u32,
) -> Option<TelemetryField> {
    try_stamp(pkt, metrics, qdelay).ok()
}

fn stamp_ipv4(ip_header: &mut [u8], metrics: &mut TestbedMetrics, qdelay: u32) -> TelemetryField {
    let ecn = Ecn::from_tos(packet::ipv4_tos(ip_header));
    let drops = metrics.take_encoded_drops(ecn.is_ect());
    let field = TelemetryField::new(drops, qdelay);

    let old_id = packet::ipv4_id(ip_header);
    let id = field.as_u16();
    let check = checksum::incremental_update(packet::ipv4_checksum(ip_header), old_id, id);
    packet::set_ipv4_id(ip_header, id, check);
    field
}
