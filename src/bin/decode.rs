//! Decode testbed telemetry from IPv4 identification fields.
//!
//!     decode 10370 0x2882
//!     decode --header 450005dc288240004006...
//!     decode --with_ethernet --header 0200000000010200...

use failure::{bail, format_err};
use slog::{error, info, o, warn};
use structopt::StructOpt;
use testbed::checksum::verify_ipv4_header;
use testbed::packet::{self, EthernetFrame, IpPacket, PacketBuffer, ETH_P_IP};
use testbed::{TelemetryField, IP_HEADER_LENGTH};

#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "decode", about = "decode queue telemetry stamped into IPv4 headers")]
struct Opt {
    /// IPv4 header (or frame, with --with_ethernet) as hex; may repeat
    #[structopt(long = "header")]
    headers: Vec<String>,
    /// Headers start with an Ethernet header
    #[structopt(long = "with_ethernet")]
    with_ethernet: bool,
    /// Identification field values, decimal or 0x-prefixed hex
    ids: Vec<String>,
}

fn parse_id(s: &str) -> Result<u16, failure::Error> {
    let id = if s.starts_with("0x") || s.starts_with("0X") {
        u16::from_str_radix(&s[2..], 16)?
    } else {
        s.parse::<u16>()?
    };

    Ok(id)
}

/// Accepts plain hex, optionally split up by whitespace or colons.
fn parse_hex(s: &str) -> Result<Vec<u8>, failure::Error> {
    let digits: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits).map_err(|e| format_err!("bad hex {:?}: {}", s, e))
}

/// Pull the identification field out of a captured header, checking
/// that the header survived stamping intact.
fn header_id(log: &slog::Logger, buf: &mut [u8], with_ethernet: bool) -> Result<u16, failure::Error> {
    let (proto, off) = if with_ethernet {
        let p = EthernetFrame::new(buf);
        (p.protocol(), p.network_offset())
    } else {
        let p = IpPacket::new(buf);
        (p.protocol(), p.network_offset())
    };

    if proto != ETH_P_IP {
        bail!("not an IPv4 packet (protocol {:#06x})", proto);
    }

    if buf.len() < off + IP_HEADER_LENGTH {
        bail!("truncated IPv4 header: {} bytes", buf.len().saturating_sub(off));
    }

    let ip = &buf[off..];
    if !verify_ipv4_header(ip) {
        warn!(log, "bad header checksum"; "checksum" => packet::ipv4_checksum(ip));
    }

    let (src, dst) = packet::unpack_ips(ip);
    info!(log, "header"; "src" => %src, "dst" => %dst, "tos" => packet::ipv4_tos(ip));
    Ok(packet::ipv4_id(ip))
}

fn report(log: &slog::Logger, id: u16) {
    let field = TelemetryField::from_u16(id);
    let t = field.decode();
    info!(log, "telemetry";
        "id" => id,
        "drops" => t.drops,
        "qdelay_ticks" => t.qdelay_ticks,
        "qdelay_us" => t.qdelay_micros(),
        "drops_field" => field.drops,
        "qdelay_field" => field.qdelay,
    );
}

fn run(log: &slog::Logger, opt: Opt) -> Result<(), failure::Error> {
    if opt.ids.is_empty() && opt.headers.is_empty() {
        bail!("nothing to decode: pass identification values or --header");
    }

    for s in &opt.ids {
        report(log, parse_id(s)?);
    }

    for (i, h) in opt.headers.iter().enumerate() {
        let hlog = log.new(o!("header" => i));
        let mut buf = parse_hex(h)?;
        let id = header_id(&hlog, &mut buf, opt.with_ethernet)?;
        report(&hlog, id);
    }

    Ok(())
}

fn main() {
    let opt = Opt::from_args();
    let log = testbed::make_logger();

    let code = match run(&log, opt) {
        Ok(()) => 0,
        Err(e) => {
            error!(log, "decode failed"; "err" => %e);
            1
        }
    };

    // flush the async drain before exiting
    drop(log);
    std::process::exit(code);
}
