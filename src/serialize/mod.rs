use crate::float::FloatFormat;

/// Bits of the identification field holding the encoded queue delay.
pub const QDELAY_BITS: u32 = 11;

/// The IPv4 identification field as stamped by the queue.
///
///    0                   1
///    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5
///   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///   |  drops  |    queue delay      |
///   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// `drops` counts packets dropped since the previous stamped packet of
/// the same ECN domain (2 mantissa / 3 exponent bits). `queue delay` is
/// the sojourn time of this packet in 1024 us ticks (7 mantissa / 4
/// exponent bits).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryField {
    pub drops: u16,
    pub qdelay: u16,
}

/// Decoded contents of a `TelemetryField`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Telemetry {
    pub drops: u32,
    pub qdelay_ticks: u32,
}

impl Telemetry {
    pub fn qdelay_micros(&self) -> u64 {
        u64::from(self.qdelay_ticks) << 10
    }
}

impl TelemetryField {
    /// Both arguments are already-encoded fields; excess bits are masked off.
    pub fn new(drops: u32, qdelay: u32) -> Self {
        TelemetryField {
            drops: (drops & FloatFormat::DROPS.max_encoded()) as u16,
            qdelay: (qdelay & FloatFormat::QDELAY.max_encoded()) as u16,
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.qdelay | (self.drops << QDELAY_BITS)
    }

    pub fn from_u16(id: u16) -> Self {
        TelemetryField::new(u32::from(id >> QDELAY_BITS), u32::from(id))
    }

    pub fn decode(&self) -> Telemetry {
        Telemetry {
            drops: FloatFormat::DROPS.decode(u32::from(self.drops)),
            qdelay_ticks: FloatFormat::QDELAY.decode(u32::from(self.qdelay)),
        }
    }
}
