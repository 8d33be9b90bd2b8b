use crate::float::FloatFormat;
use crate::packet::INET_ECN_MASK;

/// ECN codepoint carried in the low two bits of the TOS byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ecn {
    NotEct,
    Ect1,
    Ect0,
    Ce,
}

impl Ecn {
    pub fn from_tos(tos: u8) -> Self {
        match tos & INET_ECN_MASK {
            0b00 => Ecn::NotEct,
            0b01 => Ecn::Ect1,
            0b10 => Ecn::Ect0,
            _ => Ecn::Ce,
        }
    }

    /// Drops of ECN-capable packets are counted separately.
    pub fn is_ect(self) -> bool {
        self != Ecn::NotEct
    }
}

/// Per-queue drop counters reported to the traffic analyzer.
///
/// Owned by a single queue and touched only from its packet path, so
/// there is no locking here. The counters are u32 and saturate rather
/// than wrap; a queue would need more than 4e9 drops without sending a
/// single stampable packet to reach that.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestbedMetrics {
    drops_ecn: u32,
    drops_nonecn: u32,
}

impl TestbedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.drops_ecn = 0;
        self.drops_nonecn = 0;
    }

    pub fn drops_ecn(&self) -> u32 {
        self.drops_ecn
    }

    pub fn drops_nonecn(&self) -> u32 {
        self.drops_nonecn
    }

    fn counter(&mut self, ecn_marked: bool) -> &mut u32 {
        if ecn_marked {
            &mut self.drops_ecn
        } else {
            &mut self.drops_nonecn
        }
    }

    pub fn record_drop(&mut self, ecn_marked: bool) {
        let c = self.counter(ecn_marked);
        *c = c.saturating_add(1);
    }

    /// Encode the drops accumulated for one ECN domain and keep only what
    /// the encoding could not represent.
    ///
    /// Call at most once per stamped packet: every call reports (and
    /// forgets) the representable part of the counter.
    pub fn take_encoded_drops(&mut self, ecn_marked: bool) -> u32 {
        let c = self.counter(ecn_marked);
        let (drops, remainder) = FloatFormat::DROPS.encode(*c);
        *c = remainder;
        drops
    }
}
