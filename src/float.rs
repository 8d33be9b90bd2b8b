//! Compact unsigned "float" encoding for counters stamped into packets.
//!
//! A field of `m + e` bits holds a value as `e` exponent bits over `m`
//! mantissa bits. There is no sign and no special values.
//!
//!    field:   | exponent (e bits) | mantissa (m bits) |
//!
//! Fields below `2 << m` are taken literally (exponent 0 and 1 share the
//! linear range). Above that, exponent `x` means an implicit leading one
//! shifted left by `x - 1`:
//!
//!    value = (mantissa + 2^m) << (x - 1)
//!
//! Encoding always rounds down. The bits that were shifted away are
//! handed back to the caller as the remainder, so a counter can carry
//! them into its next report.

/// Bit layout of one compact float field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloatFormat {
    pub mantissa_bits: u32,
    pub exponent_bits: u32,
}

impl FloatFormat {
    /// Drop counts: 5 bits.
    pub const DROPS: FloatFormat = FloatFormat::new(2, 3);
    /// Queue delay in 1024 us ticks: 11 bits.
    pub const QDELAY: FloatFormat = FloatFormat::new(7, 4);

    /// Panics (at compile time for constants) if the largest decodable
    /// value does not fit in a u32.
    pub const fn new(mantissa_bits: u32, exponent_bits: u32) -> Self {
        assert!(exponent_bits >= 1 && exponent_bits < 6);
        assert!(mantissa_bits + 1 + (1 << exponent_bits) - 2 <= 32);
        FloatFormat {
            mantissa_bits,
            exponent_bits,
        }
    }

    pub const fn field_bits(&self) -> u32 {
        self.mantissa_bits + self.exponent_bits
    }

    /// The all-ones field.
    pub const fn max_encoded(&self) -> u32 {
        (1 << self.field_bits()) - 1
    }

    /// Largest value the field can represent, i.e. `decode(max_encoded())`.
    pub const fn max_value(&self) -> u32 {
        let max_e = (1 << self.exponent_bits) - 1;
        let max_m = (1 << self.mantissa_bits) - 1;
        ((max_m << 1) + 1) << (max_e - 1)
    }

    pub fn encode(&self, value: u32) -> (u32, u32) {
        encode(value, self.mantissa_bits, self.exponent_bits)
    }

    pub fn decode(&self, encoded: u32) -> u32 {
        decode(encoded, self.mantissa_bits, self.exponent_bits)
    }
}

/// Decode a compact float field back into an integer.
///
/// `encoded` is masked to `m_b + e_b` bits first, so any bit pattern
/// decodes to something.
pub fn decode(encoded: u32, m_b: u32, e_b: u32) -> u32 {
    let m_max = 1u32 << m_b;
    let fl = encoded & ((m_max << e_b) - 1);

    if fl < (m_max << 1) {
        fl
    } else {
        ((fl & (m_max - 1)) + m_max) << ((fl >> m_b) - 1)
    }
}

/// Encode `value` into `m_b + e_b` bits, rounding down.
///
/// Returns `(encoded, remainder)` where
/// `decode(encoded) + remainder == value`. Values at or beyond the
/// largest representable one saturate to the all-ones field and the
/// whole excess becomes the remainder.
pub fn encode(value: u32, m_b: u32, e_b: u32) -> (u32, u32) {
    let max_e = (1u32 << e_b) - 1;
    let max_m = (1u32 << m_b) - 1;
    let max_fl = ((max_m << 1) + 1) << (max_e - 1);

    if value < (1 << (m_b + 1)) {
        // exponent 0 or 1: stored as is
        return (value, 0);
    }

    if value >= max_fl {
        return ((1 << (m_b + e_b)) - 1, value - max_fl);
    }

    // position of the leading one
    let len = 31 - value.leading_zeros();
    let exponent = len - m_b;
    let mantissa = (value >> exponent) & max_m;
    let remainder = value & ((1 << exponent) - 1);

    (((exponent + 1) << m_b) | mantissa, remainder)
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, FloatFormat};

    const FORMATS: [FloatFormat; 2] = [FloatFormat::DROPS, FloatFormat::QDELAY];

    #[test]
    fn limits() {
        assert_eq!(FloatFormat::DROPS.field_bits(), 5);
        assert_eq!(FloatFormat::DROPS.max_encoded(), 0x1f);
        assert_eq!(FloatFormat::DROPS.max_value(), 448);
        assert_eq!(FloatFormat::QDELAY.field_bits(), 11);
        assert_eq!(FloatFormat::QDELAY.max_encoded(), 0x7ff);
        assert_eq!(FloatFormat::QDELAY.max_value(), 255 << 14);

        for f in FORMATS.iter() {
            assert_eq!(f.decode(f.max_encoded()), f.max_value());
        }
    }

    #[test]
    fn small_values_are_exact() {
        for f in FORMATS.iter() {
            for v in 0..(1 << (f.mantissa_bits + 1)) {
                assert_eq!(f.encode(v), (v, 0));
                assert_eq!(f.decode(v), v);
            }
        }
    }

    #[test]
    fn floor_rounding_law() {
        for f in FORMATS.iter() {
            for v in 0..=0x1_0000u32 {
                let (fl, r) = f.encode(v);
                assert!(fl <= f.max_encoded(), "v={} fl={}", v, fl);
                if v < f.max_value() {
                    assert_eq!(f.decode(fl) + r, v, "v={}", v);
                }
                assert!(f.decode(fl) <= v);
            }
        }
    }

    #[test]
    fn saturation() {
        for f in FORMATS.iter() {
            let max = f.max_value();
            for v in [max, max + 1, max + 1000, u32::MAX].iter() {
                assert_eq!(f.encode(*v), (f.max_encoded(), v - max));
            }
        }

        assert_eq!(encode(449, 2, 3), (31, 1));
        assert_eq!(encode(0xffff, 2, 3), (31, 0xffff - 448));
    }

    #[test]
    fn encode_is_monotonic() {
        for f in FORMATS.iter() {
            let mut prev = 0;
            for v in 0..=0x1_0000u32 {
                let (fl, _) = f.encode(v);
                assert!(fl >= prev, "v={}", v);
                prev = fl;
            }
        }
    }

    #[test]
    fn every_field_round_trips() {
        for f in FORMATS.iter() {
            let mut prev = None;
            for fl in 0..=f.max_encoded() {
                let v = f.decode(fl);
                assert_eq!(f.encode(v), (fl, 0), "fl={}", fl);
                if let Some(p) = prev {
                    assert!(v > p, "decode not strictly increasing at {}", fl);
                }
                prev = Some(v);
            }
        }
    }

    #[test]
    fn known_values() {
        assert_eq!(encode(5, 2, 3), (5, 0));
        assert_eq!(encode(130, 7, 4), (130, 0));
        // 8 = 0b1000: leading one at bit 3, exponent 1
        assert_eq!(encode(8, 2, 3), (0b10_00, 0));
        // 13 = 0b1101 -> mantissa 0b10, one bit dropped
        assert_eq!(encode(13, 2, 3), (0b10_10, 1));
        assert_eq!(decode(0b10_10, 2, 3), 12);
        // 300 = 0b1_0010_1100 -> exponent 1, mantissa 0b0010110
        assert_eq!(encode(300, 7, 4), ((2 << 7) | 0b001_0110, 0));
        assert_eq!(encode(301, 7, 4), ((2 << 7) | 0b001_0110, 1));
    }

    #[test]
    fn decode_masks_input() {
        assert_eq!(decode(0x20 | 5, 2, 3), 5);
        assert_eq!(decode(0xffff_ffff, 2, 3), 448);
        assert_eq!(decode(0xf800 | 130, 7, 4), 130);
    }
}
