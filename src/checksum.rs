//! Internet checksum (RFC 1071) over IPv4 headers, and the incremental
//! update from RFC 1624 used when a single header word is rewritten.

use bytes::{BigEndian, ByteOrder};

use crate::IP_HEADER_LENGTH;

/// Byte offset of the header checksum within the IPv4 header.
pub const IPV4_CHECKSUM_OFFSET: usize = 10;

/// Fold carries out of the low 16 bits until none are left.
pub fn fold(mut sum: u32) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    sum as u16
}

fn header_len(header: &[u8]) -> usize {
    let ihl = (header[0] & 0x0f) as usize * 4;
    std::cmp::min(std::cmp::max(ihl, IP_HEADER_LENGTH), header.len()) & !1
}

/// Compute the header checksum from scratch, treating the checksum
/// field itself as zero.
///
/// The header length is taken from the IHL nibble, clamped to the
/// slice. `header` must hold at least one byte.
pub fn ipv4_header_checksum(header: &[u8]) -> u16 {
    let len = header_len(header);
    let sum = header[..len]
        .chunks(2)
        .enumerate()
        .filter(|&(i, _)| i != IPV4_CHECKSUM_OFFSET / 2)
        .map(|(_, w)| u32::from(BigEndian::read_u16(w)))
        .sum::<u32>();

    !fold(sum)
}

/// A header is valid when all of its words, checksum included, sum to
/// negative zero.
pub fn verify_ipv4_header(header: &[u8]) -> bool {
    if header.len() < IP_HEADER_LENGTH {
        return false;
    }

    let len = header_len(header);
    let sum = header[..len]
        .chunks(2)
        .map(|w| u32::from(BigEndian::read_u16(w)))
        .sum::<u32>();

    fold(sum) == 0xffff
}

/// New checksum after one covered 16-bit word changes from `old_word`
/// to `new_word`.
///
/// RFC 1624, eqn. 3: `HC' = ~(~HC + ~m + m')`. In ones' complement terms
/// this adds the old word back into the checksum and subtracts the new
/// one. Unlike eqn. 2 it never yields 0xffff where a full recompute
/// gives 0x0000, so the result always matches `ipv4_header_checksum`.
pub fn incremental_update(old_check: u16, old_word: u16, new_word: u16) -> u16 {
    let sum = u32::from(!old_check) + u32::from(!old_word) + u32::from(new_word);
    !fold(sum)
}
