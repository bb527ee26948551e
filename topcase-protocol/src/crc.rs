//! CRC-16 used for both packet and message integrity
//!
//! This is the reflected CRC-16 with polynomial 0x8005 (x^16 + x^15 + x^2 + 1),
//! also known as CRC-16/ARC when seeded with zero. The topcase firmware
//! checks both the packet trailer and the message trailer with it.

/// Reflected form of polynomial 0x8005
const POLY_REFLECTED: u16 = 0xA001;

/// Lookup table, one entry per input byte value
static TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY_REFLECTED
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the CRC-16 of `bytes`, continuing from `seed`
///
/// Passing the result of a previous call as `seed` continues the checksum
/// over concatenated input.
pub fn crc16(seed: u16, bytes: &[u8]) -> u16 {
    bytes.iter().fold(seed, |crc, &byte| {
        (crc >> 8) ^ TABLE[((crc ^ byte as u16) & 0xFF) as usize]
    })
}
