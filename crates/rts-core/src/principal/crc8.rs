//! CRC-8
//!
//! Polynomial 0x07 (x^8 + x^2 + x + 1), initial value 0, MSB first, no
//! reflection, no final XOR.

const POLY: u8 = 0x07;

/// Checksum of `data`
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |crc, &byte| {
        (0..8).fold(crc ^ byte, |crc, _| {
            if crc & 0x80 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            }
        })
    })
}
