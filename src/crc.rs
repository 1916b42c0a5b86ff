//! RTCM3 frame checksum
use crate::constants::Constants;

const fn crc24q_table() -> [u32; 256] {
    let mut table = [0_u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 16;
        let mut bit = 0;
        while bit < 8 {
            crc <<= 1;
            if crc & 0x100_0000 != 0 {
                crc ^= Constants::CRC24Q_POLY;
            }
            bit += 1;
        }
        table[i] = crc & 0xff_ffff;
        i += 1;
    }
    table
}

static CRC24Q_LUT: [u32; 256] = crc24q_table();

/// RTCM3 CRC24Q Calculator (Qualcomm polynomial 0x1864CFB, zero seed).
/// The checksum covers the 3 header bytes and the payload.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Crc24 {
    value: u32,
}

impl Crc24 {
    /// Creates a new [Crc24] calculator
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the running checksum with new bytes
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            let index = ((self.value >> 16) as u8 ^ b) as usize;
            self.value = ((self.value << 8) ^ CRC24Q_LUT[index]) & 0xff_ffff;
        }
    }

    /// Returns current checksum
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Calculates checksum from buffer content.
    pub fn calc_from_bytes(bytes: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(bytes);
        crc.value()
    }

    /// Verifies a complete frame (header, payload, 3 CRC bytes)
    pub fn frame_ok(frame: &[u8]) -> bool {
        if frame.len() < 6 {
            return false;
        }
        let (content, crc) = frame.split_at(frame.len() - 3);
        let expected = ((crc[0] as u32) << 16) | ((crc[1] as u32) << 8) | crc[2] as u32;
        Self::calc_from_bytes(content) == expected
    }
}
