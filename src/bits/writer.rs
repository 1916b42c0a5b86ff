use crate::Error;

/// [BitWriter] packs MSB first bit fields into a growable buffer.
/// Each write is range checked: a value that does not fit
/// its field is rejected with [Error::FieldOutOfRange] and nothing is written.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// Total bits written
    len: usize,
}

impl BitWriter {
    /// Creates a new empty [BitWriter]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of bits written so far
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, width: usize, value: u64) {
        for i in (0..width).rev() {
            let bit = ((value >> i) & 0x01) as u8;
            if self.len % 8 == 0 {
                self.buf.push(0);
            }
            if bit > 0 {
                let last = self.buf.len() - 1;
                self.buf[last] |= 0x80 >> (self.len % 8);
            }
            self.len += 1;
        }
    }

    /// Writes `value` as an unsigned integer on `width` bits (1..=64).
    pub fn write_unsigned(&mut self, width: u8, value: u64) -> Result<(), Error> {
        if width == 0 || width > 64 || (width < 64 && value >> width > 0) {
            return Err(Error::FieldOutOfRange(width));
        }
        self.push(width as usize, value);
        Ok(())
    }

    /// Writes a single bit flag.
    pub fn write_bool(&mut self, flag: bool) -> Result<(), Error> {
        self.write_unsigned(1, flag as u64)
    }

    /// Writes `value` as a two's complement integer on `width` bits.
    pub fn write_signed(&mut self, width: u8, value: i64) -> Result<(), Error> {
        if width == 0 || width > 64 {
            return Err(Error::FieldOutOfRange(width));
        }
        if width < 64 {
            let max = 1_i64 << (width - 1);
            if value < -max || value >= max {
                return Err(Error::FieldOutOfRange(width));
            }
        }
        let mask = if width == 64 {
            u64::MAX
        } else {
            (1_u64 << width) - 1
        };
        self.push(width as usize, value as u64 & mask);
        Ok(())
    }

    /// Writes `value` as a sign-magnitude integer on `width` bits
    /// (MSB is the sign bit). Zero is always encoded as positive zero.
    pub fn write_signed_magnitude(&mut self, width: u8, value: i64) -> Result<(), Error> {
        if width < 2 || width > 64 {
            return Err(Error::FieldOutOfRange(width));
        }
        let magnitude = value.unsigned_abs();
        if magnitude >> (width - 1) > 0 {
            return Err(Error::FieldOutOfRange(width));
        }
        let sign = if value < 0 { 1_u64 << (width - 1) } else { 0 };
        self.push(width as usize, sign | magnitude);
        Ok(())
    }

    fn quantize(width: u8, value: f64, scale: f64) -> Result<i64, Error> {
        let quantized = (value / scale).round();
        if !quantized.is_finite() || quantized.abs() >= 9.2e18 {
            return Err(Error::FieldOutOfRange(width));
        }
        Ok(quantized as i64)
    }

    /// Quantizes `value` with `scale` (round to nearest) then writes it unsigned.
    pub fn write_scaled_unsigned(&mut self, width: u8, value: f64, scale: f64) -> Result<(), Error> {
        let quantized = Self::quantize(width, value, scale)?;
        if quantized < 0 {
            return Err(Error::FieldOutOfRange(width));
        }
        self.write_unsigned(width, quantized as u64)
    }

    /// Quantizes `value` with `scale` (round to nearest) then writes it
    /// as a two's complement integer.
    pub fn write_scaled(&mut self, width: u8, value: f64, scale: f64) -> Result<(), Error> {
        let quantized = Self::quantize(width, value, scale)?;
        self.write_signed(width, quantized)
    }

    /// Quantizes `value` with `scale` (round to nearest) then writes it
    /// in sign-magnitude representation.
    pub fn write_scaled_signed_magnitude(
        &mut self,
        width: u8,
        value: f64,
        scale: f64,
    ) -> Result<(), Error> {
        let quantized = Self::quantize(width, value, scale)?;
        self.write_signed_magnitude(width, quantized)
    }

    /// Writes a (length byte, characters) string.
    pub fn write_string(&mut self, s: &str) -> Result<(), Error> {
        let bytes = s.as_bytes();
        if bytes.len() > 255 {
            return Err(Error::FieldOutOfRange(8));
        }
        self.push(8, bytes.len() as u64);
        for b in bytes {
            self.push(8, *b as u64);
        }
        Ok(())
    }

    /// Zero pads to the next byte boundary.
    pub fn align(&mut self) {
        let pad = (8 - self.len % 8) % 8;
        self.push(pad, 0);
    }

    /// Consumes [Self], returns zero padded bytes
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.align();
        self.buf
    }
}
