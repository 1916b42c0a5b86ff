use crate::Error;

/// [BitReader] extracts MSB first bit fields from a byte slice,
/// at arbitrary bit offsets. It never reads past the slice:
/// any overrun is reported as [Error::FieldOverrun].
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    /// Cursor, in bits
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new [BitReader] positioned on the first bit of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor position, in bits.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bits left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() * 8 - self.pos
    }

    fn ensure(&self, nbits: usize) -> Result<(), Error> {
        if nbits > self.remaining() {
            Err(Error::FieldOverrun)
        } else {
            Ok(())
        }
    }

    /// Skips `nbits` bits (reserved fields).
    pub fn skip(&mut self, nbits: usize) -> Result<(), Error> {
        self.ensure(nbits)?;
        self.pos += nbits;
        Ok(())
    }

    /// Reads an unsigned integer on `width` bits (1..=64).
    pub fn read_unsigned(&mut self, width: u8) -> Result<u64, Error> {
        let width = width as usize;
        if width == 0 || width > 64 {
            return Err(Error::FieldOverrun);
        }
        self.ensure(width)?;

        let mut value = 0_u64;
        let mut left = width;

        while left > 0 {
            let byte = self.buf[self.pos / 8] as u64;
            let available = 8 - self.pos % 8;
            let take = available.min(left);
            let bits = (byte >> (available - take)) & ((1 << take) - 1);
            value = (value << take) | bits;
            self.pos += take;
            left -= take;
        }

        Ok(value)
    }

    /// Reads a single bit flag.
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_unsigned(1)? == 1)
    }

    /// Reads an unsigned field that must fit in `bits`, the cursor
    /// does not move when `width` is wider.
    fn read_narrow(&mut self, width: u8, bits: u8) -> Result<u64, Error> {
        if width > bits {
            return Err(Error::FieldOutOfRange(width));
        }
        self.read_unsigned(width)
    }

    pub fn read_u8(&mut self, width: u8) -> Result<u8, Error> {
        Ok(self.read_narrow(width, 8)? as u8)
    }

    pub fn read_u16(&mut self, width: u8) -> Result<u16, Error> {
        Ok(self.read_narrow(width, 16)? as u16)
    }

    pub fn read_u32(&mut self, width: u8) -> Result<u32, Error> {
        Ok(self.read_narrow(width, 32)? as u32)
    }

    /// Reads a two's complement signed integer on `width` bits.
    pub fn read_signed(&mut self, width: u8) -> Result<i64, Error> {
        let raw = self.read_unsigned(width)?;
        let shift = 64 - width as u32;
        // sign extension
        Ok(((raw << shift) as i64) >> shift)
    }

    /// Reads a sign-magnitude integer on `width` bits:
    /// MSB is the sign bit, remaining bits are the magnitude.
    /// This is the GLONASS native representation.
    pub fn read_signed_magnitude(&mut self, width: u8) -> Result<i64, Error> {
        let raw = self.read_unsigned(width)?;
        let sign = raw >> (width - 1) & 0x01;
        let magnitude = (raw & ((1_u64 << (width - 1)) - 1)) as i64;
        if sign > 0 {
            Ok(-magnitude)
        } else {
            Ok(magnitude)
        }
    }

    /// Reads an unsigned field and applies `scale`.
    pub fn read_scaled_unsigned(&mut self, width: u8, scale: f64) -> Result<f64, Error> {
        Ok(self.read_unsigned(width)? as f64 * scale)
    }

    /// Reads a two's complement field and applies `scale`.
    pub fn read_scaled(&mut self, width: u8, scale: f64) -> Result<f64, Error> {
        Ok(self.read_signed(width)? as f64 * scale)
    }

    /// Reads a sign-magnitude field and applies `scale`.
    pub fn read_scaled_signed_magnitude(&mut self, width: u8, scale: f64) -> Result<f64, Error> {
        Ok(self.read_signed_magnitude(width)? as f64 * scale)
    }

    /// Reads a (length byte, characters) string.
    /// Non UTF-8 characters are replaced, descriptors are ASCII anyway.
    pub fn read_string(&mut self) -> Result<String, Error> {
        let len = self.read_unsigned(8)? as usize;
        self.ensure(len * 8)?;
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(self.read_unsigned(8)? as u8);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
