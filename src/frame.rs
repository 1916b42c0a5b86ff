//! RTCM3 framing and stream synchronization
#[cfg(feature = "log")]
use log::{debug, warn};

use crate::{bits::BitReader, constants::Constants, crc::Crc24, Error};

/// [Frame] is one CRC validated RTCM3 message
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// 12 bit message number
    pub message_type: u16,
    /// Payload (message number included)
    pub payload: Vec<u8>,
}

impl Frame {
    /// Header (preamble + reserved + length) size
    pub const HEADER_SIZE: usize = 3;

    /// Header and CRC overhead
    pub const OVERHEAD: usize = 6;

    /// Builds a [Frame] from a raw payload.
    pub fn new(payload: Vec<u8>) -> Result<Self, Error> {
        if payload.len() > Constants::MAX_PAYLOAD_SIZE {
            return Err(Error::FrameTooLarge);
        }
        let message_type = BitReader::new(&payload).read_u16(12)?;
        Ok(Self {
            message_type,
            payload,
        })
    }

    /// Total encoded size, in bytes
    pub fn encoding_size(&self) -> usize {
        self.payload.len() + Self::OVERHEAD
    }

    /// Encodes [Self]: preamble, length, payload and CRC24
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        Self::wrap(&self.payload)
    }

    /// Wraps `payload` into a complete RTCM3 frame
    pub(crate) fn wrap(payload: &[u8]) -> Result<Vec<u8>, Error> {
        let size = payload.len();
        if size > Constants::MAX_PAYLOAD_SIZE {
            return Err(Error::FrameTooLarge);
        }

        let mut bytes = Vec::with_capacity(size + Self::OVERHEAD);
        bytes.push(Constants::SYNC);
        bytes.push(((size >> 8) & 0x03) as u8);
        bytes.push((size & 0xff) as u8);
        bytes.extend_from_slice(payload);

        let crc = Crc24::calc_from_bytes(&bytes);
        bytes.push((crc >> 16) as u8);
        bytes.push((crc >> 8) as u8);
        bytes.push(crc as u8);
        Ok(bytes)
    }

    /// Payload length announced by a frame header, if enough bytes are present
    pub(crate) fn announced_size(buf: &[u8]) -> Option<usize> {
        if buf.len() < Self::HEADER_SIZE {
            None
        } else {
            Some((((buf[1] & 0x03) as usize) << 8) | buf[2] as usize)
        }
    }

    /// Decodes a [Frame] that must start on the very first byte of `buf`.
    /// Returns the [Frame] and the total number of bytes it spans.
    /// The 6 reserved header bits are ignored.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), Error> {
        if buf.is_empty() {
            return Err(Error::NotEnoughBytes);
        }
        if buf[0] != Constants::SYNC {
            return Err(Error::InvalidFrame);
        }

        let size = Self::announced_size(buf).ok_or(Error::NotEnoughBytes)?;
        let total = size + Self::OVERHEAD;
        if buf.len() < total {
            return Err(Error::NotEnoughBytes);
        }

        if !Crc24::frame_ok(&buf[..total]) {
            return Err(Error::CrcMismatch);
        }

        let payload = buf[Self::HEADER_SIZE..Self::HEADER_SIZE + size].to_vec();
        let frame = Self::new(payload)?;
        Ok((frame, total))
    }
}

/// [Framer] is the resumable frame synchronizer.
/// Push bytes as they arrive (any chunk size), then pull [Frame]s.
/// Incomplete frames remain buffered untouched until enough bytes arrived.
#[derive(Debug, Clone, Default)]
pub struct Framer {
    buffer: Vec<u8>,
    /// Total bytes dropped while hunting for a frame
    skipped: usize,
}

impl Framer {
    /// Creates a new [Framer]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends new bytes to the internal buffer
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes waiting in the internal buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total number of bytes dropped during resynchronization
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Discards the internal buffer
    pub fn reset(&mut self) {
        self.skipped += self.buffer.len();
        self.buffer.clear();
    }

    fn drop_front(&mut self, n: usize) {
        self.skipped += n;
        self.buffer.drain(..n);
    }

    /// Returns next valid [Frame], or None if more bytes are needed.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match self.buffer.iter().position(|b| *b == Constants::SYNC) {
                Some(0) => {},
                Some(pos) => {
                    #[cfg(feature = "log")]
                    debug!("resync: dropping {} bytes", pos);
                    self.drop_front(pos);
                },
                None => {
                    let n = self.buffer.len();
                    if n > 0 {
                        #[cfg(feature = "log")]
                        debug!("no sync: dropping {} bytes", n);
                        self.drop_front(n);
                    }
                    return None;
                },
            }

            match Frame::decode(&self.buffer) {
                Ok((frame, size)) => {
                    self.buffer.drain(..size);
                    return Some(frame);
                },
                Err(Error::NotEnoughBytes) => {
                    return None;
                },
                Err(_e) => {
                    #[cfg(feature = "log")]
                    warn!("frame rejected: {}", _e);
                    self.drop_front(1);
                },
            }
        }
    }
}

impl Iterator for Framer {
    type Item = Frame;
    fn next(&mut self) -> Option<Frame> {
        self.next_frame()
    }
}
