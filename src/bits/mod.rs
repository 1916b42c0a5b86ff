//! Bit level cursors. RTCM3 fields are MSB first and not byte aligned.
mod reader;
mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;
