#![allow(dead_code)]
use rtcm3::prelude::*;
use std::str::FromStr;

/// Replay time of all test streams
pub fn t0() -> Epoch {
    Epoch::from_str("2024-02-07T12:00:00 GPST").unwrap()
}

/// G05 broadcast ephemeris (1019), week 2300, toe 302400 s, IODE 45.
/// Synthetic record: realistic element values, not captured from a live stream,
/// so there is no precise orbit product to compare it against.
pub fn gps_1019_frame() -> Vec<u8> {
    vec![
        0xd3, 0x00, 0x3d, 0x3f, 0xb1, 0x4f, 0xc2, 0x7c, 0x80, 0x2d, 0x49, 0xd4, 0x00, 0xff, 0xd3,
        0xef, 0xe0, 0xd0, 0x2d, 0xfd, 0x76, 0x31, 0xdf, 0x32, 0x4c, 0xed, 0x8b, 0xfd, 0x7c, 0x02,
        0xe7, 0x6c, 0x0a, 0x10, 0x5c, 0xa1, 0x0c, 0xfd, 0x00, 0x49, 0xd4, 0x00, 0x3b, 0xaa, 0x4e,
        0xb9, 0x55, 0xff, 0xe4, 0x27, 0x2a, 0x08, 0xc8, 0x1c, 0xd0, 0x20, 0x26, 0xd9, 0xf9, 0xff,
        0xa7, 0x69, 0xe8, 0x00, 0xef, 0x80, 0x9d,
    ]
}
