#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::type_complexity)]

/*
 * RTCM3 is part of the rtk-rs framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al.
 * (cf. https://github.com/rtk-rs/rtcm3/graphs/contributors)
 * This framework is shipped under Mozilla Public V2 license.
 *
 * Documentation: https://github.com/rtk-rs/rtcm3
 */

//! RTCM3: streamed GNSS messages decoding and encoding, with broadcast
//! orbit calculations.
//!
//! The [prelude::Decoder] is the entry point. Feed it with bytes, as they
//! come off your NTRIP client or serial port, and collect [prelude::Record]s:
//! observation epochs, broadcast ephemerides and SSR corrections.
//! Each decoded ephemeris is retained, so satellite states can be
//! resolved at any instant with [prelude::Decoder::satellite_state].

extern crate gnss_rs as gnss;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

mod bits;
mod constants;
mod crc;
mod decoder;
mod frame;
mod message;
mod orbit;
mod store;
mod time;

use thiserror::Error;

use gnss::prelude::SV;

pub mod prelude {
    pub use crate::bits::{BitReader, BitWriter};
    pub use crate::crc::Crc24;
    pub use crate::decoder::{Decoder, Record, StreamDecoder};
    pub use crate::frame::{Frame, Framer};
    pub use crate::message::ephemeris::{
        BeiDouEphemeris, BroadcastEphemeris, GPSEphemeris, GalileoEphemeris, GalileoSource,
        GlonassEphemeris, SBASEphemeris, URA,
    };
    pub use crate::message::observation::{
        LockLoss, ObservationBlock, ObservationBuilder, ObservationEpoch, Signal, SignalCode,
        SignalObservation, SatelliteObservation,
    };
    pub use crate::message::ssr::{
        Bias, ClockCorrection, ClockOrbit, CodeBias, OrbitCorrection, ReferenceDatum,
        ReferencePoint, SatelliteBias, SatelliteCorrection, SsrContent, SsrDecoder, SsrEncoder,
        SsrKind, SsrRecord, SsrStatus,
    };
    pub use crate::message::station::{AntennaDescriptor, ReferenceStation};
    pub use crate::message::MessageType;
    pub use crate::orbit::SatelliteState;
    pub use crate::store::EphemerisStore;
    pub use crate::time::{FixedReference, SystemClock, TimeReference};
    pub use crate::Error;
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::Vector3;
}

/// RTCM3 decoding, encoding and calculation errors.
/// None of these is fatal: a decoding error simply means the current
/// frame should be dropped.
#[derive(Error, Debug)]
pub enum Error {
    #[error("not enough bytes available")]
    NotEnoughBytes,
    #[error("crc24 mismatch")]
    CrcMismatch,
    #[error("invalid frame (bad sync or reserved bits)")]
    InvalidFrame,
    #[error("unknown message #{0}")]
    UnknownMessage(u16),
    #[error("bit field overruns message payload")]
    FieldOverrun,
    #[error("ssr continuation does not match pending epoch")]
    EpochMismatch,
    #[error("too many satellites for ssr table")]
    TooManySatellites,
    #[error("value cannot be represented on {0} bits")]
    FieldOutOfRange(u8),
    #[error("payload exceeds 1023 bytes")]
    FrameTooLarge,
    #[error("no time reference to resolve week number")]
    NoTimeReference,
    #[error("no ephemeris for {0}")]
    MissingEphemeris(SV),
    #[error("propagation span exceeds 24h")]
    PropagationSpan,
    #[error("degenerate orbit (null semi major axis)")]
    DegenerateOrbit,
    #[error("non supported constellation")]
    NonSupportedConstellation,
    #[error("invalid satellite identifier")]
    InvalidSatellite,
    #[error("i/o error: {0}")]
    IoError(#[from] std::io::Error),
}
