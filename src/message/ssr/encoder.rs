//! SSR encoding
use gnss::prelude::{Constellation, SV};
use itertools::Itertools;

use crate::{
    bits::BitWriter,
    constants::Constants,
    frame::Frame,
    message::ssr::{
        Bias, ClockOrbit, ReferenceDatum, ReferencePoint, SatelliteBias, SatelliteCorrection,
        SsrContent, SsrKind, CODE_BIAS, HIGH_RATE_CLOCK,
    },
    Error,
};

/// Message header size [bits]
fn header_bits(constellation: Constellation, kind: SsrKind) -> usize {
    let epoch = match constellation {
        Constellation::Glonass => 17,
        _ => 20,
    };
    let interval = if kind.has_update_interval() { 4 } else { 0 };
    12 + epoch + interval + 1 + 5 + 6
}

/// Satellite identifier size [bits]
fn id_bits(constellation: Constellation) -> usize {
    match constellation {
        Constellation::Glonass => 5,
        _ => 6,
    }
}

/// Encoded size of one satellite correction [bits]
fn correction_bits(constellation: Constellation, kind: SsrKind) -> usize {
    let orbit = 8 + 62 + 59 + 77 + 2;
    let clock = 70;
    id_bits(constellation)
        + match kind {
            SsrKind::Orbit => orbit,
            SsrKind::Clock => clock,
            SsrKind::OrbitClock => orbit + clock,
            SsrKind::Ura => 4,
            SsrKind::HighRateClock => HIGH_RATE_CLOCK.0 as usize,
            SsrKind::CodeBias => 0,
        }
}

/// Encoded size of one satellite code biases [bits]
fn bias_bits(constellation: Constellation, sat: &SatelliteBias) -> usize {
    id_bits(constellation) + 5 + sat.biases.len() * (5 + CODE_BIAS.0 as usize)
}

/// Number of satellites that fit in one message
fn capacity(header_bits: usize, satellite_bits: usize) -> usize {
    let available = Constants::MAX_PAYLOAD_SIZE * 8 - header_bits;
    (available / satellite_bits.max(1)).clamp(1, 63)
}

fn write_satellite(w: &mut BitWriter, sv: SV) -> Result<(), Error> {
    let width = id_bits(sv.constellation) as u8;
    w.write_unsigned(width, sv.prn as u64)
}

/// One message to be encoded
struct Message<'a, T> {
    constellation: Constellation,
    kind: SsrKind,
    satellites: Vec<&'a T>,
}

/// [SsrEncoder] encodes [ClockOrbit] and [Bias] corrections into complete frames.
/// Corrections that do not fit a single frame are split into
/// several messages, linked by the multiple message indicator.
#[derive(Debug, Copy, Clone, Default)]
pub struct SsrEncoder {
    /// Restricts the encoding to this message kind
    kind: Option<SsrKind>,
    /// Messages of this epoch will follow the encoded ones
    more_messages: bool,
}

impl SsrEncoder {
    /// Creates a new [SsrEncoder]: the messages are deduced from the
    /// content flags, combined orbit and clock messages are preferred.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only encode this message kind
    pub fn with_kind(&self, kind: SsrKind) -> Self {
        let mut s = *self;
        s.kind = Some(kind);
        s
    }

    /// Set the multiple message indicator on the last encoded message,
    /// because other messages of the same epoch will follow.
    pub fn with_more_messages(&self, more_messages: bool) -> Self {
        let mut s = *self;
        s.more_messages = more_messages;
        s
    }

    /// Message kinds to encode for this content
    fn kinds(&self, content: SsrContent) -> Vec<SsrKind> {
        let combined = content.contains(SsrContent::ORBIT | SsrContent::CLOCK);
        let candidates = match self.kind {
            Some(kind) => vec![kind],
            None => {
                let mut kinds = Vec::with_capacity(4);
                if combined {
                    kinds.push(SsrKind::OrbitClock);
                } else {
                    kinds.push(SsrKind::Orbit);
                    kinds.push(SsrKind::Clock);
                }
                kinds.push(SsrKind::HighRateClock);
                kinds.push(SsrKind::Ura);
                kinds
            },
        };
        candidates
            .into_iter()
            .filter(|kind| *kind != SsrKind::CodeBias && content.contains(kind.content()))
            .collect()
    }

    /// Encodes [ClockOrbit] as a series of complete frames,
    /// GPS messages first.
    pub fn encode_clock_orbit(&self, clock_orbit: &ClockOrbit) -> Result<Vec<Vec<u8>>, Error> {
        let mut messages = Vec::new();
        for (constellation, satellites) in [
            (Constellation::GPS, &clock_orbit.gps),
            (Constellation::Glonass, &clock_orbit.glonass),
        ] {
            if satellites.is_empty() {
                continue;
            }
            for kind in self.kinds(clock_orbit.content(constellation)) {
                let capacity = capacity(
                    header_bits(constellation, kind),
                    correction_bits(constellation, kind),
                );
                for chunk in &satellites.iter().chunks(capacity) {
                    messages.push(Message {
                        constellation,
                        kind,
                        satellites: chunk.collect(),
                    });
                }
            }
        }

        let total = messages.len();
        messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                let follows = i + 1 < total || self.more_messages;
                Self::encode_corrections(clock_orbit, message, follows)
            })
            .collect()
    }

    /// Encodes [Bias] as a series of complete frames, GPS messages first.
    pub fn encode_bias(&self, bias: &Bias) -> Result<Vec<Vec<u8>>, Error> {
        let mut messages = Vec::new();
        for (constellation, satellites) in [
            (Constellation::GPS, &bias.gps),
            (Constellation::Glonass, &bias.glonass),
        ] {
            if satellites.is_empty() {
                continue;
            }
            let largest = satellites
                .iter()
                .map(|sat| bias_bits(constellation, sat))
                .max()
                .unwrap_or_default();
            let capacity = capacity(header_bits(constellation, SsrKind::CodeBias), largest);
            for chunk in &satellites.iter().chunks(capacity) {
                messages.push(Message {
                    constellation,
                    kind: SsrKind::CodeBias,
                    satellites: chunk.collect(),
                });
            }
        }

        let total = messages.len();
        messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                let follows = i + 1 < total || self.more_messages;
                Self::encode_biases(bias, message, follows)
            })
            .collect()
    }

    fn write_header(
        w: &mut BitWriter,
        constellation: Constellation,
        kind: SsrKind,
        epoch_s: u32,
        update_interval: u8,
        follows: bool,
        satellites: usize,
    ) -> Result<(), Error> {
        let message = kind.message_type(constellation)?;
        w.write_unsigned(12, u16::from(message) as u64)?;
        match constellation {
            Constellation::Glonass => w.write_unsigned(17, epoch_s as u64)?,
            _ => w.write_unsigned(20, epoch_s as u64)?,
        }
        if kind.has_update_interval() {
            w.write_unsigned(4, update_interval as u64)?;
        }
        w.write_bool(follows)?;
        w.write_unsigned(5, 0)?;
        w.write_unsigned(6, satellites as u64)
    }

    fn encode_corrections(
        clock_orbit: &ClockOrbit,
        message: &Message<SatelliteCorrection>,
        follows: bool,
    ) -> Result<Vec<u8>, Error> {
        let epoch_s = match message.constellation {
            Constellation::Glonass => clock_orbit.glonass_epoch_s,
            _ => clock_orbit.gps_epoch_s,
        };

        let mut w = BitWriter::new();
        Self::write_header(
            &mut w,
            message.constellation,
            message.kind,
            epoch_s,
            clock_orbit.update_interval,
            follows,
            message.satellites.len(),
        )?;

        for sat in message.satellites.iter() {
            write_satellite(&mut w, sat.sv)?;
            match message.kind {
                SsrKind::Orbit | SsrKind::OrbitClock => {
                    w.write_unsigned(8, sat.iod as u64)?;
                    sat.orbit.encode(&mut w)?;
                    w.write_bool(clock_orbit.reference_point == ReferencePoint::CenterOfMass)?;
                    w.write_bool(clock_orbit.reference_datum == ReferenceDatum::Regional)?;
                    if message.kind == SsrKind::OrbitClock {
                        sat.clock.encode(&mut w)?;
                    }
                },
                SsrKind::Clock => sat.clock.encode(&mut w)?,
                SsrKind::Ura => w.write_unsigned(4, sat.ura as u64)?,
                SsrKind::HighRateClock => {
                    let (width, resolution) = HIGH_RATE_CLOCK;
                    w.write_scaled(width, sat.high_rate_clock_m, resolution)?;
                },
                SsrKind::CodeBias => return Err(Error::InvalidFrame),
            }
        }
        Frame::wrap(&w.into_bytes())
    }

    fn encode_biases(
        bias: &Bias,
        message: &Message<SatelliteBias>,
        follows: bool,
    ) -> Result<Vec<u8>, Error> {
        let epoch_s = match message.constellation {
            Constellation::Glonass => bias.glonass_epoch_s,
            _ => bias.gps_epoch_s,
        };

        let mut w = BitWriter::new();
        Self::write_header(
            &mut w,
            message.constellation,
            SsrKind::CodeBias,
            epoch_s,
            bias.update_interval,
            follows,
            message.satellites.len(),
        )?;

        let (width, resolution) = CODE_BIAS;
        for sat in message.satellites.iter() {
            write_satellite(&mut w, sat.sv)?;
            w.write_unsigned(5, sat.biases.len() as u64)?;
            for code in sat.biases.iter() {
                w.write_unsigned(5, code.signal as u64)?;
                w.write_scaled(width, code.bias_m, resolution)?;
            }
        }
        Frame::wrap(&w.into_bytes())
    }
}
