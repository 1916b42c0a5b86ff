//! SSR decoding, with multiple message accumulation
use gnss::prelude::{Constellation, SV};

#[cfg(feature = "log")]
use log::{debug, warn};

use crate::{
    bits::BitReader,
    frame::Frame,
    message::{
        ssr::{
            Bias, ClockCorrection, ClockOrbit, CodeBias, OrbitCorrection, ReferenceDatum,
            ReferencePoint, SsrKind, CODE_BIAS, HIGH_RATE_CLOCK,
        },
        MessageType,
    },
    Error,
};

/// [SsrStatus] is the outcome of [SsrDecoder::decode]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SsrStatus {
    /// One epoch is complete
    Ok,
    /// Message decoded, more messages of this epoch are expected
    MessageFollows,
    /// Buffer does not contain a complete frame yet: retry with more bytes
    NotEnoughData,
    /// Valid frame, but not an SSR message: it may be skipped
    UnknownType,
    /// Not a frame, or malformed SSR payload
    UnknownData,
    CrcMismatch,
    /// This message does not belong to the pending epoch, which
    /// has been discarded. Decode the same bytes again to start a new epoch.
    EpochMismatch,
    /// Too many satellites for the correction tables
    DataMismatch,
}

/// [SsrRecord] is a complete SSR epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SsrRecord {
    ClockOrbit(ClockOrbit),
    Bias(Bias),
}

/// SSR message header
#[derive(Debug, Copy, Clone)]
struct Header {
    /// GPS: s of week, GLONASS: s of day
    epoch_s: u32,
    update_interval: Option<u8>,
    multiple_message: bool,
    satellites: u8,
}

impl Header {
    fn decode(
        r: &mut BitReader,
        constellation: Constellation,
        kind: SsrKind,
    ) -> Result<Self, Error> {
        let epoch_s = match constellation {
            Constellation::Glonass => r.read_u32(17)?,
            _ => r.read_u32(20)?,
        };
        let update_interval = if kind.has_update_interval() {
            Some(r.read_u8(4)?)
        } else {
            None
        };
        let multiple_message = r.read_bool()?;
        r.skip(5)?;
        let satellites = r.read_u8(6)?;
        Ok(Self {
            epoch_s,
            update_interval,
            multiple_message,
            satellites,
        })
    }
}

/// Satellite identifier: 6 bits for GPS, 5 bits for GLONASS
fn decode_satellite(r: &mut BitReader, constellation: Constellation) -> Result<SV, Error> {
    let prn = match constellation {
        Constellation::Glonass => r.read_u8(5)?,
        _ => r.read_u8(6)?,
    };
    Ok(SV::new(constellation, prn))
}

/// Checks that a new message belongs to the pending epoch, if any
fn check_epoch(pending: usize, pending_epoch_s: u32, epoch_s: u32) -> Result<(), Error> {
    if pending > 0 && pending_epoch_s != epoch_s {
        #[cfg(feature = "log")]
        warn!(
            "ssr epoch mismatch: pending={} received={}",
            pending_epoch_s, epoch_s
        );
        return Err(Error::EpochMismatch);
    }
    Ok(())
}

/// Commits a decoding attempt into the `pending` accumulation.
/// Returns the complete record when no other message follows.
fn commit<T: Default>(
    pending: &mut T,
    decoded: Result<T, Error>,
    follows: bool,
) -> Result<Option<T>, Error> {
    match decoded {
        Ok(record) => {
            if follows {
                *pending = record;
                Ok(None)
            } else {
                *pending = T::default();
                Ok(Some(record))
            }
        },
        Err(Error::EpochMismatch) => {
            *pending = T::default();
            Err(Error::EpochMismatch)
        },
        Err(e) => Err(e),
    }
}

/// [SsrDecoder] gathers the SSR messages of one epoch.
/// Corrections spread over several messages (multiple message indicator set)
/// are accumulated, and only released once the last message arrived.
/// Each message is decoded on a copy of the pending epoch, which is only
/// updated when the message was entirely decoded: a truncated or
/// malformed message leaves the pending epoch untouched.
#[derive(Debug, Clone, Default)]
pub struct SsrDecoder {
    clock_orbit: ClockOrbit,
    bias: Bias,
}

impl SsrDecoder {
    /// Creates a new [SsrDecoder]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending (incomplete) orbit and clock corrections
    pub fn pending_clock_orbit(&self) -> &ClockOrbit {
        &self.clock_orbit
    }

    /// Pending (incomplete) code biases
    pub fn pending_bias(&self) -> &Bias {
        &self.bias
    }

    /// Discards all pending corrections
    pub fn reset(&mut self) {
        self.clock_orbit = ClockOrbit::default();
        self.bias = Bias::default();
    }

    /// Decodes the frame located at the very start of `buf`.
    /// Returns the [SsrStatus], the number of bytes consumed and the
    /// completed record, when [SsrStatus::Ok].
    ///   - nothing is consumed on [SsrStatus::NotEnoughData]
    ///     and [SsrStatus::EpochMismatch]
    ///   - a single byte is consumed when no valid frame starts here
    ///   - the whole frame is consumed otherwise
    pub fn decode(&mut self, buf: &[u8]) -> (SsrStatus, usize, Option<SsrRecord>) {
        let (frame, size) = match Frame::decode(buf) {
            Ok(decoded) => decoded,
            Err(Error::NotEnoughBytes) => return (SsrStatus::NotEnoughData, 0, None),
            Err(Error::CrcMismatch) => return (SsrStatus::CrcMismatch, 1, None),
            Err(_) => return (SsrStatus::UnknownData, 1, None),
        };

        match self.decode_frame(&frame) {
            Ok(Some(record)) => (SsrStatus::Ok, size, Some(record)),
            Ok(None) => (SsrStatus::MessageFollows, size, None),
            Err(Error::UnknownMessage(_)) => (SsrStatus::UnknownType, size, None),
            Err(Error::EpochMismatch) => (SsrStatus::EpochMismatch, 0, None),
            Err(Error::TooManySatellites) => (SsrStatus::DataMismatch, size, None),
            Err(_) => (SsrStatus::UnknownData, size, None),
        }
    }

    /// Decodes one SSR [Frame].
    /// Returns Ok(None) while the epoch is incomplete.
    /// On [Error::EpochMismatch], the pending epoch has been discarded:
    /// decode this frame again to start a new one.
    pub fn decode_frame(&mut self, frame: &Frame) -> Result<Option<SsrRecord>, Error> {
        let message = MessageType::from(frame.message_type);
        let (constellation, kind) =
            SsrKind::from_message(message).ok_or(Error::UnknownMessage(frame.message_type))?;

        let mut r = BitReader::new(&frame.payload);
        r.skip(12)?;
        let header = Header::decode(&mut r, constellation, kind)?;

        #[cfg(feature = "log")]
        debug!(
            "ssr #{}: epoch={} satellites={} mmi={}",
            message, header.epoch_s, header.satellites, header.multiple_message
        );

        match kind {
            SsrKind::CodeBias => {
                let decoded =
                    Self::decode_bias(self.bias.clone(), &header, constellation, &mut r);
                let record = commit(&mut self.bias, decoded, header.multiple_message)?;
                Ok(record.map(SsrRecord::Bias))
            },
            _ => {
                let decoded = Self::decode_clock_orbit(
                    self.clock_orbit.clone(),
                    &header,
                    constellation,
                    kind,
                    &mut r,
                );
                let record = commit(&mut self.clock_orbit, decoded, header.multiple_message)?;
                Ok(record.map(SsrRecord::ClockOrbit))
            },
        }
    }

    fn decode_clock_orbit(
        mut clock_orbit: ClockOrbit,
        header: &Header,
        constellation: Constellation,
        kind: SsrKind,
        r: &mut BitReader,
    ) -> Result<ClockOrbit, Error> {
        match constellation {
            Constellation::GPS => {
                check_epoch(
                    clock_orbit.gps.len(),
                    clock_orbit.gps_epoch_s,
                    header.epoch_s,
                )?;
                clock_orbit.gps_epoch_s = header.epoch_s;
            },
            _ => {
                check_epoch(
                    clock_orbit.glonass.len(),
                    clock_orbit.glonass_epoch_s,
                    header.epoch_s,
                )?;
                clock_orbit.glonass_epoch_s = header.epoch_s;
            },
        }

        if let Some(interval) = header.update_interval {
            clock_orbit.update_interval = interval;
        }
        *clock_orbit.content_mut(constellation) |= kind.content();

        for _ in 0..header.satellites {
            let sv = decode_satellite(r, constellation)?;
            let mut reference = None;
            let sat = clock_orbit.satellite_mut(sv)?;
            match kind {
                SsrKind::Orbit | SsrKind::OrbitClock => {
                    sat.iod = r.read_u8(8)?;
                    sat.orbit = OrbitCorrection::decode(r)?;
                    reference = Some((r.read_bool()?, r.read_bool()?));
                    if kind == SsrKind::OrbitClock {
                        sat.clock = ClockCorrection::decode(r)?;
                    }
                },
                SsrKind::Clock => {
                    sat.clock = ClockCorrection::decode(r)?;
                },
                SsrKind::Ura => {
                    sat.ura = r.read_u8(4)?;
                },
                SsrKind::HighRateClock => {
                    let (width, resolution) = HIGH_RATE_CLOCK;
                    sat.high_rate_clock_m = r.read_scaled(width, resolution)?;
                },
                SsrKind::CodeBias => return Err(Error::InvalidFrame),
            }
            if let Some((center, regional)) = reference {
                clock_orbit.reference_point = if center {
                    ReferencePoint::CenterOfMass
                } else {
                    ReferencePoint::IonosphereFree
                };
                clock_orbit.reference_datum = if regional {
                    ReferenceDatum::Regional
                } else {
                    ReferenceDatum::ITRF
                };
            }
        }
        Ok(clock_orbit)
    }

    fn decode_bias(
        mut bias: Bias,
        header: &Header,
        constellation: Constellation,
        r: &mut BitReader,
    ) -> Result<Bias, Error> {
        match constellation {
            Constellation::GPS => {
                check_epoch(bias.gps.len(), bias.gps_epoch_s, header.epoch_s)?;
                bias.gps_epoch_s = header.epoch_s;
            },
            _ => {
                check_epoch(bias.glonass.len(), bias.glonass_epoch_s, header.epoch_s)?;
                bias.glonass_epoch_s = header.epoch_s;
            },
        }
        if let Some(interval) = header.update_interval {
            bias.update_interval = interval;
        }

        let (width, resolution) = CODE_BIAS;
        for _ in 0..header.satellites {
            let sv = decode_satellite(r, constellation)?;
            let count = r.read_u8(5)?;
            let mut biases = Vec::with_capacity(count as usize);
            for _ in 0..count {
                biases.push(CodeBias {
                    signal: r.read_u8(5)?,
                    bias_m: r.read_scaled(width, resolution)?,
                });
            }
            bias.satellite_mut(sv)?.biases = biases;
        }
        Ok(bias)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{bits::BitWriter, message::ssr::SsrContent};

    /// GLONASS combined orbit and clock message, one satellite per slot,
    /// radial delta and clock offset set to slot/10 [m]
    fn glonass_orbit_clock(epoch_s: u32, mmi: bool, slots: &[u8]) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_unsigned(12, 1066).unwrap();
        w.write_unsigned(17, epoch_s as u64).unwrap();
        w.write_unsigned(4, 2).unwrap();
        w.write_bool(mmi).unwrap();
        w.write_unsigned(5, 0).unwrap();
        w.write_unsigned(6, slots.len() as u64).unwrap();
        for slot in slots {
            w.write_unsigned(5, *slot as u64).unwrap();
            w.write_unsigned(8, 40 + *slot as u64).unwrap();
            let orbit = OrbitCorrection {
                delta_m: [*slot as f64 / 10.0, 0.0, 0.0],
                ..Default::default()
            };
            orbit.encode(&mut w).unwrap();
            w.write_bool(false).unwrap();
            w.write_bool(false).unwrap();
            ClockCorrection::from_terms([*slot as f64 / 10.0, 0.0, 0.0])
                .encode(&mut w)
                .unwrap();
        }
        Frame::wrap(&w.into_bytes()).unwrap()
    }

    fn gps_bias(epoch_s: u32, mmi: bool, biases: &[(u8, f64)]) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_unsigned(12, 1059).unwrap();
        w.write_unsigned(20, epoch_s as u64).unwrap();
        w.write_unsigned(4, 0).unwrap();
        w.write_bool(mmi).unwrap();
        w.write_unsigned(5, 0).unwrap();
        w.write_unsigned(6, 1).unwrap();
        w.write_unsigned(6, 17).unwrap();
        w.write_unsigned(5, biases.len() as u64).unwrap();
        for (signal, value) in biases {
            w.write_unsigned(5, *signal as u64).unwrap();
            w.write_scaled(14, *value, 0.01).unwrap();
        }
        Frame::wrap(&w.into_bytes()).unwrap()
    }

    #[test]
    fn multiple_messages() {
        let mut decoder = SsrDecoder::new();
        let first = glonass_orbit_clock(3600, true, &[1, 2]);
        let last = glonass_orbit_clock(3600, false, &[3]);

        let (status, size, record) = decoder.decode(&first);
        assert_eq!(status, SsrStatus::MessageFollows);
        assert_eq!(size, first.len());
        assert!(record.is_none());
        assert_eq!(decoder.pending_clock_orbit().glonass.len(), 2);

        let (status, size, record) = decoder.decode(&last);
        assert_eq!(status, SsrStatus::Ok);
        assert_eq!(size, last.len());

        let clock_orbit = match record {
            Some(SsrRecord::ClockOrbit(clock_orbit)) => clock_orbit,
            _ => panic!("expecting clock and orbit corrections"),
        };
        assert_eq!(clock_orbit.glonass_epoch_s, 3600);
        assert_eq!(clock_orbit.update_interval, 2);
        assert!(clock_orbit.gps.is_empty());
        assert_eq!(clock_orbit.glonass.len(), 3);

        let r03 = clock_orbit
            .satellite(SV::new(Constellation::Glonass, 3))
            .unwrap();
        assert_eq!(r03.iod, 43);
        assert!((r03.orbit.delta_m[0] - 0.3).abs() < 1.0E-4);
        assert!((r03.clock.c0_m - 0.3).abs() < 1.0E-4);

        assert!(clock_orbit
            .glonass_content
            .contains(SsrContent::ORBIT | SsrContent::CLOCK));
        assert!(clock_orbit.gps_content.is_empty());

        // next epoch starts from scratch
        assert!(decoder.pending_clock_orbit().is_empty());
    }

    #[test]
    fn epoch_mismatch() {
        let mut decoder = SsrDecoder::new();
        let first = glonass_orbit_clock(3600, true, &[1, 2]);
        let other = glonass_orbit_clock(3605, false, &[4]);

        let (status, _, _) = decoder.decode(&first);
        assert_eq!(status, SsrStatus::MessageFollows);

        let (status, size, record) = decoder.decode(&other);
        assert_eq!(status, SsrStatus::EpochMismatch);
        assert_eq!(size, 0);
        assert!(record.is_none());
        assert!(decoder.pending_clock_orbit().is_empty());

        // same bytes, new epoch
        let (status, size, record) = decoder.decode(&other);
        assert_eq!(status, SsrStatus::Ok);
        assert_eq!(size, other.len());
        match record {
            Some(SsrRecord::ClockOrbit(clock_orbit)) => {
                assert_eq!(clock_orbit.glonass_epoch_s, 3605);
                assert_eq!(clock_orbit.glonass.len(), 1);
            },
            _ => panic!("expecting clock and orbit corrections"),
        }
    }

    #[test]
    fn truncated_message() {
        let mut decoder = SsrDecoder::new();
        let first = glonass_orbit_clock(100, true, &[1]);
        let last = glonass_orbit_clock(100, false, &[2]);

        let (status, _, _) = decoder.decode(&first);
        assert_eq!(status, SsrStatus::MessageFollows);

        let (status, size, _) = decoder.decode(&last[..last.len() - 4]);
        assert_eq!(status, SsrStatus::NotEnoughData);
        assert_eq!(size, 0);
        assert_eq!(decoder.pending_clock_orbit().glonass.len(), 1);

        let (status, _, record) = decoder.decode(&last);
        assert_eq!(status, SsrStatus::Ok);
        match record {
            Some(SsrRecord::ClockOrbit(clock_orbit)) => assert_eq!(clock_orbit.glonass.len(), 2),
            _ => panic!("expecting clock and orbit corrections"),
        }
    }

    #[test]
    fn code_biases() {
        let mut decoder = SsrDecoder::new();
        let bytes = gps_bias(
            345_600,
            false,
            &[(CodeBias::GPS_L1_CA, 0.25), (CodeBias::GPS_L2_P, -1.5)],
        );
        let (status, _, record) = decoder.decode(&bytes);
        assert_eq!(status, SsrStatus::Ok);
        let bias = match record {
            Some(SsrRecord::Bias(bias)) => bias,
            _ => panic!("expecting code biases"),
        };
        assert_eq!(bias.gps_epoch_s, 345_600);
        let g17 = bias.satellite(SV::new(Constellation::GPS, 17)).unwrap();
        assert_eq!(g17.biases.len(), 2);
        assert!((g17.bias(CodeBias::GPS_L2_P).unwrap() + 1.5).abs() < 1.0E-9);

        // bias accumulation does not interfere with clock/orbit accumulation
        let mut decoder = SsrDecoder::new();
        let (status, _, _) = decoder.decode(&glonass_orbit_clock(10, true, &[5]));
        assert_eq!(status, SsrStatus::MessageFollows);
        let (status, _, _) = decoder.decode(&bytes);
        assert_eq!(status, SsrStatus::Ok);
        assert_eq!(decoder.pending_clock_orbit().glonass.len(), 1);
    }

    #[test]
    fn other_frames() {
        let mut decoder = SsrDecoder::new();

        // valid frame, not ssr
        let mut w = BitWriter::new();
        w.write_unsigned(12, 1005).unwrap();
        w.write_unsigned(12, 0).unwrap();
        let bytes = Frame::wrap(&w.into_bytes()).unwrap();
        let (status, size, _) = decoder.decode(&bytes);
        assert_eq!(status, SsrStatus::UnknownType);
        assert_eq!(size, bytes.len());

        // corrupt crc
        let mut bytes = glonass_orbit_clock(0, false, &[1]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let (status, size, _) = decoder.decode(&bytes);
        assert_eq!(status, SsrStatus::CrcMismatch);
        assert_eq!(size, 1);

        // not a frame
        let (status, size, _) = decoder.decode(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(status, SsrStatus::UnknownData);
        assert_eq!(size, 1);

        let (status, size, _) = decoder.decode(&[]);
        assert_eq!(status, SsrStatus::NotEnoughData);
        assert_eq!(size, 0);
    }

    #[test]
    fn too_many_satellites() {
        let mut decoder = SsrDecoder::new();
        let slots: Vec<u8> = (1..=20).collect();
        let (status, _, _) = decoder.decode(&glonass_orbit_clock(0, true, &slots));
        assert_eq!(status, SsrStatus::MessageFollows);

        // 20 + 5 new satellites > 24
        let (status, _, _) = decoder.decode(&glonass_orbit_clock(0, false, &[21, 22, 23, 24, 25]));
        assert_eq!(status, SsrStatus::DataMismatch);
        assert_eq!(decoder.pending_clock_orbit().glonass.len(), 20);
    }
}
