//! State Space Representation: orbit, clock, URA, high rate clock
//! and code bias corrections (1057-1068)
use bitflags::bitflags;
use gnss::prelude::{Constellation, SV};
use hifitime::Epoch;

use crate::{
    bits::{BitReader, BitWriter},
    message::MessageType,
    time::{glonass_to_gpst, gpst_from_time_of_week},
    Error,
};

mod decoder;
mod encoder;

pub use decoder::{SsrDecoder, SsrRecord, SsrStatus};
pub use encoder::SsrEncoder;

/// GPS satellites a [ClockOrbit] or [Bias] may describe
pub(crate) const MAX_GPS_SATELLITES: usize = 32;

/// GLONASS satellites a [ClockOrbit] or [Bias] may describe
pub(crate) const MAX_GLONASS_SATELLITES: usize = 24;

/// (width, resolution [m]) of radial, along track and cross track deltas
pub(crate) const DELTA: [(u8, f64); 3] = [(22, 1.0E-4), (20, 4.0E-4), (20, 4.0E-4)];

/// (width, resolution [m/s]) of the deltas first derivatives
pub(crate) const DOT_DELTA: [(u8, f64); 3] = [(21, 1.0E-6), (19, 4.0E-6), (19, 4.0E-6)];

/// (width, resolution [m/s²]) of the deltas second derivatives
pub(crate) const DOT_DOT_DELTA: [(u8, f64); 3] = [(27, 2.0E-8), (25, 8.0E-8), (25, 8.0E-8)];

/// (width, resolution) of the clock polynomial terms
pub(crate) const CLOCK: [(u8, f64); 3] = [(22, 1.0E-4), (21, 1.0E-6), (27, 2.0E-8)];

/// High rate clock (width, resolution [m])
pub(crate) const HIGH_RATE_CLOCK: (u8, f64) = (22, 1.0E-4);

/// Code bias (width, resolution [m])
pub(crate) const CODE_BIAS: (u8, f64) = (14, 0.01);

/// [SsrKind] identifies the content of one SSR message
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SsrKind {
    /// Orbit corrections (1057, 1063)
    Orbit,
    /// Clock corrections (1058, 1064)
    Clock,
    /// Combined orbit and clock corrections (1060, 1066)
    OrbitClock,
    /// User range accuracy (1061, 1067)
    Ura,
    /// High rate clock corrections (1062, 1068)
    HighRateClock,
    /// Code biases (1059, 1065)
    CodeBias,
}

impl SsrKind {
    /// Identifies an SSR [MessageType], returns None for any other message
    pub fn from_message(message: MessageType) -> Option<(Constellation, Self)> {
        let (constellation, kind) = match message {
            MessageType::GpsSsrOrbit => (Constellation::GPS, Self::Orbit),
            MessageType::GpsSsrClock => (Constellation::GPS, Self::Clock),
            MessageType::GpsSsrCodeBias => (Constellation::GPS, Self::CodeBias),
            MessageType::GpsSsrOrbitClock => (Constellation::GPS, Self::OrbitClock),
            MessageType::GpsSsrUra => (Constellation::GPS, Self::Ura),
            MessageType::GpsSsrHighRateClock => (Constellation::GPS, Self::HighRateClock),
            MessageType::GlonassSsrOrbit => (Constellation::Glonass, Self::Orbit),
            MessageType::GlonassSsrClock => (Constellation::Glonass, Self::Clock),
            MessageType::GlonassSsrCodeBias => (Constellation::Glonass, Self::CodeBias),
            MessageType::GlonassSsrOrbitClock => (Constellation::Glonass, Self::OrbitClock),
            MessageType::GlonassSsrUra => (Constellation::Glonass, Self::Ura),
            MessageType::GlonassSsrHighRateClock => {
                (Constellation::Glonass, Self::HighRateClock)
            },
            _ => return None,
        };
        Some((constellation, kind))
    }

    /// Message number for this kind of correction and [Constellation]
    pub fn message_type(&self, constellation: Constellation) -> Result<MessageType, Error> {
        let message = match (constellation, self) {
            (Constellation::GPS, Self::Orbit) => MessageType::GpsSsrOrbit,
            (Constellation::GPS, Self::Clock) => MessageType::GpsSsrClock,
            (Constellation::GPS, Self::CodeBias) => MessageType::GpsSsrCodeBias,
            (Constellation::GPS, Self::OrbitClock) => MessageType::GpsSsrOrbitClock,
            (Constellation::GPS, Self::Ura) => MessageType::GpsSsrUra,
            (Constellation::GPS, Self::HighRateClock) => MessageType::GpsSsrHighRateClock,
            (Constellation::Glonass, Self::Orbit) => MessageType::GlonassSsrOrbit,
            (Constellation::Glonass, Self::Clock) => MessageType::GlonassSsrClock,
            (Constellation::Glonass, Self::CodeBias) => MessageType::GlonassSsrCodeBias,
            (Constellation::Glonass, Self::OrbitClock) => MessageType::GlonassSsrOrbitClock,
            (Constellation::Glonass, Self::Ura) => MessageType::GlonassSsrUra,
            (Constellation::Glonass, Self::HighRateClock) => {
                MessageType::GlonassSsrHighRateClock
            },
            _ => return Err(Error::NonSupportedConstellation),
        };
        Ok(message)
    }

    /// URA messages do not carry the update interval
    pub(crate) fn has_update_interval(&self) -> bool {
        !matches!(self, Self::Ura)
    }

    /// Content flags this message provides
    pub(crate) fn content(&self) -> SsrContent {
        match self {
            Self::Orbit => SsrContent::ORBIT,
            Self::Clock => SsrContent::CLOCK,
            Self::OrbitClock => SsrContent::ORBIT | SsrContent::CLOCK,
            Self::Ura => SsrContent::URA,
            Self::HighRateClock => SsrContent::HIGH_RATE_CLOCK,
            Self::CodeBias => SsrContent::empty(),
        }
    }
}

bitflags! {
    /// Corrections provided for one constellation
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct SsrContent: u8 {
        const ORBIT = 0x01;
        const CLOCK = 0x02;
        const URA = 0x04;
        const HIGH_RATE_CLOCK = 0x08;
    }
}

/// Orbit corrections refer to this satellite reference point
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReferencePoint {
    /// Ionosphere free combination phase center
    #[default]
    IonosphereFree,
    /// Center of mass
    CenterOfMass,
}

/// Orbit corrections are expressed in this datum
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReferenceDatum {
    #[default]
    ITRF,
    /// Regional datum
    Regional,
}

/// [OrbitCorrection] is expressed in the satellite frame,
/// components ordered as (radial, along track, cross track).
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrbitCorrection {
    /// Position deltas [m]
    pub delta_m: [f64; 3],
    /// Velocity deltas [m/s]
    pub dot_delta_m_s: [f64; 3],
    /// Acceleration deltas [m/s²]
    pub dot_dot_delta_m_s2: [f64; 3],
}

impl OrbitCorrection {
    /// Position deltas [m], `dt` seconds after the correction epoch
    pub fn at(&self, dt: f64) -> [f64; 3] {
        let mut delta = self.delta_m;
        for (i, value) in delta.iter_mut().enumerate() {
            *value += self.dot_delta_m_s[i] * dt + self.dot_dot_delta_m_s2[i] * dt * dt / 2.0;
        }
        delta
    }

    pub(crate) fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let mut orbit = Self::default();
        for (i, (width, resolution)) in DELTA.iter().enumerate() {
            orbit.delta_m[i] = r.read_scaled(*width, *resolution)?;
        }
        for (i, (width, resolution)) in DOT_DELTA.iter().enumerate() {
            orbit.dot_delta_m_s[i] = r.read_scaled(*width, *resolution)?;
        }
        for (i, (width, resolution)) in DOT_DOT_DELTA.iter().enumerate() {
            orbit.dot_dot_delta_m_s2[i] = r.read_scaled(*width, *resolution)?;
        }
        Ok(orbit)
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        let fields = DELTA
            .iter()
            .zip(self.delta_m.iter())
            .chain(DOT_DELTA.iter().zip(self.dot_delta_m_s.iter()))
            .chain(DOT_DOT_DELTA.iter().zip(self.dot_dot_delta_m_s2.iter()));
        for ((width, resolution), value) in fields {
            w.write_scaled(*width, *value, *resolution)?;
        }
        Ok(())
    }
}

/// [ClockCorrection] polynomial, expressed in meters
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockCorrection {
    pub c0_m: f64,
    pub c1_m_s: f64,
    pub c2_m_s2: f64,
}

impl ClockCorrection {
    /// Clock correction [m], `dt` seconds after the correction epoch
    pub fn at(&self, dt: f64) -> f64 {
        self.c0_m + self.c1_m_s * dt + self.c2_m_s2 * dt * dt
    }

    pub(crate) fn terms(&self) -> [f64; 3] {
        [self.c0_m, self.c1_m_s, self.c2_m_s2]
    }

    pub(crate) fn from_terms(terms: [f64; 3]) -> Self {
        Self {
            c0_m: terms[0],
            c1_m_s: terms[1],
            c2_m_s2: terms[2],
        }
    }

    pub(crate) fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let mut terms = [0.0; 3];
        for (term, (width, resolution)) in terms.iter_mut().zip(CLOCK.iter()) {
            *term = r.read_scaled(*width, *resolution)?;
        }
        Ok(Self::from_terms(terms))
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        for (term, (width, resolution)) in self.terms().iter().zip(CLOCK.iter()) {
            w.write_scaled(*width, *term, *resolution)?;
        }
        Ok(())
    }
}

/// [SatelliteCorrection] gathers all corrections of one satellite
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteCorrection {
    pub sv: SV,
    /// Issue of data of the broadcast ephemeris these corrections apply to
    pub iod: u8,
    /// User range accuracy class
    pub ura: u8,
    pub orbit: OrbitCorrection,
    pub clock: ClockCorrection,
    /// High rate clock correction [m]
    pub high_rate_clock_m: f64,
}

impl SatelliteCorrection {
    /// Builds a null correction for this satellite
    pub fn new(sv: SV) -> Self {
        Self {
            sv,
            iod: 0,
            ura: 0,
            orbit: OrbitCorrection::default(),
            clock: ClockCorrection::default(),
            high_rate_clock_m: 0.0,
        }
    }
}

/// Finds (or creates) the entry of `sv` in `table`
fn table_entry<'a, T>(
    table: &'a mut Vec<T>,
    capacity: usize,
    sv: SV,
    matches: impl Fn(&T) -> bool,
    new: impl FnOnce(SV) -> T,
) -> Result<&'a mut T, Error> {
    match table.iter().position(matches) {
        Some(index) => Ok(&mut table[index]),
        None => {
            if table.len() >= capacity {
                return Err(Error::TooManySatellites);
            }
            table.push(new(sv));
            let last = table.len() - 1;
            Ok(&mut table[last])
        },
    }
}

/// Satellite table capacity for this [Constellation]
fn capacity(constellation: Constellation) -> Result<usize, Error> {
    match constellation {
        Constellation::GPS => Ok(MAX_GPS_SATELLITES),
        Constellation::Glonass => Ok(MAX_GLONASS_SATELLITES),
        _ => Err(Error::NonSupportedConstellation),
    }
}

/// [ClockOrbit] gathers the orbit, clock, URA and high rate clock
/// corrections of one epoch. GPS satellites are described first,
/// then GLONASS satellites, each in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockOrbit {
    /// GPS epoch [s of week]
    pub gps_epoch_s: u32,
    /// GLONASS epoch [s of Moscow day]
    pub glonass_epoch_s: u32,
    /// Update interval indicator
    pub update_interval: u8,
    pub reference_point: ReferencePoint,
    pub reference_datum: ReferenceDatum,
    /// GPS corrections provided
    pub gps_content: SsrContent,
    /// GLONASS corrections provided
    pub glonass_content: SsrContent,
    /// GPS satellites (at most 32)
    pub gps: Vec<SatelliteCorrection>,
    /// GLONASS satellites (at most 24)
    pub glonass: Vec<SatelliteCorrection>,
}

impl ClockOrbit {
    /// True if no satellite is described
    pub fn is_empty(&self) -> bool {
        self.gps.is_empty() && self.glonass.is_empty()
    }

    /// Iterates all satellites, GPS first
    pub fn satellites(&self) -> impl Iterator<Item = &SatelliteCorrection> {
        self.gps.iter().chain(self.glonass.iter())
    }

    /// Returns corrections for this satellite
    pub fn satellite(&self, sv: SV) -> Option<&SatelliteCorrection> {
        self.satellites().find(|sat| sat.sv == sv)
    }

    /// Returns the corrections of `sv`, inserting a null correction
    /// when not described yet.
    pub fn satellite_mut(&mut self, sv: SV) -> Result<&mut SatelliteCorrection, Error> {
        let capacity = capacity(sv.constellation)?;
        let table = match sv.constellation {
            Constellation::GPS => &mut self.gps,
            _ => &mut self.glonass,
        };
        table_entry(
            table,
            capacity,
            sv,
            |sat: &SatelliteCorrection| sat.sv == sv,
            SatelliteCorrection::new,
        )
    }

    /// Content flags of this [Constellation]
    pub fn content(&self, constellation: Constellation) -> SsrContent {
        match constellation {
            Constellation::GPS => self.gps_content,
            Constellation::Glonass => self.glonass_content,
            _ => SsrContent::empty(),
        }
    }

    pub(crate) fn content_mut(&mut self, constellation: Constellation) -> &mut SsrContent {
        match constellation {
            Constellation::GPS => &mut self.gps_content,
            _ => &mut self.glonass_content,
        }
    }

    /// GPST [Epoch] of the GPS corrections, week closest to `reference`
    pub fn gps_epoch(&self, reference: Epoch) -> Epoch {
        gpst_from_time_of_week(self.gps_epoch_s as f64, reference)
    }

    /// GPST [Epoch] of the GLONASS corrections, day closest to `reference`
    pub fn glonass_epoch(&self, reference: Epoch) -> Epoch {
        glonass_to_gpst(self.glonass_epoch_s as f64, reference)
    }
}

/// One [CodeBias] value
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CodeBias {
    /// Signal and tracking mode identifier
    pub signal: u8,
    /// Bias [m]
    pub bias_m: f64,
}

impl CodeBias {
    pub const GPS_L1_CA: u8 = 0;
    pub const GPS_L1_P: u8 = 1;
    pub const GPS_L1_Z: u8 = 2;
    pub const GPS_L2_P: u8 = 10;
    pub const GLONASS_L1_CA: u8 = 0;
    pub const GLONASS_L1_P: u8 = 1;
    pub const GLONASS_L2_CA: u8 = 2;
    pub const GLONASS_L2_P: u8 = 3;
}

/// Code biases of one satellite
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteBias {
    pub sv: SV,
    /// Biases, at most 31
    pub biases: Vec<CodeBias>,
}

impl SatelliteBias {
    pub fn new(sv: SV) -> Self {
        Self {
            sv,
            biases: Vec::new(),
        }
    }

    /// Returns the bias of given signal, if known
    pub fn bias(&self, signal: u8) -> Option<f64> {
        self.biases
            .iter()
            .find(|bias| bias.signal == signal)
            .map(|bias| bias.bias_m)
    }
}

/// [Bias] gathers the code biases of one epoch,
/// GPS satellites first, then GLONASS satellites.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bias {
    /// GPS epoch [s of week]
    pub gps_epoch_s: u32,
    /// GLONASS epoch [s of Moscow day]
    pub glonass_epoch_s: u32,
    /// Update interval indicator
    pub update_interval: u8,
    /// GPS satellites (at most 32)
    pub gps: Vec<SatelliteBias>,
    /// GLONASS satellites (at most 24)
    pub glonass: Vec<SatelliteBias>,
}

impl Bias {
    /// True if no satellite is described
    pub fn is_empty(&self) -> bool {
        self.gps.is_empty() && self.glonass.is_empty()
    }

    /// Iterates all satellites, GPS first
    pub fn satellites(&self) -> impl Iterator<Item = &SatelliteBias> {
        self.gps.iter().chain(self.glonass.iter())
    }

    /// Returns biases of this satellite
    pub fn satellite(&self, sv: SV) -> Option<&SatelliteBias> {
        self.satellites().find(|sat| sat.sv == sv)
    }

    /// Returns the biases of `sv`, inserting an empty set when not described yet.
    pub fn satellite_mut(&mut self, sv: SV) -> Result<&mut SatelliteBias, Error> {
        let capacity = capacity(sv.constellation)?;
        let table = match sv.constellation {
            Constellation::GPS => &mut self.gps,
            _ => &mut self.glonass,
        };
        table_entry(
            table,
            capacity,
            sv,
            |sat: &SatelliteBias| sat.sv == sv,
            SatelliteBias::new,
        )
    }

    /// GPST [Epoch] of the GPS biases, week closest to `reference`
    pub fn gps_epoch(&self, reference: Epoch) -> Epoch {
        gpst_from_time_of_week(self.gps_epoch_s as f64, reference)
    }

    /// GPST [Epoch] of the GLONASS biases, day closest to `reference`
    pub fn glonass_epoch(&self, reference: Epoch) -> Epoch {
        glonass_to_gpst(self.glonass_epoch_s as f64, reference)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn message_kinds() {
        for number in 1057..=1068 {
            let message = MessageType::from(number);
            let (constellation, kind) = SsrKind::from_message(message).unwrap();
            assert_eq!(kind.message_type(constellation).unwrap(), message);
        }
        assert!(SsrKind::from_message(MessageType::GpsEphemeris).is_none());
        assert!(matches!(
            SsrKind::Orbit.message_type(Constellation::Galileo),
            Err(Error::NonSupportedConstellation)
        ));
        assert!(!SsrKind::Ura.has_update_interval());
        assert_eq!(
            SsrKind::OrbitClock.content(),
            SsrContent::ORBIT | SsrContent::CLOCK
        );
    }

    #[test]
    fn satellite_tables() {
        let mut clock_orbit = ClockOrbit::default();
        let g05 = SV::new(Constellation::GPS, 5);
        let r07 = SV::new(Constellation::Glonass, 7);

        clock_orbit.satellite_mut(r07).unwrap().iod = 3;
        clock_orbit.satellite_mut(g05).unwrap().iod = 10;
        clock_orbit.satellite_mut(g05).unwrap().ura = 2;

        assert_eq!(clock_orbit.gps.len(), 1);
        assert_eq!(clock_orbit.glonass.len(), 1);
        let svs: Vec<_> = clock_orbit.satellites().map(|sat| sat.sv).collect();
        assert_eq!(svs, vec![g05, r07]);
        assert_eq!(clock_orbit.satellite(g05).unwrap().ura, 2);

        for prn in 1..=23 {
            clock_orbit
                .satellite_mut(SV::new(Constellation::Glonass, 100 + prn))
                .unwrap();
        }
        assert!(matches!(
            clock_orbit.satellite_mut(SV::new(Constellation::Glonass, 1)),
            Err(Error::TooManySatellites)
        ));
        assert!(matches!(
            clock_orbit.satellite_mut(SV::new(Constellation::Galileo, 1)),
            Err(Error::NonSupportedConstellation)
        ));
    }

    #[test]
    fn polynomials() {
        let orbit = OrbitCorrection {
            delta_m: [1.0, -2.0, 0.5],
            dot_delta_m_s: [0.001, 0.0, 0.0],
            dot_dot_delta_m_s2: [0.0, 0.0, 2.0E-6],
        };
        let delta = orbit.at(10.0);
        assert!((delta[0] - 1.01).abs() < 1.0E-12);
        assert_eq!(delta[1], -2.0);
        assert!((delta[2] - 0.5001).abs() < 1.0E-12);

        let clock = ClockCorrection::from_terms([0.1, 0.01, 0.0]);
        assert!((clock.at(5.0) - 0.15).abs() < 1.0E-12);
        assert_eq!(clock.terms(), [0.1, 0.01, 0.0]);
    }

    #[test]
    fn bias_lookup() {
        let mut bias = Bias::default();
        let g12 = SV::new(Constellation::GPS, 12);
        bias.satellite_mut(g12).unwrap().biases.push(CodeBias {
            signal: CodeBias::GPS_L2_P,
            bias_m: -1.25,
        });
        let sat = bias.satellite(g12).unwrap();
        assert_eq!(sat.bias(CodeBias::GPS_L2_P), Some(-1.25));
        assert_eq!(sat.bias(CodeBias::GPS_L1_CA), None);
        assert!(!bias.is_empty());
    }
}
