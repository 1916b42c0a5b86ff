//! Legacy GPS (1001-1004) and GLONASS (1009-1012) observations
use bitflags::bitflags;
use gnss::prelude::{Constellation, SV};
use hifitime::Epoch;

use crate::{bits::BitReader, constants::Constants, message::MessageType, Error};

mod builder;
mod glonass;
mod gps;

pub use builder::ObservationBuilder;

/// L1 phase-range (and L2 phase-range) sentinel: 0x80000
const PHASE_RANGE_INVALID: i64 = -524_288;

/// L2-L1 pseudo range difference sentinel: 0x2000
const PR_DIFF_INVALID: i64 = -8_192;

/// Highest slip counter value, before wrapping back to 1
pub(crate) const MAX_SLIP_COUNT: u8 = 100;

bitflags! {
    /// Loss of lock, per carrier
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct LockLoss: u8 {
        /// Lock lost on L1 since previous message: cycle slip possible
        const L1 = 0x01;
        /// Lock lost on L2 since previous message: cycle slip possible
        const L2 = 0x02;
    }
}

/// Carrier signal
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Signal {
    L1,
    L2,
}

impl Signal {
    /// [LockLoss] flag of this carrier
    pub fn lock_loss(&self) -> LockLoss {
        match self {
            Self::L1 => LockLoss::L1,
            Self::L2 => LockLoss::L2,
        }
    }

    /// Carrier wavelength [m]. GLONASS requires the FDMA frequency channel.
    pub fn wavelength(&self, constellation: Constellation, channel: Option<i8>) -> Option<f64> {
        let frequency = match constellation {
            Constellation::Glonass => {
                let k = channel? as f64;
                match self {
                    Self::L1 => Constants::GLO_L1_FREQ + k * Constants::GLO_L1_STEP,
                    Self::L2 => Constants::GLO_L2_FREQ + k * Constants::GLO_L2_STEP,
                }
            },
            _ => match self {
                Self::L1 => Constants::GPS_L1_FREQ,
                Self::L2 => Constants::GPS_L2_FREQ,
            },
        };
        Some(Constants::SPEED_OF_LIGHT / frequency)
    }
}

/// Tracked code
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SignalCode {
    /// C/A code (or L2C on L2)
    #[default]
    CA,
    /// P(Y) code, direct
    P,
    /// P(Y) code, cross correlated
    PCrossCorrelated,
    /// Correlated P(Y) code
    PCorrelated,
}

impl SignalCode {
    pub(crate) fn from_l1_bits(bit: u8) -> Self {
        if bit == 0 {
            Self::CA
        } else {
            Self::P
        }
    }

    pub(crate) fn from_l2_bits(bits: u8) -> Self {
        match bits {
            0 => Self::CA,
            1 => Self::P,
            2 => Self::PCrossCorrelated,
            _ => Self::PCorrelated,
        }
    }

    /// True when a P code was tracked
    pub fn is_p_code(&self) -> bool {
        !matches!(self, Self::CA)
    }
}

/// One carrier observation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalObservation {
    pub signal: Signal,
    pub code: SignalCode,
    /// Pseudo range [m]
    pub pseudorange_m: Option<f64>,
    /// Carrier phase, expressed in meters
    pub phase_range_m: Option<f64>,
    /// Carrier phase [cycles]. Requires the carrier wavelength,
    /// which GLONASS derives from the frequency channel.
    pub phase_cycles: Option<f64>,
    /// Lock time indicator, as transmitted
    pub lock_time_indicator: u8,
    /// Carrier to noise ratio [dB.Hz]
    pub cnr_dbhz: Option<f64>,
    /// Signal strength index, in 1..=9
    pub snr_index: Option<u8>,
    /// Counts the losses of lock on this carrier, in 1..=100.
    /// 0 until the first loss of lock.
    pub slip_count: u8,
}

impl SignalObservation {
    fn new(
        signal: Signal,
        code: SignalCode,
        pseudorange_m: Option<f64>,
        phase_range_m: Option<f64>,
        lock_time_indicator: u8,
        cnr: Option<u8>,
    ) -> Self {
        let cnr = cnr.filter(|cnr| *cnr > 0);
        Self {
            signal,
            code,
            pseudorange_m,
            phase_range_m,
            phase_cycles: None,
            lock_time_indicator,
            cnr_dbhz: cnr.map(|cnr| cnr as f64 * 0.25),
            snr_index: cnr.map(|cnr| (cnr / 16).clamp(1, 9)),
            slip_count: 0,
        }
    }

    /// Converts the phase range to cycles, for this `wavelength` [m]
    pub(crate) fn resolve_cycles(&mut self, wavelength: Option<f64>) {
        if let (Some(range), Some(lambda)) = (self.phase_range_m, wavelength) {
            self.phase_cycles = Some(range / lambda);
        }
    }
}

/// Observations of one satellite
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteObservation {
    pub sv: SV,
    /// GLONASS FDMA frequency channel (-7..=13)
    pub frequency_channel: Option<i8>,
    /// Losses of lock since previous message
    pub lock_loss: LockLoss,
    /// L1, then L2 if available
    pub signals: Vec<SignalObservation>,
}

impl SatelliteObservation {
    /// Returns observation of this [Signal], if any
    pub fn signal(&self, signal: Signal) -> Option<&SignalObservation> {
        self.signals.iter().find(|obs| obs.signal == signal)
    }

    /// Merges `other` into [Self]: most recent signals win.
    pub(crate) fn merge(&mut self, other: Self) {
        if other.frequency_channel.is_some() {
            self.frequency_channel = other.frequency_channel;
        }
        self.lock_loss |= other.lock_loss;
        for obs in other.signals {
            match self.signals.iter_mut().find(|s| s.signal == obs.signal) {
                Some(existing) => *existing = obs,
                None => self.signals.push(obs),
            }
        }
    }
}

/// [ObservationEpoch] gathers all observations sharing one sampling instant.
/// A satellite appears once at most.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationEpoch {
    /// Sampling instant, in GPST
    pub epoch: Epoch,
    /// GPS week
    pub week: u32,
    /// GPS time of week [ms]
    pub tow_ms: u64,
    /// Observations, in order of reception
    pub satellites: Vec<SatelliteObservation>,
}

impl ObservationEpoch {
    /// Returns observations of this satellite, if any
    pub fn satellite(&self, sv: SV) -> Option<&SatelliteObservation> {
        self.satellites.iter().find(|sat| sat.sv == sv)
    }

    /// Number of satellites
    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    pub(crate) fn insert(&mut self, observation: SatelliteObservation) {
        match self.satellites.iter_mut().find(|sat| sat.sv == observation.sv) {
            Some(existing) => existing.merge(observation),
            None => self.satellites.push(observation),
        }
    }
}

/// Message layout
#[derive(Debug, Copy, Clone)]
pub(crate) struct Layout {
    /// L1 pseudo range field width
    pr_width: u8,
    /// Pseudo range ambiguity field width
    amb_width: u8,
    /// Pseudo range ambiguity [m]
    ambiguity_m: f64,
    /// L1 and L2
    dual: bool,
    /// Ambiguity and CNR fields
    extended: bool,
}

/// Reads the signal fields, common to GPS and GLONASS.
/// The L1 code indicator has already been consumed.
pub(crate) fn decode_signals(
    r: &mut BitReader,
    layout: &Layout,
    l1_code: SignalCode,
) -> Result<Vec<SignalObservation>, Error> {
    let pr = r.read_unsigned(layout.pr_width)? as f64 * 0.02;
    let phase_range = r.read_signed(20)?;
    let lock = r.read_u8(7)?;

    let (ambiguity, cnr) = if layout.extended {
        let n = r.read_unsigned(layout.amb_width)? as f64;
        (n * layout.ambiguity_m, Some(r.read_u8(8)?))
    } else {
        (0.0, None)
    };

    let mut signals = Vec::with_capacity(2);

    signals.push(SignalObservation::new(
        Signal::L1,
        l1_code,
        Some(pr + ambiguity),
        (phase_range != PHASE_RANGE_INVALID)
            .then(|| pr + phase_range as f64 * 0.0005 + ambiguity),
        lock,
        cnr,
    ));

    if layout.dual {
        let code = SignalCode::from_l2_bits(r.read_u8(2)?);
        let pr_diff = r.read_signed(14)?;
        let phase_range = r.read_signed(20)?;
        let lock = r.read_u8(7)?;
        let cnr = if layout.extended {
            Some(r.read_u8(8)?)
        } else {
            None
        };

        signals.push(SignalObservation::new(
            Signal::L2,
            code,
            (pr_diff != PR_DIFF_INVALID).then(|| pr + pr_diff as f64 * 0.02 + ambiguity),
            (phase_range != PHASE_RANGE_INVALID)
                .then(|| pr + phase_range as f64 * 0.0005 + ambiguity),
            lock,
            cnr,
        ));
    }

    Ok(signals)
}

/// [ObservationBlock] is one decoded observation message, without
/// any context: no lock loss detection, no time resolution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationBlock {
    pub message_type: MessageType,
    /// Reference station ID
    pub station_id: u16,
    /// GPS: ms of GPS week. GLONASS: ms of Moscow day.
    pub time_ms: u32,
    /// More observation messages follow, for this very epoch
    pub sync: bool,
    /// Divergence free smoothing indicator
    pub smoothing: bool,
    /// Smoothing interval indicator
    pub smoothing_interval: u8,
    /// Observations, in order of appearance
    pub satellites: Vec<SatelliteObservation>,
}

impl ObservationBlock {
    /// Decodes an observation payload (1001-1004 and 1009-1012).
    /// Satellites with an invalid identifier are dropped.
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        let number = r.read_u16(12)?;
        let message_type = MessageType::from(number);

        let (glonass, layout) = match message_type {
            MessageType::GpsL1 => (false, gps::layout(false, false)),
            MessageType::GpsL1Extended => (false, gps::layout(false, true)),
            MessageType::GpsL1L2 => (false, gps::layout(true, false)),
            MessageType::GpsL1L2Extended => (false, gps::layout(true, true)),
            MessageType::GlonassL1 => (true, glonass::layout(false, false)),
            MessageType::GlonassL1Extended => (true, glonass::layout(false, true)),
            MessageType::GlonassL1L2 => (true, glonass::layout(true, false)),
            MessageType::GlonassL1L2Extended => (true, glonass::layout(true, true)),
            _ => return Err(Error::UnknownMessage(number)),
        };

        let station_id = r.read_u16(12)?;
        let time_ms = r.read_u32(if glonass { 27 } else { 30 })?;
        let sync = r.read_bool()?;
        let nsat = r.read_u8(5)?;
        let smoothing = r.read_bool()?;
        let smoothing_interval = r.read_u8(3)?;

        let mut satellites = Vec::with_capacity(nsat as usize);
        for _ in 0..nsat {
            let observation = if glonass {
                glonass::decode_satellite(&mut r, &layout)?
            } else {
                gps::decode_satellite(&mut r, &layout)?
            };
            if let Some(observation) = observation {
                satellites.push(observation);
            }
        }

        Ok(Self {
            message_type,
            station_id,
            time_ms,
            sync,
            smoothing,
            smoothing_interval,
            satellites,
        })
    }

    /// Constellation described by [Self]
    pub fn constellation(&self) -> Constellation {
        match self.message_type {
            MessageType::GlonassL1
            | MessageType::GlonassL1Extended
            | MessageType::GlonassL1L2
            | MessageType::GlonassL1L2Extended => Constellation::Glonass,
            _ => Constellation::GPS,
        }
    }
}
