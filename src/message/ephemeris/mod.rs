//! Broadcast ephemerides
use gnss::prelude::{Constellation, SV};
use hifitime::{Duration, Epoch};

use crate::{frame::Frame, message::MessageType, Error};

mod beidou;
mod galileo;
mod glonass;
mod gps;
mod sbas;
mod ura;

pub use beidou::BeiDouEphemeris;
pub use galileo::{GalileoEphemeris, GalileoSource};
pub use glonass::GlonassEphemeris;
pub use gps::GPSEphemeris;
pub use sbas::SBASEphemeris;
pub use ura::URA;

/// [BroadcastEphemeris] is any decoded broadcast ephemeris.
/// QZSS satellites are described by [GPSEphemeris].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BroadcastEphemeris {
    GPS(GPSEphemeris),
    Glonass(GlonassEphemeris),
    Galileo(GalileoEphemeris),
    BeiDou(BeiDouEphemeris),
    SBAS(SBASEphemeris),
}

impl From<GPSEphemeris> for BroadcastEphemeris {
    fn from(eph: GPSEphemeris) -> Self {
        Self::GPS(eph)
    }
}

impl From<GlonassEphemeris> for BroadcastEphemeris {
    fn from(eph: GlonassEphemeris) -> Self {
        Self::Glonass(eph)
    }
}

impl From<GalileoEphemeris> for BroadcastEphemeris {
    fn from(eph: GalileoEphemeris) -> Self {
        Self::Galileo(eph)
    }
}

impl From<BeiDouEphemeris> for BroadcastEphemeris {
    fn from(eph: BeiDouEphemeris) -> Self {
        Self::BeiDou(eph)
    }
}

impl From<SBASEphemeris> for BroadcastEphemeris {
    fn from(eph: SBASEphemeris) -> Self {
        Self::SBAS(eph)
    }
}

impl BroadcastEphemeris {
    /// Decodes the ephemeris contained in this [Frame].
    /// `reference` is used to resolve truncated weeks and day relative times.
    pub fn decode(frame: &Frame, reference: Epoch) -> Result<Self, Error> {
        let payload = &frame.payload;
        match MessageType::from(frame.message_type) {
            MessageType::GpsEphemeris => Ok(GPSEphemeris::decode_1019(payload, reference)?.into()),
            MessageType::QZSSEphemeris => {
                Ok(GPSEphemeris::decode_1044(payload, reference)?.into())
            },
            MessageType::GlonassEphemeris => {
                Ok(GlonassEphemeris::decode(payload, reference)?.into())
            },
            MessageType::GalileoFNavEphemeris | MessageType::GalileoINavEphemeris => {
                Ok(GalileoEphemeris::decode(payload, reference)?.into())
            },
            MessageType::BeiDouEphemeris => Ok(BeiDouEphemeris::decode(payload, reference)?.into()),
            MessageType::SBASEphemeris => Ok(SBASEphemeris::decode(payload, reference)?.into()),
            _ => Err(Error::UnknownMessage(frame.message_type)),
        }
    }

    /// Encodes [Self] as a complete RTCM3 frame, ready to be transmitted.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        match self {
            Self::GPS(eph) => eph.encode(),
            Self::Glonass(eph) => eph.encode(),
            Self::Galileo(eph) => eph.encode(),
            Self::BeiDou(eph) => eph.encode(),
            Self::SBAS(eph) => eph.encode(),
        }
    }

    /// Satellite described by [Self]
    pub fn sv(&self) -> SV {
        match self {
            Self::GPS(eph) => eph.sv,
            Self::Glonass(eph) => eph.sv,
            Self::Galileo(eph) => eph.sv,
            Self::BeiDou(eph) => eph.sv,
            Self::SBAS(eph) => eph.sv,
        }
    }

    /// Time of ephemeris (reference time of the orbit)
    pub fn toe(&self) -> Epoch {
        match self {
            Self::GPS(eph) => eph.toe(),
            Self::Glonass(eph) => eph.toe,
            Self::Galileo(eph) => eph.toe(),
            Self::BeiDou(eph) => eph.toe(),
            Self::SBAS(eph) => eph.t0,
        }
    }

    /// Time of clock (reference time of the clock polynomial)
    pub fn toc(&self) -> Epoch {
        match self {
            Self::GPS(eph) => eph.toc(),
            Self::Glonass(eph) => eph.toe,
            Self::Galileo(eph) => eph.toc(),
            Self::BeiDou(eph) => eph.toc(),
            Self::SBAS(eph) => eph.t0,
        }
    }

    /// Issue of data
    pub fn iod(&self) -> u16 {
        match self {
            Self::GPS(eph) => eph.iode as u16,
            Self::Glonass(eph) => eph.iod() as u16,
            Self::Galileo(eph) => eph.iodnav,
            Self::BeiDou(eph) => eph.aode as u16,
            Self::SBAS(eph) => eph.iodn as u16,
        }
    }

    /// Health flag as broadcast (0 means healthy)
    pub fn health(&self) -> u8 {
        match self {
            Self::GPS(eph) => eph.health,
            Self::Glonass(eph) => eph.health,
            Self::Galileo(eph) => eph.health(),
            Self::BeiDou(eph) => eph.health,
            Self::SBAS(_) => 0,
        }
    }

    /// Period around the time of ephemeris during which this
    /// ephemeris may be used.
    pub fn validity(&self) -> Duration {
        let sv = self.sv();
        let hours = match sv.constellation {
            Constellation::Galileo => 3.0,
            Constellation::BeiDou => 6.0,
            Constellation::Glonass => 0.5,
            Constellation::SBAS => 24.0,
            _ => 2.0,
        };
        Duration::from_seconds(hours * 3600.0)
    }

    /// True if `t` lies within the validity period of [Self]
    pub fn is_valid(&self, t: Epoch) -> bool {
        (t - self.toe()).abs() <= self.validity()
    }

    /// True if [Self] is strictly newer than `other`,
    /// ordering by (time of ephemeris, issue of data).
    pub fn is_newer_than(&self, other: &Self) -> bool {
        let (toe, other_toe) = (self.toe(), other.toe());
        if toe != other_toe {
            toe > other_toe
        } else {
            self.iod() > other.iod()
        }
    }

    /// Returns [GPSEphemeris] if [Self] describes a GPS or QZSS satellite
    pub fn as_gps(&self) -> Option<&GPSEphemeris> {
        match self {
            Self::GPS(eph) => Some(eph),
            _ => None,
        }
    }

    /// Returns [GlonassEphemeris] if [Self] describes a GLONASS satellite
    pub fn as_glonass(&self) -> Option<&GlonassEphemeris> {
        match self {
            Self::Glonass(eph) => Some(eph),
            _ => None,
        }
    }

    /// Returns [GalileoEphemeris] if [Self] describes a Galileo satellite
    pub fn as_galileo(&self) -> Option<&GalileoEphemeris> {
        match self {
            Self::Galileo(eph) => Some(eph),
            _ => None,
        }
    }

    /// Returns [BeiDouEphemeris] if [Self] describes a BeiDou satellite
    pub fn as_beidou(&self) -> Option<&BeiDouEphemeris> {
        match self {
            Self::BeiDou(eph) => Some(eph),
            _ => None,
        }
    }

    /// Returns [SBASEphemeris] if [Self] describes a geostationary SBAS satellite
    pub fn as_sbas(&self) -> Option<&SBASEphemeris> {
        match self {
            Self::SBAS(eph) => Some(eph),
            _ => None,
        }
    }
}
