//! Galileo F/NAV (1045) and I/NAV (1046) ephemerides
use std::f64::consts::PI;

use gnss::prelude::{Constellation, SV};
use hifitime::{Epoch, TimeScale};

use crate::{
    bits::{BitReader, BitWriter},
    frame::Frame,
    message::ephemeris::URA,
    orbit::{Kepler, Perturbations},
    time::{from_week_seconds, resolve_week, week_seconds},
    Error,
};

/// Navigation message a [GalileoEphemeris] was collected from
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GalileoSource {
    /// F/NAV (E5a), message 1045
    FNav,
    /// I/NAV (E1-B / E5b), message 1046
    #[default]
    INav,
}

impl GalileoSource {
    /// RTCM3 message number
    pub fn message_type(&self) -> u16 {
        match self {
            Self::FNav => 1045,
            Self::INav => 1046,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GalileoEphemeris {
    pub sv: SV,
    pub source: GalileoSource,
    /// Full GST week (rollover resolved)
    pub week: u32,
    /// Issue of data (navigation)
    pub iodnav: u16,
    /// Signal In Space Accuracy [m], [URA::NAPA] when not available
    pub sisa_m: f64,
    /// Rate of inclination [rad/s]
    pub idot: f64,
    /// Time of clock [s of week]
    pub toc_s: f64,
    pub af0: f64,
    pub af1: f64,
    pub af2: f64,
    pub crs: f64,
    pub delta_n: f64,
    pub m0: f64,
    pub cuc: f64,
    pub e: f64,
    pub cus: f64,
    pub sqrt_a: f64,
    /// Time of ephemeris [s of week]
    pub toe_s: f64,
    pub cic: f64,
    pub omega0: f64,
    pub cis: f64,
    pub i0: f64,
    pub crc: f64,
    pub omega: f64,
    pub omega_dot: f64,
    /// E1/E5a broadcast group delay [s]
    pub bgd_e5a_e1: f64,
    /// E1/E5b broadcast group delay [s] (I/NAV only)
    pub bgd_e5b_e1: f64,
    /// E5a signal health (F/NAV only)
    pub e5a_health: u8,
    pub e5a_data_invalid: bool,
    /// E5b signal health (I/NAV only)
    pub e5b_health: u8,
    pub e5b_data_invalid: bool,
    /// E1-B signal health (I/NAV only)
    pub e1b_health: u8,
    pub e1b_data_invalid: bool,
}

impl GalileoEphemeris {
    /// Time of clock, in GST
    pub fn toc(&self) -> Epoch {
        from_week_seconds(self.week, self.toc_s, TimeScale::GST)
    }

    /// Time of ephemeris, in GST
    pub fn toe(&self) -> Epoch {
        from_week_seconds(self.week, self.toe_s, TimeScale::GST)
    }

    /// Health summary: zero when all signals are healthy and valid
    pub fn health(&self) -> u8 {
        match self.source {
            GalileoSource::FNav => self.e5a_health | (self.e5a_data_invalid as u8) << 2,
            GalileoSource::INav => {
                self.e1b_health
                    | (self.e1b_data_invalid as u8) << 2
                    | self.e5b_health << 3
                    | (self.e5b_data_invalid as u8) << 5
            },
        }
    }

    pub(crate) fn kepler(&self) -> Kepler {
        Kepler {
            a: self.sqrt_a.powi(2),
            e: self.e,
            i_0: self.i0,
            omega_0: self.omega0,
            m_0: self.m0,
            omega: self.omega,
            toe: self.toe(),
            toe_s: self.toe_s,
        }
    }

    pub(crate) fn perturbations(&self) -> Perturbations {
        Perturbations {
            dn: self.delta_n,
            i_dot: self.idot,
            omega_dot: self.omega_dot,
            cus: self.cus,
            cuc: self.cuc,
            cis: self.cis,
            cic: self.cic,
            crs: self.crs,
            crc: self.crc,
        }
    }

    /// Decodes a 1045 or 1046 payload.
    pub fn decode(payload: &[u8], reference: Epoch) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        let source = match r.read_u16(12)? {
            1045 => GalileoSource::FNav,
            1046 => GalileoSource::INav,
            _ => return Err(Error::InvalidFrame),
        };

        let prn = r.read_u8(6)?;
        let (ref_week, _) = week_seconds(reference, TimeScale::GST);
        let week = resolve_week(r.read_u32(12)?, 4096, ref_week);

        let mut eph = Self {
            sv: SV::new(Constellation::Galileo, prn),
            source,
            week,
            iodnav: r.read_u16(10)?,
            sisa_m: URA::from_sisa_index(r.read_u8(8)?),
            idot: r.read_scaled(14, PI / 2.0_f64.powi(43))?,
            toc_s: r.read_scaled_unsigned(14, 60.0)?,
            af2: r.read_scaled(6, 2.0_f64.powi(-59))?,
            af1: r.read_scaled(21, 2.0_f64.powi(-46))?,
            af0: r.read_scaled(31, 2.0_f64.powi(-34))?,
            crs: r.read_scaled(16, 2.0_f64.powi(-5))?,
            delta_n: r.read_scaled(16, PI / 2.0_f64.powi(43))?,
            m0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            cuc: r.read_scaled(16, 2.0_f64.powi(-29))?,
            e: r.read_scaled_unsigned(32, 2.0_f64.powi(-33))?,
            cus: r.read_scaled(16, 2.0_f64.powi(-29))?,
            sqrt_a: r.read_scaled_unsigned(32, 2.0_f64.powi(-19))?,
            toe_s: r.read_scaled_unsigned(14, 60.0)?,
            cic: r.read_scaled(16, 2.0_f64.powi(-29))?,
            omega0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            cis: r.read_scaled(16, 2.0_f64.powi(-29))?,
            i0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            crc: r.read_scaled(16, 2.0_f64.powi(-5))?,
            omega: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            omega_dot: r.read_scaled(24, PI / 2.0_f64.powi(43))?,
            bgd_e5a_e1: r.read_scaled(10, 2.0_f64.powi(-32))?,
            ..Default::default()
        };

        match source {
            GalileoSource::FNav => {
                eph.e5a_health = r.read_u8(2)?;
                eph.e5a_data_invalid = r.read_bool()?;
                r.skip(7)?;
            },
            GalileoSource::INav => {
                eph.bgd_e5b_e1 = r.read_scaled(10, 2.0_f64.powi(-32))?;
                eph.e5b_health = r.read_u8(2)?;
                eph.e5b_data_invalid = r.read_bool()?;
                eph.e1b_health = r.read_u8(2)?;
                eph.e1b_data_invalid = r.read_bool()?;
                r.skip(2)?;
            },
        }

        Ok(eph)
    }

    /// Encodes [Self] as a complete 1045 or 1046 frame, depending on its source.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut w = BitWriter::new();
        w.write_unsigned(12, self.source.message_type() as u64)?;
        w.write_unsigned(6, self.sv.prn as u64)?;
        w.write_unsigned(12, (self.week % 4096) as u64)?;
        w.write_unsigned(10, self.iodnav as u64)?;
        w.write_unsigned(8, URA::to_sisa_index(self.sisa_m) as u64)?;
        w.write_scaled(14, self.idot, PI / 2.0_f64.powi(43))?;
        w.write_scaled_unsigned(14, self.toc_s, 60.0)?;
        w.write_scaled(6, self.af2, 2.0_f64.powi(-59))?;
        w.write_scaled(21, self.af1, 2.0_f64.powi(-46))?;
        w.write_scaled(31, self.af0, 2.0_f64.powi(-34))?;
        w.write_scaled(16, self.crs, 2.0_f64.powi(-5))?;
        w.write_scaled(16, self.delta_n, PI / 2.0_f64.powi(43))?;
        w.write_scaled(32, self.m0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.cuc, 2.0_f64.powi(-29))?;
        w.write_scaled_unsigned(32, self.e, 2.0_f64.powi(-33))?;
        w.write_scaled(16, self.cus, 2.0_f64.powi(-29))?;
        w.write_scaled_unsigned(32, self.sqrt_a, 2.0_f64.powi(-19))?;
        w.write_scaled_unsigned(14, self.toe_s, 60.0)?;
        w.write_scaled(16, self.cic, 2.0_f64.powi(-29))?;
        w.write_scaled(32, self.omega0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.cis, 2.0_f64.powi(-29))?;
        w.write_scaled(32, self.i0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.crc, 2.0_f64.powi(-5))?;
        w.write_scaled(32, self.omega, PI / 2.0_f64.powi(31))?;
        w.write_scaled(24, self.omega_dot, PI / 2.0_f64.powi(43))?;
        w.write_scaled(10, self.bgd_e5a_e1, 2.0_f64.powi(-32))?;

        match self.source {
            GalileoSource::FNav => {
                w.write_unsigned(2, self.e5a_health as u64)?;
                w.write_bool(self.e5a_data_invalid)?;
                w.write_unsigned(7, 0)?;
            },
            GalileoSource::INav => {
                w.write_scaled(10, self.bgd_e5b_e1, 2.0_f64.powi(-32))?;
                w.write_unsigned(2, self.e5b_health as u64)?;
                w.write_bool(self.e5b_data_invalid)?;
                w.write_unsigned(2, self.e1b_health as u64)?;
                w.write_bool(self.e1b_data_invalid)?;
                w.write_unsigned(2, 0)?;
            },
        }

        Frame::wrap(&w.into_bytes())
    }
}
