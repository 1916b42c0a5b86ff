//! BeiDou (1042) ephemeris
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

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BeiDouEphemeris {
    pub sv: SV,
    /// Full BDT week
    pub week: u32,
    /// User range accuracy [m]
    pub ura_m: f64,
    pub idot: f64,
    /// Age of data (ephemeris)
    pub aode: u8,
    /// Time of clock [s of BDT week]
    pub toc_s: f64,
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
    /// Age of data (clock)
    pub aodc: u8,
    pub crs: f64,
    pub delta_n: f64,
    pub m0: f64,
    pub cuc: f64,
    pub e: f64,
    pub cus: f64,
    pub sqrt_a: f64,
    /// Time of ephemeris [s of BDT week]
    pub toe_s: f64,
    pub cic: f64,
    pub omega0: f64,
    pub cis: f64,
    pub i0: f64,
    pub crc: f64,
    pub omega: f64,
    pub omega_dot: f64,
    /// B1I group delay [s]
    pub tgd1: f64,
    /// B2I group delay [s]
    pub tgd2: f64,
    /// Autonomous satellite health flag
    pub health: u8,
}

impl BeiDouEphemeris {
    /// Time of clock, in BDT
    pub fn toc(&self) -> Epoch {
        from_week_seconds(self.week, self.toc_s, TimeScale::BDT)
    }

    /// Time of ephemeris, in BDT
    pub fn toe(&self) -> Epoch {
        from_week_seconds(self.week, self.toe_s, TimeScale::BDT)
    }

    /// True for geostationary satellites (C01-C05, C59-C63),
    /// which require a dedicated rotation into BDCS.
    pub fn is_geo(&self) -> bool {
        self.sv.prn <= 5 || self.sv.prn >= 59
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

    /// Decodes a 1042 payload.
    pub fn decode(payload: &[u8], reference: Epoch) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        if r.read_u16(12)? != 1042 {
            return Err(Error::InvalidFrame);
        }

        let prn = r.read_u8(6)?;
        let (ref_week, _) = week_seconds(reference, TimeScale::BDT);
        let week = resolve_week(r.read_u32(13)?, 8192, ref_week);

        Ok(Self {
            sv: SV::new(Constellation::BeiDou, prn),
            week,
            ura_m: URA::from_index(r.read_u8(4)?),
            idot: r.read_scaled(14, PI / 2.0_f64.powi(43))?,
            aode: r.read_u8(5)?,
            toc_s: r.read_scaled_unsigned(17, 8.0)?,
            a2: r.read_scaled(11, 2.0_f64.powi(-66))?,
            a1: r.read_scaled(22, 2.0_f64.powi(-50))?,
            a0: r.read_scaled(24, 2.0_f64.powi(-33))?,
            aodc: r.read_u8(5)?,
            crs: r.read_scaled(18, 2.0_f64.powi(-6))?,
            delta_n: r.read_scaled(16, PI / 2.0_f64.powi(43))?,
            m0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            cuc: r.read_scaled(18, 2.0_f64.powi(-31))?,
            e: r.read_scaled_unsigned(32, 2.0_f64.powi(-33))?,
            cus: r.read_scaled(18, 2.0_f64.powi(-31))?,
            sqrt_a: r.read_scaled_unsigned(32, 2.0_f64.powi(-19))?,
            toe_s: r.read_scaled_unsigned(17, 8.0)?,
            cic: r.read_scaled(18, 2.0_f64.powi(-31))?,
            omega0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            cis: r.read_scaled(18, 2.0_f64.powi(-31))?,
            i0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            crc: r.read_scaled(18, 2.0_f64.powi(-6))?,
            omega: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            omega_dot: r.read_scaled(24, PI / 2.0_f64.powi(43))?,
            tgd1: r.read_scaled(10, 1.0E-10)?,
            tgd2: r.read_scaled(10, 1.0E-10)?,
            health: r.read_u8(1)?,
        })
    }

    /// Encodes [Self] as a complete 1042 frame.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut w = BitWriter::new();
        w.write_unsigned(12, 1042)?;
        w.write_unsigned(6, self.sv.prn as u64)?;
        w.write_unsigned(13, (self.week % 8192) as u64)?;
        w.write_unsigned(4, URA::to_index(self.ura_m) as u64)?;
        w.write_scaled(14, self.idot, PI / 2.0_f64.powi(43))?;
        w.write_unsigned(5, self.aode as u64)?;
        w.write_scaled_unsigned(17, self.toc_s, 8.0)?;
        w.write_scaled(11, self.a2, 2.0_f64.powi(-66))?;
        w.write_scaled(22, self.a1, 2.0_f64.powi(-50))?;
        w.write_scaled(24, self.a0, 2.0_f64.powi(-33))?;
        w.write_unsigned(5, self.aodc as u64)?;
        w.write_scaled(18, self.crs, 2.0_f64.powi(-6))?;
        w.write_scaled(16, self.delta_n, PI / 2.0_f64.powi(43))?;
        w.write_scaled(32, self.m0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(18, self.cuc, 2.0_f64.powi(-31))?;
        w.write_scaled_unsigned(32, self.e, 2.0_f64.powi(-33))?;
        w.write_scaled(18, self.cus, 2.0_f64.powi(-31))?;
        w.write_scaled_unsigned(32, self.sqrt_a, 2.0_f64.powi(-19))?;
        w.write_scaled_unsigned(17, self.toe_s, 8.0)?;
        w.write_scaled(18, self.cic, 2.0_f64.powi(-31))?;
        w.write_scaled(32, self.omega0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(18, self.cis, 2.0_f64.powi(-31))?;
        w.write_scaled(32, self.i0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(18, self.crc, 2.0_f64.powi(-6))?;
        w.write_scaled(32, self.omega, PI / 2.0_f64.powi(31))?;
        w.write_scaled(24, self.omega_dot, PI / 2.0_f64.powi(43))?;
        w.write_scaled(10, self.tgd1, 1.0E-10)?;
        w.write_scaled(10, self.tgd2, 1.0E-10)?;
        w.write_unsigned(1, self.health as u64)?;
        Frame::wrap(&w.into_bytes())
    }
}
