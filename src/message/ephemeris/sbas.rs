//! SBAS (1043) ephemeris
use gnss::prelude::{Constellation, SV};
use hifitime::Epoch;

use crate::{
    bits::{BitReader, BitWriter},
    frame::Frame,
    message::ephemeris::URA,
    time::{gpst_from_time_of_day, time_of_day},
    Error,
};

/// S20 (PRN 120) is transmitted as 0
const SBAS_PRN_OFFSET: u8 = 20;

/// [SBASEphemeris] is a geostationary state vector, in meters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SBASEphemeris {
    pub sv: SV,
    /// Issue of data (navigation)
    pub iodn: u8,
    /// Reference time, resolved in GPST
    pub t0: Epoch,
    /// User range accuracy [m]
    pub ura_m: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    pub vx_m_s: f64,
    pub vy_m_s: f64,
    pub vz_m_s: f64,
    pub ax_m_s2: f64,
    pub ay_m_s2: f64,
    pub az_m_s2: f64,
    /// Clock offset [s]
    pub agf0: f64,
    /// Clock drift [s/s]
    pub agf1: f64,
}

impl Default for SBASEphemeris {
    fn default() -> Self {
        Self {
            sv: SV::new(Constellation::SBAS, 20),
            iodn: 0,
            t0: Epoch::default(),
            ura_m: 0.0,
            x_m: 0.0,
            y_m: 0.0,
            z_m: 0.0,
            vx_m_s: 0.0,
            vy_m_s: 0.0,
            vz_m_s: 0.0,
            ax_m_s2: 0.0,
            ay_m_s2: 0.0,
            az_m_s2: 0.0,
            agf0: 0.0,
            agf1: 0.0,
        }
    }
}

impl SBASEphemeris {
    /// Decodes a 1043 payload. The time of day is resolved
    /// to the day closest to `reference`.
    pub fn decode(payload: &[u8], reference: Epoch) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        if r.read_u16(12)? != 1043 {
            return Err(Error::InvalidFrame);
        }

        let prn = r.read_u8(6)? + SBAS_PRN_OFFSET;
        let iodn = r.read_u8(8)?;
        let tod = r.read_scaled_unsigned(13, 16.0)?;

        Ok(Self {
            sv: SV::new(Constellation::SBAS, prn),
            iodn,
            t0: gpst_from_time_of_day(tod, reference),
            ura_m: URA::from_index(r.read_u8(4)?),
            x_m: r.read_scaled(30, 0.08)?,
            y_m: r.read_scaled(30, 0.08)?,
            z_m: r.read_scaled(25, 0.4)?,
            vx_m_s: r.read_scaled(17, 0.000625)?,
            vy_m_s: r.read_scaled(17, 0.000625)?,
            vz_m_s: r.read_scaled(18, 0.004)?,
            ax_m_s2: r.read_scaled(10, 0.0000125)?,
            ay_m_s2: r.read_scaled(10, 0.0000125)?,
            az_m_s2: r.read_scaled(10, 0.0000625)?,
            agf0: r.read_scaled(12, 2.0_f64.powi(-31))?,
            agf1: r.read_scaled(8, 2.0_f64.powi(-40))?,
        })
    }

    /// Encodes [Self] as a complete 1043 frame.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let prn = self
            .sv
            .prn
            .checked_sub(SBAS_PRN_OFFSET)
            .ok_or(Error::InvalidSatellite)?;

        let mut w = BitWriter::new();
        w.write_unsigned(12, 1043)?;
        w.write_unsigned(6, prn as u64)?;
        w.write_unsigned(8, self.iodn as u64)?;
        w.write_scaled_unsigned(13, time_of_day(self.t0), 16.0)?;
        w.write_unsigned(4, URA::to_index(self.ura_m) as u64)?;
        w.write_scaled(30, self.x_m, 0.08)?;
        w.write_scaled(30, self.y_m, 0.08)?;
        w.write_scaled(25, self.z_m, 0.4)?;
        w.write_scaled(17, self.vx_m_s, 0.000625)?;
        w.write_scaled(17, self.vy_m_s, 0.000625)?;
        w.write_scaled(18, self.vz_m_s, 0.004)?;
        w.write_scaled(10, self.ax_m_s2, 0.0000125)?;
        w.write_scaled(10, self.ay_m_s2, 0.0000125)?;
        w.write_scaled(10, self.az_m_s2, 0.0000625)?;
        w.write_scaled(12, self.agf0, 2.0_f64.powi(-31))?;
        w.write_scaled(8, self.agf1, 2.0_f64.powi(-40))?;
        Frame::wrap(&w.into_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sbas_round_trip() {
        let eph = SBASEphemeris {
            sv: SV::new(Constellation::SBAS, 26),
            iodn: 141,
            t0: Epoch::from_str("2024-02-07T13:20:16 GPST").unwrap(),
            ura_m: 4.0,
            x_m: 40_180_960.0,
            y_m: 10_758_336.0,
            z_m: -11_200.4,
            vx_m_s: -0.786_25,
            vy_m_s: 2.936_875,
            vz_m_s: -0.404,
            ax_m_s2: 0.0,
            ay_m_s2: 1.25E-6,
            az_m_s2: -6.25E-5,
            agf0: -3.073_364_496_231E-8,
            agf1: -1.818_989_403_546E-12,
        };

        let bytes = eph.encode().unwrap();
        // 230 bits
        assert_eq!(bytes.len(), 29 + 6);

        let (frame, _) = Frame::decode(&bytes).unwrap();
        assert_eq!(frame.message_type, 1043);

        // decoding happens the next day, just after midnight
        let reference = Epoch::from_str("2024-02-08T00:10:00 GPST").unwrap();
        let decoded = SBASEphemeris::decode(&frame.payload, reference).unwrap();
        assert_eq!(decoded.sv, eph.sv);
        assert_eq!(decoded.iodn, 141);
        assert_eq!(decoded.t0, eph.t0);
        assert_eq!(decoded.ura_m, 4.0);
        assert!((decoded.x_m - eph.x_m).abs() <= 0.04);
        assert!((decoded.z_m - eph.z_m).abs() <= 0.2);
        assert!((decoded.vy_m_s - eph.vy_m_s).abs() <= 0.0003125);
        assert!((decoded.az_m_s2 - eph.az_m_s2).abs() <= 0.00003125);
        assert!((decoded.agf0 - eph.agf0).abs() <= 2.0_f64.powi(-32));
    }

    #[test]
    fn invalid_prn() {
        let eph = SBASEphemeris {
            sv: SV::new(Constellation::SBAS, 10),
            ..Default::default()
        };
        assert!(matches!(eph.encode(), Err(Error::InvalidSatellite)));
    }
}
