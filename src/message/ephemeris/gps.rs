//! GPS (1019) and QZSS (1044) ephemerides
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

/// [GPSEphemeris] describes GPS and QZSS satellites (LNAV like orbits).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GPSEphemeris {
    pub sv: SV,
    /// Full GPS week (rollover resolved)
    pub week: u32,
    /// User range accuracy [m]
    pub ura_m: f64,
    /// Codes on L2 channel
    pub l2_codes: u8,
    /// L2 P data flag
    pub l2p_flag: bool,
    /// Issue of data (ephemeris)
    pub iode: u8,
    /// Issue of data (clock)
    pub iodc: u16,
    /// Time of clock [s of week]
    pub toc_s: f64,
    /// Clock offset [s]
    pub af0: f64,
    /// Clock drift [s/s]
    pub af1: f64,
    /// Clock drift rate [s/s²]
    pub af2: f64,
    /// Time of ephemeris [s of week]
    pub toe_s: f64,
    /// Square root of semi-major axis [m^1/2]
    pub sqrt_a: f64,
    /// Eccentricity
    pub e: f64,
    /// Mean anomaly at reference time [rad]
    pub m0: f64,
    /// Mean motion difference [rad/s]
    pub delta_n: f64,
    /// Inclination at reference time [rad]
    pub i0: f64,
    /// Rate of inclination [rad/s]
    pub idot: f64,
    /// Longitude of ascending node at weekly epoch [rad]
    pub omega0: f64,
    /// Rate of right ascension [rad/s]
    pub omega_dot: f64,
    /// Argument of perigee [rad]
    pub omega: f64,
    pub cuc: f64,
    pub cus: f64,
    pub crc: f64,
    pub crs: f64,
    pub cic: f64,
    pub cis: f64,
    /// Group delay [s]
    pub tgd: f64,
    /// SV health code
    pub health: u8,
    /// Fit interval flag: false means 4 hours
    pub fit_interval: bool,
}

impl GPSEphemeris {
    /// Time of clock, in GPST
    pub fn toc(&self) -> Epoch {
        from_week_seconds(self.week, self.toc_s, TimeScale::GPST)
    }

    /// Time of ephemeris, in GPST.
    /// toe and toc share the week of the broadcast message.
    pub fn toe(&self) -> Epoch {
        from_week_seconds(self.week, self.toe_s, TimeScale::GPST)
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

    /// Decodes a 1019 payload. The 10 bit week counter is resolved
    /// to the rollover closest to `reference`.
    pub fn decode_1019(payload: &[u8], reference: Epoch) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        if r.read_u16(12)? != 1019 {
            return Err(Error::InvalidFrame);
        }

        // SBAS broadcast orbits are carried by 1043
        let prn = r.read_u8(6)?;
        if !(1..=32).contains(&prn) {
            return Err(Error::InvalidSatellite);
        }

        let (ref_week, _) = week_seconds(reference, TimeScale::GPST);
        let week = resolve_week(r.read_u32(10)?, 1024, ref_week);

        let mut eph = Self {
            sv: SV::new(Constellation::GPS, prn),
            week,
            ura_m: URA::from_index(r.read_u8(4)?),
            l2_codes: r.read_u8(2)?,
            idot: r.read_scaled(14, PI / 2.0_f64.powi(43))?,
            iode: r.read_u8(8)?,
            toc_s: r.read_scaled_unsigned(16, 16.0)?,
            af2: r.read_scaled(8, 2.0_f64.powi(-55))?,
            af1: r.read_scaled(16, 2.0_f64.powi(-43))?,
            af0: r.read_scaled(22, 2.0_f64.powi(-31))?,
            iodc: r.read_u16(10)?,
            crs: r.read_scaled(16, 2.0_f64.powi(-5))?,
            delta_n: r.read_scaled(16, PI / 2.0_f64.powi(43))?,
            m0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            cuc: r.read_scaled(16, 2.0_f64.powi(-29))?,
            e: r.read_scaled_unsigned(32, 2.0_f64.powi(-33))?,
            cus: r.read_scaled(16, 2.0_f64.powi(-29))?,
            sqrt_a: r.read_scaled_unsigned(32, 2.0_f64.powi(-19))?,
            toe_s: r.read_scaled_unsigned(16, 16.0)?,
            cic: r.read_scaled(16, 2.0_f64.powi(-29))?,
            omega0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            cis: r.read_scaled(16, 2.0_f64.powi(-29))?,
            i0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            crc: r.read_scaled(16, 2.0_f64.powi(-5))?,
            omega: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            omega_dot: r.read_scaled(24, PI / 2.0_f64.powi(43))?,
            tgd: r.read_scaled(8, 2.0_f64.powi(-31))?,
            health: r.read_u8(6)?,
            ..Default::default()
        };

        eph.l2p_flag = r.read_bool()?;
        eph.fit_interval = r.read_bool()?;
        Ok(eph)
    }

    /// Decodes a 1044 (QZSS) payload.
    pub fn decode_1044(payload: &[u8], reference: Epoch) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        if r.read_u16(12)? != 1044 {
            return Err(Error::InvalidFrame);
        }

        // J01 is PRN 193, transmitted as 0
        let prn = r.read_u8(4)? + 1;

        let mut eph = Self {
            sv: SV::new(Constellation::QZSS, prn),
            toc_s: r.read_scaled_unsigned(16, 16.0)?,
            af2: r.read_scaled(8, 2.0_f64.powi(-55))?,
            af1: r.read_scaled(16, 2.0_f64.powi(-43))?,
            af0: r.read_scaled(22, 2.0_f64.powi(-31))?,
            iode: r.read_u8(8)?,
            crs: r.read_scaled(16, 2.0_f64.powi(-5))?,
            delta_n: r.read_scaled(16, PI / 2.0_f64.powi(43))?,
            m0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            cuc: r.read_scaled(16, 2.0_f64.powi(-29))?,
            e: r.read_scaled_unsigned(32, 2.0_f64.powi(-33))?,
            cus: r.read_scaled(16, 2.0_f64.powi(-29))?,
            sqrt_a: r.read_scaled_unsigned(32, 2.0_f64.powi(-19))?,
            toe_s: r.read_scaled_unsigned(16, 16.0)?,
            cic: r.read_scaled(16, 2.0_f64.powi(-29))?,
            omega0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            cis: r.read_scaled(16, 2.0_f64.powi(-29))?,
            i0: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            crc: r.read_scaled(16, 2.0_f64.powi(-5))?,
            omega: r.read_scaled(32, PI / 2.0_f64.powi(31))?,
            omega_dot: r.read_scaled(24, PI / 2.0_f64.powi(43))?,
            idot: r.read_scaled(14, PI / 2.0_f64.powi(43))?,
            l2_codes: r.read_u8(2)?,
            ..Default::default()
        };

        let (ref_week, _) = week_seconds(reference, TimeScale::GPST);
        eph.week = resolve_week(r.read_u32(10)?, 1024, ref_week);
        eph.ura_m = URA::from_index(r.read_u8(4)?);
        eph.health = r.read_u8(6)?;
        eph.tgd = r.read_scaled(8, 2.0_f64.powi(-31))?;
        eph.iodc = r.read_u16(10)?;
        eph.fit_interval = r.read_bool()?;
        Ok(eph)
    }

    /// Encodes [Self] as a complete frame: 1019 for GPS, 1044 for QZSS.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let payload = match self.sv.constellation {
            Constellation::GPS => self.encode_1019()?,
            Constellation::QZSS => self.encode_1044()?,
            _ => return Err(Error::NonSupportedConstellation),
        };
        Frame::wrap(&payload)
    }

    fn encode_1019(&self) -> Result<Vec<u8>, Error> {
        if !(1..=32).contains(&self.sv.prn) {
            return Err(Error::InvalidSatellite);
        }

        let mut w = BitWriter::new();
        w.write_unsigned(12, 1019)?;
        w.write_unsigned(6, self.sv.prn as u64)?;
        w.write_unsigned(10, (self.week % 1024) as u64)?;
        w.write_unsigned(4, URA::to_index(self.ura_m) as u64)?;
        w.write_unsigned(2, self.l2_codes as u64)?;
        w.write_scaled(14, self.idot, PI / 2.0_f64.powi(43))?;
        w.write_unsigned(8, self.iode as u64)?;
        w.write_scaled_unsigned(16, self.toc_s, 16.0)?;
        w.write_scaled(8, self.af2, 2.0_f64.powi(-55))?;
        w.write_scaled(16, self.af1, 2.0_f64.powi(-43))?;
        w.write_scaled(22, self.af0, 2.0_f64.powi(-31))?;
        w.write_unsigned(10, self.iodc as u64)?;
        w.write_scaled(16, self.crs, 2.0_f64.powi(-5))?;
        w.write_scaled(16, self.delta_n, PI / 2.0_f64.powi(43))?;
        w.write_scaled(32, self.m0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.cuc, 2.0_f64.powi(-29))?;
        w.write_scaled_unsigned(32, self.e, 2.0_f64.powi(-33))?;
        w.write_scaled(16, self.cus, 2.0_f64.powi(-29))?;
        w.write_scaled_unsigned(32, self.sqrt_a, 2.0_f64.powi(-19))?;
        w.write_scaled_unsigned(16, self.toe_s, 16.0)?;
        w.write_scaled(16, self.cic, 2.0_f64.powi(-29))?;
        w.write_scaled(32, self.omega0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.cis, 2.0_f64.powi(-29))?;
        w.write_scaled(32, self.i0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.crc, 2.0_f64.powi(-5))?;
        w.write_scaled(32, self.omega, PI / 2.0_f64.powi(31))?;
        w.write_scaled(24, self.omega_dot, PI / 2.0_f64.powi(43))?;
        w.write_scaled(8, self.tgd, 2.0_f64.powi(-31))?;
        w.write_unsigned(6, self.health as u64)?;
        w.write_bool(self.l2p_flag)?;
        w.write_bool(self.fit_interval)?;
        Ok(w.into_bytes())
    }

    fn encode_1044(&self) -> Result<Vec<u8>, Error> {
        let prn = self
            .sv
            .prn
            .checked_sub(1)
            .filter(|prn| *prn < 16)
            .ok_or(Error::InvalidSatellite)?;

        let mut w = BitWriter::new();
        w.write_unsigned(12, 1044)?;
        w.write_unsigned(4, prn as u64)?;
        w.write_scaled_unsigned(16, self.toc_s, 16.0)?;
        w.write_scaled(8, self.af2, 2.0_f64.powi(-55))?;
        w.write_scaled(16, self.af1, 2.0_f64.powi(-43))?;
        w.write_scaled(22, self.af0, 2.0_f64.powi(-31))?;
        w.write_unsigned(8, self.iode as u64)?;
        w.write_scaled(16, self.crs, 2.0_f64.powi(-5))?;
        w.write_scaled(16, self.delta_n, PI / 2.0_f64.powi(43))?;
        w.write_scaled(32, self.m0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.cuc, 2.0_f64.powi(-29))?;
        w.write_scaled_unsigned(32, self.e, 2.0_f64.powi(-33))?;
        w.write_scaled(16, self.cus, 2.0_f64.powi(-29))?;
        w.write_scaled_unsigned(32, self.sqrt_a, 2.0_f64.powi(-19))?;
        w.write_scaled_unsigned(16, self.toe_s, 16.0)?;
        w.write_scaled(16, self.cic, 2.0_f64.powi(-29))?;
        w.write_scaled(32, self.omega0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.cis, 2.0_f64.powi(-29))?;
        w.write_scaled(32, self.i0, PI / 2.0_f64.powi(31))?;
        w.write_scaled(16, self.crc, 2.0_f64.powi(-5))?;
        w.write_scaled(32, self.omega, PI / 2.0_f64.powi(31))?;
        w.write_scaled(24, self.omega_dot, PI / 2.0_f64.powi(43))?;
        w.write_scaled(14, self.idot, PI / 2.0_f64.powi(43))?;
        w.write_unsigned(2, self.l2_codes as u64)?;
        w.write_unsigned(10, (self.week % 1024) as u64)?;
        w.write_unsigned(4, URA::to_index(self.ura_m) as u64)?;
        w.write_unsigned(6, self.health as u64)?;
        w.write_scaled(8, self.tgd, 2.0_f64.powi(-31))?;
        w.write_unsigned(10, self.iodc as u64)?;
        w.write_bool(self.fit_interval)?;
        Ok(w.into_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn reference_ephemeris() -> GPSEphemeris {
        GPSEphemeris {
            sv: SV::new(Constellation::GPS, 7),
            week: 2300,
            ura_m: 2.0,
            l2_codes: 1,
            l2p_flag: false,
            iode: 71,
            iodc: 71,
            toc_s: 352800.0,
            af0: 3.912_973_636_761E-4,
            af1: -1.136_868_377_216E-12,
            af2: 0.0,
            toe_s: 352800.0,
            sqrt_a: 5153.636_806_488,
            e: 1.456_727_134_064E-2,
            m0: 1.234_567_890_12,
            delta_n: 4.502_330_114_735E-9,
            i0: 9.541_425_466_271E-1,
            idot: -2.371_527_363_512E-10,
            omega0: -1.843_452_987_654,
            omega_dot: -8.178_198_083_264E-9,
            omega: -1.712_874_563_218,
            cuc: -1.234_561_204_910E-6,
            cus: 7.851_794_362_068E-6,
            crc: 2.318_125E2,
            crs: -2.218_75E1,
            cic: 1.862_645_149_231E-8,
            cis: -7.450_580_596_924E-8,
            tgd: -1.117_587_089_539E-8,
            health: 0,
            fit_interval: false,
        }
    }

    fn assert_close(a: f64, b: f64, step: f64) {
        assert!((a - b).abs() <= step / 2.0 * 1.0001, "{} != {}", a, b);
    }

    #[test]
    fn gps_round_trip() {
        let eph = reference_ephemeris();
        let reference = Epoch::from_str("2024-02-06T00:00:00 GPST").unwrap();

        let bytes = eph.encode().unwrap();
        // 488 bits
        assert_eq!(bytes.len(), 61 + 6);

        let (frame, _) = Frame::decode(&bytes).unwrap();
        assert_eq!(frame.message_type, 1019);

        let decoded = GPSEphemeris::decode_1019(&frame.payload, reference).unwrap();
        assert_eq!(decoded.sv, eph.sv);
        assert_eq!(decoded.week, 2300);
        assert_eq!(decoded.iode, 71);
        assert_eq!(decoded.iodc, 71);
        assert_eq!(decoded.toe_s, 352800.0);
        assert_eq!(decoded.ura_m, 2.0);
        assert_close(decoded.sqrt_a, eph.sqrt_a, 2.0_f64.powi(-19));
        assert_close(decoded.e, eph.e, 2.0_f64.powi(-33));
        assert_close(decoded.m0, eph.m0, PI * 2.0_f64.powi(-31));
        assert_close(decoded.omega0, eph.omega0, PI * 2.0_f64.powi(-31));
        assert_close(decoded.omega_dot, eph.omega_dot, PI * 2.0_f64.powi(-43));
        assert_close(decoded.af0, eph.af0, 2.0_f64.powi(-31));
        assert_close(decoded.crc, eph.crc, 2.0_f64.powi(-5));
        assert_close(decoded.tgd, eph.tgd, 2.0_f64.powi(-31));

        assert_eq!(
            decoded.toe(),
            Epoch::from_str("2024-02-08T02:00:00 GPST").unwrap()
        );
    }

    #[test]
    fn qzss_round_trip() {
        let mut eph = reference_ephemeris();
        eph.sv = SV::new(Constellation::QZSS, 3);
        eph.fit_interval = true;

        let reference = Epoch::from_str("2024-02-06T00:00:00 GPST").unwrap();
        let bytes = eph.encode().unwrap();
        let (frame, _) = Frame::decode(&bytes).unwrap();
        assert_eq!(frame.message_type, 1044);

        let decoded = GPSEphemeris::decode_1044(&frame.payload, reference).unwrap();
        assert_eq!(decoded.sv, eph.sv);
        assert_eq!(decoded.week, 2300);
        assert!(decoded.fit_interval);
        assert_close(decoded.idot, eph.idot, PI * 2.0_f64.powi(-43));
        assert_close(decoded.i0, eph.i0, PI * 2.0_f64.powi(-31));
    }

    #[test]
    fn non_representable() {
        let mut eph = reference_ephemeris();
        eph.e = 1.5;
        assert!(matches!(eph.encode(), Err(Error::FieldOutOfRange(32))));

        let mut eph = reference_ephemeris();
        eph.sv = SV::new(Constellation::QZSS, 17);
        assert!(matches!(eph.encode(), Err(Error::InvalidSatellite)));
    }

    #[test]
    fn gps_prn_range() {
        let reference = Epoch::from_str("2024-02-06T00:00:00 GPST").unwrap();
        let bytes = reference_ephemeris().encode().unwrap();
        let (frame, _) = Frame::decode(&bytes).unwrap();

        // 6 bit satellite ID follows the message number
        for (prn, valid) in [(0, false), (1, true), (32, true), (33, false), (40, false), (63, false)] {
            let mut payload = frame.payload.clone();
            payload[1] = (payload[1] & 0xf0) | (prn >> 2);
            payload[2] = (payload[2] & 0x3f) | ((prn & 0x03) << 6);

            let decoded = GPSEphemeris::decode_1019(&payload, reference);
            if valid {
                assert_eq!(decoded.unwrap().sv, SV::new(Constellation::GPS, prn));
            } else {
                assert!(
                    matches!(decoded, Err(Error::InvalidSatellite)),
                    "PRN {} should be rejected",
                    prn
                );
            }
        }

        let mut eph = reference_ephemeris();
        eph.sv = SV::new(Constellation::GPS, 0);
        assert!(matches!(eph.encode(), Err(Error::InvalidSatellite)));
        eph.sv = SV::new(Constellation::GPS, 33);
        assert!(matches!(eph.encode(), Err(Error::InvalidSatellite)));
    }
}
