//! GLONASS (1020) ephemeris
use gnss::prelude::{Constellation, SV};
use hifitime::Epoch;

use crate::{
    bits::{BitReader, BitWriter},
    frame::Frame,
    time::{glonass_to_gpst, moscow_time_of_day},
    Error,
};

/// [GlonassEphemeris] is the GLONASS broadcast state vector.
/// All real fields are sign-magnitude encoded on the wire.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlonassEphemeris {
    pub sv: SV,
    /// FDMA frequency channel number (-7..=6)
    pub frequency_channel: i8,
    /// Almanac health
    pub almanac_health: bool,
    /// Almanac health availability
    pub almanac_health_available: bool,
    pub p1: u8,
    /// Time of frame start [s of Moscow day]
    pub tk_s: f64,
    /// Health (MSB of Bn)
    pub health: u8,
    pub p2: bool,
    /// Reference time [s of Moscow day], multiple of 15'
    pub tb_s: f64,
    /// Reference time, resolved in GPST
    pub toe: Epoch,
    /// Position [km] (PZ-90)
    pub x_km: f64,
    pub y_km: f64,
    pub z_km: f64,
    /// Velocity [km/s]
    pub vx_km_s: f64,
    pub vy_km_s: f64,
    pub vz_km_s: f64,
    /// Luni-solar acceleration [km/s²]
    pub ax_km_s2: f64,
    pub ay_km_s2: f64,
    pub az_km_s2: f64,
    pub p3: bool,
    /// Relative frequency bias
    pub gamma_n: f64,
    pub p: u8,
    /// Third string ln flag
    pub ln3: bool,
    /// Clock bias [s]
    pub tau_n: f64,
    /// L1/L2 delay difference [s]
    pub delta_tau_n: f64,
    /// Age of data [days]
    pub age: u8,
    pub p4: bool,
    /// Accuracy index
    pub ft: u8,
    /// Calendar day within the four year interval
    pub nt: u16,
    /// Satellite type (GLONASS or GLONASS-M)
    pub m: u8,
    /// Additional data availability
    pub additional_data: bool,
    /// Almanac calendar day
    pub na: u16,
    /// GLONASS to UTC(SU) correction [s]
    pub tau_c: f64,
    /// Four year interval number
    pub n4: u8,
    /// GLONASS to GPS time correction [s]
    pub tau_gps: f64,
    /// Fifth string ln flag
    pub ln5: bool,
}

impl Default for GlonassEphemeris {
    fn default() -> Self {
        Self {
            sv: SV::new(Constellation::Glonass, 1),
            frequency_channel: 0,
            almanac_health: false,
            almanac_health_available: false,
            p1: 0,
            tk_s: 0.0,
            health: 0,
            p2: false,
            tb_s: 0.0,
            toe: Epoch::default(),
            x_km: 0.0,
            y_km: 0.0,
            z_km: 0.0,
            vx_km_s: 0.0,
            vy_km_s: 0.0,
            vz_km_s: 0.0,
            ax_km_s2: 0.0,
            ay_km_s2: 0.0,
            az_km_s2: 0.0,
            p3: false,
            gamma_n: 0.0,
            p: 0,
            ln3: false,
            tau_n: 0.0,
            delta_tau_n: 0.0,
            age: 0,
            p4: false,
            ft: 0,
            nt: 0,
            m: 0,
            additional_data: false,
            na: 0,
            tau_c: 0.0,
            n4: 0,
            tau_gps: 0.0,
            ln5: false,
        }
    }
}

impl GlonassEphemeris {
    /// Issue of data, derived from the reference time: tb / 15'
    pub fn iod(&self) -> u8 {
        (self.tb_s / 900.0).round() as u8
    }

    /// Builds a [GlonassEphemeris] referenced to `toe`,
    /// the day relative times are derived from it.
    pub fn with_toe(&self, toe: Epoch) -> Self {
        let mut s = self.clone();
        s.toe = toe;
        s.tb_s = moscow_time_of_day(toe);
        s
    }

    /// Decodes a 1020 payload. Day relative times are resolved
    /// against `reference`.
    pub fn decode(payload: &[u8], reference: Epoch) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        if r.read_u16(12)? != 1020 {
            return Err(Error::InvalidFrame);
        }

        let slot = r.read_u8(6)?;
        if slot == 0 {
            return Err(Error::InvalidSatellite);
        }

        let mut eph = Self {
            sv: SV::new(Constellation::Glonass, slot),
            frequency_channel: r.read_u8(5)? as i8 - 7,
            almanac_health: r.read_bool()?,
            almanac_health_available: r.read_bool()?,
            p1: r.read_u8(2)?,
            ..Default::default()
        };

        let hours = r.read_unsigned(5)? as f64;
        let minutes = r.read_unsigned(6)? as f64;
        let half_minute = r.read_unsigned(1)? as f64;
        eph.tk_s = hours * 3600.0 + minutes * 60.0 + half_minute * 30.0;

        eph.health = r.read_u8(1)?;
        eph.p2 = r.read_bool()?;
        eph.tb_s = r.read_unsigned(7)? as f64 * 900.0;
        eph.toe = glonass_to_gpst(eph.tb_s, reference);

        eph.vx_km_s = r.read_scaled_signed_magnitude(24, 2.0_f64.powi(-20))?;
        eph.x_km = r.read_scaled_signed_magnitude(27, 2.0_f64.powi(-11))?;
        eph.ax_km_s2 = r.read_scaled_signed_magnitude(5, 2.0_f64.powi(-30))?;
        eph.vy_km_s = r.read_scaled_signed_magnitude(24, 2.0_f64.powi(-20))?;
        eph.y_km = r.read_scaled_signed_magnitude(27, 2.0_f64.powi(-11))?;
        eph.ay_km_s2 = r.read_scaled_signed_magnitude(5, 2.0_f64.powi(-30))?;
        eph.vz_km_s = r.read_scaled_signed_magnitude(24, 2.0_f64.powi(-20))?;
        eph.z_km = r.read_scaled_signed_magnitude(27, 2.0_f64.powi(-11))?;
        eph.az_km_s2 = r.read_scaled_signed_magnitude(5, 2.0_f64.powi(-30))?;

        eph.p3 = r.read_bool()?;
        eph.gamma_n = r.read_scaled_signed_magnitude(11, 2.0_f64.powi(-40))?;
        eph.p = r.read_u8(2)?;
        eph.ln3 = r.read_bool()?;
        eph.tau_n = r.read_scaled_signed_magnitude(22, 2.0_f64.powi(-30))?;
        eph.delta_tau_n = r.read_scaled_signed_magnitude(5, 2.0_f64.powi(-30))?;
        eph.age = r.read_u8(5)?;

        eph.p4 = r.read_bool()?;
        eph.ft = r.read_u8(4)?;
        eph.nt = r.read_u16(11)?;
        eph.m = r.read_u8(2)?;
        eph.additional_data = r.read_bool()?;
        eph.na = r.read_u16(11)?;
        eph.tau_c = r.read_scaled_signed_magnitude(32, 2.0_f64.powi(-31))?;
        eph.n4 = r.read_u8(5)?;
        eph.tau_gps = r.read_scaled_signed_magnitude(22, 2.0_f64.powi(-30))?;
        eph.ln5 = r.read_bool()?;
        r.skip(7)?;

        Ok(eph)
    }

    /// Encodes [Self] as a complete 1020 frame.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut w = BitWriter::new();
        w.write_unsigned(12, 1020)?;
        w.write_unsigned(6, self.sv.prn as u64)?;

        let channel = self.frequency_channel as i16 + 7;
        if !(0..32).contains(&channel) {
            return Err(Error::FieldOutOfRange(5));
        }
        w.write_unsigned(5, channel as u64)?;
        w.write_bool(self.almanac_health)?;
        w.write_bool(self.almanac_health_available)?;
        w.write_unsigned(2, self.p1 as u64)?;

        let tk = (self.tk_s / 30.0).round() as u64;
        w.write_unsigned(5, tk / 120)?;
        w.write_unsigned(6, (tk % 120) / 2)?;
        w.write_unsigned(1, tk % 2)?;

        w.write_unsigned(1, (self.health & 0x01) as u64)?;
        w.write_bool(self.p2)?;
        w.write_scaled_unsigned(7, self.tb_s, 900.0)?;

        w.write_scaled_signed_magnitude(24, self.vx_km_s, 2.0_f64.powi(-20))?;
        w.write_scaled_signed_magnitude(27, self.x_km, 2.0_f64.powi(-11))?;
        w.write_scaled_signed_magnitude(5, self.ax_km_s2, 2.0_f64.powi(-30))?;
        w.write_scaled_signed_magnitude(24, self.vy_km_s, 2.0_f64.powi(-20))?;
        w.write_scaled_signed_magnitude(27, self.y_km, 2.0_f64.powi(-11))?;
        w.write_scaled_signed_magnitude(5, self.ay_km_s2, 2.0_f64.powi(-30))?;
        w.write_scaled_signed_magnitude(24, self.vz_km_s, 2.0_f64.powi(-20))?;
        w.write_scaled_signed_magnitude(27, self.z_km, 2.0_f64.powi(-11))?;
        w.write_scaled_signed_magnitude(5, self.az_km_s2, 2.0_f64.powi(-30))?;

        w.write_bool(self.p3)?;
        w.write_scaled_signed_magnitude(11, self.gamma_n, 2.0_f64.powi(-40))?;
        w.write_unsigned(2, self.p as u64)?;
        w.write_bool(self.ln3)?;
        w.write_scaled_signed_magnitude(22, self.tau_n, 2.0_f64.powi(-30))?;
        w.write_scaled_signed_magnitude(5, self.delta_tau_n, 2.0_f64.powi(-30))?;
        w.write_unsigned(5, self.age as u64)?;

        w.write_bool(self.p4)?;
        w.write_unsigned(4, self.ft as u64)?;
        w.write_unsigned(11, self.nt as u64)?;
        w.write_unsigned(2, self.m as u64)?;
        w.write_bool(self.additional_data)?;
        w.write_unsigned(11, self.na as u64)?;
        w.write_scaled_signed_magnitude(32, self.tau_c, 2.0_f64.powi(-31))?;
        w.write_unsigned(5, self.n4 as u64)?;
        w.write_scaled_signed_magnitude(22, self.tau_gps, 2.0_f64.powi(-30))?;
        w.write_bool(self.ln5)?;
        w.write_unsigned(7, 0)?;

        Frame::wrap(&w.into_bytes())
    }
}
