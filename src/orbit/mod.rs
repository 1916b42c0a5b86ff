//! Broadcast orbits: satellite position, velocity and clock calculations
use gnss::prelude::SV;
use hifitime::Epoch;
use nalgebra::Vector3;

#[cfg(feature = "log")]
use log::warn;

use crate::{message::ephemeris::BroadcastEphemeris, Error};

mod glonass;
mod kepler;
mod sbas;

pub(crate) use kepler::{Kepler, Perturbations};

use kepler::{week_crossover, Helper};

/// [SatelliteState] is the result of an orbit calculation, valid
/// for one satellite and one instant only.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteState {
    /// Satellite
    pub sv: SV,
    /// Instant of calculation
    pub epoch: Epoch,
    /// ECEF position [m], in the constellation reference frame
    pub position_m: Vector3<f64>,
    /// ECEF velocity [m/s]
    pub velocity_m_s: Vector3<f64>,
    /// Clock offset [s], relativistic effect included
    /// for Keplerian orbits.
    pub clock_bias_s: f64,
}

impl SatelliteState {
    /// Distance from the Earth center [m]
    pub fn radius_m(&self) -> f64 {
        self.position_m.norm()
    }

    /// Clock offset expressed in meters
    pub fn clock_bias_m(&self) -> f64 {
        self.clock_bias_s * crate::constants::Constants::SPEED_OF_LIGHT
    }
}

/// Clock polynomial evaluated `dt` seconds after time of clock
fn clock_polynomial(a0: f64, a1: f64, a2: f64, dt: f64) -> f64 {
    a0 + a1 * dt + a2 * dt * dt
}

impl BroadcastEphemeris {
    /// Calculates the [SatelliteState] at instant `t`.
    /// Using an ephemeris outside its validity period is not an error,
    /// but it is reported. GLONASS integration is limited to 24 hours
    /// around the time of ephemeris.
    pub fn satellite_state(&self, t: Epoch) -> Result<SatelliteState, Error> {
        let sv = self.sv();

        if !self.is_valid(t) {
            #[cfg(feature = "log")]
            warn!(
                "{}({}): propagating ephemeris outside validity (toe={})",
                t,
                sv,
                self.toe()
            );
        }

        let (position_m, velocity_m_s, clock_bias_s) = match self {
            Self::GPS(eph) => {
                let helper = Helper::new(sv, false, &eph.kepler(), &eph.perturbations(), t)?;
                let dt = week_crossover((t - eph.toc()).to_seconds());
                let clock = clock_polynomial(eph.af0, eph.af1, eph.af2, dt)
                    + helper.relativistic_correction();
                (helper.ecef_position(), helper.ecef_velocity(), clock)
            },
            Self::Galileo(eph) => {
                let helper = Helper::new(sv, false, &eph.kepler(), &eph.perturbations(), t)?;
                let dt = week_crossover((t - eph.toc()).to_seconds());
                let clock = clock_polynomial(eph.af0, eph.af1, eph.af2, dt)
                    + helper.relativistic_correction();
                (helper.ecef_position(), helper.ecef_velocity(), clock)
            },
            Self::BeiDou(eph) => {
                let helper =
                    Helper::new(sv, eph.is_geo(), &eph.kepler(), &eph.perturbations(), t)?;
                let dt = week_crossover((t - eph.toc()).to_seconds());
                let clock =
                    clock_polynomial(eph.a0, eph.a1, eph.a2, dt) + helper.relativistic_correction();
                (helper.ecef_position(), helper.ecef_velocity(), clock)
            },
            Self::Glonass(eph) => {
                let (pos, vel) = eph.integrate(t)?;
                (pos, vel, eph.clock_bias(t))
            },
            Self::SBAS(eph) => {
                let (pos, vel) = eph.propagate(t);
                (pos, vel, eph.clock_bias(t))
            },
        };

        Ok(SatelliteState {
            sv,
            epoch: t,
            position_m,
            velocity_m_s,
            clock_bias_s,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::ephemeris::{BeiDouEphemeris, GPSEphemeris, SBASEphemeris};
    use gnss::prelude::Constellation;
    use hifitime::{Duration, TimeScale};
    use std::str::FromStr;

    fn gps() -> GPSEphemeris {
        GPSEphemeris {
            sv: SV::new(Constellation::GPS, 7),
            week: 2300,
            toc_s: 352800.0,
            toe_s: 352800.0,
            af0: 1.0E-4,
            af1: 1.0E-11,
            sqrt_a: 5153.6,
            e: 0.01,
            i0: 0.96,
            omega0: -1.84,
            m0: 1.23,
            omega: -1.71,
            ..Default::default()
        }
    }

    #[test]
    fn gps_state() {
        let eph = BroadcastEphemeris::from(gps());
        let toe = eph.toe();
        let t = toe + Duration::from_seconds(7200.0);
        let state = eph.satellite_state(t).unwrap();

        assert_eq!(state.sv, eph.sv());
        assert_eq!(state.epoch, t);

        // GPS orbit radius 26560 km +/- e*a
        let a = 5153.6_f64.powi(2);
        assert!(state.radius_m() > a * 0.99 - 1.0);
        assert!(state.radius_m() < a * 1.01 + 1.0);

        // ECEF velocity of a MEO satellite is a few km/s
        let speed = state.velocity_m_s.norm();
        assert!(speed > 1.0E3 && speed < 5.0E3);

        // polynomial + relativity (a few tens of ns at most)
        let polynomial = 1.0E-4 + 1.0E-11 * 7200.0;
        assert!((state.clock_bias_s - polynomial).abs() < 50.0E-9);
        assert!((state.clock_bias_m() - state.clock_bias_s * 299_792_458.0).abs() < 1.0E-9);
    }

    #[test]
    fn recomputed_on_request() {
        let eph = BroadcastEphemeris::from(gps());
        let t = eph.toe() + Duration::from_seconds(60.0);
        assert_eq!(eph.satellite_state(t).unwrap(), eph.satellite_state(t).unwrap());
    }

    #[test]
    fn degenerate() {
        let eph = BroadcastEphemeris::from(GPSEphemeris {
            sqrt_a: 0.0,
            ..gps()
        });
        assert!(matches!(
            eph.satellite_state(eph.toe()),
            Err(Error::DegenerateOrbit)
        ));
    }

    #[test]
    fn beidou_geo_state() {
        let eph = BroadcastEphemeris::from(BeiDouEphemeris {
            sv: SV::new(Constellation::BeiDou, 1),
            week: 944,
            toe_s: 352800.0,
            toc_s: 352800.0,
            sqrt_a: 6493.5,
            e: 3.0E-4,
            i0: 0.1,
            omega0: 1.2,
            omega: 2.8,
            m0: -0.3,
            ..Default::default()
        });
        let t = Epoch::from_str("2024-02-08T02:00:00 GPST").unwrap();
        let state = eph.satellite_state(t).unwrap();

        // geostationary: about 42164 km, slow ECEF motion
        assert!((state.radius_m() - 42_164_000.0).abs() < 50_000.0);
        assert!(state.velocity_m_s.norm() < 1.0E3);
        assert_eq!(eph.toe().time_scale, TimeScale::BDT);
    }

    #[test]
    fn sbas_state() {
        let eph = BroadcastEphemeris::from(SBASEphemeris {
            sv: SV::new(Constellation::SBAS, 26),
            t0: Epoch::from_str("2024-02-07T13:20:16 GPST").unwrap(),
            x_m: 40_000_000.0,
            vx_m_s: 1.0,
            agf0: 1.0E-8,
            ..Default::default()
        });
        let t = eph.toe() + Duration::from_seconds(10.0);
        let state = eph.satellite_state(t).unwrap();
        assert!((state.position_m[0] - 40_000_010.0).abs() < 1.0E-6);
        assert_eq!(state.clock_bias_s, 1.0E-8);
    }
}
