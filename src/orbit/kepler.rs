#[cfg(feature = "log")]
use log::error;

use gnss::prelude::SV;
use hifitime::Epoch;

use nalgebra::{Matrix3, Rotation3, SMatrix, Vector3, Vector4};

use crate::{
    constants::{Constants, Omega},
    Error,
};

/// [Kepler] stores all keplerian parameters
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Kepler {
    /// semi major axis (m)
    pub a: f64,
    /// Eccentricity (n.a)
    pub e: f64,
    /// Inclination angle at reference time (rad)
    pub i_0: f64,
    /// Longitude of ascending node at weekly epoch (rad)
    pub omega_0: f64,
    /// Mean anomaly at reference time (rad)
    pub m_0: f64,
    /// argument of perigee (rad)
    pub omega: f64,
    /// Time of ephemeris, in the satellite timescale
    pub toe: Epoch,
    /// Time of ephemeris, in seconds of week
    pub toe_s: f64,
}

/// Orbit [Perturbations]
#[derive(Default, Clone, Debug, PartialEq)]
pub(crate) struct Perturbations {
    /// Mean motion difference from computed value [rad.s-1]
    pub dn: f64,
    /// Inclination rate of change [rad.s-1]
    pub i_dot: f64,
    /// Right ascension rate of change [rad.s^-1]
    pub omega_dot: f64,
    /// Amplitude of sine harmonic correction term of the argument
    /// of latitude [rad]
    pub cus: f64,
    /// Amplitude of cosine harmonic correction term of the argument
    /// of latitude [rad]
    pub cuc: f64,
    /// Amplitude of sine harmonic correction term of the angle of inclination [rad]
    pub cis: f64,
    /// Amplitude of cosine harmonic correction term of the angle of inclination [rad]
    pub cic: f64,
    /// Amplitude of sine harmonic correction term of the orbit radius [m]
    pub crs: f64,
    /// Amplitude of cosine harmonic correction term of the orbit radius [m]
    pub crc: f64,
}

/// Reduces a time difference to [-302400, 302400] s (week crossover)
pub(crate) fn week_crossover(dt: f64) -> f64 {
    if dt > Constants::HALF_WEEK_S {
        dt - Constants::WEEK_S
    } else if dt < -Constants::HALF_WEEK_S {
        dt + Constants::WEEK_S
    } else {
        dt
    }
}

/// Solves Kepler's equation E = M + e sin(E) by fixed point iteration,
/// until the correction is below 1 mm along the orbit.
/// Returns (E, iterations).
pub(crate) fn eccentric_anomaly(sv: SV, m_k: f64, e: f64, a: f64) -> (f64, u8) {
    let mut e_k = m_k;
    let mut iter = 0;

    loop {
        let e_k_lst = e_k;
        e_k = m_k + e * e_k_lst.sin();
        iter += 1;

        if (e_k - e_k_lst).abs() * a <= Constants::KEPLER_TOLERANCE_M {
            break;
        }

        if iter >= Constants::MAX_KEPLER_ITER {
            #[cfg(feature = "log")]
            error!("{} kepler iteration overflow", sv);
            let _ = sv;
            break;
        }
    }

    (e_k, iter)
}

/// [Helper] helps calculate satellite orbital state from Keplerian elements.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Helper {
    /// Satellite
    pub sv: SV,
    /// BeiDou GEO satellite
    pub geo: bool,
    /// The difference between the calculated time and the ephemeris reference time
    pub t_k: f64,
    /// Eccentric anomaly
    pub e_k: f64,
    /// Kepler solver iterations
    pub iterations: u8,
    /// Ascending angle(corrected)
    pub u_k: f64,
    /// Radius(corrected)
    pub r_k: f64,
    /// Orbital inclination(corrected)
    pub i_k: f64,
    /// Ascending node right ascension
    pub omega_k: f64,
    /// First Derivative of Ascending angle(corrected)
    pub fd_u_k: f64,
    /// First Derivative of Radius(corrected)
    pub fd_r_k: f64,
    /// First Derivative of Orbital inclination(corrected)
    pub fd_i_k: f64,
    /// First Derivative of Ascending node right ascension
    pub fd_omega_k: f64,
    /// Position in the orbital plane [m]
    pub r_sv: (f64, f64),
}

impl Helper {
    /// Forms a [Helper] at instant `t`.
    pub fn new(
        sv: SV,
        geo: bool,
        kepler: &Kepler,
        perturbations: &Perturbations,
        t: Epoch,
    ) -> Result<Self, Error> {
        if kepler.a <= 0.0 {
            return Err(Error::DegenerateOrbit);
        }

        let gm_m3_s2 = Constants::gm(sv);
        let omega = Constants::omega(sv);

        let ts = kepler.toe.time_scale;
        let t_k = week_crossover((t.to_time_scale(ts) - kepler.toe).to_seconds());

        let n0 = (gm_m3_s2 / kepler.a.powi(3)).sqrt(); // average angular velocity
        let n = n0 + perturbations.dn; // corrected mean angular velocity
        let m_k = kepler.m_0 + n * t_k; // average anomaly

        let (e_k, iterations) = eccentric_anomaly(sv, m_k, kepler.e, kepler.a);

        // true anomaly
        let (sin_e_k, cos_e_k) = e_k.sin_cos();
        let v_k = ((1.0 - kepler.e.powi(2)).sqrt() * sin_e_k).atan2(cos_e_k - kepler.e);

        let phi_k = v_k + kepler.omega; // latitude argument
        let (x2_sin_phi_k, x2_cos_phi_k) = (2.0 * phi_k).sin_cos();

        // latitude argument correction
        let du_k = perturbations.cus * x2_sin_phi_k + perturbations.cuc * x2_cos_phi_k;
        let u_k = phi_k + du_k;

        // orbital radius correction
        let dr_k = perturbations.crs * x2_sin_phi_k + perturbations.crc * x2_cos_phi_k;
        let r_k = kepler.a * (1.0 - kepler.e * cos_e_k) + dr_k;

        // inclination angle correction
        let di_k = perturbations.cis * x2_sin_phi_k + perturbations.cic * x2_cos_phi_k;

        // first derivatives
        let fd_omega_k = if geo {
            perturbations.omega_dot
        } else {
            perturbations.omega_dot - omega
        };

        let fd_e_k = n / (1.0 - kepler.e * cos_e_k);
        let fd_phi_k = ((1.0 + kepler.e) / (1.0 - kepler.e)).sqrt()
            * ((v_k / 2.0).cos() / (e_k / 2.0).cos()).powi(2)
            * fd_e_k;

        let fd_u_k =
            (perturbations.cus * x2_cos_phi_k - perturbations.cuc * x2_sin_phi_k) * fd_phi_k * 2.0
                + fd_phi_k;

        let fd_r_k = kepler.a * kepler.e * sin_e_k * fd_e_k
            + 2.0
                * (perturbations.crs * x2_cos_phi_k - perturbations.crc * x2_sin_phi_k)
                * fd_phi_k;

        let fd_i_k = perturbations.i_dot
            + 2.0
                * (perturbations.cis * x2_cos_phi_k - perturbations.cic * x2_sin_phi_k)
                * fd_phi_k;

        // ascending node longitude
        let omega_k = if geo {
            // BeiDou GEO: user defined inertial frame
            kepler.omega_0 + perturbations.omega_dot * t_k - omega * kepler.toe_s
        } else {
            // GPS, QZSS, Galileo, BeiDou [MEO/IGSO]
            kepler.omega_0 + (perturbations.omega_dot - omega) * t_k - omega * kepler.toe_s
        };

        // corrected inclination angle
        let i_k = kepler.i_0 + di_k + perturbations.i_dot * t_k;

        // position in orbital plane
        let r_sv = (r_k * u_k.cos(), r_k * u_k.sin());

        Ok(Self {
            sv,
            geo,
            t_k,
            e_k,
            iterations,
            u_k,
            r_k,
            i_k,
            omega_k,
            fd_u_k,
            fd_r_k,
            fd_i_k,
            fd_omega_k,
            r_sv,
        })
    }

    /// Returns orbital plane to ECEF [Rotation3] matrix
    fn meo_orbit_to_ecef_rotation_matrix(&self) -> Rotation3<f64> {
        // Positive angles mean counterclockwise rotation
        let rotation_x = Rotation3::from_axis_angle(&Vector3::x_axis(), self.i_k);
        let rotation_z = Rotation3::from_axis_angle(&Vector3::z_axis(), self.omega_k);
        rotation_z * rotation_x
    }

    /// Returns GEO inertial frame to BDCS [Rotation3] matrix
    fn geo_orbit_to_ecef_rotation_matrix(&self) -> Rotation3<f64> {
        let rotation_x = Rotation3::from_axis_angle(&Vector3::x_axis(), 5.0_f64.to_radians());
        let rotation_z = Rotation3::from_axis_angle(&Vector3::z_axis(), -Omega::BDS * self.t_k);
        rotation_z * rotation_x
    }

    /// Returns ẋ and ẏ temporal derivative, in the orbital plane
    fn orbit_velocity(&self) -> (f64, f64) {
        let (sin_u_k, cos_u_k) = self.u_k.sin_cos();
        let fd_x = self.fd_r_k * cos_u_k - self.r_k * self.fd_u_k * sin_u_k;
        let fd_y = self.fd_r_k * sin_u_k + self.r_k * self.fd_u_k * cos_u_k;
        (fd_x, fd_y)
    }

    /// Position after orbital plane rotation only
    fn rotated_position(&self) -> Vector3<f64> {
        let (x, y) = self.r_sv;
        self.meo_orbit_to_ecef_rotation_matrix() * Vector3::new(x, y, 0.0)
    }

    /// Velocity after orbital plane rotation only
    fn rotated_velocity(&self) -> Vector3<f64> {
        let (x, y) = self.r_sv;
        let (sin_omega_k, cos_omega_k) = self.omega_k.sin_cos();
        let (sin_i_k, cos_i_k) = self.i_k.sin_cos();
        let (fd_x, fd_y) = self.orbit_velocity();

        // First Derivative of rotation Matrix
        let mut fd_r = SMatrix::<f64, 3, 4>::zeros();
        fd_r[(0, 0)] = cos_omega_k;
        fd_r[(0, 1)] = -sin_omega_k * cos_i_k;
        fd_r[(0, 2)] = -(x * sin_omega_k + y * cos_omega_k * cos_i_k);
        fd_r[(0, 3)] = y * sin_omega_k * sin_i_k;
        fd_r[(1, 0)] = sin_omega_k;
        fd_r[(1, 1)] = cos_omega_k * cos_i_k;
        fd_r[(1, 2)] = x * cos_omega_k - y * sin_omega_k * cos_i_k;
        fd_r[(1, 3)] = -y * cos_omega_k * sin_i_k;
        fd_r[(2, 1)] = sin_i_k;
        fd_r[(2, 3)] = y * cos_i_k;

        let rhs = Vector4::new(fd_x, fd_y, self.fd_omega_k, self.fd_i_k);
        fd_r * rhs
    }

    /// Calculate ECEF position [m].
    pub fn ecef_position(&self) -> Vector3<f64> {
        if self.geo {
            self.beidou_geo_ecef_position()
        } else {
            self.rotated_position()
        }
    }

    /// Returns ECEF velocity [Vector3] in m/s.
    pub fn ecef_velocity(&self) -> Vector3<f64> {
        if self.geo {
            self.beidou_geo_ecef_velocity()
        } else {
            self.rotated_velocity()
        }
    }

    /// Returns ECEF position [Vector3] in m, for BeiDou GEO specifically
    fn beidou_geo_ecef_position(&self) -> Vector3<f64> {
        self.geo_orbit_to_ecef_rotation_matrix() * self.rotated_position()
    }

    /// Returns ECEF velocity [Vector3] in m/s, for BeiDou GEO specifically
    fn beidou_geo_ecef_velocity(&self) -> Vector3<f64> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), 5.0_f64.to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), -Omega::BDS * self.t_k);

        // d(Rz(-omega t))/dt
        let (sin_omega_tk, cos_omega_tk) = (-Omega::BDS * self.t_k).sin_cos();
        let fd_rz = -Omega::BDS
            * Matrix3::new(
                -sin_omega_tk,
                -cos_omega_tk,
                0.0,
                cos_omega_tk,
                -sin_omega_tk,
                0.0,
                0.0,
                0.0,
                0.0,
            );

        let pos = self.rotated_position();
        let vel = self.rotated_velocity();
        fd_rz * (rx * pos) + rz * (rx * vel)
    }

    /// Relativistic clock correction [s]: -2 (r.v) / c²
    pub fn relativistic_correction(&self) -> f64 {
        let r = self.ecef_position();
        let v = self.ecef_velocity();
        -2.0 * r.dot(&v) / Constants::SPEED_OF_LIGHT.powi(2)
    }
}
