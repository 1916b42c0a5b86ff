//! GLONASS state vector integration
use hifitime::Epoch;
use nalgebra::{SVector, Vector3};

use crate::{
    constants::{Constants, Omega, GM, PZ90},
    message::ephemeris::GlonassEphemeris,
    Error,
};

/// Position and velocity [m, m/s]
type State = SVector<f64, 6>;

/// Equations of motion in PZ-90, with constant luni-solar acceleration `acc`.
fn derivative(state: &State, acc: &Vector3<f64>) -> State {
    let (x, y, z) = (state[0], state[1], state[2]);
    let (vx, vy, vz) = (state[3], state[4], state[5]);

    let rho = (x * x + y * y + z * z).sqrt();
    let t1 = -GM::GLO / rho.powi(3);
    let t2 = 1.5 * PZ90::C20 * GM::GLO * PZ90::AE.powi(2) / rho.powi(5);
    let t3 = Omega::GLO.powi(2);
    let t4 = 2.0 * Omega::GLO;
    let z2 = 5.0 * z * z / rho.powi(2);

    State::from_column_slice(&[
        vx,
        vy,
        vz,
        (t1 + t2 * (1.0 - z2) + t3) * x + t4 * vy + acc[0],
        (t1 + t2 * (1.0 - z2) + t3) * y - t4 * vx + acc[1],
        (t1 + t2 * (3.0 - z2)) * z + acc[2],
    ])
}

/// Classical 4th order Runge Kutta step
fn rk4_step(state: &State, acc: &Vector3<f64>, h: f64) -> State {
    let k1 = derivative(state, acc);
    let k2 = derivative(&(state + k1 * (h / 2.0)), acc);
    let k3 = derivative(&(state + k2 * (h / 2.0)), acc);
    let k4 = derivative(&(state + k3 * h), acc);
    state + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

impl GlonassEphemeris {
    /// Broadcast state vector, converted to meters
    fn state(&self) -> State {
        State::from_column_slice(&[
            self.x_km * 1.0E3,
            self.y_km * 1.0E3,
            self.z_km * 1.0E3,
            self.vx_km_s * 1.0E3,
            self.vy_km_s * 1.0E3,
            self.vz_km_s * 1.0E3,
        ])
    }

    /// Integrates the broadcast state vector up to `t`, returning
    /// (position [m], velocity [m/s]). The time span is divided into
    /// equal steps of at most 10s, so the last one lands exactly on `t`.
    pub(crate) fn integrate(&self, t: Epoch) -> Result<(Vector3<f64>, Vector3<f64>), Error> {
        let dt = (t - self.toe).to_seconds();
        if dt.abs() > Constants::DAY_S {
            return Err(Error::PropagationSpan);
        }

        let acc = Vector3::new(self.ax_km_s2, self.ay_km_s2, self.az_km_s2) * 1.0E3;

        let nsteps = (dt.abs() / Constants::GLO_INTEGRATION_STEP_S).floor() as usize + 1;
        let h = dt / nsteps as f64;

        let mut state = self.state();
        for _ in 0..nsteps {
            state = rk4_step(&state, &acc, h);
        }

        Ok((
            Vector3::new(state[0], state[1], state[2]),
            Vector3::new(state[3], state[4], state[5]),
        ))
    }

    /// Clock offset at `t` [s]
    pub(crate) fn clock_bias(&self, t: Epoch) -> f64 {
        let dt = (t - self.toe).to_seconds();
        -self.tau_n + self.gamma_n * dt
    }
}
