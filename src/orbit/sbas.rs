//! SBAS state vector propagation
use hifitime::Epoch;
use nalgebra::Vector3;

use crate::message::ephemeris::SBASEphemeris;

impl SBASEphemeris {
    /// Second order propagation of the broadcast state vector,
    /// returning (position [m], velocity [m/s]).
    pub(crate) fn propagate(&self, t: Epoch) -> (Vector3<f64>, Vector3<f64>) {
        let dt = (t - self.t0).to_seconds();
        let pos = Vector3::new(self.x_m, self.y_m, self.z_m);
        let vel = Vector3::new(self.vx_m_s, self.vy_m_s, self.vz_m_s);
        let acc = Vector3::new(self.ax_m_s2, self.ay_m_s2, self.az_m_s2);
        (pos + vel * dt + acc * dt * dt / 2.0, vel + acc * dt)
    }

    /// Clock offset at `t` [s]
    pub(crate) fn clock_bias(&self, t: Epoch) -> f64 {
        let dt = (t - self.t0).to_seconds();
        self.agf0 + self.agf1 * dt
    }
}
