//! const values of RTCM3 and GNSS
use gnss::prelude::{Constellation, SV};

pub(crate) struct GM;

impl GM {
    pub const GPS: f64 = 3.9860050E14;
    pub const BDS: f64 = 3.986004418E14;
    pub const GLO: f64 = 3.9860044E14;
    pub const GAL: f64 = 3.986004418E14;
}

pub(crate) struct Omega;

impl Omega {
    pub const GPS: f64 = 7.2921151467E-5;
    pub const BDS: f64 = 7.292115E-5;
    pub const GLO: f64 = 7.292115E-5;
    pub const GAL: f64 = 7.2921151467E-5;
}

/// - 2 * sqrt(gm) / c / c
pub(crate) struct DtrF;

impl DtrF {
    pub const GPS: f64 = -0.000000000444280763339306;
    pub const BDS: f64 = -0.00000000044428073090439775;
    pub const GAL: f64 = -0.00000000044428073090439775;
}

/// PZ-90 earth model, used by the GLONASS integrator
pub(crate) struct PZ90;

impl PZ90 {
    /// Equatorial radius [m]
    pub const AE: f64 = 6378136.0;
    /// Second zonal harmonic
    pub const C20: f64 = -1082.6257E-6;
}

pub(crate) struct Constants;

impl Constants {
    /// RTCM3 preamble
    pub const SYNC: u8 = 0xD3;

    /// CRC24Q generator polynomial
    pub const CRC24Q_POLY: u32 = 0x186_4CFB;

    /// Largest payload a 10 bit length field may describe
    pub const MAX_PAYLOAD_SIZE: usize = 1023;

    /// Speed of light [m/s]
    pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

    /// GPS L1 carrier frequency [Hz]
    pub const GPS_L1_FREQ: f64 = 1575.42E6;

    /// GPS L2 carrier frequency [Hz]
    pub const GPS_L2_FREQ: f64 = 1227.60E6;

    /// GLONASS L1 FDMA base frequency and channel spacing [Hz]
    pub const GLO_L1_FREQ: f64 = 1602.0E6;
    pub const GLO_L1_STEP: f64 = 562.5E3;

    /// GLONASS L2 FDMA base frequency and channel spacing [Hz]
    pub const GLO_L2_FREQ: f64 = 1246.0E6;
    pub const GLO_L2_STEP: f64 = 437.5E3;

    /// GPS pseudo range ambiguity: one light millisecond [m]
    pub const GPS_PR_AMBIGUITY: f64 = 299_792.458;

    /// GLONASS pseudo range ambiguity: two light milliseconds [m]
    pub const GLO_PR_AMBIGUITY: f64 = 599_584.916;

    /// Maximal iteration in the iterative Kepler solver
    pub const MAX_KEPLER_ITER: u8 = 30;

    /// Kepler solver convergence, expressed in meters along the orbit
    pub const KEPLER_TOLERANCE_M: f64 = 0.001;

    /// Seconds in half a week
    pub const HALF_WEEK_S: f64 = 302_400.0;

    /// Seconds in one day
    pub const DAY_S: f64 = 86_400.0;

    /// Seconds in one week
    pub const WEEK_S: f64 = 604_800.0;

    /// GLONASS integration nominal step [s]
    pub const GLO_INTEGRATION_STEP_S: f64 = 10.0;

    /// Earth gravitation.
    pub const fn gm(sv: SV) -> f64 {
        match sv.constellation {
            Constellation::BeiDou => GM::BDS,
            Constellation::Galileo => GM::GAL,
            Constellation::Glonass => GM::GLO,
            _ => GM::GPS,
        }
    }

    /// Earth rotation rate
    pub const fn omega(sv: SV) -> f64 {
        match sv.constellation {
            Constellation::BeiDou => Omega::BDS,
            Constellation::Galileo => Omega::GAL,
            Constellation::Glonass => Omega::GLO,
            _ => Omega::GPS,
        }
    }

    /// Auxiliary Quantities for Calculating Relativistic Effects in Clock Correction
    pub const fn dtr_f(sv: SV) -> f64 {
        match sv.constellation {
            Constellation::BeiDou => DtrF::BDS,
            Constellation::Galileo => DtrF::GAL,
            _ => DtrF::GPS,
        }
    }
}
