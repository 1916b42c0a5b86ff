//! User Range Accuracy (URA) and Signal In Space Accuracy (SISA) tables

/// Upper bounds of the URA classes [m]
const URA_BOUNDS: [f64; 15] = [
    2.40, 3.40, 4.85, 6.85, 9.65, 13.65, 24.0, 48.0, 96.0, 192.0, 384.0, 768.0, 1536.0, 3072.0,
    6144.0,
];

/// [URA] converts between broadcast accuracy indices and accuracies in meters.
pub struct URA;

impl URA {
    /// Value we use for Galileo "No Accuracy Prediction Available"
    pub const NAPA: f64 = -1.0;

    /// Nominal accuracy [m] of GPS, QZSS, BeiDou and SBAS URA index (4 bits).
    pub fn from_index(index: u8) -> f64 {
        match index {
            0..=6 => (10.0 * 2.0_f64.powf(1.0 + index as f64 / 2.0)).ceil() / 10.0,
            7..=14 => 2.0_f64.powi(index as i32 - 2),
            _ => 8192.0,
        }
    }

    /// URA index (4 bits) of given accuracy [m].
    pub fn to_index(accuracy_m: f64) -> u8 {
        URA_BOUNDS
            .iter()
            .position(|bound| accuracy_m <= *bound)
            .unwrap_or(15) as u8
    }

    /// Galileo SISA [m] of given index (8 bits).
    /// Spare and NAPA indices return [URA::NAPA].
    pub fn from_sisa_index(index: u8) -> f64 {
        let i = index as f64;
        match index {
            0..=49 => i / 100.0,
            50..=74 => 0.5 + (i - 50.0) * 0.02,
            75..=99 => 1.0 + (i - 75.0) * 0.04,
            100..=125 => 2.0 + (i - 100.0) * 0.16,
            _ => Self::NAPA,
        }
    }

    /// Galileo SISA index (8 bits) of given accuracy [m].
    pub fn to_sisa_index(sisa_m: f64) -> u8 {
        if sisa_m < 0.0 || !sisa_m.is_finite() {
            255
        } else if sisa_m < 0.5 {
            (sisa_m * 100.0).round() as u8
        } else if sisa_m < 1.0 {
            50 + ((sisa_m - 0.5) / 0.02).round() as u8
        } else if sisa_m < 2.0 {
            75 + ((sisa_m - 1.0) / 0.04).round() as u8
        } else if sisa_m <= 6.0 {
            100 + ((sisa_m - 2.0) / 0.16).round() as u8
        } else {
            255
        }
    }
}
