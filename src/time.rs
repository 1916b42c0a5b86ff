//! Time references and GNSS time helpers
use hifitime::{Duration, Epoch, TimeScale};

use crate::constants::Constants;

/// [TimeReference] gives a coarse notion of "now", used to resolve
/// the ambiguous wire times: truncated week numbers and day relative
/// GLONASS / SBAS times. It only needs to be correct within a few days.
pub trait TimeReference {
    /// Returns current [Epoch], if known.
    fn now(&self) -> Option<Epoch>;
}

/// [SystemClock] uses the host clock.
/// This is what you want when decoding a live stream.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SystemClock;

impl TimeReference for SystemClock {
    fn now(&self) -> Option<Epoch> {
        let now = Epoch::now().ok()?;
        Some(now.to_time_scale(TimeScale::GPST))
    }
}

/// [FixedReference] is a user defined reference,
/// typically used when replaying archived streams.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedReference(pub Epoch);

impl TimeReference for FixedReference {
    fn now(&self) -> Option<Epoch> {
        Some(self.0)
    }
}

/// Builds an [Epoch] from (week, seconds of week) in given [TimeScale].
pub(crate) fn from_week_seconds(week: u32, seconds: f64, ts: TimeScale) -> Epoch {
    let nanos = (seconds * 1.0E9).round().max(0.0) as u64;
    Epoch::from_time_of_week(week, nanos, ts)
}

/// Decomposes an [Epoch] into (week, seconds of week) in given [TimeScale].
pub(crate) fn week_seconds(t: Epoch, ts: TimeScale) -> (u32, f64) {
    let (week, nanos) = t.to_time_scale(ts).to_time_of_week();
    (week, nanos as f64 * 1.0E-9)
}

/// Resolves a truncated week counter (`modulo` = 1024 for GPS,
/// 4096 for Galileo, 8192 for BeiDou) to the full week closest to `reference_week`.
pub(crate) fn resolve_week(truncated: u32, modulo: u32, reference_week: u32) -> u32 {
    let modulo = modulo as i64;
    let reference = reference_week as i64;
    let base = reference - reference.rem_euclid(modulo) + (truncated as i64 % modulo);

    let best = [base - modulo, base, base + modulo]
        .into_iter()
        .filter(|w| *w >= 0)
        .min_by_key(|w| (w - reference).abs())
        .unwrap_or(base);

    best as u32
}

/// Converts a GPS time of week into a GPST [Epoch], week closest to reference.
pub(crate) fn gpst_from_time_of_week(tow_s: f64, reference: Epoch) -> Epoch {
    let (week, ref_tow_s) = week_seconds(reference, TimeScale::GPST);
    let dt = tow_s - ref_tow_s;
    let week = if dt > Constants::HALF_WEEK_S {
        week.saturating_sub(1)
    } else if dt < -Constants::HALF_WEEK_S {
        week + 1
    } else {
        week
    };
    from_week_seconds(week, tow_s, TimeScale::GPST)
}

/// Seconds elapsed since the start of the day containing `t`, in UTC,
/// shifted by `offset_s`.
fn utc_time_of_day(t: Epoch, offset_s: f64) -> f64 {
    let shifted = t + Duration::from_seconds(offset_s);
    let (_, _, _, h, m, s, ns) = shifted.to_gregorian_utc();
    h as f64 * 3600.0 + m as f64 * 60.0 + s as f64 + ns as f64 * 1.0E-9
}

/// Seconds elapsed since the start of the GPS day containing `t`.
fn gpst_time_of_day(t: Epoch) -> f64 {
    let (_, sow) = week_seconds(t, TimeScale::GPST);
    sow.rem_euclid(Constants::DAY_S)
}

/// Picks the day crossing that brings `tod_s` closest to `reference_tod_s`.
fn day_offset(tod_s: f64, reference_tod_s: f64) -> f64 {
    let mut dt = tod_s - reference_tod_s;
    if dt < -Constants::DAY_S / 2.0 {
        dt += Constants::DAY_S;
    } else if dt > Constants::DAY_S / 2.0 {
        dt -= Constants::DAY_S;
    }
    dt
}

/// Converts a GLONASS time of day (Moscow time, UTC+3h) into a GPST [Epoch],
/// using the reference to pick the day. Handles the day crossing in both directions
/// (time of day just after midnight while the reference is just before, and conversely).
pub(crate) fn glonass_to_gpst(moscow_tod_s: f64, reference: Epoch) -> Epoch {
    let reference_tod = utc_time_of_day(reference, 3.0 * 3600.0);
    let dt = day_offset(moscow_tod_s, reference_tod);
    (reference + Duration::from_seconds(dt)).to_time_scale(TimeScale::GPST)
}

/// Moscow time of day of given [Epoch]
pub(crate) fn moscow_time_of_day(t: Epoch) -> f64 {
    utc_time_of_day(t, 3.0 * 3600.0)
}

/// Converts a GPS aligned time of day into a GPST [Epoch], day closest to reference.
pub(crate) fn gpst_from_time_of_day(tod_s: f64, reference: Epoch) -> Epoch {
    let reference_tod = gpst_time_of_day(reference);
    let dt = day_offset(tod_s, reference_tod);
    (reference + Duration::from_seconds(dt)).to_time_scale(TimeScale::GPST)
}

/// Time of day of a GPST [Epoch]
pub(crate) fn time_of_day(t: Epoch) -> f64 {
    gpst_time_of_day(t)
}
