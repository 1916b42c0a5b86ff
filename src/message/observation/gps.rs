//! GPS observations (1001-1004)
use gnss::prelude::{Constellation, SV};

#[cfg(feature = "log")]
use log::debug;

use crate::{
    bits::BitReader,
    constants::Constants,
    message::observation::{decode_signals, Layout, LockLoss, SatelliteObservation, SignalCode},
    Error,
};

/// Satellite IDs 40..=63 describe SBAS satellites (S120 and beyond)
const SBAS_FIRST_ID: u8 = 40;

pub(crate) fn layout(dual: bool, extended: bool) -> Layout {
    Layout {
        pr_width: 24,
        amb_width: 8,
        ambiguity_m: Constants::GPS_PR_AMBIGUITY,
        dual,
        extended,
    }
}

/// Maps the 6 bit satellite ID
fn satellite(id: u8) -> Option<SV> {
    match id {
        1..=32 => Some(SV::new(Constellation::GPS, id)),
        SBAS_FIRST_ID..=63 => Some(SV::new(Constellation::SBAS, id - 20)),
        _ => None,
    }
}

pub(crate) fn decode_satellite(
    r: &mut BitReader,
    layout: &Layout,
) -> Result<Option<SatelliteObservation>, Error> {
    let id = r.read_u8(6)?;
    let code = SignalCode::from_l1_bits(r.read_u8(1)?);
    let mut signals = decode_signals(r, layout, code)?;

    let Some(sv) = satellite(id) else {
        #[cfg(feature = "log")]
        debug!("gps observations: dropping invalid satellite #{}", id);
        return Ok(None);
    };

    for obs in signals.iter_mut() {
        obs.resolve_cycles(obs.signal.wavelength(Constellation::GPS, None));
    }

    Ok(Some(SatelliteObservation {
        sv,
        frequency_channel: None,
        lock_loss: LockLoss::empty(),
        signals,
    }))
}
