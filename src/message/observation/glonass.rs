//! GLONASS observations (1009-1012)
use gnss::prelude::{Constellation, SV};

#[cfg(feature = "log")]
use log::debug;

use crate::{
    bits::BitReader,
    constants::Constants,
    message::observation::{decode_signals, Layout, LockLoss, SatelliteObservation, SignalCode},
    Error,
};

/// Frequency channel is transmitted with a +7 offset
const CHANNEL_OFFSET: i8 = 7;

/// Highest valid (offset) frequency channel
const MAX_CHANNEL: u8 = 20;

pub(crate) fn layout(dual: bool, extended: bool) -> Layout {
    Layout {
        pr_width: 25,
        amb_width: 7,
        ambiguity_m: Constants::GLO_PR_AMBIGUITY,
        dual,
        extended,
    }
}

pub(crate) fn decode_satellite(
    r: &mut BitReader,
    layout: &Layout,
) -> Result<Option<SatelliteObservation>, Error> {
    let slot = r.read_u8(6)?;
    let code = SignalCode::from_l1_bits(r.read_u8(1)?);
    let channel = r.read_u8(5)?;
    let mut signals = decode_signals(r, layout, code)?;

    if slot == 0 || slot > 24 {
        #[cfg(feature = "log")]
        debug!("glonass observations: dropping invalid slot #{}", slot);
        return Ok(None);
    }

    // unknown channel: phase cycles resolved later on, from ephemeris
    let frequency_channel = (channel <= MAX_CHANNEL).then(|| channel as i8 - CHANNEL_OFFSET);

    for obs in signals.iter_mut() {
        obs.resolve_cycles(obs.signal.wavelength(Constellation::Glonass, frequency_channel));
    }

    Ok(Some(SatelliteObservation {
        sv: SV::new(Constellation::Glonass, slot),
        frequency_channel,
        lock_loss: LockLoss::empty(),
        signals,
    }))
}
