//! Latest broadcast ephemeris, per satellite
use std::collections::BTreeMap;

use gnss::prelude::SV;
use hifitime::Epoch;

#[cfg(feature = "log")]
use log::debug;

use crate::{message::ephemeris::BroadcastEphemeris, orbit::SatelliteState, Error};

/// [EphemerisStore] holds at most one [BroadcastEphemeris] per satellite.
/// A stored ephemeris is only replaced by a newer one, ordering by
/// (time of ephemeris, issue of data).
#[derive(Debug, Clone, Default)]
pub struct EphemerisStore {
    ephemerides: BTreeMap<SV, BroadcastEphemeris>,
}

impl EphemerisStore {
    /// Creates a new empty [EphemerisStore]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of satellites described
    pub fn len(&self) -> usize {
        self.ephemerides.len()
    }

    /// True if no ephemeris has been stored yet
    pub fn is_empty(&self) -> bool {
        self.ephemerides.is_empty()
    }

    /// Stores this [BroadcastEphemeris], unless an ephemeris at least
    /// as recent is already known for this satellite.
    /// Returns true if it was stored.
    pub fn insert(&mut self, ephemeris: BroadcastEphemeris) -> bool {
        let sv = ephemeris.sv();
        if let Some(stored) = self.ephemerides.get(&sv) {
            if !ephemeris.is_newer_than(stored) {
                #[cfg(feature = "log")]
                debug!(
                    "{}: ephemeris iod={} toe={} is not newer than stored one",
                    sv,
                    ephemeris.iod(),
                    ephemeris.toe()
                );
                return false;
            }
        }
        self.ephemerides.insert(sv, ephemeris);
        true
    }

    /// Latest [BroadcastEphemeris] of this satellite
    pub fn get(&self, sv: SV) -> Option<&BroadcastEphemeris> {
        self.ephemerides.get(&sv)
    }

    /// Removes the ephemeris of this satellite
    pub fn remove(&mut self, sv: SV) -> Option<BroadcastEphemeris> {
        self.ephemerides.remove(&sv)
    }

    /// Discards all ephemerides
    pub fn clear(&mut self) {
        self.ephemerides.clear();
    }

    /// Iterates stored ephemerides, in satellite order
    pub fn iter(&self) -> impl Iterator<Item = (&SV, &BroadcastEphemeris)> {
        self.ephemerides.iter()
    }

    /// Drops ephemerides that are no longer valid at `t`
    pub fn retain_valid(&mut self, t: Epoch) {
        self.ephemerides.retain(|_, eph| eph.is_valid(t));
    }

    /// Calculates the [SatelliteState] of `sv` at instant `t`
    /// from its latest ephemeris.
    pub fn satellite_state(&self, sv: SV, t: Epoch) -> Result<SatelliteState, Error> {
        let ephemeris = self.get(sv).ok_or(Error::MissingEphemeris(sv))?;
        ephemeris.satellite_state(t)
    }
}
