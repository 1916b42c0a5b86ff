//! Observation epochs, built from consecutive observation messages
use std::collections::BTreeMap;

use gnss::prelude::{Constellation, SV};
use hifitime::{Epoch, TimeScale};

#[cfg(feature = "log")]
use log::debug;

use crate::{
    constants::Constants,
    message::observation::{
        ObservationBlock, ObservationEpoch, SatelliteObservation, Signal, MAX_SLIP_COUNT,
    },
    time::{from_week_seconds, glonass_to_gpst, gpst_from_time_of_week, week_seconds},
    Error,
};

/// [ObservationBuilder] follows one observation stream.
/// It tracks the GPS week, detects losses of lock by comparing lock time
/// indicators with the previous message, and gathers the messages of one
/// sampling instant into a single [ObservationEpoch].
#[derive(Debug, Default, Clone)]
pub struct ObservationBuilder {
    /// (GPS week, ms of week) of the latest message
    current: Option<(u32, u64)>,
    /// Latest lock time indicator
    lock_history: BTreeMap<(SV, Signal), u8>,
    /// Number of losses of lock
    slip_counters: BTreeMap<(SV, Signal), u8>,
    /// GLONASS frequency channels, learnt from ephemerides or messages
    glonass_channels: BTreeMap<SV, i8>,
    /// Epoch being gathered
    pending: Option<ObservationEpoch>,
}

impl ObservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known instant of this stream, in GPST
    pub fn current(&self) -> Option<Epoch> {
        let (week, tow_ms) = self.current?;
        Some(from_week_seconds(
            week,
            tow_ms as f64 * 1.0E-3,
            TimeScale::GPST,
        ))
    }

    /// Declares the frequency channel of a GLONASS satellite, usually
    /// obtained from its ephemeris. It is used to express the phase in cycles
    /// when observation messages do not carry a valid channel number.
    pub fn set_glonass_channel(&mut self, sv: SV, channel: i8) {
        self.glonass_channels.insert(sv, channel);
    }

    /// Returns the frequency channel of this GLONASS satellite, if known
    pub fn glonass_channel(&self, sv: SV) -> Option<i8> {
        self.glonass_channels.get(&sv).copied()
    }

    /// Resolves the (week, ms of week) of this [ObservationBlock].
    /// `reference` is only required until the first GPS message is received.
    fn resolve_time(
        &self,
        block: &ObservationBlock,
        reference: Option<Epoch>,
    ) -> Result<(u32, u64), Error> {
        match block.constellation() {
            Constellation::Glonass => {
                let reference = self
                    .current()
                    .or(reference)
                    .ok_or(Error::NoTimeReference)?;
                let t = glonass_to_gpst(block.time_ms as f64 * 1.0E-3, reference);
                let (week, tow_s) = week_seconds(t, TimeScale::GPST);
                Ok((week, (tow_s * 1.0E3).round() as u64))
            },
            _ => {
                let tow_ms = block.time_ms as u64;
                match self.current {
                    Some((week, prev_ms)) => {
                        let day_ms = (Constants::DAY_S * 1.0E3) as u64;
                        if tow_ms + day_ms < prev_ms {
                            // week rollover
                            Ok((week + 1, tow_ms))
                        } else {
                            Ok((week, tow_ms))
                        }
                    },
                    None => {
                        let reference = reference.ok_or(Error::NoTimeReference)?;
                        let t = gpst_from_time_of_week(tow_ms as f64 * 1.0E-3, reference);
                        let (week, _) = week_seconds(t, TimeScale::GPST);
                        Ok((week, tow_ms))
                    },
                }
            },
        }
    }

    /// Flags losses of lock and maintains the slip counters
    fn track_locks(&mut self, observation: &mut SatelliteObservation) {
        for obs in observation.signals.iter_mut() {
            let key = (observation.sv, obs.signal);
            let previous = self.lock_history.insert(key, obs.lock_time_indicator);

            let counter = self.slip_counters.entry(key).or_insert(0);
            if let Some(previous) = previous {
                if previous > obs.lock_time_indicator {
                    observation.lock_loss |= obs.signal.lock_loss();
                    *counter = if *counter < MAX_SLIP_COUNT {
                        *counter + 1
                    } else {
                        1
                    };
                }
            }
            obs.slip_count = *counter;
        }
    }

    /// Completes GLONASS phase observations from the known frequency channels
    fn resolve_channel(&mut self, observation: &mut SatelliteObservation) {
        if observation.sv.constellation != Constellation::Glonass {
            return;
        }
        match observation.frequency_channel {
            Some(channel) => {
                self.glonass_channels.insert(observation.sv, channel);
            },
            None => {
                let channel = self.glonass_channel(observation.sv);
                observation.frequency_channel = channel;
                for obs in observation.signals.iter_mut() {
                    if obs.phase_cycles.is_none() {
                        obs.resolve_cycles(obs.signal.wavelength(Constellation::Glonass, channel));
                    }
                }
            },
        }
    }

    /// Processes one [ObservationBlock] and returns the epochs it completed:
    /// the buffered epoch when this message starts a new one, and this
    /// very epoch when the message closes it (sync flag cleared).
    /// `reference` is used to resolve the GPS week and the GLONASS day
    /// until the stream provides its own time.
    pub fn push(
        &mut self,
        block: ObservationBlock,
        reference: Option<Epoch>,
    ) -> Result<Vec<ObservationEpoch>, Error> {
        let (week, tow_ms) = self.resolve_time(&block, reference)?;
        self.current = Some((week, tow_ms));

        let mut completed = Vec::with_capacity(2);

        let new_instant = self
            .pending
            .as_ref()
            .is_some_and(|pending| (pending.week, pending.tow_ms) != (week, tow_ms));

        if new_instant {
            if let Some(pending) = self.pending.take() {
                #[cfg(feature = "log")]
                debug!("{}: new instant, flushing pending epoch", pending.epoch);
                completed.push(pending);
            }
        }

        let mut satellites = block.satellites;
        for observation in satellites.iter_mut() {
            self.track_locks(observation);
            self.resolve_channel(observation);
        }

        let pending = self.pending.get_or_insert_with(|| ObservationEpoch {
            epoch: from_week_seconds(week, tow_ms as f64 * 1.0E-3, TimeScale::GPST),
            week,
            tow_ms,
            satellites: Vec::new(),
        });

        for observation in satellites {
            pending.insert(observation);
        }

        if !block.sync {
            if let Some(pending) = self.pending.take() {
                completed.push(pending);
            }
        }

        Ok(completed)
    }

    /// Returns the epoch being gathered, even if incomplete
    pub fn flush(&mut self) -> Option<ObservationEpoch> {
        self.pending.take()
    }

    /// Forgets all stream history
    pub fn reset(&mut self) {
        *self = Self {
            glonass_channels: std::mem::take(&mut self.glonass_channels),
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::observation::{
        glonass::test::glonass_1012, test::gps_1004, LockLoss, ObservationBlock,
    };
    use std::str::FromStr;

    fn block(payload: Vec<u8>) -> ObservationBlock {
        ObservationBlock::decode(&payload).unwrap()
    }

    fn reference() -> Option<Epoch> {
        Epoch::from_str("2024-02-07T12:00:00 GPST").ok()
    }

    #[test]
    fn requires_time_reference() {
        let mut builder = ObservationBuilder::new();
        let b = block(gps_1004(1000, false, &[(1, 2.0E7, 2.0E7, 1, 1)]));
        assert!(matches!(builder.push(b, None), Err(Error::NoTimeReference)));
    }

    #[test]
    fn week_tracking() {
        let mut builder = ObservationBuilder::new();
        // 2024-02-07 is a wednesday of GPS week 2300
        let tow_ms = 3 * 86_400_000 + 43_200_000;
        let b = block(gps_1004(tow_ms, false, &[(1, 2.0E7, 2.0E7, 1, 1)]));
        let epochs = builder.push(b, reference()).unwrap();
        assert_eq!(epochs.len(), 1);
        assert_eq!(epochs[0].week, 2300);
        assert_eq!(epochs[0].tow_ms, tow_ms as u64);
        assert_eq!(epochs[0].epoch, reference().unwrap());

        // end of week
        let b = block(gps_1004(604_799_000, false, &[(1, 2.0E7, 2.0E7, 2, 1)]));
        let epochs = builder.push(b, None).unwrap();
        assert_eq!(epochs[0].week, 2300);

        // rollover
        let b = block(gps_1004(0, false, &[(1, 2.0E7, 2.0E7, 3, 1)]));
        let epochs = builder.push(b, None).unwrap();
        assert_eq!(epochs[0].week, 2301);
        assert_eq!(epochs[0].tow_ms, 0);
        assert_eq!(
            epochs[0].epoch,
            Epoch::from_str("2024-02-11T00:00:00 GPST").unwrap()
        );
    }

    #[test]
    fn epoch_gathering() {
        let mut builder = ObservationBuilder::new();
        let tow_ms = 3 * 86_400_000 + 43_200_000;

        let b = block(gps_1004(tow_ms, true, &[(1, 2.0E7, 2.0E7, 1, 1)]));
        assert!(builder.push(b, reference()).unwrap().is_empty());

        // same satellite repeated, same instant
        let b = block(gps_1004(tow_ms, true, &[(1, 2.0E7, 2.0E7, 1, 1), (2, 2.1E7, 2.1E7, 1, 1)]));
        assert!(builder.push(b, reference()).unwrap().is_empty());

        // closing message
        let b = block(gps_1004(tow_ms, false, &[(3, 2.2E7, 2.2E7, 1, 1)]));
        let epochs = builder.push(b, reference()).unwrap();
        assert_eq!(epochs.len(), 1);
        assert_eq!(epochs[0].len(), 3);
        assert!(builder.flush().is_none());

        // new instant closes the pending epoch
        let b = block(gps_1004(tow_ms + 1000, true, &[(1, 2.0E7, 2.0E7, 1, 1)]));
        assert!(builder.push(b, None).unwrap().is_empty());
        let b = block(gps_1004(tow_ms + 2000, true, &[(1, 2.0E7, 2.0E7, 1, 1)]));
        let epochs = builder.push(b, None).unwrap();
        assert_eq!(epochs.len(), 1);
        assert_eq!(epochs[0].tow_ms, tow_ms as u64 + 1000);

        let pending = builder.flush().unwrap();
        assert_eq!(pending.tow_ms, tow_ms as u64 + 2000);
    }

    #[test]
    fn lock_loss_and_slips() {
        let mut builder = ObservationBuilder::new();
        let g01 = SV::new(Constellation::GPS, 1);
        let mut tow_ms = 3 * 86_400_000;

        let mut push = |builder: &mut ObservationBuilder, lock: u8| {
            tow_ms += 1000;
            let b = block(gps_1004(tow_ms, false, &[(1, 2.0E7, 2.0E7, lock, 1)]));
            let epochs = builder.push(b, reference()).unwrap();
            epochs[0].satellite(g01).unwrap().clone()
        };

        let sat = push(&mut builder, 10);
        assert_eq!(sat.lock_loss, LockLoss::empty());
        assert_eq!(sat.signal(Signal::L1).unwrap().slip_count, 0);

        let sat = push(&mut builder, 11);
        assert_eq!(sat.lock_loss, LockLoss::empty());

        let sat = push(&mut builder, 2);
        assert_eq!(sat.lock_loss, LockLoss::L1 | LockLoss::L2);
        assert_eq!(sat.signal(Signal::L1).unwrap().slip_count, 1);
        assert_eq!(sat.signal(Signal::L2).unwrap().slip_count, 1);

        let sat = push(&mut builder, 2);
        assert_eq!(sat.lock_loss, LockLoss::empty());
        assert_eq!(sat.signal(Signal::L1).unwrap().slip_count, 1);

        // counters wrap after 100
        for _ in 0..99 {
            push(&mut builder, 10);
            push(&mut builder, 0);
        }
        let sat = push(&mut builder, 5);
        assert_eq!(sat.signal(Signal::L1).unwrap().slip_count, 100);
        push(&mut builder, 0);
        let sat = push(&mut builder, 0);
        assert_eq!(sat.signal(Signal::L1).unwrap().slip_count, 1);
    }

    #[test]
    fn glonass_epochs() {
        let mut builder = ObservationBuilder::new();
        let r07 = SV::new(Constellation::Glonass, 7);
        builder.set_glonass_channel(r07, -2);

        // 12:00 GPST is 14:59:42 UTC+3 (18 leap seconds)
        let tk_ms = (14 * 3600 + 59 * 60 + 42) * 1000;
        let b = block(glonass_1012(tk_ms, false, &[(7, 31, 2.1E7, 1), (3, 12, 2.0E7, 1)]));
        let epochs = builder.push(b, reference()).unwrap();
        assert_eq!(epochs.len(), 1);
        assert_eq!(epochs[0].epoch, reference().unwrap());

        let sat = epochs[0].satellite(r07).unwrap();
        assert_eq!(sat.frequency_channel, Some(-2));
        assert!(sat.signals.iter().all(|obs| obs.phase_cycles.is_some()));

        // channel learnt from the message
        assert_eq!(builder.glonass_channel(SV::new(Constellation::Glonass, 3)), Some(5));
    }

    #[test]
    fn reset() {
        let mut builder = ObservationBuilder::new();
        let b = block(gps_1004(1000, true, &[(1, 2.0E7, 2.0E7, 1, 1)]));
        builder.push(b, reference()).unwrap();
        builder.set_glonass_channel(SV::new(Constellation::Glonass, 1), 1);
        builder.reset();
        assert!(builder.current().is_none());
        assert!(builder.flush().is_none());
        assert_eq!(builder.glonass_channel(SV::new(Constellation::Glonass, 1)), Some(1));
    }
}
