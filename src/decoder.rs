//! RTCM3 stream decoding
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use gnss::prelude::SV;
use hifitime::Epoch;

#[cfg(feature = "log")]
use log::{debug, warn};

use crate::{
    frame::{Frame, Framer},
    message::{
        ephemeris::BroadcastEphemeris,
        observation::{ObservationBlock, ObservationBuilder, ObservationEpoch},
        ssr::{Bias, ClockOrbit, SsrDecoder, SsrRecord},
        station::{AntennaDescriptor, ReferenceStation},
        MessageType,
    },
    orbit::SatelliteState,
    store::EphemerisStore,
    time::{SystemClock, TimeReference},
    Error,
};

/// [Record] is anything the [Decoder] may produce
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Record {
    /// All observations of one sampling instant
    Observation(ObservationEpoch),
    /// New broadcast ephemeris
    Ephemeris(BroadcastEphemeris),
    /// SSR orbit and clock corrections of one epoch
    ClockOrbit(ClockOrbit),
    /// SSR code biases of one epoch
    Bias(Bias),
    /// Reference station coordinates
    Station(ReferenceStation),
    /// Antenna and receiver description
    Antenna(AntennaDescriptor),
}

impl Record {
    /// Returns [ObservationEpoch] if [Self] is an observation
    pub fn as_observation(&self) -> Option<&ObservationEpoch> {
        match self {
            Self::Observation(epoch) => Some(epoch),
            _ => None,
        }
    }

    /// Returns [BroadcastEphemeris] if [Self] is an ephemeris
    pub fn as_ephemeris(&self) -> Option<&BroadcastEphemeris> {
        match self {
            Self::Ephemeris(eph) => Some(eph),
            _ => None,
        }
    }

    /// Returns [ClockOrbit] if [Self] is an SSR orbit and clock correction
    pub fn as_clock_orbit(&self) -> Option<&ClockOrbit> {
        match self {
            Self::ClockOrbit(clock_orbit) => Some(clock_orbit),
            _ => None,
        }
    }

    /// Returns [Bias] if [Self] is an SSR code bias correction
    pub fn as_bias(&self) -> Option<&Bias> {
        match self {
            Self::Bias(bias) => Some(bias),
            _ => None,
        }
    }
}

/// [Decoder] follows one RTCM3 stream: push bytes as they arrive,
/// in chunks of any size, then collect the [Record]s.
/// ```
/// use rtcm3::prelude::*;
/// use std::str::FromStr;
///
/// // replaying an archive: the host clock is not relevant
/// let t0 = Epoch::from_str("2024-02-07T12:00:00 GPST").unwrap();
/// let mut decoder = Decoder::new()
///     .with_time_reference(FixedReference(t0));
///
/// // garbage is skipped
/// decoder.push(&[0x00, 0x01, 0x02]);
/// assert!(decoder.next_record().is_none());
/// ```
pub struct Decoder {
    framer: Framer,
    observations: ObservationBuilder,
    ssr: SsrDecoder,
    store: EphemerisStore,
    /// Retain ephemerides in the internal [EphemerisStore]
    retain_ephemerides: bool,
    reference: Box<dyn TimeReference + Send + Sync>,
    records: VecDeque<Record>,
    /// Frames dropped because they could not be interpreted
    rejected: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            framer: Framer::new(),
            observations: ObservationBuilder::new(),
            ssr: SsrDecoder::new(),
            store: EphemerisStore::new(),
            retain_ephemerides: true,
            reference: Box::new(SystemClock),
            records: VecDeque::new(),
            rejected: 0,
        }
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("framer", &self.framer)
            .field("store", &self.store)
            .field("retain_ephemerides", &self.retain_ephemerides)
            .field("pending_records", &self.records.len())
            .field("rejected", &self.rejected)
            .finish()
    }
}

impl Decoder {
    /// Creates a new [Decoder], using the host clock as time reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies and returns [Decoder] with a different [TimeReference].
    /// The time reference is used to resolve the GPS week and the
    /// GLONASS day, until the stream provides its own time.
    pub fn with_time_reference<T: TimeReference + Send + Sync + 'static>(
        self,
        reference: T,
    ) -> Self {
        Self {
            reference: Box::new(reference),
            ..self
        }
    }

    /// Copies and returns [Decoder] with ephemeris retention
    /// turned on or off. When turned off, [Decoder::satellite_state] is not available
    /// and every decoded ephemeris is reported.
    pub fn with_ephemeris_retention(self, retain: bool) -> Self {
        Self {
            retain_ephemerides: retain,
            ..self
        }
    }

    /// Best knowledge of the current GPS time: the stream time
    /// once known, the [TimeReference] otherwise.
    pub fn current_time(&self) -> Option<Epoch> {
        self.observations.current().or_else(|| self.reference.now())
    }

    /// Retained ephemerides
    pub fn store(&self) -> &EphemerisStore {
        &self.store
    }

    /// Total number of bytes skipped while hunting for frames
    pub fn skipped_bytes(&self) -> usize {
        self.framer.skipped()
    }

    /// Total number of frames that could not be interpreted
    pub fn rejected_frames(&self) -> usize {
        self.rejected
    }

    /// Feeds new bytes, and decodes all complete frames
    pub fn push(&mut self, bytes: &[u8]) {
        self.framer.push(bytes);
        while let Some(frame) = self.framer.next_frame() {
            if let Err(_e) = self.process(&frame) {
                #[cfg(feature = "log")]
                warn!("message #{} dropped: {}", frame.message_type, _e);
                self.rejected += 1;
            }
        }
    }

    /// Returns the oldest decoded [Record], if any
    pub fn next_record(&mut self) -> Option<Record> {
        self.records.pop_front()
    }

    /// Releases the observations being gathered, even if the epoch
    /// is not complete yet. Use this at the end of a stream.
    pub fn flush(&mut self) {
        if let Some(epoch) = self.observations.flush() {
            self.records.push_back(Record::Observation(epoch));
        }
    }

    /// Forgets all stream history (buffered bytes, pending epochs,
    /// lock history). Retained ephemerides are kept.
    pub fn reset(&mut self) {
        self.framer.reset();
        self.observations.reset();
        self.ssr.reset();
        self.records.clear();
    }

    /// Calculates the [SatelliteState] of `sv` at instant `t`,
    /// from the latest ephemeris received.
    pub fn satellite_state(&self, sv: SV, t: Epoch) -> Result<SatelliteState, Error> {
        self.store.satellite_state(sv, t)
    }

    /// Interprets one [Frame]
    fn process(&mut self, frame: &Frame) -> Result<(), Error> {
        let message = MessageType::from(frame.message_type);

        if message.is_observation() {
            let block = ObservationBlock::decode(&frame.payload)?;
            let reference = self.reference.now();
            for epoch in self.observations.push(block, reference)? {
                self.records.push_back(Record::Observation(epoch));
            }
        } else if message.is_ephemeris() {
            let reference = self.current_time().ok_or(Error::NoTimeReference)?;
            let ephemeris = BroadcastEphemeris::decode(frame, reference)?;
            self.process_ephemeris(ephemeris);
        } else if message.is_ssr() {
            let record = match self.ssr.decode_frame(frame) {
                Err(Error::EpochMismatch) => self.ssr.decode_frame(frame)?,
                result => result?,
            };
            match record {
                Some(SsrRecord::ClockOrbit(clock_orbit)) => {
                    self.records.push_back(Record::ClockOrbit(clock_orbit));
                },
                Some(SsrRecord::Bias(bias)) => {
                    self.records.push_back(Record::Bias(bias));
                },
                None => {},
            }
        } else if message.is_station() {
            let record = match message {
                MessageType::StationArp | MessageType::StationArpHeight => {
                    Record::Station(ReferenceStation::decode(&frame.payload)?)
                },
                _ => Record::Antenna(AntennaDescriptor::decode(&frame.payload)?),
            };
            self.records.push_back(record);
        } else {
            #[cfg(feature = "log")]
            debug!("message #{} is not supported", frame.message_type);
        }
        Ok(())
    }

    fn process_ephemeris(&mut self, ephemeris: BroadcastEphemeris) {
        if let Some(glonass) = ephemeris.as_glonass() {
            self.observations
                .set_glonass_channel(glonass.sv, glonass.frequency_channel);
        }

        if self.retain_ephemerides {
            if self.store.insert(ephemeris.clone()) {
                self.records.push_back(Record::Ephemeris(ephemeris));
            }
        } else {
            self.records.push_back(Record::Ephemeris(ephemeris));
        }
    }
}

/// [StreamDecoder] decodes all [Record]s streamed on a readable interface.
/// ```
/// use rtcm3::prelude::*;
/// use std::str::FromStr;
///
/// let t0 = Epoch::from_str("2024-02-07T12:00:00 GPST").unwrap();
/// // a file or socket would do too
/// let bytes: &[u8] = &[0x00, 0x01, 0x02, 0x03];
///
/// let decoder = Decoder::new().with_time_reference(FixedReference(t0));
/// let mut stream = StreamDecoder::new(bytes, decoder);
///
/// // consume the data stream
/// for record in stream.by_ref() {
///     match record {
///         Ok(Record::Observation(epoch)) => {},
///         Ok(Record::Ephemeris(eph)) => {},
///         Ok(_) => {},
///         Err(e) => {
///             // I/O errors only: decoding errors are not fatal
///         },
///     }
/// }
/// ```
pub struct StreamDecoder<R: Read> {
    reader: R,
    decoder: Decoder,
    buffer: Vec<u8>,
    /// End of stream reached
    eos: bool,
}

impl<R: Read> StreamDecoder<R> {
    /// Read buffer size
    const BUFFER_SIZE: usize = 4096;

    /// Creates a new [StreamDecoder], decoding bytes read from `reader`.
    pub fn new(reader: R, decoder: Decoder) -> Self {
        Self {
            reader,
            decoder,
            buffer: vec![0; Self::BUFFER_SIZE],
            eos: false,
        }
    }

    /// Underlying [Decoder]
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Releases the underlying [Decoder]
    pub fn into_decoder(self) -> Decoder {
        self.decoder
    }
}

impl<R: Read> Iterator for StreamDecoder<R> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.decoder.next_record() {
                return Some(Ok(record));
            }
            if self.eos {
                return None;
            }
            match self.reader.read(&mut self.buffer) {
                Ok(0) => {
                    self.eos = true;
                    self.decoder.flush();
                },
                Ok(size) => self.decoder.push(&self.buffer[..size]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => return Some(Err(Error::IoError(e))),
            }
        }
    }
}
