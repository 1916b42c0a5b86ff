//! Reference station description (1005-1008, 1033)
use nalgebra::Vector3;

use crate::{
    bits::{BitReader, BitWriter},
    frame::Frame,
    message::MessageType,
    Error,
};

/// ARP coordinates resolution [m]
const ARP_RESOLUTION_M: f64 = 0.0001;

/// [ReferenceStation] is the antenna reference point of a stationary station.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReferenceStation {
    pub station_id: u16,
    /// ITRF realization year
    pub itrf_year: u8,
    pub gps: bool,
    pub glonass: bool,
    pub galileo: bool,
    /// Physical (false) or computed (true) reference station
    pub non_physical: bool,
    /// Single receiver oscillator
    pub single_oscillator: bool,
    /// Quarter cycle indicator
    pub quarter_cycle: u8,
    /// ARP ECEF coordinates [m]
    pub arp_ecef_m: Vector3<f64>,
    /// Antenna height [m] (1006 only)
    pub antenna_height_m: Option<f64>,
}

impl Default for ReferenceStation {
    fn default() -> Self {
        Self {
            station_id: 0,
            itrf_year: 0,
            gps: false,
            glonass: false,
            galileo: false,
            non_physical: false,
            single_oscillator: false,
            quarter_cycle: 0,
            arp_ecef_m: Vector3::zeros(),
            antenna_height_m: None,
        }
    }
}

impl ReferenceStation {
    /// Decodes a 1005 or 1006 payload
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        let number = r.read_u16(12)?;
        let with_height = match MessageType::from(number) {
            MessageType::StationArp => false,
            MessageType::StationArpHeight => true,
            _ => return Err(Error::UnknownMessage(number)),
        };

        let station_id = r.read_u16(12)?;
        let itrf_year = r.read_u8(6)?;
        let gps = r.read_bool()?;
        let glonass = r.read_bool()?;
        let galileo = r.read_bool()?;
        let non_physical = r.read_bool()?;
        let x = r.read_scaled(38, ARP_RESOLUTION_M)?;
        let single_oscillator = r.read_bool()?;
        r.skip(1)?;
        let y = r.read_scaled(38, ARP_RESOLUTION_M)?;
        let quarter_cycle = r.read_u8(2)?;
        let z = r.read_scaled(38, ARP_RESOLUTION_M)?;

        let antenna_height_m = if with_height {
            Some(r.read_scaled_unsigned(16, ARP_RESOLUTION_M)?)
        } else {
            None
        };

        Ok(Self {
            station_id,
            itrf_year,
            gps,
            glonass,
            galileo,
            non_physical,
            single_oscillator,
            quarter_cycle,
            arp_ecef_m: Vector3::new(x, y, z),
            antenna_height_m,
        })
    }

    /// Encodes [Self] as a complete 1005 frame, or 1006 frame
    /// when the antenna height is known.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut w = BitWriter::new();
        let number = if self.antenna_height_m.is_some() {
            MessageType::StationArpHeight
        } else {
            MessageType::StationArp
        };
        w.write_unsigned(12, u16::from(number) as u64)?;
        w.write_unsigned(12, self.station_id as u64)?;
        w.write_unsigned(6, self.itrf_year as u64)?;
        w.write_bool(self.gps)?;
        w.write_bool(self.glonass)?;
        w.write_bool(self.galileo)?;
        w.write_bool(self.non_physical)?;
        w.write_scaled(38, self.arp_ecef_m[0], ARP_RESOLUTION_M)?;
        w.write_bool(self.single_oscillator)?;
        w.write_unsigned(1, 0)?;
        w.write_scaled(38, self.arp_ecef_m[1], ARP_RESOLUTION_M)?;
        w.write_unsigned(2, self.quarter_cycle as u64)?;
        w.write_scaled(38, self.arp_ecef_m[2], ARP_RESOLUTION_M)?;
        if let Some(height) = self.antenna_height_m {
            w.write_scaled_unsigned(16, height, ARP_RESOLUTION_M)?;
        }
        Frame::wrap(&w.into_bytes())
    }
}

/// [AntennaDescriptor] describes the station antenna (1007, 1008)
/// and possibly its receiver (1033).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AntennaDescriptor {
    pub message_type: MessageType,
    pub station_id: u16,
    /// IGS antenna model
    pub antenna: String,
    /// Antenna setup ID
    pub setup_id: u8,
    /// Antenna serial number (1008, 1033)
    pub antenna_serial: Option<String>,
    /// Receiver model (1033)
    pub receiver: Option<String>,
    /// Receiver firmware version (1033)
    pub firmware: Option<String>,
    /// Receiver serial number (1033)
    pub receiver_serial: Option<String>,
}

impl AntennaDescriptor {
    /// Decodes a 1007, 1008 or 1033 payload
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);
        let number = r.read_u16(12)?;
        let message_type = MessageType::from(number);
        let (serial, receiver) = match message_type {
            MessageType::AntennaDescriptor => (false, false),
            MessageType::AntennaDescriptorSerial => (true, false),
            MessageType::ReceiverAntennaDescriptor => (true, true),
            _ => return Err(Error::UnknownMessage(number)),
        };

        let station_id = r.read_u16(12)?;
        let antenna = r.read_string()?;
        let setup_id = r.read_u8(8)?;

        let antenna_serial = if serial {
            Some(r.read_string()?)
        } else {
            None
        };

        let (receiver, firmware, receiver_serial) = if receiver {
            (
                Some(r.read_string()?),
                Some(r.read_string()?),
                Some(r.read_string()?),
            )
        } else {
            (None, None, None)
        };

        Ok(Self {
            message_type,
            station_id,
            antenna,
            setup_id,
            antenna_serial,
            receiver,
            firmware,
            receiver_serial,
        })
    }

    /// Encodes [Self] as a complete frame. The message number
    /// is deduced from the available fields.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let receiver = self.receiver.is_some()
            || self.firmware.is_some()
            || self.receiver_serial.is_some();

        let number = if receiver {
            MessageType::ReceiverAntennaDescriptor
        } else if self.antenna_serial.is_some() {
            MessageType::AntennaDescriptorSerial
        } else {
            MessageType::AntennaDescriptor
        };

        let mut w = BitWriter::new();
        w.write_unsigned(12, u16::from(number) as u64)?;
        w.write_unsigned(12, self.station_id as u64)?;
        w.write_string(&self.antenna)?;
        w.write_unsigned(8, self.setup_id as u64)?;

        if number != MessageType::AntennaDescriptor {
            w.write_string(self.antenna_serial.as_deref().unwrap_or_default())?;
        }

        if receiver {
            for field in [&self.receiver, &self.firmware, &self.receiver_serial] {
                w.write_string(field.as_deref().unwrap_or_default())?;
            }
        }

        Frame::wrap(&w.into_bytes())
    }
}
