//! RTCM3 messages
pub mod ephemeris;
pub mod observation;
pub mod ssr;
pub mod station;

/// Supported RTCM3 message numbers
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MessageType {
    /// GPS L1 only observations
    GpsL1 = 1001,
    /// GPS extended L1 only observations
    GpsL1Extended = 1002,
    /// GPS L1/L2 observations
    GpsL1L2 = 1003,
    /// GPS extended L1/L2 observations
    GpsL1L2Extended = 1004,
    /// Stationary reference station ARP
    StationArp = 1005,
    /// Stationary reference station ARP with antenna height
    StationArpHeight = 1006,
    /// Antenna descriptor
    AntennaDescriptor = 1007,
    /// Antenna descriptor and serial number
    AntennaDescriptorSerial = 1008,
    /// GLONASS L1 only observations
    GlonassL1 = 1009,
    /// GLONASS extended L1 only observations
    GlonassL1Extended = 1010,
    /// GLONASS L1/L2 observations
    GlonassL1L2 = 1011,
    /// GLONASS extended L1/L2 observations
    GlonassL1L2Extended = 1012,
    /// GPS ephemeris
    GpsEphemeris = 1019,
    /// GLONASS ephemeris
    GlonassEphemeris = 1020,
    /// Receiver and antenna descriptors
    ReceiverAntennaDescriptor = 1033,
    /// BeiDou ephemeris
    BeiDouEphemeris = 1042,
    /// SBAS ephemeris
    SBASEphemeris = 1043,
    /// QZSS ephemeris
    QZSSEphemeris = 1044,
    /// Galileo F/NAV ephemeris
    GalileoFNavEphemeris = 1045,
    /// Galileo I/NAV ephemeris
    GalileoINavEphemeris = 1046,
    /// SSR GPS orbit correction
    GpsSsrOrbit = 1057,
    /// SSR GPS clock correction
    GpsSsrClock = 1058,
    /// SSR GPS code bias
    GpsSsrCodeBias = 1059,
    /// SSR GPS combined orbit and clock corrections
    GpsSsrOrbitClock = 1060,
    /// SSR GPS user range accuracy
    GpsSsrUra = 1061,
    /// SSR GPS high rate clock correction
    GpsSsrHighRateClock = 1062,
    /// SSR GLONASS orbit correction
    GlonassSsrOrbit = 1063,
    /// SSR GLONASS clock correction
    GlonassSsrClock = 1064,
    /// SSR GLONASS code bias
    GlonassSsrCodeBias = 1065,
    /// SSR GLONASS combined orbit and clock corrections
    GlonassSsrOrbitClock = 1066,
    /// SSR GLONASS user range accuracy
    GlonassSsrUra = 1067,
    /// SSR GLONASS high rate clock correction
    GlonassSsrHighRateClock = 1068,
    /// Unknown / unsupported message
    #[default]
    Unknown = 0xffff,
}

impl From<u16> for MessageType {
    fn from(val: u16) -> Self {
        match val {
            1001 => Self::GpsL1,
            1002 => Self::GpsL1Extended,
            1003 => Self::GpsL1L2,
            1004 => Self::GpsL1L2Extended,
            1005 => Self::StationArp,
            1006 => Self::StationArpHeight,
            1007 => Self::AntennaDescriptor,
            1008 => Self::AntennaDescriptorSerial,
            1009 => Self::GlonassL1,
            1010 => Self::GlonassL1Extended,
            1011 => Self::GlonassL1L2,
            1012 => Self::GlonassL1L2Extended,
            1019 => Self::GpsEphemeris,
            1020 => Self::GlonassEphemeris,
            1033 => Self::ReceiverAntennaDescriptor,
            1042 => Self::BeiDouEphemeris,
            1043 => Self::SBASEphemeris,
            1044 => Self::QZSSEphemeris,
            1045 => Self::GalileoFNavEphemeris,
            1046 => Self::GalileoINavEphemeris,
            1057 => Self::GpsSsrOrbit,
            1058 => Self::GpsSsrClock,
            1059 => Self::GpsSsrCodeBias,
            1060 => Self::GpsSsrOrbitClock,
            1061 => Self::GpsSsrUra,
            1062 => Self::GpsSsrHighRateClock,
            1063 => Self::GlonassSsrOrbit,
            1064 => Self::GlonassSsrClock,
            1065 => Self::GlonassSsrCodeBias,
            1066 => Self::GlonassSsrOrbitClock,
            1067 => Self::GlonassSsrUra,
            1068 => Self::GlonassSsrHighRateClock,
            _ => Self::Unknown,
        }
    }
}

impl From<MessageType> for u16 {
    fn from(val: MessageType) -> u16 {
        val as u16
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", u16::from(*self))
    }
}

impl MessageType {
    /// True for legacy observation messages (1001-1004, 1009-1012)
    pub fn is_observation(&self) -> bool {
        matches!(
            self,
            Self::GpsL1
                | Self::GpsL1Extended
                | Self::GpsL1L2
                | Self::GpsL1L2Extended
                | Self::GlonassL1
                | Self::GlonassL1Extended
                | Self::GlonassL1L2
                | Self::GlonassL1L2Extended
        )
    }

    /// True for broadcast ephemeris messages
    pub fn is_ephemeris(&self) -> bool {
        matches!(
            self,
            Self::GpsEphemeris
                | Self::GlonassEphemeris
                | Self::BeiDouEphemeris
                | Self::SBASEphemeris
                | Self::QZSSEphemeris
                | Self::GalileoFNavEphemeris
                | Self::GalileoINavEphemeris
        )
    }

    /// True for State Space Representation messages
    pub fn is_ssr(&self) -> bool {
        let val = *self as u16;
        (1057..=1068).contains(&val)
    }

    /// True for station description messages
    pub fn is_station(&self) -> bool {
        matches!(
            self,
            Self::StationArp
                | Self::StationArpHeight
                | Self::AntennaDescriptor
                | Self::AntennaDescriptorSerial
                | Self::ReceiverAntennaDescriptor
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn message_numbers() {
        for val in 0..4096_u16 {
            let mt = MessageType::from(val);
            if mt != MessageType::Unknown {
                assert_eq!(u16::from(mt), val);
            }
        }
        assert_eq!(MessageType::from(1019), MessageType::GpsEphemeris);
        assert_eq!(MessageType::from(1230), MessageType::Unknown);
        assert!(MessageType::GlonassSsrOrbitClock.is_ssr());
        assert!(!MessageType::GalileoINavEphemeris.is_ssr());
        assert!(MessageType::GlonassL1L2Extended.is_observation());
        assert!(MessageType::QZSSEphemeris.is_ephemeris());
        assert!(MessageType::StationArpHeight.is_station());
        assert_eq!(MessageType::GpsSsrCodeBias.to_string(), "1059");
    }
}
