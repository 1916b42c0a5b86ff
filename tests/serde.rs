#![cfg(feature = "serde")]
use rtcm3::prelude::*;

mod common;
use common::{gps_1019_frame, t0};

#[test]
fn records() {
    let mut decoder = Decoder::new().with_time_reference(FixedReference(t0()));
    decoder.push(&gps_1019_frame());
    let record = decoder.next_record().unwrap();

    let content = serde_json::to_string(&record).unwrap();
    let parsed: Record = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed, record);

    let state = decoder
        .satellite_state(record.as_ephemeris().unwrap().sv(), t0())
        .unwrap();
    let content = serde_json::to_string(&state).unwrap();
    let parsed: SatelliteState = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.sv, state.sv);
    assert_eq!(parsed.epoch, state.epoch);
}

#[test]
fn corrections() {
    let mut clock_orbit = ClockOrbit {
        gps_epoch_s: 1234,
        gps_content: SsrContent::ORBIT,
        ..Default::default()
    };
    clock_orbit
        .satellite_mut(SV::new(Constellation::GPS, 3))
        .unwrap()
        .orbit
        .delta_m = [0.5, 0.25, -0.125];

    let content = serde_json::to_string(&clock_orbit).unwrap();
    let parsed: ClockOrbit = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed, clock_orbit);
}
