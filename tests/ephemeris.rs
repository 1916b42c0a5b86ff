use rtcm3::prelude::*;
use std::str::FromStr;

mod common;
use common::{gps_1019_frame, t0};

fn decoded_1019() -> BroadcastEphemeris {
    let mut decoder = Decoder::new().with_time_reference(FixedReference(t0()));
    decoder.push(&gps_1019_frame());
    match decoder.next_record() {
        Some(Record::Ephemeris(eph)) => eph,
        other => panic!("expecting an ephemeris, got {:?}", other),
    }
}

#[test]
fn gps_1019_elements() {
    let eph = decoded_1019();
    assert_eq!(eph.sv(), SV::from_str("G05").unwrap());
    assert_eq!(eph.iod(), 45);
    assert_eq!(eph.health(), 0);
    assert_eq!(eph.toe(), t0());

    let gps = eph.as_gps().unwrap();
    assert_eq!(gps.week, 2300);
    assert_eq!(gps.iode, 45);
    assert_eq!(gps.iodc, 45);
    assert_eq!(gps.l2_codes, 1);
    assert_eq!(gps.ura_m, 4.0);
    assert_eq!(gps.toe_s, 302_400.0);
    assert_eq!(gps.toc_s, 302_400.0);
    assert_eq!(gps.sqrt_a, 5153.62353515625);
    assert_eq!(gps.crs, -20.3125);
    assert_eq!(gps.crc, 230.5);

    for (value, expected, lsb) in [
        (gps.e, 0.005671859951689839, 2.0_f64.powi(-33)),
        (gps.m0, 1.234560000562288, 1.5E-9),
        (gps.i0, 0.9612339998486821, 1.5E-9),
        (gps.omega0, -2.103209999641429, 1.5E-9),
        (gps.omega, 0.7891230000604179, 1.5E-9),
        (gps.af0, -0.00012299977242946625, 2.0_f64.powi(-31)),
        (gps.delta_n, 4.56E-9, 3.6E-13),
        (gps.omega_dot, -8.1E-9, 3.6E-13),
        (gps.idot, -3.2E-10, 3.6E-13),
    ] {
        assert!(
            (value - expected).abs() <= lsb / 2.0,
            "{} != {}",
            value,
            expected
        );
    }

    // encoding the decoded elements restores the very same frame
    assert_eq!(eph.encode().unwrap(), gps_1019_frame());
}

#[test]
fn gps_orbit() {
    let eph = decoded_1019();
    let t = t0() + Duration::from_seconds(7200.0);

    let mut decoder = Decoder::new().with_time_reference(FixedReference(t0()));
    decoder.push(&gps_1019_frame());
    let state = decoder
        .satellite_state(SV::from_str("G05").unwrap(), t)
        .unwrap();

    assert_eq!(state, eph.satellite_state(t).unwrap());
    assert_eq!(state.epoch, t);

    // IS-GPS-200 user algorithm evaluated on the quantized elements
    let reference = Vector3::new(-24322442.989381153, -10837950.865610793, 1292494.5585347372);
    let error = (state.position_m - reference).norm();
    assert!(error < 1.0, "position error: {} m", error);
    assert!((state.radius_m() - 26659200.177817263).abs() < 1.0);

    // clock polynomial and -2 (r.v) / c² relativistic term
    assert!((state.clock_bias_s - -1.2304638697324479E-4).abs() < 1.0E-12);

    let speed = state.velocity_m_s.norm();
    assert!(speed > 1000.0 && speed < 4500.0, "speed: {}", speed);

    // velocity is consistent with the trajectory
    let dt = Duration::from_seconds(1.0);
    let before = eph.satellite_state(t - dt).unwrap();
    let after = eph.satellite_state(t + dt).unwrap();
    let numerical = (after.position_m - before.position_m) / 2.0;
    assert!((numerical - state.velocity_m_s).norm() < 0.01);
}

#[test]
fn multi_constellation_store() {
    let galileo = BroadcastEphemeris::from(GalileoEphemeris {
        sv: SV::from_str("E11").unwrap(),
        source: GalileoSource::INav,
        week: 1276,
        iodnav: 10,
        toc_s: 302_400.0,
        toe_s: 302_400.0,
        sqrt_a: 5440.6,
        e: 2.0E-4,
        i0: 0.97,
        ..Default::default()
    });

    let glonass = BroadcastEphemeris::from(
        GlonassEphemeris {
            sv: SV::from_str("R07").unwrap(),
            frequency_channel: 5,
            x_km: 12_000.0,
            y_km: -15_000.0,
            z_km: 15_000.0,
            vx_km_s: 1.5,
            vy_km_s: 2.2,
            vz_km_s: 0.8,
            ..Default::default()
        }
        .with_toe(t0()),
    );

    let mut bytes = gps_1019_frame();
    bytes.extend(galileo.encode().unwrap());
    bytes.extend(glonass.encode().unwrap());

    let mut decoder = Decoder::new().with_time_reference(FixedReference(t0()));
    decoder.push(&bytes);

    let mut svs = Vec::new();
    while let Some(record) = decoder.next_record() {
        svs.push(record.as_ephemeris().unwrap().sv());
    }
    assert_eq!(
        svs,
        vec![
            SV::from_str("G05").unwrap(),
            SV::from_str("E11").unwrap(),
            SV::from_str("R07").unwrap()
        ]
    );

    let store = decoder.store();
    assert_eq!(store.len(), 3);

    let r07 = store.get(SV::from_str("R07").unwrap()).unwrap();
    // tb is quantized to 15'
    assert!((r07.toe() - t0()).to_seconds().abs() <= 450.0);

    for sv in svs {
        let state = decoder.satellite_state(sv, t0()).unwrap();
        assert!(state.radius_m() > 2.0E7, "{}: {}", sv, state.radius_m());
    }
}
