use rtcm3::prelude::*;
use std::str::FromStr;

mod common;
use common::t0;

/// GLONASS combined orbit and clock corrections, one satellite per slot
fn glonass_corrections(epoch_s: u32, slots: std::ops::RangeInclusive<u8>) -> ClockOrbit {
    let mut clock_orbit = ClockOrbit {
        glonass_epoch_s: epoch_s,
        update_interval: 2,
        glonass_content: SsrContent::ORBIT | SsrContent::CLOCK,
        ..Default::default()
    };
    for slot in slots {
        let sv = SV::new(Constellation::Glonass, slot);
        let sat = clock_orbit.satellite_mut(sv).unwrap();
        sat.iod = slot * 2;
        sat.orbit.delta_m = [slot as f64 * 0.1, -0.2, 0.3];
        sat.orbit.dot_delta_m_s = [0.001, 0.0, -0.002];
        sat.clock = ClockCorrection {
            c0_m: -(slot as f64) * 0.01,
            ..Default::default()
        };
    }
    clock_orbit
}

fn encode(clock_orbit: &ClockOrbit, more_messages: bool) -> Vec<u8> {
    let frames = SsrEncoder::new()
        .with_more_messages(more_messages)
        .encode_clock_orbit(clock_orbit)
        .unwrap();
    assert_eq!(frames.len(), 1);
    frames[0].clone()
}

#[test]
fn glonass_two_messages() {
    let first = encode(&glonass_corrections(43_200, 1..=6), true);
    let last = encode(&glonass_corrections(43_200, 7..=12), false);

    let mut decoder = SsrDecoder::new();

    let (status, size, record) = decoder.decode(&first);
    assert_eq!(status, SsrStatus::MessageFollows);
    assert_eq!(size, first.len());
    assert!(record.is_none());
    assert_eq!(decoder.pending_clock_orbit().glonass.len(), 6);

    let (status, size, record) = decoder.decode(&last);
    assert_eq!(status, SsrStatus::Ok);
    assert_eq!(size, last.len());

    let clock_orbit = match record {
        Some(SsrRecord::ClockOrbit(clock_orbit)) => clock_orbit,
        other => panic!("expecting orbit and clock corrections, got {:?}", other),
    };
    assert_eq!(clock_orbit.glonass.len(), 12);
    assert_eq!(clock_orbit.glonass_epoch_s, 43_200);
    assert_eq!(
        clock_orbit.content(Constellation::Glonass),
        SsrContent::ORBIT | SsrContent::CLOCK
    );
    assert!(decoder.pending_clock_orbit().is_empty());

    let r09 = clock_orbit.satellite(SV::from_str("R09").unwrap()).unwrap();
    assert_eq!(r09.iod, 18);
    assert!((r09.orbit.delta_m[0] - 0.9).abs() < 1.0E-4);
    assert!((r09.orbit.delta_m[1] + 0.2).abs() < 4.0E-4);
    assert!((r09.clock.c0_m + 0.09).abs() < 1.0E-4);

    // 12:00 Moscow time
    let reference = t0();
    let epoch = clock_orbit.glonass_epoch(reference);
    assert!((epoch - reference).to_seconds().abs() < 12.0 * 3600.0);
}

#[test]
fn glonass_epoch_mismatch() {
    let first = encode(&glonass_corrections(43_200, 1..=6), true);
    let last = encode(&glonass_corrections(43_205, 7..=12), false);

    let mut decoder = SsrDecoder::new();
    let (status, _, _) = decoder.decode(&first);
    assert_eq!(status, SsrStatus::MessageFollows);

    let (status, size, record) = decoder.decode(&last);
    assert_eq!(status, SsrStatus::EpochMismatch);
    assert_eq!(size, 0);
    assert!(record.is_none());
    // partial accumulation is discarded
    assert!(decoder.pending_clock_orbit().is_empty());

    // same bytes, new epoch
    let (status, size, record) = decoder.decode(&last);
    assert_eq!(status, SsrStatus::Ok);
    assert_eq!(size, last.len());
    match record {
        Some(SsrRecord::ClockOrbit(clock_orbit)) => {
            assert_eq!(clock_orbit.glonass_epoch_s, 43_205);
            assert_eq!(clock_orbit.glonass.len(), 6);
            assert!(clock_orbit.satellite(SV::from_str("R01").unwrap()).is_none());
        },
        other => panic!("expecting orbit and clock corrections, got {:?}", other),
    }
}

#[test]
fn decoder_stream() {
    let mut bytes = encode(&glonass_corrections(43_200, 1..=6), true);
    bytes.extend(encode(&glonass_corrections(43_200, 7..=12), true));
    // epoch is abandoned
    bytes.extend(encode(&glonass_corrections(43_205, 1..=3), false));

    let mut decoder = Decoder::new().with_time_reference(FixedReference(t0()));
    decoder.push(&bytes);

    let record = decoder.next_record().unwrap();
    let clock_orbit = record.as_clock_orbit().unwrap();
    assert_eq!(clock_orbit.glonass_epoch_s, 43_205);
    assert_eq!(clock_orbit.glonass.len(), 3);
    assert!(decoder.next_record().is_none());
    assert_eq!(decoder.rejected_frames(), 0);
}

#[test]
fn gps_clock_orbit_and_biases() {
    let mut clock_orbit = ClockOrbit {
        gps_epoch_s: 302_400,
        update_interval: 5,
        gps_content: SsrContent::ORBIT | SsrContent::CLOCK | SsrContent::URA,
        ..Default::default()
    };
    for prn in 1..=32 {
        let sat = clock_orbit
            .satellite_mut(SV::new(Constellation::GPS, prn))
            .unwrap();
        sat.iod = prn;
        sat.ura = prn % 16;
        sat.orbit.delta_m[2] = -0.5;
        sat.clock.c0_m = 0.25;
    }

    let mut bias = Bias {
        gps_epoch_s: 302_400,
        ..Default::default()
    };
    let g01 = bias.satellite_mut(SV::from_str("G01").unwrap()).unwrap();
    g01.biases.push(CodeBias {
        signal: CodeBias::GPS_L1_CA,
        bias_m: 1.25,
    });
    g01.biases.push(CodeBias {
        signal: CodeBias::GPS_L2_P,
        bias_m: -0.87,
    });

    let mut bytes = Vec::new();
    let frames = SsrEncoder::new().encode_clock_orbit(&clock_orbit).unwrap();
    // combined message holds 28 satellites at most, URA follows
    assert_eq!(frames.len(), 3);
    for frame in frames {
        bytes.extend(frame);
    }
    for frame in SsrEncoder::new().encode_bias(&bias).unwrap() {
        bytes.extend(frame);
    }

    let mut decoder = Decoder::new().with_time_reference(FixedReference(t0()));
    decoder.push(&bytes);

    let decoded = match decoder.next_record() {
        Some(Record::ClockOrbit(clock_orbit)) => clock_orbit,
        other => panic!("expecting orbit and clock corrections, got {:?}", other),
    };
    assert_eq!(decoded.gps.len(), 32);
    assert_eq!(decoded.content(Constellation::GPS), clock_orbit.gps_content);
    assert_eq!(decoded.gps_epoch(t0()), t0());

    for sat in decoded.gps.iter() {
        assert_eq!(sat.iod, sat.sv.prn);
        assert_eq!(sat.ura, sat.sv.prn % 16);
        assert!((sat.orbit.delta_m[2] + 0.5).abs() < 1.0E-9);
        assert!((sat.clock.c0_m - 0.25).abs() < 1.0E-9);
    }

    let decoded = decoder.next_record().unwrap();
    let g01 = decoded
        .as_bias()
        .unwrap()
        .satellite(SV::from_str("G01").unwrap())
        .unwrap();
    assert!((g01.bias(CodeBias::GPS_L1_CA).unwrap() - 1.25).abs() < 1.0E-9);
    assert!((g01.bias(CodeBias::GPS_L2_P).unwrap() + 0.87).abs() < 0.005);
    assert!(decoder.next_record().is_none());
}
