use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rtcm3::prelude::*;
use std::str::FromStr;

fn gps_ephemeris(prn: u8) -> BroadcastEphemeris {
    GPSEphemeris {
        sv: SV::new(Constellation::GPS, prn),
        week: 2300,
        iode: prn,
        iodc: prn as u16,
        toe_s: 302_400.0,
        toc_s: 302_400.0,
        sqrt_a: 5153.6,
        e: 0.01,
        i0: 0.96,
        m0: prn as f64 * 0.1,
        ..Default::default()
    }
    .into()
}

fn clock_orbit() -> ClockOrbit {
    let mut clock_orbit = ClockOrbit {
        gps_epoch_s: 302_400,
        gps_content: SsrContent::ORBIT | SsrContent::CLOCK,
        ..Default::default()
    };
    for prn in 1..=32 {
        if let Ok(sat) = clock_orbit.satellite_mut(SV::new(Constellation::GPS, prn)) {
            sat.iod = prn;
            sat.orbit.delta_m = [0.1, -0.2, 0.3];
            sat.clock.c0_m = 0.5;
        }
    }
    clock_orbit
}

#[allow(unused_must_use)]
pub fn criterion_benchmark(c: &mut Criterion) {
    let t0 = Epoch::from_str("2024-02-07T12:00:00 GPST").unwrap();

    let frame = gps_ephemeris(1).encode().unwrap();

    c.bench_function("decoding-frame", |b| {
        b.iter(|| {
            black_box(Frame::decode(&frame).unwrap());
        })
    });

    let (decoded, _) = Frame::decode(&frame).unwrap();
    c.bench_function("decoding-1019", |b| {
        b.iter(|| {
            black_box(BroadcastEphemeris::decode(&decoded, t0).unwrap());
        })
    });

    let mut stream = vec![0x00; 64];
    for prn in 1..=32 {
        stream.extend(gps_ephemeris(prn).encode().unwrap());
    }

    c.bench_function("decoding-stream", |b| {
        b.iter(|| {
            let mut decoder = Decoder::new()
                .with_time_reference(FixedReference(t0))
                .with_ephemeris_retention(false);
            decoder.push(&stream);
            while let Some(record) = decoder.next_record() {
                black_box(record);
            }
        })
    });

    let mut ssr = Vec::new();
    for frame in SsrEncoder::new().encode_clock_orbit(&clock_orbit()).unwrap() {
        ssr.extend(frame);
    }

    c.bench_function("decoding-ssr", |b| {
        b.iter(|| {
            let mut decoder = SsrDecoder::new();
            let mut offset = 0;
            while offset < ssr.len() {
                let (_, size, record) = decoder.decode(&ssr[offset..]);
                black_box(record);
                offset += size.max(1);
            }
        })
    });

    let eph = gps_ephemeris(1);
    c.bench_function("kepler-state", |b| {
        b.iter(|| {
            black_box(eph.satellite_state(t0).unwrap());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
