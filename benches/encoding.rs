use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rtcm3::prelude::*;
use std::str::FromStr;

#[allow(unused_must_use)]
pub fn criterion_benchmark(c: &mut Criterion) {
    let t0 = Epoch::from_str("2024-02-07T12:00:00 GPST").unwrap();

    let gps = BroadcastEphemeris::from(GPSEphemeris {
        sv: SV::new(Constellation::GPS, 1),
        week: 2300,
        toe_s: 302_400.0,
        toc_s: 302_400.0,
        sqrt_a: 5153.6,
        e: 0.01,
        ..Default::default()
    });

    c.bench_function("encoding-1019", |b| {
        b.iter(|| {
            black_box(gps.encode().unwrap());
        })
    });

    let glonass = BroadcastEphemeris::from(
        GlonassEphemeris {
            sv: SV::new(Constellation::Glonass, 1),
            x_km: 12_000.0,
            y_km: -15_000.0,
            z_km: 15_000.0,
            ..Default::default()
        }
        .with_toe(t0),
    );

    c.bench_function("encoding-1020", |b| {
        b.iter(|| {
            black_box(glonass.encode().unwrap());
        })
    });

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

    let encoder = SsrEncoder::new();
    c.bench_function("encoding-ssr", |b| {
        b.iter(|| {
            black_box(encoder.encode_clock_orbit(&clock_orbit).unwrap());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
