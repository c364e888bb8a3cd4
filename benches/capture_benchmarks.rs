use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use live_capture::{
    DeviceEvent, Pattern, PatternBank, Recorder, SessionConfig, SharedTransport, Target, Tempo,
    TimedDeviceEvent, create_notification_channel, quantize,
};
use live_capture::clock::StepClock;
use std::sync::Arc;

/// Benchmark the quantizer (runs on every note-on)
fn bench_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize");

    for strength in [0.0, 0.5, 1.0] {
        group.bench_with_input(
            BenchmarkId::from_parameter(strength),
            &strength,
            |b, &strength| {
                b.iter(|| {
                    for i in 0..512 {
                        black_box(quantize(black_box(i as f64 * 0.37), strength, 1.0));
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark clock reconciliation (runs on every event and feedback tick)
fn bench_clock_reconciliation(c: &mut Criterion) {
    let clock = StepClock::new(0.0, Some(0.0), Tempo::new(120.0), 4);

    c.bench_function("clock_current_step", |b| {
        b.iter(|| {
            for i in 0..512 {
                black_box(clock.current_step(Some(i as f64 * 0.001), None));
            }
        });
    });
}

/// Benchmark a full note-on/note-off round trip through the recorder
fn bench_note_round_trip(c: &mut Criterion) {
    let transport = SharedTransport::new(120.0);
    transport.set_audio_clock(0.0);

    let mut pattern = Pattern::new_default(1, "Bench".to_string());
    pattern.add_instrument(7);
    let mut bank = PatternBank::new();
    bank.insert(pattern);

    let (tx, _rx) = create_notification_channel(1024);
    let mut recorder = Recorder::new(Arc::clone(&transport), tx);
    recorder
        .start(
            SessionConfig::default(),
            Target {
                pattern: 1,
                instrument: 7,
            },
        )
        .unwrap();

    c.bench_function("note_on_off", |b| {
        let mut t = 0.0;
        b.iter(|| {
            t += 0.01;
            recorder.handle_event(
                TimedDeviceEvent::new(
                    DeviceEvent::NoteOn {
                        pitch: 60,
                        velocity: 100,
                    },
                    Some(t),
                ),
                &mut bank,
            );
            recorder.handle_event(
                TimedDeviceEvent::new(DeviceEvent::NoteOff { pitch: 60 }, Some(t + 0.005)),
                &mut bank,
            );
        });
    });
}

criterion_group!(
    benches,
    bench_quantize,
    bench_clock_reconciliation,
    bench_note_round_trip
);
criterion_main!(benches);
