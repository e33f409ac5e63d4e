use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use vsync_core::{DisplayMode, DisplayModeId, Nsecs, Resolution, Tunables, VsyncPredictor};

const PERIOD: Nsecs = 16_666_666;

// Generate a synthetic vsync trace: nominal cadence with additive noise
fn synth_vsyncs(n: usize, noise_amp: Nsecs, seed: u32) -> Vec<Nsecs> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next_u32 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    let span = (2 * noise_amp + 1) as u32;
    let mut v = Vec::with_capacity(n);
    for i in 0..n {
        let noise = Nsecs::from(next_u32() % span) - noise_amp;
        v.push((i as Nsecs + 1) * PERIOD + noise);
    }
    v
}

fn tracker() -> VsyncPredictor {
    let mode = DisplayMode::new(DisplayModeId(0), PERIOD, Resolution::new(1920, 1080));
    VsyncPredictor::new(mode, Tunables::default()).unwrap()
}

pub fn bench_hot_path(c: &mut Criterion) {
    let mut g = c.benchmark_group("hot_path");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p vsync_core --bench predictor
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let trace = synth_vsyncs(1_000, 1_600_000, 0xC0FFEE);

    g.bench_function("add_vsync_timestamp", |b| {
        b.iter_batched(
            tracker,
            |t| {
                for &ts in &trace {
                    black_box(t.add_vsync_timestamp(black_box(ts)));
                }
            },
            BatchSize::SmallInput,
        )
    });

    let locked = tracker();
    for &ts in &trace {
        locked.add_vsync_timestamp(ts);
    }
    let last = *trace.last().unwrap();
    g.bench_function("next_anticipated_vsync_time_from", |b| {
        b.iter(|| {
            let mut at = last;
            for _ in 0..100 {
                at = locked.next_anticipated_vsync_time_from(black_box(at), None);
            }
            black_box(at)
        })
    });
    g.finish();
}

criterion_group!(predictor, bench_hot_path);
criterion_main!(predictor);
