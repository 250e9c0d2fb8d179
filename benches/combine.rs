use criterion::{criterion_group, criterion_main, Criterion};
use tdiff_path::dataset::alignment::reduce_to_common_length;
use tdiff_path::dataset::combine::combine;
use tdiff_path::dataset::phase::wrap_degree;
use tdiff_path::dataset::{ArrayGroup, Channel, ChannelSet};
use tdiff_path::fitting::par_fit_channels;

fn sweep(points: i64, offset_deg: f64) -> Channel {
    let step = 12_000_000 / points;
    let freqs: Vec<i64> = (0..points).map(|i| 8_000_000 + i * step).collect();
    let phase = freqs
        .iter()
        .map(|&f| wrap_degree(f as f64 * 1e-5 + offset_deg))
        .collect();
    Channel::new(freqs)
        .expect("Could not build axis")
        .with_magnitude_db(vec![-2.0; points as usize])
        .expect("Could not set magnitude")
        .with_phase_deg(phase)
        .expect("Could not set phase")
}

/// A 16 antenna main array and 4 antenna interferometer, half recorded at twice the density.
fn receiver() -> ChannelSet {
    let mut set = ChannelSet::new();
    for i in 0..16 {
        set.insert(format!("M{i:02}"), sweep(if i % 2 == 0 { 400 } else { 800 }, i as f64));
    }
    for i in 0..4 {
        set.insert(format!("I{i}"), sweep(800, 5.0 + i as f64));
    }
    set
}

fn criterion_benchmark(c: &mut Criterion) {
    let raw = receiver();
    let aligned = reduce_to_common_length(&raw).expect("Could not align channels");

    c.bench_function("Align", |b| b.iter(|| reduce_to_common_length(&raw)));
    c.bench_function("Combine main array", |b| {
        b.iter(|| combine(&aligned, |name| ArrayGroup::Main.contains(name)))
    });
    c.bench_function("Parallel fits", |b| b.iter(|| par_fit_channels(&aligned)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
