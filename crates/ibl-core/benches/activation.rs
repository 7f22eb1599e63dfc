//! Benchmarks for the activation hot path.
//!
//! Tests performance of:
//! - Exact and optimized-learning base-level activation
//! - Logistic noise draws
//! - Retrieval probability / blended value over growing candidate sets

#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ibl_core::activation::{
	base_level_activation, base_level_activation_optimized, blended_value, logistic_noise,
	retrieval_probabilities,
};
use rand::Rng;

fn generate_occurrences(count: usize, now: u64) -> Vec<u64> {
	let mut rng = rand::thread_rng();
	(0..count).map(|_| rng.gen_range(0..now)).collect()
}

fn bench_base_level_exact(c: &mut Criterion) {
	let mut group = c.benchmark_group("base_level_exact");
	let now = 10_000;

	for count in &[1, 5, 20, 100, 500] {
		let occurrences = generate_occurrences(*count, now);
		let _ = group.throughput(Throughput::Elements(*count as u64));
		let _ = group.bench_with_input(BenchmarkId::new("occurrences", count), count, |bench, _| {
			bench.iter(|| base_level_activation(black_box(&occurrences), black_box(now), black_box(0.5)));
		});
	}

	group.finish();
}

fn bench_base_level_optimized(c: &mut Criterion) {
	let mut group = c.benchmark_group("base_level_optimized");
	let now = 10_000;

	let _ = group.bench_function("single", |bench| {
		bench.iter(|| {
			base_level_activation_optimized(black_box(40), black_box(5_000.0), black_box(now), black_box(0.5))
		});
	});

	group.finish();
}

fn bench_logistic_noise(c: &mut Criterion) {
	let mut group = c.benchmark_group("logistic_noise");
	let mut rng = rand::thread_rng();

	let _ = group.bench_function("draw", |bench| {
		bench.iter(|| logistic_noise(black_box(0.25), &mut rng));
	});

	group.finish();
}

fn bench_blend(c: &mut Criterion) {
	let mut group = c.benchmark_group("blend");

	for count in &[2, 10, 50, 200, 1000] {
		let activations: Vec<f64> = (0..*count).map(|i| f64::from(i) * 0.01).collect();
		let outcomes: Vec<f64> = (0..*count).map(f64::from).collect();

		let _ = group.throughput(Throughput::Elements(*count as u64));
		let _ = group.bench_with_input(BenchmarkId::new("candidates", count), count, |bench, _| {
			bench.iter(|| {
				let probs = retrieval_probabilities(black_box(&activations), black_box(1.0));
				blended_value(black_box(&outcomes), &probs)
			});
		});
	}

	group.finish();
}

criterion_group!(
	benches,
	bench_base_level_exact,
	bench_base_level_optimized,
	bench_logistic_noise,
	bench_blend,
);
criterion_main!(benches);
