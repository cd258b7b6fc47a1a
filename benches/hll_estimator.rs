use std::hash::BuildHasherDefault;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use hyperloglogplus::HyperLogLog as HyperLogLogTrait;
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use wyhash::WyHash;

/// Add and count operations are benchmarked against cardinalities ranging from 0 to
/// `DEFAULT_MAX_CARDINALITY` or environment variable `N` (if defined) with cardinality doubled
/// with every iteration as [0, 1, 2, ..., N].
const DEFAULT_MAX_CARDINALITY: usize = 256;
/// Precision shared by all compared estimators
const PRECISION: u8 = 12;

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf));
    targets = benchmark
}
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let max_cardinality = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CARDINALITY);

    let cardinalities: Vec<usize> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= max_cardinality)
        .collect();

    let mut group = c.benchmark_group("add");
    for &cardinality in &cardinalities {
        group.throughput(Throughput::Elements(cardinality.max(1) as u64));
        bench_add::<HllEstimator>(&mut group, cardinality);
        bench_add::<HyperLogLog>(&mut group, cardinality);
        bench_add::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("count");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_count::<HllEstimator>(&mut group, cardinality);
        bench_count::<HyperLogLog>(&mut group, cardinality);
        bench_count::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    // Relative error table is only written when an output directory is given
    let Ok(bench_results_path) = std::env::var("BENCH_RESULTS_PATH") else {
        return;
    };
    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            hll_estimator: measure_error::<HllEstimator>(cardinality),
            hyperloglog: measure_error::<HyperLogLog>(cardinality),
            hyperloglogplus: measure_error::<HyperLogLogPlus>(cardinality),
        })
        .collect();

    let table_config = Settings::default().with(Style::markdown());
    std::fs::write(
        format!("{}/relative_error.md", bench_results_path),
        Table::new(results).with(table_config).to_string(),
    )
    .unwrap();
}

/// Common operations of the compared estimators
trait Estimator {
    fn new() -> Self;
    fn add(&mut self, element: &[u8]);
    fn count(&mut self) -> u64;
    fn name() -> String;
}

fn bench_add<E: Estimator>(group: &mut BenchmarkGroup<WallTime>, cardinality: usize) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            b.iter(|| {
                let mut estimator = E::new();
                for i in 0..black_box(cardinality) {
                    estimator.add(black_box(&i.to_le_bytes()));
                }
            });
        },
    );
}

fn bench_count<E: Estimator>(group: &mut BenchmarkGroup<WallTime>, cardinality: usize) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            let mut estimator = E::new();
            for i in 0..black_box(cardinality) {
                estimator.add(black_box(&i.to_le_bytes()));
            }
            b.iter(|| estimator.count());
        },
    );
}

fn measure_error<E: Estimator>(cardinality: usize) -> String {
    let n = 100;
    let mut total_relative_error: f64 = 0.0;
    let mut rng = StdRng::seed_from_u64(12345);
    for _ in 0..n {
        let mut estimator = E::new();
        for _ in 0..cardinality {
            estimator.add(&rng.gen::<u64>().to_le_bytes());
        }
        let relative_error = if cardinality == 0 {
            0.0
        } else {
            (estimator.count() as f64 - cardinality as f64).abs() / cardinality as f64
        };
        total_relative_error += relative_error;
    }
    let avg_relative_error = total_relative_error / (n as f64);

    if avg_relative_error < 1.0 {
        format!("{:.4}", avg_relative_error)
    } else {
        format!("{:.2e}", avg_relative_error)
    }
}

#[derive(Tabled)]
struct StatRecord {
    cardinality: usize,
    hll_estimator: String,
    hyperloglog: String,
    hyperloglogplus: String,
}

struct HllEstimator(hll_estimator::HyperLogLog);

impl Estimator for HllEstimator {
    fn new() -> Self {
        Self(hll_estimator::HyperLogLog::new(PRECISION).unwrap())
    }

    fn add(&mut self, element: &[u8]) {
        self.0.add(element);
    }

    fn count(&mut self) -> u64 {
        self.0.count()
    }

    fn name() -> String {
        "hll-estimator".to_string()
    }
}

struct HyperLogLog(hyperloglog::HyperLogLog);

impl Estimator for HyperLogLog {
    fn new() -> Self {
        Self(hyperloglog::HyperLogLog::new(
            hll_estimator::error_for_precision(PRECISION),
        ))
    }

    fn add(&mut self, element: &[u8]) {
        self.0.insert(&element);
    }

    fn count(&mut self) -> u64 {
        self.0.len() as u64
    }

    fn name() -> String {
        "hyperloglog".to_string()
    }
}

struct HyperLogLogPlus(hyperloglogplus::HyperLogLogPlus<Vec<u8>, BuildHasherDefault<WyHash>>);

impl Estimator for HyperLogLogPlus {
    fn new() -> Self {
        Self(
            hyperloglogplus::HyperLogLogPlus::new(PRECISION, BuildHasherDefault::<WyHash>::default())
                .unwrap(),
        )
    }

    fn add(&mut self, element: &[u8]) {
        self.0.insert(element);
    }

    fn count(&mut self) -> u64 {
        self.0.count() as u64
    }

    fn name() -> String {
        "hyperloglogplus".to_string()
    }
}
