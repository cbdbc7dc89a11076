use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fraudguard::features::{add_basic_features, build_preprocessor, FeatureConfig};
use fraudguard::models::{build_forest_model, build_logreg_model, ForestParams, LogRegParams};
use ndarray::Array1;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const TYPES: [&str; 5] = ["PAYMENT", "CASH_OUT", "TRANSFER", "DEBIT", "CASH_IN"];
const DEVICES: [&str; 4] = ["mobile", "web", "pos-terminal", "atm"];

fn create_transactions(n_rows: usize) -> (DataFrame, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let mut amount = Vec::with_capacity(n_rows);
    let mut kind = Vec::with_capacity(n_rows);
    let mut device = Vec::with_capacity(n_rows);
    let mut time = Vec::with_capacity(n_rows);
    let mut label = Vec::with_capacity(n_rows);

    for _ in 0..n_rows {
        let fraud = rng.gen_bool(0.05);
        let hour = if fraud { rng.gen_range(0..5) } else { rng.gen_range(0..24) };
        amount.push(if fraud { rng.gen_range(2000.0..9000.0) } else { rng.gen_range(5.0..1500.0) });
        kind.push(TYPES[rng.gen_range(0..TYPES.len())]);
        device.push(DEVICES[rng.gen_range(0..DEVICES.len())]);
        time.push(format!("2025-01-{:02} {:02}:30:00", rng.gen_range(1..29), hour));
        label.push(if fraud { 1.0 } else { 0.0 });
    }

    let df = df!(
        "amount" => amount,
        "transaction_type" => kind,
        "device_type" => device,
        "transaction_time" => time
    )
    .unwrap();

    (add_basic_features(&df).unwrap(), Array1::from_vec(label))
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 5000].iter() {
        let (df, y) = create_transactions(*n_rows);
        let (plan, _, _) = build_preprocessor(&df, &FeatureConfig::new()).unwrap();

        group.bench_with_input(BenchmarkId::new("logreg", n_rows), &df, |b, df| {
            b.iter(|| {
                let mut model = build_logreg_model(plan.clone(), &LogRegParams::default());
                model.fit(black_box(df), &y).unwrap();
            })
        });

        group.bench_with_input(BenchmarkId::new("forest", n_rows), &df, |b, df| {
            b.iter(|| {
                let params = ForestParams::default().with_n_estimators(50);
                let mut model = build_forest_model(plan.clone(), &params);
                model.fit(black_box(df), &y).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_proba");

    // Train once
    let (train_df, y) = create_transactions(5000);
    let (plan, _, _) = build_preprocessor(&train_df, &FeatureConfig::new()).unwrap();
    let mut model = build_forest_model(plan, &ForestParams::default().with_n_estimators(50));
    model.fit(&train_df, &y).unwrap();

    for n_rows in [1, 100, 1000].iter() {
        let (df, _) = create_transactions(*n_rows);
        group.bench_with_input(BenchmarkId::new("forest", n_rows), &df, |b, df| {
            b.iter(|| model.predict_proba(black_box(df)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
