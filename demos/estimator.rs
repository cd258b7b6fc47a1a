use hll_estimator::{BiasCorrection, DurandFlajolet, EstimatorError, HyperLogLog};
use tracing_subscriber::EnvFilter;

/// Number of distinct elements added, overridable with environment variable `N`.
const DEFAULT_CARDINALITY: usize = 100_000;

fn main() -> Result<(), EstimatorError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cardinality = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CARDINALITY);

    let mut names = HyperLogLog::new(16)?;
    for name in ["Sigma Balls", "Ridho", "Rizki", "Juli", "Juli", "Siti"] {
        names.add(name.as_bytes());
    }
    println!("names estimate = {}", names.count());

    let mut fixed = HyperLogLog::new(14)?;
    let mut durand_flajolet =
        HyperLogLog::with_bias_correction(14, BiasCorrection::from(DurandFlajolet))?;
    for i in 0..cardinality {
        let element = format!("item{i}");
        fixed.add(element.as_bytes());
        durand_flajolet.add(element.as_bytes());
    }
    println!(
        "cardinality = {cardinality}, fixed alpha estimate = {}, durand-flajolet alpha estimate = {}, expected error = {:.4}",
        fixed.count(),
        durand_flajolet.count(),
        fixed.standard_error()
    );

    Ok(())
}
