//! Quickstart example demonstrating basic usage of anofox-tsa.
//!
//! Run with: RUST_LOG=debug cargo run --example quickstart

use anofox_tsa::core::{Column, SeriesPreparer, Table};
use anofox_tsa::models::arima::{ArimaEstimator, ModelSpec, DEFAULT_CONFIDENCE_LEVEL};
use anofox_tsa::seasonality::Decomposer;
use anofox_tsa::validation::StationarityTester;

fn main() {
    env_logger::init();
    println!("=== anofox-tsa Quickstart ===\n");

    // 1. A monthly table as a loader would hand it over
    let dates: Vec<String> = (0..96)
        .map(|i| format!("{}-{:02}-01", 2016 + i / 12, i % 12 + 1))
        .collect();
    let values: Vec<f64> = (0..96)
        .map(|i| {
            200.0                                                         // base level
            + 1.5 * i as f64                                              // linear trend
            + 25.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin() // yearly pattern
            + 4.0 * ((i * 37 % 11) as f64 - 5.0) / 5.0                    // noise
        })
        .collect();
    let table = Table::new()
        .with_column("month", Column::Text(dates))
        .with_column("sales", Column::Numeric(values));

    let series = match SeriesPreparer::new().prepare_table(&table, "month", "sales") {
        Ok(series) => series,
        Err(e) => {
            eprintln!("cannot prepare series: {}", e);
            return;
        }
    };
    println!(
        "Prepared {} observations, frequency {:?}",
        series.len(),
        series.frequency()
    );

    // 2. Classical decomposition
    println!("\n--- Decomposition (period 12) ---");
    let decomposition = Decomposer::new(12).decompose(&series).unwrap();
    println!("Seasonal figure:");
    for (phase, effect) in decomposition.seasonal_figure.iter().enumerate() {
        println!("  month {:>2}: {:+.2}", phase + 1, effect);
    }
    println!("Seasonal strength: {:.3}", decomposition.seasonal_strength());
    println!("Trend strength:    {:.3}", decomposition.trend_strength());

    // 3. Stationarity
    println!("\n--- Augmented Dickey-Fuller ---");
    let adf = StationarityTester::default().test(&series).unwrap();
    println!("Statistic: {:.4} (lag {})", adf.statistic, adf.used_lag);
    println!("p-value:   {:.4}", adf.p_value);
    println!(
        "Critical values: 1% {:.3}, 5% {:.3}, 10% {:.3}",
        adf.critical_values.cv_1pct, adf.critical_values.cv_5pct, adf.critical_values.cv_10pct
    );
    println!(
        "Verdict: {}",
        if adf.is_stationary() { "stationary" } else { "non-stationary" }
    );

    // 4. Seasonal ARIMA
    let spec = ModelSpec::new(1, 1, 1)
        .unwrap()
        .with_seasonal(0, 1, 1, 12)
        .unwrap();
    println!("\n--- Fitting {} ---", spec);
    let model = ArimaEstimator::new(spec).fit(&series).unwrap();

    println!("AR coefficients: {:?}", model.ar());
    println!("MA coefficients: {:?}", model.ma());
    println!("Seasonal MA:     {:?}", model.seasonal_ma());
    println!("sigma^2: {:.4}", model.sigma2());
    println!("Log-likelihood: {:.2}", model.log_likelihood());
    println!("AIC: {:.2}  AICc: {:.2}  BIC: {:.2}", model.aic(), model.aicc(), model.bic());
    println!("Converged: {} after {} iterations", model.converged(), model.iterations());

    let lb = model.ljung_box(12).unwrap();
    println!("Ljung-Box Q(12) = {:.3}, p = {:.3}", lb.statistic, lb.p_value);

    // 5. Forecast with intervals
    println!("\n--- Forecast with 95% Prediction Intervals ---");
    let forecast = model.forecast(12, DEFAULT_CONFIDENCE_LEVEL).unwrap();
    for point in forecast.iter() {
        println!(
            "  {}: {:.2} [{:.2}, {:.2}]",
            point.timestamp.format("%Y-%m"),
            point.point,
            point.lower,
            point.upper
        );
    }

    println!("\n=== Done ===");
}
