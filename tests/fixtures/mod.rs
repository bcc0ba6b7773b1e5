#![allow(dead_code)]

use quantedge_series::{IndicatorSeries, OhlcvBar, Timestamp};
use serde::{Deserialize, de::DeserializeOwned};

/// Reference value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    pub timestamp: Timestamp,
    pub expected: f64,
}

/// Reference Bollinger bands with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefBbValue {
    pub timestamp: Timestamp,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Reference MACD components with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefMacdValue {
    pub timestamp: Timestamp,
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Reference return columns. `simple` is empty on the first row.
#[derive(Debug, Deserialize)]
pub struct RefReturns {
    pub timestamp: Timestamp,
    pub simple: Option<f64>,
    pub cumulative: f64,
    pub drawdown: f64,
}

/// Whole-period reference metrics.
#[derive(Debug, Deserialize)]
pub struct RefRiskSummary {
    pub total_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

const OHLCV_PATH: &str = "tests/fixtures/data/ohlcv-daily.csv";

/// Load the reference daily bars.
pub fn load_reference_ohlcvs() -> Vec<OhlcvBar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

/// Load single-value reference data (SMA, EMA, RSI, volatility).
pub fn load_ref_values(path: &str) -> Vec<RefValue> {
    load_records(path, "invalid reference record")
}

/// Load BB reference data (upper, middle, lower).
pub fn load_bb_ref(path: &str) -> Vec<RefBbValue> {
    load_records(path, "invalid BB reference record")
}

/// Load MACD reference data (line, signal, histogram).
pub fn load_macd_ref(path: &str) -> Vec<RefMacdValue> {
    load_records(path, "invalid MACD reference record")
}

pub fn load_returns_ref(path: &str) -> Vec<RefReturns> {
    load_records(path, "invalid returns reference record")
}

pub fn load_risk_summary_ref(path: &str) -> RefRiskSummary {
    load_records(path, "invalid risk summary record")
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("{path} has no rows"))
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Asserts `series` is defined exactly on the reference timestamps and
/// matches every reference value.
pub fn assert_matches_reference(
    name: &str,
    series: &IndicatorSeries,
    reference: &[RefValue],
    tolerance: f64,
) {
    let defined: Vec<_> = series.defined().collect();

    assert_eq!(
        defined.len(),
        reference.len(),
        "{name}: {} defined values, {} reference values",
        defined.len(),
        reference.len()
    );

    for (i, ((timestamp, value), expected)) in defined.iter().zip(reference).enumerate() {
        assert_eq!(*timestamp, expected.timestamp, "{name}: timestamp at {i}");
        assert_near(
            *value,
            expected.expected,
            tolerance,
            &format!("{name} at {i} (t={timestamp})"),
        );
    }
}

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
