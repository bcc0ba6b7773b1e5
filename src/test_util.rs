// src/test_util.rs

use std::sync::Arc;

use crate::{IndicatorSeries, OhlcvBar, Price, TimeSeries, Timestamp};

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() < e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

/// Unwraps a position expected to be defined.
#[track_caller]
pub fn assert_defined(value: Option<Price>) -> Price {
    value.unwrap_or_else(|| panic!("expected a defined value, got None"))
}

/// Fully defined series indexed by position.
pub fn series(values: &[Price]) -> TimeSeries {
    TimeSeries::from_values(values.to_vec()).unwrap()
}

/// Series with undefined positions, indexed by position.
pub fn partial(values: &[Option<Price>]) -> IndicatorSeries {
    let index: Arc<[Timestamp]> = (0..values.len() as Timestamp).collect();
    IndicatorSeries::new(index, values.to_vec())
}

/// Flat bar: open, high, low, and close all equal to `close`.
pub fn bar(close: f64, time: u64) -> OhlcvBar {
    OhlcvBar::new(time, close, close, close, close, 1.0)
}

/// Flat bars at timestamps `1, 2, 3, ...`.
pub fn bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .zip(1..)
        .map(|(&close, time)| bar(close, time))
        .collect()
}

/// Asserts `actual` is within `1e-9` of `expected`, for values built from
/// several rounded operations.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "assert_close failed: actual={actual}, expected={expected}"
    );
}
