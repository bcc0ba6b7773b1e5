//! Period and cumulative returns derived from a price series.

use tracing::trace;

use crate::{IndicatorSeries, Price, Result, Series, error::positive_finite, rolling::aligned};

/// Simple period return `r[i] = p[i] / p[i-1] − 1`.
///
/// Undefined at position 0, and wherever the previous price is zero or
/// either price is undefined.
///
/// # Example
///
/// ```
/// use quantedge_series::{TimeSeries, simple_return};
///
/// let prices = TimeSeries::from_values([100.0, 110.0, 99.0]).unwrap();
/// let returns = simple_return(&prices);
///
/// assert_eq!(returns.values()[0], None);
/// assert!((returns.values()[1].unwrap() - 0.10).abs() < 1e-12);
/// assert!((returns.values()[2].unwrap() + 0.10).abs() < 1e-12);
/// ```
#[must_use]
pub fn simple_return(prices: &impl Series) -> IndicatorSeries {
    trace!(rows = prices.len(), "computing simple returns");

    let mut previous: Option<Price> = None;

    let values = prices
        .iter()
        .map(|price| {
            let ret = match (price, previous) {
                (Some(current), Some(prior)) if prior != 0.0 => Some(current / prior - 1.0),
                _ => None,
            };
            previous = price;
            ret
        })
        .collect();

    aligned(prices, values)
}

/// Compounded return `c[i] = Π(1 + r[j], j ≤ i) − 1`.
///
/// An undefined return contributes the multiplicative identity, so the
/// output is defined from position 0 (where it is 0 for a return series
/// produced by [`simple_return`]).
///
/// # Example
///
/// ```
/// use quantedge_series::{TimeSeries, cumulative_return, simple_return};
///
/// let prices = TimeSeries::from_values([100.0, 50.0, 150.0]).unwrap();
/// let total = cumulative_return(&simple_return(&prices));
///
/// assert_eq!(total.values(), &[Some(0.0), Some(-0.5), Some(0.5)]);
/// ```
#[must_use]
pub fn cumulative_return(returns: &impl Series) -> IndicatorSeries {
    let mut growth = 1.0;

    let values = returns
        .iter()
        .map(|ret| {
            growth *= 1.0 + ret.unwrap_or(0.0);
            Some(growth - 1.0)
        })
        .collect();

    aligned(returns, values)
}

/// Price index rebased so that the first defined price equals `base`.
///
/// `n[i] = p[i] × base / p[first]`. Every position is undefined when the
/// first defined price is zero.
///
/// # Errors
///
/// [`Error::InvalidParameter`](crate::Error::InvalidParameter) when `base`
/// is not positive and finite.
///
/// # Example
///
/// ```
/// use quantedge_series::{TimeSeries, normalized};
///
/// let prices = TimeSeries::from_values([50.0, 55.0, 45.0]).unwrap();
/// let index = normalized(&prices, 100.0).unwrap();
///
/// assert_eq!(index.values(), &[Some(100.0), Some(110.0), Some(90.0)]);
/// ```
pub fn normalized(prices: &impl Series, base: f64) -> Result<IndicatorSeries> {
    let base = positive_finite("base", base)?;
    let first = prices.iter().flatten().next().filter(|first| *first != 0.0);

    let values = prices
        .iter()
        .map(|price| Some(price? * base / first?))
        .collect();

    Ok(aligned(prices, values))
}
