//! Risk metrics over return and price series.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Error, IndicatorSeries, Price, Result, Series, Window,
    error::positive_finite,
    expanding_max,
    returns::{cumulative_return, simple_return},
    rolling::{aligned, std_values},
};

/// Trading days in a year, the default annualization factor for daily data.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Rolling volatility `rolling_std(returns, window) × √annualization_factor`.
///
/// Non-negative wherever defined; undefined on the first `window - 1`
/// positions and wherever the window holds an undefined return.
///
/// # Errors
///
/// - [`Error::InvalidWindow`] when `window` is zero.
/// - [`Error::InvalidParameter`] when `annualization_factor` is not positive
///   and finite.
pub fn realized_volatility(
    returns: &impl Series,
    window: usize,
    annualization_factor: f64,
) -> Result<IndicatorSeries> {
    let window = Window::new(window)?;
    let scale = positive_finite("annualization_factor", annualization_factor)?.sqrt();

    let values = std_values(returns.iter(), window)
        .into_iter()
        .map(|std| std.map(|std| std * scale))
        .collect();

    Ok(aligned(returns, values))
}

/// Annualized Sharpe ratio of a return series.
///
/// ```text
/// annualized_return = (mean(returns) − risk_free_rate) × A
/// annualized_std    = std(returns) × √A
/// sharpe            = annualized_return / annualized_std
/// ```
///
/// `std` is the population standard deviation of the defined returns.
/// When there are no defined returns or the deviation is zero the ratio is
/// `0.0`; the result is never NaN or infinite.
///
/// # Errors
///
/// [`Error::InvalidParameter`] when `risk_free_rate` is not finite or
/// `annualization_factor` is not positive and finite.
///
/// # Example
///
/// ```
/// use quantedge_series::{TRADING_DAYS_PER_YEAR, TimeSeries, sharpe_ratio};
///
/// let returns = TimeSeries::from_values([0.01, -0.005, 0.02, 0.0]).unwrap();
/// let sharpe = sharpe_ratio(&returns, 0.0, TRADING_DAYS_PER_YEAR).unwrap();
/// assert!(sharpe > 0.0);
///
/// let flat = TimeSeries::from_values([0.0, 0.0, 0.0]).unwrap();
/// assert_eq!(sharpe_ratio(&flat, 0.0, TRADING_DAYS_PER_YEAR).unwrap(), 0.0);
/// ```
pub fn sharpe_ratio(
    returns: &impl Series,
    risk_free_rate: f64,
    annualization_factor: f64,
) -> Result<f64> {
    let risk_free_rate = finite("risk_free_rate", risk_free_rate)?;
    let annualization_factor = positive_finite("annualization_factor", annualization_factor)?;

    let defined: Vec<f64> = returns.iter().flatten().collect();
    let Some((mean, std)) = population_moments(&defined) else {
        return Ok(0.0);
    };

    let annualized_return = (mean - risk_free_rate) * annualization_factor;
    let annualized_std = std * annualization_factor.sqrt();

    if annualized_std > 0.0 {
        let ratio = annualized_return / annualized_std;
        Ok(if ratio.is_finite() { ratio } else { 0.0 })
    } else {
        Ok(0.0)
    }
}

/// Relative decline from the running peak, `p[i] / max(p[..=i]) − 1`.
///
/// Always `<= 0` where defined. Undefined where the price is undefined or the
/// running peak is not positive.
#[must_use]
pub fn drawdown(prices: &impl Series) -> IndicatorSeries {
    let peaks = expanding_max(prices);

    let values = prices
        .iter()
        .zip(peaks.values())
        .map(|(price, peak)| match (price, *peak) {
            (Some(price), Some(peak)) if peak > 0.0 => Some((price / peak - 1.0).min(0.0)),
            _ => None,
        })
        .collect();

    aligned(prices, values)
}

/// Largest drawdown, the minimum of [`drawdown`].
///
/// `Some(0.0)` for non-decreasing prices, `None` when no drawdown position is
/// defined.
///
/// # Example
///
/// ```
/// use quantedge_series::{TimeSeries, max_drawdown};
///
/// let prices = TimeSeries::from_values([100.0, 110.0, 105.0, 120.0, 115.0]).unwrap();
/// let worst = max_drawdown(&prices).unwrap();
///
/// // 110 → 105
/// assert!((worst - (105.0 / 110.0 - 1.0)).abs() < 1e-12);
/// ```
#[must_use]
pub fn max_drawdown(prices: &impl Series) -> Option<f64> {
    drawdown(prices)
        .values()
        .iter()
        .flatten()
        .copied()
        .reduce(f64::min)
}

/// Parameters for [`RiskSummary`].
///
/// Deserializes from a partial document, missing fields take their
/// defaults:
///
/// ```
/// use quantedge_series::RiskConfig;
///
/// let config: RiskConfig = serde_json::from_str(r#"{"risk_free_rate": 0.0001}"#).unwrap();
/// assert_eq!(config.annualization_factor, 252.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Per-period risk-free rate subtracted from the mean return.
    pub risk_free_rate: f64,
    /// Periods per year: 252 for daily bars, 52 weekly, 12 monthly.
    pub annualization_factor: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            annualization_factor: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl RiskConfig {
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for a non-finite risk-free rate or an
    /// annualization factor that is not positive and finite.
    pub fn validate(&self) -> Result<()> {
        finite("risk_free_rate", self.risk_free_rate)?;
        positive_finite("annualization_factor", self.annualization_factor)?;
        Ok(())
    }
}

/// Whole-period performance and risk of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskSummary {
    /// Last cumulative return; `None` for an empty series.
    pub total_return: Option<f64>,
    /// Sample deviation of period returns, annualized; `None` with fewer
    /// than two defined returns.
    pub annualized_volatility: Option<f64>,
    /// See [`sharpe_ratio`].
    pub sharpe_ratio: f64,
    /// See [`max_drawdown`].
    pub max_drawdown: Option<f64>,
}

impl RiskSummary {
    /// # Errors
    ///
    /// Any error of [`RiskConfig::validate`].
    ///
    /// # Example
    ///
    /// ```
    /// use quantedge_series::{RiskConfig, RiskSummary, TimeSeries};
    ///
    /// let prices = TimeSeries::from_values([100.0, 110.0, 105.0, 120.0]).unwrap();
    /// let summary = RiskSummary::from_prices(&prices, &RiskConfig::default()).unwrap();
    ///
    /// assert!((summary.total_return.unwrap() - 0.2).abs() < 1e-12);
    /// assert!(summary.max_drawdown.unwrap() < 0.0);
    /// ```
    pub fn from_prices(prices: &impl Series, config: &RiskConfig) -> Result<Self> {
        config.validate()?;

        let returns = simple_return(prices);
        let defined: Vec<f64> = returns.iter().flatten().collect();

        let summary = Self {
            total_return: cumulative_return(&returns).last(),
            annualized_volatility: sample_std(&defined)
                .map(|std| std * config.annualization_factor.sqrt()),
            sharpe_ratio: sharpe_ratio(
                &returns,
                config.risk_free_rate,
                config.annualization_factor,
            )?,
            max_drawdown: max_drawdown(prices),
        };

        debug!(
            rows = prices.len(),
            total_return = ?summary.total_return,
            sharpe_ratio = summary.sharpe_ratio,
            "risk summary computed"
        );

        Ok(summary)
    }
}

fn finite(parameter: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::invalid_parameter(
            parameter,
            format!("must be finite, got {value}"),
        ))
    }
}

/// Mean and population standard deviation, two-pass. Identical values have
/// exactly zero deviation.
fn population_moments(values: &[Price]) -> Option<(f64, f64)> {
    let &first = values.first()?;
    if is_constant(values) {
        return Some((first, 0.0));
    }

    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some((mean, variance.sqrt()))
}

fn sample_std(values: &[Price]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    if is_constant(values) {
        return Some(0.0);
    }

    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Some(variance.sqrt())
}

#[allow(clippy::float_cmp)]
fn is_constant(values: &[Price]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_close, assert_defined, partial, series};

    mod volatility {
        use super::*;

        #[test]
        fn scales_rolling_std() {
            // [0.01, 0.03]: sample σ = √0.0002
            let vol = realized_volatility(&series(&[0.01, 0.03]), 2, 252.0).unwrap();
            assert_close(assert_defined(vol.values()[1]), (0.0002_f64 * 252.0).sqrt());
        }

        #[test]
        fn undefined_before_window() {
            let vol = realized_volatility(&series(&[0.01, 0.02, 0.03]), 3, 252.0).unwrap();
            assert_eq!(vol.first_defined(), Some(2));
        }

        #[test]
        fn non_negative_where_defined() {
            let returns = series(&[0.01, -0.02, 0.015, -0.005, 0.0, 0.03, -0.01, 0.02]);
            let vol = realized_volatility(&returns, 3, TRADING_DAYS_PER_YEAR).unwrap();
            assert!(vol.defined().all(|(_, v)| v >= 0.0));
        }

        #[test]
        fn rejects_invalid_parameters() {
            let returns = series(&[0.01]);
            assert!(matches!(
                realized_volatility(&returns, 0, 252.0),
                Err(Error::InvalidWindow { .. })
            ));
            assert!(matches!(
                realized_volatility(&returns, 2, -1.0),
                Err(Error::InvalidParameter { parameter: "annualization_factor", .. })
            ));
        }
    }

    mod sharpe {
        use super::*;

        #[test]
        fn matches_population_formula() {
            // mean 0.02, population σ = 0.01
            let returns = series(&[0.01, 0.03]);
            let sharpe = sharpe_ratio(&returns, 0.0, 252.0).unwrap();
            assert_close(sharpe, 0.02 * 252.0 / (0.01 * 252.0_f64.sqrt()));
        }

        #[test]
        fn subtracts_risk_free_rate() {
            let returns = series(&[0.01, 0.03]);
            let sharpe = sharpe_ratio(&returns, 0.02, 252.0).unwrap();
            assert!(sharpe.abs() < 1e-9);
        }

        #[test]
        fn zero_deviation_is_zero() {
            assert_eq!(sharpe_ratio(&series(&[0.5, 0.5, 0.5]), 0.0, 252.0).unwrap(), 0.0);
        }

        #[test]
        fn identical_nonzero_returns_have_zero_deviation() {
            assert_eq!(sharpe_ratio(&series(&[0.1; 3]), 0.0, 252.0).unwrap(), 0.0);
            assert_eq!(sharpe_ratio(&series(&[0.001; 250]), 0.0, 252.0).unwrap(), 0.0);
            assert_eq!(population_moments(&[0.1; 3]), Some((0.1, 0.0)));
            assert_eq!(sample_std(&[0.1; 3]), Some(0.0));
        }

        #[test]
        fn no_returns_is_zero() {
            assert_eq!(sharpe_ratio(&series(&[]), 0.0, 252.0).unwrap(), 0.0);
            assert_eq!(sharpe_ratio(&partial(&[None, None]), 0.0, 252.0).unwrap(), 0.0);
        }

        #[test]
        fn ignores_undefined_returns() {
            let with_gap = partial(&[None, Some(0.01), None, Some(0.03)]);
            let dense = series(&[0.01, 0.03]);
            assert_eq!(
                sharpe_ratio(&with_gap, 0.0, 252.0).unwrap(),
                sharpe_ratio(&dense, 0.0, 252.0).unwrap()
            );
        }

        #[test]
        fn rejects_non_finite_risk_free_rate() {
            assert!(matches!(
                sharpe_ratio(&series(&[0.01]), f64::NAN, 252.0),
                Err(Error::InvalidParameter { parameter: "risk_free_rate", .. })
            ));
        }
    }

    mod drawdowns {
        use super::*;

        const PRICES: [f64; 8] = [100.0, 110.0, 105.0, 120.0, 115.0, 130.0, 125.0, 140.0];

        #[test]
        fn max_drawdown_of_reference_path() {
            let worst = max_drawdown(&series(&PRICES)).unwrap();
            assert!((worst - (-0.0455)).abs() < 0.001);
            assert_close(worst, 105.0 / 110.0 - 1.0);
        }

        #[test]
        fn non_decreasing_prices_have_zero_drawdown() {
            assert_eq!(max_drawdown(&series(&[1.0, 1.0, 2.0, 3.0])), Some(0.0));
        }

        #[test]
        fn drawdown_series_is_non_positive() {
            let dd = drawdown(&series(&PRICES));
            assert_eq!(dd.values()[0], Some(0.0));
            assert!(dd.defined().all(|(_, v)| v <= 0.0));
            assert_eq!(dd.len(), PRICES.len());
        }

        #[test]
        fn empty_or_undefined_is_none() {
            assert_eq!(max_drawdown(&series(&[])), None);
            assert_eq!(max_drawdown(&partial(&[None, None])), None);
        }

        #[test]
        fn zero_peak_is_undefined() {
            let dd = drawdown(&series(&[0.0, 0.0, 1.0]));
            assert_eq!(dd.values(), &[None, None, Some(0.0)]);
        }
    }

    mod summary {
        use super::*;

        #[test]
        fn summarizes_price_path() {
            let prices = series(&[100.0, 110.0, 105.0, 120.0, 115.0, 130.0, 125.0, 140.0]);
            let summary = RiskSummary::from_prices(&prices, &RiskConfig::default()).unwrap();

            assert_close(assert_defined(summary.total_return), 0.4);
            assert!(assert_defined(summary.annualized_volatility) > 0.0);
            assert!(summary.sharpe_ratio > 0.0);
            assert_close(assert_defined(summary.max_drawdown), 105.0 / 110.0 - 1.0);
        }

        #[test]
        fn single_price_has_no_volatility() {
            let summary =
                RiskSummary::from_prices(&series(&[100.0]), &RiskConfig::default()).unwrap();
            assert_eq!(summary.total_return, Some(0.0));
            assert_eq!(summary.annualized_volatility, None);
            assert_eq!(summary.sharpe_ratio, 0.0);
            assert_eq!(summary.max_drawdown, Some(0.0));
        }

        #[test]
        fn invalid_config_is_rejected() {
            let config = RiskConfig {
                annualization_factor: 0.0,
                ..RiskConfig::default()
            };
            assert!(RiskSummary::from_prices(&series(&[1.0, 2.0]), &config).is_err());
        }

        #[test]
        fn serializes_to_json() {
            let summary = RiskSummary {
                total_return: Some(0.5),
                annualized_volatility: None,
                sharpe_ratio: 1.25,
                max_drawdown: Some(-0.25),
            };
            assert_eq!(
                serde_json::to_string(&summary).unwrap(),
                r#"{"total_return":0.5,"annualized_volatility":null,"sharpe_ratio":1.25,"max_drawdown":-0.25}"#
            );
        }

        #[test]
        fn config_defaults_from_empty_document() {
            let config: RiskConfig = serde_json::from_str("{}").unwrap();
            assert_eq!(config, RiskConfig::default());
        }
    }
}
