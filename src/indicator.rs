use crate::{Ohlcv, PriceSource, Result, Series, TimeSeries};

use std::{
    fmt::{Debug, Display},
    hash::Hash,
    num::NonZero,
};

/// Configuration for a technical [`Indicator`].
///
/// Every indicator has a corresponding config type that holds its parameters
/// (length, price source, etc). Configs are value types: cheap to clone,
/// compare, and hash.
pub trait IndicatorConfig: Sized + PartialEq + Eq + Hash + Display + Debug {
    /// Builder type for constructing this config.
    type Builder: IndicatorConfigBuilder<Self>;

    /// Returns a new builder with default values.
    fn builder() -> Self::Builder;

    /// Primary window length (number of observations).
    fn length(&self) -> usize;

    /// Price source extracted from each bar by
    /// [`compute_bars`](Indicator::compute_bars).
    fn source(&self) -> &PriceSource;
}

/// Builder for an [`IndicatorConfig`].
pub trait IndicatorConfigBuilder<Config>
where
    Config: IndicatorConfig,
{
    /// Sets the indicator window length.
    #[must_use]
    fn length(self, length: NonZero<usize>) -> Self;

    /// Sets the price source.
    #[must_use]
    fn source(self, source: PriceSource) -> Self;

    /// Builds the config.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidWindow`](crate::Error::InvalidWindow) when a required
    /// length is missing or the lengths are inconsistent, and
    /// [`Error::InvalidParameter`](crate::Error::InvalidParameter) for other
    /// out-of-domain parameters.
    fn build(self) -> Result<Config>;
}

/// A batch technical indicator.
///
/// An indicator is an immutable, configured computation: the same value may
/// be applied to any number of series, from any number of threads. Output is
/// aligned 1:1 with the input index; positions without enough history are
/// undefined.
///
/// # Example
///
/// ```
/// use quantedge_series::{Indicator, OhlcvBar, Sma, SmaConfig};
/// use std::num::NonZero;
///
/// let bars: Vec<OhlcvBar> = [10.0, 20.0, 30.0]
///     .iter()
///     .zip(1..)
///     .map(|(&c, t)| OhlcvBar::new(t, c, c, c, c, 1.0))
///     .collect();
///
/// let sma = Sma::new(SmaConfig::close(NonZero::new(3).unwrap()));
/// let out = sma.compute_bars(&bars).unwrap();
///
/// assert_eq!(out.values(), &[None, None, Some(20.0)]);
/// ```
pub trait Indicator: Sized + Clone + Display + Debug + Send + Sync {
    /// Configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Computed output type. An [`IndicatorSeries`](crate::IndicatorSeries)
    /// for simple indicators, a struct of aligned series for composite ones
    /// (e.g. MACD, Bollinger Bands).
    type Output: Send + Sync + Debug;

    /// Creates a new indicator from the given config.
    fn new(config: Self::Config) -> Self;

    /// The config this indicator was built from.
    fn config(&self) -> &Self::Config;

    /// Computes the indicator over `series`. The configured price source is
    /// not consulted; the series is used as is.
    fn compute(&self, series: &impl Series) -> Self::Output;

    /// Validates `bars`, extracts the configured price source, and computes
    /// the indicator over it.
    ///
    /// # Errors
    ///
    /// Any error of [`validate_bars`](crate::validate_bars).
    fn compute_bars(&self, bars: &[impl Ohlcv]) -> Result<Self::Output> {
        let series = TimeSeries::from_bars(bars, *self.config().source())?;
        Ok(self.compute(&series))
    }
}
