use std::{fmt::Display, num::NonZero};

use tracing::trace;

use crate::{
    Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorSeries, Price,
    PriceSource, Result, Series, Window,
    rolling::{aligned, mean_values},
};

/// Configuration for the Relative Strength Index ([`Rsi`])
/// indicator.
///
/// Average gain and loss are simple rolling means over the last `length`
/// price changes. The first change needs two observations, so output begins
/// at position `length`.
///
/// # Example
///
/// ```
/// use quantedge_series::{IndicatorConfig, RsiConfig};
/// use std::num::NonZero;
///
/// let config = RsiConfig::close(NonZero::new(14).unwrap());
/// assert_eq!(config.length(), 14);
/// assert_eq!(config, RsiConfig::default_14());
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct RsiConfig {
    length: Window,
    source: PriceSource,
}

impl IndicatorConfig for RsiConfig {
    type Builder = RsiConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        RsiConfigBuilder::new()
    }

    #[inline]
    fn length(&self) -> usize {
        self.length.get()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }
}

impl RsiConfig {
    /// RSI on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self {
            length: length.into(),
            source: PriceSource::Close,
        }
    }

    /// RSI(14, Close), the conventional setting.
    #[must_use]
    pub fn default_14() -> Self {
        Self::close(NonZero::<usize>::MIN.saturating_add(13))
    }
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self::default_14()
    }
}

impl Display for RsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsiConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`RsiConfig`].
///
/// Defaults: length = 14, source = [`PriceSource::Close`].
pub struct RsiConfigBuilder {
    length: Window,
    source: PriceSource,
}

impl RsiConfigBuilder {
    #[must_use]
    fn new() -> Self {
        let defaults = RsiConfig::default_14();

        Self {
            length: defaults.length,
            source: defaults.source,
        }
    }
}

impl IndicatorConfigBuilder<RsiConfig> for RsiConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.length = length.into();
        self
    }

    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> Result<RsiConfig> {
        Ok(RsiConfig {
            length: self.length,
            source: self.source,
        })
    }
}

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes on
/// a 0–100 scale. Values above 70 are conventionally considered
/// overbought; below 30, oversold.
///
/// ```text
/// change = price[i] − price[i−1]
/// gain   = mean(max(change, 0))  over `length` changes
/// loss   = mean(max(−change, 0)) over `length` changes
/// RSI    = 100 − 100 / (1 + gain / loss)
/// ```
///
/// A window with no losses reads 100; a window with neither gains nor
/// losses (flat prices) reads 50.
///
/// # Example
///
/// ```
/// use quantedge_series::{Rsi, RsiConfig, TimeSeries};
/// use std::num::NonZero;
///
/// let rsi = Rsi::new(RsiConfig::close(NonZero::new(3).unwrap()));
/// let prices = TimeSeries::from_values([10.0, 12.0, 11.0, 13.0]).unwrap();
///
/// // changes = +2, −1, +2 → gain = 4/3, loss = 1/3 → RSI = 80
/// assert_eq!(rsi.compute(&prices).values(), &[None, None, None, Some(80.0)]);
/// ```
#[derive(Clone, Debug)]
pub struct Rsi {
    config: RsiConfig,
}

impl Indicator for Rsi {
    type Config = RsiConfig;
    type Output = IndicatorSeries;

    fn new(config: Self::Config) -> Self {
        Self { config }
    }

    #[inline]
    fn config(&self) -> &RsiConfig {
        &self.config
    }

    fn compute(&self, series: &impl Series) -> IndicatorSeries {
        trace!(indicator = %self, rows = series.len(), "computing");

        let changes = Self::changes(series);
        let gains = mean_values(
            changes.iter().map(|c| c.map(|c| c.max(0.0))),
            self.config.length,
        );
        let losses = mean_values(
            changes.iter().map(|c| c.map(|c| (-c).max(0.0))),
            self.config.length,
        );

        let values = gains
            .into_iter()
            .zip(losses)
            .map(|(gain, loss)| Self::rsi_from_averages(gain?, loss?))
            .collect();

        aligned(series, values)
    }
}

impl Rsi {
    /// First differences; undefined at position 0, wherever either operand
    /// is undefined, and where the difference overflows.
    fn changes(series: &impl Series) -> Vec<Option<Price>> {
        let mut previous: Option<Price> = None;

        series
            .iter()
            .map(|value| {
                let change = value
                    .zip(previous)
                    .map(|(current, previous)| current - previous)
                    .filter(|change| change.is_finite());
                previous = value;
                change
            })
            .collect()
    }

    /// `None` when the averages overflow.
    #[inline]
    fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
        let sum = avg_gain + avg_loss;
        if sum == 0.0 {
            Some(50.0)
        } else {
            let rsi = 100.0 * avg_gain / sum;
            rsi.is_finite().then(|| rsi.clamp(0.0, 100.0))
        }
    }
}

impl Display for Rsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RSI({}, {})", self.config.length, self.config.source)
    }
}

/// Relative strength index of `series` over `window` price changes.
///
/// # Errors
///
/// [`Error::InvalidWindow`](crate::Error::InvalidWindow) when `window` is zero.
pub fn rsi(series: &impl Series, window: usize) -> Result<IndicatorSeries> {
    let length = Window::named("window", window)?;
    Ok(Rsi::new(RsiConfig {
        length,
        source: PriceSource::Close,
    })
    .compute(series))
}
