use std::{fmt::Display, num::NonZero};

use tracing::trace;

use crate::{
    Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorSeries, PriceSource,
    Result, Series, Window,
    rolling::{aligned, mean_values},
};

/// Configuration for the Simple Moving Average ([`Sma`]) indicator.
///
/// # Example
///
/// ```rust
/// use quantedge_series::{IndicatorConfig, SmaConfig};
/// use std::num::NonZero;
///
/// let config = SmaConfig::close(NonZero::new(20).unwrap());
/// assert_eq!(config.length(), 20);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct SmaConfig {
    length: Window,
    source: PriceSource,
}

impl IndicatorConfig for SmaConfig {
    type Builder = SmaConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        SmaConfigBuilder::new()
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

impl SmaConfig {
    /// SMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self {
            length: length.into(),
            source: PriceSource::Close,
        }
    }

    /// SMA on median price: `(high + low) / 2`.
    #[must_use]
    pub fn hl2(length: NonZero<usize>) -> Self {
        Self {
            length: length.into(),
            source: PriceSource::HL2,
        }
    }

    /// SMA on average price: `(open + high + low + close) / 4`.
    #[must_use]
    pub fn ohlc4(length: NonZero<usize>) -> Self {
        Self {
            length: length.into(),
            source: PriceSource::OHLC4,
        }
    }
}

impl Display for SmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SmaConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`SmaConfig`].
///
/// Defaults: source = [`PriceSource::Close`].
/// Length must be set before calling [`build`](IndicatorConfigBuilder::build).
pub struct SmaConfigBuilder {
    length: Option<Window>,
    source: PriceSource,
}

impl SmaConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
        }
    }
}

impl IndicatorConfigBuilder<SmaConfig> for SmaConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length.into());
        self
    }

    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    fn build(self) -> Result<SmaConfig> {
        Ok(SmaConfig {
            length: self
                .length
                .ok_or_else(|| Error::invalid_window("length", "is required"))?,
            source: self.source,
        })
    }
}

/// Simple Moving Average (SMA).
///
/// Unweighted mean of the last *n* values, where *n* is the configured
/// window length. The first *n - 1* positions are undefined.
///
/// Uses a running sum for O(1) updates per position.
///
/// # Example
///
/// ```rust
/// use quantedge_series::{Sma, SmaConfig, TimeSeries};
/// use std::num::NonZero;
///
/// let sma = Sma::new(SmaConfig::close(NonZero::new(3).unwrap()));
/// let prices = TimeSeries::from_values([10.0, 20.0, 30.0, 40.0]).unwrap();
///
/// assert_eq!(sma.compute(&prices).values(), &[None, None, Some(20.0), Some(30.0)]);
/// ```
#[derive(Clone, Debug)]
pub struct Sma {
    config: SmaConfig,
}

impl Indicator for Sma {
    type Config = SmaConfig;
    type Output = IndicatorSeries;

    fn new(config: Self::Config) -> Self {
        Self { config }
    }

    #[inline]
    fn config(&self) -> &SmaConfig {
        &self.config
    }

    fn compute(&self, series: &impl Series) -> IndicatorSeries {
        trace!(indicator = %self, rows = series.len(), "computing");
        aligned(series, mean_values(series.iter(), self.config.length))
    }
}

impl Display for Sma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SMA({}, {})", self.config.length, self.config.source)
    }
}

/// Simple moving average of `series` over `window` observations.
///
/// # Errors
///
/// [`Error::InvalidWindow`] when `window` is zero.
pub fn sma(series: &impl Series, window: usize) -> Result<IndicatorSeries> {
    let length = Window::named("window", window)?;
    Ok(Sma::new(SmaConfig {
        length,
        source: PriceSource::Close,
    })
    .compute(series))
}
