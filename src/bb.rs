use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    num::NonZero,
    sync::Arc,
};

use serde::Serialize;
use tracing::trace;

use crate::{
    Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorSeries, PriceSource, Result,
    Series, Window,
    error::positive_finite,
    rolling::{mean_values, std_values},
};

/// Standard deviation multiplier `k` for Bollinger Bands.
///
/// Wraps a positive, finite `f64`. Defaults to `2.0` (the standard
/// Bollinger Bands setting).
///
/// Implements `Eq` and `Hash` via bit-level comparison, which is safe because
/// NaN is rejected at construction.
#[derive(Clone, Copy, Debug)]
pub struct StdDev(f64);

impl StdDev {
    /// Creates a new standard deviation multiplier.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`](crate::Error::InvalidParameter) if `value`
    /// is zero, negative, NaN, or infinite.
    pub fn new(value: f64) -> Result<Self> {
        positive_finite("k", value).map(Self)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for StdDev {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for StdDev {}

impl Hash for StdDev {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Default for StdDev {
    fn default() -> Self {
        Self(2.0)
    }
}

/// Configuration for the Bollinger Bands ([`Bb`]) indicator.
///
/// # Example
///
/// ```
/// use quantedge_series::{BbConfig, IndicatorConfig, IndicatorConfigBuilder, StdDev};
/// use std::num::NonZero;
///
/// // Default: length 20, close, 2.0 std devs
/// let config = BbConfig::builder()
///     .length(NonZero::new(10).unwrap())
///     .std_dev(StdDev::new(2.5).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(config.length(), 10);
/// assert_eq!(config.std_dev().value(), 2.5);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct BbConfig {
    length: Window,
    source: PriceSource,
    std_dev: StdDev,
}

impl IndicatorConfig for BbConfig {
    type Builder = BbConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        BbConfigBuilder::new()
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

impl BbConfig {
    /// Standard deviation multiplier for the upper and lower bands.
    #[inline]
    #[must_use]
    pub fn std_dev(&self) -> StdDev {
        self.std_dev
    }

    /// BB(20, Close, 2σ), the standard Bollinger Bands setting.
    #[must_use]
    pub fn default_20() -> Self {
        Self::close(NonZero::<usize>::MIN.saturating_add(19))
    }

    /// BB with custom length, close price, 2σ.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self {
            length: length.into(),
            source: PriceSource::Close,
            std_dev: StdDev::default(),
        }
    }
}

impl Default for BbConfig {
    fn default() -> Self {
        Self::default_20()
    }
}

impl Display for BbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BbConfig({}, {}, {})",
            self.length,
            self.source,
            self.std_dev.value()
        )
    }
}

/// Builder for [`BbConfig`].
///
/// Defaults: length = 20, source = [`PriceSource::Close`],
/// `std_dev` = `2.0`.
pub struct BbConfigBuilder {
    config: BbConfig,
}

impl BbConfigBuilder {
    fn new() -> Self {
        Self {
            config: BbConfig::default_20(),
        }
    }

    #[inline]
    #[must_use]
    pub fn std_dev(mut self, std_dev: StdDev) -> Self {
        self.config.std_dev = std_dev;
        self
    }
}

impl IndicatorConfigBuilder<BbConfig> for BbConfigBuilder {
    #[inline]
    fn length(mut self, length: NonZero<usize>) -> Self {
        self.config.length = length.into();
        self
    }

    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.config.source = source;
        self
    }

    #[inline]
    fn build(self) -> Result<BbConfig> {
        Ok(self.config)
    }
}

/// Bollinger Bands output: upper, middle, and lower bands plus band width,
/// each aligned to the input.
///
/// The middle band is the SMA. Upper and lower bands are offset by
/// `k × σ`, where `σ` is the sample standard deviation of the window.
///
/// ```text
/// upper  = SMA + k × σ
/// middle = SMA
/// lower  = SMA − k × σ
/// width  = upper − lower
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BbSeries {
    upper: IndicatorSeries,
    middle: IndicatorSeries,
    lower: IndicatorSeries,
    width: IndicatorSeries,
}

impl BbSeries {
    /// Upper band: `SMA + k × σ`.
    #[inline]
    #[must_use]
    pub fn upper(&self) -> &IndicatorSeries {
        &self.upper
    }

    /// Middle band: SMA of the window.
    #[inline]
    #[must_use]
    pub fn middle(&self) -> &IndicatorSeries {
        &self.middle
    }

    /// Lower band: `SMA − k × σ`.
    #[inline]
    #[must_use]
    pub fn lower(&self) -> &IndicatorSeries {
        &self.lower
    }

    /// Band width: `upper − lower`.
    ///
    /// Useful for measuring volatility. Narrow width indicates
    /// consolidation (Bollinger squeeze); wide width indicates
    /// high volatility.
    #[inline]
    #[must_use]
    pub fn width(&self) -> &IndicatorSeries {
        &self.width
    }
}

/// Bollinger Bands (BB).
///
/// A volatility indicator consisting of three bands: a simple moving average
/// (middle) with upper and lower bands offset by a configurable number of
/// standard deviations.
///
/// Uses a running sum and sum of squares for O(1) updates per position. A
/// one-observation window has no sample deviation, so only its middle band is
/// defined.
///
/// # Example
///
/// ```
/// use quantedge_series::{Bb, BbConfig, TimeSeries};
/// use std::num::NonZero;
///
/// let bb = Bb::new(BbConfig::close(NonZero::new(2).unwrap()));
/// let prices = TimeSeries::from_values([3.0, 5.0]).unwrap();
/// let out = bb.compute(&prices);
///
/// // mean 4, sample σ = √2
/// assert_eq!(out.middle().values(), &[None, Some(4.0)]);
/// assert_eq!(out.upper().values()[1], Some(4.0 + 2.0 * 2.0_f64.sqrt()));
/// ```
#[derive(Clone, Debug)]
pub struct Bb {
    config: BbConfig,
}

impl Indicator for Bb {
    type Config = BbConfig;
    type Output = BbSeries;

    fn new(config: Self::Config) -> Self {
        Self { config }
    }

    #[inline]
    fn config(&self) -> &BbConfig {
        &self.config
    }

    fn compute(&self, series: &impl Series) -> BbSeries {
        trace!(indicator = %self, rows = series.len(), "computing");

        let k = self.config.std_dev.value();
        let middle = mean_values(series.iter(), self.config.length);
        let deviation: Vec<_> = std_values(series.iter(), self.config.length)
            .into_iter()
            .map(|std| std.map(|std| k * std))
            .collect();

        let band = |sign: f64| -> Vec<_> {
            middle
                .iter()
                .zip(&deviation)
                .map(|(mean, offset)| Some(sign.mul_add((*offset)?, (*mean)?)))
                .collect()
        };

        let index = series.index();
        let upper = IndicatorSeries::new(Arc::clone(index), band(1.0));
        let lower = IndicatorSeries::new(Arc::clone(index), band(-1.0));
        let width = upper.zip_with(&lower, |upper, lower| upper - lower);
        let middle = IndicatorSeries::new(Arc::clone(index), middle);

        BbSeries {
            upper,
            middle,
            lower,
            width,
        }
    }
}

impl Display for Bb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB({}, {}, {})",
            self.config.length,
            self.config.source,
            self.config.std_dev.value(),
        )
    }
}

/// Bollinger Bands of `series` over `window` observations with multiplier `k`.
///
/// # Errors
///
/// - [`Error::InvalidWindow`](crate::Error::InvalidWindow) when `window` is
///   zero.
/// - [`Error::InvalidParameter`](crate::Error::InvalidParameter) when `k` is
///   not positive and finite.
pub fn bollinger_bands(series: &impl Series, window: usize, k: f64) -> Result<BbSeries> {
    let config = BbConfig {
        length: Window::named("window", window)?,
        source: PriceSource::Close,
        std_dev: StdDev::new(k)?,
    };

    Ok(Bb::new(config).compute(series))
}
