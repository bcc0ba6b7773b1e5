use std::{fmt::Display, num::NonZero};

use tracing::trace;

use crate::{
    DecayFactor, Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorSeries,
    PriceSource, Result, Series, Window,
    ewm::ewm_values,
    rolling::aligned,
};

/// Configuration for the Exponential Moving Average ([`Ema`])
/// indicator.
///
/// # Seeding
///
/// The recurrence starts at the first value of the series, so every
/// position of a fully defined input is defined. The seed's influence
/// decays by `1 - α` per step; after `3 × (length + 1)` observations it is
/// below 1%, see [`bars_to_converge`](Self::bars_to_converge).
///
/// # Example
///
/// ```
/// use quantedge_series::{EmaConfig, IndicatorConfig, IndicatorConfigBuilder};
/// use std::num::NonZero;
///
/// let config = EmaConfig::builder()
///     .length(NonZero::new(20).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.bars_to_converge(), 63);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct EmaConfig {
    length: Window,
    source: PriceSource,
}

impl IndicatorConfig for EmaConfig {
    type Builder = EmaConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        EmaConfigBuilder::new()
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

impl EmaConfig {
    /// Number of observations after which the seed contributes less than
    /// 1% of the smoothed value: `3 × (length + 1)`.
    #[inline]
    #[must_use]
    pub fn bars_to_converge(&self) -> usize {
        3 * (self.length.get() + 1)
    }

    /// Smoothing factor `α = 2 / (length + 1)`.
    #[must_use]
    pub fn decay(&self) -> DecayFactor {
        DecayFactor::from_window(self.length)
    }

    /// EMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self {
            length: length.into(),
            source: PriceSource::Close,
        }
    }

    /// EMA on median price: `(high + low) / 2`.
    #[must_use]
    pub fn hl2(length: NonZero<usize>) -> Self {
        Self {
            length: length.into(),
            source: PriceSource::HL2,
        }
    }

    /// EMA on average price: `(open + high + low + close) / 4`.
    #[must_use]
    pub fn ohlc4(length: NonZero<usize>) -> Self {
        Self {
            length: length.into(),
            source: PriceSource::OHLC4,
        }
    }
}

impl Display for EmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmaConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`EmaConfig`].
///
/// Defaults: source = [`PriceSource::Close`].
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct EmaConfigBuilder {
    length: Option<Window>,
    source: PriceSource,
}

impl EmaConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
        }
    }
}

impl IndicatorConfigBuilder<EmaConfig> for EmaConfigBuilder {
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

    fn build(self) -> Result<EmaConfig> {
        Ok(EmaConfig {
            length: self
                .length
                .ok_or_else(|| Error::invalid_window("length", "is required"))?,
            source: self.source,
        })
    }
}

/// Exponential Moving Average (EMA).
///
/// A weighted moving average that gives more weight to recent
/// values. Uses the standard smoothing factor
/// `α = 2 / (length + 1)`. Each value is computed as:
///
/// ```text
/// EMA = α × price + (1 − α) × prev_EMA
/// ```
///
/// seeded with the first value of the series, via a single fused
/// multiply-add per position.
///
/// # Example
///
/// ```
/// use quantedge_series::{Ema, EmaConfig, TimeSeries};
/// use std::num::NonZero;
///
/// // α = 2 / (3 + 1) = 0.5
/// let ema = Ema::new(EmaConfig::close(NonZero::new(3).unwrap()));
/// let prices = TimeSeries::from_values([10.0, 20.0, 30.0]).unwrap();
///
/// assert_eq!(ema.compute(&prices).values(), &[Some(10.0), Some(15.0), Some(22.5)]);
/// ```
#[derive(Clone, Debug)]
pub struct Ema {
    config: EmaConfig,
    decay: DecayFactor,
}

impl Indicator for Ema {
    type Config = EmaConfig;
    type Output = IndicatorSeries;

    fn new(config: Self::Config) -> Self {
        Self {
            decay: config.decay(),
            config,
        }
    }

    #[inline]
    fn config(&self) -> &EmaConfig {
        &self.config
    }

    fn compute(&self, series: &impl Series) -> IndicatorSeries {
        trace!(indicator = %self, rows = series.len(), "computing");
        aligned(series, ewm_values(series.iter(), self.decay))
    }
}

impl Display for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}, {})", self.config.length, self.config.source)
    }
}

/// Exponential moving average of `series` with span `length`.
///
/// # Errors
///
/// [`Error::InvalidWindow`] when `length` is zero.
pub fn ema(series: &impl Series, length: usize) -> Result<IndicatorSeries> {
    let length = Window::named("span", length)?;
    Ok(Ema::new(EmaConfig {
        length,
        source: PriceSource::Close,
    })
    .compute(series))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, assert_defined, bars, partial, series};
    use crate::ewm_mean;

    fn ema(length: usize) -> Ema {
        Ema::new(EmaConfig::close(NonZero::new(length).unwrap()))
    }

    mod seeding {
        use super::*;

        #[test]
        fn first_position_equals_first_value() {
            let out = ema(10).compute(&series(&[42.0, 40.0, 41.0]));
            assert_eq!(out.values()[0], Some(42.0));
        }

        #[test]
        fn every_position_defined() {
            let out = ema(26).compute(&series(&[1.0, 2.0, 3.0]));
            assert!(out.values().iter().all(Option::is_some));
        }

        #[test]
        fn undefined_prefix_stays_undefined() {
            let out = ema(3).compute(&partial(&[None, Some(4.0), Some(6.0)]));
            assert_eq!(out.values(), &[None, Some(4.0), Some(5.0)]);
        }
    }

    mod smoothing {
        use super::*;

        #[test]
        fn applies_alpha() {
            // α = 2 / (4 + 1) = 0.4
            let out = ema(4).compute(&series(&[10.0, 20.0, 30.0]));
            // 0.4·20 + 0.6·10 = 14
            assert_approx!(assert_defined(out.values()[1]), 14.0);
            // 0.4·30 + 0.6·14 = 20.4
            assert_approx!(assert_defined(out.values()[2]), 20.4);
        }

        #[test]
        fn length_one_tracks_input() {
            let out = ema(1).compute(&series(&[5.0, 7.0, 3.0]));
            assert_eq!(out.values(), &[Some(5.0), Some(7.0), Some(3.0)]);
        }

        #[test]
        fn matches_ewm_mean() {
            let s = series(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
            assert_eq!(ema(5).compute(&s), ewm_mean(&s, 5.0).unwrap());
        }

        #[test]
        fn constant_input_stays_constant() {
            let out = ema(12).compute(&series(&[7.5; 30]));
            assert!(out.values().iter().all(|v| *v == Some(7.5)));
        }
    }

    mod bars_input {
        use super::*;

        #[test]
        fn close_source_from_bars() {
            let out = ema(3).compute_bars(&bars(&[10.0, 20.0])).unwrap();
            assert_eq!(out.values(), &[Some(10.0), Some(15.0)]);
            assert_eq!(out.timestamps(), &[1, 2]);
        }
    }

    mod config {
        use super::*;

        #[test]
        fn convergence_horizon() {
            assert_eq!(EmaConfig::close(NonZero::new(12).unwrap()).bars_to_converge(), 39);
        }

        #[test]
        fn decay_from_length() {
            let config = EmaConfig::close(NonZero::new(9).unwrap());
            assert_eq!(config.decay().alpha(), 0.2);
        }

        #[test]
        fn builder_with_source() {
            let config = EmaConfig::builder()
                .length(NonZero::new(5).unwrap())
                .source(PriceSource::HL2)
                .build()
                .unwrap();
            assert_eq!(config, EmaConfig::hl2(NonZero::new(5).unwrap()));
        }

        #[test]
        fn builder_without_length_fails() {
            assert!(EmaConfig::builder().build().is_err());
        }
    }

    mod display {
        use super::*;

        #[test]
        fn formats_correctly() {
            assert_eq!(ema(20).to_string(), "EMA(20, Close)");
            assert_eq!(
                EmaConfig::close(NonZero::new(20).unwrap()).to_string(),
                "EmaConfig(20, Close)"
            );
        }
    }

    mod function {
        use super::*;

        #[test]
        fn zero_length_is_rejected() {
            assert!(matches!(
                crate::ema(&series(&[1.0]), 0),
                Err(Error::InvalidWindow { parameter: "span", .. })
            ));
        }
    }
}
