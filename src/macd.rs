use std::{fmt::Display, num::NonZero, sync::Arc};

use serde::Serialize;
use tracing::trace;

use crate::{
    DecayFactor, Error, Indicator, IndicatorConfig, IndicatorConfigBuilder, IndicatorSeries,
    PriceSource, Result, Series, Window,
    ewm::ewm_values,
};

/// Configuration for the Moving Average Convergence Divergence ([`Macd`])
/// indicator.
///
/// [`length`](IndicatorConfig::length) reports the slow length, which sets
/// the horizon of the indicator.
///
/// # Example
///
/// ```
/// use quantedge_series::{IndicatorConfig, IndicatorConfigBuilder, MacdConfig};
/// use std::num::NonZero;
///
/// let config = MacdConfig::builder()
///     .fast_length(NonZero::new(5).unwrap())
///     .slow_length(NonZero::new(35).unwrap())
///     .signal_length(NonZero::new(5).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(config.length(), 35);
///
/// // Fast must be shorter than slow.
/// assert!(
///     MacdConfig::builder()
///         .fast_length(NonZero::new(26).unwrap())
///         .slow_length(NonZero::new(12).unwrap())
///         .build()
///         .is_err()
/// );
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MacdConfig {
    fast: Window,
    slow: Window,
    signal: Window,
    source: PriceSource,
}

impl IndicatorConfig for MacdConfig {
    type Builder = MacdConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        MacdConfigBuilder::new()
    }

    #[inline]
    fn length(&self) -> usize {
        self.slow.get()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }
}

impl MacdConfig {
    #[inline]
    #[must_use]
    pub fn fast_length(&self) -> usize {
        self.fast.get()
    }

    #[inline]
    #[must_use]
    pub fn slow_length(&self) -> usize {
        self.slow.get()
    }

    #[inline]
    #[must_use]
    pub fn signal_length(&self) -> usize {
        self.signal.get()
    }

    /// MACD(12, 26, 9) on closing price.
    #[must_use]
    pub fn default_12_26_9() -> Self {
        Self {
            fast: NonZero::<usize>::MIN.saturating_add(11).into(),
            slow: NonZero::<usize>::MIN.saturating_add(25).into(),
            signal: NonZero::<usize>::MIN.saturating_add(8).into(),
            source: PriceSource::Close,
        }
    }

    fn checked(self) -> Result<Self> {
        if self.fast >= self.slow {
            return Err(Error::invalid_window(
                "fast",
                format!(
                    "must be shorter than slow length {}, got {}",
                    self.slow, self.fast
                ),
            ));
        }

        Ok(self)
    }
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self::default_12_26_9()
    }
}

impl Display for MacdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MacdConfig({}, {}, {}, {})",
            self.fast, self.slow, self.signal, self.source
        )
    }
}

/// Builder for [`MacdConfig`].
///
/// Defaults: fast = 12, slow = 26, signal = 9, source =
/// [`PriceSource::Close`]. [`length`](IndicatorConfigBuilder::length) sets
/// the slow length.
pub struct MacdConfigBuilder {
    config: MacdConfig,
}

impl MacdConfigBuilder {
    fn new() -> Self {
        Self {
            config: MacdConfig::default_12_26_9(),
        }
    }

    #[inline]
    #[must_use]
    pub fn fast_length(mut self, length: NonZero<usize>) -> Self {
        self.config.fast = length.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn slow_length(mut self, length: NonZero<usize>) -> Self {
        self.config.slow = length.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn signal_length(mut self, length: NonZero<usize>) -> Self {
        self.config.signal = length.into();
        self
    }
}

impl IndicatorConfigBuilder<MacdConfig> for MacdConfigBuilder {
    #[inline]
    fn length(self, length: NonZero<usize>) -> Self {
        self.slow_length(length)
    }

    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.config.source = source;
        self
    }

    fn build(self) -> Result<MacdConfig> {
        self.config.checked()
    }
}

/// MACD output: line, signal, and histogram, each aligned to the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    line: IndicatorSeries,
    signal: IndicatorSeries,
    histogram: IndicatorSeries,
}

impl MacdSeries {
    /// `EMA(fast) − EMA(slow)`.
    #[inline]
    #[must_use]
    pub fn line(&self) -> &IndicatorSeries {
        &self.line
    }

    /// EMA of the MACD line.
    #[inline]
    #[must_use]
    pub fn signal(&self) -> &IndicatorSeries {
        &self.signal
    }

    /// `line − signal`.
    #[inline]
    #[must_use]
    pub fn histogram(&self) -> &IndicatorSeries {
        &self.histogram
    }
}

/// Moving Average Convergence Divergence (MACD).
///
/// ```text
/// line      = EMA(price, fast) − EMA(price, slow)
/// signal    = EMA(line, signal)
/// histogram = line − signal
/// ```
///
/// The EMAs are seeded with the first value, so all three series are defined
/// from position 0 for a fully defined input.
///
/// # Example
///
/// ```
/// use quantedge_series::{Macd, MacdConfig, TimeSeries};
///
/// let macd = Macd::new(MacdConfig::default());
/// let prices = TimeSeries::from_values([100.0, 101.0, 102.5, 101.5]).unwrap();
/// let out = macd.compute(&prices);
///
/// assert_eq!(out.line().values()[0], Some(0.0));
/// assert!(out.histogram().values().iter().all(Option::is_some));
/// ```
#[derive(Clone, Debug)]
pub struct Macd {
    config: MacdConfig,
}

impl Indicator for Macd {
    type Config = MacdConfig;
    type Output = MacdSeries;

    fn new(config: Self::Config) -> Self {
        Self { config }
    }

    #[inline]
    fn config(&self) -> &MacdConfig {
        &self.config
    }

    fn compute(&self, series: &impl Series) -> MacdSeries {
        trace!(indicator = %self, rows = series.len(), "computing");

        let fast = ewm_values(series.iter(), DecayFactor::from_window(self.config.fast));
        let slow = ewm_values(series.iter(), DecayFactor::from_window(self.config.slow));

        let line: Vec<_> = fast
            .into_iter()
            .zip(slow)
            .map(|(fast, slow)| Some(fast? - slow?))
            .collect();
        let signal = ewm_values(
            line.iter().copied(),
            DecayFactor::from_window(self.config.signal),
        );

        let line = IndicatorSeries::new(Arc::clone(series.index()), line);
        let signal = IndicatorSeries::new(Arc::clone(series.index()), signal);
        let histogram = line.zip_with(&signal, |line, signal| line - signal);

        MacdSeries {
            line,
            signal,
            histogram,
        }
    }
}

impl Display for Macd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD({}, {}, {}, {})",
            self.config.fast, self.config.slow, self.config.signal, self.config.source
        )
    }
}

/// MACD of `series` with the given fast, slow, and signal spans.
///
/// # Errors
///
/// [`Error::InvalidWindow`] when a span is zero or `fast >= slow`.
pub fn macd(series: &impl Series, fast: usize, slow: usize, signal: usize) -> Result<MacdSeries> {
    let config = MacdConfig {
        fast: Window::named("fast", fast)?,
        slow: Window::named("slow", slow)?,
        signal: Window::named("signal", signal)?,
        source: PriceSource::Close,
    }
    .checked()?;

    Ok(Macd::new(config).compute(series))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_close, assert_defined, bars, series};
    use crate::ema;

    fn nz(n: usize) -> NonZero<usize> {
        NonZero::new(n).unwrap()
    }

    fn macd(fast: usize, slow: usize, signal: usize) -> Macd {
        Macd::new(
            MacdConfig::builder()
                .fast_length(nz(fast))
                .slow_length(nz(slow))
                .signal_length(nz(signal))
                .build()
                .unwrap(),
        )
    }

    mod values {
        use super::*;

        #[test]
        fn defined_from_first_position() {
            let out = macd(12, 26, 9).compute(&series(&[10.0, 11.0, 12.0]));
            for part in [out.line(), out.signal(), out.histogram()] {
                assert!(part.values().iter().all(Option::is_some));
            }
        }

        #[test]
        fn first_position_is_zero() {
            let out = macd(12, 26, 9).compute(&series(&[10.0, 11.0]));
            assert_eq!(out.line().values()[0], Some(0.0));
            assert_eq!(out.signal().values()[0], Some(0.0));
            assert_eq!(out.histogram().values()[0], Some(0.0));
        }

        #[test]
        fn line_is_fast_minus_slow() {
            let s = series(&[10.0, 12.0, 11.0, 14.0, 13.0, 15.0]);
            let out = macd(2, 4, 3).compute(&s);
            let fast = ema(&s, 2).unwrap();
            let slow = ema(&s, 4).unwrap();

            for i in 0..s.len() {
                let expected = assert_defined(fast.values()[i]) - assert_defined(slow.values()[i]);
                assert_eq!(out.line().values()[i], Some(expected));
            }
        }

        #[test]
        fn second_position_by_hand() {
            // fast α = 2/3, slow α = 2/5, signal α = 1/2
            // fast[1] = 10 + 2/3·(13 − 10) = 12, slow[1] = 10 + 0.4·3 = 11.2
            // line[1] = 0.8, signal[1] = 0 + 0.5·0.8 = 0.4, histogram[1] = 0.4
            let out = macd(2, 4, 3).compute(&series(&[10.0, 13.0]));
            assert_close(assert_defined(out.line().values()[1]), 0.8);
            assert_close(assert_defined(out.signal().values()[1]), 0.4);
            assert_close(assert_defined(out.histogram().values()[1]), 0.4);
        }

        #[test]
        fn histogram_is_line_minus_signal() {
            let out = macd(3, 6, 4).compute(&series(&[5.0, 6.0, 4.0, 7.0, 8.0, 6.5, 9.0]));
            for i in 0..7 {
                let line = assert_defined(out.line().values()[i]);
                let signal = assert_defined(out.signal().values()[i]);
                assert_eq!(out.histogram().values()[i], Some(line - signal));
            }
        }

        #[test]
        fn constant_prices_are_flat_zero() {
            let out = macd(12, 26, 9).compute(&series(&[50.0; 40]));
            assert!(out.histogram().values().iter().all(|v| *v == Some(0.0)));
        }
    }

    mod config {
        use super::*;

        #[test]
        fn default_is_12_26_9() {
            let config = MacdConfig::default();
            assert_eq!(
                (config.fast_length(), config.slow_length(), config.signal_length()),
                (12, 26, 9)
            );
            assert_eq!(config.to_string(), "MacdConfig(12, 26, 9, Close)");
        }

        #[test]
        fn fast_equal_to_slow_is_rejected() {
            let err = MacdConfig::builder()
                .fast_length(nz(10))
                .length(nz(10))
                .build()
                .unwrap_err();
            assert!(matches!(err, Error::InvalidWindow { parameter: "fast", .. }));
        }

        #[test]
        fn display() {
            assert_eq!(macd(12, 26, 9).to_string(), "MACD(12, 26, 9, Close)");
        }
    }

    mod bars_input {
        use super::*;

        #[test]
        fn shares_bar_index() {
            let out = macd(2, 4, 3).compute_bars(&bars(&[1.0, 2.0, 3.0])).unwrap();
            assert_eq!(out.line().timestamps(), &[1, 2, 3]);
            assert!(Arc::ptr_eq(out.line().index(), out.histogram().index()));
        }
    }

    mod function {
        use super::*;

        #[test]
        fn rejects_fast_not_below_slow() {
            assert!(matches!(
                crate::macd(&series(&[1.0]), 26, 12, 9),
                Err(Error::InvalidWindow { parameter: "fast", .. })
            ));
        }

        #[test]
        fn rejects_zero_signal() {
            assert!(matches!(
                crate::macd(&series(&[1.0]), 12, 26, 0),
                Err(Error::InvalidWindow { parameter: "signal", .. })
            ));
        }
    }
}
