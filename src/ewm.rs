use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

use crate::{Error, IndicatorSeries, Price, Result, Series, Window, rolling::aligned};

/// Smoothing factor `α` of an exponentially weighted mean.
///
/// Built from a span `N ≥ 1` as `α = 2 / (N + 1)`, or given directly with
/// `0 < α ≤ 1`. A span of 1 gives `α = 1`, which reproduces the input.
///
/// Implements `Eq` and `Hash` via bit-level comparison, which is sound
/// because NaN is rejected at construction.
///
/// # Example
///
/// ```
/// use quantedge_series::DecayFactor;
///
/// let decay = DecayFactor::from_span(9.0).unwrap();
/// assert_eq!(decay.alpha(), 0.2);
///
/// assert!(DecayFactor::from_span(0.5).is_err());
/// assert!(DecayFactor::from_alpha(0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DecayFactor(f64);

impl DecayFactor {
    /// # Errors
    ///
    /// [`Error::InvalidWindow`] when `span` is below 1 or not finite.
    pub fn from_span(span: f64) -> Result<Self> {
        Self::named_span("span", span)
    }

    pub(crate) fn named_span(parameter: &'static str, span: f64) -> Result<Self> {
        if !span.is_finite() || span < 1.0 {
            return Err(Error::invalid_window(
                parameter,
                format!("must be a finite number >= 1, got {span}"),
            ));
        }

        Ok(Self(2.0 / (span + 1.0)))
    }

    /// `α = 2 / (N + 1)` for an integer span, which is always valid.
    pub(crate) fn from_window(span: Window) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let span = span.get() as f64;
        Self(2.0 / (span + 1.0))
    }

    /// # Errors
    ///
    /// [`Error::InvalidParameter`] unless `0 < alpha <= 1`.
    pub fn from_alpha(alpha: f64) -> Result<Self> {
        if alpha > 0.0 && alpha <= 1.0 {
            Ok(Self(alpha))
        } else {
            Err(Error::invalid_parameter(
                "alpha",
                format!("must be in (0, 1], got {alpha}"),
            ))
        }
    }

    #[inline]
    #[must_use]
    pub fn alpha(self) -> f64 {
        self.0
    }
}

impl PartialEq for DecayFactor {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for DecayFactor {}

impl Hash for DecayFactor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Display for DecayFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "α={}", self.0)
    }
}

/// Running exponentially weighted mean, seeded at the first defined value.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Smoother {
    alpha: f64,
    current: Option<Price>,
}

impl Smoother {
    pub fn new(decay: DecayFactor) -> Self {
        Self {
            alpha: decay.alpha(),
            current: None,
        }
    }

    /// Folds `value` into the mean. An undefined value leaves the mean as is.
    #[inline]
    pub fn add(&mut self, value: Option<Price>) -> Option<Price> {
        if let Some(price) = value {
            self.current = Some(match self.current {
                Some(previous) => self.alpha.mul_add(price - previous, previous),
                None => price,
            });
        }

        self.current
    }
}

pub(crate) fn ewm_values(
    values: impl Iterator<Item = Option<Price>>,
    decay: DecayFactor,
) -> Vec<Option<Price>> {
    let mut smoother = Smoother::new(decay);
    values.map(|value| smoother.add(value)).collect()
}

/// Exponentially weighted mean with `α = 2 / (span + 1)`.
///
/// `y[0] = x[0]`, then `y[i] = α·x[i] + (1 - α)·y[i-1]`. Every position is
/// defined for a fully defined input. An undefined prefix of the input stays
/// undefined and the recurrence starts at the first defined value; an
/// undefined value after that carries the previous mean forward.
///
/// # Errors
///
/// [`Error::InvalidWindow`] when `span` is below 1 or not finite.
///
/// # Example
///
/// ```
/// use quantedge_series::{TimeSeries, ewm_mean};
///
/// let s = TimeSeries::from_values([10.0, 20.0]).unwrap();
/// // α = 2 / (3 + 1) = 0.5
/// let ema = ewm_mean(&s, 3.0).unwrap();
///
/// assert_eq!(ema.values(), &[Some(10.0), Some(15.0)]);
/// ```
pub fn ewm_mean(series: &impl Series, span: f64) -> Result<IndicatorSeries> {
    Ok(ewm_mean_with(series, DecayFactor::from_span(span)?))
}

/// [`ewm_mean`] with a prebuilt [`DecayFactor`].
#[must_use]
pub fn ewm_mean_with(series: &impl Series, decay: DecayFactor) -> IndicatorSeries {
    aligned(series, ewm_values(series.iter(), decay))
}
