//! Fixed-size sliding-window statistics and the expanding maximum.
//!
//! Every function makes a single forward pass over its input and returns a
//! series of the same length. A window position is defined only when the
//! window is full and holds no undefined input.

use std::{
    collections::VecDeque,
    fmt::Display,
    num::NonZero,
    sync::Arc,
};

use crate::{Error, IndicatorSeries, Price, Result, Series, ring_buffer::RingBuffer};

/// Number of trailing observations (inclusive of the current one) that
/// participate in a rolling statistic. Always at least 1.
///
/// # Example
///
/// ```
/// use quantedge_series::Window;
///
/// assert_eq!(Window::new(20).unwrap().get(), 20);
/// assert!(Window::new(0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Window(NonZero<usize>);

impl Window {
    /// # Errors
    ///
    /// [`Error::InvalidWindow`] when `length` is zero.
    pub fn new(length: usize) -> Result<Self> {
        Self::named("window", length)
    }

    pub(crate) fn named(parameter: &'static str, length: usize) -> Result<Self> {
        NonZero::new(length)
            .map(Self)
            .ok_or_else(|| Error::invalid_window(parameter, "must be at least 1, got 0"))
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl From<NonZero<usize>> for Window {
    fn from(length: NonZero<usize>) -> Self {
        Self(length)
    }
}

impl TryFrom<usize> for Window {
    type Error = Error;

    fn try_from(length: usize) -> Result<Self> {
        Self::new(length)
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Neumaier-compensated running sum. Small addends survive while a much
/// larger value is in the window and reappear once it is subtracted.
#[derive(Clone, Copy, Default, Debug)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    #[inline]
    fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    #[inline]
    fn value(self) -> f64 {
        self.sum + self.compensation
    }
}

impl<'a> FromIterator<&'a Price> for CompensatedSum {
    fn from_iter<I: IntoIterator<Item = &'a Price>>(iter: I) -> Self {
        let mut sum = Self::default();
        for value in iter {
            sum.add(*value);
        }
        sum
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RollingWindow<const SUM_OF_SQUARES: bool = false> {
    size: usize,
    size_reciprocal: f64,
    buffer: RingBuffer<Option<Price>>,
    sum: CompensatedSum,
    /// Sum of squared deviations from the mean of the defined values,
    /// updated with Welford's add/remove steps.
    m2: f64,
    defined: usize,
    undefined: usize,
    /// Both running statistics are recomputed from the buffer every `size`
    /// pushes, so rounding drift never outlives one window.
    pushed: usize,
    /// Length of the trailing run of identical defined values. Once it
    /// covers the window the statistics are reset from that value, so a
    /// constant window has exactly zero variance.
    run: usize,
    last: Option<Price>,
}

pub(crate) type RollingWindowWithSumOfSquares = RollingWindow<true>;

impl RollingWindow {
    pub fn new(window: Window) -> Self {
        Self::with_size(window)
    }
}

impl RollingWindow<true> {
    pub fn with_sum_of_squares(window: Window) -> Self {
        Self::with_size(window)
    }
}

impl<const SUM_OF_SQUARES: bool> RollingWindow<SUM_OF_SQUARES> {
    fn with_size(window: Window) -> Self {
        let size = window.get();

        Self {
            size,
            #[allow(clippy::cast_precision_loss)]
            size_reciprocal: 1.0 / size as f64,
            buffer: RingBuffer::new(size),
            sum: CompensatedSum::default(),
            m2: 0.0,
            defined: 0,
            undefined: 0,
            pushed: 0,
            run: 0,
            last: None,
        }
    }

    #[inline]
    #[allow(clippy::float_cmp)]
    pub fn add(&mut self, value: Option<Price>) {
        match self.buffer.push(value) {
            Some(Some(old)) => self.remove(old),
            Some(None) => self.undefined -= 1,
            None => {}
        }

        match value {
            Some(price) => self.insert(price),
            None => self.undefined += 1,
        }
        self.pushed += 1;

        self.run = match (value, self.last) {
            (Some(price), Some(last)) if price == last => self.run + 1,
            (Some(_), _) => 1,
            (None, _) => 0,
        };
        self.last = value;

        if let Some(price) = value.filter(|_| self.is_constant()) {
            #[allow(clippy::cast_precision_loss)]
            let size = self.size as f64;
            self.sum = CompensatedSum {
                sum: price * size,
                compensation: 0.0,
            };
            self.m2 = 0.0;
        } else if self.pushed % self.size == 0 || !self.is_finite() {
            self.recompute();
        }
    }

    #[inline]
    fn defined_mean(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let defined = self.defined as f64;
        self.sum.value() / defined
    }

    #[inline]
    fn insert(&mut self, price: Price) {
        let before = (self.defined > 0).then(|| self.defined_mean());

        self.sum.add(price);
        self.defined += 1;

        if let Some(before) = before.filter(|_| SUM_OF_SQUARES) {
            self.m2 += (price - before) * (price - self.defined_mean());
        }
    }

    #[inline]
    fn remove(&mut self, price: Price) {
        let before = self.defined_mean();

        self.sum.add(-price);
        self.defined -= 1;

        if self.defined == 0 {
            self.sum = CompensatedSum::default();
            self.m2 = 0.0;
        } else if SUM_OF_SQUARES {
            self.m2 -= (price - before) * (price - self.defined_mean());
        }
    }

    /// Rebuilds both statistics from the buffered values, two-pass.
    fn recompute(&mut self) {
        self.sum = self.buffer.iter().flatten().collect();

        if SUM_OF_SQUARES {
            self.m2 = if self.defined == 0 {
                0.0
            } else {
                let mean = self.defined_mean();
                self.buffer
                    .iter()
                    .flatten()
                    .map(|price| (price - mean).powi(2))
                    .sum()
            };
        }
    }

    #[inline]
    fn is_finite(&self) -> bool {
        self.sum.value().is_finite() && self.m2.is_finite()
    }

    #[inline]
    fn is_constant(&self) -> bool {
        self.run >= self.size
    }

    /// `None` until the window is full of defined values, and when the sum
    /// overflows.
    #[inline]
    pub fn sum(&self) -> Option<Price> {
        self.is_ready()
            .then(|| self.sum.value())
            .filter(|sum| sum.is_finite())
    }

    #[inline]
    pub fn mean(&self) -> Option<Price> {
        self.sum().map(|sum| sum * self.size_reciprocal)
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.buffer.is_ready() && self.undefined == 0
    }
}

impl RollingWindow<true> {
    /// Sample variance (`n - 1` denominator). `None` for a one-element
    /// window, which has no degrees of freedom.
    #[inline]
    pub fn sample_variance(&self) -> Option<f64> {
        if self.size < 2 {
            return None;
        }

        self.sum()?;
        if self.is_constant() {
            return Some(0.0);
        }

        #[allow(clippy::cast_precision_loss)]
        let degrees_of_freedom = (self.size - 1) as f64;

        Some(self.m2.max(0.0) / degrees_of_freedom).filter(|variance| variance.is_finite())
    }

    #[inline]
    pub fn sample_std(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }
}

/// Sliding-window extreme via a monotonic deque: amortized O(1) per value.
#[derive(Clone, Debug)]
struct WindowExtreme<const MAX: bool> {
    size: usize,
    deque: VecDeque<(usize, Price)>,
    position: usize,
    last_undefined: Option<usize>,
}

impl<const MAX: bool> WindowExtreme<MAX> {
    fn new(window: Window) -> Self {
        Self {
            size: window.get(),
            deque: VecDeque::with_capacity(window.get()),
            position: 0,
            last_undefined: None,
        }
    }

    #[inline]
    fn dominates(candidate: Price, held: Price) -> bool {
        if MAX { candidate >= held } else { candidate <= held }
    }

    fn add(&mut self, value: Option<Price>) -> Option<Price> {
        let position = self.position;
        self.position += 1;

        match value {
            Some(price) => {
                while self
                    .deque
                    .back()
                    .is_some_and(|&(_, held)| Self::dominates(price, held))
                {
                    self.deque.pop_back();
                }
                self.deque.push_back((position, price));
            }
            None => self.last_undefined = Some(position),
        }

        while self
            .deque
            .front()
            .is_some_and(|&(i, _)| i + self.size <= position)
        {
            self.deque.pop_front();
        }

        let full = position + 1 >= self.size;
        let clean = self.last_undefined.is_none_or(|u| u + self.size <= position);

        if full && clean {
            self.deque.front().map(|&(_, price)| price)
        } else {
            None
        }
    }
}

pub(crate) fn mean_values(
    values: impl Iterator<Item = Option<Price>>,
    window: Window,
) -> Vec<Option<Price>> {
    let mut rolling = RollingWindow::new(window);

    values
        .map(|value| {
            rolling.add(value);
            rolling.mean()
        })
        .collect()
}

pub(crate) fn std_values(
    values: impl Iterator<Item = Option<Price>>,
    window: Window,
) -> Vec<Option<Price>> {
    let mut rolling = RollingWindowWithSumOfSquares::with_sum_of_squares(window);

    values
        .map(|value| {
            rolling.add(value);
            rolling.sample_std()
        })
        .collect()
}

fn extreme_values<const MAX: bool>(
    values: impl Iterator<Item = Option<Price>>,
    window: Window,
) -> Vec<Option<Price>> {
    let mut extreme = WindowExtreme::<MAX>::new(window);
    values.map(|value| extreme.add(value)).collect()
}

/// Arithmetic mean over the trailing `window` observations.
///
/// Positions `0..window-1` are undefined; when `window` exceeds the series
/// length every position is undefined. A window whose sum overflows is
/// undefined too.
///
/// # Errors
///
/// [`Error::InvalidWindow`] when `window` is zero.
///
/// # Example
///
/// ```
/// use quantedge_series::{TimeSeries, rolling_mean};
///
/// let s = TimeSeries::from_values([10.0, 20.0, 30.0, 40.0]).unwrap();
/// let mean = rolling_mean(&s, 3).unwrap();
///
/// assert_eq!(mean.values(), &[None, None, Some(20.0), Some(30.0)]);
/// ```
pub fn rolling_mean(series: &impl Series, window: usize) -> Result<IndicatorSeries> {
    let window = Window::new(window)?;
    Ok(aligned(series, mean_values(series.iter(), window)))
}

/// Sample standard deviation (`n - 1` denominator) over the trailing
/// `window` observations. Same undefined policy as [`rolling_mean`]; with
/// `window == 1` every position is undefined.
///
/// # Errors
///
/// [`Error::InvalidWindow`] when `window` is zero.
pub fn rolling_std(series: &impl Series, window: usize) -> Result<IndicatorSeries> {
    let window = Window::new(window)?;
    Ok(aligned(series, std_values(series.iter(), window)))
}

/// Minimum over the trailing `window` observations.
///
/// # Errors
///
/// [`Error::InvalidWindow`] when `window` is zero.
pub fn rolling_min(series: &impl Series, window: usize) -> Result<IndicatorSeries> {
    let window = Window::new(window)?;
    Ok(aligned(series, extreme_values::<false>(series.iter(), window)))
}

/// Maximum over the trailing `window` observations.
///
/// # Errors
///
/// [`Error::InvalidWindow`] when `window` is zero.
pub fn rolling_max(series: &impl Series, window: usize) -> Result<IndicatorSeries> {
    let window = Window::new(window)?;
    Ok(aligned(series, extreme_values::<true>(series.iter(), window)))
}

/// Running maximum from the series start through each position.
///
/// Defined from the first defined input onward; undefined inputs are skipped
/// and the running maximum carries forward.
///
/// # Example
///
/// ```
/// use quantedge_series::{TimeSeries, expanding_max};
///
/// let s = TimeSeries::from_values([3.0, 1.0, 4.0, 2.0]).unwrap();
/// assert_eq!(
///     expanding_max(&s).values(),
///     &[Some(3.0), Some(3.0), Some(4.0), Some(4.0)]
/// );
/// ```
#[must_use]
pub fn expanding_max(series: &impl Series) -> IndicatorSeries {
    let mut running: Option<Price> = None;

    let values = series
        .iter()
        .map(|value| {
            if let Some(price) = value {
                running = Some(running.map_or(price, |max| max.max(price)));
            }
            running
        })
        .collect();

    aligned(series, values)
}

#[inline]
pub(crate) fn aligned(series: &impl Series, values: Vec<Option<Price>>) -> IndicatorSeries {
    IndicatorSeries::new(Arc::clone(series.index()), values)
}
