use std::sync::Arc;

use serde::Serialize;

use crate::{
    Error, Ohlcv, Price, PriceSource, Result, Timestamp, validator::check_increasing,
    validator::validate_bars,
};

/// Shared timestamp index.
///
/// Every series derived from an input reuses the input's index, so outputs
/// stay aligned by construction and cloning a series never copies the
/// timestamps.
pub type Index = Arc<[Timestamp]>;

/// Read access to an ordered, timestamp-indexed sequence of values.
///
/// Implemented by [`TimeSeries`] (every value defined) and
/// [`IndicatorSeries`] (values may be undefined), so indicators can be
/// chained: an EMA of a MACD line, a volatility of returns.
pub trait Series {
    /// Timestamp index, strictly increasing.
    fn index(&self) -> &Index;

    /// Value at `position`, or `None` where undefined.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.len()`.
    fn get(&self, position: usize) -> Option<Price>;

    /// Number of positions.
    fn len(&self) -> usize {
        self.index().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every position in timestamp order.
    fn iter(&self) -> impl Iterator<Item = Option<Price>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

/// Validated input series: strictly increasing timestamps, every value finite.
///
/// # Example
///
/// ```
/// use quantedge_series::{Series, TimeSeries};
///
/// let series = TimeSeries::new(vec![1, 2, 3], vec![10.0, 11.0, 12.5]).unwrap();
/// assert_eq!(series.len(), 3);
/// assert_eq!(series.get(2), Some(12.5));
///
/// // Timestamps must be strictly increasing.
/// assert!(TimeSeries::new(vec![1, 1], vec![10.0, 11.0]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    index: Index,
    values: Vec<Price>,
}

impl TimeSeries {
    /// Builds a series from parallel timestamp and value vectors.
    ///
    /// # Errors
    ///
    /// - [`Error::LengthMismatch`] when the vectors differ in length.
    /// - [`Error::NonMonotonicTimestamp`] when timestamps are not strictly
    ///   increasing.
    /// - [`Error::InvalidDType`] when a value is NaN or infinite.
    pub fn new(timestamps: Vec<Timestamp>, values: Vec<Price>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(Error::LengthMismatch {
                column: "value".to_owned(),
                expected: timestamps.len(),
                actual: values.len(),
            });
        }
        check_increasing(&timestamps)?;
        check_finite("value", &values)?;

        Ok(Self {
            index: timestamps.into(),
            values,
        })
    }

    /// Builds a series indexed by position (`0, 1, 2, ...`).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDType`] when a value is NaN or infinite.
    pub fn from_values(values: impl Into<Vec<Price>>) -> Result<Self> {
        let values = values.into();
        check_finite("value", &values)?;

        Ok(Self {
            index: (0..values.len() as Timestamp).collect(),
            values,
        })
    }

    /// Extracts `source` from each bar after validating the slice.
    ///
    /// # Errors
    ///
    /// Any error of [`validate_bars`].
    pub fn from_bars<B: Ohlcv>(bars: &[B], source: PriceSource) -> Result<Self> {
        validate_bars(bars)?;

        Ok(Self {
            index: bars.iter().map(Ohlcv::timestamp).collect(),
            values: bars.iter().map(|bar| source.extract(bar)).collect(),
        })
    }

    /// Builds a series over an existing index. The caller guarantees
    /// alignment and finiteness.
    pub(crate) fn from_parts(index: Index, values: Vec<Price>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self { index, values }
    }

    /// All values in timestamp order.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Price] {
        &self.values
    }

    /// Timestamps in order.
    #[inline]
    #[must_use]
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.index
    }
}

impl Series for TimeSeries {
    #[inline]
    fn index(&self) -> &Index {
        &self.index
    }

    #[inline]
    fn get(&self, position: usize) -> Option<Price> {
        Some(self.values[position])
    }
}

/// Output of an indicator computation.
///
/// Aligned 1:1 with the input index. Positions without enough history hold
/// `None` rather than a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    #[serde(serialize_with = "serialize_index")]
    index: Index,
    values: Vec<Option<Price>>,
}

impl IndicatorSeries {
    pub(crate) fn new(index: Index, values: Vec<Option<Price>>) -> Self {
        debug_assert_eq!(
            index.len(),
            values.len(),
            "indicator output must be aligned to its input"
        );
        Self { index, values }
    }

    /// Values in timestamp order, `None` where undefined.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Option<Price>] {
        &self.values
    }

    /// Timestamps in order.
    #[inline]
    #[must_use]
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.index
    }

    /// Position of the first defined value.
    #[must_use]
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    /// Last value, `None` if empty or undefined.
    #[must_use]
    pub fn last(&self) -> Option<Price> {
        self.values.last().copied().flatten()
    }

    /// Defined positions as `(timestamp, value)` pairs.
    pub fn defined(&self) -> impl Iterator<Item = (Timestamp, Price)> + '_ {
        self.index
            .iter()
            .zip(&self.values)
            .filter_map(|(&t, v)| v.map(|v| (t, v)))
    }

    /// Combines two aligned series position by position; undefined where
    /// either side is undefined.
    pub(crate) fn zip_with(&self, other: &Self, f: impl Fn(Price, Price) -> Price) -> Self {
        debug_assert!(Arc::ptr_eq(&self.index, &other.index) || self.index == other.index);

        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| Some(f((*a)?, (*b)?)))
            .collect();

        Self::new(Arc::clone(&self.index), values)
    }
}

impl Series for IndicatorSeries {
    #[inline]
    fn index(&self) -> &Index {
        &self.index
    }

    #[inline]
    fn get(&self, position: usize) -> Option<Price> {
        self.values[position]
    }
}

fn serialize_index<S>(index: &Index, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(index.iter())
}

pub(crate) fn check_finite(column: &str, values: &[Price]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(Error::InvalidDType {
            column: column.to_owned(),
            index,
            value: values[index].to_string(),
        }),
        None => Ok(()),
    }
}
