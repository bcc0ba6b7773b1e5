//! Validation boundary: every input passes through here before any
//! computation runs.

use std::collections::HashSet;

use tracing::debug;

use crate::{Error, Ohlcv, Result, Timestamp, frame::Frame};

/// Canonical OHLCV column names.
pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// One unvalidated value of a declared-numeric column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Numeric value; must be finite to pass validation.
    Number(f64),
    /// Textual value; must parse as a finite float after trimming.
    Text(String),
    /// Missing value.
    Null,
}

impl Cell {
    /// Coerces the cell to a finite number.
    fn coerce(&self) -> Option<f64> {
        let value = match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Null => return None,
        };

        value.is_finite().then_some(value)
    }

    fn describe(&self) -> String {
        match self {
            Self::Number(v) => v.to_string(),
            Self::Text(s) => format!("{s:?}"),
            Self::Null => "null".to_owned(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Cell {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Candidate table handed over by the ingestion layer: a timestamp column
/// plus named, declared-numeric columns in their original order.
///
/// # Example
///
/// ```
/// use quantedge_series::{Cell, RawFrame};
///
/// let raw = RawFrame::new(vec![1, 2, 3])
///     .column("close", [Cell::from(10.0), Cell::from("10.5"), Cell::Null]);
///
/// assert_eq!(raw.missing_counts(), vec![("close".to_owned(), 1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFrame {
    timestamps: Vec<Timestamp>,
    columns: Vec<(String, Vec<Cell>)>,
}

impl RawFrame {
    #[must_use]
    pub fn new(timestamps: Vec<Timestamp>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column<C>(mut self, name: impl Into<String>, cells: impl IntoIterator<Item = C>) -> Self
    where
        C: Into<Cell>,
    {
        self.columns
            .push((name.into(), cells.into_iter().map(Into::into).collect()));
        self
    }

    /// Number of null cells per column, in column order.
    #[must_use]
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .map(|(name, cells)| {
                let nulls = cells.iter().filter(|c| matches!(c, Cell::Null)).count();
                (name.clone(), nulls)
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Validates candidate tables against a set of required columns.
///
/// Checks run in a fixed order and the first violation is reported:
/// column lengths, duplicate names, required columns, timestamp ordering,
/// cell types, and (for [`Validator::ohlcv`]) bar consistency. Nothing is
/// returned until every check has passed.
///
/// # Example
///
/// ```
/// use quantedge_series::{Error, RawFrame, Validator};
///
/// let raw = RawFrame::new(vec![1, 2]).column("close", [10.0, 11.0]);
///
/// let err = Validator::new(["close", "volume"]).validate(raw).unwrap_err();
/// assert_eq!(err, Error::MissingColumn { column: "volume".to_owned() });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    required: Vec<String>,
    bar_consistency: bool,
}

impl Validator {
    /// Validator requiring the given columns.
    #[must_use]
    pub fn new<S: Into<String>>(required: impl IntoIterator<Item = S>) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            bar_consistency: false,
        }
    }

    /// Validator for OHLCV tables: requires [`OHLCV_COLUMNS`] and checks
    /// every row is a consistent bar.
    #[must_use]
    pub fn ohlcv() -> Self {
        Self {
            bar_consistency: true,
            ..Self::new(OHLCV_COLUMNS)
        }
    }

    /// Required column names.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Validates `raw` and returns the typed frame.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`], [`Error::DuplicateColumn`],
    /// [`Error::MissingColumn`], [`Error::NonMonotonicTimestamp`],
    /// [`Error::InvalidDType`], or [`Error::InconsistentBar`], whichever
    /// violation is found first.
    pub fn validate(&self, raw: RawFrame) -> Result<Frame> {
        let result = self.run_checks(raw);

        match &result {
            Ok(frame) => debug!(
                rows = frame.len(),
                columns = frame.column_names().count(),
                "frame validated"
            ),
            Err(err) => debug!(%err, "frame rejected"),
        }

        result
    }

    fn run_checks(&self, raw: RawFrame) -> Result<Frame> {
        let RawFrame {
            timestamps,
            columns,
        } = raw;

        for (name, cells) in &columns {
            if cells.len() != timestamps.len() {
                return Err(Error::LengthMismatch {
                    column: name.clone(),
                    expected: timestamps.len(),
                    actual: cells.len(),
                });
            }
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for (name, _) in &columns {
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(Error::DuplicateColumn {
                    column: name.clone(),
                });
            }
        }

        for required in &self.required {
            if !columns
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(required))
            {
                return Err(Error::MissingColumn {
                    column: required.clone(),
                });
            }
        }

        check_increasing(&timestamps)?;

        let mut numeric = Vec::with_capacity(columns.len());
        for (name, cells) in columns {
            let mut values = Vec::with_capacity(cells.len());
            for (index, cell) in cells.iter().enumerate() {
                let Some(value) = cell.coerce() else {
                    return Err(Error::InvalidDType {
                        column: name,
                        index,
                        value: cell.describe(),
                    });
                };
                values.push(value);
            }
            numeric.push((name, values));
        }

        let frame = Frame::from_validated(timestamps.into(), numeric);

        if self.bar_consistency {
            frame.bars()?;
        }

        Ok(frame)
    }
}

/// Validates a slice of bars: strictly increasing timestamps, finite
/// fields, and `low <= open, close <= high` with non-negative volume.
///
/// # Errors
///
/// [`Error::NonMonotonicTimestamp`], [`Error::InvalidDType`], or
/// [`Error::InconsistentBar`] for the first offending bar.
pub fn validate_bars<B: Ohlcv>(bars: &[B]) -> Result<()> {
    let result = bars
        .windows(2)
        .enumerate()
        .try_for_each(|(i, pair)| {
            increasing_pair(i + 1, pair[0].timestamp(), pair[1].timestamp())
        })
        .and_then(|()| check_bars(bars));

    match &result {
        Ok(()) => debug!(bars = bars.len(), "bars validated"),
        Err(err) => debug!(%err, "bars rejected"),
    }

    result
}

pub(crate) fn check_bars<B: Ohlcv>(bars: &[B]) -> Result<()> {
    for (index, bar) in bars.iter().enumerate() {
        let fields = [
            ("open", bar.open()),
            ("high", bar.high()),
            ("low", bar.low()),
            ("close", bar.close()),
            ("volume", bar.volume()),
        ];
        if let Some((column, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidDType {
                column: (*column).to_owned(),
                index,
                value: value.to_string(),
            });
        }

        if bar.low() > bar.open()
            || bar.low() > bar.close()
            || bar.high() < bar.open()
            || bar.high() < bar.close()
            || bar.volume() < 0.0
        {
            return Err(Error::InconsistentBar {
                index,
                open: bar.open(),
                high: bar.high(),
                low: bar.low(),
                close: bar.close(),
                volume: bar.volume(),
            });
        }
    }

    Ok(())
}

/// Fails on the first timestamp that does not exceed its predecessor.
pub(crate) fn check_increasing(timestamps: &[Timestamp]) -> Result<()> {
    timestamps
        .windows(2)
        .enumerate()
        .try_for_each(|(i, pair)| increasing_pair(i + 1, pair[0], pair[1]))
}

#[inline]
fn increasing_pair(index: usize, previous: Timestamp, current: Timestamp) -> Result<()> {
    if current > previous {
        Ok(())
    } else {
        Err(Error::NonMonotonicTimestamp {
            index,
            previous,
            current,
        })
    }
}
