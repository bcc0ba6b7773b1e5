use std::sync::Arc;

use tracing::debug;

use crate::{
    Error, IndicatorSeries, OhlcvBar, Price, Result, Series, TimeSeries, Timestamp,
    series::Index, validator::check_bars,
};

/// One named column of a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Validated input values, all defined.
    Values(Vec<Price>),
    /// Indicator output appended after validation.
    Indicator(IndicatorSeries),
}

/// Validated table: a strictly increasing timestamp index plus named
/// columns in insertion order.
///
/// Frames are only produced by [`Validator::validate`](crate::Validator::validate).
/// Indicator outputs are appended with [`with_column`](Frame::with_column),
/// which never touches or reorders existing columns.
///
/// # Example
///
/// ```
/// use quantedge_series::{RawFrame, Validator, sma};
///
/// let raw = RawFrame::new(vec![1, 2, 3]).column("close", [10.0, 20.0, 30.0]);
/// let frame = Validator::new(["close"]).validate(raw).unwrap();
///
/// let close = frame.series("close").unwrap();
/// let frame = frame.with_column("sma_2", sma(&close, 2).unwrap()).unwrap();
///
/// assert_eq!(frame.column_names().collect::<Vec<_>>(), vec!["close", "sma_2"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: Index,
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub(crate) fn from_validated(index: Index, columns: Vec<(String, Vec<Price>)>) -> Self {
        Self {
            index,
            columns: columns
                .into_iter()
                .map(|(name, values)| (name, Column::Values(values)))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.index
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Looks up a column by name, ignoring ASCII case.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, column)| column)
    }

    /// Input column as a [`TimeSeries`] sharing the frame index.
    ///
    /// # Errors
    ///
    /// [`Error::MissingColumn`] when no input column has that name.
    pub fn series(&self, name: &str) -> Result<TimeSeries> {
        match self.column(name) {
            Some(Column::Values(values)) => {
                Ok(TimeSeries::from_parts(Arc::clone(&self.index), values.clone()))
            }
            _ => Err(Error::MissingColumn {
                column: name.to_owned(),
            }),
        }
    }

    /// Appended indicator column.
    ///
    /// # Errors
    ///
    /// [`Error::MissingColumn`] when no indicator column has that name.
    pub fn indicator(&self, name: &str) -> Result<&IndicatorSeries> {
        match self.column(name) {
            Some(Column::Indicator(series)) => Ok(series),
            _ => Err(Error::MissingColumn {
                column: name.to_owned(),
            }),
        }
    }

    /// Reassembles OHLCV bars from the `open`, `high`, `low`, `close`, and
    /// `volume` columns and checks each bar is consistent.
    ///
    /// # Errors
    ///
    /// [`Error::MissingColumn`] for an absent OHLCV column,
    /// [`Error::InconsistentBar`] for a bar violating its invariant.
    pub fn bars(&self) -> Result<Vec<OhlcvBar>> {
        let open = self.series("open")?;
        let high = self.series("high")?;
        let low = self.series("low")?;
        let close = self.series("close")?;
        let volume = self.series("volume")?;

        let bars: Vec<OhlcvBar> = (0..self.len())
            .map(|i| {
                OhlcvBar::new(
                    self.index[i],
                    open.values()[i],
                    high.values()[i],
                    low.values()[i],
                    close.values()[i],
                    volume.values()[i],
                )
            })
            .collect();

        check_bars(&bars)?;

        Ok(bars)
    }

    /// Appends an indicator column.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateColumn`] when `name` is already taken.
    /// - [`Error::MisalignedIndex`] when `series` was not computed over this
    ///   frame's index.
    pub fn with_column(mut self, name: impl Into<String>, series: IndicatorSeries) -> Result<Self> {
        let name = name.into();

        if self.column(&name).is_some() {
            return Err(Error::DuplicateColumn { column: name });
        }
        if !Arc::ptr_eq(series.index(), &self.index) && **series.index() != *self.index {
            return Err(Error::MisalignedIndex { column: name });
        }

        debug!(column = %name, rows = self.len(), "column appended");
        self.columns.push((name, Column::Indicator(series)));

        Ok(self)
    }
}
