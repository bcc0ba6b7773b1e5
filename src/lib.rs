//! Batch technical-indicator and risk-metric computation over validated
//! price series.
//!
//! Raw tables enter through the [`Validator`] (or [`validate_bars`] for
//! [`Ohlcv`] slices) and leave as typed series. Every computation makes a
//! single forward pass and returns an [`IndicatorSeries`] aligned 1:1 with
//! its input; positions without enough history are `None`, never NaN.
//!
//! Each indicator type ([`Sma`], [`Ema`], [`Rsi`], [`Macd`], [`Bb`])
//! exposes [`new`](Sma::new), [`compute`](Sma::compute), and
//! [`compute_bars`](Sma::compute_bars) as inherent methods, no trait import
//! needed. Import [`Indicator`] only for generic code. Free functions
//! ([`sma`], [`ema`], [`rsi`], [`macd`], [`bollinger_bands`]) cover the
//! common one-off call.
//!
//! # Example
//!
//! ```
//! use quantedge_series::{RawFrame, Validator, max_drawdown, rsi, simple_return};
//!
//! let raw = RawFrame::new(vec![1, 2, 3, 4, 5])
//!     .column("Close", [100.0, 102.0, 101.0, 103.0, 99.0]);
//! let frame = Validator::new(["close"]).validate(raw).unwrap();
//! let close = frame.series("close").unwrap();
//!
//! let frame = frame
//!     .with_column("rsi_2", rsi(&close, 2).unwrap())
//!     .unwrap()
//!     .with_column("return", simple_return(&close))
//!     .unwrap();
//!
//! assert_eq!(frame.column_names().count(), 3);
//! assert!(max_drawdown(&close).unwrap() < 0.0);
//! ```

mod bb;
mod ema;
mod error;
mod ewm;
mod frame;
mod indicator;
mod macd;
mod ohlcv;
mod price_source;
mod returns;
mod ring_buffer;
mod risk;
mod rolling;
mod rsi;
mod series;
mod sma;
mod validator;

pub use crate::error::{Error, Result};
pub use crate::frame::{Column, Frame};
pub use crate::indicator::{Indicator, IndicatorConfig, IndicatorConfigBuilder};
pub use crate::ohlcv::{Ohlcv, OhlcvBar, Price, Timestamp};
pub use crate::price_source::PriceSource;
pub use crate::series::{Index, IndicatorSeries, Series, TimeSeries};
pub use crate::validator::{Cell, OHLCV_COLUMNS, RawFrame, Validator, validate_bars};

pub use crate::ewm::{DecayFactor, ewm_mean, ewm_mean_with};
pub use crate::rolling::{
    Window, expanding_max, rolling_max, rolling_mean, rolling_min, rolling_std,
};

pub use crate::bb::{Bb, BbConfig, BbConfigBuilder, BbSeries, StdDev, bollinger_bands};
pub use crate::ema::{Ema, EmaConfig, EmaConfigBuilder, ema};
pub use crate::macd::{Macd, MacdConfig, MacdConfigBuilder, MacdSeries, macd};
pub use crate::rsi::{Rsi, RsiConfig, RsiConfigBuilder, rsi};
pub use crate::sma::{Sma, SmaConfig, SmaConfigBuilder, sma};

pub use crate::returns::{cumulative_return, normalized, simple_return};
pub use crate::risk::{
    RiskConfig, RiskSummary, TRADING_DAYS_PER_YEAR, drawdown, max_drawdown, realized_volatility,
    sharpe_ratio,
};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::compute`].
            #[must_use]
            pub fn compute(&self, series: &impl Series) -> $output {
                <Self as Indicator>::compute(self, series)
            }

            /// See [`Indicator::compute_bars`].
            ///
            /// # Errors
            ///
            /// Any error of [`validate_bars`].
            pub fn compute_bars(&self, bars: &[impl Ohlcv]) -> Result<$output> {
                <Self as Indicator>::compute_bars(self, bars)
            }
        }
    };
}

impl_indicator_methods!(Sma, SmaConfig, IndicatorSeries);
impl_indicator_methods!(Ema, EmaConfig, IndicatorSeries);
impl_indicator_methods!(Rsi, RsiConfig, IndicatorSeries);
impl_indicator_methods!(Macd, MacdConfig, MacdSeries);
impl_indicator_methods!(Bb, BbConfig, BbSeries);

#[cfg(test)]
mod test_util;
