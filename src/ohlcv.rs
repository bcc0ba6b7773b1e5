use serde::{Deserialize, Serialize};

/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// Bar timestamp or sequence number.
///
/// Must be strictly increasing along a series. The unit (epoch seconds,
/// milliseconds, bar number) is the caller's choice.
pub type Timestamp = u64;

/// OHLCV bar data accepted by the engine.
///
/// Implement this on your own kline/candle type to avoid conversion.
/// [`validate_bars`](crate::validate_bars) checks ordering and bar
/// consistency before any computation runs.
///
/// # Example
///
/// ```
/// use quantedge_series::{Ohlcv, Price, Timestamp};
///
/// struct MyKline {
///     o: f64, h: f64, l: f64, c: f64, v: f64,
///     ts: u64,
/// }
///
/// impl Ohlcv for MyKline {
///     fn open(&self) -> Price { self.o }
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
///     fn volume(&self) -> f64 { self.v }
///     fn timestamp(&self) -> Timestamp { self.ts }
/// }
/// ```
pub trait Ohlcv {
    /// Opening price of the bar.
    fn open(&self) -> Price;

    /// Highest price during the bar.
    fn high(&self) -> Price;

    /// Lowest price during the bar.
    fn low(&self) -> Price;

    /// Closing price of the bar.
    fn close(&self) -> Price;

    /// Traded volume during the bar.
    fn volume(&self) -> f64;

    /// Bar timestamp. Strictly increasing between consecutive bars.
    fn timestamp(&self) -> Timestamp;
}

/// Plain OHLCV record.
///
/// Field names match the canonical column names, so CSV or JSON rows
/// deserialize into it directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub timestamp: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
}

impl OhlcvBar {
    #[must_use]
    pub fn new(
        timestamp: Timestamp,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl Ohlcv for OhlcvBar {
    #[inline]
    fn open(&self) -> Price {
        self.open
    }

    #[inline]
    fn high(&self) -> Price {
        self.high
    }

    #[inline]
    fn low(&self) -> Price {
        self.low
    }

    #[inline]
    fn close(&self) -> Price {
        self.close
    }

    #[inline]
    fn volume(&self) -> f64 {
        self.volume
    }

    #[inline]
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}
