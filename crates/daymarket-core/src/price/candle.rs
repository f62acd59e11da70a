use serde::{Deserialize, Serialize};

/// Open/high/low/close summary of one committed day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl DailyCandle {
    /// Summarize a price series. `None` for an empty slice.
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        let open = *prices.first()?;
        let close = *prices.last()?;
        let (high, low) = prices
            .iter()
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(hi, lo), &p| {
                (hi.max(p), lo.min(p))
            });
        Some(Self {
            open,
            high,
            low,
            close,
        })
    }

    pub fn change(&self) -> f64 {
        self.close - self.open
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_has_no_candle() {
        assert_eq!(DailyCandle::from_prices(&[]), None);
    }

    #[test]
    fn summarizes_series() {
        let candle = DailyCandle::from_prices(&[1000.0, 1024.0, 1010.0]).unwrap();
        assert_eq!(
            candle,
            DailyCandle {
                open: 1000.0,
                high: 1024.0,
                low: 1000.0,
                close: 1010.0,
            }
        );
        assert_eq!(candle.change(), 10.0);
        assert!(candle.is_bullish());
    }

    #[test]
    fn single_price_is_flat() {
        let candle = DailyCandle::from_prices(&[987.5]).unwrap();
        assert_eq!(candle.open, candle.close);
        assert_eq!(candle.high, candle.low);
    }
}
