//! Price model: turns rated minutes into a synthetic daily price series.

mod candle;
mod model;

pub use candle::DailyCandle;
pub use model::{evolve, PriceModel, DEFAULT_ANCHOR_PRICE, DEFAULT_RATE_PER_MINUTE};
