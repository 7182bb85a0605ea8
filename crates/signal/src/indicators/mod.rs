pub mod macd;
pub mod rsi;

pub use macd::macd_histogram;
pub use rsi::rsi;
