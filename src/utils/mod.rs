pub mod amount;
pub mod string_utils;

// Re-export commonly used functions
pub use amount::{amount_to_raw, raw_to_amount};
pub use string_utils::*;
