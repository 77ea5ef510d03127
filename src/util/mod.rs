pub mod date_key;

pub use date_key::{DateKey, InvalidDateKey, format_date_key, parse_date_key};
