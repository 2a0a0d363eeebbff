//! Market domain types.
//!
//! This module provides:
//! - Currency kinds, trade sides and the four data-type tags
//! - Validated price records parsed from raw OCR text
//! - Display-name mapping for items and currencies

pub mod names;
pub mod record;
pub mod types;

pub use names::NameMapping;
pub use record::{parse_rows, ParseError, ParsedRows, PriceRecord, RawRow};
pub use types::{CurrencyKind, DataType, Side};
