//! Price records parsed from raw OCR text.
//!
//! A row of the price table is read as two strings: the ratio ("1:5" or a bare
//! decimal) and the order count. `PriceRecord::parse` is the only way to build a
//! record, so every stored record carries a finite ratio and a non-negative count.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw OCR output for one table row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub ratio_text: String,
    pub count_text: String,
}

impl RawRow {
    pub fn new(ratio_text: impl Into<String>, count_text: impl Into<String>) -> Self {
        Self {
            ratio_text: ratio_text.into(),
            count_text: count_text.into(),
        }
    }

    /// True if OCR produced nothing for either half of the row.
    pub fn is_empty(&self) -> bool {
        self.ratio_text.trim().is_empty() || self.count_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("ratio text is empty")]
    EmptyRatio,
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
    #[error("ratio '{0}' has a zero divisor")]
    ZeroDivisor(String),
    #[error("ratio '{0}' is not finite")]
    NonFinite(String),
    #[error("count '{0}' is not a non-negative integer")]
    InvalidCount(String),
}

/// One validated price row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct PriceRecord {
    ratio: f64,
    count: u64,
    raw_ratio: String,
}

/// Serialized shape of a record, validated on the way in.
#[derive(Deserialize)]
struct StoredRecord {
    ratio: f64,
    count: u64,
    #[serde(default)]
    raw_ratio: String,
}

impl TryFrom<StoredRecord> for PriceRecord {
    type Error = ParseError;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        if !stored.ratio.is_finite() {
            return Err(ParseError::NonFinite(stored.ratio.to_string()));
        }
        Ok(Self {
            ratio: stored.ratio,
            count: stored.count,
            raw_ratio: stored.raw_ratio,
        })
    }
}

impl PriceRecord {
    /// Builds a record from the two OCR strings of a row.
    pub fn parse(ratio_text: &str, count_text: &str) -> Result<Self, ParseError> {
        let raw_ratio = ratio_text.trim();
        let ratio = parse_ratio(raw_ratio)?;
        let count = parse_count(count_text)?;
        Ok(Self {
            ratio,
            count,
            raw_ratio: raw_ratio.to_string(),
        })
    }

    /// Normalized price: `b / a` for "a:b", or the bare number.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Number of orders at this price.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Ratio text exactly as OCR read it.
    pub fn raw_ratio(&self) -> &str {
        &self.raw_ratio
    }
}

/// Parses "a:b" as `b / a`, anything else as a plain decimal.
pub fn parse_ratio(text: &str) -> Result<f64, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyRatio);
    }

    let value = match text.split_once(':') {
        Some((a, b)) => {
            let divisor = parse_number(a)?;
            let dividend = parse_number(b)?;
            if divisor == 0.0 {
                return Err(ParseError::ZeroDivisor(text.to_string()));
            }
            dividend / divisor
        }
        None => parse_number(text)?,
    };

    if !value.is_finite() {
        return Err(ParseError::NonFinite(text.to_string()));
    }
    Ok(value)
}

fn parse_number(text: &str) -> Result<f64, ParseError> {
    let text = text.trim();
    let value: f64 = text
        .parse()
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))?;
    if !value.is_finite() {
        return Err(ParseError::NonFinite(text.to_string()));
    }
    Ok(value)
}

fn parse_count(text: &str) -> Result<u64, ParseError> {
    let text = text.trim();
    text.parse::<u64>()
        .map_err(|_| ParseError::InvalidCount(text.to_string()))
}

/// Result of parsing the rows of one captured region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRows {
    /// Valid records, in row order
    pub records: Vec<PriceRecord>,
    /// Rows where OCR returned nothing for the ratio or the count
    pub empty_rows: usize,
    /// Non-empty rows that failed to parse
    pub dropped_rows: usize,
}

/// Converts raw OCR rows into records.
///
/// Empty rows are only counted. Rows with text that does not parse are dropped
/// without being counted as empty.
pub fn parse_rows(rows: &[RawRow]) -> ParsedRows {
    let mut parsed = ParsedRows::default();

    for (index, row) in rows.iter().enumerate() {
        if row.is_empty() {
            parsed.empty_rows += 1;
            continue;
        }

        match PriceRecord::parse(&row.ratio_text, &row.count_text) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                log::debug!(
                    "Row {}: dropping '{}' / '{}': {}",
                    index + 1,
                    row.ratio_text,
                    row.count_text,
                    e
                );
                parsed.dropped_rows += 1;
            }
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colon_ratio() {
        assert_eq!(parse_ratio("1:5").unwrap(), 5.0);
        assert_eq!(parse_ratio("3:2").unwrap(), 2.0 / 3.0);
        assert_eq!(parse_ratio("2:1").unwrap(), 0.5);
        assert_eq!(parse_ratio("0.5:3.5").unwrap(), 3.5 / 0.5);
        assert_eq!(parse_ratio(" 4 : 10 ").unwrap(), 10.0 / 4.0);
    }

    #[test]
    fn test_parse_colon_ratio_exact_division() {
        for a in 1..50u32 {
            for b in [1u32, 3, 7, 11, 250, 1000] {
                let text = format!("{}:{}", a, b);
                assert_eq!(parse_ratio(&text).unwrap(), b as f64 / a as f64, "{}", text);
            }
        }
    }

    #[test]
    fn test_parse_bare_ratio() {
        assert_eq!(parse_ratio("12.5").unwrap(), 12.5);
        assert_eq!(parse_ratio("7").unwrap(), 7.0);
        assert_eq!(parse_ratio(".25").unwrap(), 0.25);
    }

    #[test]
    fn test_parse_ratio_rejects_malformed() {
        assert_eq!(parse_ratio(""), Err(ParseError::EmptyRatio));
        assert!(matches!(parse_ratio(":"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(parse_ratio("1:"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(parse_ratio("1:2:3"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(parse_ratio("1..2"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(parse_ratio("abc"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(parse_ratio("0:5"), Err(ParseError::ZeroDivisor(_))));
        assert!(matches!(parse_ratio("inf"), Err(ParseError::NonFinite(_))));
    }

    #[test]
    fn test_parse_record() {
        let record = PriceRecord::parse("1:5", "10").unwrap();
        assert_eq!(record.ratio(), 5.0);
        assert_eq!(record.count(), 10);
        assert_eq!(record.raw_ratio(), "1:5");
    }

    #[test]
    fn test_parse_record_rejects_bad_count() {
        assert!(matches!(
            PriceRecord::parse("1:5", "-3"),
            Err(ParseError::InvalidCount(_))
        ));
        assert!(matches!(
            PriceRecord::parse("1:5", "1.5"),
            Err(ParseError::InvalidCount(_))
        ));
        assert!(matches!(
            PriceRecord::parse("1:5", "x"),
            Err(ParseError::InvalidCount(_))
        ));
    }

    #[test]
    fn test_parse_rows_preserves_order_and_counts() {
        let rows = vec![
            RawRow::new("1:5", "10"),
            RawRow::new("", ""),
            RawRow::new("3:2", "4"),
            RawRow::new("1:", "9"),
            RawRow::new("2:1", ""),
            RawRow::new("2:1", "7"),
        ];

        let parsed = parse_rows(&rows);

        let ratios: Vec<f64> = parsed.records.iter().map(|r| r.ratio()).collect();
        let counts: Vec<u64> = parsed.records.iter().map(|r| r.count()).collect();
        assert_eq!(ratios, vec![5.0, 2.0 / 3.0, 0.5]);
        assert_eq!(counts, vec![10, 4, 7]);
        assert_eq!(parsed.empty_rows, 2);
        assert_eq!(parsed.dropped_rows, 1);
    }

    #[test]
    fn test_record_serde_shape() {
        let record = PriceRecord::parse("2:1", "7").unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "ratio": 0.5, "count": 7, "raw_ratio": "2:1" })
        );

        let back: PriceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_deserialize_rejects_negative_count() {
        let json = serde_json::json!({ "ratio": 0.5, "count": -1, "raw_ratio": "2:1" });
        assert!(serde_json::from_value::<PriceRecord>(json).is_err());
    }
}
