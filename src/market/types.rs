use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency an item is priced in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyKind {
    /// Chaos orb (`c` tag)
    Chaos,
    /// Divine orb (`d` tag)
    Divine,
}

impl CurrencyKind {
    /// Single-letter tag used in file names.
    pub fn tag(self) -> char {
        match self {
            CurrencyKind::Chaos => 'c',
            CurrencyKind::Divine => 'd',
        }
    }

    /// Key used in the name mapping and config files.
    pub fn key(self) -> &'static str {
        match self {
            CurrencyKind::Chaos => "chaos",
            CurrencyKind::Divine => "divine",
        }
    }
}

impl fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which side of the order book a captured region shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    fn prefix(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// One of the four price feeds per item: (buy | sell) × (chaos | divine).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataType {
    pub side: Side,
    pub currency: CurrencyKind,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::new(Side::Buy, CurrencyKind::Chaos),
        DataType::new(Side::Sell, CurrencyKind::Chaos),
        DataType::new(Side::Buy, CurrencyKind::Divine),
        DataType::new(Side::Sell, CurrencyKind::Divine),
    ];

    pub const fn new(side: Side, currency: CurrencyKind) -> Self {
        Self { side, currency }
    }

    /// Tag used in result file names: `buy_c`, `sell_d`, ...
    pub fn tag(self) -> String {
        format!("{}_{}", self.side.prefix(), self.currency.tag())
    }

    /// Tag used for screenshot files: `buy-c`, `sell-d`, ...
    pub fn region_tag(self) -> String {
        format!("{}-{}", self.side.prefix(), self.currency.tag())
    }

    /// Name of the time-series file for this data type.
    pub fn results_file_name(self) -> String {
        format!("{}_results.json", self.tag())
    }

    /// Parses a `buy_c` style tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dt| dt.tag() == tag)
    }

    /// Human-readable label, e.g. "buy (chaos)".
    pub fn label(self) -> String {
        format!("{} ({})", self.side.prefix(), self.currency)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}
